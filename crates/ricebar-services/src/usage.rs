//! Parsing memory usage out of `free` output.
//!
//! `free` prints a header line followed by a `Mem:` line whose numeric
//! fields start with total, used and free (in KiB). Anything shorter or
//! stranger than that is reported as [`MemoryReading::NoData`], so the
//! display shows a placeholder instead of `NaN`.

/// One memory sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MemoryReading {
    /// Figures in KiB. `total` is always positive; every field is finite
    /// and non-negative.
    Sample { total: f64, used: f64, free: f64 },
    /// The command failed, has not run yet, or printed something unusable.
    #[default]
    NoData,
}

/// Parse the output of `free`.
#[must_use]
pub fn parse_free(output: &str) -> MemoryReading {
    let Some(line) = output.lines().nth(1) else {
        return MemoryReading::NoData;
    };
    let fields: Vec<f64> = line
        .split_whitespace()
        .filter_map(|field| field.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .collect();
    match fields[..] {
        [total, used, free, ..] if total > 0.0 && used >= 0.0 && free >= 0.0 => {
            // `abs` turns a parsed `-0` into `0`.
            MemoryReading::Sample {
                total,
                used: used.abs(),
                free: free.abs(),
            }
        }
        _ => MemoryReading::NoData,
    }
}

impl MemoryReading {
    /// Used memory as `"X.Y GB"`, or `"-- GB"` without data.
    #[must_use]
    pub fn gigabytes_label(&self) -> String {
        match self {
            Self::Sample { used, .. } => format!("{:.1} GB", used / 1000.0 / 1000.0),
            Self::NoData => "-- GB".to_string(),
        }
    }

    /// Used share of total memory as a whole percentage in `0..=100`.
    ///
    /// `0` without data.
    #[must_use]
    pub fn percent(&self) -> u32 {
        match self {
            Self::Sample { total, used, .. } => {
                let pct = (used / total * 100.0).floor().clamp(0.0, 100.0);
                pct as u32
            }
            Self::NoData => 0,
        }
    }

    /// Whether more than `threshold` (a fraction) of memory is in use.
    #[must_use]
    pub fn is_hot(&self, threshold: f64) -> bool {
        match self {
            Self::Sample { total, used, .. } => used / total > threshold,
            Self::NoData => false,
        }
    }

    #[must_use]
    pub fn has_data(&self) -> bool {
        matches!(self, Self::Sample { .. })
    }
}
