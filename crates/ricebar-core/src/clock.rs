#![forbid(unsafe_code)]

//! Time sources for the event loop.
//!
//! Production code reads `web_time::Instant::now()`. Tests hand the loop a
//! [`LabClock`] instead and move time forward explicitly, so timer-driven
//! behavior (poll ticks, override reverts) is reproducible without sleeping.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use web_time::{Duration, Instant};

/// A manually-advanceable clock for deterministic tests.
///
/// All clones share the same offset, so every component holding a clone sees
/// the same time.
#[derive(Debug, Clone)]
pub struct LabClock {
    epoch: Instant,
    offset_ns: Arc<AtomicU64>,
}

impl LabClock {
    /// Create a new lab clock starting at `Instant::now()`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            offset_ns: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Advance the lab clock by `delta`.
    pub fn advance(&self, delta: Duration) {
        let ns = u64::try_from(delta.as_nanos()).unwrap_or(u64::MAX);
        let _ = self
            .offset_ns
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |offset| {
                Some(offset.saturating_add(ns))
            });
    }

    /// Move the clock forward to `target`. Earlier targets are ignored.
    pub fn advance_to(&self, target: Instant) {
        let now = self.now();
        if let Some(delta) = target.checked_duration_since(now) {
            self.advance(delta);
        }
    }

    /// Current lab time.
    #[must_use]
    pub fn now(&self) -> Instant {
        let offset = Duration::from_nanos(self.offset_ns.load(Ordering::Acquire));
        self.epoch + offset
    }

    /// Time elapsed since the clock was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.offset_ns.load(Ordering::Acquire))
    }
}

impl Default for LabClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the event loop reads "now" from.
#[derive(Debug, Clone, Default)]
pub enum TimeSource {
    /// Real wall-clock time.
    #[default]
    Real,
    /// Deterministic lab clock for testing.
    Lab(LabClock),
}

impl TimeSource {
    /// Current time according to this source.
    #[must_use]
    pub fn now(&self) -> Instant {
        match self {
            Self::Real => Instant::now(),
            Self::Lab(clock) => clock.now(),
        }
    }

    /// Whether this source is a lab clock.
    #[inline]
    #[must_use]
    pub fn is_lab(&self) -> bool {
        matches!(self, Self::Lab(_))
    }

    /// The lab clock, if any.
    #[must_use]
    pub fn lab(&self) -> Option<&LabClock> {
        match self {
            Self::Lab(clock) => Some(clock),
            Self::Real => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lab_clock_advance_accumulates() {
        let clock = LabClock::new();
        let t0 = clock.now();
        clock.advance(Duration::from_millis(100));
        clock.advance(Duration::from_millis(200));
        assert_eq!(clock.now().duration_since(t0), Duration::from_millis(300));
        assert_eq!(clock.elapsed(), Duration::from_millis(300));
    }

    #[test]
    fn advance_to_reaches_sub_microsecond_targets() {
        let clock = LabClock::new();
        let target = clock.now() + Duration::from_nanos(1500);
        clock.advance_to(target);
        assert_eq!(clock.now(), target);
        assert_eq!(clock.elapsed(), Duration::from_nanos(1500));
    }

    #[test]
    fn clones_share_time() {
        let clock = LabClock::new();
        let other = clock.clone();
        clock.advance(Duration::from_secs(5));
        assert_eq!(other.elapsed(), Duration::from_secs(5));
    }

    #[test]
    fn advance_to_never_moves_backwards() {
        let clock = LabClock::new();
        let t0 = clock.now();
        clock.advance(Duration::from_secs(2));
        clock.advance_to(t0 + Duration::from_secs(1));
        assert_eq!(clock.elapsed(), Duration::from_secs(2));
        clock.advance_to(t0 + Duration::from_secs(3));
        assert_eq!(clock.elapsed(), Duration::from_secs(3));
    }

    #[test]
    fn time_source_reports_lab() {
        let clock = LabClock::new();
        assert!(TimeSource::Lab(clock).is_lab());
        assert!(!TimeSource::Real.is_lab());
        assert!(TimeSource::Real.lab().is_none());
    }
}
