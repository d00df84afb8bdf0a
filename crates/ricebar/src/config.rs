//! TOML configuration.
//!
//! Every key is optional:
//!
//! ```toml
//! [clock]
//! format = "%H\n%M"
//! interval_ms = 1000
//!
//! [memory]
//! interval_ms = 10000
//! high_usage = 0.5
//!
//! [battery]
//! width = 175.0
//!
//! [inhibitor]
//! reason = "activated idle inhibitor in status bar"
//! error_flash_ms = 5000
//!
//! [wireless]
//! connect_command = ["nmcli", "d", "wifi", "connect"]
//!
//! [renderer]
//! frame_ms = 250
//!
//! [simulation]
//! enabled = true
//! interval_ms = 2000
//! ```

use std::path::Path;

use ricebar_widgets::{PanelSettings, battery, clock, inhibitor, memory, wireless};
use serde::Deserialize;
use web_time::Duration;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PanelConfig {
    pub clock: ClockConfig,
    pub memory: MemoryConfig,
    pub battery: BatteryConfig,
    pub inhibitor: InhibitorConfig,
    pub wireless: WirelessConfig,
    pub renderer: RendererConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClockConfig {
    pub format: String,
    pub interval_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryConfig {
    pub interval_ms: i64,
    pub high_usage: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InhibitorConfig {
    pub reason: String,
    pub error_flash_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WirelessConfig {
    pub connect_command: Vec<String>,
}

/// How often the headless renderer flushes changed widgets.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RendererConfig {
    pub frame_ms: i64,
}

/// Scripted changes to the simulated services.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub enabled: bool,
    pub interval_ms: i64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            clock: ClockConfig::default(),
            memory: MemoryConfig::default(),
            battery: BatteryConfig::default(),
            inhibitor: InhibitorConfig::default(),
            wireless: WirelessConfig::default(),
            renderer: RendererConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            format: clock::DEFAULT_FORMAT.to_string(),
            interval_ms: millis(clock::DEFAULT_INTERVAL),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            interval_ms: millis(memory::DEFAULT_INTERVAL),
            high_usage: memory::DEFAULT_HIGH_USAGE,
        }
    }
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            width: battery::DEFAULT_WIDTH,
        }
    }
}

impl Default for InhibitorConfig {
    fn default() -> Self {
        Self {
            reason: inhibitor::REASON.to_string(),
            error_flash_ms: millis(inhibitor::DEFAULT_ERROR_DURATION),
        }
    }
}

impl Default for WirelessConfig {
    fn default() -> Self {
        Self {
            connect_command: wireless::default_connect_command(),
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self { frame_ms: 250 }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 2_000,
        }
    }
}

impl PanelConfig {
    /// Read `path`, or the defaults when there is none.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| AppError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Check everything [`settings`](Self::settings) and the binary need.
    pub fn validate(&self) -> Result<()> {
        self.settings()?;
        self.frame_interval()?;
        self.simulation_interval()?;
        Ok(())
    }

    /// Widget settings. Intervals must be positive.
    pub fn settings(&self) -> Result<PanelSettings> {
        Ok(PanelSettings {
            clock_format: self.clock.format.clone(),
            clock_interval: positive_ms("clock.interval_ms", self.clock.interval_ms)?,
            memory_interval: positive_ms("memory.interval_ms", self.memory.interval_ms)?,
            memory_high_usage: self.memory.high_usage,
            battery_width: self.battery.width,
            inhibitor_reason: self.inhibitor.reason.clone(),
            inhibitor_error_duration: positive_ms(
                "inhibitor.error_flash_ms",
                self.inhibitor.error_flash_ms,
            )?,
            connect_command: self.wireless.connect_command.clone(),
        })
    }

    pub fn frame_interval(&self) -> Result<Duration> {
        positive_ms("renderer.frame_ms", self.renderer.frame_ms)
    }

    pub fn simulation_interval(&self) -> Result<Duration> {
        positive_ms("simulation.interval_ms", self.simulation.interval_ms)
    }
}

fn positive_ms(key: &str, value: i64) -> Result<Duration> {
    match u64::try_from(value) {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(AppError::invalid(format!(
            "{key} must be a positive number of milliseconds, got {value}"
        ))),
    }
}

fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = PanelConfig::from_toml_str("").unwrap();
        assert_eq!(config, PanelConfig::default());
        assert_eq!(config.settings().unwrap(), PanelSettings::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = PanelConfig::from_toml_str(
            r#"
            [clock]
            format = "%H:%M"

            [memory]
            high_usage = 0.8
            "#,
        )
        .unwrap();
        let settings = config.settings().unwrap();
        assert_eq!(settings.clock_format, "%H:%M");
        assert_eq!(settings.clock_interval, Duration::from_secs(1));
        assert_eq!(settings.memory_high_usage, 0.8);
        assert_eq!(settings.memory_interval, Duration::from_secs(10));
    }

    #[test]
    fn zero_or_negative_intervals_are_rejected() {
        for text in [
            "[clock]\ninterval_ms = 0",
            "[memory]\ninterval_ms = -5",
            "[inhibitor]\nerror_flash_ms = 0",
        ] {
            let config = PanelConfig::from_toml_str(text).unwrap();
            let err = config.settings().unwrap_err();
            assert!(matches!(err, AppError::InvalidConfig { .. }), "{text}");
            assert_eq!(err.exit_code(), 2);
        }
        let config = PanelConfig::from_toml_str("[renderer]\nframe_ms = -1").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = PanelConfig::from_toml_str("[clock]\nfromat = \"%H\"").unwrap_err();
        assert!(matches!(err, AppError::Toml(_)));
    }

    #[test]
    fn connect_command_is_configurable() {
        let config =
            PanelConfig::from_toml_str("[wireless]\nconnect_command = [\"iwctl\", \"connect\"]")
                .unwrap();
        assert_eq!(
            config.settings().unwrap().connect_command,
            vec!["iwctl".to_string(), "connect".to_string()]
        );
    }
}
