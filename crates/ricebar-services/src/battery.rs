//! Battery state as reported by the power daemon.

use ricebar_runtime::{Observed, Property};

/// Charge state of the battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BatteryState {
    #[default]
    Unknown,
    Charging,
    Discharging,
    Empty,
    FullyCharged,
    PendingCharge,
    PendingDischarge,
}

impl BatteryState {
    #[must_use]
    pub fn is_charging(self) -> bool {
        self == Self::Charging
    }
}

/// The system battery.
pub trait BatteryService: Observed {
    /// Whether a battery is installed.
    fn is_present(&self) -> bool;
    /// Charge level in `0.0..=1.0`.
    fn percentage(&self) -> f64;
    fn state(&self) -> BatteryState;
}

pub const IS_PRESENT: Property<dyn BatteryService, bool> =
    Property::new("is-present", |b| b.is_present());
pub const PERCENTAGE: Property<dyn BatteryService, f64> =
    Property::new("percentage", |b| b.percentage());
pub const STATE: Property<dyn BatteryService, BatteryState> =
    Property::new("state", |b| b.state());
