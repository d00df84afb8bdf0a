//! Audio server: the default output device.

use std::rc::Rc;

use ricebar_runtime::{Observed, Property};

/// The audio server.
pub trait AudioService: Observed {
    fn default_speaker(&self) -> Rc<dyn Speaker>;
}

/// An output device.
pub trait Speaker: Observed {
    /// Volume in `0.0..=1.0`.
    fn volume(&self) -> f64;
    fn volume_icon(&self) -> String;
    fn set_volume(&self, volume: f64);
}

pub const VOLUME: Property<dyn Speaker, f64> = Property::new("volume", |s| s.volume());
pub const VOLUME_ICON: Property<dyn Speaker, String> =
    Property::new("volume-icon", |s| s.volume_icon());
