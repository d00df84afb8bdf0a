//! Network manager: the wifi device and its access points.

use std::rc::Rc;

use ricebar_runtime::{Observed, Property};

/// Connectivity of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Internet {
    Connected,
    Connecting,
    #[default]
    Disconnected,
}

/// One visible access point.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessPoint {
    /// Network name. Hidden networks have none.
    pub ssid: Option<String>,
    pub bssid: String,
    /// Signal strength in percent.
    pub strength: u8,
    pub icon_name: String,
}

/// The network manager.
pub trait NetworkService: Observed {
    /// The wifi device, if the machine has one.
    fn wifi(&self) -> Option<Rc<dyn WifiDevice>>;
}

/// A wifi device.
pub trait WifiDevice: Observed {
    fn enabled(&self) -> bool;
    fn internet(&self) -> Internet;
    fn access_points(&self) -> Vec<AccessPoint>;
    fn active_access_point(&self) -> Option<AccessPoint>;
}

pub const WIFI: Property<dyn NetworkService, Option<Rc<dyn WifiDevice>>> =
    Property::new("wifi", |n| n.wifi());

pub const ENABLED: Property<dyn WifiDevice, bool> = Property::new("enabled", |w| w.enabled());
pub const INTERNET: Property<dyn WifiDevice, Internet> =
    Property::new("internet", |w| w.internet());
pub const ACCESS_POINTS: Property<dyn WifiDevice, Vec<AccessPoint>> =
    Property::new("access-points", |w| w.access_points());
pub const ACTIVE_ACCESS_POINT: Property<dyn WifiDevice, Option<AccessPoint>> =
    Property::new("active-access-point", |w| w.active_access_point());
