//! Power profiles daemon.

use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use ricebar_runtime::{ModeSwitch, Observed, Property, RuntimeError};

pub const PERFORMANCE: &str = "performance";
pub const BALANCED: &str = "balanced";
pub const POWER_SAVER: &str = "power-saver";

/// The power profiles daemon.
pub trait PowerProfileService: Observed {
    /// Every profile, in the daemon's order.
    fn profiles(&self) -> Vec<String>;
    fn active_profile(&self) -> String;
    /// Ask the daemon to switch profiles. The active profile changes only
    /// once the daemon announces it.
    fn set_active_profile(&self, profile: &str) -> LocalBoxFuture<'static, Result<(), RuntimeError>>;
}

pub const ACTIVE_PROFILE: Property<dyn PowerProfileService, String> =
    Property::new("active-profile", |p| p.active_profile());
pub const PROFILES: Property<dyn PowerProfileService, Vec<String>> =
    Property::new("profiles", |p| p.profiles());

/// Exposes a [`PowerProfileService`] as a [`ModeSwitch`].
#[derive(Clone)]
pub struct ProfileSwitch {
    service: Rc<dyn PowerProfileService>,
}

impl ProfileSwitch {
    #[must_use]
    pub fn new(service: Rc<dyn PowerProfileService>) -> Self {
        Self { service }
    }
}

impl std::fmt::Debug for ProfileSwitch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileSwitch")
            .field("active", &self.service.active_profile())
            .finish()
    }
}

impl ModeSwitch for ProfileSwitch {
    fn modes(&self) -> Vec<String> {
        self.service.profiles()
    }

    fn active_mode(&self) -> Option<String> {
        Some(self.service.active_profile())
    }

    fn request_mode(&self, mode: &str) -> LocalBoxFuture<'static, Result<(), RuntimeError>> {
        self.service.set_active_profile(mode)
    }
}
