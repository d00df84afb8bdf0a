//! The full bar: every widget built from one bundle of services.

use std::cell::Cell;
use std::rc::Rc;

use ricebar_core::event_loop::EventLoop;
use ricebar_services::{
    AudioService, BatteryService, CommandRunner, InhibitManager, MediaService, NetworkService,
    PowerProfileService, TrayService, WorkspaceService,
};
use tracing::{debug, info};
use web_time::Duration;

use crate::audio::Audio;
use crate::battery::{self, Battery};
use crate::clock::{self, Clock};
use crate::error::Result;
use crate::inhibitor::{self, IdleInhibitor};
use crate::media::Media;
use crate::memory::{self, Memory};
use crate::power_profile::PowerProfile;
use crate::tray::Tray;
use crate::widget::Widget;
use crate::wireless::{self, Wireless};
use crate::workspaces::{Focus, Workspaces};

/// Every external collaborator the panel talks to.
#[derive(Clone)]
pub struct Services {
    pub battery: Rc<dyn BatteryService>,
    pub power: Rc<dyn PowerProfileService>,
    pub network: Rc<dyn NetworkService>,
    pub audio: Rc<dyn AudioService>,
    pub workspaces: Rc<dyn WorkspaceService>,
    pub tray: Rc<dyn TrayService>,
    pub media: Rc<dyn MediaService>,
    pub inhibit: Rc<dyn InhibitManager>,
    pub runner: Rc<dyn CommandRunner>,
}

#[cfg(feature = "test-helpers")]
impl From<&ricebar_services::testing::FakeServices> for Services {
    fn from(fakes: &ricebar_services::testing::FakeServices) -> Self {
        Self {
            battery: fakes.battery.clone(),
            power: fakes.power.clone(),
            network: fakes.network.clone(),
            audio: fakes.audio.clone(),
            workspaces: fakes.workspaces.clone(),
            tray: fakes.tray.clone(),
            media: fakes.media.clone(),
            inhibit: fakes.inhibit.clone(),
            runner: fakes.runner.clone(),
        }
    }
}

/// Tunables for the widgets that have any.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSettings {
    pub clock_format: String,
    pub clock_interval: Duration,
    pub memory_interval: Duration,
    pub memory_high_usage: f64,
    pub battery_width: f64,
    pub inhibitor_reason: String,
    pub inhibitor_error_duration: Duration,
    pub connect_command: Vec<String>,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            clock_format: clock::DEFAULT_FORMAT.to_string(),
            clock_interval: clock::DEFAULT_INTERVAL,
            memory_interval: memory::DEFAULT_INTERVAL,
            memory_high_usage: memory::DEFAULT_HIGH_USAGE,
            battery_width: battery::DEFAULT_WIDTH,
            inhibitor_reason: inhibitor::REASON.to_string(),
            inhibitor_error_duration: inhibitor::DEFAULT_ERROR_DURATION,
            connect_command: wireless::default_connect_command(),
        }
    }
}

/// Every widget of the bar, torn down together.
pub struct Panel {
    clock: Clock,
    workspaces: Workspaces,
    focus: Focus,
    tray: Tray,
    media: Media,
    memory: Memory,
    audio: Audio,
    wireless: Wireless,
    battery: Battery,
    power_profile: PowerProfile,
    inhibitor: IdleInhibitor,
    torn_down: Cell<bool>,
}

impl Panel {
    /// Build every widget. Fails only on invalid settings.
    pub fn build(ev: &EventLoop, services: &Services, settings: &PanelSettings) -> Result<Self> {
        let panel = Self {
            clock: Clock::local(ev, &settings.clock_format, settings.clock_interval)?,
            workspaces: Workspaces::new(&services.workspaces),
            focus: Focus::new(&services.workspaces),
            tray: Tray::new(&services.tray),
            media: Media::new(&services.media),
            memory: Memory::new(
                ev,
                Rc::clone(&services.runner),
                settings.memory_interval,
                settings.memory_high_usage,
            )?,
            audio: Audio::new(&services.audio),
            wireless: Wireless::new(
                ev,
                &services.network,
                Rc::clone(&services.runner),
                settings.connect_command.clone(),
            )?,
            battery: Battery::new(&services.battery, settings.battery_width)?,
            power_profile: PowerProfile::new(ev, &services.power, &services.battery),
            inhibitor: IdleInhibitor::new(
                ev,
                Rc::clone(&services.inhibit),
                &settings.inhibitor_reason,
                settings.inhibitor_error_duration,
            ),
            torn_down: Cell::new(false),
        };
        info!(widgets = panel.widgets().len(), "panel built");
        Ok(panel)
    }

    /// Widgets in bar order, left to right.
    #[must_use]
    pub fn widgets(&self) -> Vec<&dyn Widget> {
        let widgets: [&dyn Widget; 11] = [
            &self.workspaces,
            &self.focus,
            &self.tray,
            &self.media,
            &self.memory,
            &self.audio,
            &self.wireless,
            &self.battery,
            &self.power_profile,
            &self.inhibitor,
            &self.clock,
        ];
        widgets.to_vec()
    }

    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    #[must_use]
    pub fn workspaces(&self) -> &Workspaces {
        &self.workspaces
    }

    #[must_use]
    pub fn focus(&self) -> &Focus {
        &self.focus
    }

    #[must_use]
    pub fn tray(&self) -> &Tray {
        &self.tray
    }

    #[must_use]
    pub fn media(&self) -> &Media {
        &self.media
    }

    #[must_use]
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    #[must_use]
    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    #[must_use]
    pub fn wireless(&self) -> &Wireless {
        &self.wireless
    }

    #[must_use]
    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    #[must_use]
    pub fn power_profile(&self) -> &PowerProfile {
        &self.power_profile
    }

    #[must_use]
    pub fn inhibitor(&self) -> &IdleInhibitor {
        &self.inhibitor
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down.get()
    }

    /// Stop every poll, timer, and subscription. Runs once; later calls do
    /// nothing.
    pub fn teardown(&self) {
        if self.torn_down.replace(true) {
            return;
        }
        for widget in self.widgets().into_iter().rev() {
            debug!(widget = widget.name(), "tearing down widget");
            widget.teardown();
        }
        info!("panel torn down");
    }
}

impl Drop for Panel {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for Panel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Panel")
            .field("widgets", &self.widgets().len())
            .field("torn_down", &self.torn_down.get())
            .finish()
    }
}
