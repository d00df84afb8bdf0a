//! Idle inhibitor button.
//!
//! Clicking the radar asks the session to stay awake. A refused request
//! flips the button back off and shows the error sprite for a while.

use std::rc::Rc;

use ricebar_core::event_loop::EventLoop;
use ricebar_runtime::{
    Computed, Subscription, Teardown, ToggleOptions, ToggleResource, ToggleState,
};
use ricebar_services::inhibit::{InhibitKind, InhibitManager, Inhibitor};
use web_time::Duration;

use crate::widget::{Widget, watch_all};

pub const REASON: &str = "activated idle inhibitor in status bar";
pub const TOOLTIP: &str = "Idle/Sleep Inhibitor";
pub const ERROR_TOOLTIP: &str = "Request failed or the current platform does not support it";
pub const ICON: &str = "defense/radar-base";
pub const ERROR_SPRITE: &str = "Mindustry/core/assets/sprites/error.png";
pub const DEFAULT_ERROR_DURATION: Duration = ricebar_runtime::toggle::DEFAULT_ERROR_DURATION;

/// What the inhibitor button shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InhibitorView {
    pub active: bool,
    pub button_class: &'static str,
    pub radar_class: &'static str,
    pub icon: &'static str,
    pub tooltip: String,
}

impl InhibitorView {
    #[must_use]
    pub fn new(state: ToggleState, error: Option<&str>) -> Self {
        let active = state.is_on();
        Self {
            active,
            button_class: if active { "" } else { "blockDisabled" },
            radar_class: if active { "radarTop spin" } else { "radarTop" },
            icon: if error.is_some() { ERROR_SPRITE } else { ICON },
            tooltip: error.unwrap_or(TOOLTIP).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IdleInhibitor {
    toggle: ToggleResource<Inhibitor>,
    view: Computed<InhibitorView>,
}

impl IdleInhibitor {
    pub fn new(
        ev: &EventLoop,
        manager: Rc<dyn InhibitManager>,
        reason: &str,
        error_duration: Duration,
    ) -> Self {
        let toggle = ToggleResource::new(
            ev,
            Inhibitor::new(manager, InhibitKind::Idle, reason),
            ToggleOptions {
                error_message: ERROR_TOOLTIP.to_string(),
                error_duration,
            },
        );
        let view = Computed::from2(toggle.state_signal(), toggle.error(), |state, error| {
            InhibitorView::new(state.unwrap_or_default(), error.flatten().as_deref())
        });
        Self { toggle, view }
    }

    #[must_use]
    pub fn view(&self) -> InhibitorView {
        self.view.get()
    }

    /// Handler for the toggle button.
    pub fn set_active(&self, on: bool) {
        self.toggle.set_active(on);
    }

    pub fn toggle(&self) {
        self.toggle.toggle();
    }

    #[must_use]
    pub fn resource(&self) -> &ToggleResource<Inhibitor> {
        &self.toggle
    }
}

impl Teardown for IdleInhibitor {
    fn teardown(&self) {
        self.toggle.shutdown();
        self.view.dispose();
    }
}

impl Widget for IdleInhibitor {
    fn name(&self) -> &'static str {
        "inhibitor"
    }

    fn snapshot(&self) -> String {
        let view = self.view();
        format!(
            "{} [{}] [{}] {:?}",
            view.icon, view.button_class, view.radar_class, view.tooltip
        )
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Vec<Subscription> {
        watch_all(&[&self.view], &on_change)
    }
}
