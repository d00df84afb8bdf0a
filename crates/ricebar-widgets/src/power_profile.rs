//! Power profile switcher.

use std::rc::Rc;

use ricebar_core::event_loop::EventLoop;
use ricebar_runtime::{
    Binding, Computed, CycleSelector, Direction, PointerButton, Subscription, Teardown,
};
use ricebar_services::battery::{self, BatteryService};
use ricebar_services::power::{self, PowerProfileService, ProfileSwitch};

use crate::widget::{Widget, watch_all};

pub const TOOLTIP: &str = "Cycle Power Profile\nHold shift or use right click to cycle backwards";
pub const PERFORMANCE_ICON: &str = "defense/overdrive-dome";
pub const ICON: &str = "defense/overdrive-projector";

/// What the profile button shows for `profile`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub profile: String,
    pub icon: &'static str,
    pub class: &'static str,
}

impl ProfileView {
    #[must_use]
    pub fn new(profile: &str) -> Self {
        Self {
            profile: profile.to_string(),
            icon: if profile == power::PERFORMANCE { PERFORMANCE_ICON } else { ICON },
            class: if profile == power::POWER_SAVER { "blockDisabled" } else { "radiate" },
        }
    }
}

#[derive(Debug)]
pub struct PowerProfile {
    active: Binding<String>,
    present: Binding<bool>,
    view: Computed<ProfileView>,
    selector: CycleSelector<ProfileSwitch>,
}

impl PowerProfile {
    pub fn new(
        ev: &EventLoop,
        service: &Rc<dyn PowerProfileService>,
        battery: &Rc<dyn BatteryService>,
    ) -> Self {
        let active = Binding::new(service, power::ACTIVE_PROFILE);
        let view = Computed::from1(&active, |profile| {
            ProfileView::new(profile.as_deref().unwrap_or_default())
        });
        Self {
            present: Binding::new(battery, battery::IS_PRESENT),
            selector: CycleSelector::new(ev, ProfileSwitch::new(Rc::clone(service))),
            active,
            view,
        }
    }

    #[must_use]
    pub fn view(&self) -> ProfileView {
        self.view.get()
    }

    /// Shown only on machines with a battery.
    #[must_use]
    pub fn visible(&self) -> bool {
        self.present.get_or(false)
    }

    /// Request the next profile. The view follows once the daemon reports it.
    pub fn click(&self, button: PointerButton, shift: bool) -> Option<String> {
        self.selector.cycle(Direction::from_click(button, shift))
    }
}

impl Teardown for PowerProfile {
    fn teardown(&self) {
        self.view.dispose();
        self.active.dispose();
        self.present.dispose();
    }
}

impl Widget for PowerProfile {
    fn name(&self) -> &'static str {
        "power-profile"
    }

    fn snapshot(&self) -> String {
        let view = self.view();
        format!(
            "{} {} [{}] visible={}",
            view.profile,
            view.icon,
            view.class,
            self.visible()
        )
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Vec<Subscription> {
        watch_all(&[&self.view, &self.present], &on_change)
    }
}
