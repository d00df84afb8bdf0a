//! Scripted activity on the simulated services.
//!
//! Each step nudges one or more fakes the way a live desktop would: the
//! battery drains and recharges, focus moves between workspaces, a tray
//! applet comes and goes.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use ricebar_core::event_loop::{EventLoop, TimerHandle};
use ricebar_services::testing::{FakePlayer, FakeServices, FakeTrayItem};
use ricebar_services::{BatteryService, BatteryState, Internet, Speaker, WifiDevice};
use tracing::debug;
use web_time::Duration;

use crate::error::Result;

const APPLET: &str = "sim-applet";
const PLAYER: &str = "sim-player";
const TRACKS: [(&str, &str); 3] = [
    ("Overdrive", "Projector"),
    ("Radar", "Base"),
    ("Thermal", "Generator"),
];
const WORKSPACES: [i32; 3] = [1, 2, 3];

struct SimulationInner {
    fakes: FakeServices,
    step: Cell<u64>,
    player: RefCell<Option<Rc<FakePlayer>>>,
    applet: RefCell<Option<Rc<FakeTrayItem>>>,
}

impl SimulationInner {
    fn step(&self) {
        let step = self.step.get() + 1;
        self.step.set(step);
        debug!(step, "simulation step");
        self.battery();
        self.volume(step);
        if step % 3 == 0 {
            let id = WORKSPACES[(step / 3 % 3) as usize];
            self.fakes.workspaces.focus_workspace(id);
        }
        if step % 4 == 0 {
            self.toggle_applet();
        }
        if step % 5 == 0 {
            self.next_track(step);
        }
        if step % 7 == 0 {
            let internet = if self.fakes.wifi.internet() == Internet::Connected {
                Internet::Disconnected
            } else {
                Internet::Connected
            };
            self.fakes.wifi.set_internet(internet);
        }
    }

    fn battery(&self) {
        let battery = &self.fakes.battery;
        let level = battery.percentage();
        if battery.state().is_charging() {
            if level >= 1.0 {
                battery.set_state(BatteryState::Discharging);
            } else {
                battery.set_percentage((level + 0.05).min(1.0));
            }
        } else if level <= 0.15 {
            battery.set_state(BatteryState::Charging);
        } else {
            battery.set_percentage((level - 0.01).max(0.0));
        }
    }

    fn volume(&self, step: u64) {
        // Triangle wave over 0.2..=0.8 in steps of 0.1.
        let phase = (step % 12) as f64;
        let volume = if phase <= 6.0 { 0.2 + phase * 0.1 } else { 0.8 - (phase - 6.0) * 0.1 };
        self.fakes.audio.speaker().set_volume(volume);
    }

    fn toggle_applet(&self) {
        let mut applet = self.applet.borrow_mut();
        match applet.take() {
            Some(_) => self.fakes.tray.remove(APPLET),
            None => {
                let item = FakeTrayItem::new(APPLET, "applications-system", "Simulated applet");
                self.fakes.tray.add(Rc::clone(&item));
                *applet = Some(item);
            }
        }
    }

    fn next_track(&self, step: u64) {
        let (title, artist) = TRACKS[(step / 5 % 3) as usize];
        let mut player = self.player.borrow_mut();
        match player.as_ref() {
            Some(player) => player.set_track(title, artist),
            None => {
                let created = FakePlayer::new(PLAYER, Some("audio-x-generic"), title, artist);
                self.fakes.media.add(Rc::clone(&created));
                *player = Some(created);
            }
        }
    }
}

/// Drives the simulated services on a timer.
pub struct Simulation {
    inner: Rc<SimulationInner>,
    timer: RefCell<Option<TimerHandle>>,
}

impl Simulation {
    #[must_use]
    pub fn new(fakes: FakeServices) -> Self {
        Self {
            inner: Rc::new(SimulationInner {
                fakes,
                step: Cell::new(0),
                player: RefCell::new(None),
                applet: RefCell::new(None),
            }),
            timer: RefCell::new(None),
        }
    }

    /// Step every `interval` on `ev`.
    pub fn start(&self, ev: &EventLoop, interval: Duration) -> Result<()> {
        let weak: Weak<SimulationInner> = Rc::downgrade(&self.inner);
        let timer = ev.interval(interval, move || {
            if let Some(inner) = weak.upgrade() {
                inner.step();
            }
        })?;
        if let Some(previous) = self.timer.borrow_mut().replace(timer) {
            previous.cancel();
        }
        Ok(())
    }

    /// Run one step now.
    pub fn step(&self) {
        self.inner.step();
    }

    #[must_use]
    pub fn steps(&self) -> u64 {
        self.inner.step.get()
    }

    pub fn stop(&self) {
        if let Some(timer) = self.timer.borrow_mut().take() {
            timer.cancel();
        }
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.stop();
    }
}
