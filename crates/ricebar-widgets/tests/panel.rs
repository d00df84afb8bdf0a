//! The assembled panel over the in-memory fakes.

use std::cell::RefCell;
use std::rc::Rc;

use ricebar_core::clock::LabClock;
use ricebar_core::event_loop::EventLoop;
use ricebar_runtime::{PointerButton, RuntimeError, ToggleState};
use ricebar_services::testing::{FakePlayer, FakeServices, FakeTrayItem};
use ricebar_widgets::{Panel, PanelSettings, Services, WidgetError};
use web_time::Duration;

const FREE: &str = "\
               total        used        free      shared  buff/cache   available
Mem:        16314448     6283412     3478112      812348     6552924     8904696
";

fn build(ev: &EventLoop, fakes: &FakeServices) -> Panel {
    fakes.runner.respond("free", FREE);
    Panel::build(ev, &Services::from(fakes), &PanelSettings::default()).unwrap()
}

#[test]
fn builds_every_widget_in_bar_order() {
    let clock = LabClock::new();
    let ev = EventLoop::lab(&clock);
    let fakes = FakeServices::new();
    let panel = build(&ev, &fakes);
    let names: Vec<_> = panel.widgets().iter().map(|w| w.name()).collect();
    assert_eq!(
        names,
        [
            "workspaces",
            "focus",
            "tray",
            "media",
            "memory",
            "audio",
            "wireless",
            "battery",
            "power-profile",
            "inhibitor",
            "clock",
        ]
    );
}

#[test]
fn first_ticks_fill_polled_widgets() {
    let clock = LabClock::new();
    let ev = EventLoop::lab(&clock);
    let fakes = FakeServices::new();
    let panel = build(&ev, &fakes);
    assert_eq!(panel.memory().view().label, "-- GB");
    assert_eq!(panel.clock().text(), "");

    ev.run_until_stalled();
    assert_eq!(panel.memory().view().label, "6.3 GB");
    assert!(!panel.clock().text().is_empty());
    assert_eq!(panel.focus().title(), "terminal");
    assert_eq!(panel.battery().label(), "Stored: 80%");
}

#[test]
fn service_changes_mark_only_affected_widgets() {
    let clock = LabClock::new();
    let ev = EventLoop::lab(&clock);
    let fakes = FakeServices::new();
    let panel = build(&ev, &fakes);
    ev.run_until_stalled();

    let dirty = Rc::new(RefCell::new(Vec::new()));
    let mut subs = Vec::new();
    for widget in panel.widgets() {
        let dirty = Rc::clone(&dirty);
        let name = widget.name();
        subs.extend(widget.watch(Rc::new(move || dirty.borrow_mut().push(name))));
    }

    fakes.battery.set_percentage(0.25);
    assert!(dirty.borrow().contains(&"battery"));
    assert!(!dirty.borrow().contains(&"audio"));

    dirty.borrow_mut().clear();
    fakes.tray.add(FakeTrayItem::new("nm", "nm-applet", "Network"));
    fakes.media.add(FakePlayer::new("mpv", None, "Clip", "Someone"));
    assert!(dirty.borrow().contains(&"tray"));
    assert!(dirty.borrow().contains(&"media"));
    assert!(!dirty.borrow().contains(&"battery"));
}

#[test]
fn teardown_releases_the_inhibitor_exactly_once() {
    let clock = LabClock::new();
    let ev = EventLoop::lab(&clock);
    let fakes = FakeServices::new();
    let panel = build(&ev, &fakes);
    panel.inhibitor().set_active(true);
    ev.run_until_stalled();
    assert_eq!(panel.inhibitor().resource().state(), ToggleState::Active);
    assert_eq!(fakes.inhibit.live(), vec![1]);

    panel.teardown();
    assert!(panel.is_torn_down());
    assert_eq!(fakes.inhibit.released(), vec![1]);
    drop(panel);
    assert_eq!(fakes.inhibit.released(), vec![1]);
}

#[test]
fn teardown_stops_all_timers() {
    let clock = LabClock::new();
    let ev = EventLoop::lab(&clock);
    let fakes = FakeServices::new();
    let panel = build(&ev, &fakes);
    ev.run_until_stalled();
    assert!(ev.pending_timers() > 0);

    panel.teardown();
    assert_eq!(ev.pending_timers(), 0);
    let calls = fakes.runner.calls().len();
    ev.advance(Duration::from_secs(60)).unwrap();
    assert_eq!(fakes.runner.calls().len(), calls);
}

#[test]
fn dropping_the_panel_tears_it_down() {
    let clock = LabClock::new();
    let ev = EventLoop::lab(&clock);
    let fakes = FakeServices::new();
    {
        let panel = build(&ev, &fakes);
        panel.inhibitor().toggle();
        ev.run_until_stalled();
    }
    assert!(fakes.inhibit.live().is_empty());
    assert_eq!(ev.pending_timers(), 0);
}

#[test]
fn power_profile_clicks_reach_the_daemon() {
    let clock = LabClock::new();
    let ev = EventLoop::lab(&clock);
    let fakes = FakeServices::new();
    let panel = build(&ev, &fakes);
    panel.power_profile().click(PointerButton::Secondary, false);
    ev.run_until_stalled();
    assert_eq!(panel.power_profile().view().profile, "power-saver");
    assert_eq!(fakes.power.requests(), vec!["power-saver"]);
}

#[test]
fn invalid_settings_fail_the_build() {
    let clock = LabClock::new();
    let ev = EventLoop::lab(&clock);
    let services = Services::from(&FakeServices::new());

    let zero_interval = PanelSettings {
        memory_interval: Duration::ZERO,
        ..PanelSettings::default()
    };
    assert_eq!(
        Panel::build(&ev, &services, &zero_interval).unwrap_err(),
        WidgetError::Runtime(RuntimeError::InvalidInterval)
    );

    let bad_format = PanelSettings {
        clock_format: "%H %Q".to_string(),
        ..PanelSettings::default()
    };
    assert!(matches!(
        Panel::build(&ev, &services, &bad_format),
        Err(WidgetError::InvalidClockFormat { .. })
    ));

    let no_command = PanelSettings {
        connect_command: Vec::new(),
        ..PanelSettings::default()
    };
    assert_eq!(
        Panel::build(&ev, &services, &no_command).unwrap_err(),
        WidgetError::EmptyCommand
    );
    assert_eq!(ev.pending_timers(), 0);
}
