//! Memory usage reactor.
//!
//! Samples `free` on an interval. The label shows used memory in
//! gigabytes; the icon brightens and its heat overlay grows more opaque as
//! usage rises, and it runs hot past a threshold.

use std::rc::Rc;

use ricebar_core::event_loop::EventLoop;
use ricebar_runtime::{Computed, Poll, Subscription, Teardown};
use ricebar_services::command::{CommandError, CommandRunner};
use ricebar_services::usage::{MemoryReading, parse_free};
use web_time::Duration;

use crate::error::{Result, WidgetError};
use crate::widget::{Widget, watch_all};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);
/// Fraction of memory in use above which the reactor runs hot.
pub const DEFAULT_HIGH_USAGE: f64 = 0.5;
pub const TOOLTIP: &str = "Memory Usage";

/// What the memory widget shows for one reading.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryView {
    pub label: String,
    /// Style of the icon frame.
    pub frame_css: String,
    /// Style of the heat overlay.
    pub heat_css: String,
    pub hot: bool,
}

impl MemoryView {
    #[must_use]
    pub fn from_reading(reading: &MemoryReading, high_usage: f64) -> Self {
        let percent = reading.percent();
        let brightness = f64::from(percent) * 0.5 + 100.0;
        Self {
            label: reading.gigabytes_label(),
            frame_css: format!("filter: brightness({brightness}%);"),
            heat_css: format!("opacity: {percent}%;"),
            hot: reading.is_hot(high_usage),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Memory {
    usage: Poll<MemoryReading>,
    view: Computed<MemoryView>,
}

impl Memory {
    /// Start sampling through `runner`.
    pub fn new<R>(ev: &EventLoop, runner: R, interval: Duration, high_usage: f64) -> Result<Self>
    where
        R: CommandRunner + 'static,
    {
        if !(0.0..=1.0).contains(&high_usage) {
            return Err(WidgetError::InvalidThreshold {
                threshold: high_usage,
            });
        }
        let argv = vec!["free".to_string()];
        let usage = Poll::builder(MemoryReading::NoData, interval)
            .on_error(|_: &CommandError| MemoryReading::NoData)
            .start(ev, move || {
                let pending = runner.run(&argv);
                async move { pending.await.map(|output| parse_free(&output)) }
            })?;
        let view = Computed::from1(&usage, move |reading| {
            MemoryView::from_reading(&reading.unwrap_or_default(), high_usage)
        });
        Ok(Self { usage, view })
    }

    #[must_use]
    pub fn view(&self) -> MemoryView {
        self.view.get()
    }

    #[must_use]
    pub fn reading(&self) -> MemoryReading {
        self.usage.get()
    }

    #[must_use]
    pub fn poll(&self) -> &Poll<MemoryReading> {
        &self.usage
    }
}

impl Teardown for Memory {
    fn teardown(&self) {
        self.usage.cancel();
        self.view.dispose();
    }
}

impl Widget for Memory {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn snapshot(&self) -> String {
        let view = self.view();
        format!(
            "{} [{}] [{}] hot={}",
            view.label, view.frame_css, view.heat_css, view.hot
        )
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Vec<Subscription> {
        watch_all(&[&self.view], &on_change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ricebar_core::clock::LabClock;
    use ricebar_services::testing::FakeRunner;

    const FREE: &str = "\
               total        used        free      shared  buff/cache   available
Mem:        16314448     6283412     3478112      812348     6552924     8904696
";

    #[test]
    fn view_of_a_sample() {
        let view = MemoryView::from_reading(&parse_free(FREE), DEFAULT_HIGH_USAGE);
        assert_eq!(view.label, "6.3 GB");
        assert_eq!(view.frame_css, "filter: brightness(119%);");
        assert_eq!(view.heat_css, "opacity: 38%;");
        assert!(!view.hot);
    }

    #[test]
    fn odd_percent_keeps_the_half() {
        let reading = MemoryReading::Sample {
            total: 100.0,
            used: 37.0,
            free: 63.0,
        };
        let view = MemoryView::from_reading(&reading, 0.3);
        assert_eq!(view.frame_css, "filter: brightness(118.5%);");
        assert!(view.hot);
    }

    #[test]
    fn no_data_view() {
        let view = MemoryView::from_reading(&MemoryReading::NoData, DEFAULT_HIGH_USAGE);
        assert_eq!(view.label, "-- GB");
        assert_eq!(view.frame_css, "filter: brightness(100%);");
        assert_eq!(view.heat_css, "opacity: 0%;");
        assert!(!view.hot);
    }

    #[test]
    fn polls_free_through_the_runner() {
        let clock = LabClock::new();
        let ev = EventLoop::lab(&clock);
        let runner = FakeRunner::new();
        runner.respond("free", FREE);
        let widget = Memory::new(&ev, Rc::clone(&runner), DEFAULT_INTERVAL, 0.3).unwrap();
        assert_eq!(widget.view().label, "-- GB");

        ev.run_until_stalled();
        assert_eq!(widget.view().label, "6.3 GB");
        assert!(widget.view().hot);
        assert_eq!(runner.calls(), vec![vec!["free".to_string()]]);
    }

    #[test]
    fn command_failure_shows_no_data() {
        let clock = LabClock::new();
        let ev = EventLoop::lab(&clock);
        let runner = FakeRunner::new();
        runner.respond("free", FREE);
        let widget = Memory::new(&ev, Rc::clone(&runner), DEFAULT_INTERVAL, 0.5).unwrap();
        ev.run_until_stalled();
        assert!(widget.reading().has_data());

        runner.fail("free", "boom");
        ev.advance(DEFAULT_INTERVAL).unwrap();
        assert_eq!(widget.reading(), MemoryReading::NoData);
        assert_eq!(widget.view().label, "-- GB");
    }

    #[test]
    fn malformed_output_shows_no_data() {
        let clock = LabClock::new();
        let ev = EventLoop::lab(&clock);
        let runner = FakeRunner::new();
        runner.respond("free", "header\nMem: 12 34\n");
        let widget = Memory::new(&ev, runner, DEFAULT_INTERVAL, 0.5).unwrap();
        ev.run_until_stalled();
        assert!(!widget.snapshot().contains("NaN"));
        assert_eq!(widget.view().label, "-- GB");
    }

    #[test]
    fn rejects_threshold_outside_unit_range() {
        let clock = LabClock::new();
        let ev = EventLoop::lab(&clock);
        assert!(matches!(
            Memory::new(&ev, FakeRunner::new(), DEFAULT_INTERVAL, 1.5),
            Err(WidgetError::InvalidThreshold { .. })
        ));
    }
}
