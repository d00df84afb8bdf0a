//! Wall clock.

use std::fmt::Write as _;
use std::rc::Rc;

use chrono::format::{Item, StrftimeItems};
use chrono::{Local, NaiveDateTime};
use ricebar_core::event_loop::EventLoop;
use ricebar_runtime::{Poll, Subscription, Teardown};
use web_time::Duration;

use crate::error::{Result, WidgetError};
use crate::widget::{Widget, watch_all};

/// Hours over minutes.
pub const DEFAULT_FORMAT: &str = "%H\n%M";
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Local time, re-formatted on a fixed interval.
#[derive(Debug, Clone)]
pub struct Clock {
    time: Poll<String>,
}

impl Clock {
    /// A clock reading the local wall time.
    pub fn local(ev: &EventLoop, format: &str, interval: Duration) -> Result<Self> {
        Self::new(ev, format, interval, || Local::now().naive_local())
    }

    /// A clock reading `now` on every tick.
    pub fn new(
        ev: &EventLoop,
        format: &str,
        interval: Duration,
        now: impl Fn() -> NaiveDateTime + 'static,
    ) -> Result<Self> {
        validate_format(format)?;
        let format = format.to_string();
        let time = Poll::builder(String::new(), interval).start_sync(ev, move || {
            let mut text = String::new();
            write!(text, "{}", now().format(&format))?;
            Ok::<_, std::fmt::Error>(text)
        })?;
        Ok(Self { time })
    }

    /// The formatted time; empty until the first tick completes.
    #[must_use]
    pub fn text(&self) -> String {
        self.time.get()
    }

    #[must_use]
    pub fn poll(&self) -> &Poll<String> {
        &self.time
    }
}

/// Reject strftime strings chrono cannot render.
pub fn validate_format(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(WidgetError::InvalidClockFormat {
            format: format.to_string(),
        });
    }
    Ok(())
}

impl Teardown for Clock {
    fn teardown(&self) {
        self.time.cancel();
    }
}

impl Widget for Clock {
    fn name(&self) -> &'static str {
        "clock"
    }

    fn snapshot(&self) -> String {
        self.text().replace('\n', ":")
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Vec<Subscription> {
        watch_all(&[&self.time], &on_change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ricebar_core::clock::LabClock;
    use std::cell::Cell;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn formats_hours_over_minutes() {
        let clock = LabClock::new();
        let ev = EventLoop::lab(&clock);
        let widget = Clock::new(&ev, DEFAULT_FORMAT, DEFAULT_INTERVAL, || at(9, 5)).unwrap();
        assert_eq!(widget.text(), "");
        ev.run_until_stalled();
        assert_eq!(widget.text(), "09\n05");
        assert_eq!(widget.snapshot(), "09:05");
    }

    #[test]
    fn ticks_every_interval() {
        let clock = LabClock::new();
        let ev = EventLoop::lab(&clock);
        let minute = Rc::new(Cell::new(0));
        let m = Rc::clone(&minute);
        let widget = Clock::new(&ev, "%M", DEFAULT_INTERVAL, move || {
            m.set(m.get() + 1);
            at(12, m.get())
        })
        .unwrap();
        ev.advance(Duration::from_secs(3)).unwrap();
        assert_eq!(widget.text(), "04");
        assert_eq!(widget.poll().invocations(), 4);
    }

    #[test]
    fn invalid_format_is_rejected() {
        let clock = LabClock::new();
        let ev = EventLoop::lab(&clock);
        let err = Clock::new(&ev, "%Q", DEFAULT_INTERVAL, || at(0, 0)).unwrap_err();
        assert!(matches!(err, WidgetError::InvalidClockFormat { .. }));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let clock = LabClock::new();
        let ev = EventLoop::lab(&clock);
        let err = Clock::new(&ev, DEFAULT_FORMAT, Duration::ZERO, || at(0, 0)).unwrap_err();
        assert_eq!(err, WidgetError::Runtime(ricebar_runtime::RuntimeError::InvalidInterval));
    }

    #[test]
    fn teardown_stops_ticking() {
        let clock = LabClock::new();
        let ev = EventLoop::lab(&clock);
        let widget = Clock::new(&ev, DEFAULT_FORMAT, DEFAULT_INTERVAL, || at(1, 2)).unwrap();
        widget.teardown();
        assert_eq!(ev.pending_timers(), 0);
        assert!(widget.poll().is_cancelled());
    }
}
