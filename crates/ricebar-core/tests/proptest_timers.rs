//! Property-based tests for lab-clock timer scheduling.
//!
//! 1. Timeouts fire in deadline order, ties in creation order
//! 2. Intervals fire once per elapsed period, however time is stepped
//! 3. Cancelled timers never fire

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use proptest::prelude::*;
use ricebar_core::{EventLoop, LabClock};
use web_time::Duration;

// ═════════════════════════════════════════════════════════════════════════
// 1. Ordering
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn timeouts_fire_in_deadline_then_creation_order(
        delays in prop::collection::vec(0u64..1_000, 1..32),
    ) {
        let clock = LabClock::new();
        let ev = EventLoop::lab(&clock);
        let order = Rc::new(RefCell::new(Vec::new()));
        for (index, delay) in delays.iter().enumerate() {
            let order = Rc::clone(&order);
            let delay = *delay;
            ev.timeout(Duration::from_millis(delay), move || {
                order.borrow_mut().push((delay, index));
            });
        }
        let fired = ev.advance(Duration::from_secs(1)).unwrap();
        prop_assert_eq!(fired, delays.len());

        let order = order.borrow();
        let mut expected = order.clone();
        expected.sort();
        prop_assert_eq!(&*order, &expected);
        prop_assert_eq!(ev.pending_timers(), 0);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Intervals
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn interval_fires_once_per_elapsed_period(
        period in 1u64..500,
        steps in prop::collection::vec(0u64..700, 0..12),
    ) {
        let clock = LabClock::new();
        let ev = EventLoop::lab(&clock);
        let hits = Rc::new(Cell::new(0u64));
        let h = Rc::clone(&hits);
        let timer = ev
            .interval(Duration::from_millis(period), move || h.set(h.get() + 1))
            .unwrap();
        for step in &steps {
            ev.advance(Duration::from_millis(*step)).unwrap();
        }
        let total: u64 = steps.iter().sum();
        prop_assert_eq!(hits.get(), total / period);
        prop_assert_eq!(clock.elapsed(), Duration::from_millis(total));
        prop_assert!(timer.is_active());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Cancellation
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn cancelled_timeouts_never_fire(
        timers in prop::collection::vec((1u64..1_000, any::<bool>()), 1..24),
    ) {
        let clock = LabClock::new();
        let ev = EventLoop::lab(&clock);
        let fired = Rc::new(RefCell::new(Vec::new()));
        let mut kept = Vec::new();
        for (index, (delay, cancel)) in timers.iter().enumerate() {
            let fired = Rc::clone(&fired);
            let handle = ev.timeout(Duration::from_millis(*delay), move || {
                fired.borrow_mut().push(index);
            });
            if *cancel {
                prop_assert!(handle.cancel());
            } else {
                kept.push(index);
            }
        }
        ev.advance(Duration::from_secs(1)).unwrap();

        let mut fired = fired.borrow().clone();
        fired.sort_unstable();
        prop_assert_eq!(fired, kept);
    }
}
