//! Property-based invariant tests for the reactive runtime.
//!
//! 1. A computed always equals its combiner applied to the latest inputs
//! 2. A computed recomputes at most once per batch
//! 3. Cycling forward then backward returns to the starting mode
//! 4. A poll never has more than one producer invocation in flight
//! 5. Overrides always settle back on the baseline with no timers left

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures_channel::oneshot;
use futures_util::FutureExt;
use proptest::prelude::*;
use ricebar_core::clock::LabClock;
use ricebar_core::event_loop::EventLoop;
use ricebar_runtime::{Computed, Direction, Poll, Signal, TimedOverride, batch, next_mode};
use web_time::Duration;

// ── Helpers ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Set(usize, i32),
    Batch(Vec<(usize, i32)>),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize, -50..50i32).prop_map(|(i, v)| Op::Set(i, v)),
        proptest::collection::vec((0..3usize, -50..50i32), 1..5).prop_map(Op::Batch),
    ]
}

fn combine(a: Option<i32>, b: Option<i32>, c: Option<i32>) -> i64 {
    i64::from(a.unwrap_or(0)) * 100 + i64::from(b.unwrap_or(0)) * 10 + i64::from(c.unwrap_or(0))
}

// ═════════════════════════════════════════════════════════════════════════
// 1-2. Computed tracks its inputs, once per batch
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn computed_matches_combiner_of_latest(ops in proptest::collection::vec(arb_op(), 0..40)) {
        let inputs = [Signal::new(0), Signal::new(0), Signal::new(0)];
        let derived = Computed::from3(&inputs[0], &inputs[1], &inputs[2], combine);
        let notifications = Rc::new(Cell::new(0_u64));
        let n = Rc::clone(&notifications);
        let _sub = derived.subscribe(move |_| n.set(n.get() + 1));
        let mut changing_steps = 0_u64;

        for op in &ops {
            let changed = match op {
                Op::Set(i, v) => inputs[*i].set(*v),
                Op::Batch(writes) => batch(|| {
                    writes.iter().fold(false, |any, (i, v)| inputs[*i].set(*v) | any)
                }),
            };
            if changed {
                changing_steps += 1;
            }
            let expected = combine(
                Some(inputs[0].get()),
                Some(inputs[1].get()),
                Some(inputs[2].get()),
            );
            prop_assert_eq!(derived.get(), expected);
        }
        prop_assert_eq!(derived.version(), changing_steps);
        prop_assert_eq!(notifications.get(), changing_steps);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Cycling is reversible
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn forward_then_backward_is_identity(len in 1usize..8, start in 0usize..8) {
        let modes: Vec<String> = (0..len).map(|i| format!("mode-{i}")).collect();
        let current = &modes[start % len];
        let next = next_mode(&modes, Some(current), Direction::Forward).unwrap();
        let back = next_mode(&modes, Some(next), Direction::Backward).unwrap();
        prop_assert_eq!(back, current.as_str());
    }

    #[test]
    fn next_mode_always_in_list(len in 1usize..8, current in "[a-z-]{0,12}", forward in any::<bool>()) {
        let modes: Vec<String> = (0..len).map(|i| format!("mode-{i}")).collect();
        let direction = if forward { Direction::Forward } else { Direction::Backward };
        let next = next_mode(&modes, Some(&current), direction).unwrap();
        prop_assert!(modes.iter().any(|m| m == next));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Poll never overlaps invocations
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn poll_has_at_most_one_invocation_in_flight(
        latencies in proptest::collection::vec(0u64..3500, 1..12),
    ) {
        let clock = LabClock::new();
        let ev = EventLoop::lab(&clock);
        let active = Rc::new(Cell::new(0_u32));
        let peak = Rc::new(Cell::new(0_u32));
        let calls = Rc::new(Cell::new(0_usize));
        let latencies = Rc::new(latencies);

        let producer = {
            let (ev, active, peak, calls, latencies) = (
                ev.clone(),
                Rc::clone(&active),
                Rc::clone(&peak),
                Rc::clone(&calls),
                Rc::clone(&latencies),
            );
            move || {
                let call = calls.get();
                calls.set(call + 1);
                let latency = latencies[call % latencies.len()];
                active.set(active.get() + 1);
                peak.set(peak.get().max(active.get()));
                let (tx, rx) = oneshot::channel::<()>();
                let _timer = ev.timeout(Duration::from_millis(latency), move || {
                    let _ = tx.send(());
                });
                let active = Rc::clone(&active);
                async move {
                    let _ = rx.await;
                    active.set(active.get() - 1);
                    Ok::<u64, String>(latency)
                }
                .boxed_local()
            }
        };

        let poll = Poll::builder(0, Duration::from_secs(1))
            .start(&ev, producer)
            .unwrap();
        ev.advance(Duration::from_secs(20)).unwrap();

        prop_assert_eq!(peak.get(), 1);
        prop_assert_eq!(poll.invocations() as usize, calls.get());
        poll.cancel();
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Overrides settle on the baseline
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn overrides_settle_on_baseline(
        steps in proptest::collection::vec((0u8..4, 0u64..6000), 0..20),
    ) {
        let clock = LabClock::new();
        let ev = EventLoop::lab(&clock);
        let shown = TimedOverride::new(&ev, 0_u8);
        let changes = Rc::new(RefCell::new(Vec::new()));
        let c = Rc::clone(&changes);
        let _sub = shown.subscribe(move |v| c.borrow_mut().push(*v));

        for (value, gap) in &steps {
            shown.override_for(*value, Duration::from_secs(5));
            ev.advance(Duration::from_millis(*gap)).unwrap();
        }
        ev.advance(Duration::from_secs(5)).unwrap();

        prop_assert_eq!(shown.get(), 0);
        prop_assert!(!shown.is_overridden());
        prop_assert_eq!(ev.pending_timers(), 0);
        // Consecutive notifications always differ.
        let changes = changes.borrow();
        prop_assert!(changes.windows(2).all(|w| w[0] != w[1]));
    }
}
