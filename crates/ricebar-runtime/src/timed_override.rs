#![forbid(unsafe_code)]

//! Temporary value substitution that reverts on its own.
//!
//! [`TimedOverride<T>`] shows an alternate value for a fixed duration and
//! then restores the baseline. Widgets use it to flash an error icon or
//! tooltip without having to remember to put things back.
//!
//! # Invariants
//!
//! 1. Overriding with the value already displayed does nothing: no
//!    notification, no timer reset.
//! 2. The baseline is recorded before the first override is applied and is
//!    kept while any revert is pending. Overlapping overrides therefore
//!    revert once, to the value shown before the first of them.
//! 3. Each effective override cancels the pending revert and schedules a new
//!    one `duration` after that call.

use std::cell::RefCell;
use std::rc::Rc;

use ricebar_core::event_loop::{EventLoop, TimerHandle};
use tracing::{debug, trace};
use web_time::Duration;

use crate::reactive::{Signal, Source, Subscription, Teardown};

struct OverrideInner<T> {
    displayed: Signal<T>,
    baseline: RefCell<Option<T>>,
    pending: RefCell<Option<TimerHandle>>,
    ev: EventLoop,
}

impl<T: Clone + PartialEq + 'static> OverrideInner<T> {
    fn revert(&self) {
        self.pending.borrow_mut().take();
        let baseline = self.baseline.borrow_mut().take();
        if let Some(baseline) = baseline {
            debug!("timed override reverted");
            self.displayed.set(baseline);
        }
    }
}

/// A displayed value that can be swapped out for a limited time.
///
/// Cloning a `TimedOverride` creates another handle to the same state.
pub struct TimedOverride<T> {
    inner: Rc<OverrideInner<T>>,
}

impl<T> Clone for TimedOverride<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for TimedOverride<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedOverride")
            .field("displayed", &self.inner.displayed)
            .field("baseline", &*self.inner.baseline.borrow())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> TimedOverride<T> {
    /// Create an override showing `baseline`.
    pub fn new(ev: &EventLoop, baseline: T) -> Self {
        Self {
            inner: Rc::new(OverrideInner {
                displayed: Signal::new(baseline),
                baseline: RefCell::new(None),
                pending: RefCell::new(None),
                ev: ev.clone(),
            }),
        }
    }

    /// Show `value` for `duration`, then revert to the baseline.
    pub fn override_for(&self, value: T, duration: Duration) {
        if self.inner.displayed.with(|current| *current == value) {
            trace!("override matches displayed value; ignoring");
            return;
        }
        if let Some(timer) = self.inner.pending.borrow_mut().take() {
            timer.cancel();
        }
        {
            let mut baseline = self.inner.baseline.borrow_mut();
            if baseline.is_none() {
                *baseline = Some(self.inner.displayed.get());
            }
        }
        self.inner.displayed.set(value);

        let weak = Rc::downgrade(&self.inner);
        let timer = self.inner.ev.timeout(duration, move || {
            if let Some(inner) = weak.upgrade() {
                inner.revert();
            }
        });
        debug!(
            duration_ms = duration.as_millis() as u64,
            "timed override applied"
        );
        *self.inner.pending.borrow_mut() = Some(timer);
    }

    /// Drop the pending revert and restore the baseline now.
    pub fn cancel(&self) {
        if let Some(timer) = self.inner.pending.borrow_mut().take() {
            timer.cancel();
        }
        self.inner.revert();
    }

    /// The currently displayed value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.displayed.get()
    }

    /// The signal holding the displayed value.
    #[must_use]
    pub fn signal(&self) -> &Signal<T> {
        &self.inner.displayed
    }

    /// Whether a revert is pending.
    #[must_use]
    pub fn is_overridden(&self) -> bool {
        self.inner.baseline.borrow().is_some()
    }

    /// Run `callback` whenever the displayed value changes.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.inner.displayed.subscribe(callback)
    }
}

impl<T> Drop for OverrideInner<T> {
    fn drop(&mut self) {
        if let Some(timer) = self.pending.get_mut().take() {
            timer.cancel();
        }
    }
}

impl<T: Clone + PartialEq + 'static> Source for TimedOverride<T> {
    type Value = T;

    fn latest(&self) -> Option<T> {
        Some(self.get())
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Subscription {
        self.inner.displayed.subscribe(move |_| on_change())
    }
}

impl<T: Clone + PartialEq + 'static> Teardown for TimedOverride<T> {
    fn teardown(&self) {
        self.cancel();
        self.inner.displayed.dispose();
    }
}
