#![forbid(unsafe_code)]

//! Periodically re-invoked producers.
//!
//! A [`Poll<T>`] owns a value that an asynchronous producer refreshes on a
//! fixed interval. It suits sources with no change events of their own, such
//! as the output of a shell command or the wall clock.
//!
//! # Invariants
//!
//! 1. At most one producer invocation is in flight. A tick that arrives
//!    while one is pending is skipped, not queued.
//! 2. A failed invocation replaces the value with the error sentinel; the
//!    interval keeps running.
//! 3. After [`Poll::cancel`], no timer fires and a result still in flight is
//!    discarded when it arrives.
//! 4. Dropping the last handle cancels the poll.
//!
//! # Example
//!
//! ```
//! use ricebar_core::clock::LabClock;
//! use ricebar_core::event_loop::EventLoop;
//! use ricebar_runtime::poll::Poll;
//! use web_time::Duration;
//!
//! let clock = LabClock::new();
//! let ev = EventLoop::lab(&clock);
//! let ticks = std::cell::Cell::new(0_u32);
//! let poll = Poll::builder(0_u32, Duration::from_secs(1))
//!     .start_sync(&ev, move || {
//!         ticks.set(ticks.get() + 1);
//!         Ok::<_, std::convert::Infallible>(ticks.get())
//!     })
//!     .unwrap();
//!
//! ev.run_until_stalled();
//! assert_eq!(poll.get(), 1);
//! ev.advance(Duration::from_secs(2)).unwrap();
//! assert_eq!(poll.get(), 3);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt::Display;
use std::future::Future;
use std::rc::{Rc, Weak};

use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use ricebar_core::event_loop::{EventLoop, TimerHandle};
use tracing::{debug, trace, warn};
use web_time::Duration;

use crate::error::RuntimeError;
use crate::reactive::{Signal, Source, Subscription, Teardown};

type Producer<T> = dyn Fn() -> LocalBoxFuture<'static, T>;

struct PollInner<T> {
    value: Signal<T>,
    producer: Box<Producer<T>>,
    interval: Duration,
    ev: EventLoop,
    timer: RefCell<Option<TimerHandle>>,
    in_flight: Cell<bool>,
    cancelled: Cell<bool>,
    invocations: Cell<u64>,
    skipped_ticks: Cell<u64>,
}

impl<T: Clone + 'static> PollInner<T> {
    fn tick(self: &Rc<Self>) {
        if self.cancelled.get() {
            return;
        }
        if self.in_flight.get() {
            let skipped = self.skipped_ticks.get() + 1;
            self.skipped_ticks.set(skipped);
            trace!(skipped, "poll tick skipped; invocation still in flight");
            return;
        }
        self.in_flight.set(true);
        self.invocations.set(self.invocations.get() + 1);
        let pending = (self.producer)();
        let weak = Rc::downgrade(self);
        self.ev.spawn_local(async move {
            let result = pending.await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.in_flight.set(false);
            if inner.cancelled.get() {
                debug!("discarding result of cancelled poll");
                return;
            }
            inner.value.force_set(result);
        });
    }

    fn cancel(&self) -> bool {
        if self.cancelled.replace(true) {
            return false;
        }
        if let Some(timer) = self.timer.borrow_mut().take() {
            timer.cancel();
        }
        debug!(
            interval_ms = self.interval.as_millis() as u64,
            in_flight = self.in_flight.get(),
            "poll cancelled"
        );
        true
    }
}

impl<T> Drop for PollInner<T> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.get_mut().take() {
            timer.cancel();
        }
    }
}

/// Configuration for a [`Poll`], finished by [`start`](PollBuilder::start)
/// or [`start_sync`](PollBuilder::start_sync).
pub struct PollBuilder<T, E> {
    default: T,
    interval: Duration,
    on_error: Option<Box<dyn Fn(&E) -> T>>,
}

impl<T: Clone + 'static, E: Display + 'static> PollBuilder<T, E> {
    /// Map a producer failure to the value shown instead.
    ///
    /// Without a handler, failures show the default value.
    #[must_use]
    pub fn on_error(mut self, handler: impl Fn(&E) -> T + 'static) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Start polling an asynchronous producer.
    ///
    /// The first invocation is issued immediately.
    pub fn start<F, Fut>(self, ev: &EventLoop, producer: F) -> Result<Poll<T>, RuntimeError>
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<T, E>> + 'static,
    {
        if self.interval.is_zero() {
            return Err(RuntimeError::InvalidInterval);
        }
        let fallback = Rc::new(Fallback {
            default: self.default.clone(),
            on_error: self.on_error,
        });
        let wrapped = move || {
            let pending = producer();
            let fallback = Rc::clone(&fallback);
            async move {
                match pending.await {
                    Ok(value) => value,
                    Err(err) => {
                        warn!(error = %err, "poll producer failed; showing error value");
                        fallback.value_for(&err)
                    }
                }
            }
            .boxed_local()
        };
        Ok(Poll::launch(ev, self.default, self.interval, Box::new(wrapped)))
    }

    /// Start polling a synchronous producer.
    pub fn start_sync<F>(self, ev: &EventLoop, producer: F) -> Result<Poll<T>, RuntimeError>
    where
        F: Fn() -> Result<T, E> + 'static,
    {
        self.start(ev, move || std::future::ready(producer()))
    }
}

struct Fallback<T, E> {
    default: T,
    on_error: Option<Box<dyn Fn(&E) -> T>>,
}

impl<T: Clone, E> Fallback<T, E> {
    fn value_for(&self, err: &E) -> T {
        match &self.on_error {
            Some(handler) => handler(err),
            None => self.default.clone(),
        }
    }
}

/// A value refreshed by a producer on a fixed interval.
///
/// Cloning a `Poll` creates another handle to the same poll.
pub struct Poll<T> {
    inner: Rc<PollInner<T>>,
}

impl<T> Clone for Poll<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Poll<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poll")
            .field("value", &self.inner.value)
            .field("interval", &self.inner.interval)
            .field("in_flight", &self.inner.in_flight.get())
            .field("cancelled", &self.inner.cancelled.get())
            .finish()
    }
}

impl<T: Clone + 'static> Poll<T> {
    /// Begin configuring a poll that starts at `default`.
    pub fn builder<E>(default: T, interval: Duration) -> PollBuilder<T, E> {
        PollBuilder {
            default,
            interval,
            on_error: None,
        }
    }

    fn launch(ev: &EventLoop, default: T, interval: Duration, producer: Box<Producer<T>>) -> Self {
        let inner = Rc::new(PollInner {
            value: Signal::new(default),
            producer,
            interval,
            ev: ev.clone(),
            timer: RefCell::new(None),
            in_flight: Cell::new(false),
            cancelled: Cell::new(false),
            invocations: Cell::new(0),
            skipped_ticks: Cell::new(0),
        });
        let weak: Weak<PollInner<T>> = Rc::downgrade(&inner);
        match ev.interval(interval, move || {
            if let Some(inner) = weak.upgrade() {
                inner.tick();
            }
        }) {
            Ok(timer) => *inner.timer.borrow_mut() = Some(timer),
            // Unreachable: the interval was checked above.
            Err(err) => warn!(error = %err, "poll timer was not scheduled"),
        }
        debug!(interval_ms = interval.as_millis() as u64, "poll started");
        inner.tick();
        Self { inner }
    }

    /// The latest value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.get()
    }

    /// Run `callback` after every completed invocation.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.inner.value.subscribe(callback)
    }

    /// The signal holding the latest value.
    #[must_use]
    pub fn signal(&self) -> &Signal<T> {
        &self.inner.value
    }

    /// Stop polling. Returns `false` if already cancelled.
    pub fn cancel(&self) -> bool {
        self.inner.cancel()
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.get()
    }

    /// Whether an invocation is pending.
    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.inner.in_flight.get()
    }

    /// Number of producer invocations issued.
    #[must_use]
    pub fn invocations(&self) -> u64 {
        self.inner.invocations.get()
    }

    /// Number of ticks skipped because an invocation was still pending.
    #[must_use]
    pub fn skipped_ticks(&self) -> u64 {
        self.inner.skipped_ticks.get()
    }

    /// The refresh interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.inner.interval
    }
}

impl<T: Clone + 'static> Source for Poll<T> {
    type Value = T;

    fn latest(&self) -> Option<T> {
        Some(self.get())
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Subscription {
        self.inner.value.subscribe(move |_| on_change())
    }
}

impl<T: Clone + 'static> Teardown for Poll<T> {
    fn teardown(&self) {
        self.cancel();
    }
}
