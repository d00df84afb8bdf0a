#![forbid(unsafe_code)]

//! Single-threaded cooperative event loop.
//!
//! Everything reactive in the panel runs on one thread. Work is suspended at
//! exactly three kinds of points, all of which are owned by this loop:
//!
//! - awaiting an asynchronous producer (poll invocations),
//! - awaiting an external command invocation,
//! - waiting for a scheduled timer (override reverts, poll interval ticks).
//!
//! Timers live in a deadline-ordered queue. Futures run on a
//! `futures_executor::LocalPool`, so they may hold `Rc` state and never need
//! locks. A future woken from another thread (a command worker finishing) is
//! picked up the next time the loop drives its tasks.
//!
//! # Invariants
//!
//! 1. Due timers fire in deadline order; timers sharing a deadline fire in
//!    creation order.
//! 2. A cancelled timer never fires, even when cancelled from inside its own
//!    callback (repeating timers are not rescheduled).
//! 3. [`EventLoop::advance`] steps a lab clock through every intermediate
//!    deadline, so each timer observes its own due time.
//! 4. Re-entrant driving (calling `run_until_stalled` from a callback) is
//!    refused rather than nesting executors.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use ricebar_core::clock::LabClock;
//! use ricebar_core::event_loop::EventLoop;
//! use web_time::Duration;
//!
//! let clock = LabClock::new();
//! let ev = EventLoop::lab(&clock);
//! let hits = Rc::new(Cell::new(0));
//! let h = Rc::clone(&hits);
//! let _timer = ev.timeout(Duration::from_secs(5), move || h.set(h.get() + 1));
//!
//! ev.advance(Duration::from_secs(4)).unwrap();
//! assert_eq!(hits.get(), 0);
//! ev.advance(Duration::from_secs(1)).unwrap();
//! assert_eq!(hits.get(), 1);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::rc::{Rc, Weak};

use futures_executor::{LocalPool, LocalSpawner};
use futures_util::task::LocalSpawnExt;
use tracing::{debug, trace, warn};
use web_time::{Duration, Instant};

use crate::clock::{LabClock, TimeSource};
use crate::cx::Cx;

/// Longest single sleep while waiting in [`EventLoop::run`].
///
/// Bounds how long a task woken from a worker thread waits before the loop
/// notices it.
const SLEEP_CHUNK: Duration = Duration::from_millis(10);

/// Errors reported by the event loop.
#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    /// Repeating timers need a positive period.
    #[error("timer period must be positive")]
    ZeroPeriod,
    /// `advance()` only makes sense on a lab clock.
    #[error("advancing time requires a lab clock")]
    NotLabClock,
    /// `run()` sleeps in real time and cannot drive a lab clock.
    #[error("run() requires the real clock")]
    NotRealClock,
}

/// Identifier of a scheduled timer.
pub type TimerId = u64;

enum TimerKind {
    Once(Box<dyn FnOnce()>),
    Repeat {
        period: Duration,
        callback: Box<dyn FnMut()>,
    },
}

struct LoopInner {
    time: TimeSource,
    next_id: Cell<TimerId>,
    queue: RefCell<BTreeMap<(Instant, TimerId), TimerKind>>,
    deadlines: RefCell<HashMap<TimerId, Instant>>,
    firing: Cell<Option<TimerId>>,
    firing_cancelled: Cell<bool>,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
    driving: Cell<bool>,
}

impl LoopInner {
    fn schedule(&self, deadline: Instant, kind: TimerKind) -> TimerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.insert(id, deadline, kind);
        id
    }

    fn insert(&self, id: TimerId, deadline: Instant, kind: TimerKind) {
        self.queue.borrow_mut().insert((deadline, id), kind);
        self.deadlines.borrow_mut().insert(id, deadline);
    }

    fn cancel(&self, id: TimerId) -> bool {
        let deadline = self.deadlines.borrow_mut().remove(&id);
        if let Some(deadline) = deadline {
            // Drop the callback outside of the queue borrow: it may own
            // handles whose drop touches the loop again.
            let removed = self.queue.borrow_mut().remove(&(deadline, id));
            drop(removed);
            trace!(timer_id = id, "timer cancelled");
            return true;
        }
        if self.firing.get() == Some(id) {
            self.firing_cancelled.set(true);
            return true;
        }
        false
    }

    fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.borrow().contains_key(&id)
            || (self.firing.get() == Some(id) && !self.firing_cancelled.get())
    }

    fn next_due(&self, now: Instant) -> Option<(Instant, TimerId)> {
        let queue = self.queue.borrow();
        let (&key, _) = queue.iter().next()?;
        (key.0 <= now).then_some(key)
    }

    /// Fire every timer due at `now`. Returns the number fired.
    fn fire_due(&self, now: Instant) -> usize {
        let mut fired = 0;
        while let Some(key) = self.next_due(now) {
            let Some(kind) = self.queue.borrow_mut().remove(&key) else {
                break;
            };
            let (deadline, id) = key;
            self.deadlines.borrow_mut().remove(&id);
            self.firing.set(Some(id));
            self.firing_cancelled.set(false);
            match kind {
                TimerKind::Once(callback) => callback(),
                TimerKind::Repeat {
                    period,
                    mut callback,
                } => {
                    callback();
                    if !self.firing_cancelled.get() {
                        let mut next = deadline + period;
                        if next <= now {
                            // The loop stalled past several periods; resume
                            // from now instead of firing a burst.
                            next = now + period;
                        }
                        self.insert(id, next, TimerKind::Repeat { period, callback });
                    }
                }
            }
            self.firing.set(None);
            fired += 1;
        }
        fired
    }
}

/// Handle to a scheduled timer.
///
/// Dropping the handle does **not** cancel the timer; cancellation is always
/// explicit through [`TimerHandle::cancel`].
#[derive(Clone)]
pub struct TimerHandle {
    id: TimerId,
    owner: Weak<LoopInner>,
}

impl TimerHandle {
    /// Identifier of the timer.
    #[must_use]
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Cancel the timer. Returns `true` if it was still pending.
    ///
    /// Idempotent, and safe to call from the timer's own callback.
    pub fn cancel(&self) -> bool {
        self.owner
            .upgrade()
            .is_some_and(|inner| inner.cancel(self.id))
    }

    /// Whether the timer will still fire.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.owner
            .upgrade()
            .is_some_and(|inner| inner.is_pending(self.id))
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// The cooperative event loop. Cloning yields another handle to the same loop.
#[derive(Clone)]
pub struct EventLoop {
    inner: Rc<LoopInner>,
}

impl EventLoop {
    /// Create a loop reading real wall-clock time.
    #[must_use]
    pub fn new() -> Self {
        Self::with_time_source(TimeSource::Real)
    }

    /// Create a loop driven by a lab clock.
    #[must_use]
    pub fn lab(clock: &LabClock) -> Self {
        Self::with_time_source(TimeSource::Lab(clock.clone()))
    }

    /// Create a loop on an explicit time source.
    #[must_use]
    pub fn with_time_source(time: TimeSource) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            inner: Rc::new(LoopInner {
                time,
                next_id: Cell::new(1),
                queue: RefCell::new(BTreeMap::new()),
                deadlines: RefCell::new(HashMap::new()),
                firing: Cell::new(None),
                firing_cancelled: Cell::new(false),
                pool: RefCell::new(pool),
                spawner,
                driving: Cell::new(false),
            }),
        }
    }

    /// Current time according to the loop's time source.
    #[must_use]
    pub fn now(&self) -> Instant {
        self.inner.time.now()
    }

    /// The loop's time source.
    #[must_use]
    pub fn time_source(&self) -> &TimeSource {
        &self.inner.time
    }

    /// Run `callback` once after `delay`.
    pub fn timeout(&self, delay: Duration, callback: impl FnOnce() + 'static) -> TimerHandle {
        let deadline = self.now() + delay;
        let id = self
            .inner
            .schedule(deadline, TimerKind::Once(Box::new(callback)));
        trace!(timer_id = id, delay_ms = delay.as_millis() as u64, "timeout scheduled");
        self.handle(id)
    }

    /// Run `callback` every `period`, first after one period has elapsed.
    pub fn interval(
        &self,
        period: Duration,
        callback: impl FnMut() + 'static,
    ) -> Result<TimerHandle, LoopError> {
        if period.is_zero() {
            return Err(LoopError::ZeroPeriod);
        }
        let deadline = self.now() + period;
        let id = self.inner.schedule(
            deadline,
            TimerKind::Repeat {
                period,
                callback: Box::new(callback),
            },
        );
        trace!(timer_id = id, period_ms = period.as_millis() as u64, "interval scheduled");
        Ok(self.handle(id))
    }

    fn handle(&self, id: TimerId) -> TimerHandle {
        TimerHandle {
            id,
            owner: Rc::downgrade(&self.inner),
        }
    }

    /// Spawn a future on the loop's local executor.
    ///
    /// The future makes progress the next time the loop is driven.
    pub fn spawn_local(&self, future: impl Future<Output = ()> + 'static) {
        if let Err(err) = self.inner.spawner.spawn_local(future) {
            warn!(error = %err, "failed to spawn local task");
        }
    }

    /// Number of timers still scheduled.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.inner.deadlines.borrow().len()
    }

    /// Deadline of the earliest scheduled timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.inner.queue.borrow().keys().next().map(|(deadline, _)| *deadline)
    }

    /// Fire all due timers and drive ready tasks until nothing can progress.
    ///
    /// Returns the number of timers fired. A re-entrant call returns 0.
    pub fn run_until_stalled(&self) -> usize {
        if self.inner.driving.replace(true) {
            warn!("re-entrant run_until_stalled ignored");
            return 0;
        }
        let mut fired = 0;
        loop {
            fired += self.inner.fire_due(self.now());
            self.inner.pool.borrow_mut().run_until_stalled();
            if self.inner.next_due(self.now()).is_none() {
                break;
            }
        }
        self.inner.driving.set(false);
        fired
    }

    /// Move a lab clock forward by `delta`, firing timers at their deadlines.
    pub fn advance(&self, delta: Duration) -> Result<usize, LoopError> {
        let clock = self.inner.time.lab().cloned().ok_or(LoopError::NotLabClock)?;
        let target = clock.now() + delta;
        let mut fired = self.run_until_stalled();
        while let Some(deadline) = self.next_deadline() {
            if deadline > target {
                break;
            }
            clock.advance_to(deadline);
            fired += self.run_until_stalled();
        }
        clock.advance_to(target);
        fired += self.run_until_stalled();
        Ok(fired)
    }

    /// Drive the loop in real time until `cx` is cancelled.
    pub fn run(&self, cx: &Cx) -> Result<(), LoopError> {
        if self.inner.time.is_lab() {
            return Err(LoopError::NotRealClock);
        }
        debug!(cx_id = cx.id(), "event loop started");
        while !cx.is_cancelled() {
            self.run_until_stalled();
            let wait = self
                .next_deadline()
                .map_or(SLEEP_CHUNK, |deadline| {
                    deadline.saturating_duration_since(self.now())
                });
            std::thread::sleep(wait.min(SLEEP_CHUNK));
        }
        // Let completions that raced with cancellation settle.
        self.run_until_stalled();
        debug!(cx_id = cx.id(), "event loop stopped");
        Ok(())
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("lab", &self.inner.time.is_lab())
            .field("pending_timers", &self.pending_timers())
            .finish()
    }
}
