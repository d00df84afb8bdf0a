#![forbid(unsafe_code)]

//! Batched notification delivery.
//!
//! A [`BatchScope`] defers reactive work until the outermost scope exits.
//! Deferred jobs are keyed by the node that queued them (a signal or a
//! computed), so a node that changes several times inside one batch is
//! flushed once, against its latest state.
//!
//! Every signal notification pass opens an implicit scope. This is what makes
//! recomputation glitch-free: all subscribers of one change see it before
//! any derived value that depends on it recomputes.
//!
//! # Invariants
//!
//! 1. Outside of any scope, [`defer`] runs the job immediately.
//! 2. Inside a scope, a key is queued at most once until its job starts.
//! 3. Jobs run in FIFO order; work queued by a running job is flushed in the
//!    same drain, after the jobs already queued.
//! 4. Nested scopes never flush; only the outermost one does.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a unique key for a reactive node.
pub(crate) fn next_node_id() -> u64 {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Default)]
struct BatchState {
    depth: usize,
    flushing: bool,
    queue: VecDeque<(u64, Box<dyn FnOnce()>)>,
    queued: HashSet<u64>,
}

thread_local! {
    static BATCH: RefCell<BatchState> = RefCell::new(BatchState::default());
}

/// RAII guard that defers reactive notifications until the outermost scope
/// drops.
///
/// ```
/// use ricebar_runtime::reactive::{BatchScope, Signal};
///
/// let a = Signal::new(1);
/// let b = Signal::new(2);
/// {
///     let _batch = BatchScope::new();
///     a.set(10);
///     b.set(20);
///     // Values are visible immediately; notifications wait for the drop.
///     assert_eq!(a.get() + b.get(), 30);
/// }
/// ```
#[must_use = "notifications flush when the scope drops"]
pub struct BatchScope {
    _not_send: PhantomData<*const ()>,
}

impl BatchScope {
    /// Open a batch scope.
    pub fn new() -> Self {
        BATCH.with(|b| b.borrow_mut().depth += 1);
        Self {
            _not_send: PhantomData,
        }
    }
}

impl Default for BatchScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BatchScope {
    fn drop(&mut self) {
        let flush_now = BATCH.with(|b| {
            let mut b = b.borrow_mut();
            b.depth -= 1;
            b.depth == 0 && !b.flushing
        });
        if flush_now {
            flush();
        }
    }
}

impl std::fmt::Debug for BatchScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchScope")
            .field("depth", &BATCH.with(|b| b.borrow().depth))
            .finish()
    }
}

/// Run `f` inside a batch scope.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    let _scope = BatchScope::new();
    f()
}

/// Whether notifications are currently being deferred.
#[must_use]
pub fn is_batching() -> bool {
    BATCH.with(|b| {
        let b = b.borrow();
        b.depth > 0 || b.flushing
    })
}

/// Queue `job` under `key`, or run it now when no batch is open.
pub(crate) fn defer(key: u64, job: impl FnOnce() + 'static) {
    let job: Box<dyn FnOnce()> = Box::new(job);
    let run_now = BATCH.with(|b| {
        let mut b = b.borrow_mut();
        if b.depth == 0 && !b.flushing {
            return Some(job);
        }
        if b.queued.insert(key) {
            b.queue.push_back((key, job));
        }
        None
    });
    if let Some(job) = run_now {
        job();
    }
}

/// Resets the flushing flag even if a job panics.
struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        BATCH.with(|b| b.borrow_mut().flushing = false);
    }
}

fn flush() {
    BATCH.with(|b| b.borrow_mut().flushing = true);
    let _guard = FlushGuard;
    loop {
        let next = BATCH.with(|b| {
            let mut b = b.borrow_mut();
            let (key, job) = b.queue.pop_front()?;
            b.queued.remove(&key);
            Some(job)
        });
        match next {
            Some(job) => job(),
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn defer_outside_batch_runs_immediately() {
        let hit = Rc::new(RefCell::new(false));
        let h = Rc::clone(&hit);
        defer(next_node_id(), move || *h.borrow_mut() = true);
        assert!(*hit.borrow());
    }

    #[test]
    fn defer_inside_batch_waits_for_outermost_scope() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let _outer = BatchScope::new();
            {
                let _inner = BatchScope::new();
                let s = Rc::clone(&seen);
                defer(next_node_id(), move || s.borrow_mut().push("job"));
            }
            assert!(seen.borrow().is_empty(), "inner scope must not flush");
        }
        assert_eq!(*seen.borrow(), vec!["job"]);
    }

    #[test]
    fn same_key_is_queued_once() {
        let count = Rc::new(RefCell::new(0));
        let key = next_node_id();
        batch(|| {
            for _ in 0..3 {
                let c = Rc::clone(&count);
                defer(key, move || *c.borrow_mut() += 1);
            }
        });
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn jobs_queued_while_flushing_run_after_existing_jobs() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        batch(|| {
            let s = Rc::clone(&seen);
            defer(next_node_id(), move || {
                s.borrow_mut().push("first");
                let s2 = Rc::clone(&s);
                defer(next_node_id(), move || s2.borrow_mut().push("nested"));
            });
            let s = Rc::clone(&seen);
            defer(next_node_id(), move || s.borrow_mut().push("second"));
        });
        assert_eq!(*seen.borrow(), vec!["first", "second", "nested"]);
    }

    #[test]
    fn batching_flag_tracks_scope() {
        assert!(!is_batching());
        batch(|| assert!(is_batching()));
        assert!(!is_batching());
    }
}
