#![forbid(unsafe_code)]

//! Values derived from one or more [`Source`]s.
//!
//! # Design
//!
//! [`Computed<T>`] stores a combiner over its inputs and the latest combined
//! value in a [`Signal`]. Whenever an input notifies, a recompute is queued
//! in the current batch, keyed by the computed itself. Because every
//! notification pass runs inside a batch, the recompute happens after all
//! subscribers of the triggering change have run, and a computed whose
//! inputs change together in one batch recomputes once.
//!
//! Inputs that have not produced a value yet reach the combiner as `None`,
//! so placeholder values ("-- GB") are the combiner's decision.
//!
//! # Invariants
//!
//! 1. After a batch drains, `get()` reflects the latest value of every input.
//! 2. Each recompute notifies subscribers, even if the result is unchanged.
//! 3. Version increments by exactly 1 per successful recompute.
//!
//! # Failure Modes
//!
//! - **Combiner fails** (`try_from*`): the error is logged at warn level and
//!   the previous value is kept. On the initial computation the declared
//!   fallback is used instead.
//! - **Input dropped**: inputs are held strongly, so an input lives as long
//!   as any computed derived from it.

use std::cell::{Cell, RefCell};
use std::fmt::Display;
use std::rc::{Rc, Weak};

use tracing::{trace, warn};

use super::batch;
use super::binding::Teardown;
use super::signal::{Signal, Subscription};
use super::source::Source;

type Combine<T> = dyn Fn() -> Result<T, String>;

struct ComputedInner<T> {
    id: u64,
    compute: Box<Combine<T>>,
    value: Signal<T>,
    version: Cell<u64>,
    inputs: RefCell<Vec<Subscription>>,
}

impl<T: Clone + 'static> ComputedInner<T> {
    fn recompute(&self) {
        match (self.compute)() {
            Ok(next) => {
                let version = self.version.get() + 1;
                self.version.set(version);
                trace!(computed_id = self.id, version, "computed updated");
                self.value.force_set(next);
            }
            Err(err) => {
                warn!(computed_id = self.id, error = %err, "combiner failed; keeping previous value");
            }
        }
    }
}

/// A value derived from other reactive values.
///
/// Cloning a `Computed` creates a new handle to the **same** inner state.
///
/// ```
/// use ricebar_runtime::reactive::{Computed, Signal};
///
/// let used = Signal::new(4.0_f64);
/// let total = Signal::new(16.0_f64);
/// let ratio = Computed::from2(&used, &total, |u, t| match (u, t) {
///     (Some(u), Some(t)) if t > 0.0 => u / t,
///     _ => 0.0,
/// });
/// assert_eq!(ratio.get(), 0.25);
/// used.set(8.0);
/// assert_eq!(ratio.get(), 0.5);
/// ```
pub struct Computed<T> {
    inner: Rc<ComputedInner<T>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed")
            .field("value", &self.inner.value)
            .field("version", &self.inner.version.get())
            .finish()
    }
}

impl<T: Clone + 'static> Computed<T> {
    /// Derive a value from one input.
    pub fn from1<A>(a: &A, combine: impl Fn(Option<A::Value>) -> T + 'static) -> Self
    where
        A: Source + Clone + 'static,
    {
        let a1 = a.clone();
        let initial = combine(a.latest());
        Self::build(
            initial,
            move || Ok(combine(a1.latest())),
            &[watcher_of(a)],
        )
    }

    /// Derive a value from two inputs.
    pub fn from2<A, B>(
        a: &A,
        b: &B,
        combine: impl Fn(Option<A::Value>, Option<B::Value>) -> T + 'static,
    ) -> Self
    where
        A: Source + Clone + 'static,
        B: Source + Clone + 'static,
    {
        let (a1, b1) = (a.clone(), b.clone());
        let initial = combine(a.latest(), b.latest());
        Self::build(
            initial,
            move || Ok(combine(a1.latest(), b1.latest())),
            &[watcher_of(a), watcher_of(b)],
        )
    }

    /// Derive a value from three inputs.
    pub fn from3<A, B, C>(
        a: &A,
        b: &B,
        c: &C,
        combine: impl Fn(Option<A::Value>, Option<B::Value>, Option<C::Value>) -> T + 'static,
    ) -> Self
    where
        A: Source + Clone + 'static,
        B: Source + Clone + 'static,
        C: Source + Clone + 'static,
    {
        let (a1, b1, c1) = (a.clone(), b.clone(), c.clone());
        let initial = combine(a.latest(), b.latest(), c.latest());
        Self::build(
            initial,
            move || Ok(combine(a1.latest(), b1.latest(), c1.latest())),
            &[watcher_of(a), watcher_of(b), watcher_of(c)],
        )
    }

    /// Derive a value from one input with a fallible combiner.
    ///
    /// `fallback` is used when the very first combination fails.
    pub fn try_from1<A, E>(
        a: &A,
        fallback: T,
        combine: impl Fn(Option<A::Value>) -> Result<T, E> + 'static,
    ) -> Self
    where
        A: Source + Clone + 'static,
        E: Display,
    {
        let a1 = a.clone();
        let initial = initial_or_fallback(combine(a.latest()), fallback);
        Self::build(
            initial,
            move || combine(a1.latest()).map_err(|e| e.to_string()),
            &[watcher_of(a)],
        )
    }

    /// Derive a value from two inputs with a fallible combiner.
    pub fn try_from2<A, B, E>(
        a: &A,
        b: &B,
        fallback: T,
        combine: impl Fn(Option<A::Value>, Option<B::Value>) -> Result<T, E> + 'static,
    ) -> Self
    where
        A: Source + Clone + 'static,
        B: Source + Clone + 'static,
        E: Display,
    {
        let (a1, b1) = (a.clone(), b.clone());
        let initial = initial_or_fallback(combine(a.latest(), b.latest()), fallback);
        Self::build(
            initial,
            move || combine(a1.latest(), b1.latest()).map_err(|e| e.to_string()),
            &[watcher_of(a), watcher_of(b)],
        )
    }

    fn build(
        initial: T,
        compute: impl Fn() -> Result<T, String> + 'static,
        inputs: &[Watcher],
    ) -> Self {
        let inner = Rc::new(ComputedInner {
            id: batch::next_node_id(),
            compute: Box::new(compute),
            value: Signal::new(initial),
            version: Cell::new(0),
            inputs: RefCell::new(Vec::with_capacity(inputs.len())),
        });
        let weak = Rc::downgrade(&inner);
        let on_change: Rc<dyn Fn()> = Rc::new(move || schedule_recompute(&weak));
        let subs: Vec<Subscription> = inputs
            .iter()
            .map(|watch| watch(Rc::clone(&on_change)))
            .collect();
        *inner.inputs.borrow_mut() = subs;
        Self { inner }
    }

    /// The current derived value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.get()
    }

    /// Read the current value without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.value.with(f)
    }

    /// Run `callback` after every recompute.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.inner.value.subscribe(callback)
    }

    /// Number of successful recomputes.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Stop following the inputs and drop all subscribers.
    pub fn dispose(&self) {
        self.inner.inputs.borrow_mut().clear();
        self.inner.value.dispose();
    }
}

/// A deferred `watch` call on one input.
type Watcher = Box<dyn Fn(Rc<dyn Fn()>) -> Subscription>;

fn watcher_of<A: Source + Clone + 'static>(source: &A) -> Watcher {
    let source = source.clone();
    Box::new(move |on_change| source.watch(on_change))
}

fn initial_or_fallback<T, E: Display>(result: Result<T, E>, fallback: T) -> T {
    result.unwrap_or_else(|err| {
        warn!(error = %err, "initial combination failed; using fallback");
        fallback
    })
}

fn schedule_recompute<T: Clone + 'static>(weak: &Weak<ComputedInner<T>>) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let weak = weak.clone();
    batch::defer(inner.id, move || {
        if let Some(inner) = weak.upgrade() {
            inner.recompute();
        }
    });
}

impl<T: Clone + 'static> Source for Computed<T> {
    type Value = T;

    fn latest(&self) -> Option<T> {
        Some(self.get())
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Subscription {
        self.inner.value.subscribe(move |_| on_change())
    }
}

impl<T: Clone + 'static> Teardown for Computed<T> {
    fn teardown(&self) {
        self.dispose();
    }
}
