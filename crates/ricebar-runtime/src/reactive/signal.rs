#![forbid(unsafe_code)]

//! Observable value cells.
//!
//! [`Signal<T>`] is a shared, version-tracked value with change notification.
//! Subscribers are stored as `Weak` callbacks; the strong half lives in the
//! [`Subscription`] returned to the caller, so dropping the subscription is
//! all it takes to unsubscribe.
//!
//! # Invariants
//!
//! 1. The version increments exactly once per mutation that notifies.
//! 2. [`Signal::set`] with a value equal to the current one is a no-op.
//! 3. Subscribers are notified in registration order.
//! 4. Callbacks run after the value borrow is released, inside a batch
//!    scope, so they may read or write any signal (including this one).
//!    Writes made by a callback are delivered after the current pass.
//! 5. After [`Signal::dispose`], no further notifications are delivered.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::trace;

use super::batch::{self, BatchScope};

/// RAII guard for a registered callback.
///
/// Dropping the guard unsubscribes. The callback will not run in any
/// notification pass that starts after the drop.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    guard: Option<Box<dyn Any>>,
}

impl Subscription {
    pub(crate) fn new(guard: impl Any) -> Self {
        Self {
            guard: Some(Box::new(guard)),
        }
    }

    /// A subscription that holds nothing.
    pub fn noop() -> Self {
        Self { guard: None }
    }

    /// Unsubscribe now. Same as dropping the guard.
    pub fn unsubscribe(&mut self) {
        self.guard = None;
    }

    /// Whether the callback is still registered through this guard.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.guard.is_some()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

type Callback<T> = dyn Fn(&T);

struct SignalInner<T> {
    id: u64,
    value: RefCell<T>,
    version: Cell<u64>,
    disposed: Cell<bool>,
    subscribers: RefCell<Vec<Weak<Callback<T>>>>,
}

/// A shared value cell with change notification.
///
/// Cloning a `Signal` creates another handle to the **same** value.
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use ricebar_runtime::reactive::Signal;
///
/// let level = Signal::new(40);
/// let seen = Rc::new(Cell::new(0));
/// let s = Rc::clone(&seen);
/// let _sub = level.subscribe(move |v| s.set(*v));
///
/// level.set(55);
/// assert_eq!(seen.get(), 55);
/// ```
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Signal<T> {
    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl<T: Default + Clone + 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + 'static> Signal<T> {
    /// Create a signal holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                id: batch::next_node_id(),
                value: RefCell::new(value),
                version: Cell::new(0),
                disposed: Cell::new(false),
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Read the current value without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Store `value` and notify, even when it equals the current value.
    pub fn force_set(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.changed();
    }

    /// Store `value`, notify, and return the previous value.
    pub fn replace(&self, value: T) -> T {
        let old = self.inner.value.replace(value);
        self.changed();
        old
    }

    /// Mutate the value in place and notify.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.value.borrow_mut());
        self.changed();
    }

    /// Register `callback` to run with the new value after each change.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: Rc<Callback<T>> = Rc::new(callback);
        if self.inner.disposed.get() {
            return Subscription::new(strong);
        }
        self.inner
            .subscribers
            .borrow_mut()
            .push(Rc::downgrade(&strong));
        Subscription::new(strong)
    }

    /// Number of notifying mutations so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Drop every subscriber and stop notifying.
    pub fn dispose(&self) {
        self.inner.disposed.set(true);
        self.inner.subscribers.borrow_mut().clear();
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    fn changed(&self) {
        if self.inner.disposed.get() {
            return;
        }
        let version = self.inner.version.get() + 1;
        self.inner.version.set(version);
        trace!(signal_id = self.inner.id, version, "signal changed");
        if batch::is_batching() {
            let weak = Rc::downgrade(&self.inner);
            batch::defer(self.inner.id, move || {
                if let Some(inner) = weak.upgrade() {
                    Signal { inner }.deliver();
                }
            });
        } else {
            let _scope = BatchScope::new();
            self.deliver();
        }
    }

    fn deliver(&self) {
        if self.inner.disposed.get() {
            return;
        }
        let value = self.get();
        let callbacks: Vec<Rc<Callback<T>>> = {
            let mut subs = self.inner.subscribers.borrow_mut();
            subs.retain(|w| w.strong_count() > 0);
            subs.iter().filter_map(Weak::upgrade).collect()
        };
        for callback in callbacks {
            callback(&value);
        }
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    /// Store `value` and notify, unless it equals the current value.
    ///
    /// Returns whether subscribers were notified.
    pub fn set(&self, value: T) -> bool {
        if *self.inner.value.borrow() == value {
            return false;
        }
        *self.inner.value.borrow_mut() = value;
        self.changed();
        true
    }
}
