#![forbid(unsafe_code)]

//! The common face of every reactive value.
//!
//! [`Computed`](super::Computed) combines inputs of different kinds (signals,
//! property bindings, polls) through this trait. An input that has not
//! produced a value yet reports `None`.

use std::rc::Rc;

use super::signal::{Signal, Subscription};

/// A readable, watchable reactive value.
pub trait Source {
    /// The value type produced.
    type Value: Clone + 'static;

    /// The latest value, or `None` while none is available.
    fn latest(&self) -> Option<Self::Value>;

    /// Run `on_change` after every notification from this source.
    fn watch(&self, on_change: Rc<dyn Fn()>) -> Subscription;
}

impl<T: Clone + 'static> Source for Signal<T> {
    type Value = T;

    fn latest(&self) -> Option<T> {
        Some(self.get())
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Subscription {
        self.subscribe(move |_| on_change())
    }
}
