#![forbid(unsafe_code)]

//! Reactive values for the panel.
//!
//! - [`Signal`]: a shared, version-tracked value with change notification.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`Notifier`], [`Observed`], [`Property`]: named-property change
//!   announcements on service objects.
//! - [`Binding`]: a live view of one property of an observed object.
//! - [`Computed`]: a value derived eagerly from one or more [`Source`]s.
//! - [`BatchScope`]: defers notifications so dependent values recompute once
//!   per batch, after all direct subscribers have run.
//! - [`BindingScope`]: releases a widget's subscriptions and nodes together.
//!
//! # Architecture
//!
//! Everything is single-threaded. Shared state lives in `Rc` with interior
//! mutability; subscribers are stored as `Weak` callbacks and cleaned up
//! lazily during notification.
//!
//! # Invariants
//!
//! 1. Setting a signal to an equal value is a no-op.
//! 2. Subscribers are notified in registration order.
//! 3. Every subscriber of a change is notified before any value derived from
//!    it recomputes.
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification pass.

pub mod batch;
pub mod binding;
pub mod computed;
pub mod notifier;
pub mod signal;
pub mod source;

pub use batch::{BatchScope, batch};
pub use binding::{Binding, BindingScope, Teardown};
pub use computed::Computed;
pub use notifier::{Notifier, Observed, Property};
pub use signal::{Signal, Subscription};
pub use source::Source;
