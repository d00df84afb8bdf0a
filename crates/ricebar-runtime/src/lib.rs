#![forbid(unsafe_code)]

//! Reactive runtime for ricebar.
//!
//! Data flows one way: external services announce property changes, which
//! [`Binding`]s and [`Poll`]s turn into values, which [`Computed`]s combine
//! for the renderer. Control flows back only through explicit actions on a
//! [`ToggleResource`] or [`CycleSelector`].
//!
//! Everything here is single-threaded and driven by a
//! [`ricebar_core::EventLoop`].

pub mod cycle;
pub mod error;
pub mod poll;
pub mod reactive;
pub mod timed_override;
pub mod toggle;

pub use cycle::{CycleSelector, Direction, ModeSwitch, PointerButton, next_mode};
pub use error::{AcquireError, RuntimeError};
pub use poll::{Poll, PollBuilder};
pub use reactive::{
    BatchScope, Binding, BindingScope, Computed, Notifier, Observed, Property, Signal, Source,
    Subscription, Teardown, batch,
};
pub use timed_override::TimedOverride;
pub use toggle::{ExclusiveResource, ToggleOptions, ToggleResource, ToggleState};
