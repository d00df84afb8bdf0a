#![forbid(unsafe_code)]

//! Core: time sources, cancellation contexts, and the cooperative event loop
//! every ricebar widget runs on.

pub mod clock;
pub mod cx;
pub mod event_loop;

pub use clock::{LabClock, TimeSource};
pub use cx::{Cx, CxController};
pub use event_loop::{EventLoop, LoopError, TimerHandle, TimerId};
