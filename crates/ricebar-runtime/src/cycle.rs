#![forbid(unsafe_code)]

//! Stepping through an ordered list of external modes.
//!
//! The selector never records the mode it asked for. The active mode shown
//! to the user comes from the service itself, so a rejected request leaves
//! the display on the mode the service actually reports.

use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use ricebar_core::event_loop::EventLoop;
use tracing::{debug, warn};

use crate::error::RuntimeError;

/// Which way to step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

/// Pointer button that triggered an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

impl Direction {
    /// Secondary click or a held shift key steps backward.
    #[must_use]
    pub fn from_click(button: PointerButton, shift: bool) -> Self {
        if shift || button == PointerButton::Secondary {
            Self::Backward
        } else {
            Self::Forward
        }
    }
}

/// The mode following `current` in `modes`, wrapping at both ends.
///
/// An unknown `current` yields the first mode going forward and the last
/// mode going backward. Returns `None` only for an empty list.
#[must_use]
pub fn next_mode<'a>(modes: &'a [String], current: Option<&str>, direction: Direction) -> Option<&'a str> {
    let len = modes.len();
    if len == 0 {
        return None;
    }
    let position = current.and_then(|c| modes.iter().position(|m| m == c));
    let index = match (position, direction) {
        (None, Direction::Forward) => 0,
        (None, Direction::Backward) => len - 1,
        (Some(i), Direction::Forward) => (i + 1) % len,
        (Some(i), Direction::Backward) => (i + len - 1) % len,
    };
    Some(modes[index].as_str())
}

/// A service with a list of modes and one active mode.
pub trait ModeSwitch {
    /// Every mode, in cycling order.
    fn modes(&self) -> Vec<String>;

    /// The mode the service reports as active.
    fn active_mode(&self) -> Option<String>;

    /// Ask the service to switch to `mode`.
    fn request_mode(&self, mode: &str) -> LocalBoxFuture<'static, Result<(), RuntimeError>>;
}

impl<M: ModeSwitch + ?Sized> ModeSwitch for Rc<M> {
    fn modes(&self) -> Vec<String> {
        (**self).modes()
    }

    fn active_mode(&self) -> Option<String> {
        (**self).active_mode()
    }

    fn request_mode(&self, mode: &str) -> LocalBoxFuture<'static, Result<(), RuntimeError>> {
        (**self).request_mode(mode)
    }
}

/// Cycles a [`ModeSwitch`] forward or backward.
pub struct CycleSelector<M> {
    switch: M,
    ev: EventLoop,
}

impl<M: std::fmt::Debug> std::fmt::Debug for CycleSelector<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CycleSelector")
            .field("switch", &self.switch)
            .finish()
    }
}

impl<M: ModeSwitch> CycleSelector<M> {
    pub fn new(ev: &EventLoop, switch: M) -> Self {
        Self {
            switch,
            ev: ev.clone(),
        }
    }

    /// Request the next mode in `direction`.
    ///
    /// Returns the requested mode, or `None` when there are no modes. The
    /// request completes on the event loop; failures are logged.
    pub fn cycle(&self, direction: Direction) -> Option<String> {
        let modes = self.switch.modes();
        let current = self.switch.active_mode();
        let Some(next) = next_mode(&modes, current.as_deref(), direction) else {
            debug!("no modes to cycle through");
            return None;
        };
        let next = next.to_string();
        debug!(from = current.as_deref().unwrap_or("<unknown>"), to = %next, ?direction, "cycling mode");
        let pending = self.switch.request_mode(&next);
        self.ev.spawn_local(async move {
            if let Err(err) = pending.await {
                warn!(error = %err, "mode switch failed");
            }
        });
        Some(next)
    }

    /// The wrapped switch.
    #[must_use]
    pub fn switch(&self) -> &M {
        &self.switch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::FutureExt;
    use ricebar_core::clock::LabClock;
    use std::cell::RefCell;

    fn modes(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn forward_steps_and_wraps() {
        let m = modes(&["A", "B", "C"]);
        assert_eq!(next_mode(&m, Some("B"), Direction::Forward), Some("C"));
        assert_eq!(next_mode(&m, Some("C"), Direction::Forward), Some("A"));
    }

    #[test]
    fn backward_steps_and_wraps() {
        let m = modes(&["A", "B", "C"]);
        assert_eq!(next_mode(&m, Some("B"), Direction::Backward), Some("A"));
        assert_eq!(next_mode(&m, Some("A"), Direction::Backward), Some("C"));
    }

    #[test]
    fn unknown_mode_picks_an_end() {
        let m = modes(&["A", "B", "C"]);
        assert_eq!(next_mode(&m, Some("turbo"), Direction::Forward), Some("A"));
        assert_eq!(next_mode(&m, Some("turbo"), Direction::Backward), Some("C"));
        assert_eq!(next_mode(&m, None, Direction::Forward), Some("A"));
    }

    #[test]
    fn empty_modes_yield_none() {
        assert_eq!(next_mode(&[], Some("A"), Direction::Forward), None);
    }

    #[test]
    fn single_mode_cycles_to_itself() {
        let m = modes(&["balanced"]);
        assert_eq!(next_mode(&m, Some("balanced"), Direction::Backward), Some("balanced"));
    }

    #[test]
    fn click_direction() {
        assert_eq!(Direction::from_click(PointerButton::Primary, false), Direction::Forward);
        assert_eq!(Direction::from_click(PointerButton::Secondary, false), Direction::Backward);
        assert_eq!(Direction::from_click(PointerButton::Primary, true), Direction::Backward);
        assert_eq!(Direction::from_click(PointerButton::Middle, false), Direction::Forward);
    }

    struct Profiles {
        modes: Vec<String>,
        active: RefCell<String>,
        requested: RefCell<Vec<String>>,
        reject: bool,
    }

    impl ModeSwitch for Profiles {
        fn modes(&self) -> Vec<String> {
            self.modes.clone()
        }

        fn active_mode(&self) -> Option<String> {
            Some(self.active.borrow().clone())
        }

        fn request_mode(&self, mode: &str) -> LocalBoxFuture<'static, Result<(), RuntimeError>> {
            self.requested.borrow_mut().push(mode.to_string());
            let result = if self.reject {
                Err(RuntimeError::ModeRejected {
                    mode: mode.to_string(),
                    reason: "not permitted".into(),
                })
            } else {
                Ok(())
            };
            async move { result }.boxed_local()
        }
    }

    fn profiles(reject: bool) -> Rc<Profiles> {
        Rc::new(Profiles {
            modes: modes(&["power-saver", "balanced", "performance"]),
            active: RefCell::new("balanced".into()),
            requested: RefCell::new(Vec::new()),
            reject,
        })
    }

    #[test]
    fn cycle_requests_without_touching_active_mode() {
        let ev = EventLoop::lab(&LabClock::new());
        let switch = profiles(false);
        let selector = CycleSelector::new(&ev, Rc::clone(&switch));
        assert_eq!(selector.cycle(Direction::Forward).as_deref(), Some("performance"));
        ev.run_until_stalled();
        assert_eq!(*switch.requested.borrow(), vec!["performance"]);
        assert_eq!(*switch.active.borrow(), "balanced");
    }

    #[test]
    fn rejected_request_is_logged_not_raised() {
        let ev = EventLoop::lab(&LabClock::new());
        let switch = profiles(true);
        let selector = CycleSelector::new(&ev, Rc::clone(&switch));
        assert_eq!(selector.cycle(Direction::Backward).as_deref(), Some("power-saver"));
        ev.run_until_stalled();
        assert_eq!(*switch.active.borrow(), "balanced");
    }
}
