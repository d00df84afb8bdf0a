#![forbid(unsafe_code)]

//! Toggle state machine over one exclusive external resource.
//!
//! [`ToggleResource`] wraps the acquisition and release of a single handle
//! (an idle-inhibitor cookie, for example) behind an on/off switch:
//!
//! ```text
//! Inactive --enable--> Acquiring --ok--> Active --disable--> Inactive
//!                          |
//!                          +--error--> Inactive (+ transient error)
//! ```
//!
//! # Invariants
//!
//! 1. A token is held if and only if the state is `Active`.
//! 2. Every acquired token is released exactly once: on disable, on
//!    teardown, or on arrival if the request was abandoned meanwhile,
//!    even when the switch itself has been dropped by then.
//! 3. A token that was never acquired is never released.
//! 4. After teardown, `enable` does nothing.
//!
//! # Failure Modes
//!
//! - **Acquisition fails**: the state rolls back to `Inactive` and the
//!   configured error message is shown through a [`TimedOverride`] for the
//!   configured duration.
//! - **Disabled while acquiring**: the request is abandoned; the token is
//!   released as soon as it arrives and the state stays `Inactive`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use ricebar_core::event_loop::EventLoop;
use tracing::{debug, info, warn};
use web_time::Duration;

use crate::error::AcquireError;
use crate::reactive::{Signal, Teardown};
use crate::timed_override::TimedOverride;

/// Default time an acquisition error stays visible.
pub const DEFAULT_ERROR_DURATION: Duration = Duration::from_secs(5);

/// An external resource that can be held by one owner at a time.
///
/// `release` consumes the token, so a token cannot be released twice.
pub trait ExclusiveResource: 'static {
    /// Proof of ownership handed out by a successful acquisition.
    type Token: 'static;

    /// Request the resource.
    fn acquire(&self) -> LocalBoxFuture<'static, Result<Self::Token, AcquireError>>;

    /// Give the resource back.
    fn release(&self, token: Self::Token);
}

/// Where a [`ToggleResource`] stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ToggleState {
    /// No token held, none requested.
    #[default]
    Inactive,
    /// A request is pending.
    Acquiring,
    /// A token is held.
    Active,
}

impl ToggleState {
    /// Whether the switch should render as on.
    ///
    /// A pending request renders as on, matching the user's click.
    #[must_use]
    pub fn is_on(self) -> bool {
        !matches!(self, Self::Inactive)
    }
}

/// Presentation settings for acquisition failures.
#[derive(Debug, Clone)]
pub struct ToggleOptions {
    /// Text shown while an acquisition error is displayed.
    pub error_message: String,
    /// How long the error stays visible.
    pub error_duration: Duration,
}

impl Default for ToggleOptions {
    fn default() -> Self {
        Self {
            error_message: "Request failed".to_string(),
            error_duration: DEFAULT_ERROR_DURATION,
        }
    }
}

struct ToggleInner<R: ExclusiveResource> {
    resource: Rc<R>,
    state: Signal<ToggleState>,
    token: RefCell<Option<R::Token>>,
    error: TimedOverride<Option<String>>,
    options: ToggleOptions,
    generation: Cell<u64>,
    torn_down: Cell<bool>,
    ev: EventLoop,
}

impl<R: ExclusiveResource> ToggleInner<R> {
    fn finish(&self, generation: u64, result: Result<R::Token, AcquireError>) {
        let current = generation == self.generation.get()
            && self.state.get() == ToggleState::Acquiring
            && !self.torn_down.get();
        match result {
            Ok(token) if current => {
                *self.token.borrow_mut() = Some(token);
                self.state.set(ToggleState::Active);
                info!("exclusive resource acquired");
            }
            Ok(token) => {
                debug!("acquisition arrived after it was abandoned; releasing");
                self.resource.release(token);
            }
            Err(err) if current => {
                warn!(error = %err, "acquisition failed; rolling back");
                self.state.set(ToggleState::Inactive);
                self.error.override_for(
                    Some(self.options.error_message.clone()),
                    self.options.error_duration,
                );
            }
            Err(err) => {
                debug!(error = %err, "abandoned acquisition failed");
            }
        }
    }

    fn release_held(&self) -> bool {
        let token = self.token.borrow_mut().take();
        match token {
            Some(token) => {
                self.resource.release(token);
                true
            }
            None => false,
        }
    }
}

impl<R: ExclusiveResource> Drop for ToggleInner<R> {
    fn drop(&mut self) {
        if let Some(token) = self.token.get_mut().take() {
            self.resource.release(token);
        }
    }
}

/// An on/off switch backed by an exclusive resource.
///
/// Cloning a `ToggleResource` creates another handle to the same switch.
pub struct ToggleResource<R: ExclusiveResource> {
    inner: Rc<ToggleInner<R>>,
}

impl<R: ExclusiveResource> Clone for ToggleResource<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<R: ExclusiveResource> std::fmt::Debug for ToggleResource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToggleResource")
            .field("state", &self.inner.state.get())
            .field("held", &self.is_held())
            .field("torn_down", &self.inner.torn_down.get())
            .finish()
    }
}

impl<R: ExclusiveResource> ToggleResource<R> {
    /// Wrap `resource` in a switch that starts `Inactive`.
    pub fn new(ev: &EventLoop, resource: R, options: ToggleOptions) -> Self {
        Self {
            inner: Rc::new(ToggleInner {
                resource: Rc::new(resource),
                state: Signal::new(ToggleState::Inactive),
                token: RefCell::new(None),
                error: TimedOverride::new(ev, None),
                options,
                generation: Cell::new(0),
                torn_down: Cell::new(false),
                ev: ev.clone(),
            }),
        }
    }

    /// Request the resource. Does nothing unless `Inactive`.
    pub fn enable(&self) {
        let inner = &self.inner;
        if inner.torn_down.get() {
            warn!("enable after teardown ignored");
            return;
        }
        if inner.state.get() != ToggleState::Inactive {
            return;
        }
        let generation = inner.generation.get() + 1;
        inner.generation.set(generation);
        inner.state.set(ToggleState::Acquiring);
        debug!(generation, "acquiring exclusive resource");

        let pending = inner.resource.acquire();
        let weak = Rc::downgrade(inner);
        let resource = Rc::clone(&inner.resource);
        inner.ev.spawn_local(async move {
            let result = pending.await;
            match weak.upgrade() {
                Some(inner) => inner.finish(generation, result),
                None => {
                    // The switch was dropped while the request was pending.
                    if let Ok(token) = result {
                        debug!("acquisition arrived after the switch was dropped; releasing");
                        resource.release(token);
                    }
                }
            }
        });
    }

    /// Release the resource, or abandon a pending request.
    pub fn disable(&self) {
        let inner = &self.inner;
        match inner.state.get() {
            ToggleState::Inactive => {}
            ToggleState::Acquiring => {
                inner.generation.set(inner.generation.get() + 1);
                inner.state.set(ToggleState::Inactive);
                debug!("pending acquisition abandoned");
            }
            ToggleState::Active => {
                inner.release_held();
                inner.state.set(ToggleState::Inactive);
                info!("exclusive resource released");
            }
        }
    }

    /// Flip the switch.
    pub fn toggle(&self) {
        if self.state() == ToggleState::Inactive {
            self.enable();
        } else {
            self.disable();
        }
    }

    /// Drive the switch to `on`, as a toggle button's handler would.
    pub fn set_active(&self, on: bool) {
        if on {
            self.enable();
        } else {
            self.disable();
        }
    }

    /// Release anything held and refuse further requests.
    ///
    /// Returns whether a token was released.
    pub fn shutdown(&self) -> bool {
        let inner = &self.inner;
        if inner.torn_down.replace(true) {
            return false;
        }
        inner.generation.set(inner.generation.get() + 1);
        let released = inner.release_held();
        inner.state.set(ToggleState::Inactive);
        inner.error.cancel();
        debug!(released, "toggle resource torn down");
        released
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> ToggleState {
        self.inner.state.get()
    }

    /// The signal holding the state.
    #[must_use]
    pub fn state_signal(&self) -> &Signal<ToggleState> {
        &self.inner.state
    }

    /// The transient error message, `None` when no error is shown.
    #[must_use]
    pub fn error(&self) -> &TimedOverride<Option<String>> {
        &self.inner.error
    }

    /// Whether a token is held.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.inner.token.borrow().is_some()
    }

    /// The wrapped resource.
    #[must_use]
    pub fn resource(&self) -> &R {
        &self.inner.resource
    }
}

impl<R: ExclusiveResource> Teardown for ToggleResource<R> {
    fn teardown(&self) {
        self.shutdown();
    }
}
