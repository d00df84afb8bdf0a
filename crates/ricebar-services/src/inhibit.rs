//! Session idle inhibition.
//!
//! The session manager hands out a numeric cookie per inhibition, with `0`
//! meaning the request failed. [`Inhibitor`] turns that protocol into an
//! [`ExclusiveResource`] whose token can only be released once.

use std::num::NonZeroU32;
use std::rc::Rc;

use futures_util::future::{self, LocalBoxFuture};
use futures_util::FutureExt;
use ricebar_runtime::{AcquireError, ExclusiveResource};
use tracing::debug;

/// What an inhibition prevents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InhibitKind {
    Logout,
    UserSwitch,
    Suspend,
    Idle,
}

/// The session's inhibition manager.
pub trait InhibitManager {
    /// Request an inhibition. Returns the cookie, or `0` on failure.
    fn inhibit(&self, kind: InhibitKind, reason: &str) -> u32;
    /// End the inhibition identified by `cookie`.
    fn uninhibit(&self, cookie: u32);
}

/// Proof of a live inhibition.
///
/// Not `Clone`: releasing consumes the token.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct InhibitToken {
    cookie: NonZeroU32,
}

impl InhibitToken {
    #[must_use]
    pub fn cookie(&self) -> u32 {
        self.cookie.get()
    }
}

/// A fixed inhibition request, acquirable as an [`ExclusiveResource`].
#[derive(Clone)]
pub struct Inhibitor {
    manager: Rc<dyn InhibitManager>,
    kind: InhibitKind,
    reason: String,
}

impl Inhibitor {
    pub fn new(manager: Rc<dyn InhibitManager>, kind: InhibitKind, reason: impl Into<String>) -> Self {
        Self {
            manager,
            kind,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    #[must_use]
    pub fn kind(&self) -> InhibitKind {
        self.kind
    }
}

impl std::fmt::Debug for Inhibitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inhibitor")
            .field("kind", &self.kind)
            .field("reason", &self.reason)
            .finish()
    }
}

impl ExclusiveResource for Inhibitor {
    type Token = InhibitToken;

    fn acquire(&self) -> LocalBoxFuture<'static, Result<InhibitToken, AcquireError>> {
        let cookie = self.manager.inhibit(self.kind, &self.reason);
        let result = match NonZeroU32::new(cookie) {
            Some(cookie) => {
                debug!(cookie = cookie.get(), kind = ?self.kind, "inhibition granted");
                Ok(InhibitToken { cookie })
            }
            None => Err(AcquireError::Refused {
                reason: "inhibit returned cookie 0".to_string(),
            }),
        };
        future::ready(result).boxed_local()
    }

    fn release(&self, token: InhibitToken) {
        debug!(cookie = token.cookie(), "inhibition released");
        self.manager.uninhibit(token.cookie());
    }
}
