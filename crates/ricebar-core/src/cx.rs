//! Cancellation context (`Cx`) for the panel's lifetime.
//!
//! The binary owns a root `Cx`. The event loop's `run` returns once it is
//! cancelled, and external command invocations run under a child context,
//! so they are refused once either the child or the root is cancelled.
//!
//! `Cx` is cheaply cloneable (`Arc` inside) and immutable from the outside. To
//! cancel, hold the companion [`CxController`].
//!
//! ```
//! use ricebar_core::cx::Cx;
//!
//! let (root, ctrl) = Cx::background();
//! let (commands, _commands_ctrl) = root.child();
//! ctrl.cancel();
//! assert!(commands.is_cancelled());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tracing::debug;

static NEXT_CX_ID: AtomicU64 = AtomicU64::new(1);

fn next_cx_id() -> u64 {
    NEXT_CX_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug)]
struct CxInner {
    id: u64,
    cancelled: AtomicBool,
    parent: Option<Arc<CxInner>>,
}

impl CxInner {
    fn is_cancelled(&self) -> bool {
        if self.cancelled.load(Ordering::Acquire) {
            return true;
        }
        self.parent.as_ref().is_some_and(|p| p.is_cancelled())
    }
}

/// Cancellation context handle.
///
/// Check `is_cancelled()` at natural yield points (timer callbacks, before
/// spawning a command, after an await).
#[derive(Clone, Debug)]
pub struct Cx {
    inner: Arc<CxInner>,
}

impl Cx {
    /// Create a root context.
    #[must_use]
    pub fn background() -> (Self, CxController) {
        Self::new_inner(None)
    }

    /// Derive a child context. Cancelling the parent also cancels the child.
    #[must_use]
    pub fn child(&self) -> (Self, CxController) {
        Self::new_inner(Some(self.inner.clone()))
    }

    fn new_inner(parent: Option<Arc<CxInner>>) -> (Self, CxController) {
        let inner = Arc::new(CxInner {
            id: next_cx_id(),
            cancelled: AtomicBool::new(false),
            parent,
        });
        (
            Self {
                inner: inner.clone(),
            },
            CxController { inner },
        )
    }

    /// Unique identifier for this context (for logging).
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Check if this context (or any ancestor) has been cancelled.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }
}

/// Control handle for a [`Cx`].
///
/// Dropping the controller does **not** cancel the context; cancellation is
/// always explicit.
#[derive(Debug)]
pub struct CxController {
    inner: Arc<CxInner>,
}

impl CxController {
    /// Cancel the associated context and every child derived from it.
    pub fn cancel(&self) {
        let was_cancelled = self.inner.cancelled.swap(true, Ordering::Release);
        if !was_cancelled {
            debug!(cx_id = self.inner.id, "cx cancelled");
        }
    }
}
