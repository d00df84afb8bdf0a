//! Error types for the reactive runtime.

use thiserror::Error;

/// Errors reported while setting up or driving reactive nodes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Poll intervals must be positive.
    #[error("poll interval must be positive")]
    InvalidInterval,
    /// A mode switch request was rejected by the service.
    #[error("mode {mode:?} was rejected: {reason}")]
    ModeRejected { mode: String, reason: String },
}

/// Why an exclusive resource could not be acquired.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquireError {
    /// The resource manager answered, but refused.
    #[error("acquisition refused: {reason}")]
    Refused { reason: String },
    /// No resource manager is available on this platform.
    #[error("resource is not supported on this platform")]
    Unsupported,
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
