use ricebar_runtime::RuntimeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WidgetError>;

/// Errors building a widget.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WidgetError {
    #[error("invalid clock format {format:?}")]
    InvalidClockFormat { format: String },

    #[error("battery width must be positive, got {width}")]
    InvalidWidth { width: f64 },

    #[error("high usage threshold must be within 0..=1, got {threshold}")]
    InvalidThreshold { threshold: f64 },

    #[error("connect command is empty")]
    EmptyCommand,

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
