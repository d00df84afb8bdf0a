use std::path::PathBuf;

use ricebar_core::LoopError;
use ricebar_runtime::RuntimeError;
use ricebar_widgets::WidgetError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("widget setup failed: {0}")]
    Widget(#[from] WidgetError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("event loop: {0}")]
    Loop(#[from] LoopError),

    #[error("logging setup failed: {message}")]
    Logging { message: String },
}

impl AppError {
    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io { .. } | Self::Toml(_) | Self::InvalidConfig { .. } | Self::Widget(_) => 2,
            Self::Runtime(_) | Self::Loop(_) | Self::Logging { .. } => 1,
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
