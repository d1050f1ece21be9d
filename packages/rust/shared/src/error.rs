//! Error types for interbuild.
//!
//! Library crates use [`InterbuildError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all interbuild operations.
#[derive(Debug, thiserror::Error)]
pub enum InterbuildError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Failure acquiring a participant's build session or building its model.
    #[error("launch error for participant {participant:?}: {message}")]
    Launch {
        participant: PathBuf,
        message: String,
    },

    /// Failure while registering discovered components.
    #[error("registry error: {0}")]
    Registry(String),

    /// Failure stopping a build session during cleanup.
    #[error("release error: {0}")]
    Release(String),

    /// The composite build was cancelled between participants.
    #[error("composite context build cancelled")]
    Cancelled,

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failure writing to a diagnostic or context output stream.
    #[error("output error: {0}")]
    Output(String),

    /// Data validation error (invalid paths, malformed manifests, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, InterbuildError>;

impl InterbuildError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a launch error scoped to one participant.
    pub fn launch(participant: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Launch {
            participant: participant.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
