//! Error types for the moving tux controller.
//!
//! Hardware and render failures are recoverable and absorbed inside the
//! worker; only resource absence at worker start is fatal.

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a single paint request could not be honoured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("no framebuffer is bound to the active console")]
    SurfaceUnavailable,

    #[error("logo asset is not available")]
    LogoUnavailable,

    #[error("x: {x} y: {y} is out of range")]
    OutOfRange { x: i32, y: i32 },
}

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("hardware random source did not produce a usable value")]
    RandomUnavailable,

    #[error("render unavailable: {0}")]
    Render(#[from] RenderError),

    #[error("invalid value for control attribute: {input:?}")]
    InvalidValue { input: String },

    #[error("resource initialisation failed: {reason}")]
    ResourceInitFailure { reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to spawn movement worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("movement worker panicked")]
    WorkerPanicked,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_value(input: &str) -> Self {
        Error::InvalidValue {
            input: input.to_string(),
        }
    }

    pub(crate) fn init_failure(reason: impl Into<String>) -> Self {
        Error::ResourceInitFailure {
            reason: reason.into(),
        }
    }

    /// True for errors the worker absorbs without stopping.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::RandomUnavailable | Error::Render(_) | Error::InvalidValue { .. }
        )
    }
}
