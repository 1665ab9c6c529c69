//! Error types shared across Photo Align crates.

use std::path::PathBuf;

/// Top-level error type for Photo Align operations.
#[derive(Debug, thiserror::Error)]
pub enum PhotoAlignError {
    #[error("Capture error: {message}")]
    Capture { message: String },

    /// A live stream could not be acquired. The host's message is kept
    /// verbatim because it is shown to the user as-is.
    #[error("{message}")]
    StreamAcquisition { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Platform error: {message}")]
    Platform { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using PhotoAlignError.
pub type PhotoAlignResult<T> = Result<T, PhotoAlignError>;

impl PhotoAlignError {
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture {
            message: msg.into(),
        }
    }

    pub fn stream_acquisition(msg: impl Into<String>) -> Self {
        Self::StreamAcquisition {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn platform(msg: impl Into<String>) -> Self {
        Self::Platform {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }
}
