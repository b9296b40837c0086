//! Error types for LessonForge.
//!
//! Library crates use [`LessonForgeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;
use std::time::Duration;

/// Pipeline stage at which a generation request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// The generative service was unreachable, erroring, or too slow.
    Transport,
    /// No plausible JSON span was found in the response text.
    Extraction,
    /// A span was found but it is not valid JSON.
    Parse,
    /// The JSON parsed but is structurally incomplete.
    Validation,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Extraction => "extraction",
            Self::Parse => "parse",
            Self::Validation => "validation",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error type for all LessonForge operations.
#[derive(Debug, thiserror::Error)]
pub enum LessonForgeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Caller input rejected before any pipeline stage ran.
    #[error("invalid input: {message}")]
    Input { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The generative service could not be reached or returned an error.
    #[error("transport failure: {message}")]
    Transport {
        message: String,
        /// Response body returned by the service, if any.
        body: Option<String>,
    },

    /// The generative service did not answer within the configured bound.
    #[error("transport failure: no response within {0:?}")]
    Timeout(Duration),

    /// No JSON span could be located in the response text.
    #[error("extraction failure: {message}")]
    Extraction { message: String, raw: String },

    /// A JSON span was located but did not parse.
    #[error("parse failure: {message}")]
    Parse { message: String, raw: String },

    /// The payload parsed but cannot be repaired into an assignment.
    #[error("validation failure: {message}")]
    Validation {
        message: String,
        raw: Option<String>,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LessonForgeError>;

impl LessonForgeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an input error from any displayable message.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input {
            message: msg.into(),
        }
    }

    /// Create a transport error without a response body.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            message: msg.into(),
            body: None,
        }
    }

    /// Create a validation error with no raw diagnostic attached.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            raw: None,
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach raw diagnostic text to a validation error. Other variants are
    /// returned unchanged.
    pub fn with_raw(self, text: impl Into<String>) -> Self {
        match self {
            Self::Validation { message, raw: None } => Self::Validation {
                message,
                raw: Some(text.into()),
            },
            other => other,
        }
    }

    /// The pipeline stage this error belongs to, if it came from generation.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            Self::Transport { .. } | Self::Timeout(_) => Some(PipelineStage::Transport),
            Self::Extraction { .. } => Some(PipelineStage::Extraction),
            Self::Parse { .. } => Some(PipelineStage::Parse),
            Self::Validation { .. } => Some(PipelineStage::Validation),
            Self::Config { .. } | Self::Input { .. } | Self::Io { .. } => None,
        }
    }

    /// Best available raw text for diagnostics.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::Transport { body, .. } => body.as_deref(),
            Self::Extraction { raw, .. } | Self::Parse { raw, .. } => Some(raw),
            Self::Validation { raw, .. } => raw.as_deref(),
            Self::Config { .. } | Self::Input { .. } | Self::Io { .. } | Self::Timeout(_) => None,
        }
    }
}
