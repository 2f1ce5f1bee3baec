//! Unified error types for the tutor.
//!
//! Only two kinds of failure surface as `Err`: I/O and parse failures in the
//! stores, and invalid-state programming errors in the scheduler. Content
//! shortfalls are `None`, malformed answers are a retry signal, and missing
//! optional data degrades to an empty table through [`FailOpen`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for tutor operations.
#[derive(Error, Debug)]
pub enum TutorError {
    /// I/O errors from content or mastery file operations.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON or TOML parsing/serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Operation called on a record in the wrong scheduling mode.
    #[error("invalid state: {message}")]
    InvalidState { message: String },

    /// Knowledge item not present in the graph.
    #[error("item not found: {item_id}")]
    ItemNotFound { item_id: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// Content data that parses but cannot be used (duplicate IDs, bad tags).
    #[error("content error: {message}")]
    Content { message: String },
}

/// A specialized Result type for tutor operations.
pub type Result<T> = std::result::Result<T, TutorError>;

impl TutorError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create an item not found error.
    pub fn item_not_found(item_id: impl Into<String>) -> Self {
        Self::ItemNotFound {
            item_id: item_id.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a content error.
    pub fn content(message: impl Into<String>) -> Self {
        Self::Content {
            message: message.into(),
        }
    }

    /// Whether this error is a programming error that must abort the caller.
    ///
    /// Invalid-state errors are never recovered from; everything else may be
    /// degraded at a boundary with [`FailOpen`].
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }
}

impl From<io::Error> for TutorError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for TutorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Trait for fail-open error handling.
///
/// Used where a data source is optional: log the error and carry on with a
/// safe default instead of aborting the session.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }
}

/// Exit codes for the tutor CLI.
pub mod exit_codes {
    /// Command completed.
    pub const SUCCESS: i32 = 0;

    /// Command failed with a reported error.
    pub const FAILURE: i32 = 1;

    /// Process panicked.
    pub const CRASH: i32 = 3;
}
