//! Error handling for livetune-rs
//!
//! This module defines the error taxonomy shared by the field tuner and the
//! frame queue, plus a Result alias for use throughout the crate.

use thiserror::Error;

/// Main error type for livetune-rs operations
#[derive(Error, Debug)]
pub enum TuneError {
    /// A virtual field read or write failed
    #[error("Access error on field '{field}': {message}")]
    Access { field: String, message: String },

    /// User input could not be parsed for a typed field
    #[error("Invalid input '{input}' for field '{field}': expected {expected}")]
    Parse {
        field: String,
        input: String,
        expected: &'static str,
    },

    /// An edit addressed a field that is not registered
    #[error("Field not found: {0}")]
    NotFound(String),

    /// Two discovered fields share a name
    #[error("Duplicate field name: {0}")]
    DuplicateField(String),

    /// A widget addressed a component the field does not render
    #[error("Component {index} out of range for field '{field}' ({count} components)")]
    ComponentOutOfRange {
        field: String,
        index: usize,
        count: usize,
    },

    /// A typed write carried a value of the wrong kind
    #[error("Kind mismatch on field '{field}': expected {expected}, found {found}")]
    KindMismatch {
        field: String,
        expected: String,
        found: String,
    },

    /// No free buffer was available under a non-blocking policy
    #[error("Pool exhausted: all {capacity} buffers are checked out")]
    PoolExhausted { capacity: usize },

    /// A buffer was released that is not checked out from this pool
    #[error("Illegal release of slot {slot}: {reason}")]
    IllegalRelease { slot: usize, reason: &'static str },

    /// A frame from another pool was posted to a queue
    #[error("Frame from pool {frame_pool} posted to queue backed by pool {queue_pool}")]
    ForeignFrame { frame_pool: u64, queue_pool: u64 },

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<TuneError>,
    },
}

impl TuneError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        TuneError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Build an access error for a named field
    pub fn access(field: impl Into<String>, message: impl Into<String>) -> Self {
        TuneError::Access {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The innermost error, with any context layers stripped
    pub fn root(&self) -> &TuneError {
        match self {
            TuneError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether this error is a user-input validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self.root(), TuneError::Parse { .. })
    }
}

/// Result type alias for livetune-rs operations
pub type Result<T> = std::result::Result<T, TuneError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
