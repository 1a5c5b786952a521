//! Error types
//!
//! Failure inside the engine travels on two separate channels: the `Err`
//! arm of a [`JsResult`] (the boolean at the C boundary) and the context's
//! pending exception. [`Throw`] carries no payload; the exception, if any,
//! lives on the [`Context`](crate::Context). [`JsError`] is what leaves the
//! engine once a caller gives up on the failure.

use thiserror::Error;

use crate::value::Value;

/// Marker for a failed operation.
///
/// The context may or may not hold a pending exception. Failing without
/// one is an uncatchable error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Throw;

/// Result of an engine operation
pub type JsResult<T> = std::result::Result<T, Throw>;

/// Built-in error constructors that the engine can report
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// `Error`
    Error,
    /// `TypeError`
    TypeError,
    /// `RangeError`
    RangeError,
    /// `ReferenceError`
    ReferenceError,
    /// `InternalError`
    InternalError,
}

impl ErrorKind {
    /// Constructor name
    pub fn name(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::TypeError => "TypeError",
            Self::RangeError => "RangeError",
            Self::ReferenceError => "ReferenceError",
            Self::InternalError => "InternalError",
        }
    }
}

/// Errors surfaced to embedders
#[derive(Debug, Error)]
pub enum JsError {
    /// A catchable exception escaped
    #[error("Uncaught exception: {message}")]
    Exception {
        /// The thrown value
        value: Value,
        /// Rendered message
        message: String,
    },

    /// An operation failed without setting a pending exception
    #[error("operation failed without a pending exception")]
    Uncatchable,

    /// Malformed configuration
    #[error("invalid context options: {0}")]
    Config(#[from] serde_json::Error),

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl JsError {
    /// Thrown value, for `Exception`
    pub fn value(&self) -> Option<Value> {
        match self {
            Self::Exception { value, .. } => Some(*value),
            _ => None,
        }
    }
}

/// Result type for embedder-facing APIs
pub type Result<T> = std::result::Result<T, JsError>;
