//! Error types for dynamenu-core.

use std::time::Duration;

use crate::delegate::DelegateOp;
use crate::value::CommandId;

/// An error raised by delegate code while answering an operation.
///
/// This is what a scripting environment would call a thrown exception. The
/// bridge never lets it escape; it is wrapped in [`DelegateError::CallFailed`]
/// and reported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DelegateException {
    message: String,
}

impl DelegateException {
    /// Create an exception with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The exception message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for DelegateException {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for DelegateException {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// A delegate call that did not produce an answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DelegateError {
    /// The delegate raised an exception.
    #[error("delegate operation `{operation}` failed for command {command_id}: {source}")]
    CallFailed {
        operation: DelegateOp,
        command_id: CommandId,
        #[source]
        source: DelegateException,
    },

    /// The delegate panicked.
    #[error("delegate operation `{operation}` panicked for command {command_id}: {message}")]
    Panicked {
        operation: DelegateOp,
        command_id: CommandId,
        message: String,
    },

    /// The execution context could not be entered in time.
    #[error("timed out after {timeout:?} waiting for the delegate context (`{operation}`)")]
    ContextTimeout {
        operation: DelegateOp,
        timeout: Duration,
    },
}

impl DelegateError {
    /// The operation that failed.
    pub fn operation(&self) -> DelegateOp {
        match self {
            Self::CallFailed { operation, .. }
            | Self::Panicked { operation, .. }
            | Self::ContextTimeout { operation, .. } => *operation,
        }
    }
}

/// Result type returned by delegate operations.
pub type DelegateResult<T> = std::result::Result<T, DelegateException>;
