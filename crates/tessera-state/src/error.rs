//! State error types

use thiserror::Error;

/// Errors raised at the execution environment boundary.
///
/// These are never in-VM exceptions: the EVM propagates them out of
/// `run_call` instead of folding them into the execution result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// commit/revert without an open checkpoint
    #[error("no open checkpoint")]
    NoCheckpoint,

    /// Backend unavailable or failed
    #[error("state backend error: {0}")]
    Backend(String),

    /// Stored data could not be decoded
    #[error("invalid data format: {0}")]
    InvalidFormat(String),
}

/// Result type for state operations
pub type StateResult<T> = Result<T, StateError>;
