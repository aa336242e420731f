//! EVM error types

use std::collections::HashSet;

use bytes::Bytes;
use tessera_primitives::{Address, H256};
use tessera_state::StateError;
use thiserror::Error;

use crate::config::ConfigError;

/// EVM execution errors.
///
/// Everything except the variants reported by [`EvmError::is_fatal`] is an
/// in-VM exception: it halts the current frame and is reported on
/// [`ExecResult::exception_error`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvmError {
    /// Out of gas
    #[error("out of gas")]
    OutOfGas,

    /// Stack underflow
    #[error("stack underflow")]
    StackUnderflow,

    /// Stack overflow
    #[error("stack overflow")]
    StackOverflow,

    /// Value does not fit in a 256-bit word
    #[error("value out of range")]
    OutOfRange,

    /// Invalid opcode
    #[error("invalid opcode: 0x{0:02x}")]
    InvalidOpcode(u8),

    /// Explicit REVERT. Return data is kept on the result.
    #[error("execution reverted")]
    Revert,

    /// Insufficient balance for transfer
    #[error("insufficient balance")]
    InsufficientBalance,

    /// Message has neither a code address nor a target
    #[error("missing code address")]
    MissingCodeAddress,

    /// Invalid jump destination
    #[error("invalid jump destination: {0}")]
    InvalidJump(usize),

    /// Deployed code over the configured limit
    #[error("code size exceeded: {size} > {limit}")]
    CodeSizeExceeded {
        /// Returned code length
        size: usize,
        /// Configured maximum
        limit: usize,
    },

    /// Transient storage key is not 32 bytes
    #[error("transient storage key must be 32 bytes, got {0}")]
    TransientKeySize(usize),

    /// Transient storage value is longer than 32 bytes
    #[error("transient storage value must be at most 32 bytes, got {0}")]
    TransientValueSize(usize),

    /// Execution walked into BEGINSUB
    #[error("invalid BEGINSUB")]
    InvalidBeginSub,

    /// JUMPSUB target is not a BEGINSUB
    #[error("invalid JUMPSUB destination: {0}")]
    InvalidJumpSub(usize),

    /// RETURNSUB with an empty return stack
    #[error("invalid RETURNSUB")]
    InvalidReturnSub,

    /// Write in static context
    #[error("state modification in static context")]
    StaticCallViolation,

    /// Memory write with mismatched length
    #[error("invalid memory access")]
    InvalidMemoryAccess,

    /// Return data out of bounds
    #[error("return data out of bounds")]
    ReturnDataOutOfBounds,

    /// Call depth exceeded
    #[error("call depth exceeded")]
    CallDepthExceeded,

    /// Nonce would overflow
    #[error("nonce overflow")]
    NonceOverflow,

    /// Balance credit would overflow a word
    #[error("value overflow")]
    ValueOverflow,

    /// commit/revert of transient storage without a checkpoint
    #[error("no open checkpoint")]
    NoCheckpoint,

    /// Configuration rejected
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// State backend failure
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl EvmError {
    /// Environment-boundary malfunctions that must escape the interpreter
    /// instead of being folded into the execution result.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EvmError::State(_) | EvmError::Config(_) | EvmError::Internal(_) | EvmError::NoCheckpoint
        )
    }
}

/// Result type for EVM operations
pub type EvmResult<T> = Result<T, EvmError>;

/// Log entry emitted by LOG opcodes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Log {
    /// Contract address that emitted the log
    pub address: Address,
    /// Log topics (0-4)
    pub topics: Vec<H256>,
    /// Log data
    pub data: Bytes,
}

/// Outcome of one message execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Return data (or revert data)
    pub return_value: Bytes,
    /// Gas charged to the caller
    pub execution_gas_used: u64,
    /// Accumulated refund counter
    pub gas_refund: u64,
    /// Set when the frame did not halt normally
    pub exception_error: Option<EvmError>,
    /// Logs emitted, in order
    pub logs: Vec<Log>,
    /// Accounts scheduled for removal
    pub selfdestruct: HashSet<Address>,
}

impl ExecResult {
    /// Result of a message that never reached the interpreter
    pub fn short_circuit(gas_refund: u64, exception_error: Option<EvmError>) -> Self {
        Self {
            gas_refund,
            exception_error,
            ..Default::default()
        }
    }

    /// Whether the frame halted without an exception
    pub fn is_success(&self) -> bool {
        self.exception_error.is_none()
    }

    /// Whether the frame ended in an explicit REVERT
    pub fn is_revert(&self) -> bool {
        matches!(self.exception_error, Some(EvmError::Revert))
    }

    /// Turn this result into a fault that consumes the whole gas limit.
    pub fn into_fault(self, gas_limit: u64, error: EvmError) -> Self {
        Self {
            return_value: Bytes::new(),
            execution_gas_used: gas_limit,
            gas_refund: self.gas_refund,
            exception_error: Some(error),
            logs: Vec::new(),
            selfdestruct: HashSet::new(),
        }
    }
}
