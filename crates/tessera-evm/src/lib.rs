//! # tessera-evm
//!
//! EVM execution engine.
//!
//! This crate provides:
//! - [`Stack`], [`Memory`] and [`TransientStorage`]
//! - the opcode table and instruction handlers
//! - the [`Interpreter`] fetch-decode-execute loop with gas metering
//! - the [`Evm`] orchestrator for nested calls and contract creation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod context;
pub mod error;
pub mod evm;
pub mod gas;
pub mod host;
pub mod instructions;
pub mod interpreter;
pub mod memory;
pub mod message;
pub mod opcode;
pub mod stack;
pub mod transient;

pub use config::{ConfigError, EvmConfig, Hardfork};
pub use context::{BlockContext, Environment, TxContext};
pub use error::{EvmError, EvmResult, ExecResult, Log};
pub use evm::{Evm, RunCallOpts, RunCallResult};
pub use host::Host;
pub use interpreter::{Interpreter, InterpreterResult, RunOptions, RunState};
pub use memory::Memory;
pub use message::Message;
pub use opcode::{OpInfo, OpcodeTable};
pub use stack::Stack;
pub use transient::TransientStorage;
