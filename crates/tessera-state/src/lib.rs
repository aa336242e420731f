//! # tessera-state
//!
//! The boundary between the EVM core and persistent world state.
//!
//! This crate provides:
//! - [`StateAccess`], the execution environment interface the EVM drives
//! - [`Account`], the per-address record behind it
//! - [`InMemoryState`], a checkpointable `HashMap` implementation

#![warn(missing_docs)]
#![warn(clippy::all)]

mod account;
mod error;
mod memory;
mod traits;

pub use account::{Account, EMPTY_CODE_HASH, EMPTY_STORAGE_ROOT};
pub use error::{StateError, StateResult};
pub use memory::InMemoryState;
pub use traits::StateAccess;
