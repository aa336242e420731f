//! # tessera-primitives
//!
//! Fixed-width value types shared by every Tessera crate.
//!
//! - [`Address`]: 20-byte account identifier
//! - [`H256`]: 32-byte hash / storage key
//! - [`U256`]: the 256-bit machine word

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod hash;

pub use address::{Address, AddressError};
pub use error::PrimitiveError;
pub use hash::{HashError, H256};

pub use primitive_types::U256;

/// Gas units
pub type Gas = u64;

/// Account nonce
pub type Nonce = u64;

/// Encode a word as 32 big-endian bytes.
pub fn word_to_bytes(word: U256) -> [u8; 32] {
    let mut out = [0u8; 32];
    word.to_big_endian(&mut out);
    out
}

/// Decode up to 32 big-endian bytes into a word. Shorter input is left-padded.
pub fn word_from_bytes(bytes: &[u8]) -> U256 {
    U256::from_big_endian(bytes)
}
