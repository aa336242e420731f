//! Instruction handlers, grouped by opcode family.
//!
//! Every handler has the [`Handler`](crate::opcode::Handler) signature. The
//! static fee is already charged and the program counter already points past
//! the opcode byte when a handler runs.

#![allow(missing_docs)]

pub mod arithmetic;
pub mod bitwise;
pub mod control;
pub mod environment;
pub mod memory;
pub mod stack;
pub mod storage;
pub mod system;

use primitive_types::U256;

use crate::error::EvmResult;
use crate::gas;
use crate::interpreter::RunState;

/// 1 for true, 0 for false
pub(crate) fn bool_to_word(value: bool) -> U256 {
    if value {
        U256::one()
    } else {
        U256::zero()
    }
}

/// Clamp a word to `usize::MAX`
pub(crate) fn as_usize_saturated(value: U256) -> usize {
    if value > U256::from(usize::MAX) {
        usize::MAX
    } else {
        value.as_usize()
    }
}

/// Shared body of CALLDATACOPY, CODECOPY and EXTCODECOPY: charge memory and
/// copy gas, then copy `src[offset..offset + size]` into memory at `dest`,
/// zero-filling past the end of `src`.
pub(crate) fn copy_to_memory(
    state: &mut RunState,
    dest: U256,
    offset: U256,
    size: U256,
    src: &[u8],
) -> EvmResult<()> {
    let (dest, size) = state.memory_range(dest, size)?;
    state.use_gas(gas::copy_gas(size))?;
    if size == 0 {
        return Ok(());
    }
    let offset = as_usize_saturated(offset);
    let mut data = vec![0u8; size];
    if offset < src.len() {
        let end = offset.saturating_add(size).min(src.len());
        data[..end - offset].copy_from_slice(&src[offset..end]);
    }
    state.memory.write(dest, size, &data)
}
