//! Memory access and hashing

use primitive_types::U256;
use tessera_crypto::keccak256 as hash;

use crate::config::EvmConfig;
use crate::error::EvmResult;
use crate::gas;
use crate::host::Host;
use crate::interpreter::RunState;

pub fn mload(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let offset = state.stack.pop()?;
    let (offset, _) = state.memory_range(offset, U256::from(32))?;
    let word = state.memory.load_word(offset)?;
    state.stack.push(word)
}

pub fn mstore(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let offset = state.stack.pop()?;
    let value = state.stack.pop()?;
    let (offset, _) = state.memory_range(offset, U256::from(32))?;
    state.memory.store_word(offset, value)
}

/// Store the low byte of the value
pub fn mstore8(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let offset = state.stack.pop()?;
    let value = state.stack.pop()?;
    let (offset, _) = state.memory_range(offset, U256::one())?;
    state.memory.store_byte(offset, value.low_u32() as u8)
}

pub fn msize(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let size = state.memory.len();
    state.stack.push(U256::from(size))
}

/// EIP-5656 overlap-safe copy
pub fn mcopy(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let dest = state.stack.pop()?;
    let src = state.stack.pop()?;
    let size = state.stack.pop()?;
    let (_, size) = state.memory_range(dest.max(src), size)?;
    state.use_gas(gas::copy_gas(size))?;
    if size == 0 {
        return Ok(());
    }
    // the larger offset fits, so both do
    let (dest, src) = (dest.as_usize(), src.as_usize());
    state.memory.copy_within(dest, src, size)
}

pub fn keccak256(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let offset = state.stack.pop()?;
    let size = state.stack.pop()?;
    let (offset, size) = state.memory_range(offset, size)?;
    state.use_gas(gas::sha3_gas(size))?;
    let data = state.memory.read(offset, size)?;
    state.stack.push(hash(&data).to_word())
}
