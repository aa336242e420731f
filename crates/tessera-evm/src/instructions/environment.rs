//! Execution environment, transaction and block queries

use primitive_types::U256;
use tessera_primitives::{word_from_bytes, Address};

use super::{as_usize_saturated, copy_to_memory};
use crate::config::EvmConfig;
use crate::error::{EvmError, EvmResult};
use crate::gas;
use crate::host::Host;
use crate::interpreter::RunState;

pub fn address(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let word = state.env.address.to_word();
    state.stack.push(word)
}

pub fn balance(state: &mut RunState, host: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let address = Address::from_word(state.stack.pop()?);
    let balance = host.balance(&address)?;
    state.stack.push(balance)
}

pub fn origin(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let word = state.env.origin.to_word();
    state.stack.push(word)
}

pub fn caller(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let word = state.env.caller.to_word();
    state.stack.push(word)
}

pub fn callvalue(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let value = state.env.call_value;
    state.stack.push(value)
}

/// 32 bytes of call data at `offset`, zero-padded past the end
pub fn calldataload(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let offset = as_usize_saturated(state.stack.pop()?);
    let data = &state.env.call_data;
    let mut word = [0u8; 32];
    if offset < data.len() {
        let end = offset.saturating_add(32).min(data.len());
        word[..end - offset].copy_from_slice(&data[offset..end]);
    }
    state.stack.push(word_from_bytes(&word))
}

pub fn calldatasize(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let size = state.env.call_data.len();
    state.stack.push(U256::from(size))
}

pub fn calldatacopy(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let dest = state.stack.pop()?;
    let offset = state.stack.pop()?;
    let size = state.stack.pop()?;
    let data = state.env.call_data.clone();
    copy_to_memory(state, dest, offset, size, &data)
}

pub fn codesize(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let size = state.code.len();
    state.stack.push(U256::from(size))
}

pub fn codecopy(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let dest = state.stack.pop()?;
    let offset = state.stack.pop()?;
    let size = state.stack.pop()?;
    let code = state.code.clone();
    copy_to_memory(state, dest, offset, size, &code)
}

pub fn gasprice(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let price = state.env.gas_price;
    state.stack.push(price)
}

pub fn extcodesize(state: &mut RunState, host: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let address = Address::from_word(state.stack.pop()?);
    let size = host.code(&address)?.len();
    state.stack.push(U256::from(size))
}

pub fn extcodecopy(state: &mut RunState, host: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let address = Address::from_word(state.stack.pop()?);
    let dest = state.stack.pop()?;
    let offset = state.stack.pop()?;
    let size = state.stack.pop()?;
    let code = host.code(&address)?;
    copy_to_memory(state, dest, offset, size, &code)
}

pub fn extcodehash(state: &mut RunState, host: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let address = Address::from_word(state.stack.pop()?);
    let hash = host.code_hash(&address)?;
    state.stack.push(hash.to_word())
}

pub fn returndatasize(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let size = state.return_data.len();
    state.stack.push(U256::from(size))
}

/// Unlike the other copies, reading past the end of the return buffer faults
pub fn returndatacopy(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let dest = state.stack.pop()?;
    let offset = state.stack.pop()?;
    let size = state.stack.pop()?;
    let (end, overflow) = offset.overflowing_add(size);
    if overflow || end > U256::from(state.return_data.len()) {
        return Err(EvmError::ReturnDataOutOfBounds);
    }
    let (dest, size) = state.memory_range(dest, size)?;
    state.use_gas(gas::copy_gas(size))?;
    if size == 0 {
        return Ok(());
    }
    let offset = offset.as_usize();
    let data = state.return_data.slice(offset..offset + size);
    state.memory.write(dest, size, &data)
}

/// Block hashes are not tracked; always zero
pub fn blockhash(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    state.stack.pop()?;
    state.stack.push(U256::zero())
}

pub fn coinbase(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let word = state.env.block.coinbase.to_word();
    state.stack.push(word)
}

pub fn timestamp(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let timestamp = state.env.block.timestamp;
    state.stack.push(U256::from(timestamp))
}

pub fn number(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let number = state.env.block.number;
    state.stack.push(U256::from(number))
}

pub fn prevrandao(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let word = state.env.block.prevrandao.to_word();
    state.stack.push(word)
}

pub fn gaslimit(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let limit = state.env.block.gas_limit;
    state.stack.push(U256::from(limit))
}

pub fn chainid(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let chain_id = state.env.block.chain_id;
    state.stack.push(U256::from(chain_id))
}

pub fn selfbalance(state: &mut RunState, host: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let balance = host.balance(&state.env.address)?;
    state.stack.push(balance)
}

pub fn basefee(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let base_fee = state.env.block.base_fee;
    state.stack.push(base_fee)
}
