//! Persistent (SLOAD/SSTORE) and transient (TLOAD/TSTORE) storage

use tessera_primitives::H256;

use crate::config::EvmConfig;
use crate::error::{EvmError, EvmResult};
use crate::gas::cost;
use crate::host::Host;
use crate::interpreter::RunState;

pub fn sload(state: &mut RunState, host: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let key = H256::from_word(state.stack.pop()?);
    let value = host.storage_load(&state.env.address, &key, false)?;
    state.stack.push(value.to_word())
}

/// Net gas metering (EIP-2200) with warm slot pricing. After the write the
/// frame's view of its own account is refreshed.
pub fn sstore(state: &mut RunState, host: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    state.require_non_static()?;
    if state.gas_left <= cost::SSTORE_SENTRY {
        return Err(EvmError::OutOfGas);
    }
    let key = H256::from_word(state.stack.pop()?);
    let value = H256::from_word(state.stack.pop()?);
    let address = state.env.address;

    let current = host.storage_load(&address, &key, false)?;
    let original = host.storage_load(&address, &key, true)?;
    charge_sstore(state, original, current, value)?;

    host.storage_store(address, key, value)?;
    state.env.contract = host.account(&address)?;
    Ok(())
}

fn charge_sstore(state: &mut RunState, original: H256, current: H256, new: H256) -> EvmResult<()> {
    if current == new {
        return state.use_gas(cost::WARM_ACCESS);
    }
    if original == current {
        if original.is_zero() {
            return state.use_gas(cost::SSTORE_SET);
        }
        if new.is_zero() {
            state.gas_refund += cost::SSTORE_CLEAR_REFUND;
        }
        return state.use_gas(cost::SSTORE_RESET);
    }

    // dirty slot
    if !original.is_zero() {
        if current.is_zero() {
            state.gas_refund = state.gas_refund.saturating_sub(cost::SSTORE_CLEAR_REFUND);
        } else if new.is_zero() {
            state.gas_refund += cost::SSTORE_CLEAR_REFUND;
        }
    }
    if original == new {
        let restored = if original.is_zero() {
            cost::SSTORE_SET
        } else {
            cost::SSTORE_RESET
        };
        state.gas_refund += restored - cost::WARM_ACCESS;
    }
    state.use_gas(cost::WARM_ACCESS)
}

pub fn tload(state: &mut RunState, host: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let key = H256::from_word(state.stack.pop()?);
    let value = host.transient_load(&state.env.address, &key);
    state.stack.push(value.to_word())
}

pub fn tstore(state: &mut RunState, host: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    state.require_non_static()?;
    let key = H256::from_word(state.stack.pop()?);
    let value = H256::from_word(state.stack.pop()?);
    host.transient_store(state.env.address, key, value)
}
