//! Control flow: halting, jumps and EIP-2315 subroutines

use bytes::Bytes;
use primitive_types::U256;

use super::as_usize_saturated;
use crate::config::EvmConfig;
use crate::error::{EvmError, EvmResult};
use crate::host::Host;
use crate::interpreter::RunState;

pub fn stop(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    state.halted = true;
    Ok(())
}

fn jump_to(state: &mut RunState, dest: U256) -> EvmResult<()> {
    let dest = as_usize_saturated(dest);
    if !state.is_valid_jump(dest) {
        return Err(EvmError::InvalidJump(dest));
    }
    state.program_counter = dest;
    Ok(())
}

pub fn jump(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let dest = state.stack.pop()?;
    jump_to(state, dest)
}

pub fn jumpi(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let dest = state.stack.pop()?;
    let condition = state.stack.pop()?;
    if condition.is_zero() {
        return Ok(());
    }
    jump_to(state, dest)
}

pub fn jumpdest(_: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    Ok(())
}

/// Offset of the PC instruction itself
pub fn pc(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let pc = state.program_counter - 1;
    state.stack.push(U256::from(pc))
}

/// Gas left after this instruction's fee
pub fn gas(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let left = state.gas_left;
    state.stack.push(U256::from(left))
}

/// BEGINSUB may only be entered through JUMPSUB
pub fn beginsub(_: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    Err(EvmError::InvalidBeginSub)
}

/// Push the return offset and continue just past the target BEGINSUB
pub fn jumpsub(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let dest = as_usize_saturated(state.stack.pop()?);
    if !state.is_valid_subroutine(dest) {
        return Err(EvmError::InvalidJumpSub(dest));
    }
    let ret = state.program_counter;
    state.return_stack.push(U256::from(ret))?;
    state.program_counter = dest + 1;
    Ok(())
}

pub fn returnsub(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    if state.return_stack.is_empty() {
        return Err(EvmError::InvalidReturnSub);
    }
    let ret = state.return_stack.pop()?;
    state.program_counter = ret.as_usize();
    Ok(())
}

fn output(state: &mut RunState) -> EvmResult<Bytes> {
    let offset = state.stack.pop()?;
    let size = state.stack.pop()?;
    let (offset, size) = state.memory_range(offset, size)?;
    Ok(Bytes::from(state.memory.read(offset, size)?))
}

pub fn ret(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    state.return_value = output(state)?;
    state.halted = true;
    Ok(())
}

/// Halt with [`EvmError::Revert`], keeping the output as return data
pub fn revert(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    state.return_value = output(state)?;
    Err(EvmError::Revert)
}
