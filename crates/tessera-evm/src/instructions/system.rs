//! Logging, nested calls, contract creation and self-destruct

use bytes::Bytes;
use primitive_types::U256;
use tessera_primitives::{Address, H256};

use crate::config::EvmConfig;
use crate::error::{EvmError, EvmResult, Log};
use crate::gas::{self, cost};
use crate::host::Host;
use crate::interpreter::RunState;
use crate::message::Message;
use crate::opcode::LOG0;

/// Any byte without an assigned instruction
pub fn invalid(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    Err(EvmError::InvalidOpcode(state.opcode))
}

/// LOG0..LOG4
pub fn log(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    state.require_non_static()?;
    let topic_count = (state.opcode - LOG0) as usize;
    let offset = state.stack.pop()?;
    let size = state.stack.pop()?;
    let topics = state
        .stack
        .pop_n(topic_count)?
        .into_iter()
        .map(H256::from_word)
        .collect();
    let (offset, size) = state.memory_range(offset, size)?;
    state.use_gas(gas::log_gas(topic_count, size))?;
    let data = Bytes::from(state.memory.read(offset, size)?);
    state.logs.push(Log {
        address: state.env.address,
        topics,
        data,
    });
    Ok(())
}

/// Schedule the executing account for removal and hand its balance to the
/// beneficiary
pub fn selfdestruct(state: &mut RunState, host: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    state.require_non_static()?;
    let beneficiary = Address::from_word(state.stack.pop()?);
    let address = state.env.address;
    host.selfdestruct(&address, &beneficiary)?;
    state.selfdestruct.insert(address);
    state.halted = true;
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CallKind {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
}

fn gas_to_u64(value: U256) -> u64 {
    if value > U256::from(u64::MAX) {
        u64::MAX
    } else {
        value.as_u64()
    }
}

fn call_inner(state: &mut RunState, host: &mut dyn Host, kind: CallKind) -> EvmResult<()> {
    let requested = state.stack.pop()?;
    let target = Address::from_word(state.stack.pop()?);
    let value = match kind {
        CallKind::Call | CallKind::CallCode => state.stack.pop()?,
        CallKind::DelegateCall | CallKind::StaticCall => U256::zero(),
    };
    let in_offset = state.stack.pop()?;
    let in_size = state.stack.pop()?;
    let out_offset = state.stack.pop()?;
    let out_size = state.stack.pop()?;

    if kind == CallKind::Call && state.env.is_static && !value.is_zero() {
        return Err(EvmError::StaticCallViolation);
    }

    let (in_offset, in_size) = state.memory_range(in_offset, in_size)?;
    let (out_offset, out_size) = state.memory_range(out_offset, out_size)?;
    if !value.is_zero() {
        state.use_gas(cost::CALL_VALUE)?;
    }

    let mut gas_limit = gas_to_u64(requested).min(gas::max_call_gas(state.gas_left));
    state.use_gas(gas_limit)?;
    if !value.is_zero() {
        gas_limit += cost::CALL_STIPEND;
    }

    let input = Bytes::from(state.memory.read(in_offset, in_size)?);
    let env = &state.env;
    let (caller, to, value) = match kind {
        CallKind::Call | CallKind::StaticCall => (env.address, target, value),
        CallKind::CallCode => (env.address, env.address, value),
        CallKind::DelegateCall => (env.caller, env.address, env.call_value),
    };
    let message = Message {
        to: Some(to),
        value,
        caller,
        gas_limit,
        data: Some(input),
        depth: env.depth + 1,
        code_address: Some(target),
        is_static: env.is_static || kind == CallKind::StaticCall,
        selfdestruct: state.selfdestruct.clone(),
        delegatecall: kind == CallKind::DelegateCall,
        gas_refund: state.gas_refund,
        ..Default::default()
    };

    let result = host.call(message)?.exec_result;
    state.return_gas(gas_limit.saturating_sub(result.execution_gas_used));
    state.return_data = result.return_value.clone();

    let copied = out_size.min(state.return_data.len());
    if copied > 0 {
        let output = state.return_data.slice(..copied);
        state.memory.write(out_offset, copied, &output)?;
    }

    let success = result.is_success();
    if success {
        state.logs.extend(result.logs);
        state.selfdestruct = result.selfdestruct;
        state.gas_refund = result.gas_refund;
    }
    state.stack.push(super::bool_to_word(success))
}

pub fn call(state: &mut RunState, host: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    call_inner(state, host, CallKind::Call)
}

/// Run the target's code against the current account
pub fn callcode(state: &mut RunState, host: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    call_inner(state, host, CallKind::CallCode)
}

/// Run the target's code with the current caller, value and account
pub fn delegatecall(state: &mut RunState, host: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    call_inner(state, host, CallKind::DelegateCall)
}

pub fn staticcall(state: &mut RunState, host: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    call_inner(state, host, CallKind::StaticCall)
}

fn create_inner(state: &mut RunState, host: &mut dyn Host, with_salt: bool) -> EvmResult<()> {
    state.require_non_static()?;
    let value = state.stack.pop()?;
    let offset = state.stack.pop()?;
    let size = state.stack.pop()?;
    let salt = if with_salt {
        Some(H256::from_word(state.stack.pop()?))
    } else {
        None
    };

    let (offset, size) = state.memory_range(offset, size)?;
    if with_salt {
        state.use_gas(gas::sha3_gas(size))?;
    }
    let init_code = Bytes::from(state.memory.read(offset, size)?);

    let address = state.env.address;
    let nonce = host.increment_nonce(&address)? - 1;

    let gas_limit = gas::max_call_gas(state.gas_left);
    state.use_gas(gas_limit)?;

    let message = Message {
        to: None,
        value,
        caller: address,
        gas_limit,
        data: Some(init_code),
        depth: state.env.depth + 1,
        salt,
        create_nonce: Some(nonce),
        selfdestruct: state.selfdestruct.clone(),
        gas_refund: state.gas_refund,
        ..Default::default()
    };

    let outcome = host.call(message)?;
    let result = outcome.exec_result;
    state.return_gas(gas_limit.saturating_sub(result.execution_gas_used));

    if result.is_success() {
        state.return_data = Bytes::new();
        state.logs.extend(result.logs);
        state.selfdestruct = result.selfdestruct;
        state.gas_refund = result.gas_refund;
        let word = outcome.created_address.map(|a| a.to_word()).unwrap_or_default();
        state.stack.push(word)
    } else {
        state.return_data = result.return_value;
        state.stack.push(U256::zero())
    }
}

pub fn create(state: &mut RunState, host: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    create_inner(state, host, false)
}

/// CREATE with a salted, code-derived address (EIP-1014)
pub fn create2(state: &mut RunState, host: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    create_inner(state, host, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_state::InMemoryState;

    use crate::context::Environment;
    use crate::evm::Evm;
    use crate::instructions::test_utils::{run, run_in};

    fn fresh_host() -> Evm<InMemoryState> {
        Evm::new(InMemoryState::new(), EvmConfig::default()).unwrap()
    }

    #[test]
    fn test_invalid_reports_byte() {
        assert_eq!(run(&[0xfe]).exception_error, Some(EvmError::InvalidOpcode(0xfe)));
        assert_eq!(run(&[0x21]).exception_error, Some(EvmError::InvalidOpcode(0x21)));
    }

    #[test]
    fn test_log2() {
        // PUSH1 0xbb, PUSH1 0xaa, PUSH1 0x11, PUSH1 0, MSTORE8, PUSH1 1, PUSH1 0, LOG2
        let code = [
            0x60, 0xbb, 0x60, 0xaa, 0x60, 0x11, 0x60, 0x00, 0x53, 0x60, 0x01, 0x60, 0x00, 0xa2,
        ];
        let env = Environment {
            address: Address::from_bytes([7; 20]),
            ..Default::default()
        };
        let result = run_in(&mut fresh_host(), env, &code);
        assert!(result.exception_error.is_none());
        let log = &result.run_state.logs[0];
        assert_eq!(log.address, Address::from_bytes([7; 20]));
        assert_eq!(
            log.topics,
            vec![H256::from_word(U256::from(0xaa)), H256::from_word(U256::from(0xbb))]
        );
        assert_eq!(log.data.as_ref(), &[0x11]);
    }

    #[test]
    fn test_log_in_static_frame() {
        let env = Environment {
            is_static: true,
            ..Default::default()
        };
        let result = run_in(&mut fresh_host(), env, &[0x60, 0x00, 0x60, 0x00, 0xa0]);
        assert_eq!(result.exception_error, Some(EvmError::StaticCallViolation));
    }

    #[test]
    fn test_selfdestruct_halts() {
        let env = Environment {
            address: Address::from_bytes([3; 20]),
            ..Default::default()
        };
        // PUSH1 9, SELFDESTRUCT, PUSH1 1
        let result = run_in(&mut fresh_host(), env, &[0x60, 0x09, 0xff, 0x60, 0x01]);
        assert!(result.exception_error.is_none());
        assert!(result.run_state.halted);
        assert_eq!(result.run_state.stack.len(), 0);
        assert!(result.run_state.selfdestruct.contains(&Address::from_bytes([3; 20])));
    }

    #[test]
    fn test_call_with_value_in_static_frame() {
        let env = Environment {
            is_static: true,
            ..Default::default()
        };
        // CALL(gas 0, to 0, value 1, 0, 0, 0, 0)
        let code = [
            0x5f, 0x5f, 0x5f, 0x5f, 0x60, 0x01, 0x5f, 0x5f, 0xf1,
        ];
        let result = run_in(&mut fresh_host(), env, &code);
        assert_eq!(result.exception_error, Some(EvmError::StaticCallViolation));
    }

    #[test]
    fn test_call_to_empty_account_succeeds() {
        // STATICCALL(gas 0xffff, to 0x42, 0, 0, 0, 0)
        let code = [0x5f, 0x5f, 0x5f, 0x5f, 0x60, 0x42, 0x61, 0xff, 0xff, 0xfa];
        let result = run_in(&mut fresh_host(), Environment::default(), &code);
        assert!(result.exception_error.is_none());
        assert_eq!(result.run_state.stack.as_slice(), &[U256::one()]);
        assert!(result.run_state.return_data.is_empty());
    }

    #[test]
    fn test_create_in_static_frame() {
        let env = Environment {
            is_static: true,
            ..Default::default()
        };
        let result = run_in(&mut fresh_host(), env, &[0x5f, 0x5f, 0x5f, 0xf0]);
        assert_eq!(result.exception_error, Some(EvmError::StaticCallViolation));
    }
}
