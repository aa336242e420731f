//! PUSH, POP, DUP and SWAP

use primitive_types::U256;

use crate::config::EvmConfig;
use crate::error::EvmResult;
use crate::host::Host;
use crate::interpreter::RunState;
use crate::opcode::{DUP1, PUSH0, SWAP1};

pub fn pop(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    state.stack.pop()?;
    Ok(())
}

pub fn push0(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    state.stack.push(U256::zero())
}

/// PUSH1..PUSH32. An immediate cut off by the end of the code is padded with
/// zeros on the right.
pub fn push(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let n = (state.opcode - PUSH0) as usize;
    let start = state.program_counter.min(state.code.len());
    let end = start.saturating_add(n).min(state.code.len());
    let mut buf = [0u8; 32];
    buf[..end - start].copy_from_slice(&state.code[start..end]);
    state.stack.push_bytes(&buf[..n])?;
    state.program_counter += n;
    Ok(())
}

pub fn dup(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let pos = (state.opcode - DUP1) as usize + 1;
    state.stack.dup(pos)
}

pub fn swap(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let pos = (state.opcode - SWAP1) as usize + 1;
    state.stack.swap(pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvmError;
    use crate::instructions::test_utils::{run, top};

    fn stack_of(code: &[u8]) -> Vec<u64> {
        let result = run(code);
        assert!(result.exception_error.is_none(), "{:?}", result.exception_error);
        result.run_state.stack.as_slice().iter().map(|v| v.as_u64()).collect()
    }

    #[test]
    fn test_push0() {
        assert_eq!(stack_of(&[0x5f]), vec![0]);
    }

    #[test]
    fn test_push_widths() {
        assert_eq!(stack_of(&[0x61, 0x01, 0x02]), vec![0x0102]);
        let mut code = vec![0x7f];
        code.extend([0u8; 31]);
        code.push(0x05);
        assert_eq!(stack_of(&code), vec![5]);
    }

    #[test]
    fn test_truncated_push_pads_right() {
        // PUSH3 with one byte left
        let result = run(&[0x62, 0xab]);
        assert!(result.exception_error.is_none());
        assert_eq!(top(&result), U256::from(0xab_0000));
        assert_eq!(result.run_state.program_counter, 4);
    }

    #[test]
    fn test_dup_and_swap() {
        // PUSH1 1, PUSH1 2, DUP2
        assert_eq!(stack_of(&[0x60, 0x01, 0x60, 0x02, 0x81]), vec![1, 2, 1]);
        // PUSH1 1, PUSH1 2, PUSH1 3, SWAP2
        assert_eq!(stack_of(&[0x60, 0x01, 0x60, 0x02, 0x60, 0x03, 0x91]), vec![3, 2, 1]);
    }

    #[test]
    fn test_dup16_needs_depth() {
        let mut code = Vec::new();
        for i in 0..15u8 {
            code.extend([0x60, i]);
        }
        code.push(0x8f);
        assert_eq!(run(&code).exception_error, Some(EvmError::StackUnderflow));

        code.insert(0, 0x5f);
        code.insert(0, 0x5f);
        // two extra items below: DUP16 now reaches the second PUSH0
        let values = stack_of(&code);
        assert_eq!(values.len(), 18);
        assert_eq!(values[17], 0);
    }

    #[test]
    fn test_pop_empty() {
        assert_eq!(run(&[0x50]).exception_error, Some(EvmError::StackUnderflow));
    }

    #[test]
    fn test_stack_overflow() {
        let mut code = Vec::new();
        for _ in 0..1025 {
            code.push(0x5f);
        }
        assert_eq!(run(&code).exception_error, Some(EvmError::StackOverflow));
    }
}
