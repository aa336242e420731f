//! Comparison, bitwise logic and shifts

use primitive_types::U256;

use super::arithmetic::is_negative;
use super::bool_to_word;
use crate::config::EvmConfig;
use crate::error::EvmResult;
use crate::host::Host;
use crate::interpreter::RunState;

fn signed_lt(a: U256, b: U256) -> bool {
    match (is_negative(a), is_negative(b)) {
        (true, false) => true,
        (false, true) => false,
        _ => a < b,
    }
}

pub fn lt(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(bool_to_word(a < b))
}

pub fn gt(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(bool_to_word(a > b))
}

pub fn slt(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(bool_to_word(signed_lt(a, b)))
}

pub fn sgt(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(bool_to_word(signed_lt(b, a)))
}

pub fn eq(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(bool_to_word(a == b))
}

pub fn iszero(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let a = state.stack.pop()?;
    state.stack.push(bool_to_word(a.is_zero()))
}

pub fn and(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(a & b)
}

pub fn or(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(a | b)
}

pub fn xor(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(a ^ b)
}

pub fn not(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let a = state.stack.pop()?;
    state.stack.push(!a)
}

/// Byte `i` of `x`, counting from the most significant end
pub fn byte(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let i = state.stack.pop()?;
    let x = state.stack.pop()?;
    let result = if i < U256::from(32) {
        U256::from(x.byte(31 - i.as_usize()))
    } else {
        U256::zero()
    };
    state.stack.push(result)
}

pub fn shl(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let shift = state.stack.pop()?;
    let value = state.stack.pop()?;
    let result = if shift < U256::from(256) {
        value << shift.as_usize()
    } else {
        U256::zero()
    };
    state.stack.push(result)
}

pub fn shr(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let shift = state.stack.pop()?;
    let value = state.stack.pop()?;
    let result = if shift < U256::from(256) {
        value >> shift.as_usize()
    } else {
        U256::zero()
    };
    state.stack.push(result)
}

/// Arithmetic shift right, filling with the sign bit
pub fn sar(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let shift = state.stack.pop()?;
    let value = state.stack.pop()?;
    let negative = is_negative(value);
    let result = if shift >= U256::from(256) {
        if negative {
            U256::MAX
        } else {
            U256::zero()
        }
    } else if negative {
        !((!value) >> shift.as_usize())
    } else {
        value >> shift.as_usize()
    };
    state.stack.push(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::arithmetic::negate;
    use crate::instructions::test_utils::{binary, push, run, top};
    use crate::opcode;

    #[test]
    fn test_unsigned_comparison() {
        assert_eq!(binary(opcode::LT, U256::one(), U256::from(2)), U256::one());
        assert_eq!(binary(opcode::GT, U256::one(), U256::from(2)), U256::zero());
        assert_eq!(binary(opcode::EQ, U256::from(7), U256::from(7)), U256::one());
    }

    #[test]
    fn test_signed_comparison() {
        let minus_one = negate(U256::one());
        assert_eq!(binary(opcode::SLT, minus_one, U256::one()), U256::one());
        assert_eq!(binary(opcode::SGT, minus_one, U256::one()), U256::zero());
        assert_eq!(binary(opcode::SGT, U256::from(5), U256::from(3)), U256::one());
        assert_eq!(binary(opcode::LT, minus_one, U256::one()), U256::zero());
    }

    #[test]
    fn test_iszero_and_not() {
        let mut code = push(U256::zero());
        code.push(opcode::ISZERO);
        assert_eq!(top(&run(&code)), U256::one());

        let mut code = push(U256::zero());
        code.push(opcode::NOT);
        assert_eq!(top(&run(&code)), U256::MAX);
    }

    #[test]
    fn test_logic() {
        assert_eq!(binary(opcode::AND, U256::from(0b1100), U256::from(0b1010)), U256::from(0b1000));
        assert_eq!(binary(opcode::OR, U256::from(0b1100), U256::from(0b1010)), U256::from(0b1110));
        assert_eq!(binary(opcode::XOR, U256::from(0b1100), U256::from(0b1010)), U256::from(0b0110));
    }

    #[test]
    fn test_byte_indexing() {
        let x = U256::from(0xab) << 248 | U256::from(0xcd);
        assert_eq!(binary(opcode::BYTE, U256::zero(), x), U256::from(0xab));
        assert_eq!(binary(opcode::BYTE, U256::from(31), x), U256::from(0xcd));
        assert_eq!(binary(opcode::BYTE, U256::from(32), x), U256::zero());
    }

    #[test]
    fn test_shifts() {
        assert_eq!(binary(opcode::SHL, U256::from(4), U256::one()), U256::from(16));
        assert_eq!(binary(opcode::SHR, U256::from(4), U256::from(16)), U256::one());
        assert_eq!(binary(opcode::SHL, U256::from(256), U256::one()), U256::zero());
        assert_eq!(binary(opcode::SHR, U256::from(300), U256::MAX), U256::zero());
    }

    #[test]
    fn test_sar_keeps_sign() {
        let minus_sixteen = negate(U256::from(16));
        assert_eq!(binary(opcode::SAR, U256::from(4), minus_sixteen), negate(U256::one()));
        assert_eq!(binary(opcode::SAR, U256::from(4), U256::from(16)), U256::one());
        assert_eq!(binary(opcode::SAR, U256::from(256), minus_sixteen), U256::MAX);
        assert_eq!(binary(opcode::SAR, U256::from(256), U256::from(16)), U256::zero());
    }
}
