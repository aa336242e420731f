//! Arithmetic on 256-bit words, modulo 2^256. Signed variants read words as
//! two's complement.

use primitive_types::{U256, U512};

use crate::config::EvmConfig;
use crate::error::EvmResult;
use crate::gas;
use crate::host::Host;
use crate::interpreter::RunState;

/// Sign bit of a two's complement word
pub(crate) fn is_negative(value: U256) -> bool {
    value.bit(255)
}

/// Two's complement negation
pub(crate) fn negate(value: U256) -> U256 {
    (!value).overflowing_add(U256::one()).0
}

/// Magnitude of a two's complement word
pub(crate) fn abs(value: U256) -> U256 {
    if is_negative(value) {
        negate(value)
    } else {
        value
    }
}

fn low_word(value: U512) -> U256 {
    let mut buf = [0u8; 64];
    value.to_big_endian(&mut buf);
    U256::from_big_endian(&buf[32..])
}

pub fn add(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(a.overflowing_add(b).0)
}

pub fn mul(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(a.overflowing_mul(b).0)
}

pub fn sub(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    state.stack.push(a.overflowing_sub(b).0)
}

/// Division by zero yields zero
pub fn div(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    let result = if b.is_zero() { U256::zero() } else { a / b };
    state.stack.push(result)
}

/// Signed division, truncating toward zero. `MIN / -1` wraps to `MIN`.
pub fn sdiv(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    let result = if b.is_zero() {
        U256::zero()
    } else {
        let quotient = abs(a) / abs(b);
        if is_negative(a) != is_negative(b) {
            negate(quotient)
        } else {
            quotient
        }
    };
    state.stack.push(result)
}

pub fn rem(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    let result = if b.is_zero() { U256::zero() } else { a % b };
    state.stack.push(result)
}

/// Signed remainder, taking the sign of the dividend
pub fn smod(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    let result = if b.is_zero() {
        U256::zero()
    } else {
        let r = abs(a) % abs(b);
        if is_negative(a) {
            negate(r)
        } else {
            r
        }
    };
    state.stack.push(result)
}

/// `(a + b) % n` without intermediate overflow
pub fn addmod(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    let n = state.stack.pop()?;
    let result = if n.is_zero() {
        U256::zero()
    } else {
        low_word((U512::from(a) + U512::from(b)) % U512::from(n))
    };
    state.stack.push(result)
}

/// `(a * b) % n` without intermediate overflow
pub fn mulmod(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let a = state.stack.pop()?;
    let b = state.stack.pop()?;
    let n = state.stack.pop()?;
    let result = if n.is_zero() {
        U256::zero()
    } else {
        low_word(a.full_mul(b) % U512::from(n))
    };
    state.stack.push(result)
}

pub fn exp(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let base = state.stack.pop()?;
    let exponent = state.stack.pop()?;
    state.use_gas(gas::exp_gas(exponent))?;
    state.stack.push(base.overflowing_pow(exponent).0)
}

/// Extend the sign of the low `k + 1` bytes of `x`
pub fn signextend(state: &mut RunState, _: &mut dyn Host, _: &EvmConfig) -> EvmResult<()> {
    let k = state.stack.pop()?;
    let x = state.stack.pop()?;
    let result = if k < U256::from(31) {
        let bit = k.as_usize() * 8 + 7;
        let mask = (U256::one() << bit) - U256::one();
        if x.bit(bit) {
            x | !mask
        } else {
            x & mask
        }
    } else {
        x
    };
    state.stack.push(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::test_utils::{binary, push, run, top};
    use crate::opcode;

    fn neg(value: u64) -> U256 {
        negate(U256::from(value))
    }

    fn ternary(op: u8, a: U256, b: U256, n: U256) -> U256 {
        let mut code = push(n);
        code.extend(push(b));
        code.extend(push(a));
        code.push(op);
        top(&run(&code))
    }

    #[test]
    fn test_add_wraps() {
        assert_eq!(binary(opcode::ADD, U256::from(2), U256::from(3)), U256::from(5));
        assert_eq!(binary(opcode::ADD, U256::MAX, U256::one()), U256::zero());
    }

    #[test]
    fn test_sub_order_and_wrap() {
        assert_eq!(binary(opcode::SUB, U256::from(10), U256::from(3)), U256::from(7));
        assert_eq!(binary(opcode::SUB, U256::zero(), U256::one()), U256::MAX);
    }

    #[test]
    fn test_mul_wraps() {
        assert_eq!(binary(opcode::MUL, U256::from(6), U256::from(7)), U256::from(42));
        assert_eq!(binary(opcode::MUL, U256::MAX, U256::from(2)), U256::MAX - U256::one());
    }

    #[test]
    fn test_div_and_mod_by_zero() {
        assert_eq!(binary(opcode::DIV, U256::from(10), U256::zero()), U256::zero());
        assert_eq!(binary(opcode::MOD, U256::from(10), U256::zero()), U256::zero());
        assert_eq!(binary(opcode::DIV, U256::from(10), U256::from(3)), U256::from(3));
        assert_eq!(binary(opcode::MOD, U256::from(10), U256::from(3)), U256::one());
    }

    #[test]
    fn test_sdiv() {
        assert_eq!(binary(opcode::SDIV, neg(10), U256::from(3)), neg(3));
        assert_eq!(binary(opcode::SDIV, neg(10), neg(2)), U256::from(5));
        assert_eq!(binary(opcode::SDIV, neg(1), U256::zero()), U256::zero());
        let min = U256::one() << 255;
        assert_eq!(binary(opcode::SDIV, min, U256::MAX), min);
    }

    #[test]
    fn test_smod_takes_dividend_sign() {
        assert_eq!(binary(opcode::SMOD, neg(10), U256::from(3)), neg(1));
        assert_eq!(binary(opcode::SMOD, U256::from(10), neg(3)), U256::one());
    }

    #[test]
    fn test_addmod_mulmod_no_overflow() {
        assert_eq!(
            ternary(opcode::ADDMOD, U256::MAX, U256::one(), U256::from(2)),
            U256::zero()
        );
        assert_eq!(
            ternary(opcode::MULMOD, U256::MAX, U256::MAX, U256::from(12)),
            U256::from(9)
        );
        assert_eq!(ternary(opcode::ADDMOD, U256::one(), U256::one(), U256::zero()), U256::zero());
    }

    #[test]
    fn test_exp_charges_per_byte() {
        assert_eq!(binary(opcode::EXP, U256::from(2), U256::from(10)), U256::from(1024));
        assert_eq!(binary(opcode::EXP, U256::from(2), U256::from(256)), U256::zero());

        let mut code = push(U256::from(0x100));
        code.extend(push(U256::from(3)));
        code.push(opcode::EXP);
        let result = run(&code);
        // two PUSH32, EXP static fee and two exponent bytes
        let used = crate::instructions::test_utils::GAS - result.run_state.gas_left;
        assert_eq!(used, 3 + 3 + 10 + 2 * 50);
    }

    #[test]
    fn test_signextend() {
        assert_eq!(binary(opcode::SIGNEXTEND, U256::zero(), U256::from(0xff)), U256::MAX);
        assert_eq!(binary(opcode::SIGNEXTEND, U256::zero(), U256::from(0x7f)), U256::from(0x7f));
        assert_eq!(
            binary(opcode::SIGNEXTEND, U256::from(1), U256::from(0x12_80ff)),
            U256::from(0x80ff) | !U256::from(0xffff)
        );
        assert_eq!(binary(opcode::SIGNEXTEND, U256::from(31), U256::from(0xff)), U256::from(0xff));
    }
}
