//! Gas cost calculations

use primitive_types::U256;

/// Gas costs for EVM operations
pub mod cost {
    /// Zero gas
    pub const ZERO: u64 = 0;
    /// Base gas
    pub const BASE: u64 = 2;
    /// Very low gas
    pub const VERYLOW: u64 = 3;
    /// Low gas
    pub const LOW: u64 = 5;
    /// Mid gas
    pub const MID: u64 = 8;
    /// High gas
    pub const HIGH: u64 = 10;

    /// Jump dest gas
    pub const JUMPDEST: u64 = 1;
    /// BEGINSUB gas
    pub const BEGINSUB: u64 = 2;
    /// RETURNSUB gas
    pub const RETURNSUB: u64 = 5;
    /// JUMPSUB gas
    pub const JUMPSUB: u64 = 10;
    /// Exp gas
    pub const EXP: u64 = 10;
    /// Exp byte gas
    pub const EXP_BYTE: u64 = 50;
    /// SHA3 base gas
    pub const SHA3: u64 = 30;
    /// SHA3 word gas
    pub const SHA3_WORD: u64 = 6;
    /// BLOCKHASH gas
    pub const BLOCKHASH: u64 = 20;

    /// Account access (BALANCE, EXTCODE*, CALL family), warm pricing
    pub const WARM_ACCESS: u64 = 100;
    /// SLOAD / TLOAD / TSTORE
    pub const SLOAD: u64 = 100;
    /// Sstore set gas
    pub const SSTORE_SET: u64 = 20000;
    /// Sstore reset gas
    pub const SSTORE_RESET: u64 = 2900;
    /// Sstore clear refund
    pub const SSTORE_CLEAR_REFUND: u64 = 4800;
    /// SSTORE fails when no more than this is left (EIP-2200)
    pub const SSTORE_SENTRY: u64 = 2300;

    /// Log gas
    pub const LOG: u64 = 375;
    /// Log topic gas
    pub const LOG_TOPIC: u64 = 375;
    /// Log data gas (per byte)
    pub const LOG_DATA: u64 = 8;

    /// Create gas
    pub const CREATE: u64 = 32000;
    /// Code deposit gas per byte
    pub const CREATE_DATA: u64 = 200;
    /// Call value transfer gas
    pub const CALL_VALUE: u64 = 9000;
    /// Call stipend
    pub const CALL_STIPEND: u64 = 2300;
    /// Selfdestruct gas
    pub const SELFDESTRUCT: u64 = 5000;

    /// Memory gas per word
    pub const MEMORY: u64 = 3;
    /// Copy gas per word
    pub const COPY: u64 = 3;

    /// Max call depth
    pub const MAX_CALL_DEPTH: usize = 1024;
    /// Max stack size
    pub const MAX_STACK_SIZE: usize = 1024;
    /// Max return stack size (EIP-2315)
    pub const MAX_RETURN_STACK_SIZE: usize = 1023;
    /// Max code size (EIP-170)
    pub const MAX_CODE_SIZE: usize = 24576;
}

/// Calculate memory expansion cost from `current_size` to `new_size` bytes
pub fn memory_gas(current_size: usize, new_size: usize) -> u64 {
    if new_size <= current_size {
        return 0;
    }
    let new_cost = memory_word_cost(new_size.div_ceil(32));
    let old_cost = memory_word_cost(current_size.div_ceil(32));
    new_cost.saturating_sub(old_cost)
}

/// Calculate memory cost for a number of words
fn memory_word_cost(words: usize) -> u64 {
    let words = words as u64;
    cost::MEMORY
        .saturating_mul(words)
        .saturating_add(words.saturating_mul(words) / 512)
}

/// Calculate copy cost (for CALLDATACOPY, CODECOPY, etc.)
pub fn copy_gas(length: usize) -> u64 {
    cost::COPY * length.div_ceil(32) as u64
}

/// Dynamic EXP cost: per significant byte of the exponent
pub fn exp_gas(exponent: U256) -> u64 {
    let byte_size = exponent.bits().div_ceil(8) as u64;
    cost::EXP_BYTE * byte_size
}

/// Dynamic KECCAK256 cost: per hashed word
pub fn sha3_gas(length: usize) -> u64 {
    cost::SHA3_WORD * length.div_ceil(32) as u64
}

/// Dynamic LOG cost
pub fn log_gas(topics: usize, data_size: usize) -> u64 {
    cost::LOG_TOPIC * topics as u64 + cost::LOG_DATA * data_size as u64
}

/// All but one 64th of `gas_left` (EIP-150)
pub fn max_call_gas(gas_left: u64) -> u64 {
    gas_left - gas_left / 64
}
