//! Opcode byte values and the per-rule-set dispatch table

#![allow(missing_docs)]

use std::fmt;

use crate::config::{EvmConfig, Hardfork};
use crate::error::EvmResult;
use crate::gas::cost;
use crate::host::Host;
use crate::instructions::{
    arithmetic, bitwise, control, environment, memory, stack, storage, system,
};
use crate::interpreter::RunState;

// Stop and arithmetic
pub const STOP: u8 = 0x00;
pub const ADD: u8 = 0x01;
pub const MUL: u8 = 0x02;
pub const SUB: u8 = 0x03;
pub const DIV: u8 = 0x04;
pub const SDIV: u8 = 0x05;
pub const MOD: u8 = 0x06;
pub const SMOD: u8 = 0x07;
pub const ADDMOD: u8 = 0x08;
pub const MULMOD: u8 = 0x09;
pub const EXP: u8 = 0x0a;
pub const SIGNEXTEND: u8 = 0x0b;

// Comparison and bitwise
pub const LT: u8 = 0x10;
pub const GT: u8 = 0x11;
pub const SLT: u8 = 0x12;
pub const SGT: u8 = 0x13;
pub const EQ: u8 = 0x14;
pub const ISZERO: u8 = 0x15;
pub const AND: u8 = 0x16;
pub const OR: u8 = 0x17;
pub const XOR: u8 = 0x18;
pub const NOT: u8 = 0x19;
pub const BYTE: u8 = 0x1a;
pub const SHL: u8 = 0x1b;
pub const SHR: u8 = 0x1c;
pub const SAR: u8 = 0x1d;
pub const KECCAK256: u8 = 0x20;

// Environment
pub const ADDRESS: u8 = 0x30;
pub const BALANCE: u8 = 0x31;
pub const ORIGIN: u8 = 0x32;
pub const CALLER: u8 = 0x33;
pub const CALLVALUE: u8 = 0x34;
pub const CALLDATALOAD: u8 = 0x35;
pub const CALLDATASIZE: u8 = 0x36;
pub const CALLDATACOPY: u8 = 0x37;
pub const CODESIZE: u8 = 0x38;
pub const CODECOPY: u8 = 0x39;
pub const GASPRICE: u8 = 0x3a;
pub const EXTCODESIZE: u8 = 0x3b;
pub const EXTCODECOPY: u8 = 0x3c;
pub const RETURNDATASIZE: u8 = 0x3d;
pub const RETURNDATACOPY: u8 = 0x3e;
pub const EXTCODEHASH: u8 = 0x3f;

// Block
pub const BLOCKHASH: u8 = 0x40;
pub const COINBASE: u8 = 0x41;
pub const TIMESTAMP: u8 = 0x42;
pub const NUMBER: u8 = 0x43;
pub const PREVRANDAO: u8 = 0x44;
pub const GASLIMIT: u8 = 0x45;
pub const CHAINID: u8 = 0x46;
pub const SELFBALANCE: u8 = 0x47;
pub const BASEFEE: u8 = 0x48;

// Stack, memory, storage and flow
pub const POP: u8 = 0x50;
pub const MLOAD: u8 = 0x51;
pub const MSTORE: u8 = 0x52;
pub const MSTORE8: u8 = 0x53;
pub const SLOAD: u8 = 0x54;
pub const SSTORE: u8 = 0x55;
pub const JUMP: u8 = 0x56;
pub const JUMPI: u8 = 0x57;
pub const PC: u8 = 0x58;
pub const MSIZE: u8 = 0x59;
pub const GAS: u8 = 0x5a;
pub const JUMPDEST: u8 = 0x5b;
/// BEGINSUB under EIP-2315, TLOAD from Cancun
pub const BEGINSUB: u8 = 0x5c;
pub const TLOAD: u8 = 0x5c;
/// RETURNSUB under EIP-2315, TSTORE from Cancun
pub const RETURNSUB: u8 = 0x5d;
pub const TSTORE: u8 = 0x5d;
/// JUMPSUB under EIP-2315, MCOPY from Cancun
pub const JUMPSUB: u8 = 0x5e;
pub const MCOPY: u8 = 0x5e;
pub const PUSH0: u8 = 0x5f;
pub const PUSH1: u8 = 0x60;
pub const PUSH32: u8 = 0x7f;
pub const DUP1: u8 = 0x80;
pub const DUP16: u8 = 0x8f;
pub const SWAP1: u8 = 0x90;
pub const SWAP16: u8 = 0x9f;
pub const LOG0: u8 = 0xa0;
pub const LOG4: u8 = 0xa4;

// System
pub const CREATE: u8 = 0xf0;
pub const CALL: u8 = 0xf1;
pub const CALLCODE: u8 = 0xf2;
pub const RETURN: u8 = 0xf3;
pub const DELEGATECALL: u8 = 0xf4;
pub const CREATE2: u8 = 0xf5;
pub const STATICCALL: u8 = 0xfa;
pub const REVERT: u8 = 0xfd;
pub const INVALID: u8 = 0xfe;
pub const SELFDESTRUCT: u8 = 0xff;

const PUSH_NAMES: [&str; 32] = [
    "PUSH1", "PUSH2", "PUSH3", "PUSH4", "PUSH5", "PUSH6", "PUSH7", "PUSH8", "PUSH9", "PUSH10",
    "PUSH11", "PUSH12", "PUSH13", "PUSH14", "PUSH15", "PUSH16", "PUSH17", "PUSH18", "PUSH19",
    "PUSH20", "PUSH21", "PUSH22", "PUSH23", "PUSH24", "PUSH25", "PUSH26", "PUSH27", "PUSH28",
    "PUSH29", "PUSH30", "PUSH31", "PUSH32",
];

const DUP_NAMES: [&str; 16] = [
    "DUP1", "DUP2", "DUP3", "DUP4", "DUP5", "DUP6", "DUP7", "DUP8", "DUP9", "DUP10", "DUP11",
    "DUP12", "DUP13", "DUP14", "DUP15", "DUP16",
];

const SWAP_NAMES: [&str; 16] = [
    "SWAP1", "SWAP2", "SWAP3", "SWAP4", "SWAP5", "SWAP6", "SWAP7", "SWAP8", "SWAP9", "SWAP10",
    "SWAP11", "SWAP12", "SWAP13", "SWAP14", "SWAP15", "SWAP16",
];

const LOG_NAMES: [&str; 5] = ["LOG0", "LOG1", "LOG2", "LOG3", "LOG4"];

/// Instruction handler. Runs after the static fee is charged and the
/// program counter has moved past the opcode byte.
pub type Handler = fn(&mut RunState, &mut dyn Host, &EvmConfig) -> EvmResult<()>;

/// Dispatch entry for one opcode byte
#[derive(Clone, Copy)]
pub struct OpInfo {
    /// Opcode byte
    pub code: u8,
    /// Mnemonic
    pub name: &'static str,
    /// Static gas fee
    pub fee: u64,
    /// Handler
    pub handler: Handler,
    /// Handler goes through the [`Host`] for state
    pub touches_state: bool,
}

impl OpInfo {
    fn invalid(code: u8) -> Self {
        Self {
            code,
            name: "INVALID",
            fee: cost::ZERO,
            handler: system::invalid,
            touches_state: false,
        }
    }
}

impl fmt::Debug for OpInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpInfo")
            .field("code", &format_args!("0x{:02x}", self.code))
            .field("name", &self.name)
            .field("fee", &self.fee)
            .field("touches_state", &self.touches_state)
            .finish()
    }
}

/// 256-entry dispatch table for one rule set. Unassigned bytes map to an
/// INVALID entry that always faults.
pub struct OpcodeTable {
    entries: [OpInfo; 256],
}

impl OpcodeTable {
    /// Build the table active under `config`
    pub fn new(config: &EvmConfig) -> Self {
        let mut entries = [OpInfo::invalid(0); 256];
        for (code, entry) in entries.iter_mut().enumerate() {
            entry.code = code as u8;
        }
        let mut table = Self { entries };
        table.install_base();
        if config.is_active(Hardfork::London) {
            table.set(BASEFEE, "BASEFEE", cost::BASE, environment::basefee, false);
        }
        if config.is_active(Hardfork::Shanghai) {
            table.set(PUSH0, "PUSH0", cost::BASE, stack::push0, false);
        }
        if config.is_active(Hardfork::Cancun) {
            table.set(TLOAD, "TLOAD", cost::SLOAD, storage::tload, true);
            table.set(TSTORE, "TSTORE", cost::SLOAD, storage::tstore, true);
            table.set(MCOPY, "MCOPY", cost::VERYLOW, memory::mcopy, false);
        } else if config.subroutines {
            table.set(BEGINSUB, "BEGINSUB", cost::BEGINSUB, control::beginsub, false);
            table.set(RETURNSUB, "RETURNSUB", cost::RETURNSUB, control::returnsub, false);
            table.set(JUMPSUB, "JUMPSUB", cost::JUMPSUB, control::jumpsub, false);
        }
        table
    }

    /// Entry for `opcode`
    pub fn get(&self, opcode: u8) -> &OpInfo {
        &self.entries[opcode as usize]
    }

    fn set(
        &mut self,
        code: u8,
        name: &'static str,
        fee: u64,
        handler: Handler,
        touches_state: bool,
    ) {
        self.entries[code as usize] = OpInfo {
            code,
            name,
            fee,
            handler,
            touches_state,
        };
    }

    fn install_base(&mut self) {
        self.set(STOP, "STOP", cost::ZERO, control::stop, false);
        self.set(ADD, "ADD", cost::VERYLOW, arithmetic::add, false);
        self.set(MUL, "MUL", cost::LOW, arithmetic::mul, false);
        self.set(SUB, "SUB", cost::VERYLOW, arithmetic::sub, false);
        self.set(DIV, "DIV", cost::LOW, arithmetic::div, false);
        self.set(SDIV, "SDIV", cost::LOW, arithmetic::sdiv, false);
        self.set(MOD, "MOD", cost::LOW, arithmetic::rem, false);
        self.set(SMOD, "SMOD", cost::LOW, arithmetic::smod, false);
        self.set(ADDMOD, "ADDMOD", cost::MID, arithmetic::addmod, false);
        self.set(MULMOD, "MULMOD", cost::MID, arithmetic::mulmod, false);
        self.set(EXP, "EXP", cost::EXP, arithmetic::exp, false);
        self.set(SIGNEXTEND, "SIGNEXTEND", cost::LOW, arithmetic::signextend, false);

        self.set(LT, "LT", cost::VERYLOW, bitwise::lt, false);
        self.set(GT, "GT", cost::VERYLOW, bitwise::gt, false);
        self.set(SLT, "SLT", cost::VERYLOW, bitwise::slt, false);
        self.set(SGT, "SGT", cost::VERYLOW, bitwise::sgt, false);
        self.set(EQ, "EQ", cost::VERYLOW, bitwise::eq, false);
        self.set(ISZERO, "ISZERO", cost::VERYLOW, bitwise::iszero, false);
        self.set(AND, "AND", cost::VERYLOW, bitwise::and, false);
        self.set(OR, "OR", cost::VERYLOW, bitwise::or, false);
        self.set(XOR, "XOR", cost::VERYLOW, bitwise::xor, false);
        self.set(NOT, "NOT", cost::VERYLOW, bitwise::not, false);
        self.set(BYTE, "BYTE", cost::VERYLOW, bitwise::byte, false);
        self.set(SHL, "SHL", cost::VERYLOW, bitwise::shl, false);
        self.set(SHR, "SHR", cost::VERYLOW, bitwise::shr, false);
        self.set(SAR, "SAR", cost::VERYLOW, bitwise::sar, false);
        self.set(KECCAK256, "KECCAK256", cost::SHA3, memory::keccak256, false);

        self.set(ADDRESS, "ADDRESS", cost::BASE, environment::address, false);
        self.set(BALANCE, "BALANCE", cost::WARM_ACCESS, environment::balance, true);
        self.set(ORIGIN, "ORIGIN", cost::BASE, environment::origin, false);
        self.set(CALLER, "CALLER", cost::BASE, environment::caller, false);
        self.set(CALLVALUE, "CALLVALUE", cost::BASE, environment::callvalue, false);
        self.set(CALLDATALOAD, "CALLDATALOAD", cost::VERYLOW, environment::calldataload, false);
        self.set(CALLDATASIZE, "CALLDATASIZE", cost::BASE, environment::calldatasize, false);
        self.set(CALLDATACOPY, "CALLDATACOPY", cost::VERYLOW, environment::calldatacopy, false);
        self.set(CODESIZE, "CODESIZE", cost::BASE, environment::codesize, false);
        self.set(CODECOPY, "CODECOPY", cost::VERYLOW, environment::codecopy, false);
        self.set(GASPRICE, "GASPRICE", cost::BASE, environment::gasprice, false);
        self.set(EXTCODESIZE, "EXTCODESIZE", cost::WARM_ACCESS, environment::extcodesize, true);
        self.set(EXTCODECOPY, "EXTCODECOPY", cost::WARM_ACCESS, environment::extcodecopy, true);
        self.set(RETURNDATASIZE, "RETURNDATASIZE", cost::BASE, environment::returndatasize, false);
        self.set(RETURNDATACOPY, "RETURNDATACOPY", cost::VERYLOW, environment::returndatacopy, false);
        self.set(EXTCODEHASH, "EXTCODEHASH", cost::WARM_ACCESS, environment::extcodehash, true);

        self.set(BLOCKHASH, "BLOCKHASH", cost::BLOCKHASH, environment::blockhash, false);
        self.set(COINBASE, "COINBASE", cost::BASE, environment::coinbase, false);
        self.set(TIMESTAMP, "TIMESTAMP", cost::BASE, environment::timestamp, false);
        self.set(NUMBER, "NUMBER", cost::BASE, environment::number, false);
        self.set(PREVRANDAO, "PREVRANDAO", cost::BASE, environment::prevrandao, false);
        self.set(GASLIMIT, "GASLIMIT", cost::BASE, environment::gaslimit, false);
        self.set(CHAINID, "CHAINID", cost::BASE, environment::chainid, false);
        self.set(SELFBALANCE, "SELFBALANCE", cost::LOW, environment::selfbalance, true);

        self.set(POP, "POP", cost::BASE, stack::pop, false);
        self.set(MLOAD, "MLOAD", cost::VERYLOW, memory::mload, false);
        self.set(MSTORE, "MSTORE", cost::VERYLOW, memory::mstore, false);
        self.set(MSTORE8, "MSTORE8", cost::VERYLOW, memory::mstore8, false);
        self.set(SLOAD, "SLOAD", cost::SLOAD, storage::sload, true);
        self.set(SSTORE, "SSTORE", cost::ZERO, storage::sstore, true);
        self.set(JUMP, "JUMP", cost::MID, control::jump, false);
        self.set(JUMPI, "JUMPI", cost::HIGH, control::jumpi, false);
        self.set(PC, "PC", cost::BASE, control::pc, false);
        self.set(MSIZE, "MSIZE", cost::BASE, memory::msize, false);
        self.set(GAS, "GAS", cost::BASE, control::gas, false);
        self.set(JUMPDEST, "JUMPDEST", cost::JUMPDEST, control::jumpdest, false);

        for (i, name) in PUSH_NAMES.into_iter().enumerate() {
            self.set(PUSH1 + i as u8, name, cost::VERYLOW, stack::push, false);
        }
        for (i, name) in DUP_NAMES.into_iter().enumerate() {
            self.set(DUP1 + i as u8, name, cost::VERYLOW, stack::dup, false);
        }
        for (i, name) in SWAP_NAMES.into_iter().enumerate() {
            self.set(SWAP1 + i as u8, name, cost::VERYLOW, stack::swap, false);
        }
        for (i, name) in LOG_NAMES.into_iter().enumerate() {
            self.set(LOG0 + i as u8, name, cost::LOG, system::log, false);
        }

        self.set(CREATE, "CREATE", cost::CREATE, system::create, true);
        self.set(CALL, "CALL", cost::WARM_ACCESS, system::call, true);
        self.set(CALLCODE, "CALLCODE", cost::WARM_ACCESS, system::callcode, true);
        self.set(RETURN, "RETURN", cost::ZERO, control::ret, false);
        self.set(DELEGATECALL, "DELEGATECALL", cost::WARM_ACCESS, system::delegatecall, true);
        self.set(CREATE2, "CREATE2", cost::CREATE, system::create2, true);
        self.set(STATICCALL, "STATICCALL", cost::WARM_ACCESS, system::staticcall, true);
        self.set(REVERT, "REVERT", cost::ZERO, control::revert, false);
        self.set(SELFDESTRUCT, "SELFDESTRUCT", cost::SELFDESTRUCT, system::selfdestruct, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_bytes_are_invalid() {
        let table = OpcodeTable::new(&EvmConfig::default());
        for code in [0x0c_u8, 0x21, 0x4a, 0xa5, 0xef, 0xfb, INVALID] {
            let info = table.get(code);
            assert_eq!(info.name, "INVALID");
            assert_eq!(info.code, code);
            assert_eq!(info.fee, 0);
        }
    }

    #[test]
    fn test_static_fees() {
        let table = OpcodeTable::new(&EvmConfig::default());
        assert_eq!(table.get(STOP).fee, 0);
        assert_eq!(table.get(ADD).fee, 3);
        assert_eq!(table.get(MUL).fee, 5);
        assert_eq!(table.get(JUMP).fee, 8);
        assert_eq!(table.get(JUMPI).fee, 10);
        assert_eq!(table.get(JUMPDEST).fee, 1);
        assert_eq!(table.get(CREATE2).fee, 32000);
    }

    #[test]
    fn test_ranges_named() {
        let table = OpcodeTable::new(&EvmConfig::default());
        assert_eq!(table.get(PUSH32).name, "PUSH32");
        assert_eq!(table.get(DUP16).name, "DUP16");
        assert_eq!(table.get(SWAP16).name, "SWAP16");
        assert_eq!(table.get(LOG4).name, "LOG4");
    }

    #[test]
    fn test_cancun_opcodes() {
        let table = OpcodeTable::new(&EvmConfig::default());
        assert_eq!(table.get(0x5c).name, "TLOAD");
        assert_eq!(table.get(0x5d).name, "TSTORE");
        assert_eq!(table.get(0x5e).name, "MCOPY");
        assert!(table.get(TLOAD).touches_state);
        assert_eq!(table.get(PUSH0).name, "PUSH0");
    }

    #[test]
    fn test_subroutines_before_cancun() {
        let config = EvmConfig {
            hardfork: Hardfork::Berlin,
            subroutines: true,
            ..Default::default()
        };
        let table = OpcodeTable::new(&config);
        assert_eq!(table.get(0x5c).name, "BEGINSUB");
        assert_eq!(table.get(0x5d).name, "RETURNSUB");
        assert_eq!(table.get(0x5e).name, "JUMPSUB");
        assert_eq!(table.get(PUSH0).name, "INVALID");
        assert_eq!(table.get(BASEFEE).name, "INVALID");
    }

    #[test]
    fn test_berlin_without_subroutines() {
        let table = OpcodeTable::new(&EvmConfig::for_hardfork(Hardfork::Berlin));
        assert_eq!(table.get(0x5c).name, "INVALID");
        assert_eq!(table.get(0x5e).name, "INVALID");
    }
}
