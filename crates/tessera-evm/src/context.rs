//! Execution context for EVM

use bytes::Bytes;
use primitive_types::U256;
use tessera_primitives::{Address, H256};
use tessera_state::Account;

/// Block environment information
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockContext {
    /// Block number
    pub number: u64,
    /// Block timestamp
    pub timestamp: u64,
    /// Block gas limit
    pub gas_limit: u64,
    /// Block coinbase
    pub coinbase: Address,
    /// prevrandao (formerly difficulty)
    pub prevrandao: H256,
    /// Chain ID
    pub chain_id: u64,
    /// Base fee (EIP-1559)
    pub base_fee: U256,
}

impl Default for BlockContext {
    fn default() -> Self {
        Self {
            number: 0,
            timestamp: 0,
            gas_limit: 30_000_000,
            coinbase: Address::ZERO,
            prevrandao: H256::ZERO,
            chain_id: 1,
            base_fee: U256::zero(),
        }
    }
}

/// Transaction-wide values shared by every frame
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxContext {
    /// Transaction origin (original sender)
    pub origin: Address,
    /// Gas price
    pub gas_price: U256,
}

/// Everything a frame can observe about its invocation
#[derive(Clone, Debug, Default)]
pub struct Environment {
    /// Executing account
    pub address: Address,
    /// Immediate caller
    pub caller: Address,
    /// Call data
    pub call_data: Bytes,
    /// Value sent with the call
    pub call_value: U256,
    /// Code being executed
    pub code: Bytes,
    /// Static frame
    pub is_static: bool,
    /// Call depth
    pub depth: usize,
    /// Gas price of the transaction
    pub gas_price: U256,
    /// Transaction origin
    pub origin: Address,
    /// Enclosing block
    pub block: BlockContext,
    /// Snapshot of the executing account, refreshed after SSTORE
    pub contract: Account,
    /// Account the code was loaded from
    pub code_address: Address,
    /// Refund counter inherited from the caller
    pub gas_refund: u64,
}
