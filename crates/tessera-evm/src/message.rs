//! Call and create message descriptor

use std::collections::HashSet;

use bytes::Bytes;
use primitive_types::U256;
use tessera_primitives::{Address, H256};

use crate::error::{EvmError, EvmResult};

/// One call or create invocation.
///
/// `to == None` marks a contract creation; in that case `data` carries the
/// init code until the orchestrator moves it into `code`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Target account, absent for creation
    pub to: Option<Address>,
    /// Value transferred
    pub value: U256,
    /// Sender
    pub caller: Address,
    /// Gas available to the frame
    pub gas_limit: u64,
    /// Call data. `None` exposes a single zero byte to the frame.
    pub data: Option<Bytes>,
    /// Call depth, 0 for the top-level message
    pub depth: usize,
    /// Code to execute
    pub code: Bytes,
    /// Account whose code runs, defaults to `to`
    pub code_address: Option<Address>,
    /// Forbid state modification
    pub is_static: bool,
    /// Code is native rather than bytecode
    pub is_compiled: bool,
    /// CREATE2 salt
    pub salt: Option<H256>,
    /// Nonce a CREATE address derives from, the caller's current nonce if unset
    pub create_nonce: Option<u64>,
    /// Self-destructs inherited from the caller frame
    pub selfdestruct: HashSet<Address>,
    /// Run `code_address`'s code in the caller's context without transfer
    pub delegatecall: bool,
    /// Account debited instead of `caller`
    pub authcall_origin: Option<Address>,
    /// Refund counter inherited from the caller frame
    pub gas_refund: u64,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            to: None,
            value: U256::zero(),
            caller: Address::ZERO,
            gas_limit: 0,
            data: Some(Bytes::new()),
            depth: 0,
            code: Bytes::new(),
            code_address: None,
            is_static: false,
            is_compiled: false,
            salt: None,
            create_nonce: None,
            selfdestruct: HashSet::new(),
            delegatecall: false,
            authcall_origin: None,
            gas_refund: 0,
        }
    }
}

impl Message {
    /// Call `to` from `caller`
    pub fn call(caller: Address, to: Address, gas_limit: u64) -> Self {
        Self {
            to: Some(to),
            caller,
            gas_limit,
            ..Default::default()
        }
    }

    /// Deploy `init_code` from `caller`
    pub fn create(caller: Address, init_code: Bytes, gas_limit: u64) -> Self {
        Self {
            caller,
            gas_limit,
            data: Some(init_code),
            ..Default::default()
        }
    }

    /// Set the transferred value
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Set the call data
    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Whether this message deploys a contract
    pub fn is_create(&self) -> bool {
        self.to.is_none()
    }

    /// Account whose code runs: explicit code address, else `to`.
    pub fn code_address(&self) -> EvmResult<Address> {
        self.code_address
            .or(self.to)
            .ok_or(EvmError::MissingCodeAddress)
    }
}
