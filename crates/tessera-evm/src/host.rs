//! What instruction handlers may ask of the world outside their frame

use bytes::Bytes;
use primitive_types::U256;
use tessera_primitives::{Address, H256};
use tessera_state::Account;

use crate::error::EvmResult;
use crate::evm::RunCallResult;
use crate::message::Message;

/// Services the orchestrator provides to a running frame.
///
/// Calls are synchronous: a nested [`call`](Host::call) runs to completion
/// before the handler that issued it resumes.
pub trait Host {
    /// Account record, empty if absent
    fn account(&self, address: &Address) -> EvmResult<Account>;

    /// Deployed code, empty if none
    fn code(&self, address: &Address) -> EvmResult<Bytes>;

    /// Persistent storage slot
    fn storage_load(&self, address: &Address, key: &H256, original: bool) -> EvmResult<H256>;

    /// Write a persistent storage slot
    fn storage_store(&mut self, address: Address, key: H256, value: H256) -> EvmResult<()>;

    /// Transient storage slot
    fn transient_load(&self, address: &Address, key: &H256) -> H256;

    /// Write a transient storage slot
    fn transient_store(&mut self, address: Address, key: H256, value: H256) -> EvmResult<()>;

    /// Bump an account nonce, as CREATE does for its caller
    fn increment_nonce(&mut self, address: &Address) -> EvmResult<u64>;

    /// Move `address`'s balance to `beneficiary`
    fn selfdestruct(&mut self, address: &Address, beneficiary: &Address) -> EvmResult<()>;

    /// Run a nested message
    fn call(&mut self, message: Message) -> EvmResult<RunCallResult>;

    /// Account balance
    fn balance(&self, address: &Address) -> EvmResult<U256> {
        Ok(self.account(address)?.balance)
    }

    /// Code hash, zero for empty accounts (EIP-1052)
    fn code_hash(&self, address: &Address) -> EvmResult<H256> {
        let account = self.account(address)?;
        if account.is_empty() {
            Ok(H256::ZERO)
        } else {
            Ok(account.code_hash)
        }
    }
}
