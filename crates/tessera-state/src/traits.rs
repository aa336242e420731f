//! Execution environment interface

use crate::account::Account;
use crate::error::StateResult;
use tessera_primitives::{Address, H256};

/// World-state access consumed by the EVM.
///
/// Checkpoints nest to arbitrary depth and must be closed in LIFO order by
/// exactly one of [`commit`](StateAccess::commit) or
/// [`revert`](StateAccess::revert).
pub trait StateAccess {
    /// Account at `address`, or an empty account if none exists
    fn get_account(&self, address: &Address) -> StateResult<Account>;

    /// Store an account record
    fn put_account(&mut self, address: Address, account: Account) -> StateResult<()>;

    /// Code deployed at `address` (empty if none)
    fn get_contract_code(&self, address: &Address) -> StateResult<Vec<u8>>;

    /// Deploy code at `address`, updating the account's code hash
    fn put_contract_code(&mut self, address: Address, code: Vec<u8>) -> StateResult<()>;

    /// Drop every storage slot of `address`
    fn clear_contract_storage(&mut self, address: &Address) -> StateResult<()>;

    /// Storage slot value. With `original` set, the value as of the start of
    /// the outermost open checkpoint.
    fn storage_load(&self, address: &Address, key: &H256, original: bool) -> StateResult<H256>;

    /// Write a storage slot
    fn storage_store(&mut self, address: Address, key: H256, value: H256) -> StateResult<()>;

    /// Open a checkpoint
    fn checkpoint(&mut self) -> StateResult<()>;

    /// Keep changes since the last checkpoint and close it
    fn commit(&mut self) -> StateResult<()>;

    /// Discard changes since the last checkpoint and close it
    fn revert(&mut self) -> StateResult<()>;
}
