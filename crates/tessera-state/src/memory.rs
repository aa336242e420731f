//! In-memory world state

use std::collections::HashMap;

use tessera_crypto::keccak256;
use tessera_primitives::{Address, H256};
use tracing::trace;

use crate::account::{Account, EMPTY_CODE_HASH};
use crate::error::{StateError, StateResult};
use crate::traits::StateAccess;

type StorageMap = HashMap<Address, HashMap<H256, H256>>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Layer {
    accounts: HashMap<Address, Account>,
    code: HashMap<Address, Vec<u8>>,
    storage: StorageMap,
}

/// World state held entirely in `HashMap`s.
///
/// Each checkpoint stores a full copy of the state it can be reverted to.
/// Cloning the whole value gives a snapshot that can be restored later.
#[derive(Clone, Debug, Default)]
pub struct InMemoryState {
    current: Layer,
    snapshots: Vec<Layer>,
    original_storage: Option<StorageMap>,
}

impl InMemoryState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account, builder style
    pub fn with_account(mut self, address: Address, account: Account) -> Self {
        self.current.accounts.insert(address, account);
        self
    }

    /// Seed code at an address, builder style
    pub fn with_code(mut self, address: Address, code: Vec<u8>) -> Self {
        let account = self.current.accounts.entry(address).or_default();
        account.code_hash = keccak256(&code);
        self.current.code.insert(address, code);
        self
    }

    /// Number of open checkpoints
    pub fn depth(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether an account record exists at `address`
    pub fn contains_account(&self, address: &Address) -> bool {
        self.current.accounts.contains_key(address)
    }

    /// Number of non-empty storage slots at `address`
    pub fn storage_len(&self, address: &Address) -> usize {
        self.current
            .storage
            .get(address)
            .map(|slots| slots.values().filter(|v| !v.is_zero()).count())
            .unwrap_or(0)
    }

    /// True when both states hold identical accounts, code and storage
    pub fn same_contents(&self, other: &InMemoryState) -> bool {
        self.current == other.current
    }
}

impl StateAccess for InMemoryState {
    fn get_account(&self, address: &Address) -> StateResult<Account> {
        Ok(self.current.accounts.get(address).cloned().unwrap_or_default())
    }

    fn put_account(&mut self, address: Address, account: Account) -> StateResult<()> {
        self.current.accounts.insert(address, account);
        Ok(())
    }

    fn get_contract_code(&self, address: &Address) -> StateResult<Vec<u8>> {
        Ok(self.current.code.get(address).cloned().unwrap_or_default())
    }

    fn put_contract_code(&mut self, address: Address, code: Vec<u8>) -> StateResult<()> {
        let account = self.current.accounts.entry(address).or_default();
        if code.is_empty() {
            account.code_hash = EMPTY_CODE_HASH;
            self.current.code.remove(&address);
        } else {
            account.code_hash = keccak256(&code);
            self.current.code.insert(address, code);
        }
        Ok(())
    }

    fn clear_contract_storage(&mut self, address: &Address) -> StateResult<()> {
        self.current.storage.remove(address);
        Ok(())
    }

    fn storage_load(&self, address: &Address, key: &H256, original: bool) -> StateResult<H256> {
        let storage = match (&self.original_storage, original) {
            (Some(snapshot), true) => snapshot,
            _ => &self.current.storage,
        };
        Ok(storage
            .get(address)
            .and_then(|slots| slots.get(key))
            .copied()
            .unwrap_or(H256::ZERO))
    }

    fn storage_store(&mut self, address: Address, key: H256, value: H256) -> StateResult<()> {
        let slots = self.current.storage.entry(address).or_default();
        if value.is_zero() {
            slots.remove(&key);
        } else {
            slots.insert(key, value);
        }
        Ok(())
    }

    fn checkpoint(&mut self) -> StateResult<()> {
        if self.snapshots.is_empty() {
            self.original_storage = Some(self.current.storage.clone());
        }
        self.snapshots.push(self.current.clone());
        trace!(depth = self.snapshots.len(), "state checkpoint");
        Ok(())
    }

    fn commit(&mut self) -> StateResult<()> {
        self.snapshots.pop().ok_or(StateError::NoCheckpoint)?;
        if self.snapshots.is_empty() {
            self.original_storage = None;
        }
        trace!(depth = self.snapshots.len(), "state commit");
        Ok(())
    }

    fn revert(&mut self) -> StateResult<()> {
        self.current = self.snapshots.pop().ok_or(StateError::NoCheckpoint)?;
        if self.snapshots.is_empty() {
            self.original_storage = None;
        }
        trace!(depth = self.snapshots.len(), "state revert");
        Ok(())
    }
}
