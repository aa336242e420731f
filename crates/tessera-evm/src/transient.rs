//! Transient storage (EIP-1153)
//!
//! Per-transaction key/value scratch space. Every write journals the value it
//! replaces; a checkpoint is just the journal length at that moment, so
//! reverting replays the journal tail backwards.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tessera_primitives::{Address, H256};
use tracing::trace;

use crate::error::{EvmError, EvmResult};

#[derive(Clone, Debug)]
struct JournalEntry {
    address: Address,
    key: H256,
    prev_value: H256,
}

/// Journaled transient storage shared by one transaction's call tree
#[derive(Clone, Debug, Default)]
pub struct TransientStorage {
    storage: HashMap<Address, HashMap<H256, H256>>,
    journal: Vec<JournalEntry>,
    indices: Vec<usize>,
}

impl TransientStorage {
    /// Create empty transient storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Value at (`address`, `key`), zero if never written
    pub fn get(&self, address: &Address, key: &[u8]) -> H256 {
        let Ok(key) = H256::from_slice(key) else {
            return H256::ZERO;
        };
        self.storage
            .get(address)
            .and_then(|slots| slots.get(&key))
            .copied()
            .unwrap_or(H256::ZERO)
    }

    /// Write a value. `key` must be 32 bytes; shorter values are left-padded.
    pub fn put(&mut self, address: Address, key: &[u8], value: &[u8]) -> EvmResult<()> {
        if key.len() != 32 {
            return Err(EvmError::TransientKeySize(key.len()));
        }
        if value.len() > 32 {
            return Err(EvmError::TransientValueSize(value.len()));
        }
        let key = H256::from_slice(key).map_err(|e| EvmError::Internal(e.to_string()))?;
        let mut padded = [0u8; 32];
        padded[32 - value.len()..].copy_from_slice(value);

        let slots = self.storage.entry(address).or_default();
        let prev_value = slots.get(&key).copied().unwrap_or(H256::ZERO);
        self.journal.push(JournalEntry {
            address,
            key,
            prev_value,
        });
        slots.insert(key, H256::from_bytes(padded));
        Ok(())
    }

    /// Mark the current journal position
    pub fn checkpoint(&mut self) {
        self.indices.push(self.journal.len());
        trace!(depth = self.indices.len(), "transient checkpoint");
    }

    /// Keep every write since the last checkpoint
    pub fn commit(&mut self) -> EvmResult<()> {
        self.indices.pop().ok_or(EvmError::NoCheckpoint)?;
        Ok(())
    }

    /// Undo every write since the last checkpoint
    pub fn revert(&mut self) -> EvmResult<()> {
        let mark = self.indices.pop().ok_or(EvmError::NoCheckpoint)?;
        for entry in self.journal.drain(mark..).rev() {
            self.storage
                .entry(entry.address)
                .or_default()
                .insert(entry.key, entry.prev_value);
        }
        trace!(depth = self.indices.len(), "transient revert");
        Ok(())
    }

    /// Drop all values, journal entries and checkpoints. Called at
    /// transaction boundaries.
    pub fn clear(&mut self) {
        self.storage.clear();
        self.journal.clear();
        self.indices.clear();
    }

    /// Number of journal entries
    pub fn journal_len(&self) -> usize {
        self.journal.len()
    }

    /// Number of open checkpoints
    pub fn depth(&self) -> usize {
        self.indices.len()
    }

    /// Dump as `{ address: { key: value } }` with hex strings
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for (address, slots) in &self.storage {
            let entries = slots
                .iter()
                .map(|(k, v)| (k.to_hex(), Value::String(v.to_hex())))
                .collect::<Map<_, _>>();
            out.insert(address.to_hex(), Value::Object(entries));
        }
        Value::Object(out)
    }
}
