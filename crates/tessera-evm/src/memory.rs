//! EVM memory implementation

use primitive_types::U256;

use crate::error::{EvmError, EvmResult};

/// Largest size memory may grow to. Expansion this far already costs more
/// gas than any frame carries.
pub const MAX_MEMORY_SIZE: usize = u32::MAX as usize;

/// Round `value` up to the next multiple of 32, `None` on overflow
pub fn word_aligned(value: usize) -> Option<usize> {
    value.checked_next_multiple_of(32)
}

/// Byte-addressable memory. Grows in 32-byte words and never shrinks.
/// Everything past the written region reads as zero.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Create new empty memory
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Current size in bytes, always a multiple of 32
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if nothing has been allocated
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Grow to cover `[offset, offset + size)`, rounded up to a word.
    /// Fails with `OutOfGas` past [`MAX_MEMORY_SIZE`].
    pub fn extend(&mut self, offset: usize, size: usize) -> EvmResult<()> {
        if size == 0 {
            return Ok(());
        }
        let new_size = offset
            .checked_add(size)
            .and_then(word_aligned)
            .filter(|&end| end <= MAX_MEMORY_SIZE)
            .ok_or(EvmError::OutOfGas)?;
        if new_size > self.data.len() {
            self.data.resize(new_size, 0);
        }
        Ok(())
    }

    /// Write `value` at `offset`. `value` must be exactly `size` bytes.
    pub fn write(&mut self, offset: usize, size: usize, value: &[u8]) -> EvmResult<()> {
        if size == 0 {
            return Ok(());
        }
        if value.len() != size {
            return Err(EvmError::InvalidMemoryAccess);
        }
        self.extend(offset, size)?;
        let end = offset + size;
        if end > self.data.len() {
            return Err(EvmError::Internal("memory write past extended region".into()));
        }
        self.data[offset..end].copy_from_slice(value);
        Ok(())
    }

    /// Read `size` bytes at `offset`, growing memory as a write would.
    pub fn read(&mut self, offset: usize, size: usize) -> EvmResult<Vec<u8>> {
        self.extend(offset, size)?;
        let mut out = vec![0u8; size];
        if offset < self.data.len() {
            let end = offset.saturating_add(size).min(self.data.len());
            out[..end - offset].copy_from_slice(&self.data[offset..end]);
        }
        Ok(out)
    }

    /// Load a 32-byte word
    pub fn load_word(&mut self, offset: usize) -> EvmResult<U256> {
        Ok(U256::from_big_endian(&self.read(offset, 32)?))
    }

    /// Store a 32-byte word
    pub fn store_word(&mut self, offset: usize, value: U256) -> EvmResult<()> {
        let mut buf = [0u8; 32];
        value.to_big_endian(&mut buf);
        self.write(offset, 32, &buf)
    }

    /// Store a single byte
    pub fn store_byte(&mut self, offset: usize, value: u8) -> EvmResult<()> {
        self.write(offset, 1, &[value])
    }

    /// Overlap-safe copy inside memory (MCOPY)
    pub fn copy_within(&mut self, dest: usize, src: usize, size: usize) -> EvmResult<()> {
        if size == 0 {
            return Ok(());
        }
        self.extend(dest.max(src), size)?;
        self.data.copy_within(src..src + size, dest);
        Ok(())
    }

    /// Get raw data slice
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
