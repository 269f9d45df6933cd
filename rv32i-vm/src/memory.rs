use thiserror::Error;

/// Memory access errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("Out-of-bounds memory access at word {0:#x}")]
    OutOfBounds(u64),
}

/// Flat instruction store.
///
/// Memory is an array of 32-bit words indexed by word, not by byte. The
/// program counter is an index into this array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    data: Vec<u32>,
}

impl Memory {
    /// Create a zero-filled memory of `words` words.
    pub fn new(words: usize) -> Self {
        Self {
            data: vec![0; words],
        }
    }

    /// Capacity in words.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether `index` names a word inside memory.
    #[inline]
    pub fn contains(&self, index: u32) -> bool {
        (index as usize) < self.data.len()
    }

    fn check_bounds(&self, index: u64, count: usize) -> Result<usize, MemoryError> {
        let off = usize::try_from(index).map_err(|_| MemoryError::OutOfBounds(index))?;
        let end = off
            .checked_add(count)
            .ok_or(MemoryError::OutOfBounds(index))?;
        if end > self.data.len() {
            return Err(MemoryError::OutOfBounds(index));
        }
        Ok(off)
    }

    pub fn load_word(&self, index: u32) -> Result<u32, MemoryError> {
        let off = self.check_bounds(index as u64, 1)?;
        Ok(self.data[off])
    }

    #[cfg(test)]
    pub fn store_word(&mut self, index: u32, value: u32) -> Result<(), MemoryError> {
        let off = self.check_bounds(index as u64, 1)?;
        self.data[off] = value;
        Ok(())
    }

    /// Copy `words` into memory starting at `index`.
    ///
    /// Nothing is written unless the whole range fits.
    pub fn write_words(&mut self, index: usize, words: &[u32]) -> Result<(), MemoryError> {
        let off = self.check_bounds(index as u64, words.len())?;
        self.data[off..off + words.len()].copy_from_slice(words);
        Ok(())
    }

    pub fn words(&self) -> &[u32] {
        &self.data
    }

    /// Little-endian byte image, used for hashing snapshots.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|w| w.to_le_bytes()).collect()
    }
}
