//! Growable word memory.

use std::fmt;

/// Largest address the memory will grow to (64 Mi words).
pub const MAX_ADDRESS: i64 = (1 << 26) - 1;

/// Zero-indexed, zero-filled store of 64-bit words.
///
/// Any access at or beyond the current length grows the store with zeros
/// up to and including that address. Negative addresses are never mapped.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Memory {
    cells: Vec<i64>,
}

/// Why an address could not be mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unmapped {
    Negative,
    TooLarge,
}

impl Memory {
    /// Seed memory with a copy of the given words.
    pub fn from_words(words: &[i64]) -> Self {
        Self { cells: words.to_vec() }
    }

    /// Current length in words.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when no words are stored.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All words, including any zero-filled growth.
    pub fn cells(&self) -> &[i64] {
        &self.cells
    }

    /// Read without growing. Addresses past the end read as zero.
    pub fn peek(&self, address: i64) -> Option<i64> {
        if !(0..=MAX_ADDRESS).contains(&address) {
            return None;
        }
        Some(self.cells.get(address as usize).copied().unwrap_or(0))
    }

    /// Read a word, growing the store if needed.
    pub fn read(&mut self, address: i64) -> Result<i64, Unmapped> {
        self.slot(address).map(|cell| *cell)
    }

    /// Write a word, growing the store if needed.
    pub fn write(&mut self, address: i64, value: i64) -> Result<(), Unmapped> {
        *self.slot(address)? = value;
        Ok(())
    }

    fn slot(&mut self, address: i64) -> Result<&mut i64, Unmapped> {
        if address < 0 {
            return Err(Unmapped::Negative);
        }
        if address > MAX_ADDRESS {
            return Err(Unmapped::TooLarge);
        }

        let index = address as usize;
        if index >= self.cells.len() {
            self.cells.resize(index + 1, 0);
        }
        Ok(&mut self.cells[index])
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Programs are long; summarise instead of dumping every word.
        let nonzero = self.cells.iter().filter(|&&v| v != 0).count();
        write!(f, "Memory{{len={}, nonzero={}}}", self.cells.len(), nonzero)
    }
}
