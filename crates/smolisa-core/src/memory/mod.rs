//! Word-addressable main memory.

use crate::bus::WriteMask;
use crate::Fault;

/// Memory capacity of the reference configuration, in 16-bit words.
pub const DEFAULT_MEMORY_WORDS: usize = 1024;

/// Converts a datapath byte address into a word index.
///
/// The memory port ignores address bit 0.
#[must_use]
pub const fn word_index(addr: u16) -> usize {
    (addr >> 1) as usize
}

/// Fixed-size array of 16-bit words with masked writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Memory {
    words: Box<[u16]>,
}

impl Memory {
    /// Allocates `capacity` zeroed words.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity].into_boxed_slice(),
        }
    }

    /// Capacity in words.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.words.len()
    }

    /// Combinational read.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::OutOfBoundsAddress`] when `index >= capacity`.
    pub fn read(&self, index: usize) -> Result<u16, Fault> {
        self.words
            .get(index)
            .copied()
            .ok_or(Fault::OutOfBoundsAddress {
                index,
                capacity: self.capacity(),
            })
    }

    /// Masked write. An empty mask changes nothing but is still bounds-checked.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::OutOfBoundsAddress`] when `index >= capacity`.
    pub fn write(&mut self, index: usize, data: u16, mask: WriteMask) -> Result<(), Fault> {
        let capacity = self.capacity();
        let cell = self
            .words
            .get_mut(index)
            .ok_or(Fault::OutOfBoundsAddress { index, capacity })?;
        *cell = mask.apply(*cell, data);
        Ok(())
    }

    /// Replaces the whole contents with `image`, zero-filling the tail.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::ImageTooLarge`] without touching memory when the
    /// image does not fit.
    pub fn load_image(&mut self, image: &[u16]) -> Result<(), Fault> {
        let capacity = self.capacity();
        if image.len() > capacity {
            return Err(Fault::ImageTooLarge {
                len: image.len(),
                capacity,
            });
        }

        let (head, tail) = self.words.split_at_mut(image.len());
        head.copy_from_slice(image);
        tail.fill(0);
        Ok(())
    }

    /// All words in address order.
    #[must_use]
    pub fn words(&self) -> &[u16] {
        &self.words
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_WORDS)
    }
}
