//! Word-packed atomic bitset.
//!
//! A dense alternative to `Vec<AtomicBool>` for node masks and visited sets.

use core::sync::atomic::{AtomicUsize, Ordering};

/// A fixed-size, word-packed atomic bitset.
pub struct AtomicBitset {
    bits: usize,
    words: Vec<AtomicUsize>,
}

impl AtomicBitset {
    /// Creates a new bitset with `bits` bits, all cleared.
    pub fn new(bits: usize) -> Self {
        let word_bits = usize::BITS as usize;
        let words_len = bits.div_ceil(word_bits);
        let words = (0..words_len).map(|_| AtomicUsize::new(0)).collect();
        Self { bits, words }
    }

    /// Number of bits.
    pub fn len_bits(&self) -> usize {
        self.bits
    }

    /// Clears all bits.
    pub fn clear_all(&self) {
        for w in &self.words {
            w.store(0, Ordering::Relaxed);
        }
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Relaxed).count_ones() as usize)
            .sum()
    }

    /// Returns whether `bit` is set.
    ///
    /// # Panics
    /// Panics if `bit >= len_bits()`.
    pub fn is_set(&self, bit: usize) -> bool {
        assert!(bit < self.bits, "bit {bit} out of bounds for {} bits", self.bits);
        let (word, mask) = bit_word_mask(bit);
        (self.words[word].load(Ordering::Relaxed) & mask) != 0
    }

    /// Sets `bit` and returns `true` iff this call observed it previously cleared.
    ///
    /// # Panics
    /// Panics if `bit >= len_bits()`.
    pub fn test_and_set(&self, bit: usize, order: Ordering) -> bool {
        assert!(bit < self.bits, "bit {bit} out of bounds for {} bits", self.bits);
        let (word, mask) = bit_word_mask(bit);
        let prev = self.words[word].fetch_or(mask, order);
        (prev & mask) == 0
    }
}

impl core::fmt::Debug for AtomicBitset {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AtomicBitset")
            .field("bits", &self.bits)
            .field("ones", &self.count_ones())
            .finish()
    }
}

#[inline(always)]
fn bit_word_mask(bit: usize) -> (usize, usize) {
    let word_bits = usize::BITS as usize;
    (bit / word_bits, 1usize << (bit % word_bits))
}
