//! Dense row bitmap
//!
//! Tracks which rows of a block are still candidates during filter
//! evaluation. Filters only ever narrow a bitmap: bits start set and get
//! cleared as rows fail.

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};

/// A bitmask over the rows of one block, 1 = candidate, 0 = filtered out.
#[derive(Debug, Clone, Default)]
pub struct Bitmap {
    /// Bit array, 64 rows per word. Bits past `bits_len` stay zero.
    words: Vec<u64>,
    /// Total number of rows
    bits_len: usize,
}

impl Bitmap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bitmap with all `len` rows set
    pub fn all_set(len: usize) -> Self {
        let mut bm = Self::new();
        bm.init(len);
        bm.set_bits();
        bm
    }

    /// Resize to `len` rows, all clear. Keeps the existing allocation.
    pub fn init(&mut self, len: usize) {
        let num_words = len.div_ceil(64);
        self.words.clear();
        self.words.resize(num_words, 0);
        self.bits_len = len;
    }

    /// Set every row bit
    pub fn set_bits(&mut self) {
        self.words.fill(u64::MAX);
        // Keep bits beyond bits_len clear
        if self.bits_len % 64 != 0 {
            let last = self.words.len() - 1;
            self.words[last] = (1u64 << (self.bits_len % 64)) - 1;
        }
    }

    /// Clear every row bit
    pub fn reset_bits(&mut self) {
        self.words.fill(0);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bits_len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits_len == 0
    }

    /// Check whether no rows remain set
    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Check whether a specific row is set
    #[inline]
    pub fn is_set(&self, index: usize) -> bool {
        if index >= self.bits_len {
            return false;
        }
        self.words[index / 64] & (1u64 << (index % 64)) != 0
    }

    /// Count of set rows
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Visit every set row in ascending order; the visitor returns whether
    /// the row should stay set.
    pub fn for_each_set_bit(&mut self, mut keep: impl FnMut(usize) -> bool) {
        for (word_idx, word) in self.words.iter_mut().enumerate() {
            if *word == 0 {
                continue;
            }
            let base = word_idx * 64;
            let mut w = *word;
            while w != 0 {
                let bit = w.trailing_zeros() as usize;
                w &= w - 1; // Clear lowest set bit
                if !keep(base + bit) {
                    *word &= !(1u64 << bit);
                }
            }
        }
    }

    /// Clear every row that is set in `other`
    pub fn and_not(&mut self, other: &Bitmap) {
        assert_eq!(self.bits_len, other.bits_len, "bitmap length mismatch");
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a &= !*b;
        }
    }

    /// Set every row that is set in `other` (union)
    pub fn or(&mut self, other: &Bitmap) {
        assert_eq!(self.bits_len, other.bits_len, "bitmap length mismatch");
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a |= *b;
        }
    }

    /// Replace this bitmap's contents with a copy of `other`
    pub fn copy_from(&mut self, other: &Bitmap) {
        self.words.clear();
        self.words.extend_from_slice(&other.words);
        self.bits_len = other.bits_len;
    }

    /// Indices of set rows, ascending
    pub fn indices(&self) -> Vec<usize> {
        let mut result = Vec::with_capacity(self.count());
        for (word_idx, &word) in self.words.iter().enumerate() {
            let base = word_idx * 64;
            let mut w = word;
            while w != 0 {
                let bit = w.trailing_zeros() as usize;
                result.push(base + bit);
                w &= w - 1;
            }
        }
        result
    }
}

thread_local! {
    static SCRATCH_POOL: RefCell<Vec<Bitmap>> = const { RefCell::new(Vec::new()) };
}

/// A pooled bitmap for combinator scratch work. Dereferences to [`Bitmap`]
/// and returns its allocation to the per-thread pool on drop.
pub(crate) struct ScratchBitmap {
    bm: Bitmap,
}

impl ScratchBitmap {
    /// Grab a bitmap from the pool, sized to `len` rows, all clear.
    pub(crate) fn get(len: usize) -> Self {
        let mut bm = SCRATCH_POOL
            .with(|pool| pool.borrow_mut().pop())
            .unwrap_or_default();
        bm.init(len);
        Self { bm }
    }
}

impl Deref for ScratchBitmap {
    type Target = Bitmap;

    fn deref(&self) -> &Bitmap {
        &self.bm
    }
}

impl DerefMut for ScratchBitmap {
    fn deref_mut(&mut self) -> &mut Bitmap {
        &mut self.bm
    }
}

impl Drop for ScratchBitmap {
    fn drop(&mut self) {
        let bm = std::mem::take(&mut self.bm);
        SCRATCH_POOL.with(|pool| pool.borrow_mut().push(bm));
    }
}
