//! Row Bitmap for Block Evaluation
//!
//! A fixed-length bit vector where bit N is set while row N of the block
//! is still a candidate match. Filters only ever clear bits on the bitmap
//! they are handed; combinators work on scratch copies drawn from the
//! per-thread bitmap pool.
//!
//! # Example
//!
//! ```rust
//! use kuba_logstore::logstorage::Bitmap;
//!
//! let mut bm = Bitmap::new(100);
//! assert!(bm.are_all_bits_set());
//!
//! bm.clear_bit(3);
//! bm.clear_bit(64);
//! assert!(!bm.is_set_bit(3));
//! assert_eq!(bm.count_ones(), 98);
//! ```

use std::cell::RefCell;

use super::pool::{FreeList, LocalPool, Pooled, Reusable};

// ============================================================================
// Bitmap
// ============================================================================

/// Fixed-length bit vector of candidate rows
///
/// Uses a vector of u64 words. Bits past `bits_len` in the last word are
/// always kept at zero so word-level operations never leak phantom rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bitmap {
    /// Bitmap words (64 bits each)
    words: Vec<u64>,

    /// Number of addressable bits
    bits_len: usize,
}

impl Bitmap {
    /// Create a bitmap for `bits_len` rows with every bit set
    pub fn new(bits_len: usize) -> Self {
        let mut bm = Self::default();
        bm.init(bits_len);
        bm
    }

    /// Re-initialize for `bits_len` rows with every bit set, reusing storage
    pub fn init(&mut self, bits_len: usize) {
        self.words.clear();
        self.words.resize(bits_len.div_ceil(64), u64::MAX);
        self.bits_len = bits_len;
        self.trim_tail();
    }

    /// Number of addressable bits (rows)
    #[inline]
    pub fn bits_len(&self) -> usize {
        self.bits_len
    }

    /// Clear every bit
    pub fn reset_bits(&mut self) {
        self.words.fill(0);
    }

    /// Set every bit
    pub fn set_bits(&mut self) {
        self.words.fill(u64::MAX);
        self.trim_tail();
    }

    /// Check whether no bit is set
    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Check whether every bit is set
    pub fn are_all_bits_set(&self) -> bool {
        self.count_ones() == self.bits_len
    }

    /// Number of set bits
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Check if bit `idx` is set
    #[inline]
    pub fn is_set_bit(&self, idx: usize) -> bool {
        debug_assert!(idx < self.bits_len, "bit {idx} out of range {}", self.bits_len);
        (self.words[idx / 64] & (1u64 << (idx % 64))) != 0
    }

    /// Mark row `idx` as excluded. Idempotent.
    #[inline]
    pub fn clear_bit(&mut self, idx: usize) {
        debug_assert!(idx < self.bits_len, "bit {idx} out of range {}", self.bits_len);
        self.words[idx / 64] &= !(1u64 << (idx % 64));
    }

    /// Set bit `idx`
    ///
    /// Only scratch bitmaps built by combinators set bits; a bitmap handed to
    /// a filter is narrowed, never widened.
    #[inline]
    pub fn set_bit(&mut self, idx: usize) {
        debug_assert!(idx < self.bits_len, "bit {idx} out of range {}", self.bits_len);
        self.words[idx / 64] |= 1u64 << (idx % 64);
    }

    /// Make this bitmap an exact copy of `src`, reusing storage
    pub fn copy_from(&mut self, src: &Bitmap) {
        self.words.clear();
        self.words.extend_from_slice(&src.words);
        self.bits_len = src.bits_len;
    }

    /// Bitwise AND with another bitmap of the same length (intersection)
    pub fn and(&mut self, other: &Bitmap) {
        self.check_same_len(other);
        for (dst, &src) in self.words.iter_mut().zip(&other.words) {
            *dst &= src;
        }
    }

    /// Bitwise OR with another bitmap of the same length (union)
    pub fn or(&mut self, other: &Bitmap) {
        self.check_same_len(other);
        for (dst, &src) in self.words.iter_mut().zip(&other.words) {
            *dst |= src;
        }
    }

    /// Bitwise AND-NOT (difference: self AND NOT other)
    pub fn and_not(&mut self, other: &Bitmap) {
        self.check_same_len(other);
        for (dst, &src) in self.words.iter_mut().zip(&other.words) {
            *dst &= !src;
        }
    }

    /// Flip every bit within `bits_len`
    pub fn invert(&mut self) {
        for w in &mut self.words {
            *w = !*w;
        }
        self.trim_tail();
    }

    /// Iterate over set bit indexes in ascending order
    pub fn iter_set_bits(&self) -> SetBits<'_> {
        SetBits {
            words: &self.words,
            word_idx: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }

    /// Call `f` for every set bit and clear the bits for which it returns false
    pub fn for_each_set_bit<F>(&mut self, mut f: F)
    where
        F: FnMut(usize) -> bool,
    {
        for (word_idx, word) in self.words.iter_mut().enumerate() {
            let mut pending = *word;
            let mut keep = *word;
            while pending != 0 {
                let bit = pending.trailing_zeros() as usize;
                if !f(word_idx * 64 + bit) {
                    keep &= !(1u64 << bit);
                }
                pending &= pending - 1;
            }
            *word = keep;
        }
    }

    /// Get memory usage in bytes
    pub fn memory_bytes(&self) -> usize {
        self.words.capacity() * 8
    }

    fn trim_tail(&mut self) {
        let tail = self.bits_len % 64;
        if tail != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << tail) - 1;
            }
        }
    }

    #[inline]
    fn check_same_len(&self, other: &Bitmap) {
        assert_eq!(
            self.bits_len, other.bits_len,
            "bitmap length mismatch: {} vs {}",
            self.bits_len, other.bits_len
        );
    }
}

impl Reusable for Bitmap {
    fn reset(&mut self) {
        self.words.clear();
        self.bits_len = 0;
    }
}

/// Iterator over set bits in a bitmap
pub struct SetBits<'a> {
    words: &'a [u64],
    word_idx: usize,
    current: u64,
}

impl Iterator for SetBits<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1;
                return Some(self.word_idx * 64 + bit);
            }
            self.word_idx += 1;
            self.current = *self.words.get(self.word_idx)?;
        }
    }
}

// ============================================================================
// Pool
// ============================================================================

thread_local! {
    static BITMAPS: FreeList<Bitmap> = const { RefCell::new(Vec::new()) };
}

static BITMAP_POOL: LocalPool<Bitmap> = LocalPool::new("bitmap", &BITMAPS);

/// Take a bitmap of `bits_len` all-set bits from the current thread's pool
pub fn get_bitmap(bits_len: usize) -> Pooled<Bitmap> {
    let mut bm = BITMAP_POOL.get();
    bm.init(bits_len);
    bm
}

/// Take a pooled bitmap holding a copy of `src`
pub fn get_bitmap_copy(src: &Bitmap) -> Pooled<Bitmap> {
    let mut bm = BITMAP_POOL.get();
    bm.copy_from(src);
    bm
}

// ============================================================================
// Tests
// ============================================================================
