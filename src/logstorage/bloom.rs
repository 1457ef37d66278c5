//! Per-column token bloom filter
//!
//! Each indexed column of a block carries a bloom filter over the tokens of
//! its values. Filters probe it during the coarse phase: a token reported
//! absent is definitely absent from every row, so the whole block can be
//! dropped without decoding the column.
//!
//! The filter is built once when the block is indexed and is read-only
//! afterwards, so plain words are used instead of atomics.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Default target false positive rate
pub const DEFAULT_FP_RATE: f64 = 0.01;

/// Immutable bloom filter over a set of tokens
#[derive(Debug, Clone)]
pub struct TokenBloom {
    /// Bit vector
    bits: Vec<u64>,
    /// Number of bits (m)
    num_bits: usize,
    /// Number of hash functions (k)
    num_hashes: u32,
}

impl TokenBloom {
    /// Build a filter holding `tokens` with the given false positive rate
    pub fn build<S: AsRef<str>>(tokens: &[S], fp_rate: f64) -> Self {
        let fp_rate = fp_rate.clamp(0.0001, 0.5);
        let capacity = tokens.len().max(1);

        // m = -n * ln(p) / (ln(2)^2)
        let num_bits = (-(capacity as f64) * fp_rate.ln() / (2.0_f64.ln().powi(2))).ceil() as usize;
        let num_bits = num_bits.max(64);

        // k = (m/n) * ln(2)
        let num_hashes = ((num_bits as f64 / capacity as f64) * 2.0_f64.ln()).round() as u32;
        let num_hashes = num_hashes.clamp(1, 30);

        let num_words = num_bits.div_ceil(64);
        let mut bloom = Self {
            bits: vec![0; num_words],
            num_bits: num_words * 64,
            num_hashes,
        };

        for token in tokens {
            bloom.insert(token.as_ref());
        }
        bloom
    }

    fn insert(&mut self, token: &str) {
        let (h1, h2) = hash_pair(token);
        for i in 0..self.num_hashes {
            let index = self.get_index(h1, h2, i);
            self.bits[index / 64] |= 1u64 << (index % 64);
        }
    }

    /// Check if `token` might be present
    ///
    /// Returns false only if the token is definitely absent.
    pub fn contains(&self, token: &str) -> bool {
        let (h1, h2) = hash_pair(token);
        (0..self.num_hashes).all(|i| {
            let index = self.get_index(h1, h2, i);
            (self.bits[index / 64] & (1u64 << (index % 64))) != 0
        })
    }

    /// Check if every token might be present
    pub fn contains_all<S: AsRef<str>>(&self, tokens: &[S]) -> bool {
        tokens.iter().all(|t| self.contains(t.as_ref()))
    }

    /// Get memory usage in bytes
    pub fn memory_bytes(&self) -> usize {
        self.bits.len() * 8
    }

    /// Bit index using double hashing: h(i) = h1 + i*h2
    fn get_index(&self, h1: u64, h2: u64, i: u32) -> usize {
        let hash = h1.wrapping_add((i as u64).wrapping_mul(h2));
        (hash as usize) % self.num_bits
    }
}

/// Two independent hashes of `token` for double hashing
///
/// `DefaultHasher::new()` uses fixed keys, so indexes built on one process
/// are probed identically by another.
fn hash_pair(token: &str) -> (u64, u64) {
    let mut hasher1 = DefaultHasher::new();
    token.hash(&mut hasher1);
    let h1 = hasher1.finish();

    let mut hasher2 = DefaultHasher::new();
    h1.hash(&mut hasher2);
    token.hash(&mut hasher2);
    let h2 = hasher2.finish();

    (h1, h2)
}
