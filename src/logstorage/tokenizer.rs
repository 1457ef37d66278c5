//! Word Tokenizer
//!
//! Extracts the deduplicated, sorted set of word tokens from field values.
//! The same tokenizer is used when building per-column token indexes and
//! when probing them with filter arguments, so both sides agree on what a
//! token is.
//!
//! # Token Grammar
//!
//! A token is a maximal run of characters that are Unicode letters (general
//! category `L*`), decimal digits (`Nd`) or `_`. Every other character is a delimiter and is discarded. Tokens are
//! emitted verbatim: no case folding, no normalization.
//!
//! # Example
//!
//! ```rust
//! use kuba_logstore::logstorage::tokenize_strings;
//!
//! let mut tokens = Vec::new();
//! tokenize_strings(&mut tokens, &["GET /api/v1 200", "GET /api/v2 404"]);
//! assert_eq!(tokens, vec!["200", "404", "GET", "api", "v1", "v2"]);
//! ```

use std::cell::RefCell;
use std::collections::HashSet;

use unicode_general_category::{get_general_category, GeneralCategory};

use super::pool::{FreeList, LocalPool, Pooled, Reusable};

/// Check if `c` belongs to a token
///
/// Letter-numbers, superscripts, fractions and combining marks are
/// delimiters.
#[inline]
pub fn is_token_char(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_alphanumeric() || c == '_';
    }
    matches!(
        get_general_category(c),
        GeneralCategory::UppercaseLetter
            | GeneralCategory::LowercaseLetter
            | GeneralCategory::TitlecaseLetter
            | GeneralCategory::ModifierLetter
            | GeneralCategory::OtherLetter
            | GeneralCategory::DecimalNumber
    )
}

/// Extract word tokens from `values` and append them to `dst`
///
/// A value equal to its predecessor is skipped, since it cannot add new
/// tokens. Only the appended part of `dst` is sorted; entries that were
/// already present are left where they are.
pub fn tokenize_strings<S: AsRef<str>>(dst: &mut Vec<String>, values: &[S]) {
    let mut t = get_tokenizer();

    let mut prev: Option<&str> = None;
    for value in values {
        let s = value.as_ref();
        if prev == Some(s) {
            continue;
        }
        t.tokenize_string(s);
        prev = Some(s);
    }

    let start = dst.len();
    dst.extend(t.seen.drain());
    dst[start..].sort_unstable();
}

/// Scratch state for one tokenization pass
#[derive(Debug, Default)]
pub struct Tokenizer {
    /// Tokens seen so far in this pass
    seen: HashSet<String>,
}

impl Tokenizer {
    fn tokenize_string(&mut self, mut s: &str) {
        while !s.is_empty() {
            // Skip delimiters
            let start = s.find(is_token_char).unwrap_or(s.len());
            s = &s[start..];

            // Capture the token
            let end = s.find(|c: char| !is_token_char(c)).unwrap_or(s.len());
            let token = &s[..end];
            if !token.is_empty() && !self.seen.contains(token) {
                self.seen.insert(token.to_string());
            }
            s = &s[end..];
        }
    }
}

impl Reusable for Tokenizer {
    fn reset(&mut self) {
        self.seen.clear();
    }
}

/// Reusable buffer of tokens
#[derive(Debug, Default)]
pub struct TokensBuf {
    /// Buffered tokens
    pub tokens: Vec<String>,
}

impl Reusable for TokensBuf {
    fn reset(&mut self) {
        self.tokens.clear();
    }
}

thread_local! {
    static TOKENIZERS: FreeList<Tokenizer> = const { RefCell::new(Vec::new()) };
    static TOKENS_BUFS: FreeList<TokensBuf> = const { RefCell::new(Vec::new()) };
}

static TOKENIZER_POOL: LocalPool<Tokenizer> = LocalPool::new("tokenizer", &TOKENIZERS);
static TOKENS_BUF_POOL: LocalPool<TokensBuf> = LocalPool::new("tokens_buf", &TOKENS_BUFS);

fn get_tokenizer() -> Pooled<Tokenizer> {
    TOKENIZER_POOL.get()
}

/// Take an empty token buffer from the current thread's pool
pub fn get_tokens_buf() -> Pooled<TokensBuf> {
    TOKENS_BUF_POOL.get()
}
