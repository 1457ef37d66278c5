//! Block Filters
//!
//! A query compiles into a tree of [`Filter`] values. Every filter kind
//! implements the same [`BlockFilter`] contract and is applied to a block in
//! two phases:
//!
//! 1. **Coarse** ([`BlockFilter::apply`]): consult the block's index
//!    (const columns, token bloom filters, numeric min/max) and clear bits
//!    for rows that provably cannot match. Never decodes values and never
//!    clears a row that might match.
//! 2. **Fine** ([`BlockFilter::apply_to_block_result`]): check each
//!    remaining row against decoded values. Exact: afterwards a bit is set
//!    if and only if the row matches.
//!
//! Before either phase the evaluator asks the tree which fields it needs
//! ([`BlockFilter::update_needed_fields`]) so only those columns are decoded.
//!
//! Filters are immutable after construction and are shared read-only by
//! every worker thread.
//!
//! # Example
//!
//! ```rust
//! use kuba_logstore::logstorage::{Filter, FieldsSet, BlockFilter};
//!
//! let filter = Filter::and([
//!     Filter::phrase("_msg", "connection refused"),
//!     Filter::negate(Filter::exact("level", "debug")),
//! ]);
//! assert_eq!(filter.to_string(), r#""connection refused" !level:exact(debug)"#);
//!
//! let mut needed = FieldsSet::new();
//! filter.update_needed_fields(&mut needed);
//! assert_eq!(needed.sorted(), vec!["_msg", "level"]);
//! ```

mod and;
mod exact;
mod in_values;
mod noop;
mod not;
mod or;
mod phrase;
mod prefix;
mod range;
mod regexp;

use std::fmt;

pub use and::AndFilter;
pub use exact::ExactFilter;
pub use in_values::InFilter;
pub use noop::NoopFilter;
pub use not::NotFilter;
pub use or::OrFilter;
pub use phrase::{match_phrase, PhraseFilter};
pub use prefix::{match_prefix, PrefixFilter};
pub use range::RangeFilter;
pub use regexp::RegexpFilter;

use super::bitmap::Bitmap;
use super::block::{BlockResult, BlockSearch};
use super::fields_set::FieldsSet;
use super::tokenizer::is_token_char;
use crate::error::FilterError;

/// Field holding the log message; rendered without a `field:` prefix
pub const MSG_FIELD: &str = "_msg";

// ============================================================================
// Contract
// ============================================================================

/// Shared contract of every filter kind
///
/// The `Display` rendering is the filter's description: deterministic and
/// stable for equal configurations, used in explain output and as a plan
/// cache key.
pub trait BlockFilter: fmt::Display + Send + Sync {
    /// Add the fields this filter needs decoded to `fields`
    fn update_needed_fields(&self, fields: &mut FieldsSet);

    /// Coarse phase: clear bits for rows that provably do not match
    fn apply(&self, bs: &dyn BlockSearch, bm: &mut Bitmap);

    /// Fine phase: clear bits for rows whose decoded values do not match
    fn apply_to_block_result(&self, br: &dyn BlockResult, bm: &mut Bitmap);
}

// ============================================================================
// Filter tree
// ============================================================================

/// Any filter kind, including combinators
#[derive(Debug, Clone)]
pub enum Filter {
    /// Match every row
    Noop(NoopFilter),

    /// Phrase at word boundaries
    Phrase(PhraseFilter),

    /// Word prefix
    Prefix(PrefixFilter),

    /// Whole-value equality
    Exact(ExactFilter),

    /// Whole-value membership in a list
    In(InFilter),

    /// Numeric range
    Range(RangeFilter),

    /// Regular expression
    Regexp(RegexpFilter),

    /// All children match
    And(AndFilter),

    /// Any child matches
    Or(OrFilter),

    /// Child does not match
    Not(NotFilter),
}

impl Filter {
    /// Create a filter matching every row
    #[must_use]
    pub fn noop() -> Self {
        Filter::Noop(NoopFilter)
    }

    /// Create a phrase filter
    #[must_use]
    pub fn phrase(field: impl Into<String>, phrase: impl Into<String>) -> Self {
        Filter::Phrase(PhraseFilter::new(field, phrase))
    }

    /// Create a word prefix filter
    #[must_use]
    pub fn prefix(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Filter::Prefix(PrefixFilter::new(field, prefix))
    }

    /// Create an exact value filter
    #[must_use]
    pub fn exact(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Exact(ExactFilter::new(field, value))
    }

    /// Create a value list filter
    #[must_use]
    pub fn in_values<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::In(InFilter::new(field, values))
    }

    /// Create an inclusive numeric range filter
    #[must_use]
    pub fn range(field: impl Into<String>, min: f64, max: f64) -> Self {
        Filter::Range(RangeFilter::new(field, min, max))
    }

    /// Create a regexp filter
    pub fn regexp(field: impl Into<String>, expr: &str) -> Result<Self, FilterError> {
        Ok(Filter::Regexp(RegexpFilter::new(field, expr)?))
    }

    /// Create an AND filter from an iterator
    ///
    /// Returns `Filter::Noop` if filters is empty (neutral element for AND)
    /// and the filter itself for a single element.
    #[must_use]
    pub fn and<I: IntoIterator<Item = Filter>>(filters: I) -> Self {
        let mut filters: Vec<Filter> = filters.into_iter().collect();
        match filters.len() {
            0 => Filter::noop(),
            1 => filters.swap_remove(0),
            _ => Filter::And(AndFilter::new(filters)),
        }
    }

    /// Create an OR filter from an iterator
    ///
    /// An empty OR matches nothing; a single element is returned as is.
    #[must_use]
    pub fn or<I: IntoIterator<Item = Filter>>(filters: I) -> Self {
        let mut filters: Vec<Filter> = filters.into_iter().collect();
        match filters.len() {
            1 => filters.swap_remove(0),
            _ => Filter::Or(OrFilter::new(filters)),
        }
    }

    /// Create a NOT filter (negation)
    #[must_use]
    pub fn negate(filter: Filter) -> Self {
        Filter::Not(NotFilter::new(filter))
    }

    /// Check if this is the match-everything filter
    pub fn is_noop(&self) -> bool {
        matches!(self, Filter::Noop(_))
    }

    fn inner(&self) -> &dyn BlockFilter {
        match self {
            Filter::Noop(f) => f,
            Filter::Phrase(f) => f,
            Filter::Prefix(f) => f,
            Filter::Exact(f) => f,
            Filter::In(f) => f,
            Filter::Range(f) => f,
            Filter::Regexp(f) => f,
            Filter::And(f) => f,
            Filter::Or(f) => f,
            Filter::Not(f) => f,
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Filter::noop()
    }
}

impl BlockFilter for Filter {
    fn update_needed_fields(&self, fields: &mut FieldsSet) {
        self.inner().update_needed_fields(fields)
    }

    fn apply(&self, bs: &dyn BlockSearch, bm: &mut Bitmap) {
        self.inner().apply(bs, bm)
    }

    fn apply_to_block_result(&self, br: &dyn BlockResult, bm: &mut Bitmap) {
        self.inner().apply_to_block_result(br, bm)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.inner(), f)
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Coarse check for single-field filters whose match rule is a pure
/// function of the value
///
/// Missing and const columns are decided exactly for the whole block.
/// Otherwise the token index is consulted: if the column cannot contain
/// every required token, no row matches. Returns without clearing when
/// nothing can be proven.
pub(crate) fn apply_by_header<F>(
    bs: &dyn BlockSearch,
    bm: &mut Bitmap,
    field: &str,
    tokens: Option<&[String]>,
    matches: F,
) where
    F: Fn(&str) -> bool,
{
    if !bs.has_column(field) {
        if !matches("") {
            bm.reset_bits();
        }
        return;
    }
    if let Some(value) = bs.const_value(field) {
        if !matches(value) {
            bm.reset_bits();
        }
        return;
    }
    if let Some(tokens) = tokens {
        if !bs.may_contain_tokens(field, tokens) {
            bm.reset_bits();
        }
    }
}

/// Fine check: keep only rows whose decoded `field` value satisfies `matches`
pub(crate) fn apply_to_values<F>(br: &dyn BlockResult, bm: &mut Bitmap, field: &str, matches: F)
where
    F: Fn(&str) -> bool,
{
    match br.column_values(field) {
        Some(values) => bm.for_each_set_bit(|idx| {
            matches(values.get(idx).map(String::as_str).unwrap_or(""))
        }),
        None => {
            if !matches("") {
                bm.reset_bits();
            }
        },
    }
}

/// Tokens of `s`, sorted
pub(crate) fn tokens_of(s: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    super::tokenizer::tokenize_strings(&mut tokens, &[s]);
    tokens
}

/// Render a value bare if it is a single token, quoted otherwise
pub(crate) fn quote_token_if_needed(s: &str) -> String {
    if !s.is_empty() && s.chars().all(is_token_char) {
        s.to_string()
    } else {
        quote(s)
    }
}

/// Double-quoted rendering with `"` and `\` escaped
pub(crate) fn quote(s: &str) -> String {
    format!("{s:?}")
}

/// Column name for a filter field; the empty name means the message field
pub(crate) fn field_name(field: impl Into<String>) -> String {
    let field = field.into();
    if field.is_empty() {
        MSG_FIELD.to_string()
    } else {
        field
    }
}

/// `field:` prefix, omitted for the message field
pub(crate) fn field_prefix(field: &str) -> String {
    if field == MSG_FIELD {
        String::new()
    } else {
        format!("{}:", quote_token_if_needed(field))
    }
}

/// Check if the character before byte offset `pos` is a token character
pub(crate) fn token_char_before(s: &str, pos: usize) -> bool {
    s[..pos].chars().next_back().is_some_and(is_token_char)
}

/// Check if the character at byte offset `pos` is a token character
pub(crate) fn token_char_at(s: &str, pos: usize) -> bool {
    s[pos..].chars().next().is_some_and(is_token_char)
}

/// Byte offset just past the character starting at `pos`
pub(crate) fn next_char_boundary(s: &str, pos: usize) -> usize {
    pos + s[pos..].chars().next().map_or(1, char::len_utf8)
}
