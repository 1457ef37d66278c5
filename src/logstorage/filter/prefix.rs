//! Word prefix filter: `field:prefix*`

use std::fmt;

use super::{
    apply_by_header, apply_to_values, field_name, field_prefix, next_char_boundary,
    quote_token_if_needed, token_char_before, tokens_of, BlockFilter,
};
use crate::logstorage::bitmap::Bitmap;
use crate::logstorage::block::{BlockResult, BlockSearch};
use crate::logstorage::fields_set::FieldsSet;
use crate::logstorage::tokenizer::is_token_char;

/// Matches rows where a word of the field starts with the prefix
///
/// `err*` matches `errors found` and `an error`, but not `suberror`. An
/// empty prefix matches every non-empty value.
#[derive(Debug, Clone)]
pub struct PrefixFilter {
    field: String,
    prefix: String,
    /// Complete tokens of the prefix; a trailing partial word is left out
    tokens: Vec<String>,
}

impl PrefixFilter {
    /// Create a word prefix filter
    pub fn new(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let tokens = complete_tokens(&prefix);
        Self {
            field: field_name(field),
            prefix,
            tokens,
        }
    }

    /// Field name
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Prefix to search for
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// Tokens of `prefix` that are guaranteed to be whole tokens of a match
fn complete_tokens(prefix: &str) -> Vec<String> {
    let Some(last) = prefix.chars().next_back() else {
        return Vec::new();
    };
    if !is_token_char(last) {
        return tokens_of(prefix);
    }

    let last_word_start = prefix
        .char_indices()
        .rev()
        .find(|(_, c)| !is_token_char(*c))
        .map_or(0, |(i, c)| i + c.len_utf8());
    tokens_of(&prefix[..last_word_start])
}

/// Check if `s` contains `prefix` starting at a word boundary
pub fn match_prefix(s: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return !s.is_empty();
    }

    let starts_with_token = prefix.chars().next().is_some_and(is_token_char);

    let mut offset = 0;
    while let Some(n) = s[offset..].find(prefix) {
        let start = offset + n;
        if !starts_with_token || !token_char_before(s, start) {
            return true;
        }
        offset = next_char_boundary(s, start);
    }
    false
}

impl fmt::Display for PrefixFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            return write!(f, "{}*", field_prefix(&self.field));
        }
        write!(
            f,
            "{}{}*",
            field_prefix(&self.field),
            quote_token_if_needed(&self.prefix)
        )
    }
}

impl BlockFilter for PrefixFilter {
    fn update_needed_fields(&self, fields: &mut FieldsSet) {
        fields.add(&self.field);
    }

    fn apply(&self, bs: &dyn BlockSearch, bm: &mut Bitmap) {
        apply_by_header(bs, bm, &self.field, Some(&self.tokens), |v| {
            match_prefix(v, &self.prefix)
        });
    }

    fn apply_to_block_result(&self, br: &dyn BlockResult, bm: &mut Bitmap) {
        apply_to_values(br, bm, &self.field, |v| match_prefix(v, &self.prefix));
    }
}
