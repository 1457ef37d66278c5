//! Phrase filter: `field:"some phrase"`

use std::fmt;

use super::{
    apply_by_header, apply_to_values, field_name, field_prefix, next_char_boundary,
    quote_token_if_needed, token_char_at, token_char_before, tokens_of, BlockFilter,
};
use crate::logstorage::bitmap::Bitmap;
use crate::logstorage::block::{BlockResult, BlockSearch};
use crate::logstorage::fields_set::FieldsSet;
use crate::logstorage::tokenizer::is_token_char;

/// Matches rows whose field contains the phrase at word boundaries
///
/// `error` matches `an error occurred` but not `errors`. An empty phrase
/// matches only empty (or missing) values.
#[derive(Debug, Clone)]
pub struct PhraseFilter {
    field: String,
    phrase: String,
    /// Tokens of the phrase, probed against the column's token index
    tokens: Vec<String>,
}

impl PhraseFilter {
    /// Create a phrase filter
    pub fn new(field: impl Into<String>, phrase: impl Into<String>) -> Self {
        let phrase = phrase.into();
        let tokens = tokens_of(&phrase);
        Self {
            field: field_name(field),
            phrase,
            tokens,
        }
    }

    /// Field name
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Phrase to search for
    pub fn phrase(&self) -> &str {
        &self.phrase
    }
}

/// Check if `s` contains `phrase` at word boundaries
pub fn match_phrase(s: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return s.is_empty();
    }

    let starts_with_token = phrase.chars().next().is_some_and(is_token_char);
    let ends_with_token = phrase.chars().next_back().is_some_and(is_token_char);

    let mut offset = 0;
    while let Some(n) = s[offset..].find(phrase) {
        let start = offset + n;
        let end = start + phrase.len();
        if (starts_with_token && token_char_before(s, start))
            || (ends_with_token && token_char_at(s, end))
        {
            offset = next_char_boundary(s, start);
            continue;
        }
        return true;
    }
    false
}

impl fmt::Display for PhraseFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            field_prefix(&self.field),
            quote_token_if_needed(&self.phrase)
        )
    }
}

impl BlockFilter for PhraseFilter {
    fn update_needed_fields(&self, fields: &mut FieldsSet) {
        fields.add(&self.field);
    }

    fn apply(&self, bs: &dyn BlockSearch, bm: &mut Bitmap) {
        apply_by_header(bs, bm, &self.field, Some(&self.tokens), |v| {
            match_phrase(v, &self.phrase)
        });
    }

    fn apply_to_block_result(&self, br: &dyn BlockResult, bm: &mut Bitmap) {
        apply_to_values(br, bm, &self.field, |v| match_phrase(v, &self.phrase));
    }
}
