//! Exact value filter: `field:exact("value")`

use std::fmt;

use super::{
    apply_by_header, apply_to_values, field_name, field_prefix, quote_token_if_needed,
    tokens_of, BlockFilter,
};
use crate::logstorage::bitmap::Bitmap;
use crate::logstorage::block::{BlockResult, BlockSearch};
use crate::logstorage::fields_set::FieldsSet;

/// Matches rows whose field value equals the given value
#[derive(Debug, Clone)]
pub struct ExactFilter {
    field: String,
    value: String,
    tokens: Vec<String>,
}

impl ExactFilter {
    /// Create an exact value filter
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        let tokens = tokens_of(&value);
        Self {
            field: field_name(field),
            value,
            tokens,
        }
    }

    /// Field name
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Value to compare against
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for ExactFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}exact({})",
            field_prefix(&self.field),
            quote_token_if_needed(&self.value)
        )
    }
}

impl BlockFilter for ExactFilter {
    fn update_needed_fields(&self, fields: &mut FieldsSet) {
        fields.add(&self.field);
    }

    fn apply(&self, bs: &dyn BlockSearch, bm: &mut Bitmap) {
        apply_by_header(bs, bm, &self.field, Some(&self.tokens), |v| v == self.value);
    }

    fn apply_to_block_result(&self, br: &dyn BlockResult, bm: &mut Bitmap) {
        apply_to_values(br, bm, &self.field, |v| v == self.value);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::*;
    use super::super::Filter;

    #[test]
    fn test_exact_rows() {
        let block = column_block("level", &["error", "error ", "warn", "error"]);
        assert_eq!(matching_rows(&Filter::exact("level", "error"), &block), vec![0, 3]);
        assert!(matching_rows(&Filter::exact("level", "err"), &block).is_empty());
    }

    #[test]
    fn test_exact_empty_value_matches_missing() {
        let block = column_block("_msg", &["a", "b"]);
        assert_eq!(matching_rows(&Filter::exact("level", ""), &block), vec![0, 1]);
        assert!(matching_rows(&Filter::exact("level", "x"), &block).is_empty());
    }

    #[test]
    fn test_exact_coarse_prunes_by_tokens() {
        let block = column_block("level", &["info", "warn"]);
        assert!(coarse_rows(&Filter::exact("level", "error"), &block).is_empty());
        assert_eq!(coarse_rows(&Filter::exact("level", "info"), &block), vec![0, 1]);
    }

    #[test]
    fn test_exact_display() {
        assert_eq!(Filter::exact("level", "error").to_string(), "level:exact(error)");
        assert_eq!(Filter::exact("_msg", "a b").to_string(), "exact(\"a b\")");
    }
}
