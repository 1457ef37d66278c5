//! Value list filter: `field:in("a","b")`

use std::collections::HashSet;
use std::fmt;

use super::{
    apply_by_header, apply_to_values, field_name, field_prefix, quote_token_if_needed,
    tokens_of, BlockFilter,
};
use crate::logstorage::bitmap::Bitmap;
use crate::logstorage::block::{BlockResult, BlockSearch};
use crate::logstorage::fields_set::FieldsSet;

/// Matches rows whose field value equals one of the listed values
///
/// An empty list matches nothing.
#[derive(Debug, Clone)]
pub struct InFilter {
    field: String,
    /// Values in the order given, for rendering
    values: Vec<String>,
    lookup: HashSet<String>,
    /// Tokens of each listed value
    tokens: Vec<Vec<String>>,
}

impl InFilter {
    /// Create a value list filter
    pub fn new<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        let lookup = values.iter().cloned().collect();
        let tokens = values.iter().map(|v| tokens_of(v)).collect();
        Self {
            field: field_name(field),
            values,
            lookup,
            tokens,
        }
    }

    /// Field name
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Listed values
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl fmt::Display for InFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = self.values.iter().map(|v| quote_token_if_needed(v)).collect();
        write!(f, "{}in({})", field_prefix(&self.field), values.join(","))
    }
}

impl BlockFilter for InFilter {
    fn update_needed_fields(&self, fields: &mut FieldsSet) {
        fields.add(&self.field);
    }

    fn apply(&self, bs: &dyn BlockSearch, bm: &mut Bitmap) {
        apply_by_header(bs, bm, &self.field, None, |v| self.lookup.contains(v));
        if bm.is_zero() || !bs.has_column(&self.field) || bs.const_value(&self.field).is_some() {
            return;
        }

        // The block can only match if some value has all its tokens present
        let any_possible = self
            .tokens
            .iter()
            .any(|tokens| bs.may_contain_tokens(&self.field, tokens));
        if !any_possible {
            bm.reset_bits();
        }
    }

    fn apply_to_block_result(&self, br: &dyn BlockResult, bm: &mut Bitmap) {
        apply_to_values(br, bm, &self.field, |v| self.lookup.contains(v));
    }
}
