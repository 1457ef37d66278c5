//! Regexp filter: `field:re("expr")`

use std::fmt;

use regex::Regex;

use super::{apply_by_header, apply_to_values, field_name, field_prefix, quote, BlockFilter};
use crate::error::FilterError;
use crate::logstorage::bitmap::Bitmap;
use crate::logstorage::block::{BlockResult, BlockSearch};
use crate::logstorage::fields_set::FieldsSet;

/// Matches rows whose field value matches a regular expression
///
/// The expression is unanchored: `err` matches anywhere in the value.
#[derive(Debug, Clone)]
pub struct RegexpFilter {
    field: String,
    re: Regex,
}

impl RegexpFilter {
    /// Compile a regexp filter
    pub fn new(field: impl Into<String>, expr: &str) -> Result<Self, FilterError> {
        let re = Regex::new(expr).map_err(|e| FilterError::InvalidRegexp {
            expr: expr.to_string(),
            source: e,
        })?;
        Ok(Self {
            field: field_name(field),
            re,
        })
    }

    /// Field name
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Source expression
    pub fn expr(&self) -> &str {
        self.re.as_str()
    }
}

impl fmt::Display for RegexpFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}re({})", field_prefix(&self.field), quote(self.re.as_str()))
    }
}

impl BlockFilter for RegexpFilter {
    fn update_needed_fields(&self, fields: &mut FieldsSet) {
        fields.add(&self.field);
    }

    fn apply(&self, bs: &dyn BlockSearch, bm: &mut Bitmap) {
        // No token pruning: a regexp may match across token boundaries
        apply_by_header(bs, bm, &self.field, None, |v| self.re.is_match(v));
    }

    fn apply_to_block_result(&self, br: &dyn BlockResult, bm: &mut Bitmap) {
        apply_to_values(br, bm, &self.field, |v| self.re.is_match(v));
    }
}
