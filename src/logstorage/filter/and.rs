//! AND combinator

use std::fmt;

use super::{BlockFilter, Filter};
use crate::logstorage::bitmap::Bitmap;
use crate::logstorage::block::{BlockResult, BlockSearch};
use crate::logstorage::fields_set::FieldsSet;

/// Matches rows matched by every child
///
/// Children narrow the same bitmap in turn; evaluation stops as soon as no
/// candidate is left.
#[derive(Debug, Clone)]
pub struct AndFilter {
    filters: Vec<Filter>,
}

impl AndFilter {
    /// Create an AND of `filters`
    pub fn new(filters: Vec<Filter>) -> Self {
        Self { filters }
    }

    /// Child filters
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }
}

impl fmt::Display for AndFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match filter {
                Filter::Noop(_) => f.write_str("*")?,
                Filter::Or(_) => write!(f, "({filter})")?,
                _ => write!(f, "{filter}")?,
            }
        }
        Ok(())
    }
}

impl BlockFilter for AndFilter {
    fn update_needed_fields(&self, fields: &mut FieldsSet) {
        for filter in &self.filters {
            filter.update_needed_fields(fields);
        }
    }

    fn apply(&self, bs: &dyn BlockSearch, bm: &mut Bitmap) {
        for filter in &self.filters {
            filter.apply(bs, bm);
            if bm.is_zero() {
                return;
            }
        }
    }

    fn apply_to_block_result(&self, br: &dyn BlockResult, bm: &mut Bitmap) {
        for filter in &self.filters {
            filter.apply_to_block_result(br, bm);
            if bm.is_zero() {
                return;
            }
        }
    }
}
