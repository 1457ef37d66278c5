//! OR combinator

use std::fmt;

use super::{BlockFilter, Filter};
use crate::logstorage::bitmap::{get_bitmap, Bitmap};
use crate::logstorage::block::{BlockResult, BlockSearch};
use crate::logstorage::fields_set::FieldsSet;

/// Matches rows matched by any child
///
/// Each child runs on a scratch copy of the incoming candidates, restricted
/// to rows no earlier child has matched yet, and the results are OR-ed.
/// An OR without children matches nothing.
#[derive(Debug, Clone)]
pub struct OrFilter {
    filters: Vec<Filter>,
}

impl OrFilter {
    /// Create an OR of `filters`
    pub fn new(filters: Vec<Filter>) -> Self {
        Self { filters }
    }

    /// Child filters
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    fn apply_with<F>(&self, bm: &mut Bitmap, mut apply_child: F)
    where
        F: FnMut(&Filter, &mut Bitmap),
    {
        let mut result = get_bitmap(bm.bits_len());
        result.reset_bits();
        let mut tmp = get_bitmap(bm.bits_len());

        for filter in &self.filters {
            // Only rows the caller wants and no previous child matched
            tmp.copy_from(bm);
            tmp.and_not(&result);
            if tmp.is_zero() {
                break;
            }
            apply_child(filter, &mut tmp);
            result.or(&tmp);
        }

        bm.copy_from(&result);
    }
}

impl fmt::Display for OrFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                f.write_str(" or ")?;
            }
            match filter {
                Filter::Noop(_) => f.write_str("*")?,
                _ => write!(f, "{filter}")?,
            }
        }
        Ok(())
    }
}

impl BlockFilter for OrFilter {
    fn update_needed_fields(&self, fields: &mut FieldsSet) {
        for filter in &self.filters {
            filter.update_needed_fields(fields);
        }
    }

    fn apply(&self, bs: &dyn BlockSearch, bm: &mut Bitmap) {
        self.apply_with(bm, |filter, tmp| filter.apply(bs, tmp));
    }

    fn apply_to_block_result(&self, br: &dyn BlockResult, bm: &mut Bitmap) {
        self.apply_with(bm, |filter, tmp| filter.apply_to_block_result(br, tmp));
    }
}
