//! NOT combinator

use std::fmt;

use super::{BlockFilter, Filter};
use crate::logstorage::bitmap::{get_bitmap_copy, Bitmap};
use crate::logstorage::block::{BlockResult, BlockSearch};
use crate::logstorage::fields_set::FieldsSet;

/// Matches rows the child does not match
#[derive(Debug, Clone)]
pub struct NotFilter {
    filter: Box<Filter>,
}

impl NotFilter {
    /// Create a negation of `filter`
    pub fn new(filter: Filter) -> Self {
        Self {
            filter: Box::new(filter),
        }
    }

    /// Negated filter
    pub fn inner(&self) -> &Filter {
        &self.filter
    }
}

impl fmt::Display for NotFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.filter.as_ref() {
            Filter::Noop(_) => f.write_str("!*"),
            Filter::And(_) | Filter::Or(_) => write!(f, "!({})", self.filter),
            _ => write!(f, "!{}", self.filter),
        }
    }
}

impl BlockFilter for NotFilter {
    fn update_needed_fields(&self, fields: &mut FieldsSet) {
        self.filter.update_needed_fields(fields);
    }

    fn apply(&self, _bs: &dyn BlockSearch, _bm: &mut Bitmap) {
        // The child's coarse result over-approximates its matches, so its
        // complement under-approximates ours: nothing can be cleared here.
    }

    fn apply_to_block_result(&self, br: &dyn BlockResult, bm: &mut Bitmap) {
        let mut matched = get_bitmap_copy(bm);
        self.filter.apply_to_block_result(br, &mut matched);
        bm.and_not(&matched);
    }
}
