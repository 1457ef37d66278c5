//! Filter that matches every row

use std::fmt;

use super::BlockFilter;
use crate::logstorage::bitmap::Bitmap;
use crate::logstorage::block::{BlockResult, BlockSearch};
use crate::logstorage::fields_set::FieldsSet;

/// Matches every row without decoding anything
///
/// Identity element of AND composition and the filter of a query without a
/// predicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoopFilter;

impl fmt::Display for NoopFilter {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ok(())
    }
}

impl BlockFilter for NoopFilter {
    fn update_needed_fields(&self, _fields: &mut FieldsSet) {}

    fn apply(&self, _bs: &dyn BlockSearch, _bm: &mut Bitmap) {}

    fn apply_to_block_result(&self, _br: &dyn BlockResult, _bm: &mut Bitmap) {}
}

#[cfg(test)]
mod tests {
    use super::super::test_util::*;
    use super::super::Filter;
    use super::*;

    #[test]
    fn test_noop_matches_everything() {
        let block = column_block("_msg", &["a", "", "b c"]);
        let filter = Filter::noop();

        assert_eq!(matching_rows(&filter, &block), vec![0, 1, 2]);
        assert_eq!(filter.to_string(), "");
    }

    #[test]
    fn test_noop_renders_as_star_inside_combinators() {
        let a = Filter::exact("level", "error");
        assert_eq!(Filter::and([Filter::noop(), a.clone()]).to_string(), "* level:error");
        assert_eq!(Filter::or([a, Filter::noop()]).to_string(), "level:error or *");
        assert_eq!(Filter::negate(Filter::noop()).to_string(), "!*");
    }

    #[test]
    fn test_noop_needs_no_fields() {
        let mut fields = FieldsSet::new();
        NoopFilter.update_needed_fields(&mut fields);
        assert!(fields.is_empty());
    }

    #[test]
    fn test_noop_keeps_partial_bitmap() {
        let block = column_block("_msg", &["a", "b", "c", "d"]);
        let mut bm = Bitmap::new(4);
        bm.clear_bit(1);
        let before = bm.clone();

        NoopFilter.apply(&block, &mut bm);
        assert_eq!(bm, before);
    }
}
