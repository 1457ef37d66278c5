//! Numeric range filter: `field:range[min, max]`

use std::fmt;

use super::{apply_by_header, apply_to_values, field_name, field_prefix, BlockFilter};
use crate::logstorage::bitmap::Bitmap;
use crate::logstorage::block::{parse_number, BlockResult, BlockSearch};
use crate::logstorage::fields_set::FieldsSet;

/// Matches rows whose field parses as a number within `[min, max]`
///
/// Values that do not parse as numbers never match.
#[derive(Debug, Clone)]
pub struct RangeFilter {
    field: String,
    min: f64,
    max: f64,
}

impl RangeFilter {
    /// Create an inclusive numeric range filter
    pub fn new(field: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            field: field_name(field),
            min,
            max,
        }
    }

    /// Field name
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Inclusive bounds
    pub fn bounds(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    fn matches(&self, v: &str) -> bool {
        parse_number(v).is_some_and(|n| n >= self.min && n <= self.max)
    }
}

impl fmt::Display for RangeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}range[{}, {}]",
            field_prefix(&self.field),
            self.min,
            self.max
        )
    }
}

impl BlockFilter for RangeFilter {
    fn update_needed_fields(&self, fields: &mut FieldsSet) {
        fields.add(&self.field);
    }

    fn apply(&self, bs: &dyn BlockSearch, bm: &mut Bitmap) {
        if self.min > self.max {
            bm.reset_bits();
            return;
        }
        apply_by_header(bs, bm, &self.field, None, |v| self.matches(v));

        if let Some((block_min, block_max)) = bs.numeric_range(&self.field) {
            if block_max < self.min || block_min > self.max {
                bm.reset_bits();
            }
        }
    }

    fn apply_to_block_result(&self, br: &dyn BlockResult, bm: &mut Bitmap) {
        apply_to_values(br, bm, &self.field, |v| self.matches(v));
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::*;
    use super::super::Filter;

    #[test]
    fn test_range_rows() {
        let block = column_block("code", &["200", "404", "500", "503", "oops", ""]);
        let filter = Filter::range("code", 500.0, 599.0);
        assert_eq!(matching_rows(&filter, &block), vec![2, 3]);
    }

    #[test]
    fn test_range_inclusive_and_float() {
        let block = column_block("latency", &["0.5", "1", "1.5", "2.25"]);
        assert_eq!(matching_rows(&Filter::range("latency", 1.0, 1.5), &block), vec![1, 2]);
        assert_eq!(
            matching_rows(&Filter::range("latency", f64::NEG_INFINITY, 0.5), &block),
            vec![0]
        );
    }

    #[test]
    fn test_range_coarse_uses_min_max() {
        let block = column_block("code", &["200", "201", "204"]);
        assert!(coarse_rows(&Filter::range("code", 500.0, 599.0), &block).is_empty());
        assert_eq!(coarse_rows(&Filter::range("code", 201.0, 202.0), &block), vec![0, 1, 2]);
    }

    #[test]
    fn test_range_empty_bounds() {
        let block = column_block("code", &["1", "2"]);
        assert!(matching_rows(&Filter::range("code", 5.0, 1.0), &block).is_empty());
    }

    #[test]
    fn test_range_missing_field() {
        let block = column_block("_msg", &["1"]);
        assert!(matching_rows(&Filter::range("code", 0.0, 10.0), &block).is_empty());
    }

    #[test]
    fn test_range_display() {
        assert_eq!(Filter::range("code", 500.0, 599.0).to_string(), "code:range[500, 599]");
        assert_eq!(Filter::range("x", 0.5, f64::INFINITY).to_string(), "x:range[0.5, inf]");
    }
}
