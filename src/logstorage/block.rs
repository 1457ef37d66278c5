//! Block contracts consumed by filters
//!
//! Filters never see the storage format. They consume two views of a block:
//!
//! - [`BlockSearch`]: the indexed view (column presence, const columns,
//!   token membership, numeric min/max). Cheap to consult, never decodes
//!   values. Used by the coarse phase.
//! - [`BlockResult`]: decoded column values for the fields a filter tree
//!   declared as needed. Used by the fine phase.
//!
//! [`Block`] is the in-memory implementation of both views: rows are stored
//! column-wise and every column gets a header (const value, token bloom
//! filter, numeric range) when the block is built.

use std::collections::HashMap;

use super::bloom::{TokenBloom, DEFAULT_FP_RATE};
use super::fields_set::FieldsSet;
use super::tokenizer::{get_tokens_buf, tokenize_strings};

// ============================================================================
// Contracts
// ============================================================================

/// Indexed view of a block used by the coarse phase
///
/// Every answer must be sound: it may fail to rule rows out, but it must
/// never rule out a row that could match.
pub trait BlockSearch {
    /// Number of rows in the block
    fn rows_count(&self) -> usize;

    /// Check whether any row has a value for `field`
    ///
    /// A missing field reads as the empty string in every row.
    fn has_column(&self, field: &str) -> bool;

    /// Value shared by every row, if the column is constant
    fn const_value(&self, field: &str) -> Option<&str>;

    /// Check whether the column may contain every token in `tokens`
    ///
    /// Returns false only if some token is definitely absent from every
    /// value of the column. Implementations without a token index return true.
    fn may_contain_tokens(&self, field: &str, tokens: &[String]) -> bool;

    /// Min and max over the values of `field` that parse as numbers
    ///
    /// None means no statistics are available.
    fn numeric_range(&self, field: &str) -> Option<(f64, f64)>;
}

/// Decoded view of a block used by the fine phase
pub trait BlockResult {
    /// Number of rows in the block
    fn rows_count(&self) -> usize;

    /// Decoded values of `field`, one per row, if the field was decoded
    fn column_values(&self, field: &str) -> Option<&[String]>;

    /// Value of `field` in row `row`; empty when missing
    fn value(&self, field: &str, row: usize) -> &str {
        self.column_values(field)
            .and_then(|values| values.get(row))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// A block that can be searched and then decoded for the fields it needs
pub trait BlockReader: BlockSearch {
    /// Decoded representation borrowed from the block
    type Decoded<'a>: BlockResult
    where
        Self: 'a;

    /// Decode only the fields in `needed`
    fn decode(&self, needed: &FieldsSet) -> Self::Decoded<'_>;
}

/// Parse a field value as a number
///
/// NaN never takes part in numeric comparisons, so it is rejected.
pub fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| !v.is_nan())
}

// ============================================================================
// In-memory block
// ============================================================================

/// Index settings applied when a block is built
#[derive(Debug, Clone, Copy)]
pub struct IndexOptions {
    /// Target false positive rate for per-column token bloom filters
    pub bloom_fp_rate: f64,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            bloom_fp_rate: DEFAULT_FP_RATE,
        }
    }
}

/// A named column of string values
#[derive(Debug, Clone)]
pub struct Column {
    /// Field name
    pub name: String,
    /// One value per row
    pub values: Vec<String>,
}

/// Header computed for a column when the block is built
#[derive(Debug, Clone)]
struct ColumnHeader {
    const_value: Option<String>,
    bloom: Option<TokenBloom>,
    numeric_range: Option<(f64, f64)>,
}

impl ColumnHeader {
    fn build(values: &[String], options: &IndexOptions) -> Self {
        let first = values.first();
        if let Some(first) = first {
            if values.iter().all(|v| v == first) {
                return Self {
                    const_value: Some(first.clone()),
                    bloom: None,
                    numeric_range: parse_number(first).map(|n| (n, n)),
                };
            }
        }

        let mut buf = get_tokens_buf();
        tokenize_strings(&mut buf.tokens, values);
        let bloom = TokenBloom::build(&buf.tokens, options.bloom_fp_rate);

        let numeric_range = values.iter().filter_map(|v| parse_number(v)).fold(
            None,
            |acc: Option<(f64, f64)>, n| match acc {
                None => Some((n, n)),
                Some((min, max)) => Some((min.min(n), max.max(n))),
            },
        );

        Self {
            const_value: None,
            bloom: Some(bloom),
            numeric_range,
        }
    }
}

/// In-memory columnar block of log rows
#[derive(Debug, Clone, Default)]
pub struct Block {
    rows_count: usize,
    columns: Vec<Column>,
    headers: Vec<ColumnHeader>,
    by_name: HashMap<String, usize>,
}

impl Block {
    /// Build a block from rows of `(field, value)` pairs
    ///
    /// Fields absent from a row get an empty value. If a row repeats a
    /// field, the last value wins.
    pub fn from_rows<I, R, K, V>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self::from_rows_with_options(rows, &IndexOptions::default())
    }

    /// Build a block from rows with explicit index settings
    pub fn from_rows_with_options<I, R, K, V>(rows: I, options: &IndexOptions) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut columns: Vec<Column> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();
        let mut rows_count = 0;

        for row in rows {
            for (name, value) in row {
                let name = name.as_ref();
                let idx = match by_name.get(name) {
                    Some(&idx) => idx,
                    None => {
                        columns.push(Column {
                            name: name.to_string(),
                            values: Vec::new(),
                        });
                        by_name.insert(name.to_string(), columns.len() - 1);
                        columns.len() - 1
                    },
                };

                let values = &mut columns[idx].values;
                values.resize(rows_count + 1, String::new());
                values[rows_count] = value.into();
            }
            rows_count += 1;
        }

        for column in &mut columns {
            column.values.resize(rows_count, String::new());
        }

        let headers = columns
            .iter()
            .map(|c| ColumnHeader::build(&c.values, options))
            .collect();

        Self {
            rows_count,
            columns,
            headers,
            by_name,
        }
    }

    /// All columns of the block
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Get a column by field name
    pub fn column(&self, field: &str) -> Option<&Column> {
        self.by_name.get(field).map(|&idx| &self.columns[idx])
    }

    fn header(&self, field: &str) -> Option<&ColumnHeader> {
        self.by_name.get(field).map(|&idx| &self.headers[idx])
    }
}

impl BlockSearch for Block {
    fn rows_count(&self) -> usize {
        self.rows_count
    }

    fn has_column(&self, field: &str) -> bool {
        self.by_name.contains_key(field)
    }

    fn const_value(&self, field: &str) -> Option<&str> {
        self.header(field).and_then(|h| h.const_value.as_deref())
    }

    fn may_contain_tokens(&self, field: &str, tokens: &[String]) -> bool {
        let Some(header) = self.header(field) else {
            return tokens.is_empty();
        };
        match (&header.const_value, &header.bloom) {
            (_, Some(bloom)) => bloom.contains_all(tokens),
            (Some(value), None) => {
                let mut buf = get_tokens_buf();
                tokenize_strings(&mut buf.tokens, &[value.as_str()]);
                tokens.iter().all(|t| buf.tokens.binary_search(t).is_ok())
            },
            (None, None) => true,
        }
    }

    fn numeric_range(&self, field: &str) -> Option<(f64, f64)> {
        self.header(field).and_then(|h| h.numeric_range)
    }
}

impl BlockReader for Block {
    type Decoded<'a> = DecodedBlock<'a>;

    fn decode(&self, needed: &FieldsSet) -> DecodedBlock<'_> {
        let columns = self
            .columns
            .iter()
            .filter(|c| needed.contains(&c.name))
            .map(|c| (c.name.as_str(), c.values.as_slice()))
            .collect();

        DecodedBlock {
            rows_count: self.rows_count,
            columns,
        }
    }
}

/// Decoded subset of a [`Block`]'s columns
#[derive(Debug, Clone)]
pub struct DecodedBlock<'a> {
    rows_count: usize,
    columns: Vec<(&'a str, &'a [String])>,
}

impl DecodedBlock<'_> {
    /// Names of the decoded fields
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| *name)
    }
}

impl BlockResult for DecodedBlock<'_> {
    fn rows_count(&self) -> usize {
        self.rows_count
    }

    fn column_values(&self, field: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, values)| *values)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> Block {
        Block::from_rows(vec![
            vec![("_msg", "connection refused"), ("host", "web-1"), ("code", "500")],
            vec![("_msg", "request served"), ("host", "web-1"), ("code", "200")],
            vec![("_msg", "request served"), ("host", "web-1")],
        ])
    }

    #[test]
    fn test_missing_values_are_empty() {
        let block = sample_block();
        assert_eq!(block.rows_count(), 3);
        assert_eq!(block.column("code").unwrap().values, vec!["500", "200", ""]);
    }

    #[test]
    fn test_const_column_detection() {
        let block = sample_block();
        assert_eq!(block.const_value("host"), Some("web-1"));
        assert_eq!(block.const_value("_msg"), None);
        assert_eq!(block.const_value("absent"), None);
        assert!(block.has_column("host"));
        assert!(!block.has_column("absent"));
    }

    #[test]
    fn test_token_membership() {
        let block = sample_block();
        let tokens = |ts: &[&str]| ts.iter().map(|t| t.to_string()).collect::<Vec<_>>();

        assert!(block.may_contain_tokens("_msg", &tokens(&["connection", "refused"])));
        assert!(block.may_contain_tokens("host", &tokens(&["web", "1"])));
        assert!(!block.may_contain_tokens("host", &tokens(&["web", "2"])));
        assert!(!block.may_contain_tokens("absent", &tokens(&["x"])));
        assert!(block.may_contain_tokens("absent", &[]));
    }

    #[test]
    fn test_numeric_range_ignores_non_numbers() {
        let block = sample_block();
        assert_eq!(block.numeric_range("code"), Some((200.0, 500.0)));
        assert_eq!(block.numeric_range("_msg"), None);
    }

    #[test]
    fn test_decode_only_needed_fields() {
        let block = sample_block();
        let needed: FieldsSet = ["code"].into_iter().collect();
        let decoded = block.decode(&needed);

        assert_eq!(decoded.field_names().collect::<Vec<_>>(), vec!["code"]);
        assert_eq!(decoded.value("code", 1), "200");
        assert_eq!(decoded.value("code", 2), "");
        assert!(decoded.column_values("_msg").is_none());
        assert_eq!(decoded.value("_msg", 0), "");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("1.5"), Some(1.5));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
    }
}
