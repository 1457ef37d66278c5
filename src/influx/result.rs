//! Query result shaping

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use tracing::debug;

use super::series::Series;
use super::value::QueryValue;
use crate::error::MigrationError;

/// Column holding the point timestamp
const TIME_COLUMN: &str = "time";

/// One statement result as returned by the query API
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryResult {
    /// Returned series
    #[serde(default)]
    pub series: Vec<ResultSeries>,

    /// Error reported for the statement
    #[serde(default)]
    pub error: Option<String>,
}

impl QueryResult {
    fn check_error(&self) -> Result<(), MigrationError> {
        match &self.error {
            Some(err) if !err.is_empty() => Err(MigrationError::Result(err.clone())),
            _ => Ok(()),
        }
    }
}

/// Rows of one returned series
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResultSeries {
    /// Measurement name
    #[serde(default)]
    pub name: String,

    /// Group-by tags
    #[serde(default)]
    pub tags: HashMap<String, String>,

    /// Column names
    #[serde(default)]
    pub columns: Vec<String>,

    /// Rows, one value per column
    #[serde(default)]
    pub values: Vec<Vec<QueryValue>>,
}

/// Values of one returned series grouped by column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryValues {
    /// Measurement name
    pub name: String,
    /// Column name to values, in row order
    pub values: HashMap<String, Vec<QueryValue>>,
}

impl QueryValues {
    /// Values of `column`, if any row was kept
    pub fn column(&self, column: &str) -> Option<&[QueryValue]> {
        self.values.get(column).map(Vec::as_slice)
    }

    /// Check if no row was kept
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values of `field` coerced to floats
    ///
    /// Fails on the first value that is not numeric.
    pub fn field_values(&self, field: &str) -> Result<Vec<f64>, MigrationError> {
        self.column(field)
            .unwrap_or_default()
            .iter()
            .map(QueryValue::to_f64)
            .collect()
    }

    fn push_row(&mut self, columns: &[String], row: &[QueryValue]) {
        for (column, value) in columns.iter().zip(row) {
            self.values
                .entry(column.clone())
                .or_default()
                .push(value.clone());
        }
    }
}

/// Group every returned series' rows by column
pub fn parse_result(result: &QueryResult) -> Result<Vec<QueryValues>, MigrationError> {
    result.check_error()?;

    Ok(result
        .series
        .iter()
        .map(|rs| {
            let mut qv = QueryValues {
                name: rs.name.clone(),
                values: HashMap::with_capacity(rs.columns.len()),
            };
            for row in &rs.values {
                qv.push_row(&rs.columns, row);
            }
            qv
        })
        .collect())
}

/// Group rows by column, keeping only rows that belong to `series`
///
/// A query for one series may also return rows of series with more tags.
/// Such rows have a non-null value in a column that is neither one of
/// `series`' tags, its field nor the time column, and are dropped.
///
/// Fails if a result has fewer columns than the series tags plus field and
/// time, or if a row's value count differs from the column count.
pub fn parse_result_check_tags(
    series: &Series,
    result: &QueryResult,
) -> Result<Vec<QueryValues>, MigrationError> {
    result.check_error()?;

    let tags: HashSet<&str> = series.label_pairs.iter().map(|p| p.name.as_str()).collect();
    let is_own_column =
        |column: &str| column == series.field || column == TIME_COLUMN || tags.contains(column);

    let mut parsed = Vec::with_capacity(result.series.len());
    for rs in &result.series {
        let expected = series.label_pairs.len() + 2;
        if rs.columns.len() < expected {
            return Err(MigrationError::ColumnsMismatch {
                expected,
                got: rs.columns.len(),
            });
        }

        let mut qv = QueryValues {
            name: rs.name.clone(),
            values: HashMap::with_capacity(rs.columns.len()),
        };
        let mut dropped = 0usize;

        for row in &rs.values {
            if row.len() != rs.columns.len() {
                return Err(MigrationError::ValuesMismatch {
                    expected: rs.columns.len(),
                    got: row.len(),
                });
            }

            let foreign = rs
                .columns
                .iter()
                .zip(row)
                .any(|(column, value)| !is_own_column(column) && !value.is_null());
            if foreign {
                dropped += 1;
                continue;
            }
            qv.push_row(&rs.columns, row);
        }

        if dropped > 0 {
            debug!(
                measurement = %series.measurement,
                field = %series.field,
                dropped,
                "Dropped rows of other series"
            );
        }
        parsed.push(qv);
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::influx::LabelPair;

    fn check_tags(
        wanted: &[&str],
        query_columns: &[&str],
        row: Vec<QueryValue>,
    ) -> Result<Vec<QueryValues>, MigrationError> {
        let series = Series {
            measurement: "measurement".to_string(),
            field: "value".to_string(),
            label_pairs: wanted.iter().map(|n| LabelPair::new(*n, "")).collect(),
        };

        let mut columns: Vec<String> = query_columns.iter().map(|c| c.to_string()).collect();
        columns.extend(["value".to_string(), "time".to_string()]);
        let mut row = row;
        row.extend([QueryValue::from("10"), QueryValue::from("1729829153000000000")]);

        let result = QueryResult {
            series: vec![ResultSeries {
                name: "test_table".to_string(),
                tags: HashMap::new(),
                columns,
                values: vec![row],
            }],
            error: None,
        };
        parse_result_check_tags(&series, &result)
    }

    fn strs(values: &[&str]) -> Vec<QueryValue> {
        values.iter().map(|v| QueryValue::from(*v)).collect()
    }

    #[test]
    fn test_only_series_columns_kept() {
        let parsed = check_tags(&["a", "b"], &["a", "b"], strs(&["1", "2"])).unwrap();
        assert!(!parsed[0].is_empty());
        assert_eq!(parsed[0].field_values("value").unwrap(), vec![10.0]);
    }

    #[test]
    fn test_other_columns_null_kept() {
        let row = vec!["1".into(), "2".into(), QueryValue::Null, QueryValue::Null];
        let parsed = check_tags(&["a", "b"], &["a", "b", "c", "d"], row).unwrap();
        assert!(!parsed[0].is_empty());
    }

    #[test]
    fn test_other_columns_set_dropped() {
        let parsed = check_tags(&["a", "b"], &["a", "b", "c", "d"], strs(&["1", "2", "3", "4"]))
            .unwrap();
        assert!(parsed[0].is_empty());
        assert!(parsed[0].field_values("value").unwrap().is_empty());
    }

    #[test]
    fn test_fewer_columns_than_tags() {
        let err = check_tags(&["a", "b", "c", "d"], &["a", "b"], strs(&["1", "2"])).unwrap_err();
        assert_eq!(err, MigrationError::ColumnsMismatch { expected: 6, got: 4 });
    }

    #[test]
    fn test_row_length_mismatch() {
        let err = check_tags(&["a", "b"], &["a", "b"], strs(&["1", "2", "3"])).unwrap_err();
        assert_eq!(err, MigrationError::ValuesMismatch { expected: 4, got: 5 });
    }

    #[test]
    fn test_result_error() {
        let result = QueryResult {
            series: Vec::new(),
            error: Some("database not found".to_string()),
        };
        assert_eq!(
            parse_result(&result).unwrap_err(),
            MigrationError::Result("database not found".to_string())
        );
    }

    #[test]
    fn test_parse_result_groups_by_column() {
        let result: QueryResult = serde_json::from_str(
            r#"{
                "series": [{
                    "name": "cpu",
                    "columns": ["time", "usage"],
                    "values": [["2024-01-01T00:00:00Z", 1.5], ["2024-01-01T00:00:10Z", 2]]
                }]
            }"#,
        )
        .unwrap();

        let parsed = parse_result(&result).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "cpu");
        assert_eq!(parsed[0].field_values("usage").unwrap(), vec![1.5, 2.0]);
        assert_eq!(parsed[0].column("time").map(<[_]>::len), Some(2));
    }
}
