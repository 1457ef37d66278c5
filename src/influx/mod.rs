//! InfluxDB series migration client
//!
//! The pieces of a migration client that do not touch the network:
//!
//! - [`Series`]: parses series identifiers (`measurement,tag=value,...`)
//!   as returned by `SHOW SERIES` and builds the per-series fetch query
//! - [`QueryValue`]: scalar values of a query result with numeric coercion
//! - [`parse_result`] / [`parse_result_check_tags`]: group result rows by
//!   column, optionally dropping rows that belong to a different series
//!
//! # Example
//!
//! ```rust
//! use kuba_logstore::influx::{time_filter, Series};
//!
//! let mut series = Series::unmarshal("cpu,host=web-1").unwrap();
//! series.field = "usage".to_string();
//!
//! let query = series.fetch_query(&time_filter("2024-01-01T00:00:00Z", ""));
//! assert_eq!(
//!     query,
//!     r#"select "usage" from "cpu" where "host"::tag='web-1' and time >= '2024-01-01T00:00:00Z'"#
//! );
//! ```

mod result;
mod series;
mod value;

pub use result::{parse_result, parse_result_check_tags, QueryResult, QueryValues, ResultSeries};
pub use series::{time_filter, LabelPair, Series};
pub use value::QueryValue;
