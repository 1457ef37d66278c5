//! Migration Client Integration Tests
//!
//! Walks the non-network part of a series migration: parse series
//! identifiers, build fetch queries, and shape JSON query results.

use kuba_logstore::error::MigrationError;
use kuba_logstore::influx::{
    parse_result, parse_result_check_tags, time_filter, QueryResult, QueryValue, Series,
};
use kuba_logstore::Error;

fn series_with_field(id: &str, field: &str) -> Series {
    let mut series = Series::unmarshal(id).unwrap();
    series.field = field.to_string();
    series
}

#[test]
fn test_escaped_series_round_trip_into_query() {
    let series = series_with_field(r"disk\ io,host=web\,1,path=C:\\data", "reads");

    assert_eq!(series.measurement, "disk io");
    assert_eq!(series.label_pairs[0].value, "web,1");
    assert_eq!(series.label_pairs[1].value, r"C:\data");

    let query = series.fetch_query(&time_filter("2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z"));
    assert_eq!(
        query,
        r#"select "reads" from "disk io" where "host"::tag='web,1' and "path"::tag='C:\\data' and time >= '2024-01-01T00:00:00Z' and time <= '2024-01-02T00:00:00Z'"#
    );
}

#[test]
fn test_result_rows_of_wider_series_dropped() {
    let series = series_with_field("cpu,host=web-1", "usage");

    // "region" is not a tag of the series: rows with a region belong to
    // cpu,host=web-1,region=... and must not be attributed to this series
    let result: QueryResult = serde_json::from_str(
        r#"{
            "series": [{
                "name": "cpu",
                "columns": ["time", "host", "region", "usage"],
                "values": [
                    [1700000000000000000, "web-1", null, 0.5],
                    [1700000010000000000, "web-1", "eu", 0.9],
                    [1700000020000000000, "web-1", null, 1]
                ]
            }]
        }"#,
    )
    .unwrap();

    let parsed = parse_result_check_tags(&series, &result).unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].field_values("usage").unwrap(), vec![0.5, 1.0]);
    assert_eq!(
        parsed[0].column("time").unwrap(),
        &[
            QueryValue::Int(1700000000000000000),
            QueryValue::Int(1700000020000000000)
        ]
    );

    // Without the tag check every row is kept
    let all = parse_result(&result).unwrap();
    assert_eq!(all[0].field_values("usage").unwrap(), vec![0.5, 0.9, 1.0]);
}

#[test]
fn test_shape_errors() {
    let series = series_with_field("cpu,host=web-1,dc=eu", "usage");

    let result: QueryResult = serde_json::from_str(
        r#"{"series": [{"name": "cpu", "columns": ["time", "usage"], "values": []}]}"#,
    )
    .unwrap();
    let err = parse_result_check_tags(&series, &result).unwrap_err();
    assert_eq!(err, MigrationError::ColumnsMismatch { expected: 4, got: 2 });

    let result: QueryResult = serde_json::from_str(
        r#"{"series": [{"name": "cpu", "columns": ["time", "host", "dc", "usage"], "values": [[1, "web-1", "eu"]]}]}"#,
    )
    .unwrap();
    let err: Error = parse_result_check_tags(&series, &result).unwrap_err().into();
    assert!(matches!(
        err,
        Error::Migration(MigrationError::ValuesMismatch { expected: 4, got: 3 })
    ));
}

#[test]
fn test_non_numeric_field_value() {
    let series = series_with_field("events", "message");
    let result: QueryResult = serde_json::from_str(
        r#"{"series": [{"name": "events", "columns": ["time", "message"], "values": [[1, "text"]]}]}"#,
    )
    .unwrap();

    let parsed = parse_result_check_tags(&series, &result).unwrap();
    let err = parsed[0].field_values("message").unwrap_err();
    assert!(matches!(err, MigrationError::TypeConversion { kind: "string", .. }));
}

#[test]
fn test_reported_error() {
    let result: QueryResult =
        serde_json::from_str(r#"{"error": "retention policy not found: autogen"}"#).unwrap();
    let series = series_with_field("cpu", "usage");

    assert!(matches!(
        parse_result_check_tags(&series, &result),
        Err(MigrationError::Result(msg)) if msg.contains("retention policy")
    ));
}
