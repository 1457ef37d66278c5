//! Error types for the crate
//!
//! Filter evaluation itself is infallible; errors come from building a
//! filter (regexp compilation), loading configuration, and the series
//! migration client.

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    /// Migration client error
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),

    /// Filter construction error
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Filter construction errors
#[derive(Error, Debug)]
pub enum FilterError {
    /// Regular expression failed to compile
    #[error("Invalid regexp {expr:?}: {source}")]
    InvalidRegexp {
        /// Expression as given
        expr: String,
        /// Compilation failure
        #[source]
        source: regex::Error,
    },
}

/// Errors raised while reading series from a query API
///
/// Each error aborts the record being processed, never a whole batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MigrationError {
    /// The query API reported an error for the statement
    #[error("Query result error: {0}")]
    Result(String),

    /// Result has fewer columns than the series tags plus field and time
    #[error("Columns mismatch: expected at least {expected} columns, got {got}")]
    ColumnsMismatch {
        /// Minimum number of columns
        expected: usize,
        /// Columns in the result
        got: usize,
    },

    /// A row's value count differs from the column count
    #[error("Values mismatch: expected {expected} values per row, got {got}")]
    ValuesMismatch {
        /// Number of columns
        expected: usize,
        /// Values in the row
        got: usize,
    },

    /// A scalar value cannot be coerced to a number
    #[error("Cannot convert {kind} value {value:?} to float64")]
    TypeConversion {
        /// Rendered value
        value: String,
        /// Value kind
        kind: &'static str,
    },

    /// Series identifier could not be parsed
    #[error("Invalid series {series:?}: {message}")]
    InvalidSeries {
        /// Series identifier as given
        series: String,
        /// What was wrong with it
        message: String,
    },
}

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Value is out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Field name being validated
        field: String,
        /// The invalid value
        value: String,
        /// Minimum allowed value
        min: String,
        /// Maximum allowed value
        max: String,
    },

    /// Invalid format
    #[error("Invalid format for {field}: {message}")]
    InvalidFormat {
        /// Field name being validated
        field: String,
        /// Description of the format error
        message: String,
    },
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Configuration(e.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_error_converts() {
        let err: Error = MigrationError::ColumnsMismatch {
            expected: 4,
            got: 2,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Migration error: Columns mismatch: expected at least 4 columns, got 2"
        );
    }

    #[test]
    fn test_validation_error_is_configuration() {
        let err: Error = ValidationError::InvalidFormat {
            field: "logging.level".to_string(),
            message: "unknown level".to_string(),
        }
        .into();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
