//! Kuba LogStore - Query evaluation core for columnar log storage
//!
//! This library provides:
//! - Two-phase block filters (index-based coarse pass, exact fine pass)
//! - Needed-field pushdown so only referenced columns are decoded
//! - A Unicode word tokenizer shared by token indexes and filters
//! - Per-thread pools for bitmaps and tokenizer scratch state
//! - Parallel multi-block search on rayon
//! - Series parsing and result shaping for InfluxDB migrations

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;

/// Prometheus metrics for block search and pools
pub mod metrics;

/// Configuration management with TOML support
pub mod config;

/// Bitmaps, tokenizer, pools, filters and the block search driver
pub mod logstorage;

/// Series identifiers and query results of an InfluxDB migration client
pub mod influx;

// Re-export main types
pub use config::Config;
pub use error::{Error, Result};
pub use logstorage::{Bitmap, Block, BlockFilter, BlockSearcher, FieldsSet, Filter};
