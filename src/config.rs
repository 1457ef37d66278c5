//! Configuration management
//!
//! TOML configuration with per-field defaults, `LOGSTORE_*` environment
//! overrides and validation. Runtime knobs that live in process-wide state
//! (pool caps) are pushed there by [`Config::apply`].

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result, ValidationError};
use crate::logstorage::{pool, IndexOptions};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Block search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Scratch object pools
    #[serde(default)]
    pub pool: PoolConfig,

    /// Per-column index settings used when blocks are built
    #[serde(default)]
    pub index: IndexConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Block search configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Allow evaluating blocks on the rayon thread pool
    #[serde(default = "default_true")]
    pub enable_parallel: bool,

    /// Minimum number of blocks before searching in parallel
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

/// Pool configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PoolConfig {
    /// Idle objects kept per pool per thread
    #[serde(default = "default_max_idle_per_thread")]
    pub max_idle_per_thread: usize,
}

/// Index configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IndexConfig {
    /// Target false positive rate of token bloom filters
    #[serde(default = "default_bloom_fp_rate")]
    pub bloom_fp_rate: f64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_parallel_threshold() -> usize { 4 }
fn default_max_idle_per_thread() -> usize { pool::DEFAULT_MAX_IDLE_PER_THREAD }
fn default_bloom_fp_rate() -> f64 { crate::logstorage::bloom::DEFAULT_FP_RATE }
fn default_log_level() -> String { "info".to_string() }
fn default_true() -> bool { true }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enable_parallel: true,
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_thread: default_max_idle_per_thread(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            bloom_fp_rate: default_bloom_fp_rate(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    /// Parsed maximum level for a tracing subscriber
    pub fn tracing_level(&self) -> Result<tracing::Level> {
        match self.level.to_ascii_lowercase().as_str() {
            "error" => Ok(tracing::Level::ERROR),
            "warn" => Ok(tracing::Level::WARN),
            "info" => Ok(tracing::Level::INFO),
            "debug" => Ok(tracing::Level::DEBUG),
            "trace" => Ok(tracing::Level::TRACE),
            _ => Err(ValidationError::InvalidFormat {
                field: "logging.level".to_string(),
                message: format!("unknown level {:?}", self.level),
            }
            .into()),
        }
    }
}

impl IndexConfig {
    /// Index options for building blocks
    pub fn options(&self) -> IndexOptions {
        IndexOptions {
            bloom_fp_rate: self.bloom_fp_rate,
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        toml::from_str(&contents).map_err(|e| {
            Error::Configuration(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from environment variables only
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Apply environment variable overrides
    ///
    /// Unparseable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        // Search
        if let Some(v) = env_parse("LOGSTORE_ENABLE_PARALLEL") {
            self.search.enable_parallel = v;
        }
        if let Some(v) = env_parse("LOGSTORE_PARALLEL_THRESHOLD") {
            self.search.parallel_threshold = v;
        }

        // Pool
        if let Some(v) = env_parse("LOGSTORE_POOL_MAX_IDLE") {
            self.pool.max_idle_per_thread = v;
        }

        // Index
        if let Some(v) = env_parse("LOGSTORE_BLOOM_FP_RATE") {
            self.index.bloom_fp_rate = v;
        }

        // Logging
        if let Ok(level) = std::env::var("LOGSTORE_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.search.parallel_threshold == 0 {
            return Err(ValidationError::OutOfRange {
                field: "search.parallel_threshold".to_string(),
                value: "0".to_string(),
                min: "1".to_string(),
                max: usize::MAX.to_string(),
            }
            .into());
        }

        let fp = self.index.bloom_fp_rate;
        if !(fp > 0.0 && fp <= 0.5) {
            return Err(ValidationError::OutOfRange {
                field: "index.bloom_fp_rate".to_string(),
                value: fp.to_string(),
                min: "0 (exclusive)".to_string(),
                max: "0.5".to_string(),
            }
            .into());
        }

        self.logging.tracing_level()?;

        Ok(())
    }

    /// Push process-wide settings into the pools
    pub fn apply(&self) {
        pool::set_max_idle_per_thread(self.pool.max_idle_per_thread);
        tracing::debug!(
            max_idle_per_thread = self.pool.max_idle_per_thread,
            "Applied pool configuration"
        );
    }

    /// Save configuration to TOML file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)?;
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
