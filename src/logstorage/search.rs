//! Block Search Driver
//!
//! Runs a filter tree over blocks using the two-phase protocol:
//!
//! 1. Collect the tree's needed fields once per search.
//! 2. Per block, start from an all-set pooled bitmap and run the coarse
//!    phase against the block index.
//! 3. If no candidate is left, skip the block without decoding anything.
//! 4. Otherwise decode only the needed fields and run the fine phase.
//!
//! Multi-block searches fan out over the global rayon pool once the block
//! count reaches the configured threshold. Blocks are independent, so no
//! state is shared between workers beyond the read-only filter.
//!
//! # Example
//!
//! ```rust
//! use kuba_logstore::logstorage::{Block, BlockSearcher, Filter};
//!
//! let blocks = vec![
//!     Block::from_rows(vec![vec![("_msg", "disk full")], vec![("_msg", "ok")]]),
//!     Block::from_rows(vec![vec![("_msg", "all good")]]),
//! ];
//!
//! let searcher = BlockSearcher::new(Filter::phrase("_msg", "disk"));
//! let matches = searcher.search_blocks(&blocks, None);
//!
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].block_idx, 0);
//! assert_eq!(matches[0].rows, vec![0]);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, trace};

use super::bitmap::get_bitmap;
use super::block::BlockReader;
use super::fields_set::FieldsSet;
use super::filter::{BlockFilter, Filter};
use crate::config::SearchConfig;
use crate::metrics;

/// Matching rows of one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMatches {
    /// Index of the block in the searched slice
    pub block_idx: usize,
    /// Matching row indices, ascending
    pub rows: Vec<usize>,
}

/// Evaluates one filter tree against any number of blocks
#[derive(Debug, Clone)]
pub struct BlockSearcher {
    filter: Filter,
    needed: FieldsSet,
    config: SearchConfig,
}

impl BlockSearcher {
    /// Create a searcher with default settings
    pub fn new(filter: Filter) -> Self {
        let mut needed = FieldsSet::new();
        filter.update_needed_fields(&mut needed);

        Self {
            filter,
            needed,
            config: SearchConfig::default(),
        }
    }

    /// Use the given search settings
    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Filter being evaluated
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Fields decoded for every block that survives the coarse phase
    pub fn needed_fields(&self) -> &FieldsSet {
        &self.needed
    }

    /// Matching row indices of `block`, ascending
    pub fn search_block<B: BlockReader>(&self, block: &B) -> Vec<usize> {
        let mut bm = get_bitmap(block.rows_count());

        self.filter.apply(block, &mut bm);
        if bm.is_zero() {
            trace!(rows = block.rows_count(), "Block skipped by index");
            metrics::record_block(true, 0);
            return Vec::new();
        }

        let decoded = block.decode(&self.needed);
        self.filter.apply_to_block_result(&decoded, &mut bm);

        let rows: Vec<usize> = bm.iter_set_bits().collect();
        trace!(rows = block.rows_count(), matched = rows.len(), "Block searched");
        metrics::record_block(false, rows.len());
        rows
    }

    /// Search every block, returning blocks with at least one match in order
    ///
    /// When `stop` is set, blocks not yet started are skipped and the
    /// matches found so far are returned.
    pub fn search_blocks<B>(&self, blocks: &[B], stop: Option<&AtomicBool>) -> Vec<BlockMatches>
    where
        B: BlockReader + Sync,
    {
        let start = Instant::now();
        let stopped = || stop.is_some_and(|s| s.load(Ordering::Relaxed));

        let search_one = |(block_idx, block): (usize, &B)| {
            if stopped() {
                return None;
            }
            let rows = self.search_block(block);
            (!rows.is_empty()).then_some(BlockMatches { block_idx, rows })
        };

        let parallel =
            self.config.enable_parallel && blocks.len() >= self.config.parallel_threshold;

        let matches: Vec<BlockMatches> = if parallel {
            blocks.par_iter().enumerate().filter_map(search_one).collect()
        } else {
            blocks.iter().enumerate().filter_map(search_one).collect()
        };

        let elapsed = start.elapsed();
        metrics::SEARCH_DURATION.observe(elapsed.as_secs_f64());
        debug!(
            filter = %self.filter,
            needed = %self.needed,
            blocks = blocks.len(),
            matched_blocks = matches.len(),
            parallel,
            stopped = stopped(),
            elapsed_us = elapsed.as_micros() as u64,
            "Block search finished"
        );

        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logstorage::block::Block;

    fn blocks() -> Vec<Block> {
        (0..8)
            .map(|i| {
                Block::from_rows((0..16).map(|j| {
                    let level = if (i + j) % 5 == 0 { "error" } else { "info" };
                    vec![
                        ("_msg", format!("request {j} served by node {i}")),
                        ("level", level.to_string()),
                    ]
                }))
            })
            .collect()
    }

    #[test]
    fn test_needed_fields_computed_once() {
        let searcher = BlockSearcher::new(Filter::and([
            Filter::phrase("_msg", "request"),
            Filter::exact("level", "error"),
        ]));
        assert_eq!(searcher.needed_fields().sorted(), vec!["_msg", "level"]);
    }

    #[test]
    fn test_search_block_rows_ascending() {
        let block = Block::from_rows(vec![
            vec![("level", "error")],
            vec![("level", "info")],
            vec![("level", "error")],
        ]);
        let searcher = BlockSearcher::new(Filter::exact("level", "error"));
        assert_eq!(searcher.search_block(&block), vec![0, 2]);
    }

    #[test]
    fn test_block_skipped_by_index() {
        let block = Block::from_rows(vec![vec![("host", "web-1")], vec![("host", "web-1")]]);
        let searcher = BlockSearcher::new(Filter::exact("host", "db-1"));

        let skipped = metrics::BLOCKS_SKIPPED.get();
        assert!(searcher.search_block(&block).is_empty());
        assert!(metrics::BLOCKS_SKIPPED.get() > skipped);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let blocks = blocks();
        let filter = Filter::and([Filter::phrase("_msg", "node"), Filter::exact("level", "error")]);

        let serial = BlockSearcher::new(filter.clone())
            .with_config(SearchConfig {
                enable_parallel: false,
                ..SearchConfig::default()
            })
            .search_blocks(&blocks, None);
        let parallel = BlockSearcher::new(filter)
            .with_config(SearchConfig {
                enable_parallel: true,
                parallel_threshold: 1,
            })
            .search_blocks(&blocks, None);

        assert_eq!(serial, parallel);
        assert_eq!(serial.len(), 8);
        assert!(serial.windows(2).all(|w| w[0].block_idx < w[1].block_idx));
    }

    #[test]
    fn test_stop_flag_skips_remaining_blocks() {
        let blocks = blocks();
        let stop = AtomicBool::new(true);
        let searcher = BlockSearcher::new(Filter::noop());
        assert!(searcher.search_blocks(&blocks, Some(&stop)).is_empty());
    }

    #[test]
    fn test_noop_matches_every_row() {
        let blocks = blocks();
        let matches = BlockSearcher::new(Filter::noop()).search_blocks(&blocks, None);
        assert_eq!(matches.len(), blocks.len());
        assert!(matches.iter().all(|m| m.rows == (0..16).collect::<Vec<_>>()));
    }
}
