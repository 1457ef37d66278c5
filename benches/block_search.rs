//! Block Search Benchmarks
//!
//! Measures the two-phase filter pipeline: index-only rejection, full
//! decode plus fine evaluation, combinator overhead, and parallel fan-out
//! across blocks.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kuba_logstore::config::SearchConfig;
use kuba_logstore::logstorage::{Block, BlockSearcher, Filter};
use std::hint::black_box;

// =============================================================================
// Test Data Generators
// =============================================================================

/// Build `count` blocks of `rows` log rows each
fn create_blocks(count: usize, rows: usize) -> Vec<Block> {
    (0..count)
        .map(|b| {
            Block::from_rows((0..rows).map(|i| {
                let level = match i % 20 {
                    0 => "error",
                    1..=3 => "warn",
                    _ => "info",
                };
                let code = if level == "error" { "500" } else { "200" };
                vec![
                    ("_msg", format!("request {} handled by worker {} in {}ms", i, i % 8, i % 300)),
                    ("host", format!("node-{}", b % 16)),
                    ("level", level.to_string()),
                    ("code", code.to_string()),
                ]
            }))
        })
        .collect()
}

// =============================================================================
// Single Block Benchmarks
// =============================================================================

fn bench_single_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_block");
    let blocks = create_blocks(1, 8192);
    let block = &blocks[0];
    group.throughput(Throughput::Elements(8192));

    let cases = [
        ("index_reject", Filter::phrase("host", "node-99")),
        ("phrase", Filter::phrase("_msg", "worker 3")),
        ("prefix", Filter::prefix("_msg", "hand")),
        ("range", Filter::range("code", 500.0, 599.0)),
        ("regexp", Filter::regexp("_msg", r"in 29\dms").unwrap()),
        (
            "and_not",
            Filter::and([
                Filter::exact("level", "warn"),
                Filter::negate(Filter::phrase("_msg", "worker 1")),
            ]),
        ),
    ];

    for (name, filter) in cases {
        let searcher = BlockSearcher::new(filter);
        group.bench_function(name, |b| {
            b.iter(|| black_box(searcher.search_block(black_box(block))));
        });
    }

    group.finish();
}

// =============================================================================
// Parallel vs Sequential Benchmarks
// =============================================================================

fn bench_parallel_vs_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_vs_sequential");
    let filter = Filter::or([Filter::exact("level", "error"), Filter::phrase("_msg", "worker 7")]);

    for block_count in [4, 16, 64] {
        let blocks = create_blocks(block_count, 4096);
        group.throughput(Throughput::Elements((block_count * 4096) as u64));

        let parallel = BlockSearcher::new(filter.clone()).with_config(SearchConfig {
            enable_parallel: true,
            parallel_threshold: 1,
        });
        group.bench_with_input(
            BenchmarkId::new("parallel", block_count),
            &blocks,
            |b, blocks| {
                b.iter(|| black_box(parallel.search_blocks(blocks, None)));
            },
        );

        let sequential = BlockSearcher::new(filter.clone()).with_config(SearchConfig {
            enable_parallel: false,
            ..SearchConfig::default()
        });
        group.bench_with_input(
            BenchmarkId::new("sequential", block_count),
            &blocks,
            |b, blocks| {
                b.iter(|| black_box(sequential.search_blocks(blocks, None)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_single_block, bench_parallel_vs_sequential);
criterion_main!(benches);
