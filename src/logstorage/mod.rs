//! Log Storage Query Evaluation
//!
//! Selects matching rows inside columnar log blocks:
//!
//! - [`Bitmap`]: per-block bit vector of candidate rows
//! - [`tokenize_strings`]: word tokens used to build and probe token indexes
//! - [`Filter`]: predicate tree evaluated in a coarse (index) and a fine
//!   (decoded values) phase
//! - [`BlockSearcher`]: runs a filter tree over one or many blocks
//! - [`pool`]: per-thread free lists for scratch objects
//!
//! Blocks are consumed through the [`BlockSearch`] and [`BlockResult`]
//! contracts; [`Block`] is the in-memory implementation.

pub mod bitmap;
pub mod block;
pub mod bloom;
pub mod fields_set;
pub mod filter;
pub mod pool;
pub mod search;
pub mod tokenizer;

pub use bitmap::{get_bitmap, get_bitmap_copy, Bitmap};
pub use block::{
    parse_number, Block, BlockReader, BlockResult, BlockSearch, Column, DecodedBlock,
    IndexOptions,
};
pub use bloom::TokenBloom;
pub use fields_set::FieldsSet;
pub use filter::{
    match_phrase, match_prefix, AndFilter, BlockFilter, ExactFilter, Filter, InFilter,
    NoopFilter, NotFilter, OrFilter, PhraseFilter, PrefixFilter, RangeFilter, RegexpFilter,
    MSG_FIELD,
};
pub use search::{BlockMatches, BlockSearcher};
pub use tokenizer::{is_token_char, tokenize_strings};
