//! # swedeb
//!
//! Query compilation, categorical codecs and concordance retrieval for
//! parliamentary debate corpora served by a positional corpus engine.
//!
//! ## Features
//!
//! - Compile search words and metadata filters into engine query expressions
//! - Year ranges as minimal digit-class alternations
//! - Id/name codecs backed by configurable code tables
//! - Keyword-in-context and n-gram retrieval with decoded metadata
//! - Year-partitioned retrieval over a worker pool

pub mod cli;
pub mod codec;
pub mod config;
pub mod corpus;
pub mod cqp;
pub mod error;
pub mod frame;
pub mod kwic;
pub mod mapper;
pub mod ngrams;

pub mod prelude {
    pub use crate::codec::{Codecs, DecodeOptions, PersonCodecs};
    pub use crate::config::SwedebConfig;
    pub use crate::corpus::{ConcordanceRequest, CorpusEngine, EngineFactory};
    pub use crate::cqp::{Criteria, OptValue, QueryOpts, compile_expression, interval_pattern};
    pub use crate::error::{Result, SwedebError};
    pub use crate::frame::{ColumnValue, DType, Frame};
    pub use crate::kwic::{KwicOptions, YearPartitioner, kwic, kwic_partitioned};
    pub use crate::mapper::{QueryMapper, QueryParams};
    pub use crate::ngrams::{NGramMode, NGramOptions, n_grams};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
