//! Configuration for the swedeb library and CLI.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codec::CodecSpecification;
use crate::codec::person::DEFAULT_SPEECH_BASE_URL;
use crate::error::{Result, SwedebError};
use crate::kwic::KwicOptions;
use crate::kwic::partitioned::PartitionConfig;
use crate::mapper::{DEFAULT_PREFIX, DEFAULT_TARGET, EPOCH_YEAR, QueryMapper};
use crate::ngrams::NGramOptions;

/// Query compilation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Scope tag the criteria bind to.
    pub prefix: String,

    /// Structural unit of the trailing `within` clause.
    pub within: Option<String>,

    /// Positional attribute matched when a word names none.
    pub default_target: String,

    /// Lower year bound used when only an upper bound is given.
    pub epoch_year: u32,

    /// Whether words match case-insensitively.
    pub ignore_case: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            within: Some("speech".to_string()),
            default_target: DEFAULT_TARGET.to_string(),
            epoch_year: EPOCH_YEAR,
            ignore_case: true,
        }
    }
}

impl QueryConfig {
    pub fn mapper(&self) -> QueryMapper {
        QueryMapper::new()
            .with_prefix(self.prefix.as_str())
            .with_default_target(self.default_target.as_str())
            .with_epoch_year(self.epoch_year)
            .with_ignore_case(self.ignore_case)
    }
}

/// Where code tables come from and how they are declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// JSON document or directory of CSV files.
    pub source: Option<PathBuf>,

    pub specification: CodecSpecification,

    /// Prefix of derived speech links.
    pub speech_base_url: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            source: None,
            specification: CodecSpecification::riksprot_persons(),
            speech_base_url: DEFAULT_SPEECH_BASE_URL.to_string(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwedebConfig {
    pub query: QueryConfig,
    pub kwic: KwicOptions,
    pub ngrams: NGramOptions,
    pub partition: PartitionConfig,
    pub codecs: CodecConfig,
}

impl SwedebConfig {
    /// Read a JSON configuration file; missing sections take defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            SwedebError::invalid_config(format!("cannot open {}: {e}", path.display()))
        })?;
        let config: SwedebConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.query.prefix.is_empty() {
            return Err(SwedebError::invalid_config("query prefix must not be empty"));
        }
        if self.ngrams.n == 0 {
            return Err(SwedebError::invalid_config("n-gram size must be positive"));
        }
        if self.partition.num_workers == Some(0) {
            return Err(SwedebError::invalid_config("worker count must be positive"));
        }
        Ok(())
    }
}
