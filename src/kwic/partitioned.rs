//! Year-partitioned keyword-in-context over a worker pool.

use std::path::PathBuf;

use log::{debug, info, warn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use crate::codec::Codecs;
use crate::corpus::{CorpusEngine, EngineFactory};
use crate::cqp::{OptValue, QueryOpts};
use crate::error::{Result, SwedebError};
use crate::frame::Frame;
use crate::kwic::KwicOptions;
use crate::kwic::simple::kwic;
use crate::mapper::DEFAULT_PREFIX;

/// Configuration for the year partitioner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    /// Number of workers.
    /// If None, uses the number of CPU cores.
    pub num_workers: Option<usize>,

    /// Parent of the per-worker directories, the system temp dir if None.
    pub temp_root: Option<PathBuf>,
}

impl PartitionConfig {
    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = Some(num_workers);
        self
    }

    pub fn with_temp_root<P: Into<PathBuf>>(mut self, temp_root: P) -> Self {
        self.temp_root = Some(temp_root.into());
        self
    }
}

/// Split `low..=high` into at most `n` contiguous ascending chunks whose
/// sizes differ by at most one year.
pub fn split_years(low: u32, high: u32, n: usize) -> Result<Vec<(u32, u32)>> {
    if low > high {
        return Err(SwedebError::partition(format!(
            "inverted year range {low}-{high}"
        )));
    }
    // 0..=u32::MAX spans 2^32 years
    let span = u64::from(high) - u64::from(low) + 1;
    let n = (n as u64).clamp(1, span);
    let (base, extra) = (span / n, span % n);

    let mut chunks = Vec::with_capacity(n as usize);
    let mut start = u64::from(low);
    for i in 0..n {
        let end = start + base + u64::from(i < extra) - 1;
        // bounded by `high`
        chunks.push((start as u32, end as u32));
        start = end + 1;
    }
    Ok(chunks)
}

/// Runs one task per year chunk, each on its own engine handle opened in a
/// private temporary directory.
pub struct YearPartitioner {
    config: PartitionConfig,
    num_workers: usize,
    thread_pool: ThreadPool,
}

impl YearPartitioner {
    pub fn new(config: PartitionConfig) -> Result<Self> {
        let num_workers = config.num_workers.unwrap_or_else(num_cpus::get).max(1);

        let thread_pool = ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .thread_name(|i| format!("kwic-partition-{i}"))
            .build()
            .map_err(|e| SwedebError::partition(format!("Failed to create thread pool: {e}")))?;

        Ok(YearPartitioner {
            config,
            num_workers,
            thread_pool,
        })
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    pub fn chunks(&self, low: u32, high: u32) -> Result<Vec<(u32, u32)>> {
        split_years(low, high, self.num_workers)
    }

    /// Run `task` for every chunk of `years`; results come back in chunk
    /// order and the first failure aborts the call.
    pub fn map<T, F>(&self, factory: &dyn EngineFactory, years: (u32, u32), task: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(&mut dyn CorpusEngine, (u32, u32)) -> Result<T> + Sync,
    {
        let chunks = self.chunks(years.0, years.1)?;
        info!(
            "partitioning years {}-{} into {} chunks",
            years.0,
            years.1,
            chunks.len()
        );
        self.thread_pool.install(|| {
            chunks
                .par_iter()
                .map(|chunk| self.run_chunk(factory, *chunk, &task))
                .collect()
        })
    }

    fn run_chunk<T, F>(&self, factory: &dyn EngineFactory, chunk: (u32, u32), task: &F) -> Result<T>
    where
        F: Fn(&mut dyn CorpusEngine, (u32, u32)) -> Result<T>,
    {
        let work_dir = self.work_dir()?;
        debug!(
            "chunk {}-{} in {}",
            chunk.0,
            chunk.1,
            work_dir.path().display()
        );
        let result = factory
            .open(work_dir.path())
            .and_then(|mut engine| task(engine.as_mut(), chunk));

        let path = work_dir.path().to_path_buf();
        if let Err(e) = work_dir.close() {
            warn!("failed to remove worker directory {}: {e}", path.display());
        }
        result
    }

    fn work_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("swedeb-kwic-");
        let dir = match &self.config.temp_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }
}

/// Keyword-in-context over `years`, one year chunk per worker.
///
/// The year criteria of the first option is replaced per chunk. Partial
/// results are concatenated in ascending year order and capped to the
/// global cut-off.
pub fn kwic_partitioned(
    partitioner: &YearPartitioner,
    factory: &dyn EngineFactory,
    opts: &[QueryOpts],
    years: (u32, u32),
    codecs: &Codecs,
    speech_index: Option<&Frame>,
    options: &KwicOptions,
) -> Result<Frame> {
    let first = opts
        .first()
        .ok_or_else(|| SwedebError::query("no query options given"))?;
    let prefix = first
        .prefix
        .clone()
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_PREFIX.to_string());
    let year_key = format!("{prefix}.year_year");

    let partials = partitioner.map(factory, years, |engine, (low, high)| {
        let mut chunk_opts = opts.to_vec();
        chunk_opts[0].prefix = Some(prefix.clone());
        chunk_opts[0].set_criteria(year_key.as_str(), OptValue::interval(low, high));
        kwic(engine, &chunk_opts, codecs, speech_index, options)
    })?;

    let merged = Frame::concat(partials)?;
    Ok(match options.cut_off {
        Some(cut_off) => merged.head(cut_off),
        None => merged,
    })
}
