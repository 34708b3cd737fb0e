//! Boundary to the external positional corpus engine.
//!
//! The engine itself lives outside this crate; it is reached through the
//! query-and-concordance protocol modelled by [`CorpusEngine`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::corpus::attribs::CorpusAttribs;
use crate::error::Result;
use crate::frame::Frame;

/// A windowed concordance request.
///
/// The engine answers with one row per hit: `left_<p>`, `node_<p>` and
/// `right_<p>` columns for every positional attribute in `p_show` (tokens
/// joined by single spaces) and one column per structural attribute in
/// `s_show`, under the engine's own `<scope>_<attribute>` names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcordanceRequest {
    pub query: String,
    pub p_show: Vec<String>,
    pub s_show: Vec<String>,
    pub context_left: usize,
    pub context_right: usize,
    pub cut_off: Option<usize>,
}

impl ConcordanceRequest {
    pub fn new<S: Into<String>>(query: S) -> Self {
        ConcordanceRequest {
            query: query.into(),
            p_show: vec!["word".to_string()],
            s_show: Vec::new(),
            context_left: 0,
            context_right: 0,
            cut_off: None,
        }
    }

    pub fn with_p_show(mut self, p_show: Vec<String>) -> Self {
        self.p_show = p_show;
        self
    }

    pub fn with_s_show(mut self, s_show: Vec<String>) -> Self {
        self.s_show = s_show;
        self
    }

    pub fn with_context(mut self, left: usize, right: usize) -> Self {
        self.context_left = left;
        self.context_right = right;
        self
    }

    pub fn with_cut_off(mut self, cut_off: Option<usize>) -> Self {
        self.cut_off = cut_off;
        self
    }
}

/// Handle to an opened corpus.
///
/// Calls block until the engine answers; there is no timeout.
pub trait CorpusEngine {
    /// Corpus identifier.
    fn name(&self) -> &str;

    /// Attribute description of the corpus.
    fn attributes(&self) -> Result<CorpusAttribs>;

    /// Run a query and return the number of hits.
    fn query(&mut self, expression: &str) -> Result<usize>;

    /// Retrieve a windowed concordance for a query.
    ///
    /// Engines may answer an empty result with a frame of any shape,
    /// including one without columns.
    fn concordance(&mut self, request: &ConcordanceRequest) -> Result<Frame>;
}

/// Opens isolated engine handles.
///
/// Engines with file-based locks cannot share a handle across workers, so
/// each worker opens its own, pointed at a private working directory.
pub trait EngineFactory: Send + Sync {
    fn open(&self, work_dir: &Path) -> Result<Box<dyn CorpusEngine>>;
}

impl<F> EngineFactory for F
where
    F: Fn(&Path) -> Result<Box<dyn CorpusEngine>> + Send + Sync,
{
    fn open(&self, work_dir: &Path) -> Result<Box<dyn CorpusEngine>> {
        self(work_dir)
    }
}
