//! N-gram counts around query hits.
//!
//! Every hit comes back as a token window; windows are split into n-grams,
//! grouped by n-gram text, and each group reports its occurrence count and
//! the distinct speeches it was seen in.

use std::collections::{BTreeSet, HashMap};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::corpus::{ConcordanceRequest, CorpusEngine};
use crate::cqp::{QueryOpts, compile_expression};
use crate::error::{Result, SwedebError};
use crate::frame::{Column, ColumnValue, DType, Frame};

pub const NGRAM_COLUMNS: &[(&str, DType)] = &[
    ("ngram", DType::Str),
    ("window_count", DType::Int),
    ("documents", DType::Str),
];

/// How windows are placed around the hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NGramMode {
    /// `n - 1` tokens on both sides, every contained n-gram counted.
    #[default]
    Sliding,
    /// The hit followed by `n - 1` tokens, counted as one n-gram.
    LeftAligned,
    /// `n - 1` tokens followed by the hit, counted as one n-gram.
    RightAligned,
}

impl NGramMode {
    /// Context sizes `(left, right)` for n-grams of size `n`.
    pub fn context(&self, n: usize) -> (usize, usize) {
        let width = n.saturating_sub(1);
        match self {
            NGramMode::Sliding => (width, width),
            NGramMode::LeftAligned => (0, width),
            NGramMode::RightAligned => (width, 0),
        }
    }

    pub fn is_locked(&self) -> bool {
        !matches!(self, NGramMode::Sliding)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NGramOptions {
    pub n: usize,
    pub mode: NGramMode,
    /// Minimum window count of a reported n-gram.
    pub threshold: Option<usize>,
    pub p_show: String,
    pub cut_off: Option<usize>,
    pub within: Option<String>,
}

impl Default for NGramOptions {
    fn default() -> Self {
        NGramOptions {
            n: 2,
            mode: NGramMode::Sliding,
            threshold: None,
            p_show: "word".to_string(),
            cut_off: Some(200_000),
            within: None,
        }
    }
}

impl NGramOptions {
    pub fn new(n: usize) -> Self {
        NGramOptions {
            n,
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: NGramMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_p_show<S: Into<String>>(mut self, p_show: S) -> Self {
        self.p_show = p_show.into();
        self
    }

    pub fn with_cut_off(mut self, cut_off: Option<usize>) -> Self {
        self.cut_off = cut_off;
        self
    }
}

/// Split a window into n-grams of size `n`. Locked windows yield the
/// whole window once; windows shorter than `n` yield nothing when sliding.
pub fn window_ngrams(tokens: &[&str], n: usize, locked: bool) -> Vec<String> {
    if tokens.is_empty() || n == 0 {
        return Vec::new();
    }
    if locked {
        return vec![tokens.join(" ")];
    }
    tokens.windows(n).map(|w| w.join(" ")).collect()
}

#[derive(Default)]
struct NGramGroup {
    count: usize,
    documents: BTreeSet<String>,
}

/// Count n-grams over concordance windows.
///
/// `windows` must hold `left_<p>`, `node_<p>` and `right_<p>` columns;
/// a `speech_id` column, when present, feeds the document list.
pub fn count_ngrams(windows: &Frame, options: &NGramOptions) -> Result<Frame> {
    if options.n == 0 {
        return Err(SwedebError::query("n-gram size must be positive"));
    }
    if windows.is_empty() {
        return Ok(Frame::empty(NGRAM_COLUMNS));
    }

    let p = &options.p_show;
    let left = windows.values(&format!("left_{p}"))?;
    let node = windows.values(&format!("node_{p}"))?;
    let right = windows.values(&format!("right_{p}"))?;
    let documents = windows.values("speech_id").ok();

    let mut groups: HashMap<String, NGramGroup> = HashMap::new();
    for row in 0..windows.num_rows() {
        let text = [&left[row], &node[row], &right[row]]
            .iter()
            .map(|v| v.to_text())
            .collect::<Vec<_>>()
            .join(" ");
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let document = documents.as_ref().map(|d| d[row].to_text()).filter(|d| !d.is_empty());

        for ngram in window_ngrams(&tokens, options.n, options.mode.is_locked()) {
            let group = groups.entry(ngram).or_default();
            group.count += 1;
            if let Some(document) = &document {
                group.documents.insert(document.clone());
            }
        }
    }

    let mut rows: Vec<(String, NGramGroup)> = groups
        .into_iter()
        .filter(|(_, g)| options.threshold.is_none_or(|t| g.count >= t))
        .collect();
    rows.sort_by(|(a, ga), (b, gb)| gb.count.cmp(&ga.count).then_with(|| a.cmp(b)));
    debug!("{} distinct n-grams over {} windows", rows.len(), windows.num_rows());

    let mut ngrams = Vec::with_capacity(rows.len());
    let mut counts = Vec::with_capacity(rows.len());
    let mut docs = Vec::with_capacity(rows.len());
    for (ngram, group) in rows {
        ngrams.push(ColumnValue::Str(ngram));
        counts.push(ColumnValue::from(group.count));
        docs.push(ColumnValue::Str(
            group.documents.into_iter().collect::<Vec<_>>().join(","),
        ));
    }
    Frame::from_columns(vec![
        Column::new("ngram", DType::Str, ngrams),
        Column::new("window_count", DType::Int, counts),
        Column::new("documents", DType::Str, docs),
    ])
}

/// Compile `opts`, fetch windows around every hit and count n-grams.
pub fn n_grams(engine: &mut dyn CorpusEngine, opts: &[QueryOpts], options: &NGramOptions) -> Result<Frame> {
    let query = compile_expression(opts, options.within.as_deref())?;
    if engine.query(&query)? == 0 {
        return Ok(Frame::empty(NGRAM_COLUMNS));
    }

    let (left, right) = options.mode.context(options.n);
    let request = ConcordanceRequest::new(query)
        .with_p_show(vec![options.p_show.clone()])
        .with_s_show(vec!["speech_id".to_string()])
        .with_context(left, right)
        .with_cut_off(options.cut_off);
    let windows = engine.concordance(&request)?;
    count_ngrams(&windows, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn windows() -> Frame {
        Frame::from_rows(
            &["left_word", "node_word", "right_word", "speech_id"],
            vec![
                vec!["en".into(), "skola".into(), "för".into(), "s1".into()],
                vec!["en".into(), "skola".into(), "för".into(), "s2".into()],
                vec!["ny".into(), "skola".into(), "".into(), "s1".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_mode_context() {
        assert_eq!(NGramMode::Sliding.context(3), (2, 2));
        assert_eq!(NGramMode::LeftAligned.context(3), (0, 2));
        assert_eq!(NGramMode::RightAligned.context(3), (2, 0));
    }

    #[test]
    fn test_window_ngrams() {
        let tokens = ["a", "b", "c"];
        assert_eq!(window_ngrams(&tokens, 2, false), vec!["a b", "b c"]);
        assert_eq!(window_ngrams(&tokens, 2, true), vec!["a b c"]);
        assert!(window_ngrams(&tokens, 4, false).is_empty());
    }

    #[test]
    fn test_count_sliding() {
        let counted = count_ngrams(&windows(), &NGramOptions::new(2)).unwrap();
        assert_eq!(counted.column_names(), vec!["ngram", "window_count", "documents"]);
        assert_eq!(
            counted.values("ngram").unwrap(),
            &["en skola".into(), "skola för".into(), ColumnValue::from("ny skola")]
        );
        assert_eq!(
            counted.values("window_count").unwrap(),
            &[ColumnValue::Int(2), ColumnValue::Int(2), ColumnValue::Int(1)]
        );
        assert_eq!(counted.values("documents").unwrap()[0], ColumnValue::from("s1,s2"));
    }

    #[test]
    fn test_count_threshold_and_locked() {
        let options = NGramOptions::new(2).with_threshold(2);
        assert_eq!(count_ngrams(&windows(), &options).unwrap().num_rows(), 2);

        let locked = NGramOptions::new(2).with_mode(NGramMode::RightAligned);
        let counted = count_ngrams(&windows(), &locked).unwrap();
        assert_eq!(counted.values("ngram").unwrap()[0], ColumnValue::from("en skola för"));
    }

    #[test]
    fn test_empty_windows() {
        let counted = count_ngrams(&Frame::new(), &NGramOptions::default()).unwrap();
        assert!(counted.is_empty());
        assert_eq!(counted.num_columns(), NGRAM_COLUMNS.len());
    }
}
