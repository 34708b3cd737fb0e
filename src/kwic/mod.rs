//! Keyword-in-context retrieval.
//!
//! [`kwic`] runs one composite query against one engine handle;
//! [`kwic_partitioned`] splits the year range over a worker pool, each
//! worker with its own handle, and merges the partial results in year order.

pub mod partitioned;
pub mod simple;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::frame::DType;

pub use self::partitioned::{YearPartitioner, kwic_partitioned};
pub use self::simple::kwic;

/// A result column and its declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayColumn {
    pub name: String,
    pub dtype: DType,
}

impl DisplayColumn {
    pub fn new<S: Into<String>>(name: S, dtype: DType) -> Self {
        DisplayColumn {
            name: name.into(),
            dtype,
        }
    }
}

/// Metadata columns shown after the context columns.
pub const DEFAULT_METADATA_COLUMNS: &[(&str, DType)] = &[
    ("year", DType::Int),
    ("name", DType::Str),
    ("party_abbrev", DType::Str),
    ("speech_name", DType::Str),
    ("gender", DType::Str),
    ("person_id", DType::Str),
    ("link", DType::Str),
    ("speech_link", DType::Str),
];

/// Structural attributes requested when hits are decoded directly.
pub const DEFAULT_S_SHOW: &[&str] = &[
    "year_year",
    "speech_id",
    "speech_who",
    "speech_title",
    "speech_party_id",
    "speech_gender_id",
    "speech_office_type_id",
    "speech_sub_office_type_id",
    "speech_chamber_id",
];

/// Options of a keyword-in-context request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KwicOptions {
    /// Tokens of context before the hit.
    pub words_before: usize,
    /// Tokens of context after the hit.
    pub words_after: usize,
    /// Positional attribute shown in the context columns.
    pub p_show: String,
    /// Structural attributes requested from the engine.
    pub s_show: Vec<String>,
    /// Maximum number of hits.
    pub cut_off: Option<usize>,
    /// Scope clause of the compiled query.
    pub within: Option<String>,
    /// Result columns; `None` means the context columns followed by
    /// [`DEFAULT_METADATA_COLUMNS`].
    pub display_columns: Option<Vec<DisplayColumn>>,
    /// Sort keys, `(column, ascending)`.
    pub sort_by: Vec<(String, bool)>,
    /// Casts applied to the renamed hit table.
    pub dtypes: HashMap<String, DType>,
    /// Renames applied on top of the engine attribute renames.
    pub renames: HashMap<String, String>,
}

impl Default for KwicOptions {
    fn default() -> Self {
        KwicOptions {
            words_before: 2,
            words_after: 2,
            p_show: "word".to_string(),
            s_show: DEFAULT_S_SHOW.iter().map(|s| s.to_string()).collect(),
            cut_off: Some(200_000),
            within: None,
            display_columns: None,
            sort_by: Vec::new(),
            dtypes: [("year", DType::Int)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            renames: HashMap::new(),
        }
    }
}

impl KwicOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(mut self, words_before: usize, words_after: usize) -> Self {
        self.words_before = words_before;
        self.words_after = words_after;
        self
    }

    pub fn with_p_show<S: Into<String>>(mut self, p_show: S) -> Self {
        self.p_show = p_show.into();
        self
    }

    pub fn with_s_show<S: Into<String>>(mut self, s_show: Vec<S>) -> Self {
        self.s_show = s_show.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cut_off(mut self, cut_off: Option<usize>) -> Self {
        self.cut_off = cut_off;
        self
    }

    pub fn with_within<S: Into<String>>(mut self, within: S) -> Self {
        self.within = Some(within.into());
        self
    }

    pub fn with_display_columns(mut self, columns: Vec<DisplayColumn>) -> Self {
        self.display_columns = Some(columns);
        self
    }

    pub fn with_sort_by<S: Into<String>>(mut self, column: S, ascending: bool) -> Self {
        self.sort_by.push((column.into(), ascending));
        self
    }

    pub fn with_dtype<S: Into<String>>(mut self, column: S, dtype: DType) -> Self {
        self.dtypes.insert(column.into(), dtype);
        self
    }

    pub fn with_rename<F: Into<String>, T: Into<String>>(mut self, from: F, to: T) -> Self {
        self.renames.insert(from.into(), to.into());
        self
    }

    pub fn context_columns(&self) -> [String; 3] {
        ["left", "node", "right"].map(|side| format!("{side}_{}", self.p_show))
    }

    /// The canonical result schema.
    pub fn display_schema(&self) -> Vec<DisplayColumn> {
        match &self.display_columns {
            Some(columns) => columns.clone(),
            None => self
                .context_columns()
                .into_iter()
                .map(|name| DisplayColumn::new(name, DType::Str))
                .chain(
                    DEFAULT_METADATA_COLUMNS
                        .iter()
                        .map(|(name, dtype)| DisplayColumn::new(*name, *dtype)),
                )
                .collect(),
        }
    }

    pub fn display_names(&self) -> Vec<String> {
        self.display_schema().into_iter().map(|c| c.name).collect()
    }
}
