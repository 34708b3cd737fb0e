//! Maps service filter parameters onto query options.

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};

use crate::cqp::{Criteria, OptValue, QueryOpts};

/// First year covered by the corpus.
pub const EPOCH_YEAR: u32 = 1867;

pub const DEFAULT_PREFIX: &str = "a";
pub const DEFAULT_TARGET: &str = "word";

/// Filter parameters of a corpus request. Empty lists count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryParams {
    pub from_year: Option<u32>,
    pub to_year: Option<u32>,
    /// Speaker ids.
    pub who: Vec<String>,
    pub party_id: Vec<i64>,
    pub office_types: Vec<i64>,
    pub sub_office_types: Vec<i64>,
    pub gender_id: Vec<i64>,
    pub chamber_abbrev: Vec<String>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_years(mut self, from_year: Option<u32>, to_year: Option<u32>) -> Self {
        self.from_year = from_year;
        self.to_year = to_year;
        self
    }

    pub fn with_who<S: Into<String>>(mut self, who: Vec<S>) -> Self {
        self.who = who.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_party_id(mut self, party_id: Vec<i64>) -> Self {
        self.party_id = party_id;
        self
    }

    pub fn with_office_types(mut self, office_types: Vec<i64>) -> Self {
        self.office_types = office_types;
        self
    }

    pub fn with_sub_office_types(mut self, sub_office_types: Vec<i64>) -> Self {
        self.sub_office_types = sub_office_types;
        self
    }

    pub fn with_gender_id(mut self, gender_id: Vec<i64>) -> Self {
        self.gender_id = gender_id;
        self
    }

    pub fn with_chamber_abbrev<S: Into<String>>(mut self, chamber_abbrev: Vec<S>) -> Self {
        self.chamber_abbrev = chamber_abbrev.into_iter().map(Into::into).collect();
        self
    }

    /// The year range, when at least one bound is set.
    pub fn year_range(&self, epoch_year: u32, current_year: u32) -> Option<(u32, u32)> {
        match (self.from_year, self.to_year) {
            (None, None) => None,
            (low, high) => Some((low.unwrap_or(epoch_year), high.unwrap_or(current_year))),
        }
    }
}

/// A search word and the positional attribute it matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordTarget {
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl WordTarget {
    pub fn new<W: Into<String>>(word: W) -> Self {
        WordTarget {
            word: word.into(),
            target: None,
        }
    }

    pub fn with_target<T: Into<String>>(mut self, target: T) -> Self {
        self.target = Some(target.into());
        self
    }
}

impl From<&str> for WordTarget {
    fn from(word: &str) -> Self {
        WordTarget::new(word)
    }
}

impl From<String> for WordTarget {
    fn from(word: String) -> Self {
        WordTarget::new(word)
    }
}

impl From<(&str, &str)> for WordTarget {
    fn from((word, target): (&str, &str)) -> Self {
        WordTarget::new(word).with_target(target)
    }
}

/// Builds criteria and query options from [`QueryParams`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMapper {
    prefix: String,
    default_target: String,
    epoch_year: u32,
    current_year: Option<u32>,
    ignore_case: bool,
}

impl Default for QueryMapper {
    fn default() -> Self {
        QueryMapper {
            prefix: DEFAULT_PREFIX.to_string(),
            default_target: DEFAULT_TARGET.to_string(),
            epoch_year: EPOCH_YEAR,
            current_year: None,
            ignore_case: true,
        }
    }
}

impl QueryMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_default_target<S: Into<String>>(mut self, target: S) -> Self {
        self.default_target = target.into();
        self
    }

    pub fn with_epoch_year(mut self, epoch_year: u32) -> Self {
        self.epoch_year = epoch_year;
        self
    }

    /// Pin the open upper year bound instead of using today's year.
    pub fn with_current_year(mut self, current_year: u32) -> Self {
        self.current_year = Some(current_year);
        self
    }

    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn current_year(&self) -> u32 {
        self.current_year
            .unwrap_or_else(|| u32::try_from(Local::now().year()).unwrap_or(self.epoch_year))
    }

    fn key(&self, attribute: &str) -> String {
        format!("{}.{attribute}", self.prefix)
    }

    /// Criteria in fixed field order: years, speakers, party, office type,
    /// sub office type, gender, chamber.
    pub fn params_to_criterias(&self, params: &QueryParams) -> Vec<Criteria> {
        let mut criterias = Vec::new();

        if let Some((low, high)) = params.year_range(self.epoch_year, self.current_year()) {
            criterias.push(Criteria::new(self.key("year_year"), OptValue::interval(low, high)));
        }

        let lists: [(&str, OptValue); 5] = [
            ("speech_who", OptValue::list(&params.who)),
            ("speech_party_id", OptValue::from(params.party_id.clone())),
            ("speech_office_type_id", OptValue::from(params.office_types.clone())),
            ("speech_sub_office_type_id", OptValue::from(params.sub_office_types.clone())),
            ("speech_gender_id", OptValue::from(params.gender_id.clone())),
        ];
        for (attribute, values) in lists {
            if !is_unset(&values) {
                criterias.push(Criteria::new(self.key(attribute), values));
            }
        }

        if !params.chamber_abbrev.is_empty() {
            let chambers = OptValue::list(&params.chamber_abbrev).map_literals(|c| c.to_lowercase());
            criterias.push(Criteria::new(self.key("speech_chamber_abbrev"), chambers));
        }

        criterias
    }

    /// One option per word; only the first carries the scope prefix and the
    /// criteria.
    pub fn params_to_query_opts<W>(&self, params: &QueryParams, words: &[W]) -> Vec<QueryOpts>
    where
        W: Clone + Into<WordTarget>,
    {
        words
            .iter()
            .enumerate()
            .map(|(i, word)| {
                let word: WordTarget = word.clone().into();
                let target = word.target.unwrap_or_else(|| self.default_target.clone());
                let opts = QueryOpts::new(target)
                    .with_value(word.word)
                    .with_ignore_case(self.ignore_case);
                if i == 0 {
                    opts.with_prefix(self.prefix.as_str())
                        .with_criterias(self.params_to_criterias(params))
                } else {
                    opts
                }
            })
            .collect()
    }
}

fn is_unset(values: &OptValue) -> bool {
    matches!(values, OptValue::List(v) if v.is_empty())
}

/// [`QueryMapper::params_to_criterias`] with the default mapper.
pub fn params_to_criterias(params: &QueryParams) -> Vec<Criteria> {
    QueryMapper::default().params_to_criterias(params)
}

/// [`QueryMapper::params_to_query_opts`] with the default mapper.
pub fn params_to_query_opts<W>(params: &QueryParams, words: &[W]) -> Vec<QueryOpts>
where
    W: Clone + Into<WordTarget>,
{
    QueryMapper::default().params_to_query_opts(params, words)
}
