//! Compiler input: query options and attribute criteria.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// The value side of a match or a criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptValue {
    /// A single literal.
    Scalar(String),
    /// Alternatives joined with `|`.
    List(Vec<String>),
    /// Inclusive integer range, compiled to a digit-class alternation.
    Interval(u32, u32),
}

impl OptValue {
    pub fn scalar<T: ToString>(value: T) -> Self {
        OptValue::Scalar(value.to_string())
    }

    pub fn list<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        OptValue::List(values.into_iter().map(|v| v.to_string()).collect())
    }

    pub fn interval(low: u32, high: u32) -> Self {
        OptValue::Interval(low, high)
    }

    /// Apply a transform to every literal; intervals are left untouched.
    pub fn map_literals<F: Fn(&str) -> String>(&self, f: F) -> Self {
        match self {
            OptValue::Scalar(v) => OptValue::Scalar(f(v)),
            OptValue::List(vs) => OptValue::List(vs.iter().map(|v| f(v)).collect()),
            OptValue::Interval(low, high) => OptValue::Interval(*low, *high),
        }
    }
}

impl From<&str> for OptValue {
    fn from(v: &str) -> Self {
        OptValue::Scalar(v.to_string())
    }
}

impl From<String> for OptValue {
    fn from(v: String) -> Self {
        OptValue::Scalar(v)
    }
}

impl From<i64> for OptValue {
    fn from(v: i64) -> Self {
        OptValue::Scalar(v.to_string())
    }
}

impl From<(u32, u32)> for OptValue {
    fn from((low, high): (u32, u32)) -> Self {
        OptValue::Interval(low, high)
    }
}

impl From<Vec<String>> for OptValue {
    fn from(v: Vec<String>) -> Self {
        OptValue::List(v)
    }
}

impl From<Vec<&str>> for OptValue {
    fn from(v: Vec<&str>) -> Self {
        OptValue::list(v)
    }
}

impl From<Vec<i64>> for OptValue {
    fn from(v: Vec<i64>) -> Self {
        OptValue::list(v)
    }
}

impl fmt::Display for OptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptValue::Scalar(v) => write!(f, "{v}"),
            OptValue::List(vs) => write!(f, "{}", vs.join("|")),
            OptValue::Interval(low, high) => write!(f, "{low}..{high}"),
        }
    }
}

impl Serialize for OptValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OptValue::Scalar(v) => serializer.serialize_str(v),
            OptValue::List(vs) => vs.serialize(serializer),
            OptValue::Interval(low, high) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("low", low)?;
                map.serialize_entry("high", high)?;
                map.end()
            }
        }
    }
}

fn json_literal(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Loose input is coerced to literals rather than rejected: arrays become
/// lists, `{"low", "high"}` objects become intervals and anything else is
/// rendered as a scalar string.
impl<'de> Deserialize<'de> for OptValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let opt = match &value {
            serde_json::Value::Null => return Err(de::Error::custom("value cannot be null")),
            serde_json::Value::Array(items) => OptValue::List(items.iter().map(json_literal).collect()),
            serde_json::Value::Object(object) => {
                let bound = |key: &str| {
                    object
                        .get(key)
                        .and_then(serde_json::Value::as_u64)
                        .and_then(|v| u32::try_from(v).ok())
                };
                match (bound("low"), bound("high")) {
                    (Some(low), Some(high)) if object.len() == 2 => OptValue::Interval(low, high),
                    _ => OptValue::Scalar(value.to_string()),
                }
            }
            other => OptValue::Scalar(json_literal(other)),
        };
        Ok(opt)
    }
}

fn default_ignore_case() -> bool {
    true
}

/// A structural attribute filter, e.g. `a.speech_party_id = 5|6`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criteria {
    /// `<prefix>.<attribute>`
    pub key: String,
    pub values: OptValue,
    #[serde(default)]
    pub ignore_case: bool,
}

impl Criteria {
    pub fn new<K: Into<String>, V: Into<OptValue>>(key: K, values: V) -> Self {
        Criteria {
            key: key.into(),
            values: values.into(),
            ignore_case: false,
        }
    }

    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }
}

/// One word-position constraint of a composite query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOpts {
    /// Scope tag the criteria bind to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Positional attribute (`word`, `lemma`), or the literal itself when
    /// no value is given.
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<OptValue>,
    #[serde(default = "default_ignore_case")]
    pub ignore_case: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub criterias: Vec<Criteria>,
}

impl Default for QueryOpts {
    fn default() -> Self {
        QueryOpts {
            prefix: None,
            target: None,
            value: None,
            ignore_case: true,
            criterias: Vec::new(),
        }
    }
}

impl QueryOpts {
    pub fn new<T: Into<String>>(target: T) -> Self {
        QueryOpts {
            target: Some(target.into()),
            ..Default::default()
        }
    }

    pub fn with_value<V: Into<OptValue>>(mut self, value: V) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_prefix<P: Into<String>>(mut self, prefix: P) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    pub fn with_criteria(mut self, criteria: Criteria) -> Self {
        self.criterias.push(criteria);
        self
    }

    pub fn with_criterias(mut self, criterias: Vec<Criteria>) -> Self {
        self.criterias.extend(criterias);
        self
    }

    /// Replace the values of every criteria with the given key, or add one.
    pub fn set_criteria<K: Into<String>>(&mut self, key: K, values: OptValue) {
        let key = key.into();
        match self.criterias.iter_mut().find(|c| c.key == key) {
            Some(criteria) => criteria.values = values,
            None => self.criterias.push(Criteria::new(key, values)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let opts = QueryOpts::new("word").with_value("skola");
        assert!(opts.ignore_case);
        assert!(opts.prefix.is_none());
        assert_eq!(opts.value, Some(OptValue::Scalar("skola".to_string())));
    }

    #[test]
    fn test_deserialize_coerces_loose_values() {
        let opts: QueryOpts = serde_json::from_str(
            r#"{"target": "word", "value": 42, "criterias": [
                {"key": "a.speech_party_id", "values": [5, "6"]},
                {"key": "a.year_year", "values": {"low": 1970, "high": 1980}}
            ]}"#,
        )
        .unwrap();

        assert_eq!(opts.value, Some(OptValue::Scalar("42".to_string())));
        assert!(opts.ignore_case);
        assert_eq!(opts.criterias[0].values, OptValue::list(["5", "6"]));
        assert_eq!(opts.criterias[1].values, OptValue::Interval(1970, 1980));
    }

    #[test]
    fn test_interval_serializes_as_bounds() {
        let json = serde_json::to_string(&OptValue::Interval(1970, 1980)).unwrap();
        assert_eq!(json, r#"{"low":1970,"high":1980}"#);
    }

    #[test]
    fn test_set_criteria_replaces_existing() {
        let mut opts = QueryOpts::new("word")
            .with_value("skola")
            .with_criteria(Criteria::new("a.year_year", (1900, 2000)));
        opts.set_criteria("a.year_year", OptValue::Interval(1950, 1959));
        assert_eq!(opts.criterias.len(), 1);
        assert_eq!(opts.criterias[0].values, OptValue::Interval(1950, 1959));
    }
}
