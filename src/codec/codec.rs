//! A single categorical column mapping rule.

use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SwedebError};
use crate::frame::{Column, ColumnValue, Frame};

/// Key to value lookup table; keys are normalised with
/// [`ColumnValue::lookup_key`].
pub type LookupTable = AHashMap<ColumnValue, ColumnValue>;

/// Pure mapping function. A `Null` result counts as unmapped.
pub type MappingFn = Arc<dyn Fn(&ColumnValue) -> ColumnValue + Send + Sync>;

/// Mapping direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecDirection {
    /// name to id
    Encode,
    /// id to name
    Decode,
}

/// How a codec maps values.
#[derive(Clone)]
pub enum ValueMapping {
    Table(Arc<LookupTable>),
    Function(MappingFn),
}

impl ValueMapping {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&ColumnValue) -> ColumnValue + Send + Sync + 'static,
    {
        ValueMapping::Function(Arc::new(f))
    }

    /// Mapped value, `None` when unmapped.
    pub fn lookup(&self, value: &ColumnValue) -> Option<ColumnValue> {
        match self {
            ValueMapping::Table(table) => {
                if value.is_null() {
                    return None;
                }
                table.get(&value.lookup_key()).cloned()
            }
            ValueMapping::Function(f) => Some(f(value)).filter(|v| !v.is_null()),
        }
    }
}

impl fmt::Debug for ValueMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueMapping::Table(table) => write!(f, "Table({} entries)", table.len()),
            ValueMapping::Function(_) => write!(f, "Function"),
        }
    }
}

/// Maps `from_column` to `to_column` through a lookup table or function.
#[derive(Debug, Clone)]
pub struct Codec {
    table: Option<String>,
    direction: CodecDirection,
    from_column: String,
    to_column: String,
    mapping: ValueMapping,
    default: Option<ColumnValue>,
}

impl Codec {
    pub fn new<F: Into<String>, T: Into<String>>(
        direction: CodecDirection,
        from_column: F,
        to_column: T,
        mapping: ValueMapping,
    ) -> Result<Self> {
        let (from_column, to_column) = (from_column.into(), to_column.into());
        if from_column == to_column {
            return Err(SwedebError::codec(format!(
                "codec maps column '{from_column}' onto itself"
            )));
        }
        Ok(Codec {
            table: None,
            direction,
            from_column,
            to_column,
            mapping,
            default: None,
        })
    }

    pub fn with_table<S: Into<String>>(mut self, table: S) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_default(mut self, default: Option<ColumnValue>) -> Self {
        self.default = default;
        self
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn direction(&self) -> CodecDirection {
        self.direction
    }

    pub fn from_column(&self) -> &str {
        &self.from_column
    }

    pub fn to_column(&self) -> &str {
        &self.to_column
    }

    pub fn default_value(&self) -> Option<&ColumnValue> {
        self.default.as_ref()
    }

    pub fn mapping(&self) -> &ValueMapping {
        &self.mapping
    }

    /// True when the target column already exists.
    pub fn is_applied(&self, frame: &Frame) -> bool {
        frame.has_column(&self.to_column)
    }

    /// Derive `to_column` from `from_column`.
    ///
    /// Returns whether the frame was changed: nothing happens when the source
    /// column is absent, or when the target exists and `overwrite` is false.
    /// Unmapped values take the codec default, else null.
    pub fn apply(&self, frame: &mut Frame, overwrite: bool) -> Result<bool> {
        if !frame.has_column(&self.from_column) || (self.is_applied(frame) && !overwrite) {
            return Ok(false);
        }
        let values = frame
            .values(&self.from_column)?
            .iter()
            .map(|value| self.apply_scalar(value, None))
            .collect();
        frame.insert_column(Column::inferred(&self.to_column, values))?;
        Ok(true)
    }

    /// Map a single value; `default` overrides the codec's own default.
    pub fn apply_scalar(&self, value: &ColumnValue, default: Option<&ColumnValue>) -> ColumnValue {
        self.mapping
            .lookup(value)
            .or_else(|| default.or(self.default.as_ref()).cloned())
            .unwrap_or(ColumnValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gender_codec() -> Codec {
        let table: LookupTable = [
            (ColumnValue::Int(1), ColumnValue::from("man")),
            (ColumnValue::Int(2), ColumnValue::from("woman")),
        ]
        .into_iter()
        .collect();
        Codec::new(
            CodecDirection::Decode,
            "gender_id",
            "gender",
            ValueMapping::Table(Arc::new(table)),
        )
        .unwrap()
        .with_table("gender")
    }

    fn frame() -> Frame {
        Frame::from_rows(
            &["gender_id"],
            vec![vec![1.into()], vec!["2".into()], vec![9.into()]],
        )
        .unwrap()
    }

    #[test]
    fn test_identity_codec_rejected() {
        let result = Codec::new(
            CodecDirection::Decode,
            "gender_id",
            "gender_id",
            ValueMapping::function(|v| v.clone()),
        );
        assert!(matches!(result, Err(SwedebError::Codec(_))));
    }

    #[test]
    fn test_apply_maps_and_leaves_unmapped_null() {
        let mut frame = frame();
        assert!(gender_codec().apply(&mut frame, false).unwrap());
        assert_eq!(
            frame.values("gender").unwrap(),
            &["man".into(), "woman".into(), ColumnValue::Null]
        );
    }

    #[test]
    fn test_apply_uses_default() {
        let codec = gender_codec().with_default(Some("unknown".into()));
        let mut frame = frame();
        codec.apply(&mut frame, false).unwrap();
        assert_eq!(frame.values("gender").unwrap()[2], ColumnValue::from("unknown"));
    }

    #[test]
    fn test_apply_is_idempotent() {
        let codec = gender_codec();
        let mut once = frame();
        codec.apply(&mut once, false).unwrap();
        let mut twice = once.clone();
        assert!(!codec.apply(&mut twice, false).unwrap());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_apply_without_source_column_is_noop() {
        let mut frame = Frame::from_rows(&["party_id"], vec![vec![1.into()]]).unwrap();
        assert!(!gender_codec().apply(&mut frame, false).unwrap());
        assert!(!frame.has_column("gender"));
    }

    #[test]
    fn test_apply_scalar() {
        let codec = gender_codec();
        assert_eq!(codec.apply_scalar(&2.into(), None), ColumnValue::from("woman"));
        assert_eq!(
            codec.apply_scalar(&7.into(), Some(&"okänt".into())),
            ColumnValue::from("okänt")
        );
        assert_eq!(codec.apply_scalar(&7.into(), None), ColumnValue::Null);
    }

    #[test]
    fn test_function_mapping() {
        let codec = Codec::new(
            CodecDirection::Decode,
            "wiki_id",
            "link",
            ValueMapping::function(|v| match v.as_str() {
                Some(id) => format!("https://www.wikidata.org/wiki/{id}").into(),
                None => ColumnValue::Null,
            }),
        )
        .unwrap()
        .with_default(Some("Okänt".into()));
        assert_eq!(
            codec.apply_scalar(&"Q1".into(), None),
            ColumnValue::from("https://www.wikidata.org/wiki/Q1")
        );
        assert_eq!(codec.apply_scalar(&ColumnValue::Null, None), ColumnValue::from("Okänt"));
    }
}
