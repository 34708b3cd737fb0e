//! Declarative codec specification.
//!
//! Which table backs which column pair is configuration, not code: the
//! specification is deserialized from the service configuration and the
//! registry derives its codecs from it at load time.

use serde::{Deserialize, Serialize};

use crate::codec::codec::CodecDirection;
use crate::frame::ColumnValue;

/// A code table and its primary key column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeTableSpec {
    pub name: String,
    pub key: String,
}

impl CodeTableSpec {
    pub fn new<N: Into<String>, K: Into<String>>(name: N, key: K) -> Self {
        CodeTableSpec {
            name: name.into(),
            key: key.into(),
        }
    }
}

/// One declared codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecSpec {
    pub table: String,
    pub direction: CodecDirection,
    pub from_column: String,
    pub to_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ColumnValue>,
}

impl CodecSpec {
    pub fn decode<T: Into<String>, F: Into<String>, C: Into<String>>(table: T, from: F, to: C) -> Self {
        CodecSpec {
            table: table.into(),
            direction: CodecDirection::Decode,
            from_column: from.into(),
            to_column: to.into(),
            default: None,
        }
    }

    pub fn encode<T: Into<String>, F: Into<String>, C: Into<String>>(table: T, from: F, to: C) -> Self {
        CodecSpec {
            direction: CodecDirection::Encode,
            ..CodecSpec::decode(table, from, to)
        }
    }

    pub fn with_default<V: Into<ColumnValue>>(mut self, default: V) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Whether this declaration covers the pair in either direction.
    pub fn covers(&self, from: &str, to: &str) -> bool {
        (self.from_column == from && self.to_column == to)
            || (self.from_column == to && self.to_column == from)
    }
}

/// A categorical domain exposed for enumeration (id column, text column).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySpec {
    pub id_name: String,
    pub text_name: String,
}

/// Code tables, codecs and enumerable properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodecSpecification {
    pub code_tables: Vec<CodeTableSpec>,
    pub codecs: Vec<CodecSpec>,
    #[serde(default)]
    pub properties: Vec<PropertySpec>,
}

impl CodecSpecification {
    pub fn table_names(&self) -> Vec<&str> {
        self.code_tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn table(&self, name: &str) -> Option<&CodeTableSpec> {
        self.code_tables.iter().find(|t| t.name == name)
    }

    /// Declared table for a column pair, in either direction.
    pub fn table_for(&self, from: &str, to: &str) -> Option<&str> {
        self.codecs
            .iter()
            .find(|c| c.covers(from, to))
            .map(|c| c.table.as_str())
    }

    /// The categorical code tables of the parliamentary corpus.
    pub fn riksprot() -> Self {
        let code_tables = [
            ("chamber", "chamber_id"),
            ("gender", "gender_id"),
            ("government", "government_id"),
            ("office_type", "office_type_id"),
            ("party", "party_id"),
            ("sub_office_type", "sub_office_type_id"),
        ]
        .into_iter()
        .map(|(name, key)| CodeTableSpec::new(name, key))
        .collect();

        let codecs = vec![
            CodecSpec::decode("gender", "gender_id", "gender").with_default("unknown"),
            CodecSpec::decode("gender", "gender_id", "gender_abbrev"),
            CodecSpec::decode("office_type", "office_type_id", "office_type").with_default("unknown"),
            CodecSpec::decode("sub_office_type", "sub_office_type_id", "sub_office_type")
                .with_default("unknown"),
            CodecSpec::decode("party", "party_id", "party_abbrev").with_default("?"),
            CodecSpec::decode("party", "party_id", "party"),
            CodecSpec::decode("chamber", "chamber_id", "chamber_abbrev"),
            CodecSpec::decode("government", "government_id", "government"),
            CodecSpec::encode("gender", "gender", "gender_id"),
            CodecSpec::encode("party", "party_abbrev", "party_id"),
            CodecSpec::encode("chamber", "chamber_abbrev", "chamber_id"),
            CodecSpec::encode("office_type", "office_type", "office_type_id"),
            CodecSpec::encode("sub_office_type", "sub_office_type", "sub_office_type_id"),
        ];

        let properties = [
            ("gender_id", "gender"),
            ("office_type_id", "office_type"),
            ("party_id", "party_abbrev"),
            ("sub_office_type_id", "sub_office_type"),
            ("chamber_id", "chamber_abbrev"),
        ]
        .into_iter()
        .map(|(id_name, text_name)| PropertySpec {
            id_name: id_name.to_string(),
            text_name: text_name.to_string(),
        })
        .collect();

        CodecSpecification {
            code_tables,
            codecs,
            properties,
        }
    }

    /// [`riksprot`](Self::riksprot) plus the person roster tables.
    pub fn riksprot_persons() -> Self {
        let mut specification = CodecSpecification::riksprot();
        specification
            .code_tables
            .push(CodeTableSpec::new("persons_of_interest", "person_id"));
        specification
            .code_tables
            .push(CodeTableSpec::new("person_party", "person_party_id"));
        specification.codecs.extend([
            CodecSpec::decode("persons_of_interest", "person_id", "name").with_default("unknown"),
            CodecSpec::decode("persons_of_interest", "person_id", "wiki_id"),
        ]);
        specification
    }
}
