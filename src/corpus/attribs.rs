//! Corpus attribute descriptions and engine column naming.
//!
//! The engine names structural attributes `<scope>_<attribute>`
//! (`speech_who`, `year_year`, `speech_party_id`). Callers see domain names
//! instead: a few fixed renames, otherwise the scope prefix is stripped.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SwedebError};

lazy_static! {
    static ref ATTRIBUTE_LINE: Regex =
        Regex::new(r"^\s*([ps])-ATT\s+([A-Za-z0-9_]+)(\s+-V)?\s*$").expect("valid attribute regex");
    static ref FIXED_RENAMES: HashMap<&'static str, &'static str> = [
        ("speech_who", "person_id"),
        ("speech_id", "speech_id"),
        ("speech_title", "speech_name"),
        ("speech_date", "date"),
    ]
    .into_iter()
    .collect();
}

/// A structural attribute such as `speech_who`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralAttribute {
    /// Engine name, e.g. `speech_party_id`.
    pub id: String,
    /// Enclosing structural unit, e.g. `speech`.
    pub tag: String,
    /// Attribute name within the unit, `None` for the bare region.
    pub name: Option<String>,
    /// Whether the attribute carries annotated values.
    pub has_values: bool,
}

/// The positional and structural attributes of a corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusAttribs {
    positional: Vec<String>,
    structural: Vec<StructuralAttribute>,
}

impl CorpusAttribs {
    pub fn new(positional: Vec<String>, structural_ids: Vec<String>) -> Self {
        let mut attribs = CorpusAttribs {
            positional,
            structural: Vec::new(),
        };
        for id in structural_ids {
            attribs.push_structural(id, true);
        }
        attribs
    }

    /// Parse an attribute listing (`p-ATT word`, `s-ATT speech_who -V`).
    pub fn parse(listing: &str) -> Result<Self> {
        let mut attribs = CorpusAttribs::default();
        for line in listing.lines().filter(|l| !l.trim().is_empty()) {
            let captures = ATTRIBUTE_LINE
                .captures(line)
                .ok_or_else(|| SwedebError::engine(format!("unrecognised attribute line: {line}")))?;
            let name = captures[2].to_string();
            match &captures[1] {
                "p" => attribs.positional.push(name),
                _ => attribs.push_structural(name, captures.get(3).is_some()),
            }
        }
        Ok(attribs)
    }

    fn push_structural(&mut self, id: String, has_values: bool) {
        let (tag, name) = match id.split_once('_') {
            Some((tag, name)) => (tag.to_string(), Some(name.to_string())),
            None => (id.clone(), None),
        };
        self.structural.push(StructuralAttribute {
            id,
            tag,
            name,
            has_values,
        });
    }

    pub fn positional_attributes(&self) -> &[String] {
        &self.positional
    }

    pub fn structural_attributes(&self) -> &[StructuralAttribute] {
        &self.structural
    }

    pub fn has_positional(&self, name: &str) -> bool {
        self.positional.iter().any(|p| p == name)
    }

    pub fn has_structural(&self, id: &str) -> bool {
        self.structural.iter().any(|s| s.id == id)
    }

    /// Distinct structural units, in declaration order.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = Vec::new();
        for attribute in &self.structural {
            if !tags.contains(&attribute.tag.as_str()) {
                tags.push(&attribute.tag);
            }
        }
        tags
    }

    /// Engine column name to domain column name.
    pub fn column_renames(&self) -> HashMap<String, String> {
        let mut renames = HashMap::new();
        let mut taken: Vec<String> = Vec::new();
        for attribute in self.structural.iter().filter(|a| a.has_values) {
            let target = match (FIXED_RENAMES.get(attribute.id.as_str()), &attribute.name) {
                (Some(fixed), _) => fixed.to_string(),
                (None, Some(name)) => name.clone(),
                (None, None) => continue,
            };
            // first declaration wins when two units share an attribute name
            if taken.contains(&target) {
                continue;
            }
            taken.push(target.clone());
            if target != attribute.id {
                renames.insert(attribute.id.clone(), target);
            }
        }
        renames
    }

    /// Domain name of a single engine column.
    pub fn domain_name(&self, column: &str) -> String {
        self.column_renames()
            .remove(column)
            .unwrap_or_else(|| column.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
p-ATT word
p-ATT lemma
p-ATT pos
s-ATT speech
s-ATT speech_id -V
s-ATT speech_who -V
s-ATT speech_party_id -V
s-ATT speech_gender_id -V
s-ATT year_year -V
";

    #[test]
    fn test_parse_listing() {
        let attribs = CorpusAttribs::parse(LISTING).unwrap();
        assert_eq!(attribs.positional_attributes(), &["word", "lemma", "pos"]);
        assert_eq!(attribs.structural_attributes().len(), 6);
        assert_eq!(attribs.tags(), vec!["speech", "year"]);
        assert!(attribs.has_structural("speech_who"));
        assert!(!attribs.structural_attributes()[0].has_values);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(CorpusAttribs::parse("x-ATT word").is_err());
    }

    #[test]
    fn test_column_renames() {
        let attribs = CorpusAttribs::parse(LISTING).unwrap();
        let renames = attribs.column_renames();
        assert_eq!(renames["speech_who"], "person_id");
        assert_eq!(renames["year_year"], "year");
        assert_eq!(renames["speech_party_id"], "party_id");
        assert!(!renames.contains_key("speech_id"));
        assert_eq!(attribs.domain_name("speech_gender_id"), "gender_id");
        assert_eq!(attribs.domain_name("left_word"), "left_word");
    }
}
