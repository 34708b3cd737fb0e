//! Codecs over the speaker roster.

use std::ops::Deref;

use ahash::AHashMap;
use log::warn;

use crate::codec::codec::{Codec, CodecDirection, ValueMapping};
use crate::codec::registry::{CodeTable, Codecs, OnLoadHook};
use crate::codec::source::CodecSource;
use crate::codec::specification::CodecSpecification;
use crate::error::{Result, SwedebError};
use crate::frame::{Column, ColumnValue, DType, Frame};

pub const PERSONS_OF_INTEREST: &str = "persons_of_interest";
pub const PERSON_PARTY: &str = "person_party";

pub const WIKIDATA_BASE_URL: &str = "https://www.wikidata.org/wiki/";
pub const DEFAULT_SPEECH_BASE_URL: &str = "https://data.riksdagen.se/dokument/";

/// Shown in place of a link when the target is unknown.
pub const UNKNOWN_LINK: &str = "Okänt";

/// Party abbreviation shown for persons without any resolved party.
pub const UNKNOWN_PARTY: &str = "?";

fn is_known(value: &ColumnValue) -> Option<&str> {
    value
        .as_str()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "unknown")
}

/// Wikidata link for a `wiki_id`, `Okänt` when unknown.
pub fn wiki_link(wiki_id: &ColumnValue) -> ColumnValue {
    match is_known(wiki_id) {
        Some(id) => ColumnValue::Str(format!("{WIKIDATA_BASE_URL}{id}")),
        None => ColumnValue::from(UNKNOWN_LINK),
    }
}

/// Function codecs deriving `link` and `speech_link`.
pub fn link_codecs(speech_base_url: &str) -> Result<Vec<Codec>> {
    let base = speech_base_url.to_string();
    Ok(vec![
        Codec::new(
            CodecDirection::Decode,
            "wiki_id",
            "link",
            ValueMapping::function(|v| match is_known(v) {
                Some(_) => wiki_link(v),
                None => ColumnValue::Null,
            }),
        )?
        .with_default(Some(UNKNOWN_LINK.into())),
        Codec::new(
            CodecDirection::Decode,
            "speech_name",
            "speech_link",
            ValueMapping::function(move |v| match v.as_str() {
                Some(name) if !name.is_empty() => ColumnValue::Str(format!("{base}{name}")),
                _ => ColumnValue::Null,
            }),
        )?,
    ])
}

/// Derives a `party_abbrev` column on the roster from the person/party
/// membership table: the sorted, distinct abbreviations joined by `", "`,
/// or `"?"` when none resolve.
#[derive(Debug, Default, Clone, Copy)]
pub struct MultiplePartyAbbrevsHook;

impl OnLoadHook for MultiplePartyAbbrevsHook {
    fn name(&self) -> &str {
        "multiple_party_abbrevs"
    }

    fn execute(&self, codecs: &mut Codecs) -> Result<()> {
        let persons = codecs
            .table(PERSONS_OF_INTEREST)
            .ok_or_else(|| SwedebError::not_found(format!("table '{PERSONS_OF_INTEREST}'")))?;
        if persons.has_column("party_abbrev") {
            return Ok(());
        }
        let memberships = codecs
            .table(PERSON_PARTY)
            .ok_or_else(|| SwedebError::not_found(format!("table '{PERSON_PARTY}'")))?
            .frame();
        let abbrevs = codecs.get_mapping("party_id", "party_abbrev")?;

        let mut by_person: AHashMap<ColumnValue, Vec<String>> = AHashMap::new();
        let mut unresolved = 0usize;
        for (person_id, party_id) in memberships
            .values("person_id")?
            .iter()
            .zip(memberships.values("party_id")?)
        {
            match abbrevs.get(&party_id.lookup_key()) {
                Some(abbrev) => by_person
                    .entry(person_id.lookup_key())
                    .or_default()
                    .push(abbrev.to_text()),
                None if !party_id.is_null() => unresolved += 1,
                None => {}
            }
        }
        if unresolved > 0 {
            warn!("{unresolved} party memberships reference unknown party ids");
        }

        let values: Vec<ColumnValue> = persons
            .frame()
            .values("person_id")?
            .iter()
            .map(|person_id| match by_person.get_mut(&person_id.lookup_key()) {
                Some(parties) => {
                    parties.sort();
                    parties.dedup();
                    ColumnValue::Str(parties.join(", "))
                }
                None => ColumnValue::from(UNKNOWN_PARTY),
            })
            .collect();

        codecs
            .table_mut(PERSONS_OF_INTEREST)
            .ok_or_else(|| SwedebError::not_found(format!("table '{PERSONS_OF_INTEREST}'")))?
            .frame_mut()
            .insert_column(Column::new("party_abbrev", DType::Str, values))
    }
}

/// [`Codecs`] over the person roster, with on-load hooks and link codecs.
pub struct PersonCodecs {
    codecs: Codecs,
    hooks: Vec<Box<dyn OnLoadHook>>,
}

impl PersonCodecs {
    pub fn new(specification: CodecSpecification) -> Result<Self> {
        Self::with_speech_base_url(specification, DEFAULT_SPEECH_BASE_URL)
    }

    pub fn with_speech_base_url(specification: CodecSpecification, base_url: &str) -> Result<Self> {
        if specification.table(PERSONS_OF_INTEREST).is_none() {
            return Err(SwedebError::invalid_config(format!(
                "person codecs require a '{PERSONS_OF_INTEREST}' table"
            )));
        }
        Ok(PersonCodecs {
            codecs: Codecs::new(specification).with_extra_codecs(link_codecs(base_url)?),
            hooks: vec![Box::new(MultiplePartyAbbrevsHook)],
        })
    }

    /// Replace the on-load hooks; they run in the given order.
    pub fn with_hooks(mut self, hooks: Vec<Box<dyn OnLoadHook>>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn hook_names(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    pub fn load<S: Into<CodecSource>>(&mut self, source: S) -> Result<&mut Self> {
        self.codecs.load_with_hooks(source.into(), &self.hooks)?;
        Ok(self)
    }

    pub fn codecs(&self) -> &Codecs {
        &self.codecs
    }

    pub fn persons_of_interest(&self) -> Result<&CodeTable> {
        self.codecs
            .table(PERSONS_OF_INTEREST)
            .ok_or_else(|| SwedebError::codec("person roster is not loaded"))
    }

    /// The roster row of one person as a single-row frame.
    pub fn person(&self, person_id: &str) -> Result<Frame> {
        let persons = self.persons_of_interest()?;
        let row = persons
            .find_row(&ColumnValue::from(person_id))
            .ok_or_else(|| SwedebError::not_found(format!("person '{person_id}'")))?;
        Ok(persons.frame().slice(row, 1))
    }

    pub fn person_wiki_link(&self, person_id: &str) -> Result<ColumnValue> {
        let person = self.person(person_id)?;
        let wiki_id = match person.values("wiki_id") {
            Ok(values) => values.first().cloned().unwrap_or_default(),
            Err(_) => ColumnValue::Null,
        };
        Ok(wiki_link(&wiki_id))
    }
}

impl Deref for PersonCodecs {
    type Target = Codecs;

    fn deref(&self) -> &Self::Target {
        &self.codecs
    }
}
