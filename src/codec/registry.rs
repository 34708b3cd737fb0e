//! Registry of code tables and the codecs derived from them.
//!
//! Lifecycle: `Unloaded -> Loading -> Loaded`. [`Codecs::load`] takes
//! `&mut self`, so concurrent loads are ruled out by the borrow checker; the
//! loaded registry is then shared read-only (typically behind an `Arc`). The
//! only state mutated after load is the mapping cache, which is guarded by a
//! read-write lock.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::codec::codec::{Codec, CodecDirection, LookupTable, ValueMapping};
use crate::codec::source::CodecSource;
use crate::codec::specification::CodecSpecification;
use crate::error::{Result, SwedebError};
use crate::frame::{ColumnValue, DType, Frame};

/// A loaded code table keyed by its primary key column.
#[derive(Debug, Clone)]
pub struct CodeTable {
    name: String,
    key: String,
    frame: Frame,
}

impl CodeTable {
    /// A table without rows may also lack columns, as an empty JSON array
    /// does; it gets an untyped key column instead of being rejected.
    pub fn new<N: Into<String>, K: Into<String>>(name: N, key: K, frame: Frame) -> Result<Self> {
        let (name, key) = (name.into(), key.into());
        if frame.is_empty() && !frame.has_column(&key) {
            warn!("code table '{name}' is empty");
            let frame = Frame::empty(&[(key.as_str(), DType::Any)]);
            return Ok(CodeTable { name, key, frame });
        }
        if !frame.has_column(&key) {
            return Err(SwedebError::missing_source(format!(
                "table '{name}' has no key column '{key}'"
            )));
        }
        Ok(CodeTable { name, key, frame })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    pub fn len(&self) -> usize {
        self.frame.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.has_column(name)
    }

    /// Row index of a primary key value.
    pub fn find_row(&self, key: &ColumnValue) -> Option<usize> {
        let key = key.lookup_key();
        self.frame
            .values(&self.key)
            .ok()?
            .iter()
            .position(|k| k.lookup_key() == key)
    }

    /// Project `from -> to`; first occurrence wins and null cells are skipped.
    /// An empty table maps nothing, whatever columns it declares.
    pub fn lookup(&self, from: &str, to: &str) -> Result<LookupTable> {
        if self.frame.is_empty() {
            return Ok(LookupTable::default());
        }
        let keys = self.frame.values(from)?;
        let values = self.frame.values(to)?;
        let mut table = LookupTable::with_capacity(keys.len());
        for (key, value) in keys.iter().zip(values) {
            if key.is_null() || value.is_null() {
                continue;
            }
            table.entry(key.lookup_key()).or_insert(value);
        }
        Ok(table)
    }
}

/// Invert a lookup table; on collisions the smallest source key wins.
pub fn invert(table: &LookupTable) -> LookupTable {
    let mut inverted = LookupTable::with_capacity(table.len());
    for (key, value) in table.iter().filter(|(_, v)| !v.is_null()) {
        inverted
            .entry(value.lookup_key())
            .and_modify(|current: &mut ColumnValue| {
                if key.total_cmp(current) == Ordering::Less {
                    *current = key.clone();
                }
            })
            .or_insert_with(|| key.clone());
    }
    inverted
}

/// Hook run after the tables are loaded and before codecs are derived.
pub trait OnLoadHook: Send + Sync {
    fn name(&self) -> &str;

    fn execute(&self, codecs: &mut Codecs) -> Result<()>;
}

/// Registry lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
}

/// Controls for [`Codecs::decode`] and [`Codecs::encode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeOptions {
    /// Drop consumed source columns.
    pub drop: bool,
    /// Source columns kept even when `drop` is set.
    pub keeps: Vec<String>,
    /// Target columns that are not derived.
    pub ignores: Vec<String>,
    /// Restrict to codecs reading these source columns; empty means all.
    pub only: Vec<String>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            drop: true,
            keeps: Vec::new(),
            ignores: Vec::new(),
            only: Vec::new(),
        }
    }
}

impl DecodeOptions {
    pub fn keep_all() -> Self {
        DecodeOptions {
            drop: false,
            ..Default::default()
        }
    }

    pub fn keep<S: Into<String>>(mut self, column: S) -> Self {
        self.keeps.push(column.into());
        self
    }

    pub fn ignore<S: Into<String>>(mut self, column: S) -> Self {
        self.ignores.push(column.into());
        self
    }

    pub fn only<S: Into<String>>(mut self, column: S) -> Self {
        self.only.push(column.into());
        self
    }
}

/// One enumerable id/name pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyValue {
    pub id: ColumnValue,
    pub name: ColumnValue,
}

/// A categorical domain with its values, ordered by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyValues {
    pub id_name: String,
    pub text_name: String,
    pub values: Vec<PropertyValue>,
}

type MappingKey = (String, String);

/// Named code tables plus the codecs declared over them.
#[derive(Debug)]
pub struct Codecs {
    specification: CodecSpecification,
    extra_codecs: Vec<Codec>,
    store: HashMap<String, CodeTable>,
    codecs: Vec<Codec>,
    mappings: RwLock<HashMap<MappingKey, Arc<LookupTable>>>,
    state: LoadState,
}

impl Codecs {
    pub fn new(specification: CodecSpecification) -> Self {
        Codecs {
            specification,
            extra_codecs: Vec::new(),
            store: HashMap::new(),
            codecs: Vec::new(),
            mappings: RwLock::new(HashMap::new()),
            state: LoadState::Unloaded,
        }
    }

    /// Codecs appended after the declared ones, e.g. function mappings.
    pub fn with_extra_codecs(mut self, codecs: Vec<Codec>) -> Self {
        self.extra_codecs.extend(codecs);
        self
    }

    pub fn specification(&self) -> &CodecSpecification {
        &self.specification
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    /// Load the declared tables and derive the codecs.
    pub fn load<S: Into<CodecSource>>(&mut self, source: S) -> Result<&mut Self> {
        self.load_with_hooks(source.into(), &[])?;
        Ok(self)
    }

    pub(crate) fn load_with_hooks(
        &mut self,
        source: CodecSource,
        hooks: &[Box<dyn OnLoadHook>],
    ) -> Result<()> {
        info!("loading code tables from {}", source.describe());
        self.state = LoadState::Loading;
        match self.load_tables_and_codecs(source, hooks) {
            Ok(()) => {
                self.state = LoadState::Loaded;
                info!(
                    "loaded {} code tables, {} codecs",
                    self.store.len(),
                    self.codecs.len()
                );
                Ok(())
            }
            Err(e) => {
                self.store.clear();
                self.codecs.clear();
                self.mappings.write().clear();
                self.state = LoadState::Unloaded;
                Err(e)
            }
        }
    }

    fn load_tables_and_codecs(
        &mut self,
        source: CodecSource,
        hooks: &[Box<dyn OnLoadHook>],
    ) -> Result<()> {
        let mut tables = source.load_tables(&self.specification.table_names())?;

        self.store.clear();
        self.codecs.clear();
        self.mappings.write().clear();

        for spec in &self.specification.code_tables {
            let frame = tables
                .remove(&spec.name)
                .ok_or_else(|| SwedebError::not_found(format!("table '{}'", spec.name)))?;
            self.store.insert(
                spec.name.clone(),
                CodeTable::new(&spec.name, &spec.key, frame)?,
            );
        }

        for hook in hooks {
            debug!("running on-load hook '{}'", hook.name());
            hook.execute(self)?;
        }

        self.codecs = self.build_codecs()?;
        Ok(())
    }

    fn build_codecs(&self) -> Result<Vec<Codec>> {
        let mut codecs: Vec<Codec> = Vec::with_capacity(self.specification.codecs.len());
        for spec in &self.specification.codecs {
            let mapping = self.mapping_from_table(&spec.table, &spec.from_column, &spec.to_column)?;
            let codec = Codec::new(
                spec.direction,
                &spec.from_column,
                &spec.to_column,
                ValueMapping::Table(mapping),
            )?
            .with_table(&spec.table)
            .with_default(spec.default.clone());
            codecs.push(codec);
        }
        codecs.extend(self.extra_codecs.iter().cloned());

        for (i, codec) in codecs.iter().enumerate() {
            if codecs[..i]
                .iter()
                .any(|c| c.direction() == codec.direction() && c.to_column() == codec.to_column())
            {
                return Err(SwedebError::codec(format!(
                    "more than one codec derives column '{}'",
                    codec.to_column()
                )));
            }
        }
        Ok(codecs)
    }

    fn ensure_loaded(&self) -> Result<()> {
        match self.state {
            LoadState::Unloaded => Err(SwedebError::codec("code tables are not loaded")),
            _ => Ok(()),
        }
    }

    pub fn codecs(&self) -> &[Codec] {
        &self.codecs
    }

    pub fn decoders(&self) -> impl Iterator<Item = &Codec> {
        self.codecs
            .iter()
            .filter(|c| c.direction() == CodecDirection::Decode)
    }

    pub fn encoders(&self) -> impl Iterator<Item = &Codec> {
        self.codecs
            .iter()
            .filter(|c| c.direction() == CodecDirection::Encode)
    }

    /// Codec for an exact column pair.
    pub fn codec(&self, from: &str, to: &str) -> Option<&Codec> {
        self.codecs
            .iter()
            .find(|c| c.from_column() == from && c.to_column() == to)
    }

    pub fn table(&self, name: &str) -> Option<&CodeTable> {
        self.store.get(name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut CodeTable> {
        self.store.get_mut(name)
    }

    /// Loaded table names in declaration order.
    pub fn table_names(&self) -> Vec<&str> {
        self.specification
            .table_names()
            .into_iter()
            .filter(|name| self.store.contains_key(*name))
            .collect()
    }

    fn mapping_from_table(&self, table: &str, from: &str, to: &str) -> Result<Arc<LookupTable>> {
        let key = (from.to_string(), to.to_string());
        if let Some(mapping) = self.mappings.read().get(&key) {
            return Ok(Arc::clone(mapping));
        }

        let code_table = self
            .store
            .get(table)
            .ok_or_else(|| SwedebError::codec(format!("table '{table}' is not loaded")))?;
        let forward = Arc::new(code_table.lookup(from, to)?);
        let reverse = Arc::new(invert(&forward));
        debug!("resolved mapping {from} -> {to} from table '{table}'");

        let mut mappings = self.mappings.write();
        let forward = Arc::clone(mappings.entry(key).or_insert(forward));
        mappings
            .entry((to.to_string(), from.to_string()))
            .or_insert(reverse);
        Ok(forward)
    }

    /// Resolve the lookup table for `from -> to`.
    ///
    /// Cached pairs are returned directly; a cached reverse pair is inverted.
    /// Otherwise the declared table for the pair is used, falling back to
    /// the first loaded table holding both columns.
    pub fn get_mapping(&self, from: &str, to: &str) -> Result<Arc<LookupTable>> {
        if from == to {
            return Err(SwedebError::codec(format!(
                "identity mapping requested for column '{from}'"
            )));
        }
        self.ensure_loaded()?;

        if let Some(mapping) = self.mappings.read().get(&(from.to_string(), to.to_string())) {
            return Ok(Arc::clone(mapping));
        }

        let reversed = self
            .mappings
            .read()
            .get(&(to.to_string(), from.to_string()))
            .cloned();
        if let Some(reversed) = reversed {
            let inverted = Arc::new(invert(&reversed));
            let mut mappings = self.mappings.write();
            let mapping = mappings
                .entry((from.to_string(), to.to_string()))
                .or_insert(inverted);
            return Ok(Arc::clone(mapping));
        }

        let table = match self.specification.table_for(from, to) {
            Some(table) => table.to_string(),
            None => self
                .table_names()
                .into_iter()
                .find(|name| {
                    self.store
                        .get(*name)
                        .is_some_and(|t| t.has_column(from) && t.has_column(to))
                })
                .map(str::to_string)
                .ok_or_else(|| {
                    SwedebError::codec(format!("no table maps '{from}' to '{to}'"))
                })?,
        };
        self.mapping_from_table(&table, from, to)
    }

    fn apply_direction(
        &self,
        mut frame: Frame,
        direction: CodecDirection,
        options: &DecodeOptions,
    ) -> Result<Frame> {
        self.ensure_loaded()?;
        let mut consumed: Vec<&str> = Vec::new();
        for codec in self.codecs.iter().filter(|c| c.direction() == direction) {
            if options.ignores.iter().any(|c| c == codec.to_column()) {
                continue;
            }
            if !options.only.is_empty() && !options.only.iter().any(|c| c == codec.from_column()) {
                continue;
            }
            codec.apply(&mut frame, false)?;
            if frame.has_column(codec.from_column()) && !consumed.contains(&codec.from_column()) {
                consumed.push(codec.from_column());
            }
        }

        if options.drop {
            consumed.retain(|c| !options.keeps.iter().any(|k| k == c));
            frame.drop_columns(&consumed)?;
        }
        Ok(frame)
    }

    /// Apply every decode codec, in declaration order.
    pub fn decode(&self, frame: Frame, options: &DecodeOptions) -> Result<Frame> {
        self.apply_direction(frame, CodecDirection::Decode, options)
    }

    /// Apply every encode codec, in declaration order.
    pub fn encode(&self, frame: Frame, options: &DecodeOptions) -> Result<Frame> {
        self.apply_direction(frame, CodecDirection::Encode, options)
    }

    /// Decode a single value; unmapped values yield `default` or `"unknown"`.
    pub fn decode_any_id(
        &self,
        from: &str,
        value: &ColumnValue,
        to: &str,
        default: Option<ColumnValue>,
    ) -> Result<ColumnValue> {
        let mapping = self.get_mapping(from, to)?;
        Ok(mapping
            .get(&value.lookup_key())
            .cloned()
            .or(default)
            .unwrap_or_else(|| ColumnValue::from("unknown")))
    }

    /// The enumerable categorical domains, values ordered by id.
    pub fn property_values_specs(&self) -> Result<Vec<PropertyValues>> {
        self.specification
            .properties
            .iter()
            .map(|property| {
                let mapping = self.get_mapping(&property.id_name, &property.text_name)?;
                let mut values: Vec<PropertyValue> = mapping
                    .iter()
                    .map(|(id, name)| PropertyValue {
                        id: id.clone(),
                        name: name.clone(),
                    })
                    .collect();
                values.sort_by(|a, b| a.id.total_cmp(&b.id));
                Ok(PropertyValues {
                    id_name: property.id_name.clone(),
                    text_name: property.text_name.clone(),
                    values,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::specification::{CodeTableSpec, CodecSpec, PropertySpec};

    fn specification() -> CodecSpecification {
        CodecSpecification {
            code_tables: vec![
                CodeTableSpec::new("gender", "gender_id"),
                CodeTableSpec::new("party", "party_id"),
            ],
            codecs: vec![
                CodecSpec::decode("gender", "gender_id", "gender").with_default("unknown"),
                CodecSpec::decode("party", "party_id", "party_abbrev"),
                CodecSpec::encode("gender", "gender", "gender_id"),
            ],
            properties: vec![PropertySpec {
                id_name: "party_id".to_string(),
                text_name: "party_abbrev".to_string(),
            }],
        }
    }

    fn tables() -> HashMap<String, Frame> {
        let gender = Frame::from_rows(
            &["gender_id", "gender", "gender_abbrev"],
            vec![
                vec![0.into(), "unknown".into(), "U".into()],
                vec![1.into(), "man".into(), "M".into()],
                vec![2.into(), "woman".into(), "K".into()],
            ],
        )
        .unwrap();
        let party = Frame::from_rows(
            &["party_id", "party_abbrev", "party"],
            vec![
                vec![6.into(), "M".into(), "Moderaterna".into()],
                vec![5.into(), "S".into(), "Socialdemokraterna".into()],
            ],
        )
        .unwrap();
        [("gender".to_string(), gender), ("party".to_string(), party)]
            .into_iter()
            .collect()
    }

    fn loaded() -> Codecs {
        let mut codecs = Codecs::new(specification());
        codecs.load(tables()).unwrap();
        codecs
    }

    fn speeches() -> Frame {
        Frame::from_rows(
            &["speech_id", "gender_id", "party_id"],
            vec![
                vec!["s1".into(), 1.into(), 5.into()],
                vec!["s2".into(), 2.into(), 6.into()],
                vec!["s3".into(), 7.into(), 5.into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_load_lifecycle() {
        let mut codecs = Codecs::new(specification());
        assert_eq!(codecs.state(), LoadState::Unloaded);
        assert!(codecs.decode(speeches(), &DecodeOptions::default()).is_err());

        codecs.load(tables()).unwrap();
        assert!(codecs.is_loaded());
        assert_eq!(codecs.table_names(), vec!["gender", "party"]);
        assert_eq!(codecs.table("party").unwrap().len(), 2);
        assert_eq!(codecs.codecs().len(), 3);
    }

    #[test]
    fn test_empty_table_without_columns() {
        let table = CodeTable::new("government", "government_id", Frame::new()).unwrap();
        assert!(table.is_empty());
        assert!(table.has_column("government_id"));
        assert!(table.lookup("government_id", "government").unwrap().is_empty());
        assert_eq!(table.find_row(&1.into()), None);

        let keyless = Frame::from_rows(&["name"], vec![vec!["x".into()]]).unwrap();
        assert!(matches!(
            CodeTable::new("government", "government_id", keyless),
            Err(SwedebError::Source(_))
        ));
    }

    #[test]
    fn test_load_missing_table_fails() {
        let mut tables = tables();
        tables.remove("party");
        let mut codecs = Codecs::new(specification());
        assert!(codecs.load(tables).is_err());
        assert_eq!(codecs.state(), LoadState::Unloaded);
    }

    #[test]
    fn test_get_mapping_rejects_identity_and_unknown_pairs() {
        let codecs = loaded();
        assert!(matches!(
            codecs.get_mapping("gender_id", "gender_id"),
            Err(SwedebError::Codec(_))
        ));
        assert!(matches!(
            codecs.get_mapping("gender_id", "party"),
            Err(SwedebError::Codec(_))
        ));
    }

    #[test]
    fn test_get_mapping_discovers_undeclared_pairs() {
        let codecs = loaded();
        let mapping = codecs.get_mapping("gender_abbrev", "gender").unwrap();
        assert_eq!(mapping.get(&"K".into()), Some(&ColumnValue::from("woman")));
    }

    #[test]
    fn test_mapping_inversion_consistency() {
        let codecs = loaded();
        let forward = codecs.get_mapping("party_id", "party").unwrap();
        let backward = codecs.get_mapping("party", "party_id").unwrap();
        assert_eq!(invert(&forward), *backward);

        let fresh = loaded();
        let backward_first = fresh.get_mapping("party", "party_id").unwrap();
        let forward_second = fresh.get_mapping("party_id", "party").unwrap();
        assert_eq!(invert(&forward_second), *backward_first);
        assert_eq!(*forward_second, *forward);
    }

    #[test]
    fn test_decode_drops_consumed_columns() {
        let codecs = loaded();
        let decoded = codecs.decode(speeches(), &DecodeOptions::default()).unwrap();
        assert_eq!(decoded.column_names(), vec!["speech_id", "gender", "party_abbrev"]);
        assert_eq!(
            decoded.values("gender").unwrap(),
            &["man".into(), "woman".into(), ColumnValue::from("unknown")]
        );
    }

    #[test]
    fn test_decode_keeps_and_ignores() {
        let codecs = loaded();
        let options = DecodeOptions::default().keep("party_id").ignore("gender");
        let decoded = codecs.decode(speeches(), &options).unwrap();
        assert_eq!(
            decoded.column_names(),
            vec!["speech_id", "gender_id", "party_id", "party_abbrev"]
        );
    }

    #[test]
    fn test_decode_is_idempotent() {
        let codecs = loaded();
        let once = codecs.decode(speeches(), &DecodeOptions::default()).unwrap();
        let twice = codecs.decode(once.clone(), &DecodeOptions::default()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_decode_then_encode_recovers_ids() {
        let codecs = loaded();
        let original = speeches().select(&["speech_id", "gender_id"]).unwrap().head(2);
        let decoded = codecs.decode(original.clone(), &DecodeOptions::default()).unwrap();
        let encoded = codecs.encode(decoded, &DecodeOptions::default()).unwrap();
        assert_eq!(
            encoded.values("gender_id").unwrap(),
            original.values("gender_id").unwrap()
        );
    }

    #[test]
    fn test_decode_any_id() {
        let codecs = loaded();
        assert_eq!(
            codecs.decode_any_id("party_id", &"5".into(), "party", None).unwrap(),
            ColumnValue::from("Socialdemokraterna")
        );
        assert_eq!(
            codecs.decode_any_id("party_id", &99.into(), "party", None).unwrap(),
            ColumnValue::from("unknown")
        );
    }

    #[test]
    fn test_property_values_specs() {
        let codecs = loaded();
        let specs = codecs.property_values_specs().unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].values[0].id, ColumnValue::Int(5));
        assert_eq!(specs[0].values[0].name, ColumnValue::from("S"));
    }

    #[test]
    fn test_duplicate_codec_target_rejected() {
        let mut specification = specification();
        specification
            .codecs
            .push(CodecSpec::decode("gender", "gender_abbrev", "gender"));
        let mut codecs = Codecs::new(specification);
        assert!(matches!(codecs.load(tables()), Err(SwedebError::Codec(_))));
    }
}
