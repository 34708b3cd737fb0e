//! Column store used between the corpus engine and the caller.
//!
//! The engine hands back concordance rows, the codec registry reads its code
//! tables and the pipelines reshape both. All of that flows through
//! [`Frame`], a thin wrapper over an Arrow [`RecordBatch`]: casts go through
//! `arrow-cast`, concatenation, filtering and row selection through
//! `arrow-select`, and sorting through `arrow-ord`. Cells are read back as
//! [`ColumnValue`]s, which is also the key type of the codec lookup tables.
//!
//! # Examples
//!
//! ```
//! use swedeb::frame::{ColumnValue, DType, Frame};
//!
//! let mut frame = Frame::empty(&[("gender_id", DType::Int)]);
//! assert_eq!(frame.num_rows(), 0);
//!
//! frame = Frame::from_rows(
//!     &["gender_id", "gender"],
//!     vec![vec![1.into(), "man".into()], vec![2.into(), "woman".into()]],
//! )
//! .unwrap();
//! assert_eq!(frame.values("gender").unwrap()[1], ColumnValue::from("woman"));
//! ```

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;
use arrow_array::cast::AsArray;
use arrow_array::types::{Float64Type, Int64Type};
use arrow_array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int64Array, NullArray, RecordBatch,
    RecordBatchOptions, StringArray, UInt64Array, new_null_array,
};
use arrow_cast::CastOptions;
use arrow_ord::sort::{SortColumn, lexsort_to_indices};
use arrow_schema::{DataType, Field, Schema, SchemaRef, SortOptions};
use arrow_select::concat::concat_batches;
use arrow_select::filter::filter_record_batch;
use arrow_select::take::{take, take_record_batch};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SwedebError};

/// Column data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Int,
    Float,
    Str,
    Bool,
    /// Untyped; the column holds only nulls.
    Any,
}

impl DType {
    /// Arrow type backing columns of this type.
    pub fn data_type(self) -> DataType {
        match self {
            DType::Int => DataType::Int64,
            DType::Float => DataType::Float64,
            DType::Str => DataType::Utf8,
            DType::Bool => DataType::Boolean,
            DType::Any => DataType::Null,
        }
    }

    /// Closest type for an Arrow type; anything without a numeric or boolean
    /// reading is treated as text.
    pub fn of(data_type: &DataType) -> DType {
        match data_type {
            DataType::Null => DType::Any,
            DataType::Boolean => DType::Bool,
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => DType::Int,
            DataType::Float16 | DataType::Float32 | DataType::Float64 => DType::Float,
            DataType::Decimal128(_, _) | DataType::Decimal256(_, _) => DType::Float,
            _ => DType::Str,
        }
    }

    /// Common type of two columns being stacked.
    fn widen(self, other: DType) -> DType {
        match (self, other) {
            (a, b) if a == b => a,
            (DType::Any, other) | (other, DType::Any) => other,
            (DType::Int, DType::Float) | (DType::Float, DType::Int) => DType::Float,
            _ => DType::Str,
        }
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum ColumnValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Eq for ColumnValue {}

impl std::hash::Hash for ColumnValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            ColumnValue::Null => 255u8.hash(state),
            ColumnValue::Bool(v) => {
                0u8.hash(state);
                v.hash(state);
            }
            ColumnValue::Int(v) => {
                1u8.hash(state);
                v.hash(state);
            }
            ColumnValue::Float(v) => {
                2u8.hash(state);
                v.to_bits().hash(state);
            }
            ColumnValue::Str(s) => {
                3u8.hash(state);
                s.hash(state);
            }
        }
    }
}

impl ColumnValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }

    pub fn dtype(&self) -> DType {
        match self {
            ColumnValue::Null => DType::Any,
            ColumnValue::Bool(_) => DType::Bool,
            ColumnValue::Int(_) => DType::Int,
            ColumnValue::Float(_) => DType::Float,
            ColumnValue::Str(_) => DType::Str,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ColumnValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view; integral floats and numeric strings qualify.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ColumnValue::Int(v) => Some(*v),
            ColumnValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            ColumnValue::Str(s) => s.trim().parse().ok(),
            ColumnValue::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ColumnValue::Int(v) => Some(*v as f64),
            ColumnValue::Float(v) => Some(*v),
            ColumnValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            ColumnValue::Null => None,
            ColumnValue::Bool(b) => Some(*b),
            ColumnValue::Str(s) => match s.to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            other => other.as_i64().map(|v| v != 0),
        }
    }

    /// Plain text rendering, empty for nulls.
    pub fn to_text(&self) -> String {
        match self {
            ColumnValue::Null => String::new(),
            ColumnValue::Bool(b) => b.to_string(),
            ColumnValue::Int(v) => v.to_string(),
            ColumnValue::Float(v) => v.to_string(),
            ColumnValue::Str(s) => s.clone(),
        }
    }

    /// Normalised key used by lookup tables.
    ///
    /// Ids arrive as integers from the code tables, as strings from CSV
    /// sources and the engine, and sometimes as floats after a null-aware
    /// cast. All of them collapse to `Int` so they hit the same entry.
    pub fn lookup_key(&self) -> ColumnValue {
        match self {
            ColumnValue::Str(s) => match s.trim().parse::<i64>() {
                Ok(v) => ColumnValue::Int(v),
                Err(_) => self.clone(),
            },
            ColumnValue::Float(v) if v.fract() == 0.0 => ColumnValue::Int(*v as i64),
            _ => self.clone(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            ColumnValue::Bool(_) => 0,
            ColumnValue::Int(_) | ColumnValue::Float(_) => 1,
            ColumnValue::Str(_) => 2,
            ColumnValue::Null => 3,
        }
    }

    /// Total order across value kinds; nulls sort last.
    pub fn total_cmp(&self, other: &ColumnValue) -> Ordering {
        match (self, other) {
            (ColumnValue::Int(a), ColumnValue::Int(b)) => a.cmp(b),
            (ColumnValue::Bool(a), ColumnValue::Bool(b)) => a.cmp(b),
            (ColumnValue::Str(a), ColumnValue::Str(b)) => a.cmp(b),
            (a, b) if a.rank() == 1 && b.rank() == 1 => {
                let (x, y) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
                x.total_cmp(&y)
            }
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

impl From<&str> for ColumnValue {
    fn from(v: &str) -> Self {
        ColumnValue::Str(v.to_string())
    }
}

impl From<String> for ColumnValue {
    fn from(v: String) -> Self {
        ColumnValue::Str(v)
    }
}

impl From<i64> for ColumnValue {
    fn from(v: i64) -> Self {
        ColumnValue::Int(v)
    }
}

impl From<i32> for ColumnValue {
    fn from(v: i32) -> Self {
        ColumnValue::Int(v as i64)
    }
}

impl From<usize> for ColumnValue {
    fn from(v: usize) -> Self {
        ColumnValue::Int(v as i64)
    }
}

impl From<f64> for ColumnValue {
    fn from(v: f64) -> Self {
        ColumnValue::Float(v)
    }
}

impl From<bool> for ColumnValue {
    fn from(v: bool) -> Self {
        ColumnValue::Bool(v)
    }
}

impl<T: Into<ColumnValue>> From<Option<T>> for ColumnValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(ColumnValue::Null, Into::into)
    }
}

impl From<&serde_json::Value> for ColumnValue {
    fn from(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => ColumnValue::Null,
            serde_json::Value::Bool(b) => ColumnValue::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => ColumnValue::Int(i),
                None => n.as_f64().map_or(ColumnValue::Null, ColumnValue::Float),
            },
            serde_json::Value::String(s) => ColumnValue::Str(s.clone()),
            other => ColumnValue::Str(other.to_string()),
        }
    }
}

/// Infer a column type from its values; mixed kinds fall back to text.
fn infer_dtype(values: &[ColumnValue]) -> DType {
    values
        .iter()
        .filter(|v| !v.is_null())
        .fold(DType::Any, |dtype, value| dtype.widen(value.dtype()))
}

/// Build an Arrow array of `dtype`; values that do not convert become null.
fn build_array(dtype: DType, values: &[ColumnValue]) -> ArrayRef {
    let dtype = match dtype {
        DType::Any => infer_dtype(values),
        dtype => dtype,
    };
    match dtype {
        DType::Int => Arc::new(values.iter().map(ColumnValue::as_i64).collect::<Int64Array>()),
        DType::Float => Arc::new(values.iter().map(ColumnValue::as_f64).collect::<Float64Array>()),
        DType::Bool => Arc::new(values.iter().map(ColumnValue::as_bool).collect::<BooleanArray>()),
        DType::Str => Arc::new(
            values
                .iter()
                .map(|v| (!v.is_null()).then(|| v.to_text()))
                .collect::<StringArray>(),
        ),
        DType::Any => Arc::new(NullArray::new(values.len())),
    }
}

fn cast_options() -> CastOptions<'static> {
    CastOptions {
        safe: true,
        format_options: Default::default(),
    }
}

/// Cast to `dtype`; impossible conversions yield nulls. `Any` keeps the array.
fn cast_array(array: &ArrayRef, dtype: DType) -> Result<ArrayRef> {
    let target = dtype.data_type();
    if dtype == DType::Any || array.data_type() == &target {
        return Ok(Arc::clone(array));
    }
    Ok(arrow_cast::cast_with_options(array, &target, &cast_options())?)
}

/// Read an array back as cells.
fn array_values(array: &ArrayRef) -> Result<Vec<ColumnValue>> {
    let array = cast_array(array, DType::of(array.data_type()))?;
    let values = match array.data_type() {
        DataType::Int64 => array.as_primitive::<Int64Type>().iter().map(ColumnValue::from).collect(),
        DataType::Float64 => array.as_primitive::<Float64Type>().iter().map(ColumnValue::from).collect(),
        DataType::Boolean => array.as_boolean().iter().map(ColumnValue::from).collect(),
        DataType::Utf8 => array.as_string::<i32>().iter().map(ColumnValue::from).collect(),
        _ => vec![ColumnValue::Null; array.len()],
    };
    Ok(values)
}

/// Owned column data, converted to an Arrow array when it enters a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub dtype: DType,
    pub values: Vec<ColumnValue>,
}

impl Column {
    pub fn new<S: Into<String>>(name: S, dtype: DType, values: Vec<ColumnValue>) -> Self {
        Column {
            name: name.into(),
            dtype,
            values,
        }
    }

    /// Create a column whose type is inferred from its values.
    pub fn inferred<S: Into<String>>(name: S, values: Vec<ColumnValue>) -> Self {
        let dtype = infer_dtype(&values);
        Column::new(name, dtype, values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn into_array(self) -> (String, ArrayRef) {
        let array = build_array(self.dtype, &self.values);
        (self.name, array)
    }
}

/// Ordered set of equal-length, named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    batch: RecordBatch,
}

impl Default for Frame {
    fn default() -> Self {
        Frame::new()
    }
}

impl Frame {
    /// Create a frame without columns.
    pub fn new() -> Self {
        Frame {
            batch: RecordBatch::new_empty(Arc::new(Schema::empty())),
        }
    }

    /// Create a zero-row frame with the given schema.
    pub fn empty<S: AsRef<str>>(schema: &[(S, DType)]) -> Self {
        let fields: Vec<Field> = schema
            .iter()
            .map(|(name, dtype)| Field::new(name.as_ref(), dtype.data_type(), true))
            .collect();
        Frame {
            batch: RecordBatch::new_empty(Arc::new(Schema::new(fields))),
        }
    }

    fn from_arrays(arrays: Vec<(String, ArrayRef)>, num_rows: usize) -> Result<Self> {
        let fields: Vec<Field> = arrays
            .iter()
            .map(|(name, array)| Field::new(name, array.data_type().clone(), true))
            .collect();
        let columns = arrays.into_iter().map(|(_, array)| array).collect();
        let batch = RecordBatch::try_new_with_options(
            Arc::new(Schema::new(fields)),
            columns,
            &RecordBatchOptions::new().with_row_count(Some(num_rows)),
        )?;
        Ok(Frame { batch })
    }

    fn named_arrays(&self) -> Vec<(String, ArrayRef)> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .zip(self.batch.columns())
            .map(|(field, array)| (field.name().clone(), Arc::clone(array)))
            .collect()
    }

    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(SwedebError::column(format!(
                    "duplicate column '{}'",
                    column.name
                )));
            }
        }
        let num_rows = columns.first().map_or(0, Column::len);
        if let Some(bad) = columns.iter().find(|c| c.len() != num_rows) {
            return Err(SwedebError::column(format!(
                "column '{}' has {} rows, expected {num_rows}",
                bad.name,
                bad.len(),
            )));
        }
        Frame::from_arrays(columns.into_iter().map(Column::into_array).collect(), num_rows)
    }

    /// Build a frame from row-major data, inferring column types.
    pub fn from_rows<S: AsRef<str>>(names: &[S], rows: Vec<Vec<ColumnValue>>) -> Result<Self> {
        let mut data: Vec<Vec<ColumnValue>> = vec![Vec::with_capacity(rows.len()); names.len()];
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(SwedebError::column(format!(
                    "row {i} has {} values, expected {}",
                    row.len(),
                    names.len()
                )));
            }
            for (column, value) in data.iter_mut().zip(row) {
                column.push(value);
            }
        }
        Frame::from_columns(
            names
                .iter()
                .zip(data)
                .map(|(name, values)| Column::inferred(name.as_ref(), values))
                .collect(),
        )
    }

    /// Build a frame from JSON objects.
    ///
    /// Every key seen in any object becomes a column; columns are ordered by
    /// key name. Missing keys read as null.
    pub fn from_json_records(records: &[serde_json::Value]) -> Result<Self> {
        let mut names: BTreeSet<&str> = BTreeSet::new();
        for record in records {
            let object = record
                .as_object()
                .ok_or_else(|| SwedebError::column("expected a JSON object per row"))?;
            names.extend(object.keys().map(String::as_str));
        }
        let names: Vec<&str> = names.into_iter().collect();
        let rows = records
            .iter()
            .map(|record| {
                names
                    .iter()
                    .map(|name| record.get(*name).map_or(ColumnValue::Null, ColumnValue::from))
                    .collect()
            })
            .collect();
        Frame::from_rows(&names, rows)
    }

    /// The underlying Arrow batch.
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// True when the frame holds no rows.
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.batch.column_by_name(name).is_some()
    }

    fn array(&self, name: &str) -> Result<&ArrayRef> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| SwedebError::column(format!("no column named '{name}'")))
    }

    /// Cells of the named column.
    pub fn values(&self, name: &str) -> Result<Vec<ColumnValue>> {
        array_values(self.array(name)?)
    }

    pub fn dtype(&self, name: &str) -> Option<DType> {
        self.batch
            .column_by_name(name)
            .map(|array| DType::of(array.data_type()))
    }

    /// Insert a column, replacing (in place) any column with the same name.
    pub fn insert_column(&mut self, column: Column) -> Result<()> {
        if self.num_columns() > 0 && column.len() != self.num_rows() {
            return Err(SwedebError::column(format!(
                "column '{}' has {} rows, frame has {}",
                column.name,
                column.len(),
                self.num_rows()
            )));
        }
        let num_rows = column.len();
        let (name, array) = column.into_array();
        let mut arrays = self.named_arrays();
        match arrays.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = array,
            None => arrays.push((name, array)),
        }
        *self = Frame::from_arrays(arrays, num_rows)?;
        Ok(())
    }

    /// Drop the named columns; names not present are skipped.
    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        let keep: Vec<usize> = self
            .column_names()
            .iter()
            .enumerate()
            .filter(|(_, column)| !names.iter().any(|name| name.as_ref() == **column))
            .map(|(i, _)| i)
            .collect();
        self.batch = self.batch.project(&keep)?;
        Ok(())
    }

    /// Rename columns in place, keeping their position.
    pub fn rename_columns(&mut self, renames: &HashMap<String, String>) -> Result<()> {
        let num_rows = self.num_rows();
        let arrays = self
            .named_arrays()
            .into_iter()
            .map(|(name, array)| match renames.get(&name) {
                Some(target) => (target.clone(), array),
                None => (name, array),
            })
            .collect();
        *self = Frame::from_arrays(arrays, num_rows)?;
        Ok(())
    }

    /// Project to the given columns, in the given order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Frame> {
        let schema = self.batch.schema_ref();
        let indices = names
            .iter()
            .map(|name| {
                schema.index_of(name.as_ref()).map_err(|_| {
                    SwedebError::column(format!("no column named '{}'", name.as_ref()))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Frame {
            batch: self.batch.project(&indices)?,
        })
    }

    /// Project onto a typed schema. Present columns are cast to their
    /// declared type; absent ones are filled with nulls.
    pub fn project<S: AsRef<str>>(&self, schema: &[(S, DType)]) -> Result<Frame> {
        let arrays = schema
            .iter()
            .map(|(name, dtype)| {
                let array = match self.batch.column_by_name(name.as_ref()) {
                    Some(array) => cast_array(array, *dtype)?,
                    None => new_null_array(&dtype.data_type(), self.num_rows()),
                };
                Ok((name.as_ref().to_string(), array))
            })
            .collect::<Result<Vec<_>>>()?;
        Frame::from_arrays(arrays, self.num_rows())
    }

    pub fn cast_column(&mut self, name: &str, dtype: DType) -> Result<()> {
        let cast = cast_array(self.array(name)?, dtype)?;
        let num_rows = self.num_rows();
        let arrays = self
            .named_arrays()
            .into_iter()
            .map(|(column, array)| {
                let array = if column == name { Arc::clone(&cast) } else { array };
                (column, array)
            })
            .collect();
        *self = Frame::from_arrays(arrays, num_rows)?;
        Ok(())
    }

    /// Cast every listed column that is present.
    pub fn cast_columns(&mut self, dtypes: &HashMap<String, DType>) -> Result<()> {
        for (name, dtype) in dtypes {
            if self.has_column(name) {
                self.cast_column(name, *dtype)?;
            }
        }
        Ok(())
    }

    /// Inner join on a shared column.
    ///
    /// Keys are matched on their [`ColumnValue::lookup_key`], so `"5"` meets
    /// `5`. Rows of `self` without a match in `other` are dropped. Columns of
    /// `other` whose name already exists in `self` are not carried over.
    pub fn inner_join(&self, other: &Frame, on: &str) -> Result<Frame> {
        let left_keys = self.values(on)?;
        let right_keys = other.values(on)?;

        let mut index: AHashMap<ColumnValue, Vec<u64>> = AHashMap::new();
        for (row, key) in right_keys.iter().enumerate() {
            if !key.is_null() {
                index.entry(key.lookup_key()).or_default().push(row as u64);
            }
        }

        let mut left_rows: Vec<u64> = Vec::new();
        let mut right_rows: Vec<u64> = Vec::new();
        for (left_row, key) in left_keys.iter().enumerate() {
            if let Some(rows) = index.get(&key.lookup_key()) {
                left_rows.extend(std::iter::repeat_n(left_row as u64, rows.len()));
                right_rows.extend(rows);
            }
        }
        let (left_rows, right_rows) = (UInt64Array::from(left_rows), UInt64Array::from(right_rows));

        let mut arrays = Vec::with_capacity(self.num_columns() + other.num_columns());
        for (name, array) in self.named_arrays() {
            arrays.push((name, take(&array, &left_rows, None)?));
        }
        for (name, array) in other.named_arrays() {
            if !self.has_column(&name) {
                arrays.push((name, take(&array, &right_rows, None)?));
            }
        }
        Frame::from_arrays(arrays, left_rows.len())
    }

    /// Stable multi-key sort. Nulls go last ascending and first descending.
    pub fn sort_by<S: AsRef<str>>(&mut self, keys: &[(S, bool)]) -> Result<()> {
        let mut columns = Vec::with_capacity(keys.len() + 1);
        for (name, ascending) in keys {
            let values = self.array(name.as_ref())?;
            // an all-null column has nothing to order by
            if values.data_type() == &DataType::Null {
                continue;
            }
            columns.push(SortColumn {
                values: Arc::clone(values),
                options: Some(SortOptions {
                    descending: !ascending,
                    nulls_first: !ascending,
                }),
            });
        }
        // row position breaks ties
        columns.push(SortColumn {
            values: Arc::new(UInt64Array::from_iter_values(0..self.num_rows() as u64)),
            options: None,
        });
        let indices = lexsort_to_indices(&columns, None)?;
        self.batch = take_record_batch(&self.batch, &indices)?;
        Ok(())
    }

    /// Keep rows whose mask entry is true.
    pub fn retain_rows(&mut self, mask: &[bool]) -> Result<()> {
        if mask.len() != self.num_rows() {
            return Err(SwedebError::column(format!(
                "mask has {} entries, frame has {} rows",
                mask.len(),
                self.num_rows()
            )));
        }
        self.batch = filter_record_batch(&self.batch, &BooleanArray::from(mask.to_vec()))?;
        Ok(())
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Frame {
        self.slice(0, n)
    }

    /// Rows `offset..offset + limit`, clamped to the frame.
    pub fn slice(&self, offset: usize, limit: usize) -> Frame {
        let start = offset.min(self.num_rows());
        let end = start.saturating_add(limit).min(self.num_rows());
        Frame {
            batch: self.batch.slice(start, end - start),
        }
    }

    /// Concatenate frames row-wise, preserving input order.
    ///
    /// All frames must share the column names of the first one. A column
    /// whose type differs between frames is widened: integers and floats to
    /// float, anything else to text. Zero-row frames only decide a type when
    /// no frame has rows.
    pub fn concat(frames: Vec<Frame>) -> Result<Frame> {
        let Some(first) = frames.first() else {
            return Ok(Frame::new());
        };
        let names: Vec<String> = first.column_names().into_iter().map(str::to_string).collect();
        if names.is_empty() {
            return Ok(first.clone());
        }

        let mut selected = Vec::with_capacity(frames.len());
        for frame in &frames {
            if frame.num_columns() != names.len() {
                return Err(SwedebError::column(
                    "cannot concatenate frames with different columns",
                ));
            }
            selected.push(frame.select(&names)?);
        }

        let widen = |name: &str, filled: bool| {
            selected
                .iter()
                .filter(|f| f.is_empty() != filled)
                .filter_map(|f| f.dtype(name))
                .fold(DType::Any, DType::widen)
        };
        let schema: Vec<(&str, DType)> = names
            .iter()
            .map(|name| match widen(name, true) {
                DType::Any => (name.as_str(), widen(name, false)),
                dtype => (name.as_str(), dtype),
            })
            .collect();

        let batches = selected
            .iter()
            .map(|frame| frame.project(&schema).map(|f| f.batch))
            .collect::<Result<Vec<_>>>()?;
        let target: SchemaRef = batches[0].schema();
        Ok(Frame {
            batch: concat_batches(&target, &batches)?,
        })
    }

    /// Row `row` as (name, value) pairs.
    pub fn row(&self, row: usize) -> Option<Vec<(&str, ColumnValue)>> {
        if row >= self.num_rows() {
            return None;
        }
        let cells = self.slice(row, 1);
        self.column_names()
            .into_iter()
            .map(|name| {
                let value = cells.values(name).ok()?.into_iter().next()?;
                Some((name, value))
            })
            .collect()
    }

    /// JSON-serialisable rows.
    pub fn to_records(&self) -> Result<Vec<serde_json::Map<String, serde_json::Value>>> {
        let columns = self
            .column_names()
            .into_iter()
            .map(|name| Ok((name, self.values(name)?)))
            .collect::<Result<Vec<_>>>()?;
        (0..self.num_rows())
            .map(|row| {
                columns
                    .iter()
                    .map(|(name, values)| -> Result<(String, serde_json::Value)> {
                        Ok((name.to_string(), serde_json::to_value(&values[row])?))
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speeches() -> Frame {
        Frame::from_rows(
            &["speech_id", "year", "party_id"],
            vec![
                vec!["s1".into(), 1971.into(), 5.into()],
                vec!["s2".into(), 1970.into(), 6.into()],
                vec!["s3".into(), 1975.into(), ColumnValue::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_from_rows_infers_types() {
        let frame = speeches();
        assert_eq!(frame.num_rows(), 3);
        assert_eq!(frame.dtype("speech_id"), Some(DType::Str));
        assert_eq!(frame.dtype("party_id"), Some(DType::Int));
        assert_eq!(frame.batch().schema().field(1).data_type(), &DataType::Int64);
    }

    #[test]
    fn test_mixed_values_become_text() {
        let frame = Frame::from_rows(&["party_id"], vec![vec![5.into()], vec!["7".into()]]).unwrap();
        assert_eq!(frame.dtype("party_id"), Some(DType::Str));
        assert_eq!(frame.values("party_id").unwrap(), &["5".into(), ColumnValue::from("7")]);

        let nulls = Frame::from_rows(&["x"], vec![vec![ColumnValue::Null]]).unwrap();
        assert_eq!(nulls.dtype("x"), Some(DType::Any));
        assert_eq!(nulls.values("x").unwrap(), &[ColumnValue::Null]);
    }

    #[test]
    fn test_from_rows_rejects_ragged_rows() {
        let result = Frame::from_rows(&["a", "b"], vec![vec![1.into()]]);
        assert!(matches!(result, Err(SwedebError::Column(_))));
    }

    #[test]
    fn test_lookup_key_normalises_ids() {
        assert_eq!(ColumnValue::from("5").lookup_key(), ColumnValue::Int(5));
        assert_eq!(ColumnValue::Float(5.0).lookup_key(), ColumnValue::Int(5));
        assert_eq!(ColumnValue::from("S").lookup_key(), ColumnValue::from("S"));
    }

    #[test]
    fn test_sort_and_head() {
        let mut frame = speeches();
        frame.sort_by(&[("year", true)]).unwrap();
        assert_eq!(frame.values("speech_id").unwrap()[0], ColumnValue::from("s2"));

        frame.sort_by(&[("party_id", false)]).unwrap();
        // descending order puts nulls first
        assert_eq!(frame.values("speech_id").unwrap()[0], ColumnValue::from("s3"));

        let head = frame.head(2);
        assert_eq!(head.num_rows(), 2);
        assert_eq!(frame.slice(5, 10).num_rows(), 0);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut frame = Frame::from_rows(
            &["year", "speech_id"],
            (0..20)
                .map(|i: usize| vec![ColumnValue::from(1970 + (i % 2)), ColumnValue::Str(format!("s{i:02}"))])
                .collect(),
        )
        .unwrap();
        frame.sort_by(&[("year", true)]).unwrap();
        let ids: Vec<String> = frame
            .values("speech_id")
            .unwrap()
            .iter()
            .map(ColumnValue::to_text)
            .collect();
        assert_eq!(ids[..3], ["s00", "s02", "s04"]);
        assert_eq!(ids[10..13], ["s01", "s03", "s05"]);
    }

    #[test]
    fn test_inner_join_drops_unmatched() {
        let hits = Frame::from_rows(
            &["speech_id", "node_word"],
            vec![
                vec!["s1".into(), "skola".into()],
                vec!["s9".into(), "skola".into()],
                vec!["s3".into(), "skolan".into()],
            ],
        )
        .unwrap();
        let joined = hits.inner_join(&speeches(), "speech_id").unwrap();
        assert_eq!(joined.num_rows(), 2);
        assert_eq!(
            joined.column_names(),
            vec!["speech_id", "node_word", "year", "party_id"]
        );
        assert_eq!(joined.values("year").unwrap(), &[1971.into(), ColumnValue::from(1975)]);
    }

    #[test]
    fn test_inner_join_matches_normalised_keys() {
        let left = Frame::from_rows(&["party_id"], vec![vec!["5".into()], vec!["6".into()]]).unwrap();
        let right = Frame::from_rows(
            &["party_id", "party_abbrev"],
            vec![vec![6.into(), "M".into()]],
        )
        .unwrap();
        let joined = left.inner_join(&right, "party_id").unwrap();
        assert_eq!(joined.values("party_abbrev").unwrap(), &[ColumnValue::from("M")]);
    }

    #[test]
    fn test_select_and_drop() {
        let mut frame = speeches();
        let selected = frame.select(&["year", "speech_id"]).unwrap();
        assert_eq!(selected.column_names(), vec!["year", "speech_id"]);
        assert!(frame.select(&["missing"]).is_err());

        frame.drop_columns(&["party_id", "missing"]).unwrap();
        assert_eq!(frame.column_names(), vec!["speech_id", "year"]);
    }

    #[test]
    fn test_rename_keeps_position() {
        let mut frame = speeches();
        let renames = HashMap::from([("year".to_string(), "year_year".to_string())]);
        frame.rename_columns(&renames).unwrap();
        assert_eq!(frame.column_names(), vec!["speech_id", "year_year", "party_id"]);
        assert_eq!(frame.num_rows(), 3);
    }

    #[test]
    fn test_retain_rows() {
        let mut frame = speeches();
        frame.retain_rows(&[true, false, true]).unwrap();
        assert_eq!(frame.values("speech_id").unwrap(), &["s1".into(), ColumnValue::from("s3")]);
        assert!(matches!(frame.retain_rows(&[true]), Err(SwedebError::Column(_))));
    }

    #[test]
    fn test_concat_preserves_order() {
        let a = speeches().head(1);
        let b = speeches().slice(1, 2);
        let merged = Frame::concat(vec![a, b]).unwrap();
        let ids: Vec<String> = merged
            .values("speech_id")
            .unwrap()
            .iter()
            .map(ColumnValue::to_text)
            .collect();
        assert_eq!(ids, vec!["s1", "s2", "s3"]);
    }

    #[test]
    fn test_concat_widens_types() {
        let ints = Frame::from_rows(&["x"], vec![vec![1.into()]]).unwrap();
        let floats = Frame::from_rows(&["x"], vec![vec![2.5.into()]]).unwrap();
        let nulls = Frame::from_rows(&["x"], vec![vec![ColumnValue::Null]]).unwrap();
        let merged = Frame::concat(vec![ints.clone(), floats, nulls]).unwrap();
        assert_eq!(merged.dtype("x"), Some(DType::Float));
        assert_eq!(merged.values("x").unwrap(), &[1.0.into(), 2.5.into(), ColumnValue::Null]);

        // a zero-row frame does not decide the type
        let merged = Frame::concat(vec![Frame::empty(&[("x", DType::Str)]), ints]).unwrap();
        assert_eq!(merged.dtype("x"), Some(DType::Int));

        let other = Frame::from_rows(&["y"], vec![vec![1.into()]]).unwrap();
        assert!(Frame::concat(vec![merged, other]).is_err());
    }

    #[test]
    fn test_cast_column() {
        let mut frame = Frame::from_rows(&["year"], vec![vec!["1970".into()], vec!["x".into()]]).unwrap();
        frame.cast_column("year", DType::Int).unwrap();
        assert_eq!(frame.values("year").unwrap(), &[ColumnValue::Int(1970), ColumnValue::Null]);
        assert_eq!(frame.dtype("year"), Some(DType::Int));
    }

    #[test]
    fn test_project_casts_and_fills() {
        let projected = speeches()
            .project(&[("year", DType::Str), ("gender", DType::Str)])
            .unwrap();
        assert_eq!(projected.column_names(), vec!["year", "gender"]);
        assert_eq!(projected.values("year").unwrap()[0], ColumnValue::from("1971"));
        assert_eq!(projected.values("gender").unwrap(), vec![ColumnValue::Null; 3]);
    }

    #[test]
    fn test_json_records_order_columns_by_name() {
        let records = vec![
            serde_json::json!({"party_id": 5, "party_abbrev": "S"}),
            serde_json::json!({"party_id": 6, "abolished": true}),
        ];
        let frame = Frame::from_json_records(&records).unwrap();
        assert_eq!(frame.column_names(), vec!["abolished", "party_abbrev", "party_id"]);
        assert_eq!(frame.values("abolished").unwrap(), &[ColumnValue::Null, true.into()]);

        let none = Frame::from_json_records(&[]).unwrap();
        assert_eq!(none.num_columns(), 0);
    }

    #[test]
    fn test_row_and_records() {
        let frame = speeches();
        let row = frame.row(2).unwrap();
        assert_eq!(row[0], ("speech_id", ColumnValue::from("s3")));
        assert_eq!(row[2], ("party_id", ColumnValue::Null));
        assert!(frame.row(3).is_none());

        let records = frame.to_records().unwrap();
        assert_eq!(records[1]["year"], serde_json::json!(1970));
    }

    #[test]
    fn test_empty_frame_keeps_schema() {
        let frame = Frame::empty(&[("left_word", DType::Str), ("year", DType::Int)]);
        assert!(frame.is_empty());
        assert_eq!(frame.column_names(), vec!["left_word", "year"]);
        assert_eq!(frame.dtype("year"), Some(DType::Int));
        assert_eq!(Frame::new(), Frame::default());
    }
}
