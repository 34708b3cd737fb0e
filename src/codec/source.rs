//! Persisted code table sources.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Result, SwedebError};
use crate::frame::{ColumnValue, Frame};

/// An open handle that can read code tables by name.
pub trait TableReader: Send {
    fn read_table(&mut self, name: &str) -> Result<Frame>;
}

/// Reads `<dir>/<table>.csv` files.
#[derive(Debug, Clone)]
pub struct CsvDirectoryReader {
    dir: PathBuf,
}

impl CsvDirectoryReader {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        CsvDirectoryReader {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

fn parse_field(field: &str) -> ColumnValue {
    if field.is_empty() {
        ColumnValue::Null
    } else if let Ok(v) = field.parse::<i64>() {
        ColumnValue::Int(v)
    } else if let Ok(v) = field.parse::<f64>() {
        ColumnValue::Float(v)
    } else {
        ColumnValue::Str(field.to_string())
    }
}

impl TableReader for CsvDirectoryReader {
    fn read_table(&mut self, name: &str) -> Result<Frame> {
        let path = self.dir.join(format!("{name}.csv"));
        if !path.is_file() {
            return Err(SwedebError::not_found(format!("table file {}", path.display())));
        }
        let mut reader = csv::Reader::from_path(&path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows: Vec<Vec<ColumnValue>> = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(parse_field).collect());
        }
        debug!("read {} rows from {}", rows.len(), path.display());
        Frame::from_rows(&headers, rows)
    }
}

/// Reads tables from a JSON document `{"<table>": [{...}, ...]}`.
#[derive(Debug, Clone)]
pub struct JsonDocumentReader {
    document: serde_json::Map<String, serde_json::Value>,
}

impl JsonDocumentReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let document: serde_json::Value = serde_json::from_reader(BufReader::new(file))?;
        match document {
            serde_json::Value::Object(document) => Ok(JsonDocumentReader { document }),
            _ => Err(SwedebError::missing_source(format!(
                "{} is not a JSON object of tables",
                path.as_ref().display()
            ))),
        }
    }
}

impl TableReader for JsonDocumentReader {
    fn read_table(&mut self, name: &str) -> Result<Frame> {
        let records = self
            .document
            .get(name)
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| SwedebError::not_found(format!("table '{name}'")))?;
        Frame::from_json_records(records)
    }
}

/// Where code tables are loaded from.
pub enum CodecSource {
    /// A JSON document or a directory of CSV files.
    Path(PathBuf),
    /// An already open reader.
    Reader(Box<dyn TableReader>),
    /// In-memory tables.
    Tables(HashMap<String, Frame>),
}

impl From<&Path> for CodecSource {
    fn from(path: &Path) -> Self {
        CodecSource::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for CodecSource {
    fn from(path: PathBuf) -> Self {
        CodecSource::Path(path)
    }
}

impl From<HashMap<String, Frame>> for CodecSource {
    fn from(tables: HashMap<String, Frame>) -> Self {
        CodecSource::Tables(tables)
    }
}

impl From<Box<dyn TableReader>> for CodecSource {
    fn from(reader: Box<dyn TableReader>) -> Self {
        CodecSource::Reader(reader)
    }
}

impl CodecSource {
    /// Short description for logging.
    pub fn describe(&self) -> String {
        match self {
            CodecSource::Path(path) => path.display().to_string(),
            CodecSource::Reader(_) => "<reader>".to_string(),
            CodecSource::Tables(tables) => format!("<{} in-memory tables>", tables.len()),
        }
    }

    /// Read the named tables; any missing table fails the whole load.
    pub fn load_tables(self, names: &[&str]) -> Result<HashMap<String, Frame>> {
        let mut reader: Box<dyn TableReader> = match self {
            CodecSource::Path(path) => {
                if !path.exists() {
                    return Err(SwedebError::not_found(path.display().to_string()));
                }
                if path.is_dir() {
                    Box::new(CsvDirectoryReader::new(&path))
                } else {
                    Box::new(JsonDocumentReader::open(&path)?)
                }
            }
            CodecSource::Reader(reader) => reader,
            CodecSource::Tables(mut tables) => {
                let mut loaded = HashMap::with_capacity(names.len());
                for name in names {
                    let table = tables
                        .remove(*name)
                        .ok_or_else(|| SwedebError::not_found(format!("table '{name}'")))?;
                    loaded.insert(name.to_string(), table);
                }
                return Ok(loaded);
            }
        };

        let mut loaded = HashMap::with_capacity(names.len());
        for name in names {
            loaded.insert(name.to_string(), reader.read_table(name)?);
        }
        Ok(loaded)
    }
}
