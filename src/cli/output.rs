//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, SwedebArgs};
use crate::codec::PropertyValues;
use crate::cqp::QueryOpts;
use crate::error::Result;
use crate::frame::ColumnValue;

/// Results that know how to print themselves for humans.
pub trait HumanOutput {
    fn human_lines(&self) -> Vec<String>;
}

/// Result structure for query compilation.
#[derive(Debug, Serialize, Deserialize)]
pub struct CompiledQuery {
    pub query: String,
    pub options: Vec<QueryOpts>,
}

impl HumanOutput for CompiledQuery {
    fn human_lines(&self) -> Vec<String> {
        vec![self.query.clone()]
    }
}

/// Result structure for the interval pattern.
#[derive(Debug, Serialize, Deserialize)]
pub struct IntervalResult {
    pub low: u32,
    pub high: u32,
    pub pattern: String,
}

impl HumanOutput for IntervalResult {
    fn human_lines(&self) -> Vec<String> {
        vec![self.pattern.clone()]
    }
}

/// A loaded code table.
#[derive(Debug, Serialize, Deserialize)]
pub struct TableSummary {
    pub name: String,
    pub key: String,
    pub rows: usize,
    pub columns: Vec<String>,
}

/// A derived codec.
#[derive(Debug, Serialize, Deserialize)]
pub struct CodecSummary {
    pub direction: String,
    pub from_column: String,
    pub to_column: String,
    pub table: Option<String>,
    pub default: Option<ColumnValue>,
}

/// Result structure for the codecs listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct CodecsListing {
    pub source: String,
    pub tables: Vec<TableSummary>,
    pub codecs: Vec<CodecSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyValues>,
}

impl HumanOutput for CodecsListing {
    fn human_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("Code tables ({}):", self.source)];
        let width = self.tables.iter().map(|t| t.name.len()).max().unwrap_or(0);
        for table in &self.tables {
            lines.push(format!(
                "  {:width$}  {:>6} rows  key {}",
                table.name, table.rows, table.key
            ));
        }

        lines.push(String::new());
        lines.push(format!("Codecs ({}):", self.codecs.len()));
        for codec in &self.codecs {
            let default = codec
                .default
                .as_ref()
                .map(|d| format!(" (default {})", format_value(d)))
                .unwrap_or_default();
            lines.push(format!(
                "  {:6} {} -> {} [{}]{default}",
                codec.direction,
                codec.from_column,
                codec.to_column,
                codec.table.as_deref().unwrap_or("function"),
            ));
        }

        for property in &self.properties {
            lines.push(String::new());
            lines.push(format!("{} / {}:", property.id_name, property.text_name));
            for value in &property.values {
                lines.push(format!("  {:>6}  {}", format_value(&value.id), format_value(&value.name)));
            }
        }
        lines
    }
}

/// Result structure for a single decode.
#[derive(Debug, Serialize, Deserialize)]
pub struct DecodeResult {
    pub from_column: String,
    pub to_column: String,
    pub value: String,
    pub decoded: ColumnValue,
}

impl HumanOutput for DecodeResult {
    fn human_lines(&self) -> Vec<String> {
        vec![format_value(&self.decoded)]
    }
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize + HumanOutput>(message: &str, result: &T, args: &SwedebArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: HumanOutput>(message: &str, result: &T, args: &SwedebArgs) -> Result<()> {
    if args.verbosity() > 1 {
        println!("{message}");
        println!();
    }
    for line in result.human_lines() {
        println!("{line}");
    }
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &SwedebArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format a cell for display.
fn format_value(value: &ColumnValue) -> String {
    match value {
        ColumnValue::Null => "null".to_string(),
        other => other.to_text(),
    }
}
