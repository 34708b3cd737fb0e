//! Command line argument parsing for the swedeb CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// swedeb - query compiler and categorical codecs for parliamentary debates
#[derive(Parser, Debug, Clone)]
#[command(name = "swedeb")]
#[command(about = "Query compiler and categorical codecs for parliamentary debate corpora")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct SwedebArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Configuration file (JSON)
    #[arg(short, long, env = "SWEDEB_CONFIG", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl SwedebArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n + 1,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Compile search words and filters into an engine query
    Compile(CompileArgs),

    /// Print the digit-class alternation for a year range
    Interval(IntervalArgs),

    /// Load a codec source and list its tables and codecs
    Codecs(CodecsArgs),

    /// Decode a single value through the code tables
    Decode(DecodeArgs),
}

/// Arguments for compiling a query
#[derive(Parser, Debug, Clone)]
pub struct CompileArgs {
    /// Search word; repeat for a word sequence
    #[arg(short, long = "word", value_name = "WORD", required = true)]
    pub words: Vec<String>,

    /// Positional attribute the words match (default from configuration)
    #[arg(short, long)]
    pub target: Option<String>,

    /// First year
    #[arg(long)]
    pub from_year: Option<u32>,

    /// Last year
    #[arg(long)]
    pub to_year: Option<u32>,

    /// Speaker ids
    #[arg(long, value_delimiter = ',')]
    pub who: Vec<String>,

    /// Party ids
    #[arg(long, value_delimiter = ',')]
    pub party_id: Vec<i64>,

    /// Office type ids
    #[arg(long, value_delimiter = ',')]
    pub office_type: Vec<i64>,

    /// Sub office type ids
    #[arg(long, value_delimiter = ',')]
    pub sub_office_type: Vec<i64>,

    /// Gender ids
    #[arg(long, value_delimiter = ',')]
    pub gender_id: Vec<i64>,

    /// Chamber abbreviations
    #[arg(long, value_delimiter = ',')]
    pub chamber_abbrev: Vec<String>,

    /// Structural unit of the within clause (default from configuration)
    #[arg(long)]
    pub within: Option<String>,

    /// Omit the within clause
    #[arg(long, conflicts_with = "within")]
    pub no_within: bool,

    /// Match words case-sensitively
    #[arg(long)]
    pub case_sensitive: bool,
}

/// Arguments for the interval pattern
#[derive(Parser, Debug, Clone)]
pub struct IntervalArgs {
    /// Lower bound (inclusive)
    #[arg(value_name = "LOW")]
    pub low: u32,

    /// Upper bound (inclusive)
    #[arg(value_name = "HIGH")]
    pub high: u32,
}

/// Arguments for listing codecs
#[derive(Parser, Debug, Clone)]
pub struct CodecsArgs {
    /// JSON document or directory of CSV tables (default from configuration)
    #[arg(value_name = "SOURCE")]
    pub source: Option<PathBuf>,

    /// Codec specification file (JSON)
    #[arg(short, long, value_name = "SPEC_FILE")]
    pub spec: Option<PathBuf>,

    /// Include the id/name values of every property
    #[arg(long)]
    pub properties: bool,
}

/// Arguments for decoding a value
#[derive(Parser, Debug, Clone)]
pub struct DecodeArgs {
    /// Source column, e.g. party_id
    #[arg(value_name = "FROM")]
    pub from: String,

    /// Target column, e.g. party
    #[arg(value_name = "TO")]
    pub to: String,

    /// Value to decode
    #[arg(value_name = "VALUE")]
    pub value: String,

    /// JSON document or directory of CSV tables (default from configuration)
    #[arg(long, value_name = "SOURCE")]
    pub source: Option<PathBuf>,

    /// Codec specification file (JSON)
    #[arg(short, long, value_name = "SPEC_FILE")]
    pub spec: Option<PathBuf>,

    /// Fallback for unmapped values
    #[arg(short, long)]
    pub default: Option<String>,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        let args = SwedebArgs::try_parse_from(["swedeb", "interval", "1990", "1999"]).unwrap();
        assert_eq!(args.verbosity(), 1);

        let args = SwedebArgs::try_parse_from(["swedeb", "-vv", "interval", "1990", "1999"]).unwrap();
        assert_eq!(args.verbosity(), 3);

        let args = SwedebArgs::try_parse_from(["swedeb", "--quiet", "interval", "1990", "1999"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_output_format() {
        let args =
            SwedebArgs::try_parse_from(["swedeb", "--format", "json", "interval", "1", "2"]).unwrap();
        assert_eq!(args.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_compile_args() {
        let args = SwedebArgs::try_parse_from([
            "swedeb",
            "compile",
            "--word",
            "skola",
            "--word",
            "för",
            "--from-year",
            "1970",
            "--party-id",
            "5,6",
            "--no-within",
        ])
        .unwrap();

        if let Command::Compile(compile) = args.command {
            assert_eq!(compile.words, vec!["skola", "för"]);
            assert_eq!(compile.from_year, Some(1970));
            assert_eq!(compile.party_id, vec![5, 6]);
            assert!(compile.no_within);
        } else {
            panic!("Expected Compile command");
        }
    }

    #[test]
    fn test_codecs_source_is_optional() {
        let args = SwedebArgs::try_parse_from(["swedeb", "codecs", "--properties"]).unwrap();
        if let Command::Codecs(codecs) = args.command {
            assert!(codecs.source.is_none());
            assert!(codecs.properties);
        } else {
            panic!("Expected Codecs command");
        }
    }

    #[test]
    fn test_compile_requires_word() {
        assert!(SwedebArgs::try_parse_from(["swedeb", "compile", "--from-year", "1970"]).is_err());
    }

    #[test]
    fn test_decode_args() {
        let args =
            SwedebArgs::try_parse_from(["swedeb", "decode", "party_id", "party", "5", "--source", "codecs.json"])
                .unwrap();
        if let Command::Decode(decode) = args.command {
            assert_eq!(decode.from, "party_id");
            assert_eq!(decode.source, Some(PathBuf::from("codecs.json")));
            assert_eq!(decode.value, "5");
            assert!(decode.default.is_none());
        } else {
            panic!("Expected Decode command");
        }
    }
}
