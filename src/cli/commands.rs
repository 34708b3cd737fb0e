//! Command implementations for the swedeb CLI.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::cli::args::*;
use crate::cli::output::*;
use crate::codec::person::{PERSONS_OF_INTEREST, PersonCodecs};
use crate::codec::{CodecSpecification, Codecs};
use crate::config::SwedebConfig;
use crate::cqp::{compile_expression, interval_pattern};
use crate::error::{Result, SwedebError};
use crate::frame::ColumnValue;
use crate::mapper::QueryParams;

/// Execute a CLI command.
pub fn execute_command(args: SwedebArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            info!("loading configuration from {}", path.display());
            SwedebConfig::from_file(path)?
        }
        None => SwedebConfig::default(),
    };

    match &args.command {
        Command::Compile(compile_args) => compile_query(compile_args, &config, &args),
        Command::Interval(interval_args) => show_interval(interval_args, &args),
        Command::Codecs(codecs_args) => list_codecs(codecs_args, &config, &args),
        Command::Decode(decode_args) => decode_value(decode_args, &config, &args),
    }
}

/// Compile words and filters into an engine query.
fn compile_query(args: &CompileArgs, config: &SwedebConfig, cli_args: &SwedebArgs) -> Result<()> {
    let mut mapper = config.query.mapper();
    if let Some(target) = &args.target {
        mapper = mapper.with_default_target(target.as_str());
    }
    if args.case_sensitive {
        mapper = mapper.with_ignore_case(false);
    }

    let params = QueryParams {
        from_year: args.from_year,
        to_year: args.to_year,
        who: args.who.clone(),
        party_id: args.party_id.clone(),
        office_types: args.office_type.clone(),
        sub_office_types: args.sub_office_type.clone(),
        gender_id: args.gender_id.clone(),
        chamber_abbrev: args.chamber_abbrev.clone(),
    };
    let options = mapper.params_to_query_opts(&params, &args.words);

    let within = if args.no_within {
        None
    } else {
        args.within.clone().or_else(|| config.query.within.clone())
    };
    let query = compile_expression(&options, within.as_deref())?;

    output_result("Compiled query", &CompiledQuery { query, options }, cli_args)
}

/// Print the alternation for a year range.
fn show_interval(args: &IntervalArgs, cli_args: &SwedebArgs) -> Result<()> {
    let pattern = interval_pattern(args.low, args.high)?;
    output_result(
        "Interval pattern",
        &IntervalResult {
            low: args.low,
            high: args.high,
            pattern,
        },
        cli_args,
    )
}

fn load_specification(spec_file: Option<&Path>, config: &SwedebConfig) -> Result<CodecSpecification> {
    match spec_file {
        Some(path) => {
            debug!("reading codec specification from {}", path.display());
            let file = File::open(path)?;
            Ok(serde_json::from_reader(BufReader::new(file))?)
        }
        None => Ok(config.codecs.specification.clone()),
    }
}

/// The source given on the command line, else the configured one.
fn resolve_source(source: Option<&Path>, config: &SwedebConfig) -> Result<PathBuf> {
    source
        .or(config.codecs.source.as_deref())
        .map(Path::to_path_buf)
        .ok_or_else(|| SwedebError::invalid_config("no codec source given or configured"))
}

/// Either plain codecs or codecs over the person roster.
enum LoadedCodecs {
    Plain(Codecs),
    Persons(PersonCodecs),
}

impl LoadedCodecs {
    fn load(source: &Path, specification: CodecSpecification, config: &SwedebConfig) -> Result<Self> {
        if specification.table(PERSONS_OF_INTEREST).is_some() {
            let mut codecs =
                PersonCodecs::with_speech_base_url(specification, &config.codecs.speech_base_url)?;
            codecs.load(source)?;
            Ok(LoadedCodecs::Persons(codecs))
        } else {
            let mut codecs = Codecs::new(specification);
            codecs.load(source)?;
            Ok(LoadedCodecs::Plain(codecs))
        }
    }

    fn codecs(&self) -> &Codecs {
        match self {
            LoadedCodecs::Plain(codecs) => codecs,
            LoadedCodecs::Persons(codecs) => codecs.codecs(),
        }
    }
}

/// Load a codec source and list what it provides.
fn list_codecs(args: &CodecsArgs, config: &SwedebConfig, cli_args: &SwedebArgs) -> Result<()> {
    let source = resolve_source(args.source.as_deref(), config)?;
    let specification = load_specification(args.spec.as_deref(), config)?;
    let loaded = LoadedCodecs::load(&source, specification, config)?;
    let codecs = loaded.codecs();

    let tables = codecs
        .table_names()
        .into_iter()
        .filter_map(|name| codecs.table(name))
        .map(|table| TableSummary {
            name: table.name().to_string(),
            key: table.key().to_string(),
            rows: table.len(),
            columns: table
                .frame()
                .column_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
        .collect();

    let summaries = codecs
        .codecs()
        .iter()
        .map(|codec| CodecSummary {
            direction: format!("{:?}", codec.direction()).to_lowercase(),
            from_column: codec.from_column().to_string(),
            to_column: codec.to_column().to_string(),
            table: codec.table().map(str::to_string),
            default: codec.default_value().cloned(),
        })
        .collect();

    let properties = if args.properties {
        codecs.property_values_specs()?
    } else {
        Vec::new()
    };

    output_result(
        "Codec source loaded",
        &CodecsListing {
            source: source.display().to_string(),
            tables,
            codecs: summaries,
            properties,
        },
        cli_args,
    )
}

/// Decode one value.
fn decode_value(args: &DecodeArgs, config: &SwedebConfig, cli_args: &SwedebArgs) -> Result<()> {
    let source = resolve_source(args.source.as_deref(), config)?;
    let specification = load_specification(args.spec.as_deref(), config)?;
    let loaded = LoadedCodecs::load(&source, specification, config)?;

    let decoded = loaded.codecs().decode_any_id(
        &args.from,
        &ColumnValue::from(args.value.as_str()),
        &args.to,
        args.default.as_deref().map(ColumnValue::from),
    )?;

    output_result(
        "Decoded value",
        &DecodeResult {
            from_column: args.from.clone(),
            to_column: args.to.clone(),
            value: args.value.clone(),
            decoded,
        },
        cli_args,
    )
}
