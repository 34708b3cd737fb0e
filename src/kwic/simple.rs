//! Single-handle keyword-in-context pipeline.

use log::debug;

use crate::codec::{Codecs, DecodeOptions};
use crate::corpus::{ConcordanceRequest, CorpusEngine};
use crate::cqp::{QueryOpts, compile_expression};
use crate::error::Result;
use crate::frame::Frame;
use crate::kwic::{DisplayColumn, KwicOptions};

/// Zero-row frame with the display schema.
pub fn empty_result(schema: &[DisplayColumn]) -> Frame {
    let schema: Vec<_> = schema.iter().map(|c| (c.name.as_str(), c.dtype)).collect();
    Frame::empty(&schema)
}

/// Project onto the display schema. Columns missing from `frame` are
/// filled with nulls; present ones are cast to their declared type.
pub fn project(frame: &Frame, schema: &[DisplayColumn]) -> Result<Frame> {
    let schema: Vec<_> = schema.iter().map(|c| (c.name.as_str(), c.dtype)).collect();
    frame.project(&schema)
}

/// Compile `opts` and run the keyword-in-context pipeline.
pub fn kwic(
    engine: &mut dyn CorpusEngine,
    opts: &[QueryOpts],
    codecs: &Codecs,
    speech_index: Option<&Frame>,
    options: &KwicOptions,
) -> Result<Frame> {
    let query = compile_expression(opts, options.within.as_deref())?;
    kwic_query(engine, &query, codecs, speech_index, options)
}

/// Run the pipeline for an already compiled query.
///
/// With a speech index the hits are inner joined to it on `speech_id` and
/// the joined rows decoded; otherwise the engine's structural attributes
/// are renamed, cast and decoded directly. Either way the result has the
/// display schema, also when nothing matched.
pub fn kwic_query(
    engine: &mut dyn CorpusEngine,
    query: &str,
    codecs: &Codecs,
    speech_index: Option<&Frame>,
    options: &KwicOptions,
) -> Result<Frame> {
    let schema = options.display_schema();

    let hits = engine.query(query)?;
    if hits == 0 {
        debug!("no hits for {query}");
        return Ok(empty_result(&schema));
    }

    let s_show = match speech_index {
        Some(_) => vec!["speech_id".to_string()],
        None => options.s_show.clone(),
    };
    let request = ConcordanceRequest::new(query)
        .with_p_show(vec![options.p_show.clone()])
        .with_s_show(s_show)
        .with_context(options.words_before, options.words_after)
        .with_cut_off(options.cut_off);
    let mut frame = engine.concordance(&request)?;
    if frame.is_empty() {
        return Ok(empty_result(&schema));
    }
    debug!("{} concordance rows from '{}'", frame.num_rows(), engine.name());

    let mut renames = engine.attributes()?.column_renames();
    renames.extend(options.renames.clone());
    frame.rename_columns(&renames)?;

    let decode_options = DecodeOptions {
        keeps: options.display_names(),
        ..Default::default()
    };
    let mut frame = match speech_index {
        Some(index) => {
            let mut columns: Vec<String> = options.context_columns().into();
            columns.push("speech_id".to_string());
            let mut joined = frame.select(&columns)?.inner_join(index, "speech_id")?;
            joined.cast_columns(&options.dtypes)?;
            codecs.decode(joined, &decode_options)?
        }
        None => {
            frame.cast_columns(&options.dtypes)?;
            codecs.decode(frame, &decode_options)?
        }
    };

    let sort_keys: Vec<(&str, bool)> = options
        .sort_by
        .iter()
        .filter(|(column, _)| frame.has_column(column))
        .map(|(column, ascending)| (column.as_str(), *ascending))
        .collect();
    if !sort_keys.is_empty() {
        frame.sort_by(&sort_keys)?;
    }

    project(&frame, &schema)
}
