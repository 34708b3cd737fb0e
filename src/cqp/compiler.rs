//! Query option compiler.
//!
//! Turns [`QueryOpts`] sequences into the engine's query language:
//!
//! - atom: `[<attr>="<value>"%c]`, or the bare literal `"<token>"%c`
//! - scope prefix: `<prefix>:<atom>`
//! - sequence: atoms joined by single spaces (left to right adjacency)
//! - criteria: ` :: (<key>="<value>")&(<key>="<value>")`
//! - scope clause: ` within <unit>`
//!
//! The vocabulary is fixed by the engine's wire protocol.

use log::debug;

use crate::cqp::interval::interval_pattern;
use crate::cqp::options::{Criteria, OptValue, QueryOpts};
use crate::error::{Result, SwedebError};

const IGNORE_CASE_FLAG: &str = "%c";

fn case_flag(ignore_case: bool) -> &'static str {
    if ignore_case { IGNORE_CASE_FLAG } else { "" }
}

/// Render the value side of a match or a criteria.
pub fn value_expression(value: &OptValue) -> Result<String> {
    match value {
        OptValue::Scalar(v) => Ok(v.clone()),
        OptValue::List(vs) => Ok(vs.join("|")),
        OptValue::Interval(low, high) => interval_pattern(*low, *high),
    }
}

/// Compile a single option into an atomic match expression.
///
/// # Examples
///
/// ```
/// use swedeb::cqp::{compile_pattern, QueryOpts};
///
/// let opts = QueryOpts::new("word").with_value("information");
/// assert_eq!(compile_pattern(&opts).unwrap(), r#"[word="information"%c]"#);
/// ```
pub fn compile_pattern(opts: &QueryOpts) -> Result<String> {
    let target = opts
        .target
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| SwedebError::query("query option has no target"))?;

    let flag = case_flag(opts.ignore_case);
    let atom = match &opts.value {
        None => format!("\"{target}\"{flag}"),
        Some(value) => format!("[{target}=\"{}\"{flag}]", value_expression(value)?),
    };

    Ok(match opts.prefix.as_deref() {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{atom}"),
        _ => atom,
    })
}

/// Compile options into a space separated word sequence.
pub fn compile_sequence(opts: &[QueryOpts]) -> Result<String> {
    let atoms = opts
        .iter()
        .map(compile_pattern)
        .collect::<Result<Vec<_>>>()?;
    Ok(atoms.join(" "))
}

/// Compile criteria into a conjunction of parenthesized clauses.
pub fn compile_criteria(criterias: &[Criteria]) -> Result<String> {
    let clauses = criterias
        .iter()
        .map(|c| {
            Ok(format!(
                "({}=\"{}\"{})",
                c.key,
                value_expression(&c.values)?,
                case_flag(c.ignore_case)
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(clauses.join("&"))
}

/// Compile a full composite query.
///
/// Criteria attached to any option are collected, in option order, into one
/// trailing conjunction. An empty option list yields an empty string.
pub fn compile_expression(opts: &[QueryOpts], within: Option<&str>) -> Result<String> {
    if opts.is_empty() {
        return Ok(String::new());
    }

    let mut expression = compile_sequence(opts)?;

    let criterias: Vec<Criteria> = opts
        .iter()
        .flat_map(|o| o.criterias.iter().cloned())
        .collect();
    if !criterias.is_empty() {
        expression.push_str(" :: ");
        expression.push_str(&compile_criteria(&criterias)?);
    }

    if let Some(unit) = within.filter(|u| !u.is_empty()) {
        expression.push_str(" within ");
        expression.push_str(unit);
    }

    debug!("compiled query expression: {expression}");
    Ok(expression)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_pattern_with_value() {
        let opts = QueryOpts::new("word").with_value("information");
        assert_eq!(compile_pattern(&opts).unwrap(), r#"[word="information"%c]"#);

        let opts = opts.with_ignore_case(false);
        assert_eq!(compile_pattern(&opts).unwrap(), r#"[word="information"]"#);
    }

    #[test]
    fn test_compile_pattern_bare_literal() {
        let opts = QueryOpts::new("information");
        assert_eq!(compile_pattern(&opts).unwrap(), r#""information"%c"#);

        let opts = QueryOpts::new("information").with_prefix("a");
        assert_eq!(compile_pattern(&opts).unwrap(), r#"a:"information"%c"#);
    }

    #[test]
    fn test_compile_pattern_list_and_interval() {
        let opts = QueryOpts::new("lemma").with_value(vec!["skola", "skolan"]);
        assert_eq!(compile_pattern(&opts).unwrap(), r#"[lemma="skola|skolan"%c]"#);

        let opts = QueryOpts::new("year").with_value((1957, 1975));
        assert_eq!(
            compile_pattern(&opts).unwrap(),
            r#"[year="195[7-9]|196[0-9]|197[0-5]"%c]"#
        );
    }

    #[test]
    fn test_compile_pattern_missing_target() {
        let opts = QueryOpts::default();
        assert!(matches!(compile_pattern(&opts), Err(SwedebError::Query(_))));
    }

    #[test]
    fn test_compile_sequence_order() {
        let opts = vec![
            QueryOpts::new("word").with_value("att").with_prefix("a"),
            QueryOpts::new("lemma").with_value("skola"),
        ];
        assert_eq!(
            compile_sequence(&opts).unwrap(),
            r#"a:[word="att"%c] [lemma="skola"%c]"#
        );
    }

    #[test]
    fn test_compile_criteria() {
        let single = vec![Criteria::new("a.speech_gender_id", "2")];
        assert_eq!(compile_criteria(&single).unwrap(), r#"(a.speech_gender_id="2")"#);

        let many = vec![
            Criteria::new("a.year_year", (1990, 1999)),
            Criteria::new("a.speech_party_id", vec![5i64, 6]),
            Criteria::new("a.speech_chamber_abbrev", "ek").ignore_case(true),
        ];
        let compiled = compile_criteria(&many).unwrap();
        assert_eq!(
            compiled,
            r#"(a.year_year="199[0-9]")&(a.speech_party_id="5|6")&(a.speech_chamber_abbrev="ek"%c)"#
        );
        assert_eq!(compiled.matches('&').count(), 2);
    }

    #[test]
    fn test_compile_expression() {
        let opts = vec![
            QueryOpts::new("word")
                .with_value("skola")
                .with_prefix("a")
                .with_criteria(Criteria::new("a.speech_party_id", "5")),
        ];
        assert_eq!(
            compile_expression(&opts, Some("speech")).unwrap(),
            r#"a:[word="skola"%c] :: (a.speech_party_id="5") within speech"#
        );
        assert_eq!(
            compile_expression(&opts[..0], Some("speech")).unwrap(),
            ""
        );
    }

    #[test]
    fn test_compile_expression_is_deterministic() {
        let opts = vec![
            QueryOpts::new("word")
                .with_value("skola")
                .with_prefix("a")
                .with_criteria(Criteria::new("a.year_year", (1970, 1980))),
            QueryOpts::new("word").with_value("och"),
        ];
        let first = compile_expression(&opts, None).unwrap();
        let second = compile_expression(&opts, None).unwrap();
        assert_eq!(first, second);
    }
}
