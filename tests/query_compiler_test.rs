//! Integration tests for the query compiler and parameter mapper.

use rand::Rng;
use regex::Regex;
use swedeb::cqp::*;
use swedeb::error::{Result, SwedebError};
use swedeb::mapper::{QueryMapper, QueryParams, params_to_query_opts};

fn matches_exactly(pattern: &str) -> Regex {
    Regex::new(&format!("^(?:{pattern})$")).unwrap()
}

fn assert_interval_covers(low: u32, high: u32) -> Result<()> {
    let pattern = interval_pattern(low, high)?;
    let re = matches_exactly(&pattern);
    for year in 0..10_000u32 {
        let text = format!("{year:04}");
        assert_eq!(
            re.is_match(&text),
            (low..=high).contains(&year),
            "pattern {pattern} for {low}-{high} on {text}"
        );
    }
    Ok(())
}

#[test]
fn test_interval_oracle_cases() -> Result<()> {
    assert_eq!(interval_pattern(1990, 1999)?, "199[0-9]");
    assert_eq!(interval_pattern(1957, 1975)?, "195[7-9]|196[0-9]|197[0-5]");
    assert_eq!(interval_pattern(2000, 2000)?, "2000");
    assert_eq!(interval_pattern(1992, 1997)?, "199[2-7]");
    Ok(())
}

#[test]
fn test_interval_matches_exactly_the_range() -> Result<()> {
    for (low, high) in [(1867, 2024), (1970, 1980), (1969, 1970), (0, 9), (9990, 9999), (1999, 2001)] {
        assert_interval_covers(low, high)?;
    }

    let mut rng = rand::rng();
    for _ in 0..25 {
        let low = rng.random_range(0..10_000u32);
        let high = rng.random_range(low..10_000u32);
        assert_interval_covers(low, high)?;
    }
    Ok(())
}

#[test]
fn test_interval_rejects_inverted_range() {
    assert!(matches!(interval_pattern(1980, 1970), Err(SwedebError::Query(_))));
}

#[test]
fn test_pattern_compilation() -> Result<()> {
    let opts = QueryOpts::new("word").with_value("information");
    assert_eq!(compile_pattern(&opts)?, r#"[word="information"%c]"#);

    let opts = opts.with_ignore_case(false);
    assert_eq!(compile_pattern(&opts)?, r#"[word="information"]"#);

    let opts = QueryOpts::new("lemma").with_value(vec!["skola", "skolan"]);
    assert_eq!(compile_pattern(&opts)?, r#"[lemma="skola|skolan"%c]"#);

    let missing = QueryOpts {
        value: Some("skola".into()),
        ..Default::default()
    };
    assert!(matches!(compile_pattern(&missing), Err(SwedebError::Query(_))));
    Ok(())
}

#[test]
fn test_criteria_separators() -> Result<()> {
    let one = compile_criteria(&[Criteria::new("a.speech_gender_id", "2")])?;
    assert_eq!(one, r#"(a.speech_gender_id="2")"#);
    assert!(!one.contains('&'));

    let criterias: Vec<Criteria> = (0..4)
        .map(|i| Criteria::new(format!("a.key_{i}"), i as i64))
        .collect();
    let many = compile_criteria(&criterias)?;
    assert_eq!(many.matches('&').count(), 3);
    assert!(many.starts_with(r#"(a.key_0="0")"#));
    assert!(many.ends_with(r#"(a.key_3="3")"#));
    Ok(())
}

#[test]
fn test_sequence_is_deterministic() -> Result<()> {
    let params = QueryParams::new()
        .with_years(Some(1920), Some(1945))
        .with_gender_id(vec![2]);
    let opts = QueryMapper::new()
        .with_current_year(2024)
        .params_to_query_opts(&params, &["kvinnor", "och", "män"]);

    let first = compile_expression(&opts, Some("speech"))?;
    let second = compile_expression(&opts, Some("speech"))?;
    assert_eq!(first, second);
    assert!(first.starts_with(r#"a:[word="kvinnor"%c] [word="och"%c] [word="män"%c] :: "#));
    assert!(first.ends_with(" within speech"));
    Ok(())
}

#[test]
fn test_end_to_end_scenario() -> Result<()> {
    let params = QueryParams::new()
        .with_years(Some(1970), Some(1980))
        .with_party_id(vec![5, 6]);
    let opts = params_to_query_opts(&params, &["skola"]);
    let query = compile_expression(&opts, None)?;

    assert!(query.starts_with(r#"a:[word="skola"%c]"#));
    let year = query.find(r#"a.year_year="197[0-9]|1980""#).unwrap();
    let party = query.find(r#"a.speech_party_id="5|6""#).unwrap();
    assert!(year < party);
    Ok(())
}

#[test]
fn test_query_opts_from_json() -> Result<()> {
    let opts: Vec<QueryOpts> = serde_json::from_str(
        r#"[
            {"prefix": "a", "target": "word", "value": "skola",
             "criterias": [{"key": "a.year_year", "values": {"low": 1970, "high": 1975}},
                           {"key": "a.speech_party_id", "values": [5, 6]}]},
            {"target": "lemma", "value": ["för", "till"]}
        ]"#,
    )?;
    assert_eq!(
        compile_expression(&opts, None)?,
        r#"a:[word="skola"%c] [lemma="för|till"%c] :: (a.year_year="197[0-5]")&(a.speech_party_id="5|6")"#
    );
    Ok(())
}
