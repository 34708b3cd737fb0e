//! Integer interval to digit-class alternation.
//!
//! The corpus engine matches structural attribute values as strings, so a
//! year range has to be spelled out as a regular alternation. Values are
//! grouped by decade: every decade touched by the range contributes one
//! fixed-width pattern, a literal, a partial `[a-b]` units class or the full
//! `[0-9]` wildcard. Years are four digits wide; smaller values are zero
//! padded so the same grouping holds for the whole `0..=9999` domain.

use crate::error::{Result, SwedebError};

/// Compile `low..=high` into a minimal decade-grouped alternation.
///
/// # Examples
///
/// ```
/// use swedeb::cqp::interval_pattern;
///
/// assert_eq!(interval_pattern(1990, 1999).unwrap(), "199[0-9]");
/// assert_eq!(interval_pattern(1957, 1975).unwrap(), "195[7-9]|196[0-9]|197[0-5]");
/// assert_eq!(interval_pattern(2000, 2000).unwrap(), "2000");
/// ```
pub fn interval_pattern(low: u32, high: u32) -> Result<String> {
    if low > high {
        return Err(SwedebError::query(format!(
            "invalid interval: low ({low}) is greater than high ({high})"
        )));
    }

    if low == high {
        return Ok(format!("{low:04}"));
    }

    let (low_decade, high_decade) = (low / 10, high / 10);
    if low_decade == high_decade {
        return Ok(format!("{low_decade:03}[{}-{}]", low % 10, high % 10));
    }

    let mut parts = Vec::with_capacity((high_decade - low_decade + 1) as usize);
    for decade in low_decade..=high_decade {
        let part = if decade == low_decade {
            format!("{decade:03}[{}-9]", low % 10)
        } else if decade == high_decade {
            if high % 10 == 0 {
                format!("{high:04}")
            } else {
                format!("{decade:03}[0-{}]", high % 10)
            }
        } else {
            format!("{decade:03}[0-9]")
        };
        parts.push(part);
    }

    Ok(parts.join("|"))
}
