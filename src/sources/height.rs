//! Height strings as they appear in Wikipedia infoboxes: "1.80 m (5 ft 11 in)"

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, space0},
    combinator::{opt, recognize},
    sequence::terminated,
    IResult, Parser,
};
use regex::Regex;

lazy_static::lazy_static! {
    static ref PAIRED: Regex = Regex::new(r"^(.+?)\s*\((.+?)\)").unwrap();
}

/// Parse a decimal number like "1.80" or "2"
fn decimal(input: &str) -> IResult<&str, &str> {
    recognize((digit1, opt((char('.'), digit1)))).parse(input)
}

/// Parse a metric height: "1.80 m", "1.80m"
fn metres(input: &str) -> IResult<&str, &str> {
    terminated(decimal, (space0, alt((tag("m"), tag("M"))))).parse(input)
}

/// Parse an imperial height: "5 ft 11 in", "5' 11\""
fn feet_inches(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, feet) = digit1.parse(input)?;
    let (input, _) = (space0, alt((tag("ft"), tag("'"))), space0).parse(input)?;
    let (input, inches) = digit1.parse(input)?;
    Ok((input, (feet, inches)))
}

/// Split an infobox height cell into its (imperial, metric) halves.
///
/// Whichever half mentions metres is the metric one.
pub fn split_height(value: &str) -> (Option<String>, Option<String>) {
    let Some(caps) = PAIRED.captures(value.trim()) else {
        return (None, None);
    };
    let a = caps[1].trim().to_string();
    let b = caps[2].trim().to_string();
    if a.contains('m') {
        (Some(b), Some(a))
    } else {
        (Some(a), Some(b))
    }
}

/// Format as `5' 11"`. Falls back to the first two numbers found in the text.
pub fn format_inches(imperial: &str) -> Option<String> {
    let imperial = imperial.trim();
    if let Ok((_, (feet, inches))) = feet_inches(imperial) {
        return Some(format!("{}' {}\"", feet, inches));
    }

    let numbers: Vec<String> = imperial
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if numbers.len() >= 2 {
        Some(format!("{}' {}\"", numbers[0], numbers[1]))
    } else {
        None
    }
}

/// Format as `1.80m`
pub fn format_metres(metric: &str) -> Option<String> {
    metres(metric.trim()).ok().map(|(_, value)| format!("{}m", value))
}

/// Both encodings of an infobox height cell
pub fn format_heights(value: &str) -> (Option<String>, Option<String>) {
    let (imperial, metric) = split_height(value);
    (
        imperial.as_deref().and_then(format_inches),
        metric.as_deref().and_then(format_metres),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_heights_metric_first() {
        let (inches, cm) = format_heights("1.80 m (5 ft 11 in)");
        assert_eq!(inches.as_deref(), Some("5' 11\""));
        assert_eq!(cm.as_deref(), Some("1.80m"));
    }

    #[test]
    fn test_format_heights_imperial_first() {
        let (inches, cm) = format_heights("5 ft 9 in (1.75 m)");
        assert_eq!(inches.as_deref(), Some("5' 9\""));
        assert_eq!(cm.as_deref(), Some("1.75m"));
    }

    #[test]
    fn test_format_inches_fallback() {
        assert_eq!(format_inches("5 ft 11+1⁄2 in").as_deref(), Some("5' 11\""));
        assert_eq!(format_inches("six feet"), None);
    }

    #[test]
    fn test_unpaired_height_is_unknown() {
        assert_eq!(format_heights("1.80 m"), (None, None));
        assert_eq!(format_metres("tall"), None);
    }
}
