//! Lenient date parsing for values that arrive from hand-edited CSVs and scraped pages

use chrono::{NaiveDate, NaiveDateTime};

/// Canonical on-disk date format
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%b %d %Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%m/%d/%Y",
];

/// Parse a date in any of the formats the player base has accumulated.
///
/// Returns `None` for blanks and anything unrecognized; callers treat that as unknown.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return Some(d);
        }
    }

    // Timestamps written by earlier tooling ("2024-01-08 00:00:00")
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }

    // Bare year
    if value.len() == 4 && value.chars().all(|c| c.is_ascii_digit()) {
        let year: i32 = value.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }

    None
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}
