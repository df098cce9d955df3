//! External sources of candidate field values

pub mod country;
pub mod height;
pub mod rankings_api;
pub mod wiki;

use crate::error::SourceError;
use crate::model::{Column, PlayerRecord};
use std::collections::BTreeMap;

pub use country::CountrySource;
pub use wiki::WikiSource;

/// Candidate values for one player. Absent columns and empty strings both mean "unknown".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidates {
    values: BTreeMap<Column, String>,
}

impl Candidates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: Column, value: impl Into<String>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: Column, value: impl Into<String>) {
        self.values.insert(column, value.into().trim().to_string());
    }

    /// Candidate for `column`, empty when the source produced nothing
    pub fn get(&self, column: Column) -> &str {
        self.values.get(&column).map(String::as_str).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.values.values().all(|v| v.is_empty())
    }
}

/// Anything that can propose field values for a player
pub trait CandidateSource {
    /// Short name for log lines
    fn name(&self) -> &str;

    /// Columns this source proposes values for
    fn columns(&self) -> &[Column];

    fn fetch(&mut self, player: &PlayerRecord) -> Result<Candidates, SourceError>;
}

/// ASCII slug of a player name, as used in WTA and TennisEnDirect URLs
pub fn slugify(name: &str) -> String {
    use unicode_normalization::UnicodeNormalization;

    let ascii: String = name.nfkd().filter(|c| c.is_ascii()).collect::<String>().to_lowercase();
    let kept: String = ascii
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join("-").trim_matches('-').to_string()
}

/// Collapse runs of whitespace, including non-breaking spaces
pub fn clean_ws(text: &str) -> String {
    text.replace('\u{a0}', " ").split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Iga Świątek"), "iga-swiatek");
        assert_eq!(slugify("Beatriz Haddad Maia"), "beatriz-haddad-maia");
        assert_eq!(slugify("Anna Karolína Schmiedlová"), "anna-karolina-schmiedlova");
        assert_eq!(slugify("  Coco  Gauff "), "coco-gauff");
        assert_eq!(slugify("Océane Dodin (FRA)"), "oceane-dodin-fra");
    }

    #[test]
    fn test_clean_ws() {
        assert_eq!(clean_ws("1.76\u{a0}m  (5 ft\n9 in)"), "1.76 m (5 ft 9 in)");
    }

    #[test]
    fn test_candidates_trim_and_default() {
        let c = Candidates::new().with(Column::Plays, "  Right-Handed ");
        assert_eq!(c.get(Column::Plays), "Right-Handed");
        assert_eq!(c.get(Column::Birthplace), "");
        assert!(!c.is_empty());
        assert!(Candidates::new().with(Column::Plays, "").is_empty());
    }
}
