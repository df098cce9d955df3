use super::dates::{format_date, parse_date};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;

/// Columns of the player table that carry meaning for the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    PlayerId,
    FullName,
    BirthDate,
    Birthplace,
    Plays,
    HeightInches,
    HeightCm,
    RepresentedCountry,
    BestRank,
    FirstAppearance,
    LastAppearance,
}

impl Column {
    /// Schema order used when writing a table from scratch
    pub const ALL: [Column; 11] = [
        Column::PlayerId,
        Column::FullName,
        Column::BirthDate,
        Column::Birthplace,
        Column::Plays,
        Column::HeightInches,
        Column::HeightCm,
        Column::RepresentedCountry,
        Column::BestRank,
        Column::FirstAppearance,
        Column::LastAppearance,
    ];

    /// Columns a table cannot be used without
    pub const REQUIRED: [Column; 2] = [Column::PlayerId, Column::FullName];

    /// Biographical columns filled from Wikipedia
    pub const BIOGRAPHICAL: [Column; 5] = [
        Column::HeightInches,
        Column::HeightCm,
        Column::Plays,
        Column::BirthDate,
        Column::Birthplace,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Column::PlayerId => "player_id",
            Column::FullName => "full_name",
            Column::BirthDate => "birth_date",
            Column::Birthplace => "birthplace",
            Column::Plays => "plays",
            Column::HeightInches => "height_inches",
            Column::HeightCm => "height_cm",
            Column::RepresentedCountry => "represented_country",
            Column::BestRank => "best_rank",
            Column::FirstAppearance => "first_appearance",
            Column::LastAppearance => "last_appearance",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        Column::ALL.iter().copied().find(|c| c.name() == s.trim())
    }

    /// Whether the enrichment engine may write this column
    pub fn is_enrichable(&self) -> bool {
        Column::BIOGRAPHICAL.contains(self) || *self == Column::RepresentedCountry
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coerce a player id the way spreadsheets leave them: "1001", " 1001 ", "1001.0"
pub fn parse_player_id(value: &str) -> Option<u64> {
    let value = value.trim();
    if let Ok(id) = value.parse::<u64>() {
        return Some(id);
    }
    let f: f64 = value.parse().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 {
        Some(f as u64)
    } else {
        None
    }
}

fn parse_rank(value: &str) -> Option<u32> {
    parse_player_id(value).and_then(|v| u32::try_from(v).ok())
}

/// One row of the player base
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerRecord {
    pub player_id: u64,
    pub full_name: String,
    pub birth_date: Option<NaiveDate>,
    pub birthplace: String,
    pub plays: String,
    pub height_inches: String,
    pub height_cm: String,
    pub represented_country: String,
    pub best_rank: Option<u32>,
    pub first_appearance: Option<NaiveDate>,
    pub last_appearance: Option<NaiveDate>,
    /// Cells of columns outside the schema, keyed by header
    pub extra: BTreeMap<String, String>,
}

impl PlayerRecord {
    pub fn new(player_id: u64, full_name: impl Into<String>) -> Self {
        Self {
            player_id,
            full_name: full_name.into(),
            ..Self::default()
        }
    }

    /// Cell text as it is written to disk
    pub fn get(&self, column: Column) -> String {
        match column {
            Column::PlayerId => self.player_id.to_string(),
            Column::FullName => self.full_name.clone(),
            Column::BirthDate => format_date(self.birth_date),
            Column::Birthplace => self.birthplace.clone(),
            Column::Plays => self.plays.clone(),
            Column::HeightInches => self.height_inches.clone(),
            Column::HeightCm => self.height_cm.clone(),
            Column::RepresentedCountry => self.represented_country.clone(),
            Column::BestRank => self.best_rank.map(|r| r.to_string()).unwrap_or_default(),
            Column::FirstAppearance => format_date(self.first_appearance),
            Column::LastAppearance => format_date(self.last_appearance),
        }
    }

    /// Set a cell from its text form. Unparseable dates and numbers become unknown.
    ///
    /// The id column is left alone when the text is not a valid id.
    pub fn set(&mut self, column: Column, value: &str) {
        match column {
            Column::PlayerId => {
                if let Some(id) = parse_player_id(value) {
                    self.player_id = id;
                }
            }
            Column::FullName => self.full_name = value.to_string(),
            Column::BirthDate => self.birth_date = parse_date(value),
            Column::Birthplace => self.birthplace = value.to_string(),
            Column::Plays => self.plays = value.to_string(),
            Column::HeightInches => self.height_inches = value.to_string(),
            Column::HeightCm => self.height_cm = value.to_string(),
            Column::RepresentedCountry => self.represented_country = value.to_string(),
            Column::BestRank => self.best_rank = parse_rank(value),
            Column::FirstAppearance => self.first_appearance = parse_date(value),
            Column::LastAppearance => self.last_appearance = parse_date(value),
        }
    }

    /// The text `value` would read back as after `set`, so typed columns compare
    /// by what is stored rather than how a source spelled it
    pub fn canonical(column: Column, value: &str) -> String {
        match column {
            Column::PlayerId => parse_player_id(value).map(|id| id.to_string()).unwrap_or_default(),
            Column::BirthDate | Column::FirstAppearance | Column::LastAppearance => format_date(parse_date(value)),
            Column::BestRank => parse_rank(value).map(|r| r.to_string()).unwrap_or_default(),
            _ => value.to_string(),
        }
    }

    pub fn is_blank(&self, column: Column) -> bool {
        self.get(column).trim().is_empty()
    }

    /// Cell text for any header, schema or extra
    pub fn cell(&self, header: &str) -> String {
        match Column::from_name(header) {
            Some(column) => self.get(column),
            None => self.extra.get(header).cloned().unwrap_or_default(),
        }
    }
}

/// The master player table: its column order plus the rows
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerTable {
    pub columns: Vec<String>,
    pub records: Vec<PlayerRecord>,
}

impl Default for PlayerTable {
    fn default() -> Self {
        Self {
            columns: Column::ALL.iter().map(|c| c.name().to_string()).collect(),
            records: Vec::new(),
        }
    }
}

impl PlayerTable {
    pub fn new(columns: Vec<String>, records: Vec<PlayerRecord>) -> Self {
        Self { columns, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.records.iter().map(|r| r.player_id)
    }

    pub fn position(&self, player_id: u64) -> Option<usize> {
        self.records.iter().position(|r| r.player_id == player_id)
    }

    /// Header names outside the schema, in table order
    pub fn extra_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .map(String::as_str)
            .filter(|c| Column::from_name(c).is_none())
    }

    /// Append records. Ids already present are skipped so `player_id` stays unique.
    ///
    /// Returns how many records were added.
    pub fn append(&mut self, records: Vec<PlayerRecord>) -> usize {
        let mut added = 0;
        for record in records {
            if self.position(record.player_id).is_some() {
                log::warn!("Player {} already in table, not appending", record.player_id);
                continue;
            }
            self.records.push(record);
            added += 1;
        }
        added
    }
}
