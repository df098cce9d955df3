use super::dates::{format_date, parse_date};
use super::player::parse_player_id;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A row of a weekly ranking snapshot file, exactly as written on disk
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RankingRow {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub player_id: String,
    #[serde(default)]
    pub ranking: String,
    #[serde(default)]
    pub points: String,
    #[serde(default)]
    pub movement: String,
    #[serde(default)]
    pub date: String,
}

/// One player's position in one weekly snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct RankingObservation {
    pub player_id: u64,
    pub full_name: String,
    pub ranking: Option<u32>,
    pub points: Option<f64>,
    pub movement: Option<i32>,
    pub date: NaiveDate,
}

impl RankingObservation {
    pub fn new(player_id: u64, full_name: impl Into<String>, ranking: u32, date: NaiveDate) -> Self {
        Self {
            player_id,
            full_name: full_name.into(),
            ranking: Some(ranking),
            points: None,
            movement: None,
            date,
        }
    }

    /// Convert a raw row. Rows without a usable id or date are dropped.
    pub fn from_row(row: &RankingRow) -> Option<Self> {
        let player_id = parse_player_id(&row.player_id)?;
        let date = parse_date(&row.date)?;
        Some(Self {
            player_id,
            full_name: row.full_name.trim().to_string(),
            ranking: parse_player_id(&row.ranking).and_then(|r| u32::try_from(r).ok()),
            points: row.points.trim().parse().ok(),
            movement: row.movement.trim().parse::<f64>().ok().map(|m| m as i32),
            date,
        })
    }

    pub fn to_row(&self) -> RankingRow {
        RankingRow {
            full_name: self.full_name.clone(),
            player_id: self.player_id.to_string(),
            ranking: self.ranking.map(|r| r.to_string()).unwrap_or_default(),
            points: self.points.map(|p| p.to_string()).unwrap_or_default(),
            movement: self.movement.map(|m| m.to_string()).unwrap_or_default(),
            date: format_date(Some(self.date)),
        }
    }
}
