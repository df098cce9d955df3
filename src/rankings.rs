//! Ranking store: weekly snapshot files combined into one observation list

use crate::error::{PlayerBaseError, Result};
use crate::model::{RankingObservation, RankingRow};
use chrono::NaiveDate;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Default file name pattern for snapshot files (`data_2025_08_11.csv`)
pub const DEFAULT_SNAPSHOT_PATTERN: &str = r"^data.*\.csv$";

/// Per-player aggregate over a batch of observations
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSpan {
    pub full_name: String,
    pub best_rank: Option<u32>,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

/// List snapshot files in `dir` whose name matches `pattern`, sorted by name
pub fn snapshot_files(dir: &Path, pattern: &Regex) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(PlayerBaseError::MissingInput(dir.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| pattern.is_match(n))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Read one snapshot file. Rows with an unusable id or date are dropped.
pub fn read_snapshot(path: &Path) -> Result<Vec<RankingObservation>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

    let headers = reader.headers()?.clone();
    for required in ["player_id", "date"] {
        if !headers.iter().any(|h| h.trim() == required) {
            return Err(PlayerBaseError::MissingColumn {
                column: required.to_string(),
                path: path.to_path_buf(),
            });
        }
    }

    let mut observations = Vec::new();
    let mut dropped = 0;
    for result in reader.deserialize::<RankingRow>() {
        match result.ok().as_ref().and_then(RankingObservation::from_row) {
            Some(obs) => observations.push(obs),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        log::debug!("{}: dropped {} malformed rows", path.display(), dropped);
    }

    Ok(observations)
}

/// Read and combine every snapshot in `dir` matching `pattern`.
///
/// An empty directory is a configuration error: nothing downstream can run without rankings.
pub fn load_rankings(dir: &Path, pattern: &Regex) -> Result<Vec<RankingObservation>> {
    let files = snapshot_files(dir, pattern)?;
    if files.is_empty() {
        return Err(PlayerBaseError::NoRankings {
            dir: dir.to_path_buf(),
            pattern: pattern.as_str().to_string(),
        });
    }

    let mut all = Vec::new();
    for file in &files {
        let mut observations = read_snapshot(file)?;
        log::debug!("{}: {} observations", file.display(), observations.len());
        all.append(&mut observations);
    }
    log::info!("Loaded {} ranking observations from {} files", all.len(), files.len());
    Ok(all)
}

/// Write one snapshot file
pub fn write_snapshot(path: &Path, observations: &[RankingObservation]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for obs in observations {
        writer.serialize(obs.to_row())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn ranking_ids(rankings: &[RankingObservation]) -> HashSet<u64> {
    rankings.iter().map(|o| o.player_id).collect()
}

pub fn latest_date(rankings: &[RankingObservation]) -> Option<NaiveDate> {
    rankings.iter().map(|o| o.date).max()
}

/// Ids present in the most recent snapshot
pub fn active_ids(rankings: &[RankingObservation]) -> HashSet<u64> {
    match latest_date(rankings) {
        Some(latest) => rankings
            .iter()
            .filter(|o| o.date == latest)
            .map(|o| o.player_id)
            .collect(),
        None => HashSet::new(),
    }
}

/// Aggregate observations per player. The name comes from the player's first row in input order.
pub fn spans(rankings: &[RankingObservation]) -> BTreeMap<u64, PlayerSpan> {
    let mut spans: BTreeMap<u64, PlayerSpan> = BTreeMap::new();
    for obs in rankings {
        spans
            .entry(obs.player_id)
            .and_modify(|span| {
                span.best_rank = match (span.best_rank, obs.ranking) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };
                span.first_date = span.first_date.min(obs.date);
                span.last_date = span.last_date.max(obs.date);
            })
            .or_insert_with(|| PlayerSpan {
                full_name: obs.full_name.clone(),
                best_rank: obs.ranking,
                first_date: obs.date,
                last_date: obs.date,
            });
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_spans_aggregate() {
        let rankings = vec![
            RankingObservation::new(1, "Aryna Sabalenka", 2, d(2025, 8, 4)),
            RankingObservation::new(1, "Aryna Sabalenka", 1, d(2025, 8, 11)),
            RankingObservation::new(1, "Aryna Sabalenka", 3, d(2025, 7, 28)),
        ];
        let spans = spans(&rankings);
        let span = &spans[&1];
        assert_eq!(span.best_rank, Some(1));
        assert_eq!(span.first_date, d(2025, 7, 28));
        assert_eq!(span.last_date, d(2025, 8, 11));
        assert_eq!(span.full_name, "Aryna Sabalenka");
    }

    #[test]
    fn test_active_ids_uses_latest_snapshot() {
        let rankings = vec![
            RankingObservation::new(1, "A", 1, d(2025, 8, 4)),
            RankingObservation::new(2, "B", 2, d(2025, 8, 4)),
            RankingObservation::new(2, "B", 2, d(2025, 8, 11)),
        ];
        let active = active_ids(&rankings);
        assert_eq!(active.len(), 1);
        assert!(active.contains(&2));
    }

    #[test]
    fn test_load_rankings_filters_by_pattern() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("data_2025_08_11.csv"),
            "full_name,player_id,ranking,points,movement,date\n\
             Iga Swiatek,326408,2,7000,0,2025-08-11\n\
             Broken Row,n/a,3,100,0,2025-08-11\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("failed_urls.csv"), "failed_urls\n").unwrap();

        let pattern = Regex::new(DEFAULT_SNAPSHOT_PATTERN).unwrap();
        let rankings = load_rankings(dir.path(), &pattern).unwrap();
        assert_eq!(rankings.len(), 1);
        assert_eq!(rankings[0].player_id, 326408);
    }

    #[test]
    fn test_load_rankings_empty_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = Regex::new(DEFAULT_SNAPSHOT_PATTERN).unwrap();
        assert!(matches!(
            load_rankings(dir.path(), &pattern),
            Err(PlayerBaseError::NoRankings { .. })
        ));
    }
}
