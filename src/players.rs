//! Player store: the master player table on disk and the merges that keep it current

use crate::error::{PlayerBaseError, Result};
use crate::model::{parse_player_id, Column, PlayerRecord, PlayerTable, RankingObservation};
use crate::rankings::{ranking_ids, spans};
use csv::StringRecord;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

/// Load the player table.
///
/// `player_id` and `full_name` must be present. Other schema columns that are
/// missing get backfilled as empty and appended to the column order. Rows whose
/// id cannot be coerced to an integer are dropped.
pub fn load_players(path: &Path) -> Result<PlayerTable> {
    if !path.exists() {
        return Err(PlayerBaseError::MissingInput(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

    for required in Column::REQUIRED {
        if !headers.iter().any(|h| h == required.name()) {
            return Err(PlayerBaseError::MissingColumn {
                column: required.name().to_string(),
                path: path.to_path_buf(),
            });
        }
    }

    let mut columns = headers.clone();
    for column in Column::ALL {
        if !columns.iter().any(|h| h == column.name()) {
            log::debug!("{}: backfilling missing column {}", path.display(), column);
            columns.push(column.name().to_string());
        }
    }

    let mut records = Vec::new();
    let mut seen = HashSet::new();
    for (row_num, result) in reader.records().enumerate() {
        let row = result?;
        match record_from_row(&headers, &row) {
            Some(record) => {
                if !seen.insert(record.player_id) {
                    log::warn!(
                        "{}: row {} repeats player_id {}, keeping first",
                        path.display(),
                        row_num + 1,
                        record.player_id
                    );
                    continue;
                }
                records.push(record);
            }
            None => {
                log::debug!(
                    "{}: row {} dropped, unusable player_id '{}'",
                    path.display(),
                    row_num + 1,
                    header_value(&headers, &row, Column::PlayerId.name())
                );
            }
        }
    }

    log::info!("Loaded {} players from {}", records.len(), path.display());
    Ok(PlayerTable::new(columns, records))
}

fn header_value<'a>(headers: &[String], row: &'a StringRecord, name: &str) -> &'a str {
    headers
        .iter()
        .position(|h| h == name)
        .and_then(|i| row.get(i))
        .unwrap_or("")
}

fn record_from_row(headers: &[String], row: &StringRecord) -> Option<PlayerRecord> {
    let player_id = parse_player_id(header_value(headers, row, Column::PlayerId.name()))?;
    let mut record = PlayerRecord::new(player_id, "");

    for (i, header) in headers.iter().enumerate() {
        let value = row.get(i).unwrap_or("");
        match Column::from_name(header) {
            Some(Column::PlayerId) => {}
            Some(column) => record.set(column, value),
            None => {
                record.extra.insert(header.clone(), value.to_string());
            }
        }
    }
    Some(record)
}

/// Write the whole table. Every stage that changes the table persists through here.
pub fn save_players(table: &PlayerTable, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.columns)?;
    for record in &table.records {
        writer.write_record(table.columns.iter().map(|c| record.cell(c)))?;
    }
    writer.flush()?;
    log::info!("Saved {} players to {}", table.len(), path.display());
    Ok(())
}

/// Ids seen in the rankings but not yet in the table
pub fn find_new_ids(existing: &PlayerTable, rankings: &[RankingObservation]) -> BTreeSet<u64> {
    let known: HashSet<u64> = existing.ids().collect();
    ranking_ids(rankings)
        .into_iter()
        .filter(|id| !known.contains(id))
        .collect()
}

/// Build a fresh record for each new id from its observations.
///
/// Enrichable fields start empty. Each record carries an empty cell for every
/// column of `columns` outside the schema, so it lines up with the existing table.
pub fn summarize_new_players(
    rankings: &[RankingObservation],
    new_ids: &BTreeSet<u64>,
    columns: &[String],
) -> Vec<PlayerRecord> {
    let spans = spans(rankings);

    new_ids
        .iter()
        .filter_map(|id| {
            let span = spans.get(id)?;
            let mut record = PlayerRecord::new(*id, span.full_name.clone());
            record.best_rank = span.best_rank;
            record.first_appearance = Some(span.first_date);
            record.last_appearance = Some(span.last_date);
            for column in columns.iter().filter(|c| Column::from_name(c).is_none()) {
                record.extra.insert(column.clone(), String::new());
            }
            Some(record)
        })
        .collect()
}

/// Move `last_appearance` forward to the latest observed date, never backward.
///
/// Returns the updated table and how many players changed.
pub fn update_last_appearances(
    players: &PlayerTable,
    rankings: &[RankingObservation],
) -> (PlayerTable, usize) {
    let spans = spans(rankings);
    let mut updated = players.clone();
    let mut changed = 0;

    for record in &mut updated.records {
        let Some(span) = spans.get(&record.player_id) else {
            continue;
        };
        let later = match record.last_appearance {
            Some(current) => span.last_date > current,
            None => true,
        };
        if later {
            record.last_appearance = Some(span.last_date);
            changed += 1;
        }
    }

    (updated, changed)
}
