//! Enrichment engine: fill unknown player fields from a candidate source without
//! undoing earlier reviewer decisions
//!
//! The engine never touches its input table. It returns the enriched copy together
//! with the change records, and the caller persists both once the run succeeds.

pub mod policy;

pub use policy::{decide, Decision, OverwritePolicy};

use crate::ledger::PriorLedger;
use crate::model::{ChangeRecord, Column, PlayerRecord, PlayerTable};
use crate::sources::{CandidateSource, Candidates};
use std::collections::HashSet;
use std::ops::Range;

/// Counters for one enrichment pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichStats {
    /// Rows inside the processing window
    pub considered: usize,
    /// Rows skipped because every target column was already filled
    pub complete: usize,
    pub attempted: usize,
    pub fetched: usize,
    pub failed: usize,
    pub accepted: usize,
    pub skipped_rejected: usize,
    pub skipped_protected: usize,
}

#[derive(Debug, Clone)]
pub struct EnrichOutcome {
    pub table: PlayerTable,
    pub changes: Vec<ChangeRecord>,
    pub stats: EnrichStats,
}

/// Row positions of players in `ids`, in table order
pub fn rows_for_ids(table: &PlayerTable, ids: &HashSet<u64>) -> Vec<usize> {
    table
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| ids.contains(&r.player_id))
        .map(|(i, _)| i)
        .collect()
}

/// Apply one player's candidates to `record`, returning the accepted changes.
///
/// Every decision goes through [`decide`]; accepted values are written into the
/// record and logged with an empty reject mark.
pub fn apply_candidates(
    record: &mut PlayerRecord,
    row_index: usize,
    columns: &[Column],
    candidates: &Candidates,
    prior: &PriorLedger,
    policy: &OverwritePolicy,
    stats: &mut EnrichStats,
) -> Vec<ChangeRecord> {
    let overwrite_allowed = policy.allows_overwrite(record);
    let mut changes = Vec::new();

    for &column in columns {
        let current = record.get(column);
        let candidate = PlayerRecord::canonical(column, candidates.get(column));
        let rejected = prior.is_rejected(record.player_id, column.name());

        match decide(&current, &candidate, rejected, overwrite_allowed) {
            Decision::Accept => {
                record.set(column, &candidate);
                stats.accepted += 1;
                changes.push(ChangeRecord {
                    player_id: record.player_id,
                    player_name: record.full_name.clone(),
                    column: column.name().to_string(),
                    row_index: Some(row_index),
                    old_value: current,
                    new_value: candidate,
                    reject: String::new(),
                });
            }
            Decision::SkipRejected => stats.skipped_rejected += 1,
            Decision::SkipProtected => stats.skipped_protected += 1,
            Decision::SkipRegression | Decision::SkipUnchanged => {}
        }
    }

    changes
}

/// Enrich the rows at `rows[window]` from `source`.
///
/// Players with all of the source's columns filled are not fetched. A source error
/// skips that player entirely; the batch carries on.
pub fn enrich(
    table: &PlayerTable,
    rows: &[usize],
    window: Range<usize>,
    source: &mut dyn CandidateSource,
    prior: &PriorLedger,
    policy: &OverwritePolicy,
) -> EnrichOutcome {
    let columns: Vec<Column> = source.columns().to_vec();
    let mut enriched = table.clone();
    let mut changes = Vec::new();
    let mut stats = EnrichStats::default();

    let end = window.end.min(rows.len());
    let start = window.start.min(end);

    for &row_index in &rows[start..end] {
        let Some(record) = enriched.records.get_mut(row_index) else {
            continue;
        };
        stats.considered += 1;

        if columns.iter().all(|c| !record.is_blank(*c)) {
            log::debug!("[{}] SKIP {}: all fields already filled", row_index, record.full_name);
            stats.complete += 1;
            continue;
        }

        stats.attempted += 1;
        let candidates = match source.fetch(record) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("[{}] SKIP {} ({}): {}", row_index, record.full_name, source.name(), e);
                stats.failed += 1;
                continue;
            }
        };
        stats.fetched += 1;

        let mut player_changes =
            apply_candidates(record, row_index, &columns, &candidates, prior, policy, &mut stats);
        println!(
            "[{}] OK {} ({} changes) {}/{} = {:.1}%",
            row_index,
            record.full_name,
            player_changes.len(),
            stats.fetched,
            stats.attempted,
            stats.fetched as f64 / stats.attempted as f64 * 100.0
        );
        changes.append(&mut player_changes);
    }

    EnrichOutcome {
        table: enriched,
        changes,
        stats,
    }
}
