//! Restore the old value of every ledger row a reviewer marked rejected

use crate::error::{PlayerBaseError, Result};
use crate::ledger::LedgerRows;
use crate::model::parse_player_id;
use csv::StringRecord;
use std::path::Path;

/// A CSV table held as plain strings so untouched cells are written back byte for byte
#[derive(Debug, Clone, PartialEq)]
pub struct StringTable {
    pub headers: StringRecord,
    pub rows: Vec<StringRecord>,
}

impl StringTable {
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PlayerBaseError::MissingInput(path.to_path_buf()));
        }
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers = reader.headers()?.clone();
        let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { headers, rows })
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name.trim())
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Replace one cell, padding short rows with empty cells
    pub fn set(&mut self, row: usize, column: usize, value: &str) -> bool {
        let width = self.headers.len().max(column + 1);
        let Some(record) = self.rows.get_mut(row) else {
            return false;
        };
        let mut cells: Vec<String> = record.iter().map(String::from).collect();
        cells.resize(width.max(cells.len()), String::new());
        cells[column] = value.to_string();
        *record = StringRecord::from(cells);
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevertReport {
    pub flagged: usize,
    pub reverted: usize,
    pub skipped: usize,
}

/// Revert every rejected change listed in `summary_csv` on the table at `enriched_csv`.
///
/// Each old value goes into the `(row_index, column)` cell the ledger names. The
/// result goes to `output_csv`, or back over `enriched_csv` when not given. When
/// nothing is flagged, or no flagged row applies, no file is written.
pub fn revert_overwrites(summary_csv: &Path, enriched_csv: &Path, output_csv: Option<&Path>) -> Result<RevertReport> {
    if !summary_csv.exists() {
        return Err(PlayerBaseError::MissingInput(summary_csv.to_path_buf()));
    }
    let ledger = LedgerRows::read(summary_csv)?;
    ledger.require(&["row_index", "column", "old_value", "reject"], summary_csv)?;

    let flagged: Vec<usize> = (0..ledger.len()).filter(|&i| ledger.is_rejected(i)).collect();
    let mut report = RevertReport {
        flagged: flagged.len(),
        ..RevertReport::default()
    };
    if flagged.is_empty() {
        println!("No flagged overwrites to revert.");
        return Ok(report);
    }

    let mut table = StringTable::read(enriched_csv)?;

    for i in flagged {
        let column = ledger.get(i, "column").trim();
        let old = ledger.get(i, "old_value");

        let Some(col_idx) = table.column_index(column) else {
            log::warn!("Ledger row {}: column '{}' not in table, skipping", i + 1, column);
            report.skipped += 1;
            continue;
        };
        let Some(row_idx) = parse_player_id(ledger.get(i, "row_index")).map(|r| r as usize) else {
            log::warn!("Ledger row {}: bad row_index '{}', skipping", i + 1, ledger.get(i, "row_index"));
            report.skipped += 1;
            continue;
        };

        // row_index is authoritative; a different player there only earns a warning
        if let (Some(pid), Some(id_col)) = (parse_player_id(ledger.get(i, "player_id")), table.column_index("player_id")) {
            let at_row = table.get(row_idx, id_col).and_then(parse_player_id);
            if at_row != Some(pid) {
                log::warn!(
                    "Ledger row {}: row {} holds player {:?}, ledger says {}",
                    i + 1,
                    row_idx,
                    at_row,
                    pid
                );
            }
        }

        let current = table.get(row_idx, col_idx).unwrap_or("").to_string();
        if !table.set(row_idx, col_idx, old) {
            log::warn!("Ledger row {}: row {} out of range, skipping", i + 1, row_idx);
            report.skipped += 1;
            continue;
        }
        println!("Reverting row {} col \"{}\": {:?} -> {:?}", row_idx, column, current, old);
        report.reverted += 1;
    }

    if report.reverted == 0 {
        println!("No flagged overwrites could be applied; nothing written.");
        return Ok(report);
    }

    let out = output_csv.unwrap_or(enriched_csv);
    table.write(out)?;
    println!("Reverted {} cells. Written corrected file -> {}", report.reverted, out.display());
    Ok(report)
}
