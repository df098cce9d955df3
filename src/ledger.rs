//! Change ledger: accepted overwrites, plus the reviewer's reject marks carried across runs
//!
//! The ledger is regenerated on every enrichment run. Reviewer decisions survive
//! because rows marked rejected in the previous ledger are read back first: they
//! block the engine from re-proposing the field, and they are copied into the new
//! ledger so the decision is never lost.

use crate::error::{PlayerBaseError, Result};
use crate::model::{parse_player_id, ChangeRecord, REJECT_MARK};
use csv::StringRecord;
use std::collections::HashSet;
use std::path::Path;

/// `(player_id, column)` pairs a reviewer has rejected
pub type RejectSet = HashSet<(u64, String)>;

/// Ledger column order on disk
pub const LEDGER_COLUMNS: [&str; 7] = [
    "player_id",
    "player_name",
    "column",
    "row_index",
    "old_value",
    "new_value",
    "reject",
];

/// Rows of a ledger file read as plain strings, addressed by header
pub struct LedgerRows {
    headers: Vec<String>,
    rows: Vec<StringRecord>,
}

impl LedgerRows {
    pub fn read(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { headers, rows })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    pub fn require(&self, names: &[&str], path: &Path) -> Result<()> {
        for name in names {
            if !self.has_column(name) {
                return Err(PlayerBaseError::MissingColumn {
                    column: name.to_string(),
                    path: path.to_path_buf(),
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell by header name; absent columns read as empty
    pub fn get(&self, row: usize, name: &str) -> &str {
        self.headers
            .iter()
            .position(|h| h == name)
            .and_then(|i| self.rows.get(row).and_then(|r| r.get(i)))
            .unwrap_or("")
    }

    pub fn is_rejected(&self, row: usize) -> bool {
        self.get(row, "reject").trim() == REJECT_MARK
    }

    /// Parse a row into a change record. `None` when the id is unusable; an unusable
    /// row index is kept as unknown.
    pub fn change_record(&self, row: usize) -> Option<ChangeRecord> {
        Some(ChangeRecord {
            player_id: parse_player_id(self.get(row, "player_id"))?,
            player_name: self.get(row, "player_name").to_string(),
            column: self.get(row, "column").trim().to_string(),
            row_index: parse_player_id(self.get(row, "row_index")).and_then(|i| usize::try_from(i).ok()),
            old_value: self.get(row, "old_value").to_string(),
            new_value: self.get(row, "new_value").to_string(),
            reject: self.get(row, "reject").trim().to_string(),
        })
    }
}

/// What a previous ledger contributes to the next run
#[derive(Debug, Clone, Default)]
pub struct PriorLedger {
    pub rejects: RejectSet,
    /// Rejected rows, kept so the regenerated ledger still carries them
    pub rejected_rows: Vec<ChangeRecord>,
}

impl PriorLedger {
    /// Read the previous ledger. A missing file means no prior decisions.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let rows = LedgerRows::read(path)?;
        let mut prior = Self::default();
        if !rows.has_column("reject") {
            return Ok(prior);
        }

        for i in 0..rows.len() {
            if !rows.is_rejected(i) {
                continue;
            }
            let Some(pid) = parse_player_id(rows.get(i, "player_id")) else {
                log::debug!("{}: rejected row {} has no usable player_id", path.display(), i + 1);
                continue;
            };
            let column = rows.get(i, "column").trim().to_string();
            prior.rejects.insert((pid, column));

            if let Some(record) = rows.change_record(i) {
                if record.row_index.is_none() {
                    log::warn!("{}: rejected row {} has no usable row_index", path.display(), i + 1);
                }
                prior.rejected_rows.push(record);
            }
        }

        log::info!("Loaded {} prior rejects from {}", prior.rejects.len(), path.display());
        Ok(prior)
    }

    pub fn is_rejected(&self, player_id: u64, column: &str) -> bool {
        self.rejects.contains(&(player_id, column.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    pub records: Vec<ChangeRecord>,
}

impl Ledger {
    /// Build this run's ledger.
    ///
    /// New changes matching a prior reject are stamped rejected. Prior rejected rows
    /// with no counterpart among the new changes are appended unchanged.
    pub fn regenerate(changes: Vec<ChangeRecord>, prior: &PriorLedger) -> Self {
        let mut records: Vec<ChangeRecord> = changes
            .into_iter()
            .map(|mut change| {
                change.reject = if prior.rejects.contains(&change.key()) {
                    REJECT_MARK.to_string()
                } else {
                    String::new()
                };
                change
            })
            .collect();

        let present: HashSet<(u64, String)> = records.iter().map(ChangeRecord::key).collect();
        for row in &prior.rejected_rows {
            if !present.contains(&row.key()) {
                records.push(row.clone());
            }
        }

        Self { records }
    }

    pub fn rejected(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.records.iter().filter(|r| r.is_rejected())
    }

    /// Changes accepted by this run and not (yet) rejected
    pub fn accepted(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.records.iter().filter(|r| !r.is_rejected())
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Write the ledger, replacing any previous file
pub fn write_ledger(path: &Path, ledger: &Ledger) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(LEDGER_COLUMNS)?;
    for record in &ledger.records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(pid: u64, column: &str, new_value: &str) -> ChangeRecord {
        ChangeRecord {
            player_id: pid,
            player_name: format!("P{}", pid),
            column: column.to_string(),
            row_index: Some(pid as usize),
            old_value: String::new(),
            new_value: new_value.to_string(),
            reject: String::new(),
        }
    }

    #[test]
    fn test_load_prior_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let prior = PriorLedger::load(&dir.path().join("none.csv")).unwrap();
        assert!(prior.rejects.is_empty());
    }

    #[test]
    fn test_load_prior_reads_only_marked_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        std::fs::write(
            &path,
            "player_id,player_name,column,row_index,old_value,new_value,reject\n\
             1001,A,birthplace,0,,\"Moscow, Russia\",1\n\
             1002,B,height_cm,1,1.70m,1.75m,\n\
             x,C,plays,2,,Left-Handed,1\n\
             1004,D,plays,3,,Left-Handed, 1 \n",
        )
        .unwrap();

        let prior = PriorLedger::load(&path).unwrap();
        assert_eq!(prior.rejects.len(), 2);
        assert!(prior.is_rejected(1001, "birthplace"));
        assert!(prior.is_rejected(1004, "plays"));
        assert!(!prior.is_rejected(1002, "height_cm"));
        assert_eq!(prior.rejected_rows.len(), 2);
    }

    #[test]
    fn test_load_prior_without_reject_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        std::fs::write(&path, "player_id,column,row_index,old_value,new_value\n1,plays,0,,Right-Handed\n").unwrap();
        assert!(PriorLedger::load(&path).unwrap().rejects.is_empty());
    }

    #[test]
    fn test_regenerate_stamps_and_retains_rejects() {
        let mut prior = PriorLedger::default();
        let mut old = change(1, "birthplace", "Moscow, Russia");
        old.reject = REJECT_MARK.to_string();
        prior.rejects.insert(old.key());
        prior.rejected_rows.push(old.clone());
        let mut old_plays = change(2, "plays", "Left-Handed");
        old_plays.reject = REJECT_MARK.to_string();
        prior.rejects.insert(old_plays.key());
        prior.rejected_rows.push(old_plays.clone());

        let ledger = Ledger::regenerate(
            vec![change(1, "birthplace", "Moskva, Russia"), change(3, "plays", "Right-Handed")],
            &prior,
        );

        assert_eq!(ledger.records.len(), 3);
        assert!(ledger.records[0].is_rejected());
        assert_eq!(ledger.records[0].new_value, "Moskva, Russia");
        assert!(!ledger.records[1].is_rejected());
        assert_eq!(ledger.records[2], old_plays);
        assert_eq!(ledger.rejected().count(), 2);
        assert_eq!(ledger.accepted().count(), 1);
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        let mut rejected = change(5, "birthplace", "Paris, France");
        rejected.reject = REJECT_MARK.to_string();
        let ledger = Ledger { records: vec![change(4, "plays", "Left-Handed"), rejected] };
        write_ledger(&path, &ledger).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("player_id,player_name,column,row_index,old_value,new_value,reject\n"));

        let prior = PriorLedger::load(&path).unwrap();
        assert_eq!(prior.rejected_rows, vec![ledger.records[1].clone()]);
    }

    #[test]
    fn test_reject_with_bad_row_index_survives_regeneration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        std::fs::write(
            &path,
            "player_id,player_name,column,row_index,old_value,new_value,reject\n\
             1001,A,birthplace,n/a,Moscow,\"Moscow, Russia\",1\n",
        )
        .unwrap();

        for _ in 0..2 {
            let prior = PriorLedger::load(&path).unwrap();
            assert!(prior.is_rejected(1001, "birthplace"));
            let ledger = Ledger::regenerate(Vec::new(), &prior);
            write_ledger(&path, &ledger).unwrap();
        }

        let prior = PriorLedger::load(&path).unwrap();
        assert!(prior.is_rejected(1001, "birthplace"));
        assert_eq!(prior.rejected_rows.len(), 1);
        assert_eq!(prior.rejected_rows[0].row_index, None);
        assert_eq!(prior.rejected_rows[0].old_value, "Moscow");
    }

    #[test]
    fn test_empty_ledger_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        write_ledger(&path, &Ledger::default()).unwrap();
        let rows = LedgerRows::read(&path).unwrap();
        assert!(rows.is_empty());
        assert!(rows.has_column("reject"));
    }
}
