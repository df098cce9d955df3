use serde::{Deserialize, Serialize};

/// Marker a reviewer writes into the `reject` column
pub const REJECT_MARK: &str = "1";

/// One accepted field overwrite, as logged in the change ledger
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChangeRecord {
    pub player_id: u64,
    pub player_name: String,
    pub column: String,
    /// Table row the change landed in; empty when a hand-edited ledger lost it
    pub row_index: Option<usize>,
    pub old_value: String,
    pub new_value: String,
    #[serde(default)]
    pub reject: String,
}

impl ChangeRecord {
    pub fn is_rejected(&self) -> bool {
        self.reject.trim() == REJECT_MARK
    }

    pub fn key(&self) -> (u64, String) {
        (self.player_id, self.column.clone())
    }
}
