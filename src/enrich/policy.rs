use crate::model::PlayerRecord;
use chrono::NaiveDate;

/// When a non-empty cell may be replaced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverwritePolicy {
    pub overwrite: bool,
    /// Only players first seen after this date are eligible for overwrites
    pub min_first_date: Option<NaiveDate>,
}

impl OverwritePolicy {
    pub fn new(overwrite: bool, min_first_date: Option<NaiveDate>) -> Self {
        Self { overwrite, min_first_date }
    }

    /// Whether non-empty cells of this player may be replaced.
    ///
    /// A player with an unknown first appearance never passes a date threshold.
    pub fn allows_overwrite(&self, player: &PlayerRecord) -> bool {
        if !self.overwrite {
            return false;
        }
        match self.min_first_date {
            None => true,
            Some(threshold) => player.first_appearance.is_some_and(|first| first > threshold),
        }
    }
}

/// Outcome for one candidate value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    /// A reviewer rejected this field before
    SkipRejected,
    /// Would replace a known value with an unknown one
    SkipRegression,
    SkipUnchanged,
    /// Non-empty cell and overwriting is not allowed for this player
    SkipProtected,
}

/// Decide one field. Rules apply in order; the first match wins.
pub fn decide(current: &str, candidate: &str, previously_rejected: bool, overwrite_allowed: bool) -> Decision {
    let current_blank = current.trim().is_empty();
    let candidate_blank = candidate.trim().is_empty();

    if previously_rejected {
        return Decision::SkipRejected;
    }
    if candidate_blank && !current_blank {
        return Decision::SkipRegression;
    }
    if candidate == current || (candidate_blank && current_blank) {
        return Decision::SkipUnchanged;
    }
    if !current_blank && !overwrite_allowed {
        return Decision::SkipProtected;
    }
    Decision::Accept
}
