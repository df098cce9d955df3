//! Pipeline settings, passed explicitly to each stage

use crate::error::{PlayerBaseError, Result};
use crate::rankings::DEFAULT_SNAPSHOT_PATTERN;
use chrono::NaiveDate;
use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PLAYERS_PATH: &str = "player_base_and_maps/player_data_wta.csv";
pub const DEFAULT_RANKINGS_DIR: &str = "player_base_and_maps/wta_rankings";
pub const DEFAULT_LEDGER_PATH: &str = "player_base_and_maps/overwrite_changes.csv";
pub const DEFAULT_MIN_FIRST_DATE: &str = "2015-01-01";

/// Window and overwrite policy for one enrichment stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageConfig {
    /// First position (inclusive) of the candidate list to process
    pub begin_index: usize,
    /// Last position (exclusive); `None` runs to the end
    pub end_index: Option<usize>,
    /// Allow replacing non-empty cells
    pub overwrite: bool,
}

impl StageConfig {
    /// Clamp the window to a list of `len` candidates
    pub fn window(&self, len: usize) -> std::ops::Range<usize> {
        let end = self.end_index.map_or(len, |e| e.min(len));
        let begin = self.begin_index.min(end);
        begin..end
    }
}

/// HTTP throttling and retry settings
#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
    /// Pause after each request
    pub delay: Duration,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
    /// Base of the exponential backoff
    pub backoff: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1000),
            timeout: Duration::from_secs(10),
            max_retries: 3,
            backoff: Duration::from_millis(500),
            user_agent: concat!("player-base/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub players_path: PathBuf,
    /// Where the enriched table is written; usually the same as `players_path`
    pub output_path: PathBuf,
    pub rankings_dir: PathBuf,
    pub ledger_path: PathBuf,
    pub snapshot_pattern: Regex,
    /// Non-empty cells are only replaced for players who first appeared after this date
    pub min_first_date: Option<NaiveDate>,
    pub wiki: StageConfig,
    pub ioc: StageConfig,
    pub http: HttpConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            players_path: PathBuf::from(DEFAULT_PLAYERS_PATH),
            output_path: PathBuf::from(DEFAULT_PLAYERS_PATH),
            rankings_dir: PathBuf::from(DEFAULT_RANKINGS_DIR),
            ledger_path: PathBuf::from(DEFAULT_LEDGER_PATH),
            snapshot_pattern: Regex::new(DEFAULT_SNAPSHOT_PATTERN).expect("valid default pattern"),
            min_first_date: NaiveDate::from_ymd_opt(2015, 1, 1),
            wiki: StageConfig::default(),
            ioc: StageConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Config rooted at explicit paths, other settings default
    pub fn with_paths(
        players_path: impl Into<PathBuf>,
        rankings_dir: impl Into<PathBuf>,
        ledger_path: impl Into<PathBuf>,
    ) -> Self {
        let players_path = players_path.into();
        Self {
            output_path: players_path.clone(),
            players_path,
            rankings_dir: rankings_dir.into(),
            ledger_path: ledger_path.into(),
            ..Self::default()
        }
    }

    pub fn set_snapshot_pattern(&mut self, pattern: &str) -> Result<()> {
        self.snapshot_pattern = Regex::new(pattern)
            .map_err(|e| PlayerBaseError::Config(format!("bad snapshot pattern '{}': {}", pattern, e)))?;
        Ok(())
    }
}

/// Parse a `min_first_date` setting; empty means no threshold
pub fn parse_min_first_date(value: &str) -> Result<Option<NaiveDate>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| PlayerBaseError::Config(format!("bad min_first_date '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_window() {
        let stage = StageConfig::default();
        assert_eq!(stage.window(10), 0..10);

        let stage = StageConfig { begin_index: 3, end_index: Some(50), overwrite: false };
        assert_eq!(stage.window(10), 3..10);

        let stage = StageConfig { begin_index: 12, end_index: None, overwrite: false };
        assert_eq!(stage.window(10), 10..10);
    }

    #[test]
    fn test_parse_min_first_date() {
        assert_eq!(parse_min_first_date("").unwrap(), None);
        assert_eq!(
            parse_min_first_date(DEFAULT_MIN_FIRST_DATE).unwrap(),
            NaiveDate::from_ymd_opt(2015, 1, 1)
        );
        assert!(parse_min_first_date("01/01/2015").is_err());
    }
}
