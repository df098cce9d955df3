//! Weekly singles rankings from the WTA API, written as snapshot files

use crate::error::{PlayerBaseError, Result};
use crate::model::RankingObservation;
use crate::net::Fetcher;
use crate::rankings::write_snapshot;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const RANKINGS_ENDPOINT: &str = "https://api.wtatennis.com/tennis/players/ranked";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedPlayer {
    pub full_name: Option<String>,
    pub id: Option<u64>,
}

/// One entry of a rankings API page
#[derive(Debug, Clone, Deserialize)]
pub struct RankedItem {
    pub player: Option<RankedPlayer>,
    pub ranking: Option<u32>,
    pub points: Option<f64>,
    pub movement: Option<i32>,
}

#[derive(Debug, Serialize)]
struct FailedRow<'a> {
    failed_urls: &'a str,
}

/// Paging and acceptance limits for one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeLimits {
    pub page_size: usize,
    pub max_pages: usize,
    /// A snapshot with fewer rows is retried, then reported as failed
    pub min_rows: usize,
    pub max_attempts: usize,
}

impl Default for ScrapeLimits {
    fn default() -> Self {
        Self {
            page_size: 20,
            max_pages: 72,
            min_rows: 350,
            max_attempts: 7,
        }
    }
}

#[derive(Debug, Default)]
pub struct ScrapeReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<String>,
}

/// Every 7th day from `start` through `end`, inclusive
pub fn weekly_dates(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        dates.push(current);
        current += Duration::weeks(1);
    }
    dates
}

pub fn snapshot_file_name(date: NaiveDate) -> String {
    format!("data_{}.csv", date.format("%Y_%m_%d"))
}

pub fn page_url(date: NaiveDate, page: usize, page_size: usize) -> Result<String> {
    let page = page.to_string();
    let page_size = page_size.to_string();
    let at = date.format("%Y-%m-%d").to_string();
    let url = url::Url::parse_with_params(
        RANKINGS_ENDPOINT,
        &[
            ("page", page.as_str()),
            ("pageSize", page_size.as_str()),
            ("type", "rankSingles"),
            ("sort", "asc"),
            ("name", ""),
            ("metric", "SINGLES"),
            ("at", at.as_str()),
            ("nationality", ""),
        ],
    )
    .map_err(|e| PlayerBaseError::Config(format!("bad rankings URL: {}", e)))?;
    Ok(url.to_string())
}

/// Convert one API page. Entries without a player or id are skipped.
pub fn observations_from_page(items: &[RankedItem], date: NaiveDate) -> Vec<RankingObservation> {
    items
        .iter()
        .filter_map(|item| {
            let player = item.player.as_ref()?;
            Some(RankingObservation {
                player_id: player.id?,
                full_name: player.full_name.clone().unwrap_or_default(),
                ranking: item.ranking,
                points: item.points,
                movement: item.movement,
                date,
            })
        })
        .collect()
}

pub struct RankingScraper {
    fetcher: Fetcher,
    limits: ScrapeLimits,
}

impl RankingScraper {
    pub fn new(fetcher: Fetcher, limits: ScrapeLimits) -> Self {
        Self { fetcher, limits }
    }

    /// Page through one date until an empty page or the page cap.
    ///
    /// A page that cannot be fetched ends the pass; its URL is added to `failed`.
    fn scrape_once(&mut self, date: NaiveDate, failed: &mut Vec<String>) -> Result<Vec<RankingObservation>> {
        let mut rows = Vec::new();
        for page in 0..self.limits.max_pages {
            let url = page_url(date, page, self.limits.page_size)?;
            log::debug!("Fetching rankings for {} page {}", date, page);

            let items: Vec<RankedItem> = match self.fetcher.get_json(&url) {
                Ok(items) => items,
                Err(e) => {
                    log::warn!("Failed to fetch {}: {}", url, e);
                    failed.push(url);
                    break;
                }
            };
            if items.is_empty() {
                break;
            }
            rows.extend(observations_from_page(&items, date));
        }
        Ok(rows)
    }

    /// Scrape one date, retrying the whole snapshot until it looks complete
    pub fn scrape_date(&mut self, date: NaiveDate, failed: &mut Vec<String>) -> Result<Option<Vec<RankingObservation>>> {
        for attempt in 1..=self.limits.max_attempts {
            println!("Scraping rankings for {} (attempt {}/{})", date, attempt, self.limits.max_attempts);
            let rows = self.scrape_once(date, failed)?;
            if rows.len() >= self.limits.min_rows {
                return Ok(Some(rows));
            }
            log::warn!("{}: only {} rows, retrying", date, rows.len());
        }
        Ok(None)
    }

    /// Scrape every date into `dir`, then record failures in `dir/failed_urls.csv`
    pub fn scrape_dates(&mut self, dates: &[NaiveDate], dir: &Path) -> Result<ScrapeReport> {
        std::fs::create_dir_all(dir)?;
        let mut report = ScrapeReport::default();

        for &date in dates {
            match self.scrape_date(date, &mut report.failed)? {
                Some(rows) => {
                    let path = dir.join(snapshot_file_name(date));
                    write_snapshot(&path, &rows)?;
                    println!("Wrote {} rows to {}", rows.len(), path.display());
                    report.written.push(path);
                }
                None => {
                    println!("Insufficient data for {} after {} attempts", date, self.limits.max_attempts);
                    report.failed.push(format!("Insufficient data for {}", date));
                }
            }
            write_failed(&dir.join("failed_urls.csv"), &report.failed)?;
        }

        log::info!("Scraped {} dates with {} requests", dates.len(), self.fetcher.requests());
        Ok(report)
    }
}

fn write_failed(path: &Path, failed: &[String]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    if failed.is_empty() {
        writer.write_record(["failed_urls"])?;
    }
    for url in failed {
        writer.serialize(FailedRow { failed_urls: url })?;
    }
    writer.flush()?;
    Ok(())
}
