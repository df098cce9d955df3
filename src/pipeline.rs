//! Pipeline stages wired to a [`PipelineConfig`]
//!
//! Each stage loads what it needs, computes new outputs in memory, and persists the
//! table (and ledger) only once the stage has finished.

use crate::config::PipelineConfig;
use crate::enrich::{enrich as run_engine, rows_for_ids, EnrichStats, OverwritePolicy};
use crate::error::Result;
use crate::ledger::{write_ledger, Ledger, PriorLedger};
use crate::model::{ChangeRecord, PlayerTable};
use crate::net::Fetcher;
use crate::players::{find_new_ids, load_players, save_players, summarize_new_players, update_last_appearances};
use crate::rankings::{active_ids, load_rankings};
use crate::sources::rankings_api::{weekly_dates, RankingScraper, ScrapeLimits, ScrapeReport};
use crate::sources::{CandidateSource, CountrySource, WikiSource};
use chrono::NaiveDate;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub added: usize,
    pub last_seen_updated: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Default)]
pub struct StageReport {
    pub stats: EnrichStats,
    pub changes: usize,
}

/// Pure refresh step: add players new to the rankings and move last appearances forward
pub fn refresh_table(players: &PlayerTable, rankings: &[crate::model::RankingObservation]) -> (PlayerTable, RefreshReport) {
    let new_ids = find_new_ids(players, rankings);
    let mut table = players.clone();
    let added = if new_ids.is_empty() {
        0
    } else {
        let new_players = summarize_new_players(rankings, &new_ids, &table.columns);
        table.append(new_players)
    };

    let (table, last_seen_updated) = update_last_appearances(&table, rankings);
    let report = RefreshReport {
        added,
        last_seen_updated,
        total: table.len(),
    };
    (table, report)
}

/// Merge the ranking snapshots into the player table and save it
pub fn refresh(config: &PipelineConfig) -> Result<RefreshReport> {
    let players = load_players(&config.players_path)?;
    let rankings = load_rankings(&config.rankings_dir, &config.snapshot_pattern)?;

    let (table, report) = refresh_table(&players, &rankings);
    if report.added > 0 {
        println!("Added {} new players.", report.added);
    } else {
        println!("No new players to add.");
    }

    save_players(&table, &config.output_path)?;
    println!("Player data refreshed and written to {}", config.output_path.display());
    Ok(report)
}

/// Biographical enrichment of active players, on an already loaded table
pub fn enrich_biography(
    config: &PipelineConfig,
    table: &PlayerTable,
    active: &std::collections::HashSet<u64>,
    source: &mut dyn CandidateSource,
    prior: &PriorLedger,
) -> (PlayerTable, Vec<ChangeRecord>, EnrichStats) {
    let rows = rows_for_ids(table, active);
    let window = config.wiki.window(rows.len());
    let policy = OverwritePolicy::new(config.wiki.overwrite, config.min_first_date);
    println!(
        "Enriching {} of {} active players from {}",
        window.len(),
        rows.len(),
        source.name()
    );

    let outcome = run_engine(table, &rows, window, source, prior, &policy);
    (outcome.table, outcome.changes, outcome.stats)
}

/// Country-code enrichment over the whole table, on an already loaded table
pub fn enrich_country(
    config: &PipelineConfig,
    table: &PlayerTable,
    source: &mut dyn CandidateSource,
    prior: &PriorLedger,
) -> (PlayerTable, Vec<ChangeRecord>, EnrichStats) {
    let rows: Vec<usize> = (0..table.len()).collect();
    let window = config.ioc.window(rows.len());
    // The recency threshold only guards biographical fields
    let policy = OverwritePolicy::new(config.ioc.overwrite, None);
    println!("Scraping country codes for rows {}..{} of {}", window.start, window.end, rows.len());

    let outcome = run_engine(table, &rows, window, source, prior, &policy);
    (outcome.table, outcome.changes, outcome.stats)
}

/// Persist the table, then the regenerated ledger
fn persist(config: &PipelineConfig, table: &PlayerTable, changes: Vec<ChangeRecord>, prior: &PriorLedger) -> Result<usize> {
    let ledger = Ledger::regenerate(changes, prior);
    save_players(table, &config.output_path)?;
    println!("Enriched file -> {}", config.output_path.display());

    write_ledger(&config.ledger_path, &ledger)?;
    let accepted = ledger.accepted().count();
    if accepted == 0 {
        println!("No new overwrites to log.");
    } else {
        println!("Change log with preserved rejects -> {}", config.ledger_path.display());
    }
    Ok(accepted)
}

/// Run the Wikipedia stage with the given source and write table and ledger
pub fn enrich(config: &PipelineConfig, source: &mut dyn CandidateSource) -> Result<StageReport> {
    let prior = PriorLedger::load(&config.ledger_path)?;
    let table = load_players(&config.players_path)?;
    let rankings = load_rankings(&config.rankings_dir, &config.snapshot_pattern)?;
    let active = active_ids(&rankings);

    let (table, changes, stats) = enrich_biography(config, &table, &active, source, &prior);
    let changes = persist(config, &table, changes, &prior)?;
    Ok(StageReport { stats, changes })
}

/// Run the country stage with the given source and write table and ledger
pub fn enrich_countries(config: &PipelineConfig, source: &mut dyn CandidateSource) -> Result<StageReport> {
    let prior = PriorLedger::load(&config.ledger_path)?;
    let table = load_players(&config.players_path)?;

    let (table, changes, stats) = enrich_country(config, &table, source, &prior);
    let changes = persist(config, &table, changes, &prior)?;
    Ok(StageReport { stats, changes })
}

/// Fetch weekly snapshots for every week from `start` to `end` into the rankings directory
pub fn scrape_rankings(config: &PipelineConfig, start: NaiveDate, end: NaiveDate) -> Result<ScrapeReport> {
    let dates = weekly_dates(start, end);
    let fetcher = Fetcher::new(config.http.clone())?;
    let mut scraper = RankingScraper::new(fetcher, ScrapeLimits::default());
    scraper.scrape_dates(&dates, &config.rankings_dir)
}

/// Full run with caller-supplied sources. Both stages share one regenerated ledger.
pub fn run_with_sources(
    config: &PipelineConfig,
    wiki: &mut dyn CandidateSource,
    country: &mut dyn CandidateSource,
) -> Result<(RefreshReport, StageReport, StageReport)> {
    let refreshed = refresh(config)?;

    let prior = PriorLedger::load(&config.ledger_path)?;
    let table = load_players(&config.output_path)?;
    let rankings = load_rankings(&config.rankings_dir, &config.snapshot_pattern)?;
    let active = active_ids(&rankings);

    let (table, mut changes, wiki_stats) = enrich_biography(config, &table, &active, wiki, &prior);
    let wiki_changes = changes.len();
    let (table, mut country_changes, country_stats) = enrich_country(config, &table, country, &prior);
    let country_count = country_changes.len();
    changes.append(&mut country_changes);

    persist(config, &table, changes, &prior)?;

    Ok((
        refreshed,
        StageReport { stats: wiki_stats, changes: wiki_changes },
        StageReport { stats: country_stats, changes: country_count },
    ))
}

/// Full run against the live sources, optionally scraping new snapshots first
pub fn run(config: &PipelineConfig, scrape: Option<(NaiveDate, NaiveDate)>) -> Result<()> {
    if let Some((start, end)) = scrape {
        let report = scrape_rankings(config, start, end)?;
        println!("Scraped {} snapshots ({} failures)", report.written.len(), report.failed.len());
    }

    let mut wiki = WikiSource::new(Fetcher::new(config.http.clone())?);
    let mut country = CountrySource::new(Fetcher::new(config.http.clone())?);
    let (refreshed, wiki_report, country_report) = run_with_sources(config, &mut wiki, &mut country)?;

    log::info!(
        "Run complete: {} players ({} new), {} biography changes, {} country changes",
        refreshed.total,
        refreshed.added,
        wiki_report.changes,
        country_report.changes
    );
    println!(
        "Review {} and mark rejects with 1, then run:\n  revert-overwrites {} {}",
        config.ledger_path.display(),
        config.ledger_path.display(),
        config.output_path.display()
    );
    Ok(())
}
