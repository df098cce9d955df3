use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use player_base::config::{
    parse_min_first_date, HttpConfig, PipelineConfig, StageConfig, DEFAULT_LEDGER_PATH, DEFAULT_MIN_FIRST_DATE,
    DEFAULT_PLAYERS_PATH, DEFAULT_RANKINGS_DIR,
};
use player_base::net::Fetcher;
use player_base::pipeline;
use player_base::rankings::DEFAULT_SNAPSHOT_PATTERN;
use player_base::sources::{CountrySource, WikiSource};

#[derive(Parser)]
#[command(name = "player-base")]
#[command(about = "Maintain the WTA player base: merge rankings, enrich players, log changes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct ConfigArgs {
    /// Master player table to read
    #[arg(long, env = "PLAYER_BASE_PLAYERS", default_value = DEFAULT_PLAYERS_PATH)]
    players_path: PathBuf,

    /// Where to write the updated table (defaults to --players-path)
    #[arg(long, env = "PLAYER_BASE_OUTPUT")]
    output_path: Option<PathBuf>,

    /// Directory of weekly ranking snapshots
    #[arg(long, env = "PLAYER_BASE_RANKINGS", default_value = DEFAULT_RANKINGS_DIR)]
    rankings_dir: PathBuf,

    /// Regex that snapshot file names must match
    #[arg(long, default_value = DEFAULT_SNAPSHOT_PATTERN)]
    snapshot_pattern: String,

    /// Change ledger (regenerated each run)
    #[arg(long, env = "PLAYER_BASE_LEDGER", default_value = DEFAULT_LEDGER_PATH)]
    ledger_path: PathBuf,

    /// Only players first ranked after this date may have filled fields overwritten (empty disables)
    #[arg(long, env = "PLAYER_BASE_MIN_FIRST_DATE", default_value = DEFAULT_MIN_FIRST_DATE)]
    min_first_date: String,

    /// Allow Wikipedia values to replace filled cells
    #[arg(long)]
    overwrite_wiki: bool,

    /// Allow scraped country codes to replace filled cells
    #[arg(long)]
    overwrite_ioc: bool,

    /// First active-player position to scrape from Wikipedia
    #[arg(long, default_value = "0")]
    begin_index_wiki: usize,

    /// Position to stop Wikipedia scraping at (exclusive)
    #[arg(long)]
    end_index_wiki: Option<usize>,

    /// First table row to scrape a country code for
    #[arg(long, default_value = "0")]
    begin_index_ioc: usize,

    /// Row to stop country scraping at (exclusive)
    #[arg(long)]
    end_index_ioc: Option<usize>,

    /// Pause after each HTTP request in milliseconds
    #[arg(long, default_value = "1000")]
    delay_ms: u64,

    /// Retries for transient HTTP failures
    #[arg(long, default_value = "3")]
    max_retries: u32,

    /// Base of the exponential retry backoff in milliseconds
    #[arg(long, default_value = "500")]
    backoff_ms: u64,
}

impl ConfigArgs {
    fn into_config(self) -> Result<PipelineConfig> {
        let mut config = PipelineConfig {
            output_path: self.output_path.unwrap_or_else(|| self.players_path.clone()),
            players_path: self.players_path,
            rankings_dir: self.rankings_dir,
            ledger_path: self.ledger_path,
            min_first_date: parse_min_first_date(&self.min_first_date)?,
            wiki: StageConfig {
                begin_index: self.begin_index_wiki,
                end_index: self.end_index_wiki,
                overwrite: self.overwrite_wiki,
            },
            ioc: StageConfig {
                begin_index: self.begin_index_ioc,
                end_index: self.end_index_ioc,
                overwrite: self.overwrite_ioc,
            },
            http: HttpConfig {
                delay: Duration::from_millis(self.delay_ms),
                max_retries: self.max_retries,
                backoff: Duration::from_millis(self.backoff_ms),
                ..HttpConfig::default()
            },
            ..PipelineConfig::default()
        };
        config.set_snapshot_pattern(&self.snapshot_pattern)?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch weekly ranking snapshots from the WTA API
    ScrapeRankings {
        /// First Monday to fetch (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Last Monday to fetch (YYYY-MM-DD), defaults to --start
        #[arg(long)]
        end: Option<NaiveDate>,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Add new players from the snapshots and update last appearances
    Refresh {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Fill biographical fields of active players from Wikipedia
    Enrich {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Fill represented country codes from the WTA site and TennisEnDirect
    Countries {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Scrape (optional), refresh, enrich biographies, then countries
    Run {
        /// First Monday to scrape before running
        #[arg(long, requires = "end")]
        start: Option<NaiveDate>,

        /// Last Monday to scrape before running
        #[arg(long, requires = "start")]
        end: Option<NaiveDate>,

        #[command(flatten)]
        config: ConfigArgs,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::ScrapeRankings { start, end, config } => {
            let config = config.into_config()?;
            let report = pipeline::scrape_rankings(&config, start, end.unwrap_or(start))
                .context("Failed to scrape rankings")?;
            println!("Wrote {} snapshots, {} failures", report.written.len(), report.failed.len());
        }
        Commands::Refresh { config } => {
            let config = config.into_config()?;
            let report = pipeline::refresh(&config).context("Failed to refresh player base")?;
            println!("{} players ({} new, {} last appearances moved)", report.total, report.added, report.last_seen_updated);
        }
        Commands::Enrich { config } => {
            let config = config.into_config()?;
            let mut source = WikiSource::new(Fetcher::new(config.http.clone())?);
            let report = pipeline::enrich(&config, &mut source).context("Wikipedia enrichment failed")?;
            println!(
                "Done! {} fetched, {} failed, {} changes logged",
                report.stats.fetched, report.stats.failed, report.changes
            );
        }
        Commands::Countries { config } => {
            let config = config.into_config()?;
            let mut source = CountrySource::new(Fetcher::new(config.http.clone())?);
            let report = pipeline::enrich_countries(&config, &mut source).context("Country enrichment failed")?;
            println!(
                "Done! {} fetched, {} failed, {} changes logged",
                report.stats.fetched, report.stats.failed, report.changes
            );
        }
        Commands::Run { start, end, config } => {
            let config = config.into_config()?;
            let scrape = start.zip(end);
            pipeline::run(&config, scrape).context("Pipeline run failed")?;
        }
    }

    Ok(())
}
