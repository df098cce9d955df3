//! Revert rejected overwrites
//!
//! Reads a change ledger, and for every row whose `reject` column is `1` writes the
//! logged `old_value` back into the table. Mark rows by hand after reviewing the
//! ledger, then run:
//!
//!     revert-overwrites <summary.csv> <enriched.csv> [<fixed_output.csv>]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use player_base::revert::revert_overwrites;

#[derive(Parser)]
#[command(name = "revert-overwrites")]
#[command(about = "Restore old values for ledger rows marked reject = 1")]
struct Cli {
    /// Change ledger with reviewer marks
    summary_csv: PathBuf,

    /// Table the ledger describes
    enriched_csv: PathBuf,

    /// Where to write the fixed table (defaults to overwriting enriched_csv)
    output_csv: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let report = revert_overwrites(&cli.summary_csv, &cli.enriched_csv, cli.output_csv.as_deref())
        .context("Failed to revert overwrites")?;

    if report.skipped > 0 {
        eprintln!("{} flagged rows could not be applied (see log)", report.skipped);
    }
    Ok(())
}
