//! Command-line interface for the dataset cache
//!
//! This module handles parsing of CLI arguments using clap and runs the
//! selected command against a [`CacheManager`].

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use arrow::util::pretty::pretty_format_batches;
use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::cache::tier::parse_snapshot_filename;
use crate::cache::{CacheManager, RawOrigin, Tier};
use crate::config::CacheConfig;
use crate::data::columnar::to_record_batch;
use crate::data::{DatasetProvider, Snapshot};

/// Largest accepted `--max-age-hours`, one hundred years
pub const MAX_AGE_HOURS_LIMIT: u64 = 100 * 365 * 24;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified tier name is not a versioned tier
    #[error("Invalid tier: '{0}'. Valid tiers: interim, processed")]
    InvalidTier(String),
}

/// DataCo dataset cache - keep the raw download fresh and inspect snapshots
#[derive(Parser, Debug)]
#[command(name = "dataco-cache")]
#[command(about = "Local cache of the DataCo supply-chain dataset")]
#[command(version)]
pub struct Cli {
    /// Project root; tiers live under <ROOT>/data
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Maximum age of the raw file before it is downloaded again
    #[arg(
        long,
        global = true,
        value_name = "HOURS",
        value_parser = clap::value_parser!(u64).range(..=MAX_AGE_HOURS_LIMIT)
    )]
    pub max_age_hours: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Commands understood by the binary
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load the raw dataset, downloading it if missing or stale
    Raw {
        /// File in the raw tier to load instead of the canonical download
        #[arg(long)]
        filename: Option<String>,
        /// Number of rows to print
        #[arg(long, default_value_t = 5)]
        head: usize,
    },
    /// Download the raw dataset regardless of its age
    Fetch {
        /// Number of rows to print
        #[arg(long, default_value_t = 5)]
        head: usize,
    },
    /// Load the newest snapshot of a tier
    Latest {
        /// interim or processed
        #[arg(value_parser = parse_tier_arg)]
        tier: Tier,
        /// Number of rows to print
        #[arg(long, default_value_t = 5)]
        head: usize,
        /// Print rows as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List the snapshots of a tier, newest first
    List {
        /// interim or processed
        #[arg(value_parser = parse_tier_arg)]
        tier: Tier,
    },
    /// Show the age and staleness of the raw file
    Status,
}

/// Parses a tier argument into a versioned [`Tier`].
///
/// # Returns
/// * `Ok(Tier)` for `interim` or `processed`
/// * `Err(CliError::InvalidTier)` for anything else, including `raw`
pub fn parse_tier_arg(s: &str) -> Result<Tier, CliError> {
    Tier::from_name(s)
        .filter(|tier| tier.is_versioned())
        .ok_or_else(|| CliError::InvalidTier(s.to_string()))
}

impl Cli {
    /// Builds the cache configuration from the global arguments
    pub fn cache_config(&self) -> CacheConfig {
        let config = CacheConfig::with_root(&self.root);
        match self.max_age_hours {
            Some(hours) => config.with_max_age(Duration::from_secs(hours * 60 * 60)),
            None => config,
        }
    }
}

/// Runs a command, writing human-readable output to `out`
pub fn run<P: DatasetProvider, W: Write>(
    cache: &CacheManager<P>,
    command: &Command,
    out: &mut W,
) -> anyhow::Result<()> {
    cache.init().context("creating tier directories")?;

    match command {
        Command::Raw { filename, head } => {
            let filename = filename.as_deref().unwrap_or(&cache.config().raw_filename);
            let load = cache.load_raw_detailed(filename)?;
            let origin = match load.origin {
                RawOrigin::Cached => "cached",
                RawOrigin::Fetched => "downloaded",
            };
            writeln!(out, "{} ({origin}, {})", load.path.display(), load.encoding)?;
            write_table(out, &load.snapshot, *head)?;
        }
        Command::Fetch { head } => {
            let snapshot = cache.fetch_remote()?;
            writeln!(out, "{}", cache.config().canonical_raw_path().display())?;
            write_table(out, &snapshot, *head)?;
        }
        Command::Latest { tier, head, json } => {
            let (path, snapshot) = cache.load_latest_with_path(*tier)?;
            if *json {
                serde_json::to_writer_pretty(&mut *out, &snapshot.head(*head))?;
                writeln!(out)?;
            } else {
                writeln!(out, "{}", path.display())?;
                write_table(out, &snapshot, *head)?;
            }
        }
        Command::List { tier } => {
            for path in cache.list_snapshots(*tier)? {
                let saved_at = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .and_then(parse_snapshot_filename)
                    .map(|(_, at)| at.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                writeln!(out, "{saved_at:<16}  {}", path.display())?;
            }
        }
        Command::Status => {
            let status = cache.raw_status();
            writeln!(out, "Raw file: {}", status.path.display())?;
            match status.age {
                Some(age) => writeln!(out, "Age:      {}", format_age(age))?,
                None => writeln!(out, "Age:      missing")?,
            }
            let stale = if status.is_stale { "yes" } else { "no" };
            writeln!(out, "Stale:    {stale} (max age {})", format_age(cache.config().max_age))?;
        }
    }
    Ok(())
}

/// Prints the shape of a snapshot and its first `head` rows as a table
fn write_table<W: Write>(out: &mut W, snapshot: &Snapshot, head: usize) -> anyhow::Result<()> {
    writeln!(out, "{} rows x {} columns", snapshot.len(), snapshot.width())?;
    if head > 0 && snapshot.width() > 0 {
        let batch = to_record_batch(&snapshot.head(head))?;
        writeln!(out, "{}", pretty_format_batches(&[batch])?)?;
    }
    Ok(())
}

/// Formats a duration as hours and minutes, e.g. `26h 05m`
fn format_age(age: Duration) -> String {
    let minutes = age.as_secs() / 60;
    format!("{}h {:02}m", minutes / 60, minutes % 60)
}
