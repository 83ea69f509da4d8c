//! DataCo dataset cache - command-line front end
//!
//! Keeps the raw DataCo supply-chain download fresh and prints the newest
//! interim or processed snapshots.

use std::io;

use clap::Parser;
use env_logger::Env;

use dataco_cache::cache::CacheManager;
use dataco_cache::cli::{run, Cli};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cache = CacheManager::new(cli.cache_config());

    let stdout = io::stdout();
    run(&cache, &cli.command, &mut stdout.lock())
}
