//! DataCo dataset cache library
//!
//! Keeps a local, time-checked copy of the DataCo supply-chain dataset and
//! versioned Parquet snapshots of the pipeline stages built from it.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;

pub use cache::{CacheError, CacheManager, Tier};
pub use config::CacheConfig;
pub use data::{CellValue, Snapshot};
