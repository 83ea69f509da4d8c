//! Storage tiers and snapshot file naming
//!
//! Versioned snapshots are named `{name}_{YYYYMMDD_HHMM}.parquet`. The
//! timestamp is fixed width and zero padded, so sorting file names
//! lexicographically sorts snapshots chronologically. "Latest" resolution
//! relies on this: nothing else in a tier directory may carry the tier's
//! extension.

use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime};

/// `strftime` pattern of the snapshot timestamp (minute resolution)
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";

/// Length of a formatted timestamp, e.g. `20240131_0905`
const TIMESTAMP_LEN: usize = 13;

/// A storage stage of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Single canonical download, CSV
    Raw,
    /// Intermediate snapshots, Parquet
    Interim,
    /// Final snapshots, Parquet
    Processed,
}

impl Tier {
    /// All tiers, in pipeline order
    pub const ALL: [Tier; 3] = [Tier::Raw, Tier::Interim, Tier::Processed];

    /// Directory name under `data/`
    pub fn dir_name(self) -> &'static str {
        match self {
            Tier::Raw => "raw",
            Tier::Interim => "interim",
            Tier::Processed => "processed",
        }
    }

    /// File extension of files in this tier (without the dot)
    pub fn extension(self) -> &'static str {
        match self {
            Tier::Raw => "csv",
            Tier::Interim | Tier::Processed => "parquet",
        }
    }

    /// Whether the tier holds timestamped snapshots
    pub fn is_versioned(self) -> bool {
        !matches!(self, Tier::Raw)
    }

    /// Parses a tier name, case-insensitively
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "raw" => Some(Tier::Raw),
            "interim" => Some(Tier::Interim),
            "processed" => Some(Tier::Processed),
            _ => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Formats a snapshot timestamp
pub fn timestamp(at: &DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Builds the file name of a snapshot saved at `at`
pub fn snapshot_filename(tier: Tier, logical_name: &str, at: &DateTime<Local>) -> String {
    format!("{}_{}.{}", logical_name, timestamp(at), tier.extension())
}

/// Splits a snapshot file name into its logical name and timestamp
///
/// Returns `None` for names that do not follow the snapshot pattern.
pub fn parse_snapshot_filename(file_name: &str) -> Option<(&str, NaiveDateTime)> {
    let (stem, _ext) = file_name.rsplit_once('.')?;
    if stem.len() < TIMESTAMP_LEN + 2 || !stem.is_char_boundary(stem.len() - TIMESTAMP_LEN) {
        return None;
    }
    let (name, stamp) = stem.split_at(stem.len() - TIMESTAMP_LEN);
    let name = name.strip_suffix('_')?;
    let at = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
    Some((name, at))
}
