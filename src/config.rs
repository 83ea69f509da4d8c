//! Cache configuration
//!
//! Everything the cache manager needs to know about paths, the remote
//! dataset and the freshness policy lives in [`CacheConfig`]. Defaults point
//! at the DataCo supply-chain dataset under `./data`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::Tier;
use crate::data::TextEncoding;

/// Kaggle identifier of the DataCo supply-chain dataset
pub const DEFAULT_DATASET_ID: &str = "saicharankomati/dataco-supply-chain-dataset";

/// Canonical name of the raw download
pub const DEFAULT_RAW_FILENAME: &str = "DataCoSupplyChainDataset.csv";

/// Maximum age of the raw file before it is downloaded again
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration for a [`CacheManager`](crate::cache::CacheManager)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Project root; tiers live under `<root>/data/`
    pub root: PathBuf,
    /// Remote dataset identifier (`owner/slug`)
    pub dataset_id: String,
    /// File name of the canonical raw download, also the remote table name
    pub raw_filename: String,
    /// Staleness threshold for raw files
    pub max_age: Duration,
    /// Encoding tried first when reading raw files
    pub read_encoding: TextEncoding,
    /// Encoding tried once if the primary read fails to decode
    pub fallback_encoding: TextEncoding,
    /// Encoding used to request and persist the raw download
    pub raw_write_encoding: TextEncoding,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            dataset_id: DEFAULT_DATASET_ID.to_string(),
            raw_filename: DEFAULT_RAW_FILENAME.to_string(),
            max_age: DEFAULT_MAX_AGE,
            read_encoding: TextEncoding::Utf8,
            fallback_encoding: TextEncoding::Latin1,
            raw_write_encoding: TextEncoding::Latin1,
        }
    }
}

impl CacheConfig {
    /// Default configuration rooted at `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Overrides the staleness threshold
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// `<root>/data`
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Directory of a storage tier
    pub fn tier_dir(&self, tier: Tier) -> PathBuf {
        self.data_dir().join(tier.dir_name())
    }

    /// Path of a file in the raw tier
    pub fn raw_path(&self, filename: impl AsRef<Path>) -> PathBuf {
        self.tier_dir(Tier::Raw).join(filename)
    }

    /// Path of the canonical raw download
    pub fn canonical_raw_path(&self) -> PathBuf {
        self.raw_path(&self.raw_filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.dataset_id, "saicharankomati/dataco-supply-chain-dataset");
        assert_eq!(config.raw_filename, "DataCoSupplyChainDataset.csv");
        assert_eq!(config.max_age, Duration::from_secs(86_400));
        assert_eq!(config.read_encoding, TextEncoding::Utf8);
        assert_eq!(config.fallback_encoding, TextEncoding::Latin1);
        assert_eq!(config.raw_write_encoding, TextEncoding::Latin1);
    }

    #[test]
    fn test_cache_config_custom() {
        let config = CacheConfig::with_root("/tmp/project").with_max_age(Duration::from_secs(60));
        assert_eq!(config.max_age, Duration::from_secs(60));
        assert_eq!(config.root, PathBuf::from("/tmp/project"));
    }

    #[test]
    fn test_tier_layout() {
        let config = CacheConfig::with_root("/srv/pipeline");
        assert_eq!(
            config.canonical_raw_path(),
            PathBuf::from("/srv/pipeline/data/raw/DataCoSupplyChainDataset.csv")
        );
        assert_eq!(
            config.tier_dir(Tier::Interim),
            PathBuf::from("/srv/pipeline/data/interim")
        );
        assert_eq!(
            config.tier_dir(Tier::Processed),
            PathBuf::from("/srv/pipeline/data/processed")
        );
    }
}
