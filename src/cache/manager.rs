//! Cache manager for the raw, interim and processed tiers
//!
//! Provides a `CacheManager` that keeps the raw download fresh, persists
//! versioned Parquet snapshots, and resolves the most recent snapshot of a
//! tier for downstream consumers.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};
use log::{info, warn};

use super::staleness::{file_age_at, is_stale, is_stale_at};
use super::tier::snapshot_filename;
use super::{CacheError, Tier};
use crate::config::CacheConfig;
use crate::data::csv_io::{read_csv, write_csv};
use crate::data::parquet_io::{read_parquet, write_parquet};
use crate::data::{DataError, DatasetProvider, KaggleClient, Snapshot, TextEncoding};

/// Where a raw snapshot was loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawOrigin {
    /// Read from a fresh file in the raw tier
    Cached,
    /// Downloaded from the provider because the file was missing or stale
    Fetched,
}

/// A raw snapshot together with how it was obtained
#[derive(Debug, Clone)]
pub struct RawLoad {
    /// The loaded data
    pub snapshot: Snapshot,
    /// Whether the data came from disk or from the provider
    pub origin: RawOrigin,
    /// Encoding the data was decoded with
    pub encoding: TextEncoding,
    /// File the data was read from or written to
    pub path: PathBuf,
}

/// Freshness report for the canonical raw file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatus {
    /// Canonical raw file path
    pub path: PathBuf,
    /// Age by modification time, if the file exists
    pub age: Option<Duration>,
    /// Whether the next `load_raw` would download
    pub is_stale: bool,
}

/// Manages the local copy of the dataset across the three storage tiers
///
/// The raw tier holds one canonical CSV that is downloaded again through the
/// [`DatasetProvider`] once it is older than the configured maximum age. The
/// interim and processed tiers hold write-once Parquet snapshots named
/// `{name}_{YYYYMMDD_HHMM}.parquet`; the newest is found by sorting file names.
///
/// There is no locking: concurrent processes sharing the same directories can
/// interleave raw writes or collide on snapshot names saved in the same minute.
#[derive(Debug, Clone)]
pub struct CacheManager<P = KaggleClient> {
    /// Paths, dataset identity and freshness policy
    config: CacheConfig,
    /// Remote source of the raw dataset
    provider: P,
}

impl CacheManager<KaggleClient> {
    /// Creates a CacheManager that downloads from Kaggle
    pub fn new(config: CacheConfig) -> Self {
        Self::with_provider(config, KaggleClient::new())
    }
}

impl<P: DatasetProvider> CacheManager<P> {
    /// Creates a CacheManager with a custom provider
    ///
    /// Useful for testing or for mirrors of the dataset.
    pub fn with_provider(config: CacheConfig, provider: P) -> Self {
        Self { config, provider }
    }

    /// Returns the configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Creates the three tier directories if they do not exist
    ///
    /// Idempotent. Saving and fetching also create the directory they write to.
    pub fn init(&self) -> Result<(), CacheError> {
        for tier in Tier::ALL {
            self.ensure_dir(tier)?;
        }
        Ok(())
    }

    /// Returns the directory of a tier
    pub fn tier_dir(&self, tier: Tier) -> PathBuf {
        self.config.tier_dir(tier)
    }

    /// Ensures a tier directory exists and returns it
    fn ensure_dir(&self, tier: Tier) -> io::Result<PathBuf> {
        let dir = self.tier_dir(tier);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    // -----------------------------------------------------------------------
    // Raw tier
    // -----------------------------------------------------------------------

    /// Reports the age and staleness of the canonical raw file
    pub fn raw_status(&self) -> RawStatus {
        let path = self.config.canonical_raw_path();
        let now = SystemTime::now();
        let age = file_age_at(&path, now);
        let is_stale = is_stale_at(&path, self.config.max_age, now);
        RawStatus { path, age, is_stale }
    }

    /// Downloads the canonical raw dataset and caches it in the raw tier
    ///
    /// The file is overwritten in place with the configured raw encoding. A
    /// failed download leaves any previous file untouched; an interrupted
    /// write may leave it truncated.
    ///
    /// # Returns
    /// * `Ok(Snapshot)` - the data as returned by the provider
    /// * `Err(CacheError::Provider)` - the provider failed; nothing was written
    pub fn fetch_remote(&self) -> Result<Snapshot, CacheError> {
        let encoding = self.config.raw_write_encoding;
        let snapshot =
            self.provider
                .load_dataset(&self.config.dataset_id, &self.config.raw_filename, encoding)?;

        self.ensure_dir(Tier::Raw)?;
        let path = self.config.canonical_raw_path();
        write_csv(&path, &snapshot, encoding)?;
        info!("Download complete, saved to {}", path.display());

        Ok(snapshot)
    }

    /// Loads the canonical raw dataset, downloading it if missing or stale
    pub fn load_raw(&self) -> Result<Snapshot, CacheError> {
        let filename = self.config.raw_filename.clone();
        self.load_raw_file(&filename)
    }

    /// Loads a file from the raw tier, downloading the canonical dataset if
    /// that file is missing or stale
    ///
    /// See [`load_raw_detailed`](Self::load_raw_detailed).
    pub fn load_raw_file(&self, filename: &str) -> Result<Snapshot, CacheError> {
        self.load_raw_detailed(filename).map(|load| load.snapshot)
    }

    /// Loads a file from the raw tier and reports how it was obtained
    ///
    /// # Behavior
    /// - If `filename` is missing or older than the maximum age, the canonical
    ///   dataset is fetched and returned instead. Only the canonical file is
    ///   ever downloaded or written, whatever `filename` was requested.
    /// - Otherwise the file is decoded with the primary encoding, and once more
    ///   with the fallback encoding if that fails to decode. Other read errors
    ///   are returned as-is.
    pub fn load_raw_detailed(&self, filename: &str) -> Result<RawLoad, CacheError> {
        let path = self.config.raw_path(filename);

        if is_stale(&path, self.config.max_age) {
            warn!(
                "Raw dataset {} missing or outdated, downloading fresh copy",
                path.display()
            );
            let snapshot = self.fetch_remote()?;
            return Ok(RawLoad {
                snapshot,
                origin: RawOrigin::Fetched,
                encoding: self.config.raw_write_encoding,
                path: self.config.canonical_raw_path(),
            });
        }

        info!("Loading raw file: {}", path.display());
        let (snapshot, encoding) = self.read_with_fallback(&path)?;
        Ok(RawLoad {
            snapshot,
            origin: RawOrigin::Cached,
            encoding,
            path,
        })
    }

    /// Reads a CSV file with the primary encoding, retrying once with the
    /// fallback encoding on a decode failure
    fn read_with_fallback(&self, path: &Path) -> Result<(Snapshot, TextEncoding), CacheError> {
        let primary = self.config.read_encoding;
        let fallback = self.config.fallback_encoding;

        match read_csv(path, primary) {
            Ok(snapshot) => Ok((snapshot, primary)),
            Err(DataError::Decode { source, .. }) => {
                warn!("{primary} decode failed ({source}), retrying with {fallback}");
                let snapshot = read_csv(path, fallback)?;
                Ok((snapshot, fallback))
            }
            Err(e) => Err(e.into()),
        }
    }

    // -----------------------------------------------------------------------
    // Versioned tiers
    // -----------------------------------------------------------------------

    /// Saves a snapshot to a versioned tier, timestamped with the current time
    ///
    /// # Arguments
    /// * `tier` - `Tier::Interim` or `Tier::Processed`
    /// * `snapshot` - The data to persist
    /// * `logical_name` - Prefix of the file name (e.g., "orders_clean")
    ///
    /// # Returns
    /// * `Ok(PathBuf)` - the written file
    /// * `Err(CacheError::NotVersioned)` - if `tier` is the raw tier
    pub fn save_snapshot(
        &self,
        tier: Tier,
        snapshot: &Snapshot,
        logical_name: &str,
    ) -> Result<PathBuf, CacheError> {
        self.save_snapshot_at(tier, snapshot, logical_name, &Local::now())
    }

    /// Saves a snapshot to a versioned tier with an explicit timestamp
    ///
    /// A file saved under the same name in the same minute is overwritten.
    pub fn save_snapshot_at(
        &self,
        tier: Tier,
        snapshot: &Snapshot,
        logical_name: &str,
        at: &DateTime<Local>,
    ) -> Result<PathBuf, CacheError> {
        if !tier.is_versioned() {
            return Err(CacheError::NotVersioned(tier));
        }
        let dir = self.ensure_dir(tier)?;
        let path = dir.join(snapshot_filename(tier, logical_name, at));

        write_parquet(&path, snapshot)?;
        info!("{} snapshot saved to {}", tier, path.display());
        Ok(path)
    }

    /// Saves a snapshot to the interim tier
    pub fn save_interim(&self, snapshot: &Snapshot, logical_name: &str) -> Result<PathBuf, CacheError> {
        self.save_snapshot(Tier::Interim, snapshot, logical_name)
    }

    /// Saves a snapshot to the processed tier
    pub fn save_processed(
        &self,
        snapshot: &Snapshot,
        logical_name: &str,
    ) -> Result<PathBuf, CacheError> {
        self.save_snapshot(Tier::Processed, snapshot, logical_name)
    }

    /// Lists the snapshot files of a tier, newest first
    ///
    /// Files are ordered by name, descending. A missing directory yields an
    /// empty list.
    pub fn list_snapshots(&self, tier: Tier) -> Result<Vec<PathBuf>, CacheError> {
        if !tier.is_versioned() {
            return Err(CacheError::NotVersioned(tier));
        }
        let dir = self.tier_dir(tier);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let matches_ext = path
                .extension()
                .is_some_and(|ext| ext == tier.extension());
            if matches_ext && path.is_file() {
                files.push(path);
            }
        }
        files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
        Ok(files)
    }

    /// Returns the path of the newest snapshot in a tier
    pub fn latest_snapshot_path(&self, tier: Tier) -> Result<PathBuf, CacheError> {
        self.list_snapshots(tier)?
            .into_iter()
            .next()
            .ok_or_else(|| CacheError::NotFound {
                dir: self.tier_dir(tier),
                extension: tier.extension(),
            })
    }

    /// Loads the newest snapshot of a tier
    ///
    /// # Returns
    /// * `Ok(Snapshot)` - contents of the file with the greatest name
    /// * `Err(CacheError::NotFound)` - if the tier holds no snapshot files
    pub fn load_latest(&self, tier: Tier) -> Result<Snapshot, CacheError> {
        self.load_latest_with_path(tier).map(|(_, snapshot)| snapshot)
    }

    /// Loads the newest snapshot of a tier along with the file it came from
    ///
    /// The directory is listed once, so the returned path is always the file
    /// that was read.
    pub fn load_latest_with_path(&self, tier: Tier) -> Result<(PathBuf, Snapshot), CacheError> {
        let path = self.latest_snapshot_path(tier)?;
        info!("Loading latest file: {}", path.display());
        let snapshot = read_parquet(&path)?;
        Ok((path, snapshot))
    }

    /// Loads the newest interim snapshot
    pub fn load_latest_interim(&self) -> Result<Snapshot, CacheError> {
        self.load_latest(Tier::Interim)
    }

    /// Loads the newest processed snapshot
    pub fn load_latest_processed(&self) -> Result<Snapshot, CacheError> {
        self.load_latest(Tier::Processed)
    }
}
