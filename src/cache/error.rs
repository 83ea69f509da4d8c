use std::path::PathBuf;

use thiserror::Error;

use super::Tier;
use crate::data::{DataError, ProviderError};

/// Errors returned by the cache manager
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Reading or writing a snapshot file failed
    #[error(transparent)]
    Data(#[from] DataError),

    /// Fetching from the remote provider failed
    #[error("Remote fetch failed: {0}")]
    Provider(#[from] ProviderError),

    /// A tier holds no snapshot files
    #[error("No {extension} files in {}", dir.display())]
    NotFound { dir: PathBuf, extension: &'static str },

    /// Versioned operation requested on a tier that is not versioned
    #[error("Tier '{0}' does not hold versioned snapshots")]
    NotVersioned(Tier),
}
