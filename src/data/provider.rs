//! Remote dataset provider abstraction

use thiserror::Error;

use super::{DataError, Snapshot, TextEncoding};

/// Errors that can occur when fetching a dataset from a provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Dataset identifier is not of the form `owner/slug`
    #[error("Invalid dataset identifier: '{0}' (expected owner/slug)")]
    InvalidDatasetId(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("Provider returned {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    /// Credentials file exists but could not be used
    #[error("Invalid credentials: {0}")]
    Credentials(String),

    /// Downloaded archive could not be unpacked
    #[error("Failed to unpack download: {0}")]
    Archive(String),

    /// Request URL could not be built
    #[error("Invalid provider URL: {0}")]
    Url(String),

    /// Downloaded file could not be parsed
    #[error(transparent)]
    Data(#[from] DataError),
}

/// A source of named tables inside remote datasets
///
/// The cache manager only talks to the remote side through this trait, so
/// tests can swap in an in-memory provider.
pub trait DatasetProvider {
    /// Retrieves `file_name` from dataset `dataset_id`, decoding it with `encoding`
    fn load_dataset(
        &self,
        dataset_id: &str,
        file_name: &str,
        encoding: TextEncoding,
    ) -> Result<Snapshot, ProviderError>;
}

/// Splits a dataset identifier into owner and slug
pub fn split_dataset_id(dataset_id: &str) -> Result<(&str, &str), ProviderError> {
    match dataset_id.split_once('/') {
        Some((owner, slug)) if !owner.is_empty() && !slug.is_empty() && !slug.contains('/') => {
            Ok((owner, slug))
        }
        _ => Err(ProviderError::InvalidDatasetId(dataset_id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_dataset_id() {
        let (owner, slug) = split_dataset_id("saicharankomati/dataco-supply-chain-dataset").unwrap();
        assert_eq!(owner, "saicharankomati");
        assert_eq!(slug, "dataco-supply-chain-dataset");
    }

    #[test]
    fn test_split_dataset_id_rejects_malformed() {
        for bad in ["", "noslash", "/slug", "owner/", "a/b/c"] {
            let err = split_dataset_id(bad).unwrap_err();
            assert!(
                err.to_string().contains("Invalid dataset identifier"),
                "{bad:?} should be rejected"
            );
        }
    }
}
