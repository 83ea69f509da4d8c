//! Kaggle dataset API client
//!
//! Downloads single files from Kaggle datasets through the public REST API
//! and parses them as CSV. Kaggle serves large files zipped, so a ZIP body is
//! unpacked before decoding.

use std::env;
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::BaseDirs;
use flate2::read::DeflateDecoder;
use log::{debug, info, warn};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;

use super::csv_io::parse_csv;
use super::provider::{split_dataset_id, DatasetProvider, ProviderError};
use super::{DataError, Snapshot, TextEncoding};

/// Base URL for the Kaggle API
const KAGGLE_API_BASE_URL: &str = "https://www.kaggle.com/api/v1";

/// Request timeout for downloads; the DataCo file is close to 100 MB
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Signature of a ZIP local file header
const ZIP_LOCAL_HEADER: &[u8] = b"PK\x03\x04";

/// Fixed part of a ZIP local file header, in bytes
const ZIP_HEADER_LEN: usize = 30;

/// API credentials as stored in `kaggle.json`
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct KaggleCredentials {
    pub username: String,
    pub key: String,
}

impl fmt::Debug for KaggleCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KaggleCredentials")
            .field("username", &self.username)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl KaggleCredentials {
    /// Reads `KAGGLE_USERNAME` and `KAGGLE_KEY`
    pub fn from_env() -> Option<Self> {
        let username = env::var("KAGGLE_USERNAME").ok()?;
        let key = env::var("KAGGLE_KEY").ok()?;
        Some(Self { username, key })
    }

    /// Parses a `kaggle.json` credentials file
    pub fn from_file(path: &Path) -> Result<Self, ProviderError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ProviderError::Credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ProviderError::Credentials(format!("cannot parse {}: {}", path.display(), e))
        })
    }

    /// Locates credentials the way the Kaggle CLI does
    ///
    /// Environment variables win, then `$KAGGLE_CONFIG_DIR/kaggle.json`, then
    /// `~/.kaggle/kaggle.json`. Returns `Ok(None)` when none are present.
    pub fn discover() -> Result<Option<Self>, ProviderError> {
        if let Some(credentials) = Self::from_env() {
            return Ok(Some(credentials));
        }
        match Self::credentials_path() {
            Some(path) if path.exists() => Self::from_file(&path).map(Some),
            _ => Ok(None),
        }
    }

    fn credentials_path() -> Option<PathBuf> {
        if let Ok(dir) = env::var("KAGGLE_CONFIG_DIR") {
            return Some(PathBuf::from(dir).join("kaggle.json"));
        }
        let base_dirs = BaseDirs::new()?;
        Some(base_dirs.home_dir().join(".kaggle").join("kaggle.json"))
    }
}

/// Client for downloading dataset files from Kaggle
#[derive(Debug, Clone)]
pub struct KaggleClient {
    /// HTTP client for making requests
    client: Client,
    /// Base URL for the API (allows override for testing)
    base_url: String,
    /// Basic-auth credentials; requests are anonymous without them
    credentials: Option<KaggleCredentials>,
}

impl Default for KaggleClient {
    fn default() -> Self {
        Self::new()
    }
}

impl KaggleClient {
    /// Creates a client for the public Kaggle API with discovered credentials
    pub fn new() -> Self {
        let credentials = KaggleCredentials::discover().unwrap_or_else(|e| {
            warn!("Ignoring Kaggle credentials: {e}");
            None
        });
        Self::with_base_url(KAGGLE_API_BASE_URL).with_credentials(credentials)
    }

    /// Creates an anonymous client against a custom API base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into(),
            credentials: None,
        }
    }

    /// Replaces the credentials used for requests
    pub fn with_credentials(mut self, credentials: Option<KaggleCredentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Builds `{base}/datasets/download/{owner}/{slug}/{file}`
    fn download_url(&self, owner: &str, slug: &str, file_name: &str) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| ProviderError::Url(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::Url(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["datasets", "download", owner, slug, file_name]);
        Ok(url)
    }

    /// Downloads the raw bytes of a dataset file, unpacking ZIP bodies
    pub fn download(&self, dataset_id: &str, file_name: &str) -> Result<Vec<u8>, ProviderError> {
        let (owner, slug) = split_dataset_id(dataset_id)?;
        let url = self.download_url(owner, slug, file_name)?;

        let mut request = self.client.get(url.clone());
        match &self.credentials {
            Some(credentials) => {
                request = request.basic_auth(&credentials.username, Some(&credentials.key));
            }
            None => warn!("No Kaggle credentials found; sending anonymous request"),
        }

        debug!("GET {url}");
        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = response.bytes()?;
        if body.starts_with(ZIP_LOCAL_HEADER) {
            debug!("Response is a ZIP archive ({} bytes), unpacking", body.len());
            unzip_first_entry(&body, file_name)
        } else {
            Ok(body.to_vec())
        }
    }
}

impl DatasetProvider for KaggleClient {
    fn load_dataset(
        &self,
        dataset_id: &str,
        file_name: &str,
        encoding: TextEncoding,
    ) -> Result<Snapshot, ProviderError> {
        info!("Downloading dataset from Kaggle: {dataset_id}");
        let bytes = self.download(dataset_id, file_name)?;
        let text = encoding.decode(&bytes).map_err(|source| DataError::Decode {
            path: PathBuf::from(file_name),
            source,
        })?;
        Ok(parse_csv(&text)?)
    }
}

// ---------------------------------------------------------------------------
// ZIP unpacking
// ---------------------------------------------------------------------------

fn header_bytes(archive: &[u8], offset: usize, len: usize) -> Result<&[u8], ProviderError> {
    archive
        .get(offset..offset + len)
        .ok_or_else(|| ProviderError::Archive("truncated local file header".to_string()))
}

fn le_u16(archive: &[u8], offset: usize) -> Result<u16, ProviderError> {
    let b = header_bytes(archive, offset, 2)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

fn le_u32(archive: &[u8], offset: usize) -> Result<u32, ProviderError> {
    let b = header_bytes(archive, offset, 4)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Extracts the first entry of a ZIP archive
///
/// Kaggle single-file downloads hold exactly one entry, so the central
/// directory is not consulted. Stored and deflated entries are supported.
fn unzip_first_entry(archive: &[u8], expected_name: &str) -> Result<Vec<u8>, ProviderError> {
    let flags = le_u16(archive, 6)?;
    let method = le_u16(archive, 8)?;
    let compressed_size = le_u32(archive, 18)? as usize;
    let name_len = le_u16(archive, 26)? as usize;
    let extra_len = le_u16(archive, 28)? as usize;

    let name = String::from_utf8_lossy(header_bytes(archive, ZIP_HEADER_LEN, name_len)?);
    if name != expected_name {
        warn!("Archive entry '{name}' does not match requested file '{expected_name}'");
    }

    let data_start = ZIP_HEADER_LEN + name_len + extra_len;
    let data = archive
        .get(data_start..)
        .ok_or_else(|| ProviderError::Archive("entry data missing".to_string()))?;

    match method {
        0 => {
            // bit 3: sizes live in a trailing data descriptor
            if flags & 0x08 != 0 {
                return Err(ProviderError::Archive(
                    "stored entry without size in header".to_string(),
                ));
            }
            data.get(..compressed_size)
                .map(<[u8]>::to_vec)
                .ok_or_else(|| ProviderError::Archive("entry data truncated".to_string()))
        }
        8 => {
            let mut out = Vec::new();
            DeflateDecoder::new(data)
                .read_to_end(&mut out)
                .map_err(|e| ProviderError::Archive(e.to_string()))?;
            Ok(out)
        }
        other => Err(ProviderError::Archive(format!(
            "unsupported compression method {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CellValue;
    use flate2::write::DeflateEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    const DATASET: &str = "saicharankomati/dataco-supply-chain-dataset";
    const FILE: &str = "DataCoSupplyChainDataset.csv";
    const DOWNLOAD_PATH: &str =
        "/api/v1/datasets/download/saicharankomati/dataco-supply-chain-dataset/DataCoSupplyChainDataset.csv";

    fn test_client(server: &mockito::Server) -> KaggleClient {
        KaggleClient::with_base_url(format!("{}/api/v1", server.url())).with_credentials(Some(
            KaggleCredentials {
                username: "user".to_string(),
                key: "key".to_string(),
            },
        ))
    }

    /// Builds a single-entry ZIP archive (local header only)
    fn zip_archive(name: &str, method: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(ZIP_LOCAL_HEADER);
        out.extend_from_slice(&20u16.to_le_bytes()); // version
        out.extend_from_slice(&0u16.to_le_bytes()); // flags
        out.extend_from_slice(&method.to_le_bytes());
        out.extend_from_slice(&[0u8; 8]); // time, date, crc
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // uncompressed size, unused
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn test_load_dataset_plain_csv_body() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", DOWNLOAD_PATH)
            .match_header("authorization", "Basic dXNlcjprZXk=")
            .with_status(200)
            .with_body(b"Customer City,Sales\nS\xe3o Paulo,10.5\nCaguas,3.0\n".as_slice())
            .create();

        let snapshot = test_client(&server)
            .load_dataset(DATASET, FILE, TextEncoding::Latin1)
            .expect("Download should succeed");

        mock.assert();
        assert_eq!(snapshot.columns, vec!["Customer City", "Sales"]);
        assert_eq!(snapshot.rows[0][0], CellValue::from("São Paulo"));
        assert_eq!(snapshot.rows[1][1], CellValue::Float(3.0));
    }

    #[test]
    fn test_load_dataset_unpacks_deflated_zip() {
        let csv = b"a,b\n1,x\n2,y\n";
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(csv).unwrap();
        let archive = zip_archive(FILE, 8, &encoder.finish().unwrap());

        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", DOWNLOAD_PATH)
            .with_status(200)
            .with_body(archive)
            .create();

        let snapshot = test_client(&server)
            .load_dataset(DATASET, FILE, TextEncoding::Latin1)
            .expect("Download should succeed");

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.rows[1], vec![CellValue::Integer(2), CellValue::from("y")]);
    }

    #[test]
    fn test_unzip_stored_entry() {
        let archive = zip_archive("data.csv", 0, b"a\n1\n");
        assert_eq!(unzip_first_entry(&archive, "data.csv").unwrap(), b"a\n1\n");
    }

    #[test]
    fn test_unzip_rejects_unknown_method_and_truncation() {
        let archive = zip_archive("data.csv", 12, b"xx");
        assert!(matches!(
            unzip_first_entry(&archive, "data.csv"),
            Err(ProviderError::Archive(_))
        ));
        assert!(matches!(
            unzip_first_entry(b"PK\x03\x04\x14", "data.csv"),
            Err(ProviderError::Archive(_))
        ));
    }

    #[test]
    fn test_non_success_status_is_error() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", DOWNLOAD_PATH).with_status(403).create();

        let result = test_client(&server).load_dataset(DATASET, FILE, TextEncoding::Latin1);

        match result {
            Err(ProviderError::Status { status, url }) => {
                assert_eq!(status.as_u16(), 403);
                assert!(url.ends_with(FILE));
            }
            other => panic!("Expected status error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_dataset_id_fails_before_request() {
        let client = KaggleClient::with_base_url("http://127.0.0.1:9");
        let result = client.load_dataset("not-a-dataset", FILE, TextEncoding::Latin1);
        assert!(matches!(result, Err(ProviderError::InvalidDatasetId(_))));
    }

    #[test]
    fn test_download_url_escapes_segments() {
        let client = KaggleClient::with_base_url("https://www.kaggle.com/api/v1/");
        let url = client.download_url("owner", "slug", "my file.csv").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.kaggle.com/api/v1/datasets/download/owner/slug/my%20file.csv"
        );
    }

    #[test]
    fn test_credentials_from_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("kaggle.json");
        fs::write(&path, r#"{"username": "analyst", "key": "abc123"}"#).unwrap();

        let credentials = KaggleCredentials::from_file(&path).unwrap();

        assert_eq!(credentials.username, "analyst");
        assert_eq!(credentials.key, "abc123");
        assert!(!format!("{credentials:?}").contains("abc123"));
    }

    #[test]
    fn test_credentials_from_malformed_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("kaggle.json");
        fs::write(&path, "{").unwrap();

        assert!(matches!(
            KaggleCredentials::from_file(&path),
            Err(ProviderError::Credentials(_))
        ));
    }
}
