//! Core data model for the dataset cache
//!
//! A [`Snapshot`] is a plain in-memory table: ordered column names and rows of
//! dynamically typed [`CellValue`]s. The submodules read and write snapshots
//! in the formats used by each storage tier and fetch them from the remote
//! provider.

pub mod columnar;
pub mod csv_io;
pub mod encoding;
pub mod kaggle;
pub mod parquet_io;
pub mod provider;

pub use encoding::{EncodingError, TextEncoding};
pub use kaggle::KaggleClient;
pub use provider::{DatasetProvider, ProviderError};

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Errors from reading or writing snapshot files
#[derive(Debug, Error)]
pub enum DataError {
    /// Filesystem operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File contents could not be decoded with the requested encoding
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: EncodingError,
    },

    /// Snapshot text could not be encoded for writing
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] EncodingError),

    /// Malformed CSV
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Arrow conversion failed
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet read or write failed
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// A row does not hold one cell per column
    #[error("row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A column mixes cell kinds that share no columnar type
    #[error("column '{column}' mixes {first} and {second} values")]
    MixedColumn {
        column: String,
        first: &'static str,
        second: &'static str,
    },
}

/// A single table cell, mirroring the common dataframe dtypes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl CellValue {
    /// Whether the cell holds no value
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Name of the cell's kind, as used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            CellValue::Null => "null",
            CellValue::Bool(_) => "bool",
            CellValue::Integer(_) => "integer",
            CellValue::Float(_) => "float",
            CellValue::String(_) => "string",
        }
    }
}

impl fmt::Display for CellValue {
    /// Formats the cell the way it is written to CSV.
    ///
    /// Floats always carry a decimal point or exponent so they re-read as
    /// floats, and booleans use the capitalised spelling dataframe tools emit.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(true) => f.write_str("True"),
            CellValue::Bool(false) => f.write_str("False"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) if v.is_nan() => Ok(()),
            CellValue::Float(v) => write!(f, "{v:?}"),
            CellValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

/// An in-memory table: one dataset instance at a point in time
///
/// Rows are expected to hold one cell per column. Saving to Parquet rejects
/// rows that do not.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// Column names in order
    pub columns: Vec<String>,
    /// Row-major cell values
    pub rows: Vec<Vec<CellValue>>,
}

impl Snapshot {
    /// Creates a snapshot from column names and rows
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the snapshot has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Iterates over the cells of one column, top to bottom
    ///
    /// Short rows yield `Null` for the missing cell.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &CellValue> + '_ {
        static NULL: CellValue = CellValue::Null;
        self.rows.iter().map(move |row| row.get(index).unwrap_or(&NULL))
    }

    /// Returns a snapshot holding only the first `n` rows
    pub fn head(&self, n: usize) -> Snapshot {
        Snapshot {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}
