//! CSV reading and writing for the raw tier
//!
//! Files are decoded as a whole with a [`TextEncoding`] before parsing, so a
//! decode failure is always reported as [`DataError::Decode`] and never as a
//! CSV error. Column types are inferred once per column.

use std::fs;
use std::path::Path;

use super::{CellValue, DataError, Snapshot, TextEncoding};

/// Cell texts treated as missing values
const NULL_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL"];

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Reads a CSV file decoded with the given encoding
pub fn read_csv(path: &Path, encoding: TextEncoding) -> Result<Snapshot, DataError> {
    let bytes = fs::read(path)?;
    let text = encoding.decode(&bytes).map_err(|source| DataError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    parse_csv(&text)
}

/// Parses CSV text with a header row into a snapshot
pub fn parse_csv(text: &str) -> Result<Snapshot, DataError> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        raw_rows.push(record.iter().map(str::to_string).collect());
    }

    let kinds: Vec<ColumnKind> = (0..columns.len())
        .map(|i| infer_kind(raw_rows.iter().filter_map(|row| row.get(i).map(String::as_str))))
        .collect();

    let rows = raw_rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&kinds)
                .map(|(text, kind)| kind.parse(text))
                .collect()
        })
        .collect();

    Ok(Snapshot::new(columns, rows))
}

/// Inferred type of a CSV column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Float,
    Bool,
    Text,
}

fn is_null_marker(s: &str) -> bool {
    NULL_MARKERS.contains(&s)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Picks the narrowest type every non-null cell of a column parses as
fn infer_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut integer = true;
    let mut float = true;
    let mut boolean = true;
    let mut seen = false;

    for cell in cells.filter(|c| !is_null_marker(c)) {
        seen = true;
        integer = integer && cell.parse::<i64>().is_ok();
        float = float && cell.parse::<f64>().is_ok();
        boolean = boolean && parse_bool(cell).is_some();
        if !integer && !float && !boolean {
            return ColumnKind::Text;
        }
    }

    if !seen {
        ColumnKind::Text
    } else if integer {
        ColumnKind::Integer
    } else if float {
        ColumnKind::Float
    } else if boolean {
        ColumnKind::Bool
    } else {
        ColumnKind::Text
    }
}

impl ColumnKind {
    fn parse(self, text: String) -> CellValue {
        if is_null_marker(&text) {
            return CellValue::Null;
        }
        let parsed = match self {
            ColumnKind::Integer => text.parse().ok().map(CellValue::Integer),
            ColumnKind::Float => text.parse().ok().map(CellValue::Float),
            ColumnKind::Bool => parse_bool(&text).map(CellValue::Bool),
            ColumnKind::Text => None,
        };
        parsed.unwrap_or(CellValue::String(text))
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Renders a snapshot as CSV text with a header row and no index column
pub fn render_csv(snapshot: &Snapshot) -> Result<String, DataError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&snapshot.columns)?;
    for row in &snapshot.rows {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| DataError::Io(e.into_error()))?;
    // The csv writer only ever emits the UTF-8 text it was given
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Writes a snapshot as CSV in the given encoding, replacing any existing file
///
/// The file is written in place; an interrupted write leaves it truncated.
pub fn write_csv(path: &Path, snapshot: &Snapshot, encoding: TextEncoding) -> Result<(), DataError> {
    let text = render_csv(snapshot)?;
    let bytes = encoding.encode(&text)?;
    fs::write(path, bytes)?;
    Ok(())
}
