//! Conversion between [`Snapshot`] and Arrow record batches
//!
//! Each column gets a single Arrow type chosen from its cells:
//!
//! | cells                          | Arrow type |
//! |--------------------------------|------------|
//! | only `Integer` (and nulls)     | `Int64`    |
//! | `Integer` / `Float` mix        | `Float64`  |
//! | only `Bool`                    | `Boolean`  |
//! | only `String`, or all null     | `Utf8`     |
//!
//! Any other mix is rejected with [`DataError::MixedColumn`] rather than
//! stringified, so a saved snapshot always reads back equal.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Float64Type, Int64Type, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow::util::display::array_value_to_string;

use super::{CellValue, DataError, Snapshot};

// ---------------------------------------------------------------------------
// Snapshot -> Arrow
// ---------------------------------------------------------------------------

fn kind_type(cell: &CellValue) -> Option<DataType> {
    match cell {
        CellValue::Null => None,
        CellValue::Integer(_) => Some(DataType::Int64),
        CellValue::Float(_) => Some(DataType::Float64),
        CellValue::Bool(_) => Some(DataType::Boolean),
        CellValue::String(_) => Some(DataType::Utf8),
    }
}

/// Picks the Arrow type of a column, failing on kinds that cannot share one
fn column_type<'a>(
    name: &str,
    cells: impl Iterator<Item = &'a CellValue>,
) -> Result<DataType, DataError> {
    let mut current: Option<(DataType, &'static str)> = None;
    for cell in cells {
        let Some(cell_type) = kind_type(cell) else {
            continue;
        };
        current = Some(match current {
            None => (cell_type, cell.kind()),
            Some((a, kind)) if a == cell_type => (a, kind),
            Some((DataType::Int64, _)) | Some((DataType::Float64, _))
                if cell_type == DataType::Int64 || cell_type == DataType::Float64 =>
            {
                (DataType::Float64, "float")
            }
            Some((_, kind)) => {
                return Err(DataError::MixedColumn {
                    column: name.to_string(),
                    first: kind,
                    second: cell.kind(),
                })
            }
        });
    }
    Ok(current.map_or(DataType::Utf8, |(data_type, _)| data_type))
}

fn build_array<'a>(data_type: &DataType, cells: impl Iterator<Item = &'a CellValue>) -> ArrayRef {
    match data_type {
        DataType::Int64 => Arc::new(
            cells
                .map(|c| match c {
                    CellValue::Integer(i) => Some(*i),
                    _ => None,
                })
                .collect::<Int64Array>(),
        ),
        DataType::Float64 => Arc::new(
            cells
                .map(|c| match c {
                    CellValue::Float(v) => Some(*v),
                    CellValue::Integer(i) => Some(*i as f64),
                    _ => None,
                })
                .collect::<Float64Array>(),
        ),
        DataType::Boolean => Arc::new(
            cells
                .map(|c| match c {
                    CellValue::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<BooleanArray>(),
        ),
        _ => Arc::new(
            cells
                .map(|c| match c {
                    CellValue::String(s) => Some(s.as_str()),
                    _ => None,
                })
                .collect::<StringArray>(),
        ),
    }
}

/// Builds a record batch holding every row of the snapshot
///
/// # Returns
/// * `Err(DataError::RowWidth)` - a row does not hold one cell per column
/// * `Err(DataError::MixedColumn)` - a column has no single Arrow type
pub fn to_record_batch(snapshot: &Snapshot) -> Result<RecordBatch, DataError> {
    let expected = snapshot.width();
    if let Some((row, cells)) = snapshot
        .rows
        .iter()
        .enumerate()
        .find(|(_, cells)| cells.len() != expected)
    {
        return Err(DataError::RowWidth {
            row,
            expected,
            found: cells.len(),
        });
    }

    let mut fields = Vec::with_capacity(snapshot.width());
    let mut arrays = Vec::with_capacity(snapshot.width());

    for (i, name) in snapshot.columns.iter().enumerate() {
        let data_type = column_type(name, snapshot.column(i))?;
        arrays.push(build_array(&data_type, snapshot.column(i)));
        fields.push(Field::new(name, data_type, true));
    }

    let options = RecordBatchOptions::new().with_row_count(Some(snapshot.len()));
    let batch = RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)?;
    Ok(batch)
}

// ---------------------------------------------------------------------------
// Arrow -> Snapshot
// ---------------------------------------------------------------------------

/// Reads one cell of an Arrow column.
fn cell_at(col: &ArrayRef, row: usize) -> Result<CellValue, DataError> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let value = match col.data_type() {
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        _ => CellValue::String(array_value_to_string(col.as_ref(), row)?),
    };
    Ok(value)
}

/// Widens narrower numeric columns to Int64/Float64 so [`cell_at`] sees a
/// handful of types.
fn normalize(col: &ArrayRef) -> Result<ArrayRef, DataError> {
    let target = match col.data_type() {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32 => DataType::Int64,
        DataType::Float16 | DataType::Float32 => DataType::Float64,
        _ => return Ok(Arc::clone(col)),
    };
    Ok(cast(col.as_ref(), &target)?)
}

/// Appends the rows of a record batch to a snapshot
pub fn append_batch(snapshot: &mut Snapshot, batch: &RecordBatch) -> Result<(), DataError> {
    let columns = batch
        .columns()
        .iter()
        .map(normalize)
        .collect::<Result<Vec<_>, _>>()?;

    for row in 0..batch.num_rows() {
        let cells = columns
            .iter()
            .map(|col| cell_at(col, row))
            .collect::<Result<Vec<_>, _>>()?;
        snapshot.rows.push(cells);
    }
    Ok(())
}

/// Column names of an Arrow schema, in order
pub fn column_names(schema: &Schema) -> Vec<String> {
    schema.fields().iter().map(|f| f.name().clone()).collect()
}
