//! Parquet persistence for the interim and processed tiers

use std::fs::File;
use std::path::Path;

use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use super::columnar::{append_batch, column_names, to_record_batch};
use super::{DataError, Snapshot};

/// Writes a snapshot to a Snappy-compressed Parquet file.
///
/// No index column is stored; the file holds exactly the snapshot's columns.
pub fn write_parquet(path: &Path, snapshot: &Snapshot) -> Result<(), DataError> {
    let batch = to_record_batch(snapshot)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Loads a Parquet file into a snapshot.
///
/// Works with files written by this crate as well as by pandas or polars.
pub fn read_parquet(path: &Path) -> Result<Snapshot, DataError> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let mut snapshot = Snapshot::new(column_names(builder.schema()), Vec::new());

    let reader = builder.build()?;
    for batch in reader {
        append_batch(&mut snapshot, &batch?)?;
    }
    Ok(snapshot)
}
