//! Parquet output for flattened event rows.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use super::export::{ArrowExportError, rows_to_record_batch, schema_for_layout};
use crate::row::{FlatRow, RowLayout, RowSink};

/// Rows buffered before a row group is handed to the writer.
pub const DEFAULT_BATCH_ROWS: usize = 4096;

/// Error type for Parquet operations.
#[derive(Debug, thiserror::Error)]
pub enum ParquetError {
    #[error("Parquet read/write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export error: {0}")]
    Export(#[from] ArrowExportError),

    #[error("writer already finished")]
    Finished,
}

impl From<ParquetError> for jme_core::Error {
    fn from(err: ParquetError) -> Self {
        match err {
            ParquetError::Io(e) => jme_core::Error::Io(e),
            other => jme_core::Error::Output(other.to_string()),
        }
    }
}

/// Read a Parquet file into Arrow RecordBatches.
pub fn read_parquet_batches(path: &Path) -> Result<Vec<RecordBatch>, ParquetError> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let reader = builder.build()?;
    let batches: Result<Vec<_>, _> = reader.collect();
    Ok(batches?)
}

/// Row sink writing Snappy-compressed Parquet.
///
/// The schema is fixed up front from the row layout, so a job that accepts
/// no events still produces a readable (empty) file.
pub struct ParquetSink<W: Write + Send = File> {
    schema: SchemaRef,
    writer: Option<ArrowWriter<W>>,
    buffer: Vec<FlatRow>,
    batch_rows: usize,
    rows_written: usize,
}

impl ParquetSink<File> {
    /// Create (truncate) `path` and write rows with `layout` into it.
    pub fn create(path: &Path, layout: RowLayout) -> Result<Self, ParquetError> {
        Self::new(File::create(path)?, layout)
    }
}

impl<W: Write + Send> ParquetSink<W> {
    pub fn new(out: W, layout: RowLayout) -> Result<Self, ParquetError> {
        let schema = schema_for_layout(layout);
        let props = WriterProperties::builder().set_compression(Compression::SNAPPY).build();
        let writer = ArrowWriter::try_new(out, schema.clone(), Some(props))?;
        Ok(Self {
            schema,
            writer: Some(writer),
            buffer: Vec::new(),
            batch_rows: DEFAULT_BATCH_ROWS,
            rows_written: 0,
        })
    }

    /// Override the number of rows per flushed batch (minimum 1).
    pub fn with_batch_rows(mut self, batch_rows: usize) -> Self {
        self.batch_rows = batch_rows.max(1);
        self
    }

    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    /// Rows handed to the Parquet writer so far (excludes the pending buffer).
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    fn flush(&mut self) -> Result<(), ParquetError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let writer = self.writer.as_mut().ok_or(ParquetError::Finished)?;
        let batch = rows_to_record_batch(self.schema.clone(), &self.buffer)?;
        writer.write(&batch)?;
        self.rows_written += self.buffer.len();
        self.buffer.clear();
        Ok(())
    }

    /// Flush pending rows, write the footer, and hand back the output.
    pub fn close(mut self) -> Result<W, ParquetError> {
        self.flush()?;
        let writer = self.writer.take().ok_or(ParquetError::Finished)?;
        Ok(writer.into_inner()?)
    }
}

impl<W: Write + Send> RowSink for ParquetSink<W> {
    fn write_row(&mut self, row: &FlatRow) -> jme_core::Result<()> {
        if self.writer.is_none() {
            return Err(ParquetError::Finished.into());
        }
        self.buffer.push(row.clone());
        if self.buffer.len() >= self.batch_rows {
            self.flush()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> jme_core::Result<()> {
        self.flush()?;
        if let Some(writer) = self.writer.take() {
            writer.close().map_err(ParquetError::from)?;
        }
        Ok(())
    }
}
