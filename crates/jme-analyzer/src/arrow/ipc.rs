//! Arrow IPC stream output for flattened event rows.

use std::io::Write;

use arrow::datatypes::SchemaRef;
use arrow::ipc::writer::StreamWriter;

use super::export::{ArrowExportError, rows_to_record_batch, schema_for_layout};
use crate::row::{FlatRow, RowLayout, RowSink};

fn output_error(err: impl std::fmt::Display) -> jme_core::Error {
    jme_core::Error::Output(err.to_string())
}

/// Row sink writing an Arrow IPC stream (`pyarrow.ipc.open_stream` readable).
pub struct IpcStreamSink<W: Write> {
    schema: SchemaRef,
    writer: StreamWriter<W>,
    buffer: Vec<FlatRow>,
    batch_rows: usize,
    finished: bool,
}

impl<W: Write> IpcStreamSink<W> {
    pub fn new(out: W, layout: RowLayout, batch_rows: usize) -> Result<Self, ArrowExportError> {
        let schema = schema_for_layout(layout);
        let writer = StreamWriter::try_new(out, &schema)?;
        Ok(Self { schema, writer, buffer: Vec::new(), batch_rows: batch_rows.max(1), finished: false })
    }

    fn flush(&mut self) -> Result<(), ArrowExportError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let batch = rows_to_record_batch(self.schema.clone(), &self.buffer)?;
        self.writer.write(&batch)?;
        self.buffer.clear();
        Ok(())
    }

    /// Finish the stream and hand back the output.
    pub fn into_inner(mut self) -> Result<W, ArrowExportError> {
        if !self.finished {
            self.flush()?;
            self.writer.finish()?;
        }
        Ok(self.writer.into_inner()?)
    }
}

impl<W: Write> RowSink for IpcStreamSink<W> {
    fn write_row(&mut self, row: &FlatRow) -> jme_core::Result<()> {
        if self.finished {
            return Err(output_error("IPC stream already finished"));
        }
        self.buffer.push(row.clone());
        if self.buffer.len() >= self.batch_rows {
            self.flush().map_err(output_error)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> jme_core::Result<()> {
        if self.finished {
            return Ok(());
        }
        self.flush().map_err(output_error)?;
        self.writer.finish().map_err(output_error)?;
        self.finished = true;
        Ok(())
    }
}
