//! Flat rows → Arrow RecordBatch.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanBuilder, Float32Builder, Int32Builder, ListBuilder, UInt64Builder,
};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;

use crate::record::EventRecord;
use crate::row::{ColumnValue, FlatRow, RowLayout, flatten};

/// Error type for Arrow export.
#[derive(Debug, thiserror::Error)]
pub enum ArrowExportError {
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("row {row}: column '{column}' does not match the schema")]
    SchemaMismatch { row: usize, column: String },
}

fn list_of(item: DataType) -> DataType {
    DataType::List(Arc::new(Field::new_list_field(item, true)))
}

fn data_type(value: &ColumnValue) -> DataType {
    match value {
        ColumnValue::U64(_) => DataType::UInt64,
        ColumnValue::I32(_) => DataType::Int32,
        ColumnValue::F32(_) => DataType::Float32,
        ColumnValue::Bool(_) => DataType::Boolean,
        ColumnValue::I32List(_) => list_of(DataType::Int32),
        ColumnValue::F32List(_) => list_of(DataType::Float32),
        ColumnValue::BoolList(_) => list_of(DataType::Boolean),
    }
}

/// Arrow schema of `row`.
pub fn schema_for_row(row: &FlatRow) -> SchemaRef {
    let fields: Vec<Field> =
        row.columns().iter().map(|(name, value)| Field::new(*name, data_type(value), false)).collect();
    Arc::new(Schema::new(fields))
}

/// Arrow schema shared by every row of a job with `layout`.
pub fn schema_for_layout(layout: RowLayout) -> SchemaRef {
    schema_for_row(&flatten(&EventRecord::default(), layout))
}

enum ColumnBuilder {
    U64(UInt64Builder),
    I32(Int32Builder),
    F32(Float32Builder),
    Bool(BooleanBuilder),
    I32List(ListBuilder<Int32Builder>),
    F32List(ListBuilder<Float32Builder>),
    BoolList(ListBuilder<BooleanBuilder>),
}

impl ColumnBuilder {
    fn for_value(value: &ColumnValue) -> Self {
        match value {
            ColumnValue::U64(_) => ColumnBuilder::U64(UInt64Builder::new()),
            ColumnValue::I32(_) => ColumnBuilder::I32(Int32Builder::new()),
            ColumnValue::F32(_) => ColumnBuilder::F32(Float32Builder::new()),
            ColumnValue::Bool(_) => ColumnBuilder::Bool(BooleanBuilder::new()),
            ColumnValue::I32List(_) => ColumnBuilder::I32List(ListBuilder::new(Int32Builder::new())),
            ColumnValue::F32List(_) => {
                ColumnBuilder::F32List(ListBuilder::new(Float32Builder::new()))
            }
            ColumnValue::BoolList(_) => {
                ColumnBuilder::BoolList(ListBuilder::new(BooleanBuilder::new()))
            }
        }
    }

    /// Append `value`; `false` when its type differs from the builder's.
    fn append(&mut self, value: &ColumnValue) -> bool {
        match (self, value) {
            (ColumnBuilder::U64(b), ColumnValue::U64(v)) => b.append_value(*v),
            (ColumnBuilder::I32(b), ColumnValue::I32(v)) => b.append_value(*v),
            (ColumnBuilder::F32(b), ColumnValue::F32(v)) => b.append_value(*v),
            (ColumnBuilder::Bool(b), ColumnValue::Bool(v)) => b.append_value(*v),
            (ColumnBuilder::I32List(b), ColumnValue::I32List(v)) => {
                b.values().append_slice(v);
                b.append(true);
            }
            (ColumnBuilder::F32List(b), ColumnValue::F32List(v)) => {
                b.values().append_slice(v);
                b.append(true);
            }
            (ColumnBuilder::BoolList(b), ColumnValue::BoolList(v)) => {
                b.values().append_slice(v);
                b.append(true);
            }
            _ => return false,
        }
        true
    }

    fn finish(self) -> ArrayRef {
        match self {
            ColumnBuilder::U64(mut b) => Arc::new(b.finish()),
            ColumnBuilder::I32(mut b) => Arc::new(b.finish()),
            ColumnBuilder::F32(mut b) => Arc::new(b.finish()),
            ColumnBuilder::Bool(mut b) => Arc::new(b.finish()),
            ColumnBuilder::I32List(mut b) => Arc::new(b.finish()),
            ColumnBuilder::F32List(mut b) => Arc::new(b.finish()),
            ColumnBuilder::BoolList(mut b) => Arc::new(b.finish()),
        }
    }
}

/// Export `rows` as one RecordBatch with `schema`.
///
/// Every row must carry exactly the schema's columns, in order and with
/// matching types.
pub fn rows_to_record_batch(
    schema: SchemaRef,
    rows: &[FlatRow],
) -> Result<RecordBatch, ArrowExportError> {
    let mut builders: Vec<ColumnBuilder> = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let sample = match field.data_type() {
            DataType::UInt64 => ColumnValue::U64(0),
            DataType::Int32 => ColumnValue::I32(0),
            DataType::Float32 => ColumnValue::F32(0.0),
            DataType::Boolean => ColumnValue::Bool(false),
            DataType::List(item) => match item.data_type() {
                DataType::Int32 => ColumnValue::I32List(Vec::new()),
                DataType::Float32 => ColumnValue::F32List(Vec::new()),
                DataType::Boolean => ColumnValue::BoolList(Vec::new()),
                other => {
                    return Err(arrow::error::ArrowError::SchemaError(format!(
                        "unsupported list item type {other} for column '{}'",
                        field.name()
                    ))
                    .into());
                }
            },
            other => {
                return Err(arrow::error::ArrowError::SchemaError(format!(
                    "unsupported type {other} for column '{}'",
                    field.name()
                ))
                .into());
            }
        };
        builders.push(ColumnBuilder::for_value(&sample));
    }

    for (r, row) in rows.iter().enumerate() {
        if row.len() != builders.len() {
            return Err(ArrowExportError::SchemaMismatch {
                row: r,
                column: format!("<{} columns, expected {}>", row.len(), builders.len()),
            });
        }
        for ((builder, field), (name, value)) in
            builders.iter_mut().zip(schema.fields().iter()).zip(row.columns())
        {
            if *name != field.name().as_str() || !builder.append(value) {
                return Err(ArrowExportError::SchemaMismatch { row: r, column: name.to_string() });
            }
        }
    }

    let columns: Vec<ArrayRef> = builders.into_iter().map(ColumnBuilder::finish).collect();
    Ok(RecordBatch::try_new(schema, columns)?)
}
