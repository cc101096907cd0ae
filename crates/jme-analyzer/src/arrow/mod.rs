//! Columnar output of flattened event rows.
//!
//! Every row produced by [`crate::row::flatten`] for a given
//! [`RowLayout`](crate::row::RowLayout) has the same columns in the same
//! order, so the Arrow schema is fixed when the sink is opened:
//!
//! | Row value        | Arrow type       |
//! |------------------|------------------|
//! | `U64`            | `UInt64`         |
//! | `I32`            | `Int32`          |
//! | `F32`            | `Float32`        |
//! | `Bool`           | `Boolean`        |
//! | `I32List`        | `List<Int32>`    |
//! | `F32List`        | `List<Float32>`  |
//! | `BoolList`       | `List<Boolean>`  |
//!
//! # Modules
//!
//! - [`export`]: rows → Arrow RecordBatch
//! - [`parquet`]: Parquet sink and reader
//! - [`ipc`]: Arrow IPC stream sink

pub mod export;
pub mod ipc;
pub mod parquet;
