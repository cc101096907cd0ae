//! # jme-analyzer
//!
//! Per-event object selection and flattening for jet/MET performance
//! studies. An [`Analyzer`] turns one [`jme_core::RawEventInput`] into an
//! [`EventRecord`] (leptons, photons, jets, PF candidates, MET, filter and
//! trigger bits, generator truth for simulation), applies the configured
//! skim, and writes accepted events as one flat row to a [`RowSink`].
//!
//! Optional inputs never fail an event: each has a documented fallback
//! (see [`resolver`]). Missing structurally required collections abort the
//! event with [`jme_core::Error::MissingCollection`].

#![allow(missing_docs)]
#![warn(clippy::all)]

#[cfg(feature = "arrow-io")]
pub mod arrow;
pub mod assembler;
pub mod calib;
pub mod catalog;
pub mod config;
pub mod monitor;
pub mod pick;
pub mod record;
pub mod resolver;
pub mod row;
pub mod selector;
pub mod skim;
pub mod trigger;
pub mod truth;

pub use assembler::{Analyzer, AnalyzerBuilder, EventOutcome, RunStats};
pub use catalog::{FilterBit, FilterDecision, FilterDecisionSet};
pub use config::AnalyzerConfig;
pub use monitor::{Histogram, MonitoringHistograms};
pub use pick::PickList;
pub use record::EventRecord;
pub use row::{ColumnValue, FlatRow, JsonLinesSink, RowLayout, RowSink, VecSink, flatten};
pub use skim::{SkimPolicy, SkimStage};
pub use trigger::{HLT_PATHS, TriggerBits};
