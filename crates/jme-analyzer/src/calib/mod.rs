//! Built-in calibration services.
//!
//! Implementations of the `jme_core` collaborator traits that the analyzer
//! falls back to when the host does not inject its own:
//!
//! - [`jet_id`]: tight PF jet ID per data-taking era
//! - [`jec`]: JEC uncertainty tables
//! - [`muon`]: muon momentum scale/resolution tables

pub mod jec;
pub mod jet_id;
pub mod muon;

pub use jec::{BinnedJecUncertainty, ConstantJecUncertainty, EtaSlice};
pub use jet_id::{CmsJetId, JetIdEra};
pub use muon::{NoMuonCorrection, TabulatedMuonCorrections};
