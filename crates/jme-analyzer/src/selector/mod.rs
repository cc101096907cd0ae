//! Per-object quality cuts and calibration.
//!
//! Each selector walks one input collection in order and returns the stored
//! records in that same order. Dropped objects leave no trace except through
//! the multiplicity counters documented on each selector.

mod electron;
mod jet;
mod muon;
mod pf;
mod photon;

pub use electron::select_electrons;
pub use jet::{DEEPJET_MISSING, JetContext, JetSelection, select_jets};
pub use muon::select_muons;
pub use pf::select_pf_candidates;
pub use photon::select_photons;

use crate::record::LeptonRecord;

/// Loose admission on the uncorrected lepton pt.
pub const LOOSE_LEPTON_PT: f64 = 5.0;
/// Extra pt requirement of the lepton veto ID.
pub const VETO_LEPTON_PT: f64 = 10.0;
/// Loose admission on the uncorrected photon pt.
pub const LOOSE_PHOTON_PT: f64 = 10.0;

/// Stored leptons of one flavour plus the veto-passing multiplicity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeptonSelection {
    pub leptons: Vec<LeptonRecord>,
    /// Objects passing the veto ID, including those below the storage cut.
    pub n_veto: i32,
}

/// Working-point decision where an unknown name evaluates to a failure.
fn working_point(decision: Option<bool>, wp: &str, object: &str, debug: bool) -> bool {
    decision.unwrap_or_else(|| {
        if debug {
            log::debug!("{object} has no working point '{wp}', treating as failed");
        }
        false
    })
}
