//! Analyzer configuration.

use std::path::PathBuf;

use jme_core::MuonSelector;
use serde::{Deserialize, Serialize};

use crate::skim::SkimPolicy;

/// Job-level configuration, fixed for the lifetime of an [`crate::Analyzer`].
///
/// Every field has a default, so partial YAML/JSON documents are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Minimum corrected jet pt to store.
    pub jet_pt_cut: f64,
    /// Minimum raw electron pt to store.
    pub electron_pt_cut: f64,
    /// Minimum raw muon pt to store.
    pub muon_pt_cut: f64,
    /// Minimum corrected photon pt to store.
    pub photon_pt_cut: f64,
    /// Minimum PF candidate pt to store.
    pub pf_candidate_pt_cut: f64,

    /// Electron veto working point.
    pub electron_veto_wp: String,
    /// Electron tight working point.
    pub electron_tight_wp: String,
    /// Photon tight working point.
    pub photon_tight_wp: String,
    /// Muon selectors that must all pass for the veto.
    pub muon_veto_selectors: Vec<MuonSelector>,
    /// Muon selectors that must all pass for the tight ID.
    pub muon_tight_selectors: Vec<MuonSelector>,
    /// Era tag handed to the jet-ID provider.
    pub jet_id_era: String,

    /// Event skim.
    pub skim: SkimPolicy,

    /// Emit one row per accepted event.
    pub save_tree: bool,
    /// Input is simulation.
    pub is_mc: bool,
    /// Store the recomputed pileup-ID input variables.
    pub save_pu_id_variables: bool,
    /// Drop low-pt jets without a generator match (simulation only).
    pub drop_unmatched_jets: bool,
    /// Drop jets failing the jet ID.
    pub drop_bad_jets: bool,
    /// Drop photons failing the tight ID instead of flagging them.
    pub apply_photon_id: bool,
    /// Prefer the reclustered generator-jet associations over the intrinsic match.
    pub use_updated_gen_jets: bool,
    /// Log every fallback decision.
    pub debug: bool,

    /// Tabulated muon momentum corrections (JSON).
    pub muon_correction_file: Option<PathBuf>,
    /// Binned JEC uncertainty table (JSON).
    pub jec_uncertainty_file: Option<PathBuf>,
    /// `(run, event)` pairs to process; empty means all.
    pub pick_events: Vec<[u64; 2]>,
    /// Seed of the muon-smearing random stream.
    pub seed: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            jet_pt_cut: 20.0,
            electron_pt_cut: 20.0,
            muon_pt_cut: 20.0,
            photon_pt_cut: 20.0,
            pf_candidate_pt_cut: 25.0,
            electron_veto_wp: "cutBasedElectronID-Fall17-94X-V2-veto".to_string(),
            electron_tight_wp: "cutBasedElectronID-Fall17-94X-V2-tight".to_string(),
            photon_tight_wp: "cutBasedPhotonID-Fall17-94X-V2-tight".to_string(),
            muon_veto_selectors: vec![MuonSelector::CutBasedIdLoose, MuonSelector::PfIsoVeryLoose],
            muon_tight_selectors: vec![MuonSelector::CutBasedIdMediumPrompt, MuonSelector::PfIsoTight],
            jet_id_era: "2018".to_string(),
            skim: SkimPolicy::None,
            save_tree: true,
            is_mc: false,
            save_pu_id_variables: false,
            drop_unmatched_jets: false,
            drop_bad_jets: true,
            apply_photon_id: false,
            use_updated_gen_jets: true,
            debug: false,
            muon_correction_file: None,
            jec_uncertainty_file: None,
            pick_events: Vec::new(),
            seed: 0,
        }
    }
}

impl AnalyzerConfig {
    /// Unmatched-jet dropping never applies to collision data.
    pub fn effective_drop_unmatched_jets(&self) -> bool {
        self.is_mc && self.drop_unmatched_jets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_document_keeps_defaults() {
        let cfg: AnalyzerConfig =
            serde_json::from_str(r#"{"is_mc": true, "skim": "Photon", "jet_pt_cut": 30}"#).unwrap();
        assert!(cfg.is_mc);
        assert_eq!(cfg.skim, SkimPolicy::IsolatedPhoton);
        assert_eq!(cfg.jet_pt_cut, 30.0);
        assert_eq!(cfg.muon_pt_cut, 20.0);
        assert_eq!(cfg.jet_id_era, "2018");
        assert!(cfg.drop_bad_jets);
    }

    #[test]
    fn unmatched_jet_drop_is_forced_off_for_data() {
        let mut cfg = AnalyzerConfig { drop_unmatched_jets: true, ..Default::default() };
        assert!(!cfg.effective_drop_unmatched_jets());
        cfg.is_mc = true;
        assert!(cfg.effective_drop_unmatched_jets());
    }
}
