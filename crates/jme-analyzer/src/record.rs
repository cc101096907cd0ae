//! The per-event output aggregate.

use jme_core::{EventId, PileupJetIdVariables};
use serde::Serialize;

use crate::catalog::FilterDecisionSet;
use crate::trigger::TriggerBits;

/// Charged-hadron pt thresholds for the primary-vertex multiplicity sums.
pub const CHARGED_HADRON_PT_THRESHOLDS: [f64; 6] = [0.0, 0.3, 0.5, 1.0, 5.0, 10.0];

/// Sentinel for generator-jet fields of unmatched jets.
pub const NO_GEN_MATCH: f32 = -99.0;

/// Sentinel for an unknown true pileup count.
pub const UNKNOWN_PILEUP: i32 = -1;

/// Selected electron or muon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LeptonRecord {
    pub eta: f32,
    pub phi: f32,
    /// Uncorrected pt.
    pub pt: f32,
    /// Scale/smear corrected pt.
    pub pt_corr: f32,
    /// `-11 * charge` for electrons, `-13 * charge` for muons.
    pub pdg_id: i32,
    pub pass_tight_id: bool,
}

/// Selected photon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhotonRecord {
    pub eta: f32,
    pub phi: f32,
    pub pt: f32,
    pub pt_corr: f32,
    pub pass_tight_id: bool,
}

/// Selected jet with its full feature vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JetRecord {
    pub eta: f32,
    pub phi: f32,
    pub pt: f32,
    pub raw_pt: f32,
    pub pt_no_l2l3_res: f32,
    /// Total correction factor `pt / raw_pt`.
    pub jec_factor: f32,
    pub jec_uncertainty: f32,

    pub chef: f32,
    pub nhef: f32,
    pub neef: f32,
    pub ceef: f32,
    pub muef: f32,
    pub charged_multiplicity: i32,
    pub neutral_hadron_multiplicity: i32,
    pub photon_multiplicity: i32,
    pub neutral_multiplicity: i32,
    pub area: f32,
    pub pass_id: bool,

    pub pt_gen: f32,
    pub eta_gen: f32,
    pub phi_gen: f32,
    pub pt_gen_with_nu: f32,

    pub pu_mva: f32,
    pub pu_mva_update: f32,
    pub pu_mva_update_2017: f32,
    pub pu_mva_update_2018: f32,
    /// Recomputed pileup-ID inputs; `None` when the producer did not run.
    pub pu_id_variables: Option<PileupJetIdVariables>,

    pub hadron_flavour: i32,
    pub parton_flavour: i32,
    pub deepjet_b: f32,
    pub deepjet_c: f32,
    pub deepjet_uds: f32,
    pub deepjet_g: f32,
    pub quark_gluon_likelihood: f32,
}

/// Stored PF candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PfCandidateRecord {
    pub pt: f32,
    pub eta: f32,
    pub phi: f32,
    pub pdg_id: i32,
    pub from_pv: i32,
}

/// Charged hadrons from the primary-vertex fit, per pt threshold.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ChargedHadronSums {
    pub counts: [i32; CHARGED_HADRON_PT_THRESHOLDS.len()],
    pub ht: [f32; CHARGED_HADRON_PT_THRESHOLDS.len()],
}

/// Generator lepton kept for offline matching.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenLeptonRecord {
    pub pt: f32,
    pub eta: f32,
    pub phi: f32,
    pub pdg_id: i32,
}

/// Generator photon kept for offline matching.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenPhotonRecord {
    pub pt: f32,
    pub eta: f32,
    pub phi: f32,
}

/// Everything derived from one event.
///
/// Built with [`Default`] at the start of every event and owned by the
/// analyzer until it is written or dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub id: EventId,
    pub n_vertices: i32,
    pub rho: f32,
    pub rho_central_neutral: f32,

    pub filters: FilterDecisionSet,
    pub triggers: TriggerBits,
    pub l1_prefire: bool,

    pub leptons: Vec<LeptonRecord>,
    pub n_electrons: i32,
    pub n_muons: i32,
    pub photons: Vec<PhotonRecord>,
    pub jets: Vec<JetRecord>,
    /// Highest jet pt seen before any jet cut.
    pub lead_jet_pt: f32,
    pub pf_candidates: Vec<PfCandidateRecord>,
    pub charged_hadrons: ChargedHadronSums,

    pub met: f32,
    pub met_phi: f32,
    pub puppi_met: f32,
    pub puppi_met_phi: f32,

    pub gen_leptons: Vec<GenLeptonRecord>,
    pub gen_photons: Vec<GenPhotonRecord>,
    pub gen_ht: f32,
    pub gen_met: f32,
    pub gen_met_phi: f32,
    pub weight: f32,
    pub true_n_vertices: i32,
}

impl Default for EventRecord {
    fn default() -> Self {
        Self {
            id: EventId::default(),
            n_vertices: 0,
            rho: 0.0,
            rho_central_neutral: 0.0,
            filters: FilterDecisionSet::default(),
            triggers: TriggerBits::default(),
            l1_prefire: false,
            leptons: Vec::new(),
            n_electrons: 0,
            n_muons: 0,
            photons: Vec::new(),
            jets: Vec::new(),
            lead_jet_pt: 0.0,
            pf_candidates: Vec::new(),
            charged_hadrons: ChargedHadronSums::default(),
            met: 0.0,
            met_phi: 0.0,
            puppi_met: 0.0,
            puppi_met_phi: 0.0,
            gen_leptons: Vec::new(),
            gen_photons: Vec::new(),
            gen_ht: 0.0,
            gen_met: 0.0,
            gen_met_phi: 0.0,
            weight: 0.0,
            true_n_vertices: UNKNOWN_PILEUP,
        }
    }
}

impl EventRecord {
    /// Fresh record for the event `id`.
    pub fn new(id: EventId) -> Self {
        Self { id, ..Default::default() }
    }
}
