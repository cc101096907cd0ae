//! Per-event raw input handed over by the host framework.
//!
//! Every collection is an `Option`: `None` means the producer did not run (an
//! invalid handle), which is distinct from a present but empty collection.
//! Nothing in here outlives one event.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Event identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventId {
    /// Run number.
    pub run: u64,
    /// Event number.
    pub event: u64,
    /// Luminosity block.
    #[serde(default)]
    pub lumi_block: u64,
    /// Bunch crossing.
    #[serde(default)]
    pub bunch_crossing: u64,
}

/// Stable per-object reference key: the position of a jet in the jet collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JetKey(pub usize);

/// Per-jet side product computed by an upstream producer, keyed by [`JetKey`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueMap<T>(pub Vec<T>);

impl<T> ValueMap<T> {
    /// Value stored for `key`, if the producer filled one.
    pub fn get(&self, key: JetKey) -> Option<&T> {
        self.0.get(key.0)
    }
}

/// One path of a trigger-bit collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerPath {
    /// Full path name, including any version suffix.
    pub name: String,
    /// Whether the path accepted the event.
    pub accept: bool,
}

/// A trigger-bit collection (HLT paths or MET-filter flags).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriggerResults {
    /// Paths in framework order.
    pub paths: Vec<TriggerPath>,
}

impl TriggerResults {
    /// Build from `(name, accept)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, bool)>) -> Self {
        Self {
            paths: pairs
                .into_iter()
                .map(|(name, accept)| TriggerPath { name: name.to_string(), accept })
                .collect(),
        }
    }

    /// Accept bit of the first path whose name contains `fragment`.
    pub fn first_containing(&self, fragment: &str) -> Option<bool> {
        self.paths.iter().find(|p| p.name.contains(fragment)).map(|p| p.accept)
    }
}

/// Reconstructed primary vertex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawVertex {
    /// Longitudinal position (cm).
    #[serde(default)]
    pub z: f64,
    /// Fit degrees of freedom.
    #[serde(default)]
    pub ndof: f64,
}

/// Energy-scale/smearing annotations attached to an electron.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElectronEnergyCorrection {
    /// ECAL-only energy after corrections.
    pub ecal_energy_post_corr: f64,
    /// Combined ECAL+tracker energy after corrections.
    pub ecal_trk_energy_post_corr: f64,
}

/// Reconstructed electron.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawElectron {
    /// Uncorrected transverse momentum.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuth.
    pub phi: f64,
    /// Uncorrected energy.
    pub energy: f64,
    /// Electric charge (±1).
    pub charge: i32,
    /// Scale/smear annotation, present when the upstream corrector ran.
    #[serde(default)]
    pub energy_correction: Option<ElectronEnergyCorrection>,
    /// Identification decisions by working-point name.
    #[serde(default)]
    pub ids: BTreeMap<String, bool>,
}

impl RawElectron {
    /// Decision for working point `wp`; `None` for an unknown name.
    pub fn id(&self, wp: &str) -> Option<bool> {
        self.ids.get(wp).copied()
    }
}

/// Muon quality and isolation selector flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MuonSelector {
    /// Loose cut-based identification.
    CutBasedIdLoose,
    /// Medium cut-based identification.
    CutBasedIdMedium,
    /// Medium cut-based identification with prompt requirements.
    CutBasedIdMediumPrompt,
    /// Tight cut-based identification.
    CutBasedIdTight,
    /// Very loose PF isolation.
    #[serde(rename = "PFIsoVeryLoose")]
    PfIsoVeryLoose,
    /// Loose PF isolation.
    #[serde(rename = "PFIsoLoose")]
    PfIsoLoose,
    /// Medium PF isolation.
    #[serde(rename = "PFIsoMedium")]
    PfIsoMedium,
    /// Tight PF isolation.
    #[serde(rename = "PFIsoTight")]
    PfIsoTight,
    /// Very tight PF isolation.
    #[serde(rename = "PFIsoVeryTight")]
    PfIsoVeryTight,
}

/// Generator lepton matched to a reconstructed muon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GenLepton {
    /// Generator transverse momentum.
    pub pt: f64,
    /// Generator pseudorapidity.
    #[serde(default)]
    pub eta: f64,
    /// Generator azimuth.
    #[serde(default)]
    pub phi: f64,
}

/// Inner-tracker reference of a muon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerTrack {
    /// Tracker layers with a measurement.
    pub tracker_layers_with_measurement: u32,
}

/// Reconstructed muon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMuon {
    /// Uncorrected transverse momentum.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuth.
    pub phi: f64,
    /// Electric charge (±1).
    pub charge: i32,
    /// Selector flags this muon passes.
    #[serde(default)]
    pub selectors: Vec<MuonSelector>,
    /// Matched generator lepton (simulation only).
    #[serde(default)]
    pub gen_lepton: Option<GenLepton>,
    /// Inner-tracker reference, if the muon has one.
    #[serde(default)]
    pub inner_track: Option<InnerTrack>,
}

impl RawMuon {
    /// Whether the muon passes `selector`.
    pub fn passed(&self, selector: MuonSelector) -> bool {
        self.selectors.contains(&selector)
    }
}

/// Reconstructed photon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPhoton {
    /// Uncorrected transverse momentum.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuth.
    pub phi: f64,
    /// Uncorrected energy.
    pub energy: f64,
    /// Corrected ECAL energy, present when the upstream corrector ran.
    #[serde(default)]
    pub ecal_energy_post_corr: Option<f64>,
    /// Identification decisions by working-point name.
    #[serde(default)]
    pub ids: BTreeMap<String, bool>,
    /// Conversion-safe electron veto.
    #[serde(default)]
    pub pass_electron_veto: bool,
    /// Pixel seed matched to the supercluster.
    #[serde(default)]
    pub has_pixel_seed: bool,
    /// Shower-shape variable R9.
    #[serde(default)]
    pub r9: f64,
}

impl RawPhoton {
    /// Decision for working point `wp`; `None` for an unknown name.
    pub fn id(&self, wp: &str) -> Option<bool> {
        self.ids.get(wp).copied()
    }
}

/// Generator-level jet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GenJet {
    /// Transverse momentum.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuth.
    pub phi: f64,
}

/// Reconstructed, fully calibrated jet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawJet {
    /// Corrected transverse momentum.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuth.
    pub phi: f64,
    /// Transverse momentum at the "Uncorrected" level.
    pub uncorrected_pt: f64,
    /// Transverse momentum at the "L3Absolute" level (no residuals).
    pub l3_absolute_pt: f64,
    /// Charged hadron energy fraction.
    #[serde(default)]
    pub chef: f64,
    /// Neutral hadron energy fraction.
    #[serde(default)]
    pub nhef: f64,
    /// Neutral EM energy fraction.
    #[serde(default)]
    pub neef: f64,
    /// Charged EM energy fraction.
    #[serde(default)]
    pub ceef: f64,
    /// Muon energy fraction.
    #[serde(default)]
    pub muef: f64,
    /// Charged multiplicity.
    #[serde(default)]
    pub charged_multiplicity: i32,
    /// Neutral hadron multiplicity.
    #[serde(default)]
    pub neutral_hadron_multiplicity: i32,
    /// Photon multiplicity.
    #[serde(default)]
    pub photon_multiplicity: i32,
    /// Neutral multiplicity.
    #[serde(default)]
    pub neutral_multiplicity: i32,
    /// Catchment area.
    #[serde(default)]
    pub area: f64,
    /// Pileup-ID discriminant stored with the jet.
    #[serde(default)]
    pub pileup_discriminant: f64,
    /// Hadron flavour (generator level).
    #[serde(default)]
    pub hadron_flavour: i32,
    /// Parton flavour (generator level).
    #[serde(default)]
    pub parton_flavour: i32,
    /// Flavour-tag discriminators by label.
    #[serde(default)]
    pub discriminators: BTreeMap<String, f64>,
    /// Generator jet matched when the jet was produced.
    #[serde(default)]
    pub gen_jet: Option<GenJet>,
}

impl RawJet {
    /// Discriminator value for `label`, if stored.
    pub fn discriminator(&self, label: &str) -> Option<f64> {
        self.discriminators.get(label).copied()
    }
}

/// Recomputed pileup-ID input variables for one jet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct PileupJetIdVariables {
    pub beta: f32,
    pub dr2_mean: f32,
    pub maj_w: f32,
    pub min_w: f32,
    pub frac01: f32,
    pub frac02: f32,
    pub frac03: f32,
    pub frac04: f32,
    pub pt_d: f32,
    pub beta_star: f32,
    pub pull: f32,
    pub jet_r: f32,
    pub jet_r_chg: f32,
    pub n_particles: i32,
    pub n_charged: i32,
}

/// Missing transverse energy object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMet {
    /// Magnitude.
    pub pt: f64,
    /// Azimuth.
    pub phi: f64,
}

/// Packed particle-flow candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PfCandidate {
    /// Transverse momentum.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuth.
    pub phi: f64,
    /// Signed PDG identifier.
    pub pdg_id: i32,
    /// Association quality to the leading vertex (0–3).
    #[serde(default)]
    pub from_pv: i32,
}

/// Generator particle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GenParticle {
    /// Signed PDG identifier.
    pub pdg_id: i32,
    /// Generator status code.
    pub status: i32,
    /// Transverse momentum.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuth.
    pub phi: f64,
    /// Energy.
    #[serde(default)]
    pub energy: f64,
    /// PDG identifier of the immediate mother, if any.
    #[serde(default)]
    pub mother_pdg_id: Option<i32>,
}

/// One particle of the hard-process (LHE) record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LheParticle {
    /// Signed PDG identifier.
    pub id: i32,
    /// Momentum x.
    pub px: f64,
    /// Momentum y.
    pub py: f64,
    /// Momentum z.
    #[serde(default)]
    pub pz: f64,
    /// Energy.
    #[serde(default)]
    pub e: f64,
    /// First and last mother, 1-based; 0 means "no mother".
    #[serde(default)]
    pub mothers: (i32, i32),
}

/// Hard-process event record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LheEvent {
    /// Particles in record order.
    pub particles: Vec<LheParticle>,
}

/// Generator event information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GenEventInfo {
    /// Event weight.
    pub weight: f64,
}

/// Pileup summary for one bunch crossing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PileupSummary {
    /// Bunch-crossing offset relative to the triggered one.
    pub bunch_crossing: i32,
    /// Mean number of interactions the crossing was sampled from.
    pub true_num_interactions: f32,
}

/// Everything the pipeline reads for one event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEventInput {
    /// Event identifiers.
    pub id: EventId,
    /// Reconstructed primary vertices.
    pub vertices: Option<Vec<RawVertex>>,
    /// Pileup density (all particles).
    pub rho: Option<f64>,
    /// Pileup density (central neutral particles).
    pub rho_central_neutral: Option<f64>,

    /// MET-filter flags from the PAT step.
    pub met_filters_pat: Option<TriggerResults>,
    /// MET-filter flags from the RECO step.
    pub met_filters_reco: Option<TriggerResults>,
    /// Rerun ECAL bad-calibration filter.
    pub ecal_bad_calib_filter_update: Option<bool>,
    /// Rerun ECAL laser-correction filter.
    pub ecal_laser_corr_filter_update: Option<bool>,
    /// Rerun ECAL dead-cell boundary-energy filter.
    pub ecal_dead_cell_boundary_energy_filter_update: Option<bool>,
    /// Rerun bad charged-candidate filter.
    pub bad_charged_candidate_filter_update: Option<bool>,

    /// Electrons.
    pub electrons: Option<Vec<RawElectron>>,
    /// Muons.
    pub muons: Option<Vec<RawMuon>>,
    /// Photons.
    pub photons: Option<Vec<RawPhoton>>,

    /// Jets.
    pub jets: Option<Vec<RawJet>>,
    /// Recomputed pileup-ID discriminant (current training).
    pub pileup_jet_id_update: Option<ValueMap<f32>>,
    /// Recomputed pileup-ID discriminant (2017 training).
    pub pileup_jet_id_update_2017: Option<ValueMap<f32>>,
    /// Recomputed pileup-ID discriminant (2018 training).
    pub pileup_jet_id_update_2018: Option<ValueMap<f32>>,
    /// Recomputed pileup-ID input variables.
    pub pileup_jet_id_variables: Option<ValueMap<PileupJetIdVariables>>,
    /// Quark/gluon likelihood.
    pub quark_gluon_likelihood: Option<ValueMap<f32>>,
    /// Reclustered generator-jet association (neutrinos excluded).
    pub gen_jet_match: Option<ValueMap<Option<GenJet>>>,
    /// Reclustered generator-jet association (neutrinos included).
    pub gen_jet_with_nu_match: Option<ValueMap<Option<GenJet>>>,

    /// Type-1 PF MET.
    pub met: Option<Vec<RawMet>>,
    /// PUPPI MET.
    pub puppi_met: Option<Vec<RawMet>>,
    /// Packed PF candidates.
    pub pf_candidates: Option<Vec<PfCandidate>>,

    /// Generator particles.
    pub gen_particles: Option<Vec<GenParticle>>,
    /// Generator event info.
    pub gen_info: Option<GenEventInfo>,
    /// Hard-process record (primary label).
    pub lhe: Option<LheEvent>,
    /// Hard-process record (alternate label).
    pub lhe_alt: Option<LheEvent>,
    /// Pileup summaries.
    pub pileup_summary: Option<Vec<PileupSummary>>,

    /// HLT results.
    pub hlt: Option<TriggerResults>,
    /// L1 final-OR in the preceding bunch crossing.
    pub l1_final_or_prev_bx: Option<bool>,
}
