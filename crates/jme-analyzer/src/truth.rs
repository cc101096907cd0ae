//! Generator-level truth for simulated events.

use jme_core::{GenParticle, LheEvent, LorentzVector, PileupSummary, RawEventInput};

use crate::config::AnalyzerConfig;
use crate::record::{GenLeptonRecord, GenPhotonRecord, UNKNOWN_PILEUP};

const HARD_PROCESS_STATUS: i32 = 23;
const FINAL_STATE_STATUS: i32 = 1;
const TOP: i32 = 6;
const Z_BOSON: i32 = 23;
const W_BOSON: i32 = 24;
const GLUON: i32 = 21;
const PHOTON: i32 = 22;
const NEUTRINOS: [i32; 3] = [12, 14, 16];
/// Generator objects above this pt are kept regardless of the reco cut.
const GEN_KEEP_PT: f64 = 50.0;
/// Generator objects are kept down to this fraction of the reco storage cut.
const GEN_CUT_FRACTION: f64 = 0.8;

/// Everything the truth associator derives for one event.
#[derive(Debug, Clone, PartialEq)]
pub struct TruthSummary {
    pub gen_ht: f32,
    pub gen_met: f32,
    pub gen_met_phi: f32,
    pub gen_leptons: Vec<GenLeptonRecord>,
    pub gen_photons: Vec<GenPhotonRecord>,
    pub weight: f32,
    pub true_n_vertices: i32,
}

impl Default for TruthSummary {
    fn default() -> Self {
        Self {
            gen_ht: 0.0,
            gen_met: 0.0,
            gen_met_phi: 0.0,
            gen_leptons: Vec::new(),
            gen_photons: Vec::new(),
            weight: 0.0,
            true_n_vertices: UNKNOWN_PILEUP,
        }
    }
}

fn is_parton_or_photon(abs_id: i32) -> bool {
    (1..=5).contains(&abs_id) || abs_id == GLUON || abs_id == PHOTON
}

fn keeps_gen_object(pt: f64, reco_cut: f64) -> bool {
    pt > GEN_CUT_FRACTION * reco_cut || pt > GEN_KEEP_PT
}

/// Single pass over the generator particles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleLoop {
    pub gen_ht: f64,
    pub gen_met: f64,
    pub gen_met_phi: f64,
    pub gen_leptons: Vec<GenLeptonRecord>,
    pub gen_photons: Vec<GenPhotonRecord>,
}

/// HT of hard-process partons, neutrino MET, and final-state lepton/photon lists.
pub fn scan_gen_particles(particles: &[GenParticle], cfg: &AnalyzerConfig) -> ParticleLoop {
    let mut out = ParticleLoop::default();
    let mut neutrinos = LorentzVector::default();

    for p in particles {
        let id = p.pdg_id.abs();
        let from_top_or_w = p.mother_pdg_id.is_some_and(|m| matches!(m.abs(), TOP | W_BOSON));
        if p.status == HARD_PROCESS_STATUS && is_parton_or_photon(id) && !from_top_or_w {
            out.gen_ht += p.pt;
        }
        if p.status != FINAL_STATE_STATUS {
            continue;
        }
        if NEUTRINOS.contains(&id) {
            neutrinos += LorentzVector::from_pt_eta_phi_e(p.pt, p.eta, p.phi, p.energy);
        }
        let lepton_cut = match id {
            11 => Some(cfg.electron_pt_cut),
            13 => Some(cfg.muon_pt_cut),
            _ => None,
        };
        if let Some(cut) = lepton_cut
            && keeps_gen_object(p.pt, cut)
        {
            out.gen_leptons.push(GenLeptonRecord {
                pt: p.pt as f32,
                eta: p.eta as f32,
                phi: p.phi as f32,
                pdg_id: p.pdg_id,
            });
        }
        if id == PHOTON && keeps_gen_object(p.pt, cfg.photon_pt_cut) {
            out.gen_photons.push(GenPhotonRecord {
                pt: p.pt as f32,
                eta: p.eta as f32,
                phi: p.phi as f32,
            });
        }
    }

    if neutrinos.e != 0.0 {
        out.gen_met = neutrinos.pt();
        out.gen_met_phi = neutrinos.phi();
    }
    out
}

/// HT of the outgoing hard-process partons, excluding top, Z and W decay products.
pub fn lhe_ht(lhe: &LheEvent) -> f64 {
    let mother_id = |index: i32| -> Option<i32> {
        usize::try_from(index - 1).ok().and_then(|i| lhe.particles.get(i)).map(|m| m.id.abs())
    };
    lhe.particles
        .iter()
        .filter(|p| {
            let (first, last) = p.mothers;
            ![mother_id(first), mother_id(last)]
                .into_iter()
                .flatten()
                .any(|m| matches!(m, TOP | Z_BOSON | W_BOSON))
        })
        .filter(|p| p.id.abs() <= 5 || p.id == GLUON)
        .map(|p| p.px.hypot(p.py))
        .sum()
}

/// True interaction count of the in-time bunch crossing.
pub fn true_pileup(summaries: Option<&[PileupSummary]>) -> i32 {
    summaries
        .and_then(|s| s.iter().rev().find(|p| p.bunch_crossing == 0))
        .map_or(UNKNOWN_PILEUP, |p| p.true_num_interactions as i32)
}

/// Run the truth association on a simulated event.
pub fn associate(event: &RawEventInput, cfg: &AnalyzerConfig) -> TruthSummary {
    let scan = event
        .gen_particles
        .as_deref()
        .map(|particles| scan_gen_particles(particles, cfg))
        .unwrap_or_default();

    // The hard-process definition wins whenever a record is available.
    let gen_ht = match event.lhe.as_ref().or(event.lhe_alt.as_ref()) {
        Some(lhe) => lhe_ht(lhe),
        None => scan.gen_ht,
    };

    TruthSummary {
        gen_ht: gen_ht as f32,
        gen_met: scan.gen_met as f32,
        gen_met_phi: scan.gen_met_phi as f32,
        gen_leptons: scan.gen_leptons,
        gen_photons: scan.gen_photons,
        weight: event.gen_info.map_or(0.0, |info| info.weight as f32),
        true_n_vertices: true_pileup(event.pileup_summary.as_deref()),
    }
}
