//! Event-level skim policies.

use std::fmt;
use std::str::FromStr;

use jme_core::LorentzVector;
use serde::{Deserialize, Serialize};

use crate::record::{EventRecord, LeptonRecord, PhotonRecord};

const Z_WINDOW: (f64, f64) = (70.0, 110.0);
const SKIM_LEPTON_PT: f32 = 20.0;
const SKIM_PHOTON_PT: f32 = 20.0;
const BARREL_ETA: f32 = 1.4442;
const SKIM_MET: f32 = 100.0;

/// Named accept/reject predicate, fixed for a whole job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SkimPolicy {
    /// Same-flavour opposite-sign tight lepton pair in the Z window.
    DileptonMassWindow,
    /// At least one barrel photon above threshold.
    IsolatedPhoton,
    /// Reconstructed MET above threshold.
    MetThreshold,
    /// Accept everything.
    #[default]
    None,
}

/// Point in the event loop at which the skim is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkimStage {
    /// Only leptons and photons are populated.
    AfterLeptons,
    /// The record is complete.
    Final,
}

impl SkimPolicy {
    /// Configuration name.
    pub fn name(self) -> &'static str {
        match self {
            SkimPolicy::DileptonMassWindow => "ZToEEorMuMu",
            SkimPolicy::IsolatedPhoton => "Photon",
            SkimPolicy::MetThreshold => "MET100",
            SkimPolicy::None => "",
        }
    }

    /// Whether the predicate reads quantities filled after the lepton stage.
    pub fn needs_complete_record(self) -> bool {
        matches!(self, SkimPolicy::MetThreshold)
    }

    /// Evaluate the policy against `record` as populated at `stage`.
    ///
    /// Policies that need the complete record pass the early stage; they are
    /// decided at [`SkimStage::Final`].
    pub fn accepts(self, record: &EventRecord, stage: SkimStage) -> bool {
        if stage == SkimStage::AfterLeptons && self.needs_complete_record() {
            return true;
        }
        match self {
            SkimPolicy::DileptonMassWindow => has_z_candidate(&record.leptons),
            SkimPolicy::IsolatedPhoton => has_barrel_photon(&record.photons),
            SkimPolicy::MetThreshold => record.met > SKIM_MET,
            SkimPolicy::None => true,
        }
    }
}

impl FromStr for SkimPolicy {
    type Err = std::convert::Infallible;

    /// Unknown names select [`SkimPolicy::None`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ZToEEorMuMu" | "dilepton_mass_window" => SkimPolicy::DileptonMassWindow,
            "Photon" | "isolated_photon" => SkimPolicy::IsolatedPhoton,
            "MET100" | "met_threshold" => SkimPolicy::MetThreshold,
            "" | "none" => SkimPolicy::None,
            other => {
                log::warn!("unknown skim '{other}', events will not be filtered");
                SkimPolicy::None
            }
        })
    }
}

impl From<String> for SkimPolicy {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(policy) => policy,
            Err(never) => match never {},
        }
    }
}

impl From<SkimPolicy> for String {
    fn from(policy: SkimPolicy) -> Self {
        policy.name().to_string()
    }
}

impl fmt::Display for SkimPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkimPolicy::None => f.write_str("none"),
            other => f.write_str(other.name()),
        }
    }
}

fn is_skim_lepton(l: &LeptonRecord) -> bool {
    l.pt > SKIM_LEPTON_PT && l.pass_tight_id && matches!(l.pdg_id.abs(), 11 | 13)
}

/// Open interval: masses of exactly 70 or 110 GeV fail.
fn in_z_window(mass: f64) -> bool {
    mass > Z_WINDOW.0 && mass < Z_WINDOW.1
}

fn has_z_candidate(leptons: &[LeptonRecord]) -> bool {
    for (i, a) in leptons.iter().enumerate() {
        if !is_skim_lepton(a) {
            continue;
        }
        for b in &leptons[..i] {
            if !is_skim_lepton(b) || a.pdg_id != -b.pdg_id {
                continue;
            }
            let pa = LorentzVector::from_pt_eta_phi_m(a.pt.into(), a.eta.into(), a.phi.into(), 0.0);
            let pb = LorentzVector::from_pt_eta_phi_m(b.pt.into(), b.eta.into(), b.phi.into(), 0.0);
            if in_z_window((pa + pb).mass()) {
                return true;
            }
        }
    }
    false
}

fn has_barrel_photon(photons: &[PhotonRecord]) -> bool {
    photons.iter().any(|p| p.pt > SKIM_PHOTON_PT && p.eta.abs() < BARREL_ETA)
}
