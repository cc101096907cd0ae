use jme_core::PfCandidate;

use crate::record::{CHARGED_HADRON_PT_THRESHOLDS, ChargedHadronSums, PfCandidateRecord};

const CHARGED_PION: i32 = 211;
/// Highest `from_pv` quality: the candidate was used in the primary-vertex fit.
const PV_USED_IN_FIT: i32 = 3;

/// Store candidates at or above `pt_cut` and sum charged hadrons from the vertex fit.
pub fn select_pf_candidates(
    candidates: &[PfCandidate],
    pt_cut: f64,
) -> (Vec<PfCandidateRecord>, ChargedHadronSums) {
    let mut stored = Vec::new();
    let mut sums = ChargedHadronSums::default();

    for c in candidates {
        if c.pdg_id.abs() == CHARGED_PION && c.from_pv == PV_USED_IN_FIT {
            for (i, &threshold) in CHARGED_HADRON_PT_THRESHOLDS.iter().enumerate() {
                if c.pt > threshold {
                    sums.counts[i] += 1;
                    sums.ht[i] += c.pt as f32;
                }
            }
        }
        if c.pt < pt_cut {
            continue;
        }
        stored.push(PfCandidateRecord {
            pt: c.pt as f32,
            eta: c.eta as f32,
            phi: c.phi as f32,
            pdg_id: c.pdg_id,
            from_pv: c.from_pv,
        });
    }
    (stored, sums)
}
