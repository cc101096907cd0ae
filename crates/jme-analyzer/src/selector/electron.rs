use jme_core::RawElectron;

use super::{LOOSE_LEPTON_PT, LeptonSelection, VETO_LEPTON_PT, working_point};
use crate::config::AnalyzerConfig;
use crate::record::LeptonRecord;

/// Scale/smear corrected pt; the raw pt when no correction annotation exists.
fn corrected_pt(e: &RawElectron) -> f64 {
    match e.energy_correction {
        Some(corr) if e.energy > 0.0 => e.pt * corr.ecal_trk_energy_post_corr / e.energy,
        _ => e.pt,
    }
}

/// Select electrons.
///
/// Veto failures are dropped and not counted; veto passes below
/// `electron_pt_cut` are counted but not stored.
pub fn select_electrons(electrons: &[RawElectron], cfg: &AnalyzerConfig) -> LeptonSelection {
    let mut out = LeptonSelection::default();
    for e in electrons {
        if e.pt <= LOOSE_LEPTON_PT {
            continue;
        }
        let pt_corr = corrected_pt(e);

        let veto = working_point(
            e.id(&cfg.electron_veto_wp),
            &cfg.electron_veto_wp,
            "electron",
            cfg.debug,
        ) && e.pt > VETO_LEPTON_PT;
        if !veto {
            continue;
        }
        out.n_veto += 1;
        if e.pt < cfg.electron_pt_cut {
            continue;
        }

        out.leptons.push(LeptonRecord {
            eta: e.eta as f32,
            phi: e.phi as f32,
            pt: e.pt as f32,
            pt_corr: pt_corr as f32,
            pdg_id: -11 * e.charge,
            pass_tight_id: working_point(
                e.id(&cfg.electron_tight_wp),
                &cfg.electron_tight_wp,
                "electron",
                cfg.debug,
            ),
        });
    }
    out
}
