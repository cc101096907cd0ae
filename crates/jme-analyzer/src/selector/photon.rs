use jme_core::RawPhoton;

use super::{LOOSE_PHOTON_PT, working_point};
use crate::config::AnalyzerConfig;
use crate::record::PhotonRecord;

/// Energy corrections are only defined inside the tracker acceptance.
const CORRECTION_MAX_ETA: f64 = 2.5;
const BARREL_MAX_ETA: f64 = 1.4442;
const MIN_R9: f64 = 0.9;

fn corrected_pt(ph: &RawPhoton) -> f64 {
    match ph.ecal_energy_post_corr {
        Some(post) if ph.eta.abs() < CORRECTION_MAX_ETA && ph.energy > 0.0 => {
            ph.pt * post / ph.energy
        }
        _ => ph.pt,
    }
}

fn passes_tight_id(ph: &RawPhoton, cfg: &AnalyzerConfig) -> bool {
    working_point(ph.id(&cfg.photon_tight_wp), &cfg.photon_tight_wp, "photon", cfg.debug)
        && ph.pass_electron_veto
        && !ph.has_pixel_seed
        && ph.eta.abs() < BARREL_MAX_ETA
        && ph.r9 > MIN_R9
}

/// Select photons; the storage cut applies to the corrected pt.
pub fn select_photons(photons: &[RawPhoton], cfg: &AnalyzerConfig) -> Vec<PhotonRecord> {
    let mut out = Vec::new();
    for ph in photons {
        if ph.pt <= LOOSE_PHOTON_PT {
            continue;
        }
        let pt_corr = corrected_pt(ph);
        if pt_corr < cfg.photon_pt_cut {
            continue;
        }
        let tight = passes_tight_id(ph, cfg);
        if cfg.apply_photon_id && !tight {
            continue;
        }
        out.push(PhotonRecord {
            eta: ph.eta as f32,
            phi: ph.phi as f32,
            pt: ph.pt as f32,
            pt_corr: pt_corr as f32,
            pass_tight_id: tight,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn photon(pt: f64, eta: f64) -> RawPhoton {
        let cfg = AnalyzerConfig::default();
        RawPhoton {
            pt,
            eta,
            phi: 0.0,
            energy: pt * eta.cosh(),
            ecal_energy_post_corr: None,
            ids: [(cfg.photon_tight_wp, true)].into_iter().collect(),
            pass_electron_veto: true,
            has_pixel_seed: false,
            r9: 0.95,
        }
    }

    #[test]
    fn correction_only_inside_tracker() {
        let cfg = AnalyzerConfig::default();
        let mut central = photon(50.0, 1.0);
        central.ecal_energy_post_corr = Some(central.energy * 1.1);
        let mut forward = photon(50.0, 2.8);
        forward.ecal_energy_post_corr = Some(forward.energy * 1.1);

        let out = select_photons(&[central, forward], &cfg);
        assert_eq!(out.len(), 2);
        assert_relative_eq!(out[0].pt_corr, 55.0, epsilon = 1e-3);
        assert_eq!(out[1].pt_corr, 50.0);
    }

    #[test]
    fn storage_cut_uses_corrected_pt() {
        let cfg = AnalyzerConfig::default();
        let mut ph = photon(21.0, 0.2);
        ph.ecal_energy_post_corr = Some(ph.energy * 0.9);
        assert!(select_photons(&[ph], &cfg).is_empty());
    }

    #[test]
    fn tight_id_is_flagged_or_applied() {
        let mut endcap = photon(40.0, 1.8);
        endcap.r9 = 0.97;
        let mut seeded = photon(40.0, 0.3);
        seeded.has_pixel_seed = true;
        let good = photon(40.0, 0.3);

        let flagged = select_photons(&[endcap.clone(), seeded.clone(), good.clone()], &AnalyzerConfig::default());
        let tight: Vec<bool> = flagged.iter().map(|p| p.pass_tight_id).collect();
        assert_eq!(tight, vec![false, false, true]);

        let cfg = AnalyzerConfig { apply_photon_id: true, ..Default::default() };
        let applied = select_photons(&[endcap, seeded, good], &cfg);
        assert_eq!(applied.len(), 1);
        assert!(applied[0].pass_tight_id);
    }
}
