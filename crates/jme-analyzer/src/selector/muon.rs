use jme_core::{MuonMomentumCorrector, RawMuon};
use rand::Rng;

use super::{LOOSE_LEPTON_PT, LeptonSelection, VETO_LEPTON_PT};
use crate::config::AnalyzerConfig;
use crate::record::LeptonRecord;

fn correction_factor<R: Rng + ?Sized>(
    mu: &RawMuon,
    is_mc: bool,
    corrector: &dyn MuonMomentumCorrector,
    rng: &mut R,
) -> f64 {
    if !is_mc {
        return corrector.scale_data(mu.charge, mu.pt, mu.eta, mu.phi);
    }
    if let Some(gen_lepton) = mu.gen_lepton {
        return corrector.spread_mc(mu.charge, mu.pt, mu.eta, mu.phi, gen_lepton.pt);
    }
    if let Some(track) = mu.inner_track {
        let u: f64 = rng.gen_range(0.0..1.0);
        return corrector.smear_mc(
            mu.charge,
            mu.pt,
            mu.eta,
            mu.phi,
            track.tracker_layers_with_measurement,
            u,
        );
    }
    1.0
}

/// Select muons, applying momentum corrections.
///
/// Drop and count semantics follow [`super::select_electrons`]. `rng` is only
/// consumed for simulated muons without a generator match.
pub fn select_muons<R: Rng + ?Sized>(
    muons: &[RawMuon],
    cfg: &AnalyzerConfig,
    corrector: &dyn MuonMomentumCorrector,
    rng: &mut R,
) -> LeptonSelection {
    let mut out = LeptonSelection::default();
    for mu in muons {
        if mu.pt <= LOOSE_LEPTON_PT {
            continue;
        }
        let pt_corr = mu.pt * correction_factor(mu, cfg.is_mc, corrector, rng);

        let veto = cfg.muon_veto_selectors.iter().all(|&s| mu.passed(s)) && mu.pt > VETO_LEPTON_PT;
        if !veto {
            continue;
        }
        out.n_veto += 1;
        if mu.pt < cfg.muon_pt_cut {
            continue;
        }

        out.leptons.push(LeptonRecord {
            eta: mu.eta as f32,
            phi: mu.phi as f32,
            pt: mu.pt as f32,
            pt_corr: pt_corr as f32,
            pdg_id: -13 * mu.charge,
            pass_tight_id: cfg.muon_tight_selectors.iter().all(|&s| mu.passed(s)),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use jme_core::{GenLepton, InnerTrack, MuonSelector};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    /// Distinct factor per branch so the chosen branch is visible in the output.
    struct BranchMarker;

    impl MuonMomentumCorrector for BranchMarker {
        fn scale_data(&self, _q: i32, _pt: f64, _eta: f64, _phi: f64) -> f64 {
            1.01
        }
        fn spread_mc(&self, _q: i32, _pt: f64, _eta: f64, _phi: f64, _gen_pt: f64) -> f64 {
            1.02
        }
        fn smear_mc(&self, _q: i32, _pt: f64, _eta: f64, _phi: f64, _n: u32, u: f64) -> f64 {
            assert!((0.0..1.0).contains(&u));
            1.03
        }
    }

    fn muon(pt: f64) -> RawMuon {
        RawMuon {
            pt,
            eta: 0.3,
            phi: -1.0,
            charge: 1,
            selectors: vec![
                MuonSelector::CutBasedIdLoose,
                MuonSelector::PfIsoVeryLoose,
                MuonSelector::CutBasedIdMediumPrompt,
                MuonSelector::PfIsoTight,
            ],
            gen_lepton: None,
            inner_track: None,
        }
    }

    fn corrected(mu: RawMuon, is_mc: bool) -> f32 {
        let cfg = AnalyzerConfig { is_mc, ..Default::default() };
        let mut rng = StdRng::seed_from_u64(7);
        select_muons(&[mu], &cfg, &BranchMarker, &mut rng).leptons[0].pt_corr
    }

    #[test]
    fn correction_branches() {
        assert_relative_eq!(corrected(muon(50.0), false), 50.5, epsilon = 1e-4);

        let mut matched = muon(50.0);
        matched.gen_lepton = Some(GenLepton { pt: 49.0, ..Default::default() });
        matched.inner_track = Some(InnerTrack { tracker_layers_with_measurement: 12 });
        assert_relative_eq!(corrected(matched, true), 51.0, epsilon = 1e-4);

        let mut tracked = muon(50.0);
        tracked.inner_track = Some(InnerTrack { tracker_layers_with_measurement: 12 });
        assert_relative_eq!(corrected(tracked, true), 51.5, epsilon = 1e-4);

        assert_relative_eq!(corrected(muon(50.0), true), 50.0, epsilon = 1e-4);
    }

    #[test]
    fn veto_and_tight_selectors() {
        let cfg = AnalyzerConfig::default();
        let mut rng = StdRng::seed_from_u64(1);

        let mut not_iso = muon(30.0);
        not_iso.selectors.retain(|s| *s != MuonSelector::PfIsoVeryLoose);
        let mut loose_only = muon(30.0);
        loose_only.selectors.retain(|s| *s != MuonSelector::PfIsoTight);
        loose_only.charge = -1;

        let sel = select_muons(&[not_iso, loose_only, muon(12.0)], &cfg, &BranchMarker, &mut rng);
        assert_eq!(sel.n_veto, 2);
        assert_eq!(sel.leptons.len(), 1);
        assert_eq!(sel.leptons[0].pdg_id, 13);
        assert!(!sel.leptons[0].pass_tight_id);
    }
}
