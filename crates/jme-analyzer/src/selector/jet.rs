use jme_core::{JecUncertaintyProvider, JetIdProvider, JetKey, RawJet};

use crate::config::AnalyzerConfig;
use crate::record::{JetRecord, NO_GEN_MATCH};
use crate::resolver::JetSideProducts;

/// Value of a flavour-tag discriminator that is not stored on the jet.
pub const DEEPJET_MISSING: f64 = -1000.0;

/// Jets below this pt without a generator match are dropped when requested.
const UNMATCHED_KEEP_PT: f64 = 50.0;

const DEEPJET_B: [&str; 3] = [
    "pfDeepFlavourJetTags:probb",
    "pfDeepFlavourJetTags:probbb",
    "pfDeepFlavourJetTags:problepb",
];
const DEEPJET_C: &str = "pfDeepFlavourJetTags:probc";
const DEEPJET_UDS: &str = "pfDeepFlavourJetTags:probuds";
const DEEPJET_G: &str = "pfDeepFlavourJetTags:probg";

/// Collaborators and per-event side products needed to select jets.
pub struct JetContext<'a> {
    pub config: &'a AnalyzerConfig,
    pub jet_id: &'a dyn JetIdProvider,
    pub jec_uncertainty: &'a dyn JecUncertaintyProvider,
    pub side_products: JetSideProducts<'a>,
}

/// Stored jets and the leading raw jet pt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JetSelection {
    pub jets: Vec<JetRecord>,
    /// Highest pt over all input jets, before any cut.
    pub lead_jet_pt: f32,
}

fn discriminator(jet: &RawJet, label: &str) -> f64 {
    jet.discriminator(label).unwrap_or(DEEPJET_MISSING)
}

/// Select jets and build their feature vectors.
///
/// Pure with respect to its inputs: the same jets and context always give
/// the same selection.
pub fn select_jets(jets: &[RawJet], ctx: &JetContext<'_>) -> JetSelection {
    let cfg = ctx.config;
    let drop_unmatched = cfg.effective_drop_unmatched_jets();
    let mut out = JetSelection::default();

    for (idx, jet) in jets.iter().enumerate() {
        let key = JetKey(idx);
        if jet.pt as f32 > out.lead_jet_pt {
            out.lead_jet_pt = jet.pt as f32;
        }
        if jet.pt < cfg.jet_pt_cut {
            continue;
        }

        let pass_id = ctx.jet_id.passes(jet, &cfg.jet_id_era);
        if cfg.drop_bad_jets && !pass_id {
            continue;
        }

        let matched = ctx.side_products.gen_jets(key, jet.gen_jet);
        if drop_unmatched && matched.gen_jet.is_none() && jet.pt < UNMATCHED_KEEP_PT {
            continue;
        }

        let side = ctx.side_products.resolve(key);
        if ctx.side_products.debug && side.pu_id_variables.is_none() {
            log::debug!("jet {idx}: pileup-ID variables unavailable");
        }

        let raw_pt = jet.uncorrected_pt;
        let jec_factor = if raw_pt > 0.0 { jet.pt / raw_pt } else { 1.0 };
        let deepjet_b: f64 = DEEPJET_B.iter().map(|label| discriminator(jet, label)).sum();

        out.jets.push(JetRecord {
            eta: jet.eta as f32,
            phi: jet.phi as f32,
            pt: jet.pt as f32,
            raw_pt: raw_pt as f32,
            pt_no_l2l3_res: jet.l3_absolute_pt as f32,
            jec_factor: jec_factor as f32,
            jec_uncertainty: ctx.jec_uncertainty.uncertainty(jet.eta, jet.pt) as f32,
            chef: jet.chef as f32,
            nhef: jet.nhef as f32,
            neef: jet.neef as f32,
            ceef: jet.ceef as f32,
            muef: jet.muef as f32,
            charged_multiplicity: jet.charged_multiplicity,
            neutral_hadron_multiplicity: jet.neutral_hadron_multiplicity,
            photon_multiplicity: jet.photon_multiplicity,
            neutral_multiplicity: jet.neutral_multiplicity,
            area: jet.area as f32,
            pass_id,
            pt_gen: matched.gen_jet.map_or(NO_GEN_MATCH, |g| g.pt as f32),
            eta_gen: matched.gen_jet.map_or(NO_GEN_MATCH, |g| g.eta as f32),
            phi_gen: matched.gen_jet.map_or(NO_GEN_MATCH, |g| g.phi as f32),
            pt_gen_with_nu: matched.gen_jet_with_nu.map_or(NO_GEN_MATCH, |g| g.pt as f32),
            pu_mva: jet.pileup_discriminant as f32,
            pu_mva_update: side.pu_mva_update,
            pu_mva_update_2017: side.pu_mva_update_2017,
            pu_mva_update_2018: side.pu_mva_update_2018,
            pu_id_variables: side.pu_id_variables,
            hadron_flavour: jet.hadron_flavour,
            parton_flavour: jet.parton_flavour,
            deepjet_b: deepjet_b as f32,
            deepjet_c: discriminator(jet, DEEPJET_C) as f32,
            deepjet_uds: discriminator(jet, DEEPJET_UDS) as f32,
            deepjet_g: discriminator(jet, DEEPJET_G) as f32,
            quark_gluon_likelihood: side.quark_gluon_likelihood,
        });
    }
    out
}
