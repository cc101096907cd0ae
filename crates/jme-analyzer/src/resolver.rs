//! Source selection for quantities that may come from several optional inputs.
//!
//! Every function here is a pure function of which inputs are present. When a
//! source is missing the documented sentinel is returned and, with `debug`
//! set, a debug line is logged.

use jme_core::{GenJet, JetKey, PileupJetIdVariables, RawEventInput, TriggerResults, ValueMap};

use crate::catalog::{FilterBit, FilterDecision, FilterDecisionSet};

/// Value stored for a per-jet score whose producer did not run.
pub const MISSING_SCORE: f32 = -1.0;

/// The MET-filter collection to read: PAT when present, RECO otherwise.
pub fn met_filter_source(event: &RawEventInput) -> Option<&TriggerResults> {
    event.met_filters_pat.as_ref().or(event.met_filters_reco.as_ref())
}

/// Decision for one catalog name; a missing collection or path defaults to pass.
pub fn filter_decision(source: Option<&TriggerResults>, name: &str, debug: bool) -> FilterDecision {
    let decision = FilterDecision::from_lookup(source.and_then(|trg| trg.first_containing(name)));
    if debug && decision == FilterDecision::DefaultedPass {
        log::debug!("MET filter '{name}' unavailable, defaulting to pass");
    }
    decision
}

fn rerun_decision(value: Option<bool>, name: &str, debug: bool) -> FilterDecision {
    if debug && value.is_none() {
        log::debug!("rerun filter '{name}' not provided, defaulting to pass");
    }
    FilterDecision::from_lookup(value)
}

/// Resolve every catalog entry for `event`.
pub fn resolve_met_filters(event: &RawEventInput, debug: bool) -> FilterDecisionSet {
    let source = met_filter_source(event);
    let mut set = FilterDecisionSet::default();
    for bit in FilterBit::ALL {
        let decision = match bit {
            FilterBit::EcalBadCalibFilterUpdate => {
                rerun_decision(event.ecal_bad_calib_filter_update, bit.name(), debug)
            }
            FilterBit::EcalLaserCorrFilterUpdate => {
                rerun_decision(event.ecal_laser_corr_filter_update, bit.name(), debug)
            }
            FilterBit::EcalDeadCellBoundaryEnergyFilterUpdate => rerun_decision(
                event.ecal_dead_cell_boundary_energy_filter_update,
                bit.name(),
                debug,
            ),
            FilterBit::BadChargedCandidateFilterUpdate => {
                rerun_decision(event.bad_charged_candidate_filter_update, bit.name(), debug)
            }
            _ => filter_decision(source, bit.name(), debug),
        };
        set.set(bit, decision);
    }
    set
}

/// Per-jet score from an optional value map; [`MISSING_SCORE`] when unavailable.
pub fn resolve_score(map: Option<&ValueMap<f32>>, key: JetKey) -> f32 {
    map.and_then(|m| m.get(key)).copied().unwrap_or(MISSING_SCORE)
}

/// Generator jets associated with one reconstructed jet.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenJetMatch {
    /// Match used for the gen pt/eta/phi columns and unmatched-jet dropping.
    pub gen_jet: Option<GenJet>,
    /// Match including neutrinos; only provided by the reclustered association.
    pub gen_jet_with_nu: Option<GenJet>,
}

/// Borrowed view over the per-jet side products of one event.
#[derive(Debug, Clone, Copy)]
pub struct JetSideProducts<'a> {
    pub pu_id_update: Option<&'a ValueMap<f32>>,
    pub pu_id_update_2017: Option<&'a ValueMap<f32>>,
    pub pu_id_update_2018: Option<&'a ValueMap<f32>>,
    pub pu_id_variables: Option<&'a ValueMap<PileupJetIdVariables>>,
    pub quark_gluon_likelihood: Option<&'a ValueMap<f32>>,
    pub gen_jet_match: Option<&'a ValueMap<Option<GenJet>>>,
    pub gen_jet_with_nu_match: Option<&'a ValueMap<Option<GenJet>>>,
    pub use_updated_gen_jets: bool,
    pub debug: bool,
}

/// Resolved side-product values for one jet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedJetFeatures {
    pub pu_mva_update: f32,
    pub pu_mva_update_2017: f32,
    pub pu_mva_update_2018: f32,
    pub pu_id_variables: Option<PileupJetIdVariables>,
    pub quark_gluon_likelihood: f32,
}

impl<'a> JetSideProducts<'a> {
    /// Collect the side products of `event`.
    pub fn from_event(event: &'a RawEventInput, use_updated_gen_jets: bool, debug: bool) -> Self {
        let products = Self {
            pu_id_update: event.pileup_jet_id_update.as_ref(),
            pu_id_update_2017: event.pileup_jet_id_update_2017.as_ref(),
            pu_id_update_2018: event.pileup_jet_id_update_2018.as_ref(),
            pu_id_variables: event.pileup_jet_id_variables.as_ref(),
            quark_gluon_likelihood: event.quark_gluon_likelihood.as_ref(),
            gen_jet_match: event.gen_jet_match.as_ref(),
            gen_jet_with_nu_match: event.gen_jet_with_nu_match.as_ref(),
            use_updated_gen_jets,
            debug,
        };
        if debug {
            for (label, present) in [
                ("pileup_jet_id_update", products.pu_id_update.is_some()),
                ("pileup_jet_id_update_2017", products.pu_id_update_2017.is_some()),
                ("pileup_jet_id_update_2018", products.pu_id_update_2018.is_some()),
                ("pileup_jet_id_variables", products.pu_id_variables.is_some()),
                ("quark_gluon_likelihood", products.quark_gluon_likelihood.is_some()),
            ] {
                if !present {
                    log::debug!("{label} not provided, using fallback values");
                }
            }
        }
        products
    }

    /// Resolve every scalar side product for the jet at `key`.
    pub fn resolve(&self, key: JetKey) -> ResolvedJetFeatures {
        ResolvedJetFeatures {
            pu_mva_update: resolve_score(self.pu_id_update, key),
            pu_mva_update_2017: resolve_score(self.pu_id_update_2017, key),
            pu_mva_update_2018: resolve_score(self.pu_id_update_2018, key),
            pu_id_variables: self.pu_id_variables.and_then(|m| m.get(key)).copied(),
            quark_gluon_likelihood: resolve_score(self.quark_gluon_likelihood, key),
        }
    }

    /// Generator-jet association for the jet at `key`.
    ///
    /// The reclustered maps win when both are present and enabled; otherwise
    /// the match stored with the jet is used and no with-neutrino match exists.
    pub fn gen_jets(&self, key: JetKey, intrinsic: Option<GenJet>) -> GenJetMatch {
        if self.use_updated_gen_jets
            && let (Some(plain), Some(with_nu)) = (self.gen_jet_match, self.gen_jet_with_nu_match)
        {
            return GenJetMatch {
                gen_jet: plain.get(key).copied().flatten(),
                gen_jet_with_nu: with_nu.get(key).copied().flatten(),
            };
        }
        GenJetMatch { gen_jet: intrinsic, gen_jet_with_nu: None }
    }
}
