//! Tight PF jet identification.

use jme_core::{JetIdProvider, RawJet};

/// Data-taking period a set of jet-ID thresholds belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JetIdEra {
    Run2016,
    Run2017,
    Run2018,
}

impl JetIdEra {
    /// `"2016"`, `"2016APV"`, `"2017"` or `"2018"`.
    pub fn parse(era: &str) -> Option<Self> {
        match era.trim() {
            "2016" | "2016APV" | "2016preVFP" | "2016postVFP" => Some(Self::Run2016),
            "2017" => Some(Self::Run2017),
            "2018" => Some(Self::Run2018),
            _ => None,
        }
    }
}

/// Tight jet ID for AK4 PF (CHS) jets.
///
/// Unknown eras fail every jet.
#[derive(Debug, Clone, Copy, Default)]
pub struct CmsJetId {
    debug: bool,
}

struct Inputs {
    abs_eta: f64,
    chf: f64,
    nhf: f64,
    nemf: f64,
    cemf: f64,
    chm: i32,
    num_neutral: i32,
    num_const: i32,
}

impl Inputs {
    fn from_jet(jet: &RawJet) -> Self {
        Self {
            abs_eta: jet.eta.abs(),
            chf: jet.chef,
            nhf: jet.nhef,
            nemf: jet.neef,
            cemf: jet.ceef,
            chm: jet.charged_multiplicity,
            num_neutral: jet.neutral_multiplicity,
            num_const: jet.charged_multiplicity + jet.neutral_multiplicity,
        }
    }
}

fn tight_2016(j: &Inputs) -> bool {
    if j.abs_eta <= 2.7 {
        let base = j.nhf < 0.90 && j.nemf < 0.90 && j.num_const > 1;
        let tracker = j.abs_eta > 2.4 || (j.chf > 0.0 && j.chm > 0 && j.cemf < 0.99);
        base && tracker
    } else if j.abs_eta <= 3.0 {
        j.nhf < 0.98 && j.nemf > 0.01 && j.num_neutral > 2
    } else {
        j.nemf < 0.90 && j.num_neutral > 10
    }
}

fn tight_2017(j: &Inputs) -> bool {
    if j.abs_eta <= 2.7 {
        let base = j.nhf < 0.90 && j.nemf < 0.90 && j.num_const > 1;
        let tracker = j.abs_eta > 2.4 || (j.chf > 0.0 && j.chm > 0);
        base && tracker
    } else if j.abs_eta <= 3.0 {
        j.nemf > 0.02 && j.nemf < 0.99 && j.num_neutral > 2
    } else {
        j.nemf < 0.90 && j.nhf > 0.02 && j.num_neutral > 10
    }
}

fn tight_2018(j: &Inputs) -> bool {
    if j.abs_eta <= 2.6 {
        j.nhf < 0.90 && j.nemf < 0.90 && j.num_const > 1 && j.chf > 0.0 && j.chm > 0
    } else if j.abs_eta <= 2.7 {
        j.nhf < 0.90 && j.nemf < 0.99 && j.chm > 0
    } else if j.abs_eta <= 3.0 {
        j.nemf > 0.02 && j.nemf < 0.99 && j.num_neutral > 2
    } else {
        j.nemf < 0.90 && j.nhf > 0.2 && j.num_neutral > 10
    }
}

impl CmsJetId {
    /// `debug` enables a trace line for every jet rejected for an unknown era.
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    /// Tight ID decision for a parsed era.
    pub fn passes_tight(jet: &RawJet, era: JetIdEra) -> bool {
        let inputs = Inputs::from_jet(jet);
        match era {
            JetIdEra::Run2016 => tight_2016(&inputs),
            JetIdEra::Run2017 => tight_2017(&inputs),
            JetIdEra::Run2018 => tight_2018(&inputs),
        }
    }
}

impl JetIdProvider for CmsJetId {
    fn passes(&self, jet: &RawJet, era: &str) -> bool {
        match JetIdEra::parse(era) {
            Some(era) => Self::passes_tight(jet, era),
            None => {
                if self.debug {
                    log::debug!("unknown jet-ID era '{era}', jet fails");
                }
                false
            }
        }
    }
}
