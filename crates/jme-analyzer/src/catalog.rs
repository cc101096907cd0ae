//! MET-filter flag catalog.
//!
//! A closed set of sixteen named boolean event-quality flags in a stable
//! order. The first twelve are read from the MET-filter trigger-bit
//! collection; the last four are rerun on top of the input and delivered as
//! standalone booleans.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Serialize;

/// One entry of the MET-filter catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[allow(missing_docs)]
pub enum FilterBit {
    GoodVertices,
    GlobalTightHalo2016Filter,
    GlobalSuperTightHalo2016Filter,
    HbheNoiseFilter,
    HbheNoiseIsoFilter,
    EcalDeadCellTriggerPrimitiveFilter,
    BadPfMuonFilter,
    BadChargedCandidateFilter,
    EeBadScFilter,
    EcalBadCalibFilter,
    EcalLaserCorrFilter,
    EcalDeadCellBoundaryEnergyFilter,
    EcalBadCalibFilterUpdate,
    EcalLaserCorrFilterUpdate,
    EcalDeadCellBoundaryEnergyFilterUpdate,
    BadChargedCandidateFilterUpdate,
}

/// Number of catalog entries.
pub const N_FILTER_BITS: usize = 16;

const NAMES: [&str; N_FILTER_BITS] = [
    "Flag_goodVertices",
    "Flag_globalTightHalo2016Filter",
    "Flag_globalSuperTightHalo2016Filter",
    "Flag_HBHENoiseFilter",
    "Flag_HBHENoiseIsoFilter",
    "Flag_EcalDeadCellTriggerPrimitiveFilter",
    "Flag_BadPFMuonFilter",
    "Flag_BadChargedCandidateFilter",
    "Flag_eeBadScFilter",
    "Flag_ecalBadCalibFilter",
    "Flag_ecalLaserCorrFilter",
    "Flag_EcalDeadCellBoundaryEnergyFilter",
    "PassecalBadCalibFilter_Update",
    "PassecalLaserCorrFilter_Update",
    "PassEcalDeadCellBoundaryEnergyFilter_Update",
    "PassBadChargedCandidateFilter_Update",
];

static BY_NAME: LazyLock<HashMap<&'static str, FilterBit>> =
    LazyLock::new(|| FilterBit::ALL.iter().map(|&bit| (bit.name(), bit)).collect());

impl FilterBit {
    /// All entries in catalog order.
    pub const ALL: [FilterBit; N_FILTER_BITS] = [
        FilterBit::GoodVertices,
        FilterBit::GlobalTightHalo2016Filter,
        FilterBit::GlobalSuperTightHalo2016Filter,
        FilterBit::HbheNoiseFilter,
        FilterBit::HbheNoiseIsoFilter,
        FilterBit::EcalDeadCellTriggerPrimitiveFilter,
        FilterBit::BadPfMuonFilter,
        FilterBit::BadChargedCandidateFilter,
        FilterBit::EeBadScFilter,
        FilterBit::EcalBadCalibFilter,
        FilterBit::EcalLaserCorrFilter,
        FilterBit::EcalDeadCellBoundaryEnergyFilter,
        FilterBit::EcalBadCalibFilterUpdate,
        FilterBit::EcalLaserCorrFilterUpdate,
        FilterBit::EcalDeadCellBoundaryEnergyFilterUpdate,
        FilterBit::BadChargedCandidateFilterUpdate,
    ];

    /// Position in the catalog.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Entry at `index`, if any.
    pub fn from_index(index: usize) -> Option<FilterBit> {
        Self::ALL.get(index).copied()
    }

    /// Column / flag name.
    pub fn name(self) -> &'static str {
        NAMES[self.index()]
    }

    /// Entry with the given name.
    pub fn from_name(name: &str) -> Option<FilterBit> {
        BY_NAME.get(name).copied()
    }

    /// Whether the flag comes from a filter rerun on top of the input.
    pub fn is_rerun_update(self) -> bool {
        matches!(
            self,
            FilterBit::EcalBadCalibFilterUpdate
                | FilterBit::EcalLaserCorrFilterUpdate
                | FilterBit::EcalDeadCellBoundaryEnergyFilterUpdate
                | FilterBit::BadChargedCandidateFilterUpdate
        )
    }
}

/// Outcome of a single flag lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FilterDecision {
    /// The source reported a pass.
    Pass,
    /// The source reported a fail.
    Fail,
    /// The source or the flag was unavailable; treated as a pass.
    #[default]
    DefaultedPass,
}

impl FilterDecision {
    /// Map a lookup result onto a decision, failing open on `None`.
    pub fn from_lookup(value: Option<bool>) -> FilterDecision {
        match value {
            Some(true) => FilterDecision::Pass,
            Some(false) => FilterDecision::Fail,
            None => FilterDecision::DefaultedPass,
        }
    }

    /// Boolean value of the decision.
    pub fn passed(self) -> bool {
        !matches!(self, FilterDecision::Fail)
    }
}

/// Decisions for every catalog entry of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FilterDecisionSet([FilterDecision; N_FILTER_BITS]);

impl FilterDecisionSet {
    /// Decision stored for `bit`.
    pub fn get(&self, bit: FilterBit) -> FilterDecision {
        self.0[bit.index()]
    }

    /// Store the decision for `bit`.
    pub fn set(&mut self, bit: FilterBit, decision: FilterDecision) {
        self.0[bit.index()] = decision;
    }

    /// Boolean decision by catalog index; out-of-range indices read as `false`.
    pub fn decision_by_index(&self, index: usize) -> bool {
        FilterBit::from_index(index).is_some_and(|bit| self.get(bit).passed())
    }

    /// Boolean decision by flag name; unknown names fail open.
    pub fn decision_by_name(&self, name: &str) -> bool {
        FilterBit::from_name(name).is_none_or(|bit| self.get(bit).passed())
    }

    /// `(bit, decision)` pairs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (FilterBit, FilterDecision)> + '_ {
        FilterBit::ALL.iter().map(move |&bit| (bit, self.get(bit)))
    }

    /// Whether every flag passed (defaulted passes included).
    pub fn all_passed(&self) -> bool {
        self.0.iter().all(|d| d.passed())
    }
}
