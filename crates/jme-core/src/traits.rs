//! Calibration and identification services consumed by the pipeline.
//!
//! The selection logic only decides when and how the outputs of these
//! services are combined; their algorithms live behind these traits.
//! Implementations must be pure: the same arguments give the same answer.

use crate::types::RawJet;

/// Jet quality (jet-ID) predicate.
pub trait JetIdProvider {
    /// Whether `jet` passes the quality criteria of data-taking era `era`.
    fn passes(&self, jet: &RawJet, era: &str) -> bool;
}

/// Jet energy correction uncertainty lookup.
pub trait JecUncertaintyProvider {
    /// Relative uncertainty for a jet at (`eta`, `pt`).
    fn uncertainty(&self, eta: f64, pt: f64) -> f64;
}

/// Muon momentum scale/resolution corrections.
///
/// Every method returns a multiplicative factor for the uncorrected pt.
pub trait MuonMomentumCorrector {
    /// Scale correction for collision data.
    fn scale_data(&self, charge: i32, pt: f64, eta: f64, phi: f64) -> f64;

    /// Resolution correction for simulation when a generator match exists.
    fn spread_mc(&self, charge: i32, pt: f64, eta: f64, phi: f64, gen_pt: f64) -> f64;

    /// Resolution correction for simulation without a generator match.
    ///
    /// `u` is a uniform random number in `[0, 1)`.
    fn smear_mc(
        &self,
        charge: i32,
        pt: f64,
        eta: f64,
        phi: f64,
        tracker_layers: u32,
        u: f64,
    ) -> f64;
}
