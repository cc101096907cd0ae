//! Muon momentum scale and resolution corrections.

use std::f64::consts::SQRT_2;
use std::path::Path;

use jme_core::{Error, MuonMomentumCorrector, Result};
use serde::{Deserialize, Serialize};
use statrs::function::erf::erf_inv;

const PROB_EPS: f64 = 1e-12;

/// Leaves every muon untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMuonCorrection;

impl MuonMomentumCorrector for NoMuonCorrection {
    fn scale_data(&self, _charge: i32, _pt: f64, _eta: f64, _phi: f64) -> f64 {
        1.0
    }

    fn spread_mc(&self, _charge: i32, _pt: f64, _eta: f64, _phi: f64, _gen_pt: f64) -> f64 {
        1.0
    }

    fn smear_mc(&self, _: i32, _: f64, _: f64, _: f64, _: u32, _: f64) -> f64 {
        1.0
    }
}

/// Per-charge scale factors, indexed `[eta bin][phi bin]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeScales {
    pub positive: Vec<Vec<f64>>,
    pub negative: Vec<Vec<f64>>,
}

impl ChargeScales {
    fn get(&self, charge: i32, ieta: usize, iphi: usize) -> f64 {
        let grid = if charge < 0 { &self.negative } else { &self.positive };
        grid[ieta][iphi]
    }

    fn check_shape(&self, what: &str, n_eta: usize, n_phi: usize) -> Result<()> {
        for (sign, grid) in [("positive", &self.positive), ("negative", &self.negative)] {
            if grid.len() != n_eta || grid.iter().any(|row| row.len() != n_phi) {
                return Err(Error::Calibration(format!(
                    "muon corrections: {what}.{sign} must be {n_eta}x{n_phi}"
                )));
            }
            if grid.iter().flatten().any(|v| !v.is_finite() || *v <= 0.0) {
                return Err(Error::Calibration(format!(
                    "muon corrections: {what}.{sign} must be finite and positive"
                )));
            }
        }
        Ok(())
    }
}

/// Extra resolution multiplier for tracks with at least `min_layers` hits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerScale {
    pub min_layers: u32,
    pub factor: f64,
}

/// Binned Rochester-style corrections loaded from JSON.
///
/// Scale factors live on an (eta, phi) grid per charge; resolutions are
/// relative pt resolutions per eta bin. Lookups clamp to the edge bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabulatedMuonCorrections {
    pub eta_edges: Vec<f64>,
    pub phi_edges: Vec<f64>,
    pub data_scale: ChargeScales,
    /// Defaults to unity when absent.
    #[serde(default)]
    pub mc_scale: Option<ChargeScales>,
    pub data_resolution: Vec<f64>,
    pub mc_resolution: Vec<f64>,
    /// Sorted by `min_layers`.
    #[serde(default)]
    pub layer_scales: Vec<LayerScale>,
}

fn bin_index(edges: &[f64], value: f64) -> usize {
    let n_bins = edges.len().saturating_sub(1).max(1);
    edges.partition_point(|&e| e <= value).saturating_sub(1).min(n_bins - 1)
}

fn standard_normal_quantile(u: f64) -> f64 {
    SQRT_2 * erf_inv(2.0 * u.clamp(PROB_EPS, 1.0 - PROB_EPS) - 1.0)
}

impl TabulatedMuonCorrections {
    /// Parse and validate corrections from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Load corrections from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Calibration(format!("failed to read muon corrections {}: {e}", path.display()))
        })?;
        Self::from_json(&text).map_err(|e| {
            Error::Calibration(format!("failed to parse muon corrections {}: {e}", path.display()))
        })
    }

    pub fn validate(&self) -> Result<()> {
        for (name, edges) in [("eta_edges", &self.eta_edges), ("phi_edges", &self.phi_edges)] {
            if edges.len() < 2 {
                return Err(Error::Calibration(format!(
                    "muon corrections: {name} needs at least two edges"
                )));
            }
            if edges.iter().any(|e| !e.is_finite()) || edges.windows(2).any(|w| w[1] <= w[0]) {
                return Err(Error::Calibration(format!(
                    "muon corrections: {name} must be finite and strictly increasing"
                )));
            }
        }
        let n_eta = self.eta_edges.len() - 1;
        let n_phi = self.phi_edges.len() - 1;
        self.data_scale.check_shape("data_scale", n_eta, n_phi)?;
        if let Some(mc) = &self.mc_scale {
            mc.check_shape("mc_scale", n_eta, n_phi)?;
        }
        for (name, res) in [("data_resolution", &self.data_resolution), ("mc_resolution", &self.mc_resolution)] {
            if res.len() != n_eta {
                return Err(Error::Calibration(format!(
                    "muon corrections: {name} must have {n_eta} entries"
                )));
            }
            if res.iter().any(|r| !r.is_finite() || *r < 0.0) {
                return Err(Error::Calibration(format!(
                    "muon corrections: {name} must be finite and non-negative"
                )));
            }
        }
        if self.mc_resolution.iter().any(|r| *r == 0.0) {
            return Err(Error::Calibration("muon corrections: mc_resolution must be positive".into()));
        }
        if self.layer_scales.windows(2).any(|w| w[1].min_layers <= w[0].min_layers) {
            return Err(Error::Calibration(
                "muon corrections: layer_scales must be sorted by min_layers".into(),
            ));
        }
        Ok(())
    }

    fn bins(&self, eta: f64, phi: f64) -> (usize, usize) {
        (bin_index(&self.eta_edges, eta), bin_index(&self.phi_edges, phi))
    }

    fn mc_scale_at(&self, charge: i32, ieta: usize, iphi: usize) -> f64 {
        self.mc_scale.as_ref().map_or(1.0, |s| s.get(charge, ieta, iphi))
    }

    /// Resolution the simulation is missing relative to data.
    fn extra_resolution(&self, ieta: usize) -> f64 {
        let data = self.data_resolution[ieta];
        let mc = self.mc_resolution[ieta];
        (data * data - mc * mc).max(0.0).sqrt()
    }

    fn layer_factor(&self, tracker_layers: u32) -> f64 {
        self.layer_scales
            .iter()
            .rev()
            .find(|l| tracker_layers >= l.min_layers)
            .map_or(1.0, |l| l.factor)
    }
}

impl MuonMomentumCorrector for TabulatedMuonCorrections {
    fn scale_data(&self, charge: i32, _pt: f64, eta: f64, phi: f64) -> f64 {
        let (ieta, iphi) = self.bins(eta, phi);
        self.data_scale.get(charge, ieta, iphi)
    }

    fn spread_mc(&self, charge: i32, pt: f64, eta: f64, phi: f64, gen_pt: f64) -> f64 {
        let (ieta, iphi) = self.bins(eta, phi);
        let scale = self.mc_scale_at(charge, ieta, iphi);
        if !(pt > 0.0 && gen_pt > 0.0) {
            return scale;
        }
        // Stretch the residual to the generator pt by the data/MC resolution ratio.
        let stretch = self.data_resolution[ieta] / self.mc_resolution[ieta];
        let scaled = scale * pt;
        let corrected = gen_pt + (scaled - gen_pt) * stretch.max(1.0);
        corrected / pt
    }

    fn smear_mc(
        &self,
        charge: i32,
        _pt: f64,
        eta: f64,
        phi: f64,
        tracker_layers: u32,
        u: f64,
    ) -> f64 {
        let (ieta, iphi) = self.bins(eta, phi);
        let scale = self.mc_scale_at(charge, ieta, iphi);
        let sigma = self.extra_resolution(ieta) * self.layer_factor(tracker_layers);
        scale * (1.0 + sigma * standard_normal_quantile(u))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const TABLE: &str = r#"{
        "eta_edges": [-2.4, 0.0, 2.4],
        "phi_edges": [-3.1416, 0.0, 3.1416],
        "data_scale": {
            "positive": [[1.01, 1.02], [1.03, 1.04]],
            "negative": [[0.99, 0.98], [0.97, 0.96]]
        },
        "data_resolution": [0.025, 0.02],
        "mc_resolution": [0.015, 0.02],
        "layer_scales": [{"min_layers": 0, "factor": 2.0}, {"min_layers": 10, "factor": 1.0}]
    }"#;

    fn table() -> TabulatedMuonCorrections {
        TabulatedMuonCorrections::from_json(TABLE).unwrap()
    }

    #[test]
    fn data_scale_by_charge_and_bin() {
        let t = table();
        assert_eq!(t.scale_data(1, 40.0, -1.0, -1.0), 1.01);
        assert_eq!(t.scale_data(1, 40.0, 1.0, 1.0), 1.04);
        assert_eq!(t.scale_data(-1, 40.0, 1.0, -1.0), 0.97);
        // Clamped to the edge bins.
        assert_eq!(t.scale_data(-1, 40.0, 3.0, 5.0), 0.96);
        assert_eq!(t.scale_data(1, 40.0, -9.0, -9.0), 1.01);
    }

    #[test]
    fn smear_median_is_pure_scale() {
        let t = table();
        assert_relative_eq!(t.smear_mc(1, 40.0, -1.0, 1.0, 12, 0.5), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn smear_width_and_layer_factor() {
        let t = table();
        let sigma = (0.025f64.powi(2) - 0.015f64.powi(2)).sqrt();
        // Phi^-1(0.8413447) ~ 1.
        let u = 0.841_344_746_068_542_9;
        assert_relative_eq!(t.smear_mc(1, 40.0, -1.0, 1.0, 12, u), 1.0 + sigma, epsilon = 1e-6);
        assert_relative_eq!(t.smear_mc(1, 40.0, -1.0, 1.0, 8, u), 1.0 + 2.0 * sigma, epsilon = 1e-6);
        // No extra smearing where data and MC agree.
        assert_relative_eq!(t.smear_mc(1, 40.0, 1.0, 1.0, 12, u), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn spread_pulls_towards_stretched_residual() {
        let t = table();
        let factor = t.spread_mc(1, 42.0, -1.0, 1.0, 40.0);
        let stretch = 0.025 / 0.015;
        assert_relative_eq!(factor * 42.0, 40.0 + 2.0 * stretch, epsilon = 1e-9);
        assert_relative_eq!(t.spread_mc(1, 42.0, 1.0, 1.0, 40.0), 1.0, epsilon = 1e-12);
        assert_eq!(t.spread_mc(1, 42.0, 1.0, 1.0, 0.0), 1.0);
    }

    #[test]
    fn rejects_bad_shapes() {
        let bad = TABLE.replace("[0.025, 0.02]", "[0.025]");
        assert!(matches!(TabulatedMuonCorrections::from_json(&bad), Err(Error::Calibration(_))));
        let bad = TABLE.replace("[1.03, 1.04]", "[1.03]");
        assert!(TabulatedMuonCorrections::from_json(&bad).is_err());
    }

    #[test]
    fn identity_correction() {
        let c = NoMuonCorrection;
        assert_eq!(c.scale_data(1, 10.0, 0.0, 0.0), 1.0);
        assert_eq!(c.spread_mc(1, 10.0, 0.0, 0.0, 9.0), 1.0);
        assert_eq!(c.smear_mc(1, 10.0, 0.0, 0.0, 10, 0.3), 1.0);
    }
}
