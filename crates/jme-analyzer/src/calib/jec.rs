//! Jet energy correction uncertainty tables.

use std::path::Path;

use jme_core::{Error, JecUncertaintyProvider, Result};
use serde::{Deserialize, Serialize};

/// Uncertainty curve for one pseudorapidity slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtaSlice {
    pub eta_min: f64,
    pub eta_max: f64,
    /// `(pt, relative uncertainty)` knots, strictly increasing in pt.
    pub points: Vec<(f64, f64)>,
}

impl EtaSlice {
    fn interpolate(&self, pt: f64) -> f64 {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(f), Some(l)) => (*f, *l),
            _ => return 0.0,
        };
        if pt.is_nan() || pt <= first.0 {
            return first.1;
        }
        if pt >= last.0 {
            return last.1;
        }
        // first.0 < pt < last.0, so 1 <= hi < len.
        let hi = self.points.partition_point(|&(x, _)| x <= pt);
        let (x0, y0) = self.points[hi - 1];
        let (x1, y1) = self.points[hi];
        y0 + (y1 - y0) * (pt - x0) / (x1 - x0)
    }
}

/// Relative JEC uncertainty binned in eta and interpolated linearly in pt.
///
/// Lookups outside the table clamp to the nearest slice and knot.
///
/// ```json
/// {"slices": [{"eta_min": -5.0, "eta_max": 0.0, "points": [[10.0, 0.05], [1000.0, 0.01]]}]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinnedJecUncertainty {
    slices: Vec<EtaSlice>,
}

impl BinnedJecUncertainty {
    pub fn new(mut slices: Vec<EtaSlice>) -> Result<Self> {
        slices.sort_by(|a, b| a.eta_min.total_cmp(&b.eta_min));
        let table = Self { slices };
        table.validate()?;
        Ok(table)
    }

    /// Parse a table from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct Raw {
            slices: Vec<EtaSlice>,
        }
        let raw: Raw = serde_json::from_str(json)?;
        Self::new(raw.slices)
    }

    /// Load a table from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Calibration(format!("failed to read JEC uncertainty {}: {e}", path.display()))
        })?;
        Self::from_json(&text).map_err(|e| {
            Error::Calibration(format!("failed to parse JEC uncertainty {}: {e}", path.display()))
        })
    }

    pub fn slices(&self) -> &[EtaSlice] {
        &self.slices
    }

    fn validate(&self) -> Result<()> {
        if self.slices.is_empty() {
            return Err(Error::Calibration("JEC uncertainty: no eta slices".into()));
        }
        for (i, s) in self.slices.iter().enumerate() {
            if s.eta_min.is_nan() || s.eta_max.is_nan() || s.eta_min >= s.eta_max {
                return Err(Error::Calibration(format!(
                    "JEC uncertainty: slice {i} has invalid eta range [{}, {})",
                    s.eta_min, s.eta_max
                )));
            }
            if s.points.is_empty() {
                return Err(Error::Calibration(format!("JEC uncertainty: slice {i} has no points")));
            }
            if s.points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
                return Err(Error::Calibration(format!(
                    "JEC uncertainty: slice {i} has non-finite points"
                )));
            }
            if s.points.windows(2).any(|w| w[1].0 <= w[0].0) {
                return Err(Error::Calibration(format!(
                    "JEC uncertainty: slice {i} pt knots are not strictly increasing"
                )));
            }
        }
        if self.slices.windows(2).any(|w| w[1].eta_min < w[0].eta_max) {
            return Err(Error::Calibration("JEC uncertainty: eta slices overlap".into()));
        }
        Ok(())
    }

    fn slice_for(&self, eta: f64) -> &EtaSlice {
        // Slices are sorted and non-empty after validation.
        let idx = self.slices.partition_point(|s| s.eta_min <= eta).saturating_sub(1);
        let candidate = &self.slices[idx];
        if eta >= candidate.eta_max && idx + 1 < self.slices.len() {
            // Gap between slices: take the nearer neighbour.
            let next = &self.slices[idx + 1];
            if next.eta_min - eta < eta - candidate.eta_max {
                return next;
            }
        }
        candidate
    }
}

impl JecUncertaintyProvider for BinnedJecUncertainty {
    fn uncertainty(&self, eta: f64, pt: f64) -> f64 {
        self.slice_for(eta).interpolate(pt)
    }
}

/// The same relative uncertainty everywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConstantJecUncertainty(pub f64);

impl JecUncertaintyProvider for ConstantJecUncertainty {
    fn uncertainty(&self, _eta: f64, _pt: f64) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const TABLE: &str = r#"{
        "slices": [
            {"eta_min": 0.0, "eta_max": 2.5, "points": [[20.0, 0.04], [100.0, 0.02], [1000.0, 0.01]]},
            {"eta_min": -2.5, "eta_max": 0.0, "points": [[20.0, 0.05], [1000.0, 0.01]]}
        ]
    }"#;

    #[test]
    fn interpolates_within_slice() {
        let unc = BinnedJecUncertainty::from_json(TABLE).unwrap();
        assert_relative_eq!(unc.uncertainty(1.0, 60.0), 0.03, epsilon = 1e-12);
        assert_relative_eq!(unc.uncertainty(1.0, 100.0), 0.02, epsilon = 1e-12);
        assert_relative_eq!(unc.uncertainty(-1.0, 510.0), 0.03, epsilon = 1e-12);
    }

    #[test]
    fn clamps_outside_table() {
        let unc = BinnedJecUncertainty::from_json(TABLE).unwrap();
        assert_eq!(unc.uncertainty(1.0, 5.0), 0.04);
        assert_eq!(unc.uncertainty(1.0, 5000.0), 0.01);
        assert_eq!(unc.uncertainty(4.7, 20.0), 0.04);
        assert_eq!(unc.uncertainty(-4.7, 20.0), 0.05);
        assert_eq!(unc.uncertainty(1.0, f64::NAN), 0.04);
    }

    #[test]
    fn rejects_malformed_tables() {
        assert!(BinnedJecUncertainty::from_json(r#"{"slices": []}"#).is_err());
        let unsorted = r#"{"slices": [{"eta_min": 0.0, "eta_max": 1.0, "points": [[50.0, 0.1], [20.0, 0.2]]}]}"#;
        assert!(matches!(BinnedJecUncertainty::from_json(unsorted), Err(Error::Calibration(_))));
        let overlap = r#"{"slices": [
            {"eta_min": 0.0, "eta_max": 1.0, "points": [[20.0, 0.1]]},
            {"eta_min": 0.5, "eta_max": 2.0, "points": [[20.0, 0.1]]}
        ]}"#;
        assert!(BinnedJecUncertainty::from_json(overlap).is_err());
    }

    #[test]
    fn missing_file_is_a_calibration_error() {
        let err = BinnedJecUncertainty::from_path(Path::new("/nonexistent/jec.json")).unwrap_err();
        assert!(matches!(err, Error::Calibration(_)));
    }

    #[test]
    fn constant_provider() {
        let unc = ConstantJecUncertainty(0.03);
        assert_eq!(unc.uncertainty(-3.0, 15.0), 0.03);
    }
}
