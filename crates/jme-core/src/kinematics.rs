//! Minimal four-vector arithmetic used by the selection and truth stages.

use std::ops::{Add, AddAssign};

/// Cartesian four-momentum `(px, py, pz, E)`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LorentzVector {
    /// x component of the momentum.
    pub px: f64,
    /// y component of the momentum.
    pub py: f64,
    /// z component of the momentum.
    pub pz: f64,
    /// Energy.
    pub e: f64,
}

impl LorentzVector {
    /// Build from Cartesian components.
    pub fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self { px, py, pz, e }
    }

    /// Build from transverse momentum, pseudorapidity, azimuth and mass.
    pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, m: f64) -> Self {
        let px = pt * phi.cos();
        let py = pt * phi.sin();
        let pz = pt * eta.sinh();
        let p2 = px * px + py * py + pz * pz;
        let e = if m >= 0.0 { (p2 + m * m).sqrt() } else { (p2 - m * m).max(0.0).sqrt() };
        Self { px, py, pz, e }
    }

    /// Build from transverse momentum, pseudorapidity, azimuth and energy.
    pub fn from_pt_eta_phi_e(pt: f64, eta: f64, phi: f64, e: f64) -> Self {
        Self { px: pt * phi.cos(), py: pt * phi.sin(), pz: pt * eta.sinh(), e }
    }

    /// Transverse momentum.
    pub fn pt(&self) -> f64 {
        self.px.hypot(self.py)
    }

    /// Azimuth in `(-pi, pi]`; 0 for a vanishing transverse momentum.
    pub fn phi(&self) -> f64 {
        if self.px == 0.0 && self.py == 0.0 { 0.0 } else { self.py.atan2(self.px) }
    }

    /// Squared invariant mass.
    pub fn mass2(&self) -> f64 {
        self.e * self.e - (self.px * self.px + self.py * self.py + self.pz * self.pz)
    }

    /// Invariant mass. Space-like vectors return `-sqrt(-m2)`.
    pub fn mass(&self) -> f64 {
        let m2 = self.mass2();
        if m2 < 0.0 { -(-m2).sqrt() } else { m2.sqrt() }
    }
}

impl Add for LorentzVector {
    type Output = LorentzVector;

    fn add(self, rhs: LorentzVector) -> LorentzVector {
        LorentzVector {
            px: self.px + rhs.px,
            py: self.py + rhs.py,
            pz: self.pz + rhs.pz,
            e: self.e + rhs.e,
        }
    }
}

impl AddAssign for LorentzVector {
    fn add_assign(&mut self, rhs: LorentzVector) {
        *self = *self + rhs;
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn back_to_back_massless_pair_mass() {
        let a = LorentzVector::from_pt_eta_phi_m(45.0, 0.0, 0.0, 0.0);
        let b = LorentzVector::from_pt_eta_phi_m(45.0, 0.0, PI, 0.0);
        assert_relative_eq!((a + b).mass(), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn transverse_sum() {
        let mut sum = LorentzVector::default();
        sum += LorentzVector::from_pt_eta_phi_e(10.0, 1.0, 0.0, 20.0);
        sum += LorentzVector::from_pt_eta_phi_e(10.0, -1.0, PI / 2.0, 20.0);
        assert_relative_eq!(sum.pt(), 200f64.sqrt(), epsilon = 1e-9);
        assert_relative_eq!(sum.phi(), PI / 4.0, epsilon = 1e-9);
        assert_eq!(LorentzVector::default().phi(), 0.0);
    }
}
