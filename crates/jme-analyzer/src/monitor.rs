//! Run-level monitoring histograms.

use serde::Serialize;

/// A fixed-binning 1D histogram with explicit under/overflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// Histogram name.
    pub name: String,
    /// Histogram title.
    pub title: String,
    /// Number of bins (excluding under/overflow).
    pub n_bins: usize,
    /// Lower edge of first bin.
    pub x_min: f64,
    /// Upper edge of last bin.
    pub x_max: f64,
    /// Bin edges (length = n_bins + 1).
    pub bin_edges: Vec<f64>,
    /// Bin contents (length = n_bins).
    pub bin_content: Vec<f64>,
    /// Underflow bin content.
    pub underflow: f64,
    /// Overflow bin content.
    pub overflow: f64,
    /// Total number of fills, flows included.
    pub entries: f64,
}

impl Histogram {
    /// `n_bins` equal-width bins on `[x_min, x_max)`.
    pub fn uniform(name: &str, title: &str, n_bins: usize, x_min: f64, x_max: f64) -> Self {
        let width = (x_max - x_min) / n_bins as f64;
        let bin_edges = (0..=n_bins).map(|i| x_min + width * i as f64).collect();
        Self {
            name: name.to_string(),
            title: title.to_string(),
            n_bins,
            x_min,
            x_max,
            bin_edges,
            bin_content: vec![0.0; n_bins],
            underflow: 0.0,
            overflow: 0.0,
            entries: 0.0,
        }
    }

    /// Add one unit-weight entry.
    pub fn fill(&mut self, value: f64) {
        self.entries += 1.0;
        match find_bin(&self.bin_edges, value) {
            Some(bin) => self.bin_content[bin] += 1.0,
            None if value < self.x_min => self.underflow += 1.0,
            // NaN lands in overflow.
            None => self.overflow += 1.0,
        }
    }

    /// Sum of in-range bin contents.
    pub fn integral(&self) -> f64 {
        self.bin_content.iter().sum()
    }
}

/// Find the bin index for a value given sorted bin edges.
///
/// Returns `None` for underflow/overflow.
fn find_bin(edges: &[f64], val: f64) -> Option<usize> {
    let (first, last) = (*edges.first()?, *edges.last()?);
    if !(val >= first && val < last) {
        return None;
    }
    // Number of edges <= val; at least 1 because val >= first.
    Some(edges.partition_point(|&e| e <= val) - 1)
}

/// The three histograms filled for every accepted event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitoringHistograms {
    pub nvtx: Histogram,
    pub met: Histogram,
    pub puppi_met: Histogram,
}

impl Default for MonitoringHistograms {
    fn default() -> Self {
        Self {
            nvtx: Histogram::uniform("h_nvtx", "Number of reco vertices", 100, 0.0, 100.0),
            met: Histogram::uniform("h_PFMet", "PF MET (GeV)", 1000, 0.0, 5000.0),
            puppi_met: Histogram::uniform("h_PuppiMet", "PUPPI MET (GeV)", 1000, 0.0, 5000.0),
        }
    }
}

impl MonitoringHistograms {
    /// Record one accepted event.
    pub fn fill(&mut self, n_vertices: i32, met: f32, puppi_met: f32) {
        self.nvtx.fill(n_vertices.into());
        self.met.fill(met.into());
        self.puppi_met.fill(puppi_met.into());
    }

    /// Histograms in output order.
    pub fn iter(&self) -> impl Iterator<Item = &Histogram> {
        [&self.nvtx, &self.met, &self.puppi_met].into_iter()
    }
}
