//! Flat row schema and row sinks.
//!
//! An accepted [`EventRecord`] is flattened into an ordered list of named
//! columns. Scalars stay scalars; per-object sequences become list columns of
//! equal length within a collection. The column set is fixed for a job by
//! [`RowLayout`], so every row of a job has the same schema.

use std::io::Write;

use jme_core::{PileupJetIdVariables, Result};
use serde::Serialize;
use serde::ser::SerializeMap;

use crate::record::{EventRecord, JetRecord};

/// One column value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnValue {
    U64(u64),
    I32(i32),
    F32(f32),
    Bool(bool),
    I32List(Vec<i32>),
    F32List(Vec<f32>),
    BoolList(Vec<bool>),
}

macro_rules! column_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for ColumnValue {
            fn from(v: $ty) -> Self {
                ColumnValue::$variant(v)
            }
        })*
    };
}

column_from! {
    u64 => U64,
    i32 => I32,
    f32 => F32,
    bool => Bool,
    Vec<i32> => I32List,
    Vec<f32> => F32List,
    Vec<bool> => BoolList,
}

/// Ordered `(column name, value)` pairs for one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRow {
    columns: Vec<(&'static str, ColumnValue)>,
}

impl FlatRow {
    fn push(&mut self, name: &'static str, value: impl Into<ColumnValue>) {
        self.columns.push((name, value.into()));
    }

    /// Columns in schema order.
    pub fn columns(&self) -> &[(&'static str, ColumnValue)] {
        &self.columns
    }

    /// Value of column `name`.
    pub fn get(&self, name: &str) -> Option<&ColumnValue> {
        self.columns.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Column names in schema order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|(n, _)| *n)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Serialize for FlatRow {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Job-level switches that decide which columns exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowLayout {
    /// Generator columns are written; the L1 prefire column is not.
    pub is_mc: bool,
    /// Pileup-ID input-variable columns are written.
    pub save_pu_id_variables: bool,
}

/// Pileup-ID input variable columns, with the value read from the bundle.
const PU_ID_F32_COLUMNS: [(&str, fn(&PileupJetIdVariables) -> f32); 13] = [
    ("_jet_beta", |v| v.beta),
    ("_jet_dR2Mean", |v| v.dr2_mean),
    ("_jet_majW", |v| v.maj_w),
    ("_jet_minW", |v| v.min_w),
    ("_jet_frac01", |v| v.frac01),
    ("_jet_frac02", |v| v.frac02),
    ("_jet_frac03", |v| v.frac03),
    ("_jet_frac04", |v| v.frac04),
    ("_jet_ptD", |v| v.pt_d),
    ("_jet_betaStar", |v| v.beta_star),
    ("_jet_pull", |v| v.pull),
    ("_jet_jetR", |v| v.jet_r),
    ("_jet_jetRchg", |v| v.jet_r_chg),
];

const PU_ID_I32_COLUMNS: [(&str, fn(&PileupJetIdVariables) -> i32); 2] =
    [("_jet_nParticles", |v| v.n_particles), ("_jet_nCharged", |v| v.n_charged)];

/// Column value for jets whose pileup-ID bundle is missing.
const MISSING_PU_ID_VALUE: i32 = -1;

fn per_jet<T>(jets: &[JetRecord], f: impl Fn(&JetRecord) -> T) -> Vec<T> {
    jets.iter().map(f).collect()
}

/// Flatten `record` into a row with the columns selected by `layout`.
pub fn flatten(record: &EventRecord, layout: RowLayout) -> FlatRow {
    let mut row = FlatRow::default();

    row.push("_eventNb", record.id.event);
    row.push("_runNb", record.id.run);
    row.push("_lumiBlock", record.id.lumi_block);
    row.push("_bx", record.id.bunch_crossing);
    row.push("_n_PV", record.n_vertices);
    row.push("_rho", record.rho);
    row.push("_rhoNC", record.rho_central_neutral);

    for (bit, decision) in record.filters.iter() {
        row.push(bit.name(), decision.passed());
    }

    let jets = &record.jets;
    row.push("_jetEta", per_jet(jets, |j| j.eta));
    row.push("_jetPhi", per_jet(jets, |j| j.phi));
    row.push("_jetPt", per_jet(jets, |j| j.pt));
    row.push("_jetRawPt", per_jet(jets, |j| j.raw_pt));
    row.push("_jet_CHEF", per_jet(jets, |j| j.chef));
    row.push("_jet_NHEF", per_jet(jets, |j| j.nhef));
    row.push("_jet_NEEF", per_jet(jets, |j| j.neef));
    row.push("_jet_CEEF", per_jet(jets, |j| j.ceef));
    row.push("_jet_MUEF", per_jet(jets, |j| j.muef));
    row.push("_jet_CHM", per_jet(jets, |j| j.charged_multiplicity));
    row.push("_jet_NHM", per_jet(jets, |j| j.neutral_hadron_multiplicity));
    row.push("_jet_PHM", per_jet(jets, |j| j.photon_multiplicity));
    row.push("_jet_NM", per_jet(jets, |j| j.neutral_multiplicity));
    row.push("_jetArea", per_jet(jets, |j| j.area));
    row.push("_jetPassID", per_jet(jets, |j| j.pass_id));
    row.push("_jetPtGen", per_jet(jets, |j| j.pt_gen));
    row.push("_jetEtaGen", per_jet(jets, |j| j.eta_gen));
    row.push("_jetPhiGen", per_jet(jets, |j| j.phi_gen));
    row.push("_jetPtGenWithNu", per_jet(jets, |j| j.pt_gen_with_nu));
    row.push("_jetJECuncty", per_jet(jets, |j| j.jec_uncertainty));
    row.push("_jetPUMVA", per_jet(jets, |j| j.pu_mva));
    row.push("_jetPUMVAUpdate", per_jet(jets, |j| j.pu_mva_update));
    row.push("_jetPUMVAUpdate2017", per_jet(jets, |j| j.pu_mva_update_2017));
    row.push("_jetPUMVAUpdate2018", per_jet(jets, |j| j.pu_mva_update_2018));
    row.push("_jetPtNoL2L3Res", per_jet(jets, |j| j.pt_no_l2l3_res));
    row.push("_jet_corrjecs", per_jet(jets, |j| j.jec_factor));
    row.push("_jethadronFlavour", per_jet(jets, |j| j.hadron_flavour));
    row.push("_jetpartonFlavour", per_jet(jets, |j| j.parton_flavour));
    row.push("_jetDeepJet_b", per_jet(jets, |j| j.deepjet_b));
    row.push("_jetDeepJet_c", per_jet(jets, |j| j.deepjet_c));
    row.push("_jetDeepJet_uds", per_jet(jets, |j| j.deepjet_uds));
    row.push("_jetDeepJet_g", per_jet(jets, |j| j.deepjet_g));
    row.push("_jetQuarkGluonLikelihood", per_jet(jets, |j| j.quark_gluon_likelihood));

    if layout.save_pu_id_variables {
        for (name, get) in PU_ID_F32_COLUMNS {
            row.push(
                name,
                per_jet(jets, |j| j.pu_id_variables.as_ref().map_or(MISSING_PU_ID_VALUE as f32, get)),
            );
        }
        for (name, get) in PU_ID_I32_COLUMNS {
            row.push(
                name,
                per_jet(jets, |j| j.pu_id_variables.as_ref().map_or(MISSING_PU_ID_VALUE, get)),
            );
        }
    }

    let leptons = &record.leptons;
    row.push("_lEta", leptons.iter().map(|l| l.eta).collect::<Vec<_>>());
    row.push("_lPhi", leptons.iter().map(|l| l.phi).collect::<Vec<_>>());
    row.push("_lPt", leptons.iter().map(|l| l.pt).collect::<Vec<_>>());
    row.push("_lPtcorr", leptons.iter().map(|l| l.pt_corr).collect::<Vec<_>>());
    row.push("_lpdgId", leptons.iter().map(|l| l.pdg_id).collect::<Vec<_>>());
    row.push("_lPassTightID", leptons.iter().map(|l| l.pass_tight_id).collect::<Vec<_>>());
    row.push("_nEles", record.n_electrons);
    row.push("_nMus", record.n_muons);

    if layout.is_mc {
        let gl = &record.gen_leptons;
        row.push("_lgenEta", gl.iter().map(|l| l.eta).collect::<Vec<_>>());
        row.push("_lgenPhi", gl.iter().map(|l| l.phi).collect::<Vec<_>>());
        row.push("_lgenPt", gl.iter().map(|l| l.pt).collect::<Vec<_>>());
        row.push("_lgenpdgId", gl.iter().map(|l| l.pdg_id).collect::<Vec<_>>());
        let gp = &record.gen_photons;
        row.push("_phgenEta", gp.iter().map(|p| p.eta).collect::<Vec<_>>());
        row.push("_phgenPhi", gp.iter().map(|p| p.phi).collect::<Vec<_>>());
        row.push("_phgenPt", gp.iter().map(|p| p.pt).collect::<Vec<_>>());
        row.push("_genHT", record.gen_ht);
        row.push("_weight", record.weight);
    }

    let photons = &record.photons;
    row.push("_phEta", photons.iter().map(|p| p.eta).collect::<Vec<_>>());
    row.push("_phPhi", photons.iter().map(|p| p.phi).collect::<Vec<_>>());
    row.push("_phPt", photons.iter().map(|p| p.pt).collect::<Vec<_>>());
    row.push("_phPtcorr", photons.iter().map(|p| p.pt_corr).collect::<Vec<_>>());
    row.push("_phPassTightID", photons.iter().map(|p| p.pass_tight_id).collect::<Vec<_>>());

    let pf = &record.pf_candidates;
    row.push("_PFcand_pt", pf.iter().map(|c| c.pt).collect::<Vec<_>>());
    row.push("_PFcand_eta", pf.iter().map(|c| c.eta).collect::<Vec<_>>());
    row.push("_PFcand_phi", pf.iter().map(|c| c.phi).collect::<Vec<_>>());
    row.push("_PFcand_pdgId", pf.iter().map(|c| c.pdg_id).collect::<Vec<_>>());
    row.push("_PFcand_fromPV", pf.iter().map(|c| c.from_pv).collect::<Vec<_>>());
    row.push("_n_CH_fromvtxfit", record.charged_hadrons.counts.to_vec());
    row.push("_HT_CH_fromvtxfit", record.charged_hadrons.ht.to_vec());

    if layout.is_mc {
        row.push("_genmet", record.gen_met);
        row.push("_genmet_phi", record.gen_met_phi);
        row.push("trueNVtx", record.true_n_vertices);
    }
    row.push("_met", record.met);
    row.push("_met_phi", record.met_phi);
    row.push("_puppimet", record.puppi_met);
    row.push("_puppimet_phi", record.puppi_met_phi);

    for (name, fired) in record.triggers.iter() {
        row.push(name, fired);
    }
    if !layout.is_mc {
        row.push("_l1prefire", record.l1_prefire);
    }
    row
}

/// Destination for flattened rows.
pub trait RowSink {
    /// Persist one row.
    fn write_row(&mut self, row: &FlatRow) -> Result<()>;

    /// Flush buffered rows; no rows may be written afterwards.
    fn finish(&mut self) -> Result<()>;
}

/// Writes one JSON object per line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RowSink for JsonLinesSink<W> {
    fn write_row(&mut self, row: &FlatRow) -> Result<()> {
        serde_json::to_writer(&mut self.writer, row)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps rows in memory.
#[derive(Debug, Default)]
pub struct VecSink {
    pub rows: Vec<FlatRow>,
}

impl RowSink for VecSink {
    fn write_row(&mut self, row: &FlatRow) -> Result<()> {
        self.rows.push(row.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests;
