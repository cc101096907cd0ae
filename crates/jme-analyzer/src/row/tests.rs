use jme_core::{EventId, PileupJetIdVariables};

use super::*;
use crate::catalog::{FilterBit, FilterDecision};
use crate::record::{ChargedHadronSums, JetRecord, LeptonRecord, NO_GEN_MATCH};
use crate::trigger::HLT_PATHS;

fn jet(pt: f32, pu_id_variables: Option<PileupJetIdVariables>) -> JetRecord {
    JetRecord {
        eta: 0.1,
        phi: 0.2,
        pt,
        raw_pt: pt / 1.1,
        pt_no_l2l3_res: pt,
        jec_factor: 1.1,
        jec_uncertainty: 0.02,
        chef: 0.5,
        nhef: 0.1,
        neef: 0.2,
        ceef: 0.1,
        muef: 0.1,
        charged_multiplicity: 10,
        neutral_hadron_multiplicity: 2,
        photon_multiplicity: 5,
        neutral_multiplicity: 7,
        area: 0.5,
        pass_id: true,
        pt_gen: NO_GEN_MATCH,
        eta_gen: NO_GEN_MATCH,
        phi_gen: NO_GEN_MATCH,
        pt_gen_with_nu: NO_GEN_MATCH,
        pu_mva: 0.8,
        pu_mva_update: -1.0,
        pu_mva_update_2017: -1.0,
        pu_mva_update_2018: -1.0,
        pu_id_variables,
        hadron_flavour: 5,
        parton_flavour: -5,
        deepjet_b: 0.9,
        deepjet_c: 0.05,
        deepjet_uds: 0.03,
        deepjet_g: 0.02,
        quark_gluon_likelihood: -1.0,
    }
}

fn record() -> EventRecord {
    let mut rec = EventRecord::new(EventId { run: 316_000, event: 123_456, lumi_block: 7, bunch_crossing: 1 });
    rec.n_vertices = 31;
    rec.jets = vec![
        jet(120.0, Some(PileupJetIdVariables { beta: 0.7, n_particles: 25, ..Default::default() })),
        jet(40.0, None),
    ];
    rec.leptons = vec![LeptonRecord { eta: 0.3, phi: 1.0, pt: 30.0, pt_corr: 30.5, pdg_id: -13, pass_tight_id: true }];
    rec.n_muons = 2;
    rec.charged_hadrons = ChargedHadronSums { counts: [9, 8, 7, 6, 2, 1], ht: [60.0, 59.0, 58.0, 55.0, 30.0, 12.0] };
    rec.filters.set(FilterBit::EeBadScFilter, FilterDecision::Fail);
    rec
}

#[test]
fn data_layout_columns() {
    let row = flatten(&record(), RowLayout { is_mc: false, save_pu_id_variables: false });
    assert_eq!(row.get("_runNb"), Some(&ColumnValue::U64(316_000)));
    assert_eq!(row.get("_n_PV"), Some(&ColumnValue::I32(31)));
    assert_eq!(row.get("Flag_eeBadScFilter"), Some(&ColumnValue::Bool(false)));
    assert_eq!(row.get("Flag_goodVertices"), Some(&ColumnValue::Bool(true)));
    assert_eq!(row.get("_l1prefire"), Some(&ColumnValue::Bool(false)));
    assert!(row.get("_genHT").is_none());
    assert!(row.get("trueNVtx").is_none());
    assert!(row.get("_jet_beta").is_none());
    for path in HLT_PATHS {
        assert!(row.get(path).is_some(), "{path}");
    }
    assert_eq!(row.get("_n_CH_fromvtxfit"), Some(&ColumnValue::I32List(vec![9, 8, 7, 6, 2, 1])));
}

#[test]
fn mc_layout_columns() {
    let row = flatten(&record(), RowLayout { is_mc: true, save_pu_id_variables: false });
    assert!(row.get("_l1prefire").is_none());
    assert_eq!(row.get("trueNVtx"), Some(&ColumnValue::I32(-1)));
    assert_eq!(row.get("_lgenPt"), Some(&ColumnValue::F32List(vec![])));
    assert!(row.get("_genmet").is_some());
    assert!(row.get("_weight").is_some());
}

#[test]
fn missing_pu_id_bundle_fills_minus_one() {
    let row = flatten(&record(), RowLayout { is_mc: false, save_pu_id_variables: true });
    assert_eq!(row.get("_jet_beta"), Some(&ColumnValue::F32List(vec![0.7, -1.0])));
    assert_eq!(row.get("_jet_nParticles"), Some(&ColumnValue::I32List(vec![25, -1])));
    assert_eq!(row.get("_jet_nCharged"), Some(&ColumnValue::I32List(vec![0, -1])));
}

#[test]
fn jet_columns_share_length() {
    let row = flatten(&record(), RowLayout { is_mc: true, save_pu_id_variables: true });
    for (name, value) in row.columns() {
        if !name.starts_with("_jet") {
            continue;
        }
        let len = match value {
            ColumnValue::F32List(v) => v.len(),
            ColumnValue::I32List(v) => v.len(),
            ColumnValue::BoolList(v) => v.len(),
            other => panic!("{name} is not a list: {other:?}"),
        };
        assert_eq!(len, 2, "{name}");
    }
}

#[test]
fn schema_is_stable_across_events() {
    let layout = RowLayout { is_mc: true, save_pu_id_variables: true };
    let full: Vec<_> = flatten(&record(), layout).names().collect();
    let empty: Vec<_> = flatten(&EventRecord::default(), layout).names().collect();
    assert_eq!(full, empty);
}

#[test]
fn json_lines_sink_writes_one_object_per_row() {
    let mut sink = JsonLinesSink::new(Vec::new());
    let row = flatten(&record(), RowLayout::default());
    sink.write_row(&row).unwrap();
    sink.write_row(&row).unwrap();
    sink.finish().unwrap();

    let text = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(parsed["_eventNb"], 123_456);
    assert_eq!(parsed["_lpdgId"], serde_json::json!([-13]));
    assert_eq!(parsed["Flag_eeBadScFilter"], false);
}
