use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Value, json};

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_jme"))
}

fn tmp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("jme_cli_{}_{}_{}", std::process::id(), nanos, name));
    std::fs::create_dir_all(&p).unwrap();
    p
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

fn event(event: u64, met: f64) -> Value {
    json!({
        "id": {"run": 320000, "event": event, "lumi_block": 4},
        "vertices": [{"z": 0.1, "ndof": 40.0}, {"z": -3.0, "ndof": 12.0}],
        "rho": 20.5,
        "rho_central_neutral": 7.25,
        "met_filters_pat": [
            {"name": "Flag_goodVertices", "accept": true},
            {"name": "Flag_eeBadScFilter", "accept": false}
        ],
        "electrons": [],
        "muons": [],
        "photons": [],
        "jets": [{
            "pt": 64.0, "eta": 0.4, "phi": 1.1,
            "uncorrected_pt": 58.0, "l3_absolute_pt": 63.0,
            "chef": 0.55, "nhef": 0.1, "neef": 0.2, "ceef": 0.05, "muef": 0.0,
            "charged_multiplicity": 9, "neutral_multiplicity": 5,
            "discriminators": {"pfDeepFlavourJetTags:probc": 0.12}
        }],
        "met": [{"pt": met, "phi": 0.3}],
        "puppi_met": [{"pt": met * 0.9, "phi": 0.25}],
        "pf_candidates": [{"pt": 31.0, "eta": 0.2, "phi": 1.0, "pdg_id": 211, "from_pv": 3}],
        "hlt": [
            {"name": "HLT_PFJet500_v19", "accept": true},
            {"name": "HLT_PFMET120_PFMHT120_IDTight_v20", "accept": false}
        ],
        "l1_final_or_prev_bx": false
    })
}

fn write_events(path: &Path, events: &[Value]) {
    let text: String = events.iter().map(|e| format!("{e}\n")).collect();
    std::fs::write(path, text).unwrap();
}

#[test]
fn run_writes_json_lines_and_histograms() {
    let dir = tmp_dir("jsonl");
    let input = dir.join("events.jsonl");
    write_events(&input, &[event(1, 40.0), event(2, 150.0), event(3, 210.0)]);

    let config = dir.join("config.yaml");
    std::fs::write(&config, "skim: MET100\njet_pt_cut: 30\n").unwrap();
    let output = dir.join("rows.jsonl");
    let hists = dir.join("hists.json");

    let out = run(&[
        "run",
        "--config",
        config.to_str().unwrap(),
        "--input",
        input.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--histograms",
        hists.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "run failed, stderr={}", String::from_utf8_lossy(&out.stderr));

    let rows: Vec<Value> = std::fs::read_to_string(&output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["_eventNb"], 2);
    assert_eq!(rows[0]["Flag_eeBadScFilter"], false);
    assert_eq!(rows[0]["Flag_goodVertices"], true);
    assert_eq!(rows[0]["HLT_PFJet500"], true);
    assert_eq!(rows[0]["HLT_PFMET120_PFMHT120_IDTight"], false);
    assert_eq!(rows[0]["HLT_PFMET120_PFMHT120_IDTight_PFHT60"], false);
    assert_eq!(rows[0]["_jetDeepJet_c"], json!([0.12]));
    assert_eq!(rows[0]["_jetDeepJet_g"], json!([-1000.0]));
    assert_eq!(rows[0]["_l1prefire"], false);

    let summary: Value = serde_json::from_str(&std::fs::read_to_string(&hists).unwrap()).unwrap();
    assert_eq!(summary["stats"]["seen"], 3);
    assert_eq!(summary["stats"]["accepted"], 2);
    assert_eq!(summary["stats"]["rejected_final"], 1);
    assert_eq!(summary["histograms"][0]["name"], "h_nvtx");
    assert_eq!(summary["histograms"][0]["entries"], 2.0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn run_writes_parquet() {
    let dir = tmp_dir("parquet");
    let input = dir.join("events.jsonl");
    write_events(&input, &[event(1, 40.0), event(2, 50.0)]);
    let output = dir.join("rows.parquet");

    let out = run(&[
        "run",
        "--input",
        input.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--max-events",
        "1",
    ]);
    assert!(out.status.success(), "run failed, stderr={}", String::from_utf8_lossy(&out.stderr));

    let batches = jme_analyzer::arrow::parquet::read_parquet_batches(&output).unwrap();
    let total: usize = batches.iter().map(|b| b.num_rows()).sum();
    assert_eq!(total, 1);
    assert!(batches[0].schema().field_with_name("_jetPt").is_ok());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_collection_skips_event_unless_fail_fast() {
    let dir = tmp_dir("missing");
    let input = dir.join("events.jsonl");
    let mut broken = event(1, 40.0);
    broken.as_object_mut().unwrap().remove("rho");
    write_events(&input, &[broken, event(2, 40.0)]);
    let output = dir.join("rows.jsonl");

    let args =
        ["run", "--input", input.to_str().unwrap(), "--output", output.to_str().unwrap()];
    let out = run(&args);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(std::fs::read_to_string(&output).unwrap().lines().count(), 1);

    let mut strict = args.to_vec();
    strict.push("--fail-fast");
    let out = run(&strict);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("rho"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn event_diagnostics_follow_debug_switch() {
    let dir = tmp_dir("debug");
    let input = dir.join("events.jsonl");
    let mut broken = event(1, 40.0);
    broken.as_object_mut().unwrap().remove("rho");
    write_events(&input, &[broken, event(2, 40.0)]);
    let output = dir.join("rows.jsonl");

    let logs = |config: &str| {
        let path = dir.join("config.yaml");
        std::fs::write(&path, config).unwrap();
        let out = run(&[
            "run",
            "--config",
            path.to_str().unwrap(),
            "--input",
            input.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ]);
        assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
        format!("{}{}", String::from_utf8_lossy(&out.stdout), String::from_utf8_lossy(&out.stderr))
    };

    let quiet = logs("debug: false\n");
    assert!(!quiet.contains("Missing required collection"), "{quiet}");

    let verbose = logs("debug: true\n");
    assert!(verbose.contains("Missing required collection: rho"), "{verbose}");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn pick_list_file_restricts_events() {
    let dir = tmp_dir("picks");
    let input = dir.join("events.jsonl");
    write_events(&input, &[event(1, 40.0), event(2, 40.0), event(3, 40.0)]);
    let picks = dir.join("picks.txt");
    std::fs::write(&picks, "320000:4:3\n").unwrap();
    let output = dir.join("rows.jsonl");

    let out = run(&[
        "run",
        "--input",
        input.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--pick-events",
        picks.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    let text = std::fs::read_to_string(&output).unwrap();
    let rows: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["_eventNb"], 3);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn catalog_lists_filters_and_paths() {
    let out = run(&["catalog", "--json"]);
    assert!(out.status.success());
    let v: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["filters"].as_array().unwrap().len(), 16);
    assert_eq!(v["hlt_paths"].as_array().unwrap().len(), 33);
    assert_eq!(v["filters"][12]["rerun_update"], true);
}

#[test]
fn config_template_roundtrips() {
    let out = run(&["config"]);
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("jet_pt_cut"));
    assert!(text.contains("cutBasedElectronID-Fall17-94X-V2-veto"));
}
