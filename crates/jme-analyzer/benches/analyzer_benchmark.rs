//! Criterion benchmarks for the per-event pipeline.
//!
//! Run: `cargo bench -p jme-analyzer --bench analyzer_benchmark`

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use jme_analyzer::{Analyzer, AnalyzerConfig, VecSink, flatten};
use jme_core::{EventId, PfCandidate, RawEventInput, RawJet, RawMet, RawVertex};

fn make_event(n_jets: usize, n_pf: usize) -> RawEventInput {
    let jets = (0..n_jets)
        .map(|i| {
            let pt = 25.0 + 400.0 / (i as f64 + 1.0);
            RawJet {
                pt,
                eta: -2.4 + (i as f64 * 0.37) % 4.8,
                phi: (i as f64 * 0.71) % std::f64::consts::PI,
                uncorrected_pt: pt * 0.92,
                l3_absolute_pt: pt * 0.98,
                chef: 0.5,
                nhef: 0.1,
                neef: 0.2,
                ceef: 0.05,
                charged_multiplicity: 8,
                neutral_multiplicity: 4,
                ..Default::default()
            }
        })
        .collect();
    let pf_candidates = (0..n_pf)
        .map(|i| PfCandidate {
            pt: 1.0 + (i % 50) as f64,
            eta: -2.0 + (i as f64 * 0.013) % 4.0,
            phi: (i as f64 * 0.29) % std::f64::consts::PI,
            pdg_id: if i % 3 == 0 { 22 } else { 211 },
            from_pv: 3,
        })
        .collect();

    RawEventInput {
        id: EventId { run: 1, event: 1, lumi_block: 1, bunch_crossing: 0 },
        vertices: Some(vec![RawVertex { z: 0.0, ndof: 30.0 }; 40]),
        rho: Some(21.0),
        rho_central_neutral: Some(8.0),
        electrons: Some(Vec::new()),
        muons: Some(Vec::new()),
        photons: Some(Vec::new()),
        jets: Some(jets),
        met: Some(vec![RawMet { pt: 85.0, phi: 0.4 }]),
        puppi_met: Some(vec![RawMet { pt: 80.0, phi: 0.35 }]),
        pf_candidates: Some(pf_candidates),
        l1_final_or_prev_bx: Some(false),
        ..Default::default()
    }
}

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");

    for n_jets in [4usize, 16, 64] {
        let event = make_event(n_jets, 1000);
        group.bench_with_input(BenchmarkId::new("jets", n_jets), &event, |b, ev| {
            let mut analyzer = Analyzer::new(AnalyzerConfig::default()).unwrap();
            b.iter(|| black_box(analyzer.analyze(black_box(ev)).unwrap()))
        });
    }

    group.finish();
}

fn bench_flatten(c: &mut Criterion) {
    let mut analyzer = Analyzer::new(AnalyzerConfig::default()).unwrap();
    let layout = analyzer.row_layout();
    let outcome = analyzer.analyze(&make_event(32, 0)).unwrap();
    let record = outcome.record().unwrap().clone();

    c.bench_function("flatten_32_jets", |b| b.iter(|| black_box(flatten(black_box(&record), layout))));

    c.bench_function("analyze_into_vec_sink", |b| {
        let event = make_event(16, 500);
        b.iter(|| {
            let mut sink = VecSink::default();
            analyzer.analyze_into(&event, &mut sink).unwrap();
            black_box(sink.rows.len())
        })
    });
}

criterion_group!(benches, bench_analyze, bench_flatten);
criterion_main!(benches);
