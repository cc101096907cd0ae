//! Per-event orchestration.
//!
//! [`Analyzer`] owns the job configuration, the calibration services, the
//! muon-smearing random stream and the run-level histograms. Each call to
//! [`Analyzer::analyze`] builds one fresh [`EventRecord`]:
//!
//! ```text
//! pick list → vertices/rho → MET filters → electrons, muons, photons
//!   → skim (early) → jets → MET → PF candidates → truth (MC)
//!   → triggers → L1 prefire (data) → skim (final) → histograms
//! ```

use std::path::Path;

use jme_core::{
    Error, JecUncertaintyProvider, JetIdProvider, MuonMomentumCorrector, RawEventInput, RawMet,
    Result,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::calib::{
    BinnedJecUncertainty, CmsJetId, ConstantJecUncertainty, NoMuonCorrection,
    TabulatedMuonCorrections,
};
use crate::config::AnalyzerConfig;
use crate::monitor::MonitoringHistograms;
use crate::pick::PickList;
use crate::record::EventRecord;
use crate::resolver::{JetSideProducts, resolve_met_filters};
use crate::row::{RowLayout, RowSink, flatten};
use crate::selector::{
    JetContext, select_electrons, select_jets, select_muons, select_pf_candidates, select_photons,
};
use crate::skim::SkimStage;
use crate::trigger::TriggerBits;
use crate::truth;

/// What happened to one input event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// Not on the pick list; nothing was computed.
    NotPicked,
    /// Rejected by the skim at `stage`.
    Rejected { stage: SkimStage },
    /// Passed the skim.
    Accepted(Box<EventRecord>),
}

impl EventOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, EventOutcome::Accepted(_))
    }

    pub fn record(&self) -> Option<&EventRecord> {
        match self {
            EventOutcome::Accepted(rec) => Some(rec),
            _ => None,
        }
    }
}

/// Run-level event counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub seen: u64,
    pub not_picked: u64,
    pub rejected_early: u64,
    pub rejected_final: u64,
    pub accepted: u64,
    /// Events aborted because a required collection was missing.
    pub failed: u64,
    pub rows_written: u64,
}

/// Builder for [`Analyzer`].
///
/// Services not injected explicitly are built from the configuration:
/// the tight jet ID, the JEC uncertainty table at `jec_uncertainty_file`
/// and the muon corrections at `muon_correction_file`.
pub struct AnalyzerBuilder {
    config: AnalyzerConfig,
    jet_id: Option<Box<dyn JetIdProvider>>,
    jec_uncertainty: Option<Box<dyn JecUncertaintyProvider>>,
    muon_corrections: Option<Box<dyn MuonMomentumCorrector>>,
    picks: PickList,
}

impl AnalyzerBuilder {
    pub fn new(config: AnalyzerConfig) -> Self {
        let picks = PickList::from_pairs(&config.pick_events);
        Self { config, jet_id: None, jec_uncertainty: None, muon_corrections: None, picks }
    }

    pub fn jet_id(mut self, provider: impl JetIdProvider + 'static) -> Self {
        self.jet_id = Some(Box::new(provider));
        self
    }

    pub fn jec_uncertainty(mut self, provider: impl JecUncertaintyProvider + 'static) -> Self {
        self.jec_uncertainty = Some(Box::new(provider));
        self
    }

    pub fn muon_corrections(mut self, provider: impl MuonMomentumCorrector + 'static) -> Self {
        self.muon_corrections = Some(Box::new(provider));
        self
    }

    /// Add events to the pick list from the configuration.
    pub fn pick_list(mut self, picks: PickList) -> Self {
        self.picks.extend(picks);
        self
    }

    pub fn build(self) -> Result<Analyzer> {
        let config = self.config;

        let jec_uncertainty = match (self.jec_uncertainty, &config.jec_uncertainty_file) {
            (Some(provider), _) => provider,
            (None, Some(path)) => Box::new(load_jec_uncertainty(path)?),
            (None, None) => {
                log::warn!("no JEC uncertainty table configured, storing zero uncertainties");
                Box::new(ConstantJecUncertainty(0.0))
            }
        };

        let muon_corrections = match (self.muon_corrections, &config.muon_correction_file) {
            (Some(provider), _) => provider,
            (None, Some(path)) => Box::new(load_muon_corrections(path)?),
            (None, None) => {
                log::warn!("no muon corrections configured, corrected pt equals raw pt");
                Box::new(NoMuonCorrection)
            }
        };

        let jet_id = self.jet_id.unwrap_or_else(|| Box::new(CmsJetId::new(config.debug)));

        if !self.picks.is_empty() {
            log::info!("processing only {} picked events", self.picks.len());
        }

        Ok(Analyzer {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            jet_id,
            jec_uncertainty,
            muon_corrections,
            picks: self.picks,
            histograms: MonitoringHistograms::default(),
            stats: RunStats::default(),
        })
    }
}

fn load_jec_uncertainty(path: &Path) -> Result<BinnedJecUncertainty> {
    let table = BinnedJecUncertainty::from_path(path)?;
    log::info!("loaded JEC uncertainty table {} ({} eta slices)", path.display(), table.slices().len());
    Ok(table)
}

fn load_muon_corrections(path: &Path) -> Result<TabulatedMuonCorrections> {
    let table = TabulatedMuonCorrections::from_path(path)?;
    log::info!("loaded muon corrections {}", path.display());
    Ok(table)
}

fn required<'a, T>(collection: &'a Option<Vec<T>>, label: &'static str) -> Result<&'a [T]> {
    collection.as_deref().ok_or(Error::MissingCollection(label))
}

fn leading_met(collection: &Option<Vec<RawMet>>, label: &'static str) -> Result<RawMet> {
    required(collection, label)?.first().copied().ok_or(Error::MissingCollection(label))
}

/// The per-event pipeline.
pub struct Analyzer {
    config: AnalyzerConfig,
    jet_id: Box<dyn JetIdProvider>,
    jec_uncertainty: Box<dyn JecUncertaintyProvider>,
    muon_corrections: Box<dyn MuonMomentumCorrector>,
    rng: StdRng,
    picks: PickList,
    histograms: MonitoringHistograms,
    stats: RunStats,
}

impl Analyzer {
    /// Analyzer with every service built from `config`.
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        AnalyzerBuilder::new(config).build()
    }

    pub fn builder(config: AnalyzerConfig) -> AnalyzerBuilder {
        AnalyzerBuilder::new(config)
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Column layout of every row this analyzer emits.
    pub fn row_layout(&self) -> RowLayout {
        RowLayout { is_mc: self.config.is_mc, save_pu_id_variables: self.config.save_pu_id_variables }
    }

    pub fn histograms(&self) -> &MonitoringHistograms {
        &self.histograms
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Process one event.
    ///
    /// A missing required collection aborts only this event and is returned
    /// as [`Error::MissingCollection`]; the analyzer stays usable.
    pub fn analyze(&mut self, event: &RawEventInput) -> Result<EventOutcome> {
        self.stats.seen += 1;
        if !self.picks.picks(&event.id) {
            self.stats.not_picked += 1;
            return Ok(EventOutcome::NotPicked);
        }
        let outcome = self.process(event);
        match &outcome {
            Ok(EventOutcome::Accepted(_)) => self.stats.accepted += 1,
            Ok(EventOutcome::Rejected { stage: SkimStage::AfterLeptons }) => {
                self.stats.rejected_early += 1
            }
            Ok(EventOutcome::Rejected { stage: SkimStage::Final }) => self.stats.rejected_final += 1,
            Ok(EventOutcome::NotPicked) => {}
            Err(e) => {
                self.stats.failed += 1;
                if self.config.debug {
                    log::warn!("run {} event {}: {e}", event.id.run, event.id.event);
                }
            }
        }
        outcome
    }

    /// Process one event and write its row to `sink` when accepted.
    pub fn analyze_into(
        &mut self,
        event: &RawEventInput,
        sink: &mut dyn RowSink,
    ) -> Result<EventOutcome> {
        let outcome = self.analyze(event)?;
        if self.config.save_tree
            && let EventOutcome::Accepted(record) = &outcome
        {
            sink.write_row(&flatten(record, self.row_layout()))?;
            self.stats.rows_written += 1;
        }
        Ok(outcome)
    }

    fn process(&mut self, event: &RawEventInput) -> Result<EventOutcome> {
        let cfg = &self.config;
        let mut rec = EventRecord::new(event.id);

        rec.n_vertices = required(&event.vertices, "vertices")?.len() as i32;
        rec.rho = event.rho.ok_or(Error::MissingCollection("rho"))? as f32;
        rec.rho_central_neutral =
            event.rho_central_neutral.ok_or(Error::MissingCollection("rho_central_neutral"))? as f32;

        rec.filters = resolve_met_filters(event, cfg.debug);

        let electrons = select_electrons(required(&event.electrons, "electrons")?, cfg);
        let muons = select_muons(
            required(&event.muons, "muons")?,
            cfg,
            self.muon_corrections.as_ref(),
            &mut self.rng,
        );
        rec.n_electrons = electrons.n_veto;
        rec.n_muons = muons.n_veto;
        rec.leptons = electrons.leptons;
        rec.leptons.extend(muons.leptons);
        rec.photons = select_photons(required(&event.photons, "photons")?, cfg);

        if !cfg.skim.accepts(&rec, SkimStage::AfterLeptons) {
            if cfg.debug {
                log::debug!("event {} rejected by skim '{}' after leptons", event.id.event, cfg.skim);
            }
            return Ok(EventOutcome::Rejected { stage: SkimStage::AfterLeptons });
        }

        match &event.jets {
            Some(jets) => {
                let ctx = JetContext {
                    config: cfg,
                    jet_id: self.jet_id.as_ref(),
                    jec_uncertainty: self.jec_uncertainty.as_ref(),
                    side_products: JetSideProducts::from_event(
                        event,
                        cfg.use_updated_gen_jets,
                        cfg.debug,
                    ),
                };
                let selection = select_jets(jets, &ctx);
                rec.jets = selection.jets;
                rec.lead_jet_pt = selection.lead_jet_pt;
            }
            None if cfg.debug => log::debug!("no jet collection, storing no jets"),
            None => {}
        }

        let met = leading_met(&event.met, "met")?;
        rec.met = met.pt as f32;
        rec.met_phi = met.phi as f32;
        let puppi_met = leading_met(&event.puppi_met, "puppi_met")?;
        rec.puppi_met = puppi_met.pt as f32;
        rec.puppi_met_phi = puppi_met.phi as f32;

        let (pf_candidates, charged_hadrons) =
            select_pf_candidates(required(&event.pf_candidates, "pf_candidates")?, cfg.pf_candidate_pt_cut);
        rec.pf_candidates = pf_candidates;
        rec.charged_hadrons = charged_hadrons;

        if cfg.is_mc {
            let truth = truth::associate(event, cfg);
            rec.gen_ht = truth.gen_ht;
            rec.gen_met = truth.gen_met;
            rec.gen_met_phi = truth.gen_met_phi;
            rec.gen_leptons = truth.gen_leptons;
            rec.gen_photons = truth.gen_photons;
            rec.weight = truth.weight;
            rec.true_n_vertices = truth.true_n_vertices;
        }

        rec.triggers = TriggerBits::from_results(event.hlt.as_ref());
        if !cfg.is_mc {
            rec.l1_prefire =
                event.l1_final_or_prev_bx.ok_or(Error::MissingCollection("l1_final_or_prev_bx"))?;
        }

        if !cfg.skim.accepts(&rec, SkimStage::Final) {
            if cfg.debug {
                log::debug!("event {} rejected by skim '{}'", event.id.event, cfg.skim);
            }
            return Ok(EventOutcome::Rejected { stage: SkimStage::Final });
        }

        self.histograms.fill(rec.n_vertices, rec.met, rec.puppi_met);
        Ok(EventOutcome::Accepted(Box::new(rec)))
    }
}

#[cfg(test)]
mod tests {
    use jme_core::{EventId, RawElectron, RawMuon, RawVertex};

    use super::*;
    use crate::row::VecSink;
    use crate::skim::SkimPolicy;

    fn minimal_event(event: u64) -> RawEventInput {
        RawEventInput {
            id: EventId { run: 1, event, lumi_block: 1, bunch_crossing: 0 },
            vertices: Some(vec![RawVertex::default(); 3]),
            rho: Some(12.5),
            rho_central_neutral: Some(4.0),
            electrons: Some(Vec::new()),
            muons: Some(Vec::new()),
            photons: Some(Vec::new()),
            met: Some(vec![RawMet { pt: 42.0, phi: 0.3 }]),
            puppi_met: Some(vec![RawMet { pt: 38.0, phi: 0.2 }]),
            pf_candidates: Some(Vec::new()),
            l1_final_or_prev_bx: Some(false),
            ..Default::default()
        }
    }

    #[test]
    fn minimal_event_is_accepted() {
        let mut analyzer = Analyzer::new(AnalyzerConfig::default()).unwrap();
        let outcome = analyzer.analyze(&minimal_event(1)).unwrap();
        let rec = outcome.record().unwrap();
        assert_eq!(rec.n_vertices, 3);
        assert_eq!(rec.rho, 12.5);
        assert_eq!(rec.met, 42.0);
        assert!(rec.jets.is_empty());
        assert_eq!(analyzer.stats().accepted, 1);
        assert_eq!(analyzer.histograms().nvtx.entries, 1.0);
    }

    #[test]
    fn missing_collection_aborts_only_that_event() {
        let mut analyzer = Analyzer::new(AnalyzerConfig::default()).unwrap();
        let mut broken = minimal_event(1);
        broken.puppi_met = Some(Vec::new());
        let err = analyzer.analyze(&broken).unwrap_err();
        assert!(matches!(err, Error::MissingCollection("puppi_met")));
        assert!(analyzer.analyze(&minimal_event(2)).unwrap().is_accepted());
        let stats = analyzer.stats();
        assert_eq!((stats.failed, stats.accepted, stats.seen), (1, 1, 2));
        assert_eq!(analyzer.histograms().met.entries, 1.0);
    }

    #[test]
    fn l1_prefire_required_only_for_data() {
        let mut event = minimal_event(1);
        event.l1_final_or_prev_bx = None;

        let mut data = Analyzer::new(AnalyzerConfig::default()).unwrap();
        assert!(matches!(
            data.analyze(&event),
            Err(Error::MissingCollection("l1_final_or_prev_bx"))
        ));

        let mut mc = Analyzer::new(AnalyzerConfig { is_mc: true, ..Default::default() }).unwrap();
        let outcome = mc.analyze(&event).unwrap();
        assert!(!outcome.record().unwrap().l1_prefire);
    }

    #[test]
    fn pick_list_skips_other_events() {
        let cfg = AnalyzerConfig { pick_events: vec![[1, 7]], ..Default::default() };
        let mut analyzer = Analyzer::new(cfg).unwrap();
        assert_eq!(analyzer.analyze(&minimal_event(6)).unwrap(), EventOutcome::NotPicked);
        assert!(analyzer.analyze(&minimal_event(7)).unwrap().is_accepted());
        assert_eq!(analyzer.stats().not_picked, 1);
        assert_eq!(analyzer.histograms().nvtx.entries, 1.0);
    }

    #[test]
    fn rows_written_only_when_saving() {
        let mut sink = VecSink::default();
        let mut analyzer = Analyzer::new(AnalyzerConfig::default()).unwrap();
        analyzer.analyze_into(&minimal_event(1), &mut sink).unwrap();
        assert_eq!(sink.rows.len(), 1);

        let cfg = AnalyzerConfig { save_tree: false, ..Default::default() };
        let mut quiet = Analyzer::new(cfg).unwrap();
        quiet.analyze_into(&minimal_event(1), &mut sink).unwrap();
        assert_eq!(sink.rows.len(), 1);
        assert_eq!(quiet.stats().accepted, 1);
        assert_eq!(quiet.stats().rows_written, 0);
    }

    #[test]
    fn early_skim_stops_before_jets() {
        let cfg = AnalyzerConfig { skim: SkimPolicy::IsolatedPhoton, ..Default::default() };
        let mut analyzer = Analyzer::new(cfg).unwrap();
        let mut event = minimal_event(1);
        // Would fail as a missing collection if the pipeline reached MET.
        event.met = None;
        assert_eq!(
            analyzer.analyze(&event).unwrap(),
            EventOutcome::Rejected { stage: SkimStage::AfterLeptons }
        );
        assert_eq!(analyzer.histograms().met.entries, 0.0);
    }

    #[test]
    fn leptons_keep_electron_then_muon_order() {
        let mut event = minimal_event(1);
        event.electrons = Some(vec![RawElectron {
            pt: 30.0,
            eta: 0.1,
            phi: 0.0,
            energy: 30.0,
            charge: -1,
            energy_correction: None,
            ids: [
                ("cutBasedElectronID-Fall17-94X-V2-veto".to_string(), true),
                ("cutBasedElectronID-Fall17-94X-V2-tight".to_string(), true),
            ]
            .into_iter()
            .collect(),
        }]);
        event.muons = Some(vec![RawMuon {
            pt: 25.0,
            eta: -0.4,
            phi: 1.0,
            charge: 1,
            selectors: AnalyzerConfig::default().muon_veto_selectors,
            ..Default::default()
        }]);
        let mut analyzer = Analyzer::new(AnalyzerConfig::default()).unwrap();
        let rec = analyzer.analyze(&event).unwrap().record().cloned().unwrap();
        let ids: Vec<i32> = rec.leptons.iter().map(|l| l.pdg_id).collect();
        assert_eq!(ids, vec![11, -13]);
        assert_eq!((rec.n_electrons, rec.n_muons), (1, 1));
    }
}
