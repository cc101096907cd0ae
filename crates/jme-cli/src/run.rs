//! `jme run`: raw events (JSON lines) → flat rows.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jme_analyzer::arrow::ipc::IpcStreamSink;
use jme_analyzer::arrow::parquet::{DEFAULT_BATCH_ROWS, ParquetSink};
use jme_analyzer::{Analyzer, AnalyzerConfig, JsonLinesSink, PickList, RowLayout, RowSink};
use jme_core::RawEventInput;

pub struct RunArgs {
    pub config: AnalyzerConfig,
    pub input: PathBuf,
    pub output: PathBuf,
    pub histograms: Option<PathBuf>,
    pub pick_events: Option<PathBuf>,
    pub max_events: Option<usize>,
    pub fail_fast: bool,
}

pub fn read_config(path: &Path) -> Result<AnalyzerConfig> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
    let cfg: AnalyzerConfig = if ext == "json" {
        serde_json::from_slice(&bytes)?
    } else {
        // Default: YAML (serde_yaml_ng).
        serde_yaml_ng::from_slice(&bytes)?
    };
    Ok(cfg)
}

/// Configuration from `path`, or the defaults.
pub fn load_config(path: Option<&Path>) -> Result<AnalyzerConfig> {
    match path {
        Some(path) => read_config(path),
        None => Ok(AnalyzerConfig::default()),
    }
}

/// The analyzer's debug switch raises the CLI level to at least `debug`.
pub fn log_level(requested: tracing::Level, config: &AnalyzerConfig) -> tracing::Level {
    if config.debug { requested.max(tracing::Level::DEBUG) } else { requested }
}

fn open_sink(path: &Path, layout: RowLayout) -> Result<Box<dyn RowSink>> {
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
    let sink: Box<dyn RowSink> = match ext.as_str() {
        "parquet" => Box::new(ParquetSink::create(path, layout)?),
        "arrows" | "arrow" => {
            let file = File::create(path)?;
            Box::new(IpcStreamSink::new(BufWriter::new(file), layout, DEFAULT_BATCH_ROWS)?)
        }
        _ => Box::new(JsonLinesSink::new(BufWriter::new(File::create(path)?))),
    };
    Ok(sink)
}

fn write_json(path: &Path, value: serde_json::Value) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
    Ok(())
}

pub fn cmd_run(args: &RunArgs) -> Result<()> {
    let config = args.config.clone();
    tracing::info!(
        is_mc = config.is_mc,
        debug = config.debug,
        skim = %config.skim,
        era = %config.jet_id_era,
        "analyzer configured"
    );

    let mut builder = Analyzer::builder(config);
    if let Some(path) = &args.pick_events {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read pick list {}", path.display()))?;
        builder = builder.pick_list(PickList::parse(&text)?);
    }
    let mut analyzer = builder.build()?;

    let mut sink = open_sink(&args.output, analyzer.row_layout())
        .with_context(|| format!("failed to open output {}", args.output.display()))?;

    tracing::info!(path = %args.input.display(), "reading events");
    let reader = BufReader::new(
        File::open(&args.input)
            .with_context(|| format!("failed to open input {}", args.input.display()))?,
    );

    let mut n_read = 0usize;
    for (lineno, line) in reader.lines().enumerate() {
        if args.max_events.is_some_and(|max| n_read >= max) {
            tracing::info!("stopping after {n_read} events (--max-events)");
            break;
        }
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event: RawEventInput = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid event", args.input.display(), lineno + 1))?;
        n_read += 1;

        match analyzer.analyze_into(&event, sink.as_mut()) {
            Ok(_) => {}
            Err(err @ jme_core::Error::MissingCollection(_)) if !args.fail_fast => {
                tracing::debug!(line = lineno + 1, "event skipped: {err}");
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("{}:{}: event processing failed", args.input.display(), lineno + 1)
                });
            }
        }
    }
    sink.finish()?;

    let stats = analyzer.stats();
    tracing::info!(
        seen = stats.seen,
        accepted = stats.accepted,
        rejected = stats.rejected_early + stats.rejected_final,
        failed = stats.failed,
        "run complete"
    );

    if let Some(path) = &args.histograms {
        let histograms: Vec<_> = analyzer.histograms().iter().collect();
        write_json(path, serde_json::json!({ "stats": stats, "histograms": histograms }))?;
    }

    eprintln!(
        "Processed {} events: {} accepted, {} rows → {}",
        stats.seen,
        stats.accepted,
        stats.rows_written,
        args.output.display()
    );
    Ok(())
}

pub fn cmd_config_template() -> Result<()> {
    print!("{}", serde_yaml_ng::to_string(&AnalyzerConfig::default())?);
    Ok(())
}
