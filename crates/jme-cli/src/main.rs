//! JME flattening CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod catalog;
mod run;

#[derive(Parser)]
#[command(name = "jme")]
#[command(about = "JME event flattening - object selection, skimming and flat-row output")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process raw events (JSON lines) into flat rows
    Run {
        /// Analyzer configuration (YAML, or JSON by extension). Defaults apply when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Raw events, one JSON object per line
        #[arg(short, long)]
        input: PathBuf,

        /// Row output: `.parquet`, `.arrows` (Arrow IPC stream), otherwise JSON lines
        #[arg(short, long)]
        output: PathBuf,

        /// Write run statistics and monitoring histograms (pretty JSON)
        #[arg(long)]
        histograms: Option<PathBuf>,

        /// Extra pick list, one `run:event` or `run:lumi:event` per line
        #[arg(long)]
        pick_events: Option<PathBuf>,

        /// Stop after this many input events
        #[arg(long)]
        max_events: Option<usize>,

        /// Abort the job on the first event with a missing required collection
        #[arg(long)]
        fail_fast: bool,
    },

    /// Print the MET-filter and HLT path catalogs
    Catalog {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the default analyzer configuration as YAML
    Config,
}

fn init_tracing(level: tracing::Level) {
    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            input,
            output,
            histograms,
            pick_events,
            max_events,
            fail_fast,
        } => {
            let config = run::load_config(config.as_deref())?;
            init_tracing(run::log_level(cli.log_level, &config));
            run::cmd_run(&run::RunArgs {
                config,
                input,
                output,
                histograms,
                pick_events,
                max_events,
                fail_fast,
            })
        }
        Commands::Catalog { json } => {
            init_tracing(cli.log_level);
            catalog::cmd_catalog(json)
        }
        Commands::Config => {
            init_tracing(cli.log_level);
            run::cmd_config_template()
        }
    }
}
