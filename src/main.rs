use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use achilles_decoder::batch::{self, DecodeArgs, TableOneArgs};
use achilles_decoder::config::AppConfig;
use achilles_decoder::error::EtlError;

#[derive(Parser)]
#[command(
    name = "achilles_decoder",
    version,
    about = "Decode Achilles results against the OMOP vocabulary"
)]
struct Cli {
    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a results export and write the cleaned snapshot
    Decode {
        /// Results-table CSV export
        #[arg(long)]
        results: PathBuf,

        /// Concept-table CSV export
        #[arg(long)]
        concepts: PathBuf,

        /// TOML config file; defaults apply when absent
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory holding achilles_analysis_details.csv (overrides config)
        #[arg(long)]
        schema_dir: Option<PathBuf>,

        /// Directory the snapshot is written into (overrides config)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Overwrite an existing snapshot
        #[arg(long)]
        force: bool,
    },

    /// Reshape a decoded snapshot into the demographic summary table
    Table1 {
        /// Decoded snapshot (feather file)
        #[arg(long)]
        snapshot: PathBuf,

        /// CSV destination; stdout when absent
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli.command) {
        if let Some(hint) = err.recovery_hint() {
            eprintln!("hint: {hint}");
        }
        return Err(err.into());
    }
    Ok(())
}

fn run(command: Command) -> Result<(), EtlError> {
    match command {
        Command::Decode {
            results,
            concepts,
            config,
            schema_dir,
            out_dir,
            force,
        } => {
            let config = match config {
                Some(path) => AppConfig::load_from_file(path)?,
                None => AppConfig::default(),
            };
            config.validate()?;

            batch::run_decode(DecodeArgs {
                results_path: results,
                concepts_path: concepts,
                schema_dir: schema_dir.unwrap_or_else(|| config.paths.schema_dir.clone()),
                out_dir: out_dir.unwrap_or_else(|| config.paths.out_dir.clone()),
                force,
                source: config.connection.redacted_url().ok(),
            })
        }
        Command::Table1 { snapshot, output } => batch::run_table_one(TableOneArgs {
            snapshot_path: snapshot,
            output,
        }),
    }
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
