//! `jobextract`: dump job-server jobs and the pipeline actions behind them
//! to CSV.

mod logging;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use jobextract::{
    load_config, Config, Database, DatabaseJobStore, ExtractOptions, ExtractionSession,
    JobSummaryWriter, JobsActionsWriter,
};

use logging::LogFormat;

#[derive(Debug, Parser)]
#[command(name = "jobextract", version, about)]
struct Cli {
    /// Run configuration (YAML or JSON).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write one row per job, and one row per resolved action.
    JobsActions {
        /// SQLite job-server database.
        database: PathBuf,
        /// Output CSV for jobs.
        jobs: PathBuf,
        /// Output CSV for actions.
        actions: PathBuf,
    },
    /// Write one row per job, with the action's tool type and version.
    Jobs {
        /// SQLite job-server database.
        database: PathBuf,
        /// Output CSV.
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.log_format)?;

    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    match &cli.command {
        Command::JobsActions {
            database,
            jobs,
            actions,
        } => {
            let mut session = open_session(database, &config)?;
            let mut writer = JobsActionsWriter::create(jobs, actions)?;
            let summary = writer
                .write_all(session.extract())
                .context("Extraction failed")?;
            writer.into_inner()?;

            println!(
                "Wrote {} jobs to {} and {} actions to {}",
                summary.jobs,
                jobs.display(),
                summary.actions,
                actions.display()
            );
        }
        Command::Jobs { database, output } => {
            let mut session = open_session(database, &config)?;
            let mut writer = JobSummaryWriter::create(output)?;
            let written = writer
                .write_all(session.extract_job_summaries())
                .context("Extraction failed")?;
            writer.into_inner()?;

            println!("Wrote {} jobs to {}", written, output.display());
        }
    }

    Ok(())
}

fn open_session(database: &Path, config: &Config) -> Result<ExtractionSession<DatabaseJobStore>> {
    info!(database = %database.display(), "Opening job server database");
    let db = Database::open(database)
        .with_context(|| format!("Failed to open database {}", database.display()))?;
    let store = DatabaseJobStore::new(db, (&config.tables).into(), config.batch_size)?;
    Ok(ExtractionSession::new(
        store,
        ExtractOptions::from_config(config),
    ))
}
