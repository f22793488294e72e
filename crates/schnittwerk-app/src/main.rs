// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Schnittwerk — scan batch pagination and field cropping.
//
// Entry point. Loads configuration, starts the run log, opens the metadata
// store and dispatches to the selected pipeline. The exit code is non-zero
// only when a run as a whole fails; per-field crop failures are reported in
// the summary.

mod commands;
mod logging;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use schnittwerk_core::AppConfig;
use schnittwerk_pipeline::{CropPipeline, PaginationEngine};
use schnittwerk_store::SqliteStore;
use tracing::{error, info};

use commands::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("schnittwerk: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let _guard = match logging::init(&config.log_dir, cli.command.name()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("schnittwerk: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    info!(version = env!("CARGO_PKG_VERSION"), command = cli.command.name(), "Schnittwerk starting");

    match run(&cli.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "run failed");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    cli.apply(&mut config);
    config.validate().context("validating configuration")?;
    Ok(config)
}

fn run(command: &Commands, config: AppConfig) -> anyhow::Result<()> {
    let store = SqliteStore::open(&config.database_path)
        .with_context(|| format!("opening {}", config.database_path.display()))?;

    match command {
        Commands::Paginate => {
            let mut engine = PaginationEngine::new(store);
            let report = match engine.run() {
                Ok(report) => report,
                Err(err) => {
                    info!(updated = 0, "pagination rolled back");
                    return Err(err).context("pagination failed");
                }
            };
            println!(
                "{} records updated, {} documents (run {})",
                report.updated, report.documents, report.run_id
            );
            engine.into_store().close()?;
        }
        Commands::Crop(_) => {
            let mut pipeline = CropPipeline::new(store, config);
            let summary = pipeline.run().context("crop run aborted")?;
            println!(
                "total {}, processed {}, errors {}, skipped {} (run {})",
                summary.total, summary.processed, summary.errors, summary.skipped, summary.run_id
            );
            pipeline.into_store().close()?;
        }
        Commands::Verify => {
            let mut engine = PaginationEngine::new(store);
            let counts = engine.verify().context("verification query failed")?;
            println!(
                "total {}, with page number {}, with exam code {}, with prefix {}",
                counts.total, counts.with_page_number, counts.with_exam_code, counts.with_prefix
            );
            engine.into_store().close()?;
        }
    }
    Ok(())
}
