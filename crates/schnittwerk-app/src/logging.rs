// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run logging: console mirror plus one timestamped file per run.

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Local};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// `<pipeline>_<YYYYmmdd_HHMMSS>.log`
pub fn log_file_name(pipeline: &str, started: DateTime<Local>) -> String {
    format!("{pipeline}_{}.log", started.format("%Y%m%d_%H%M%S"))
}

/// Install the global subscriber. The returned guard flushes the file layer
/// on drop and must be held until the run ends.
pub fn init(log_dir: &Path, pipeline: &str) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let file_name = log_file_name(pipeline, Local::now());
    let appender = tracing_appender::rolling::never(log_dir, &file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false)
                .with_ansi(true),
        )
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .try_init()
        .context("installing tracing subscriber")?;

    info!(log = %log_dir.join(&file_name).display(), pipeline, "logging started");
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn file_name_carries_pipeline_and_timestamp() {
        let started = Local
            .with_ymd_and_hms(2026, 3, 9, 7, 5, 30)
            .single()
            .expect("unambiguous local time");
        assert_eq!(log_file_name("crop", started), "crop_20260309_070530.log");
    }
}
