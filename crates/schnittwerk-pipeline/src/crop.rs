// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Crop extraction pipeline.
//
// For each selected field: open the page, resolve its DPI, convert the inch
// rectangle to pixels, crop, write a TIFF, verify it and record its path.
// Record-scoped failures are quarantined and counted; the batch goes on.
// Run-scoped failures (lost connection, broken schema) end the run.

use std::path::{Path, PathBuf};

use schnittwerk_core::config::AppConfig;
use schnittwerk_core::error::{ErrorScope, Result, SchnittwerkError};
use schnittwerk_core::types::{CropJob, CropOutcome, CropSummary, RunId};
use schnittwerk_document::{PageImage, verify_output, write_tiff};
use schnittwerk_store::MetadataStore;
use tracing::{debug, error, info, instrument, warn};

use crate::destination::Destinations;
use crate::quarantine::Quarantine;

pub struct CropPipeline<S> {
    store: S,
    config: AppConfig,
    destinations: Destinations,
    quarantine: Quarantine,
    run_id: RunId,
}

impl<S: MetadataStore> CropPipeline<S> {
    pub fn new(store: S, config: AppConfig) -> Self {
        let destinations = Destinations::new(
            &config.output_dir,
            config.output_layout,
            config.path_style,
        );
        let quarantine = Quarantine::new(config.quarantine_dir());
        Self {
            store,
            config,
            destinations,
            quarantine,
            run_id: RunId::new(),
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Create the output root and the quarantine directory.
    pub fn prepare_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config.output_dir).map_err(|e| {
            SchnittwerkError::WriteFailure {
                path: self.config.output_dir.clone(),
                reason: format!("cannot create output directory: {e}"),
            }
        })?;
        self.quarantine.prepare()?;
        debug!(
            output = %self.config.output_dir.display(),
            quarantine = %self.quarantine.dir().display(),
            "directories ready"
        );
        Ok(())
    }

    /// Process every selected field in order and return the tally.
    #[instrument(skip(self), fields(run_id = %self.run_id))]
    pub fn run(&mut self) -> Result<CropSummary> {
        self.config.validate()?;
        self.prepare_directories()?;

        let jobs = self.store.load_crop_jobs(self.config.only_pending)?;
        let mut summary = CropSummary::new(self.run_id, jobs.len());
        info!(
            total = jobs.len(),
            only_pending = self.config.only_pending,
            layout = ?self.destinations.layout(),
            policy = ?self.config.bounds_policy,
            "crop jobs loaded"
        );

        for (index, job) in jobs.iter().enumerate() {
            debug!(record = index + 1, total = jobs.len(), field = %job.key, "processing field");
            match self.process(job) {
                Ok(outcome) => summary.tally(&outcome),
                Err(e) => {
                    error!(error = %e.chain(), field = %job.key, "run aborted");
                    log_summary(&summary);
                    return Err(e);
                }
            }
            if (index + 1) % self.config.progress_interval == 0 {
                let attempted = summary.attempted();
                let pct = attempted * 100 / summary.total.max(1);
                info!(
                    processed = summary.processed,
                    errors = summary.errors,
                    "progress: {attempted}/{} ({pct}%)",
                    summary.total
                );
            }
        }

        log_summary(&summary);
        Ok(summary)
    }

    /// Run one field through the pipeline.
    ///
    /// Returns `Err` only for run-scoped failures; anything that concerns
    /// this field alone becomes `CropOutcome::Failed` after quarantine.
    #[instrument(skip(self, job), fields(field = %job.key))]
    pub fn process(&mut self, job: &CropJob) -> Result<CropOutcome> {
        if let Some(reason) = self.skip_reason(job) {
            debug!(%reason, "skipping field");
            return Ok(CropOutcome::Skipped { reason });
        }

        match self.extract_and_record(job) {
            Ok(path) => Ok(CropOutcome::Written { path }),
            Err(e) if e.scope() == ErrorScope::Run => Err(e),
            Err(e) => {
                error!(error = %e.chain(), source = %job.source_path, "field extraction failed");
                let quarantine = match self.quarantine.quarantine(job, &e) {
                    Ok(record) => Some(record.image.unwrap_or(record.note)),
                    Err(qe) => {
                        warn!(error = %qe, "quarantine failed");
                        None
                    }
                };
                Ok(CropOutcome::Failed {
                    error: e.to_string(),
                    quarantine,
                })
            }
        }
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Existing output is kept when every field was selected and
    /// reprocessing is off.
    fn skip_reason(&self, job: &CropJob) -> Option<String> {
        if self.config.only_pending || self.config.reprocess_existing {
            return None;
        }
        let existing = job.crop_path.as_deref()?;
        match std::fs::metadata(existing) {
            Ok(meta) if meta.is_file() && meta.len() > 0 => {
                Some(format!("crop already exists at {existing}"))
            }
            _ => None,
        }
    }

    fn extract_and_record(&mut self, job: &CropJob) -> Result<PathBuf> {
        let page = PageImage::open(Path::new(&job.source_path), self.config.default_dpi)?;
        let (crop, fitted) = page.extract(&job.rect, self.config.bounds_policy)?;
        debug!(
            width = fitted.crop.width,
            height = fitted.crop.height,
            truncated = fitted.truncated,
            "field cropped"
        );

        let destination = self.destinations.prepare(job)?;
        let method = write_tiff(&crop, page.dpi(), &destination)?;
        let bytes = verify_output(&destination)?;

        let recorded = destination.to_string_lossy();
        self.store.record_crop_path(&job.key, &recorded)?;
        info!(path = %recorded, bytes, ?method, "crop written");
        Ok(destination)
    }
}

fn log_summary(summary: &CropSummary) {
    info!(
        run_id = %summary.run_id,
        total = summary.total,
        processed = summary.processed,
        errors = summary.errors,
        skipped = summary.skipped,
        "crop run summary"
    );
}
