// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quarantine of source images whose field could not be extracted.
//
// Each failure leaves a copy of the original page (when it can be read) and a
// text note next to it. Names carry a timestamp and the field key so that
// several failures on one page never overwrite each other.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::Local;
use schnittwerk_core::error::{Result, SchnittwerkError};
use schnittwerk_core::types::CropJob;
use tracing::{info, instrument, warn};

use crate::integrity;

/// Files left behind for one failed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarantineRecord {
    /// Copy of the source image; `None` if the source could not be copied.
    pub image: Option<PathBuf>,
    pub note: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Quarantine {
    dir: PathBuf,
}

impl Quarantine {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn prepare(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Copy the source image of `job` and write an error note for it.
    ///
    /// A missing or unreadable source only drops the image copy; the note is
    /// always attempted and its failure is the only error returned.
    #[instrument(skip(self, job, error), fields(field = %job.key))]
    pub fn quarantine(&self, job: &CropJob, error: &SchnittwerkError) -> Result<QuarantineRecord> {
        std::fs::create_dir_all(&self.dir)?;

        let now = Local::now();
        let name = format!(
            "error_{}_{}_{}_{}_{}",
            now.format("%Y%m%d_%H%M%S"),
            sanitize(&job.key.barcode),
            job.key.page_number,
            job.key.field_id,
            basename(&job.source_path),
        );

        let source = Path::new(&job.source_path);
        let (image, source_digest) = self.copy_source(source, &name);

        let mut note = String::new();
        let _ = writeln!(note, "timestamp: {}", now.to_rfc3339());
        let _ = writeln!(note, "source: {}", job.source_path);
        let _ = writeln!(
            note,
            "field: barcode={} page={} field_id={}",
            job.key.barcode, job.key.page_number, job.key.field_id
        );
        let _ = writeln!(note, "error: {}", error.chain());
        let _ = writeln!(
            note,
            "source_sha256: {}",
            source_digest.as_deref().unwrap_or("unavailable")
        );

        let note_path = self.dir.join(format!("{name}.txt"));
        std::fs::write(&note_path, note).map_err(|e| SchnittwerkError::WriteFailure {
            path: note_path.clone(),
            reason: format!("cannot write quarantine note: {e}"),
        })?;

        info!(note = %note_path.display(), copied = image.is_some(), "field quarantined");
        Ok(QuarantineRecord {
            image,
            note: note_path,
        })
    }

    /// Copy `source` into the quarantine directory and check the copy.
    ///
    /// Returns the copy location and the source digest, each when available.
    fn copy_source(&self, source: &Path, name: &str) -> (Option<PathBuf>, Option<String>) {
        if !source.is_file() {
            warn!(source = %source.display(), "source image missing, quarantining note only");
            return (None, None);
        }

        let target = self.dir.join(name);
        if let Err(e) = std::fs::copy(source, &target) {
            warn!(source = %source.display(), error = %e, "cannot copy source image");
            return (None, integrity::hash_file(source).ok());
        }

        match integrity::verify_copy(source, &target) {
            Ok(digest) => (Some(target), Some(digest)),
            Err(e) => {
                warn!(error = %e, "quarantined copy does not match source");
                (Some(target), integrity::hash_file(source).ok())
            }
        }
    }
}

/// Last component of a path written with either separator.
fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn sanitize(component: &str) -> String {
    component
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | ' ' => '_',
            other => other,
        })
        .collect()
}
