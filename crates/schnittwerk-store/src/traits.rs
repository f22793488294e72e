// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The store seam used by both pipelines.

use schnittwerk_core::error::Result;
use schnittwerk_core::types::{CropJob, FieldKey, PageAssignment, ScannedFile, VerificationCounts};

/// Everything the pagination engine and the crop pipeline need from the
/// relational store.
///
/// Methods take `&mut self` so implementations can open transactions on the
/// underlying connection.
pub trait MetadataStore {
    /// All catalogue rows, ordered by path.
    fn load_scanned_files(&mut self) -> Result<Vec<ScannedFile>>;

    /// Write page number, exam code and prefix for every assignment in one
    /// atomic batch. Either every row is written or none is.
    ///
    /// Returns the number of rows updated.
    fn apply_pagination(&mut self, assignments: &[PageAssignment]) -> Result<usize>;

    /// Row counts used to check a pagination run.
    fn verification_counts(&mut self) -> Result<VerificationCounts>;

    /// Crop jobs joined from the listing, the catalogue and the geometry
    /// table. With `only_pending`, fields that already have a crop path are
    /// left out.
    fn load_crop_jobs(&mut self, only_pending: bool) -> Result<Vec<CropJob>>;

    /// Record the output path of one field in its own transaction.
    fn record_crop_path(&mut self, key: &FieldKey, crop_path: &str) -> Result<()>;
}

impl<T: MetadataStore + ?Sized> MetadataStore for &mut T {
    fn load_scanned_files(&mut self) -> Result<Vec<ScannedFile>> {
        (**self).load_scanned_files()
    }

    fn apply_pagination(&mut self, assignments: &[PageAssignment]) -> Result<usize> {
        (**self).apply_pagination(assignments)
    }

    fn verification_counts(&mut self) -> Result<VerificationCounts> {
        (**self).verification_counts()
    }

    fn load_crop_jobs(&mut self, only_pending: bool) -> Result<Vec<CropJob>> {
        (**self).load_crop_jobs(only_pending)
    }

    fn record_crop_path(&mut self, key: &FieldKey, crop_path: &str) -> Result<()> {
        (**self).record_crop_path(key, crop_path)
    }
}
