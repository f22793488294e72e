// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document pagination engine.
//
// The catalogue is a flat stream of page images. Files are grouped by source
// directory and a barcode on a page starts a new document. Page numbers
// restart at 1 at every directory start and at every barcode; the exam code
// carries over from the last barcode seen, including across directories.
// Directory order is lexicographic so that carry-over is deterministic.

use tracing::{debug, info, instrument, warn};

use schnittwerk_core::error::Result;
use schnittwerk_core::types::{
    PageAssignment, RunId, ScannedFile, VerificationCounts, exam_prefix,
};
use schnittwerk_store::MetadataStore;

/// Pagination of a whole catalogue, before it is written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub assignments: Vec<PageAssignment>,
    /// Number of barcode occurrences, i.e. documents started.
    pub documents: usize,
}

/// Fold the catalogue into page assignments.
///
/// Files are ordered by (directory, path, id) and visited once, threading the
/// current page and exam code through the iteration.
pub fn paginate(mut files: Vec<ScannedFile>) -> Pagination {
    files.sort_by(|a, b| {
        a.directory()
            .cmp(b.directory())
            .then_with(|| a.path.cmp(&b.path))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut assignments = Vec::with_capacity(files.len());
    let mut documents = 0usize;
    let mut exam_code: Option<String> = None;
    let mut page = 1u32;
    let mut directory: Option<&str> = None;

    for file in &files {
        if directory != Some(file.directory()) {
            directory = Some(file.directory());
            page = 1;
            info!(directory = file.directory(), "processing directory");
        }

        if let Some(barcode) = file.document_marker() {
            page = 1;
            exam_code = Some(barcode.to_owned());
            documents += 1;
            info!(barcode, "new document found");
        }

        let prefix = exam_code.as_deref().map(exam_prefix);
        debug!(
            file_id = file.id,
            page,
            exam_code = exam_code.as_deref(),
            prefix = prefix.as_deref(),
            "prepared assignment"
        );
        assignments.push(PageAssignment {
            file_id: file.id,
            page_number: page,
            exam_code: exam_code.clone(),
            prefix,
        });
        page += 1;
    }

    Pagination {
        assignments,
        documents,
    }
}

/// What a pagination run wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationReport {
    pub run_id: RunId,
    pub updated: usize,
    pub documents: usize,
    /// Read back after the commit; `None` if the count query failed.
    pub verification: Option<VerificationCounts>,
}

/// Runs the load → assign → persist sequence against a store.
pub struct PaginationEngine<S> {
    store: S,
    run_id: RunId,
}

impl<S: MetadataStore> PaginationEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            run_id: RunId::new(),
        }
    }

    /// Paginate the whole catalogue and persist it atomically.
    ///
    /// Any load or write error aborts the run; the store rolls the batch back
    /// so no row is left half-updated.
    #[instrument(skip(self), fields(run_id = %self.run_id))]
    pub fn run(&mut self) -> Result<PaginationReport> {
        info!("loading scanned files");
        let files = self.store.load_scanned_files()?;
        if files.is_empty() {
            warn!("catalogue is empty, nothing to paginate");
        }

        let Pagination {
            assignments,
            documents,
        } = paginate(files);

        info!(count = assignments.len(), "applying bulk update");
        let updated = self.store.apply_pagination(&assignments)?;

        let verification = match self.store.verification_counts() {
            Ok(counts) => {
                log_verification(&counts);
                Some(counts)
            }
            Err(err) => {
                warn!(error = %err, "verification query failed");
                None
            }
        };

        info!(updated, documents, "pagination finished");
        Ok(PaginationReport {
            run_id: self.run_id,
            updated,
            documents,
            verification,
        })
    }

    /// Read the verification counts without paginating.
    pub fn verify(&mut self) -> Result<VerificationCounts> {
        let counts = self.store.verification_counts()?;
        log_verification(&counts);
        Ok(counts)
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

fn log_verification(counts: &VerificationCounts) {
    info!(
        total = counts.total,
        with_page_number = counts.with_page_number,
        with_exam_code = counts.with_exam_code,
        with_prefix = counts.with_prefix,
        "verification summary"
    );
}
