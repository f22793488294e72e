// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory store and job builders for pipeline tests.

use std::collections::HashMap;

use schnittwerk_core::error::{Result, SchnittwerkError};
use schnittwerk_core::geometry::InchRect;
use schnittwerk_core::types::{
    CropJob, FieldKey, PageAssignment, ScannedFile, VerificationCounts, exam_prefix,
};
use schnittwerk_store::MetadataStore;

/// A crop job with placeholder naming attributes and a 1x0.5in field
/// centered at (1in, 1in).
pub(crate) fn job(barcode: &str, page: i64, field_id: i64, source: &str) -> CropJob {
    CropJob {
        key: FieldKey {
            barcode: barcode.to_owned(),
            page_number: page,
            field_id,
        },
        prefix: Some(exam_prefix(barcode)),
        file_name: format!("{barcode}_{page}_{field_id}.tif"),
        operational_unit: "OP".into(),
        area: "AREA".into(),
        item_code: "ITEM".into(),
        source_path: source.to_owned(),
        scan_id: 1,
        rect: InchRect::new(1.0, 1.0, 1.0, 0.5),
        crop_path: None,
    }
}

/// Store double with switchable failures.
#[derive(Default)]
pub(crate) struct MemoryStore {
    pub files: Vec<ScannedFile>,
    pub paginated: Vec<PageAssignment>,
    pub jobs: Vec<CropJob>,
    pub recorded: HashMap<FieldKey, String>,
    pub fail_pagination: bool,
    /// Fields whose crop-path update fails with an `Update` error.
    pub reject_record: Vec<FieldKey>,
    /// Every crop-path update fails with a `Connection` error.
    pub lose_connection: bool,
}

impl MetadataStore for MemoryStore {
    fn load_scanned_files(&mut self) -> Result<Vec<ScannedFile>> {
        Ok(self.files.clone())
    }

    fn apply_pagination(&mut self, assignments: &[PageAssignment]) -> Result<usize> {
        if self.fail_pagination {
            return Err(SchnittwerkError::Update("injected pagination failure".into()));
        }
        self.paginated = assignments.to_vec();
        Ok(assignments.len())
    }

    fn verification_counts(&mut self) -> Result<VerificationCounts> {
        let count = |f: fn(&PageAssignment) -> bool| {
            self.paginated.iter().filter(|a| f(a)).count() as u64
        };
        Ok(VerificationCounts {
            total: self.files.len() as u64,
            with_page_number: self.paginated.len() as u64,
            with_exam_code: count(|a| a.exam_code.is_some()),
            with_prefix: count(|a| a.prefix.is_some()),
        })
    }

    fn load_crop_jobs(&mut self, only_pending: bool) -> Result<Vec<CropJob>> {
        Ok(self
            .jobs
            .iter()
            .map(|j| {
                let mut j = j.clone();
                if let Some(path) = self.recorded.get(&j.key) {
                    j.crop_path = Some(path.clone());
                }
                j
            })
            .filter(|j| !only_pending || j.crop_path.is_none())
            .collect())
    }

    fn record_crop_path(&mut self, key: &FieldKey, crop_path: &str) -> Result<()> {
        if self.lose_connection {
            return Err(SchnittwerkError::Connection("injected connection loss".into()));
        }
        if self.reject_record.contains(key) {
            return Err(SchnittwerkError::Update(format!("no listing row for {key}")));
        }
        self.recorded.insert(key.clone(), crop_path.to_owned());
        Ok(())
    }
}
