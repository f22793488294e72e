// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for scan batch pagination and field cropping.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::InchRect;

/// Unique identifier for one pipeline run, stamped on logs and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// One physical page image as captured by the scanning stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedFile {
    pub id: i64,
    /// Full path of the page image, usually a Windows or UNC path.
    pub path: String,
    /// Code 39 barcode read from the page, if any. Marks a document start.
    pub barcode: Option<String>,
}

impl ScannedFile {
    pub fn new(id: i64, path: impl Into<String>, barcode: Option<&str>) -> Self {
        Self {
            id,
            path: path.into(),
            barcode: barcode.map(str::to_owned),
        }
    }

    /// The barcode value when it marks a new document.
    ///
    /// Empty strings are treated as "no barcode".
    pub fn document_marker(&self) -> Option<&str> {
        self.barcode.as_deref().filter(|code| !code.is_empty())
    }

    /// Directory component of the path, splitting on either `/` or `\`.
    pub fn directory(&self) -> &str {
        match self.path.rfind(['/', '\\']) {
            Some(idx) => &self.path[..idx],
            None => "",
        }
    }
}

/// Derived pagination for one scanned file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageAssignment {
    pub file_id: i64,
    /// 1-based page index, reset at every directory start and barcode.
    pub page_number: u32,
    pub exam_code: Option<String>,
    pub prefix: Option<String>,
}

/// First three characters of an exam code, used for routing.
pub fn exam_prefix(exam_code: &str) -> String {
    exam_code.chars().take(3).collect()
}

/// Population counts read back from the store after a pagination run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCounts {
    pub total: u64,
    pub with_page_number: u64,
    pub with_exam_code: u64,
    pub with_prefix: u64,
}

// ---------------------------------------------------------------------------
// Cropping
// ---------------------------------------------------------------------------

/// Identifies a crop field: exactly one output file per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldKey {
    pub barcode: String,
    pub page_number: i64,
    pub field_id: i64,
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/p{}/f{}",
            self.barcode, self.page_number, self.field_id
        )
    }
}

/// A rectangle to extract from one page, joined from the sample listing,
/// the page catalogue and the field geometry table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropJob {
    pub key: FieldKey,
    pub prefix: Option<String>,
    /// Output file name (`NombreArchivo`).
    pub file_name: String,
    /// Operational unit (`Operativo`).
    pub operational_unit: String,
    pub area: String,
    /// Item code (`cod_item`).
    pub item_code: String,
    /// Full-page scan the field is cut from.
    pub source_path: String,
    /// Id of the page row in the catalogue.
    pub scan_id: i64,
    pub rect: InchRect,
    /// Path of an already written crop, if any.
    pub crop_path: Option<String>,
}

/// Result of one extraction attempt. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum CropOutcome {
    /// Crop written, verified and recorded.
    Written { path: PathBuf },
    /// Nothing to do for this job.
    Skipped { reason: String },
    /// Extraction failed; the source image was quarantined when possible.
    Failed {
        error: String,
        quarantine: Option<PathBuf>,
    },
}

/// Final tally of a crop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropSummary {
    pub run_id: RunId,
    pub total: usize,
    pub processed: usize,
    pub errors: usize,
    pub skipped: usize,
}

impl CropSummary {
    pub fn new(run_id: RunId, total: usize) -> Self {
        Self {
            run_id,
            total,
            processed: 0,
            errors: 0,
            skipped: 0,
        }
    }

    /// Records looked at so far, whatever their outcome.
    pub fn attempted(&self) -> usize {
        self.processed + self.errors + self.skipped
    }

    pub fn tally(&mut self, outcome: &CropOutcome) {
        match outcome {
            CropOutcome::Written { .. } => self.processed += 1,
            CropOutcome::Skipped { .. } => self.skipped += 1,
            CropOutcome::Failed { .. } => self.errors += 1,
        }
    }
}

/// How crop output files are laid out under the output root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputLayout {
    /// `output/operativo/area/cod_item/filename`
    #[default]
    Hierarchical,
    /// `output/filename`
    Flat,
}

impl std::str::FromStr for OutputLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hierarchical" => Ok(Self::Hierarchical),
            "flat" => Ok(Self::Flat),
            other => Err(format!("unknown output layout: {other}")),
        }
    }
}
