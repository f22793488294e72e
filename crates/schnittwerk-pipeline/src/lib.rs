// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// schnittwerk-pipeline — The two batch pipelines.
//
// `PaginationEngine` folds the scan catalogue into page numbers, exam codes
// and prefixes and writes them back in one atomic batch. `CropPipeline` turns
// every pending field into a TIFF cut from its page, recording each result on
// its own and quarantining failures without stopping the batch.

pub mod crop;
pub mod destination;
pub mod integrity;
pub mod pagination;
pub mod quarantine;

#[cfg(test)]
mod testing;

pub use crop::CropPipeline;
pub use destination::Destinations;
pub use pagination::{PaginationEngine, PaginationReport, paginate};
pub use quarantine::Quarantine;
