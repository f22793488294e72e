// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// schnittwerk-store — Access to the scan catalogue (`Codificacion`), the field
// geometry table (`Tbl_Fields`) and the sample listing
// (`ListadoMuestraCodificacion`).
//
// The pipelines only see the `MetadataStore` trait; `SqliteStore` is the
// rusqlite-backed implementation.

pub mod schema;
pub mod sqlite;
pub mod traits;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use sqlite::SqliteStore;
pub use traits::MetadataStore;
