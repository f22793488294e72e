// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Schnittwerk.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all Schnittwerk operations.
#[derive(Debug, Error)]
pub enum SchnittwerkError {
    // -- Metadata store --
    #[error("metadata store unreachable: {0}")]
    Connection(String),

    #[error("store query failed: {0}")]
    Query(String),

    #[error("store update failed: {0}")]
    Update(String),

    #[error("table {table} is missing expected columns: {}", missing.join(", "))]
    SchemaMismatch { table: String, missing: Vec<String> },

    // -- Image extraction --
    #[error("source image {} is unreadable: {reason}", path.display())]
    ImageUnreadable { path: PathBuf, reason: String },

    #[error(
        "crop rectangle ({x}, {y}, {width}x{height}) lies outside the {image_width}x{image_height} image"
    )]
    GeometryOutOfBounds {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        image_width: u32,
        image_height: u32,
    },

    #[error("field geometry is invalid: {0}")]
    InvalidGeometry(String),

    #[error("failed to write {}: {reason}", path.display())]
    WriteFailure { path: PathBuf, reason: String },

    #[error("output file {} is missing or empty", path.display())]
    OutputVerification { path: PathBuf },

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Plumbing --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// How far an error is allowed to propagate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    /// The whole run stops (store unreachable, schema wrong, bad config).
    Run,
    /// Only the record being processed fails; the batch carries on.
    Record,
}

impl SchnittwerkError {
    /// Classify the error for the crop pipeline's isolation policy.
    ///
    /// Query and update failures are record-scoped here; the pagination engine
    /// treats every error as fatal regardless of scope.
    pub fn scope(&self) -> ErrorScope {
        match self {
            Self::Connection(_) | Self::SchemaMismatch { .. } | Self::Config(_) => ErrorScope::Run,
            Self::Query(_)
            | Self::Update(_)
            | Self::ImageUnreadable { .. }
            | Self::GeometryOutOfBounds { .. }
            | Self::InvalidGeometry(_)
            | Self::WriteFailure { .. }
            | Self::OutputVerification { .. }
            | Self::Io(_)
            | Self::Serialization(_) => ErrorScope::Record,
        }
    }

    /// Render the error together with its chain of sources, one per line.
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            out.push_str("\n  caused by: ");
            out.push_str(&err.to_string());
            source = err.source();
        }
        out
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SchnittwerkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_outages_abort_the_run() {
        assert_eq!(
            SchnittwerkError::Connection("refused".into()).scope(),
            ErrorScope::Run
        );
        let schema = SchnittwerkError::SchemaMismatch {
            table: "Codificacion".into(),
            missing: vec!["Ruta".into()],
        };
        assert_eq!(schema.scope(), ErrorScope::Run);
    }

    #[test]
    fn field_failures_stay_with_the_record() {
        let err = SchnittwerkError::ImageUnreadable {
            path: PathBuf::from("/scans/a.tif"),
            reason: "missing".into(),
        };
        assert_eq!(err.scope(), ErrorScope::Record);
        assert_eq!(
            SchnittwerkError::Update("locked".into()).scope(),
            ErrorScope::Record
        );
    }

    #[test]
    fn schema_mismatch_lists_columns() {
        let err = SchnittwerkError::SchemaMismatch {
            table: "Tbl_Fields".into(),
            missing: vec!["Cord_x".into(), "Cord_y".into()],
        };
        assert_eq!(
            err.to_string(),
            "table Tbl_Fields is missing expected columns: Cord_x, Cord_y"
        );
    }

    #[test]
    fn chain_includes_io_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = SchnittwerkError::from(io);
        assert!(err.chain().starts_with("file I/O error: gone"));
    }
}
