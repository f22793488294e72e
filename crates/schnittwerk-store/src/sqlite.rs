// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SQLite-backed metadata store.
//
// One connection per store handle. The pagination bulk update runs in a single
// transaction; every crop path update runs in a transaction of its own. A
// dropped `Transaction` rolls back, so every early return leaves the database
// as it was.

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OpenFlags, params};
use tracing::{debug, info, instrument, warn};

use schnittwerk_core::error::{Result, SchnittwerkError};
use schnittwerk_core::geometry::InchRect;
use schnittwerk_core::types::{
    CropJob, FieldKey, PageAssignment, ScannedFile, VerificationCounts,
};

use crate::schema::{self, EXPECTED_COLUMNS};
use crate::traits::MetadataStore;

fn connection_err(e: rusqlite::Error) -> SchnittwerkError {
    SchnittwerkError::Connection(e.to_string())
}

fn query_err(context: &str) -> impl Fn(rusqlite::Error) -> SchnittwerkError + '_ {
    move |e| SchnittwerkError::Query(format!("{context}: {e}"))
}

fn update_err(context: &str) -> impl Fn(rusqlite::Error) -> SchnittwerkError + '_ {
    move |e| SchnittwerkError::Update(format!("{context}: {e}"))
}

/// Metadata store backed by a SQLite database.
///
/// All methods are synchronous and run to completion before returning.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open an existing database and check that every table the pipelines
    /// query has the expected columns.
    ///
    /// The database is never created here: a missing file is a connection
    /// failure, not an empty catalogue.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(connection_err)?;

        conn.busy_timeout(Duration::from_secs(30))
            .map_err(connection_err)?;

        let store = Self { conn };
        store.validate_schema()?;

        info!("metadata store opened");
        Ok(store)
    }

    /// Open (or create) a database file and create the tables if missing.
    ///
    /// Used to bootstrap a fresh catalogue; production databases are
    /// populated by the capture stage.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(connection_err)?;
        conn.execute_batch(schema::CREATE_TABLES_SQL)
            .map_err(update_err("create tables"))?;
        debug!("metadata store created");
        Ok(Self { conn })
    }

    /// Open an in-memory database with empty tables (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(connection_err)?;
        conn.execute_batch(schema::CREATE_TABLES_SQL)
            .map_err(update_err("create tables"))?;
        debug!("in-memory metadata store opened");
        Ok(Self { conn })
    }

    /// Close the connection, surfacing any error the implicit drop would
    /// swallow.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| connection_err(e))?;
        info!("metadata store closed");
        Ok(())
    }

    /// Compare each table's columns with `EXPECTED_COLUMNS`.
    ///
    /// Column names are matched case-insensitively, as SQLite resolves them.
    fn validate_schema(&self) -> Result<()> {
        for (table, expected) in EXPECTED_COLUMNS {
            let mut stmt = self
                .conn
                .prepare(&format!("PRAGMA table_info({table})"))
                .map_err(query_err("prepare table_info"))?;
            let present = stmt
                .query_map([], |row| row.get::<_, String>(1))
                .map_err(query_err("query table_info"))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(query_err("collect table_info"))?;

            let missing: Vec<String> = expected
                .iter()
                .filter(|col| !present.iter().any(|p| p.eq_ignore_ascii_case(col)))
                .map(|col| (*col).to_owned())
                .collect();

            if !missing.is_empty() {
                warn!(table, ?missing, "schema check failed");
                return Err(SchnittwerkError::SchemaMismatch {
                    table: (*table).to_owned(),
                    missing,
                });
            }
        }
        debug!("schema check passed");
        Ok(())
    }

    #[cfg(any(test, feature = "fixtures"))]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl MetadataStore for SqliteStore {
    #[instrument(skip(self))]
    fn load_scanned_files(&mut self) -> Result<Vec<ScannedFile>> {
        let mut stmt = self
            .conn
            .prepare(schema::SELECT_SCANNED_FILES_SQL)
            .map_err(query_err("prepare scanned files"))?;

        let files = stmt
            .query_map([], |row| {
                Ok(ScannedFile {
                    id: row.get("Id")?,
                    path: row.get("Ruta")?,
                    barcode: row.get("BarcodeC39")?,
                })
            })
            .map_err(query_err("query scanned files"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(query_err("collect scanned files"))?;

        debug!(count = files.len(), "scanned files loaded");
        Ok(files)
    }

    #[instrument(skip(self, assignments), fields(count = assignments.len()))]
    fn apply_pagination(&mut self, assignments: &[PageAssignment]) -> Result<usize> {
        let tx = self
            .conn
            .transaction()
            .map_err(update_err("begin pagination batch"))?;

        let mut updated = 0usize;
        {
            let mut stmt = tx
                .prepare_cached(schema::UPDATE_PAGINATION_SQL)
                .map_err(update_err("prepare pagination update"))?;
            for assignment in assignments {
                updated += stmt
                    .execute(params![
                        assignment.page_number,
                        assignment.exam_code,
                        assignment.prefix,
                        assignment.file_id,
                    ])
                    .map_err(update_err(&format!("update file {}", assignment.file_id)))?;
            }
        }

        tx.commit().map_err(update_err("commit pagination batch"))?;
        info!(updated, "pagination batch committed");
        Ok(updated)
    }

    fn verification_counts(&mut self) -> Result<VerificationCounts> {
        self.conn
            .query_row(schema::VERIFICATION_SQL, [], |row| {
                Ok(VerificationCounts {
                    total: row.get::<_, i64>("total_records")? as u64,
                    with_page_number: row.get::<_, i64>("pages_updated")? as u64,
                    with_exam_code: row.get::<_, i64>("exam_codes_updated")? as u64,
                    with_prefix: row.get::<_, i64>("prefixes_updated")? as u64,
                })
            })
            .map_err(query_err("verification counts"))
    }

    #[instrument(skip(self))]
    fn load_crop_jobs(&mut self, only_pending: bool) -> Result<Vec<CropJob>> {
        let sql = schema::select_crop_jobs_sql(only_pending);
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(query_err("prepare crop jobs"))?;

        let jobs = stmt
            .query_map([], row_to_crop_job)
            .map_err(query_err("query crop jobs"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(query_err("collect crop jobs"))?;

        debug!(count = jobs.len(), "crop jobs loaded");
        Ok(jobs)
    }

    #[instrument(skip(self), fields(key = %key))]
    fn record_crop_path(&mut self, key: &FieldKey, crop_path: &str) -> Result<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(update_err("begin crop path update"))?;

        let rows = tx
            .execute(
                schema::UPDATE_CROP_PATH_SQL,
                params![crop_path, key.barcode, key.page_number, key.field_id],
            )
            .map_err(update_err("update crop path"))?;

        if rows == 0 {
            return Err(SchnittwerkError::Update(format!(
                "no listing row for field {key}"
            )));
        }

        tx.commit().map_err(update_err("commit crop path"))?;
        debug!(rows, "crop path recorded");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Map a crop-job row by column alias (see `SELECT_CROP_JOBS_SQL`).
fn row_to_crop_job(row: &rusqlite::Row<'_>) -> rusqlite::Result<CropJob> {
    let text = |name: &str| -> rusqlite::Result<String> {
        Ok(row.get::<_, Option<String>>(name)?.unwrap_or_default())
    };
    // NULL geometry stays in the job as NaN; extraction rejects that field
    // alone instead of failing the whole selection.
    let coord = |name: &str| -> rusqlite::Result<f64> {
        Ok(row.get::<_, Option<f64>>(name)?.unwrap_or(f64::NAN))
    };

    Ok(CropJob {
        key: FieldKey {
            barcode: row.get("cod_barra")?,
            page_number: row.get("numero_pagina")?,
            field_id: row.get("field_id")?,
        },
        prefix: row.get("prefijo")?,
        file_name: text("nombre_archivo")?,
        operational_unit: text("operativo")?,
        area: text("area")?,
        item_code: text("cod_item")?,
        source_path: text("ruta")?,
        scan_id: row.get("codificacion_id")?,
        rect: InchRect::new(
            coord("cord_x")?,
            coord("cord_y")?,
            coord("cord_width")?,
            coord("cord_height")?,
        ),
        crop_path: row.get("ruta_recorte")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().expect("open in-memory store");
        store
            .insert_scanned_file(1, r"\\SRV\lotes\L01\0001.tif", Some("MAT001"))
            .expect("insert");
        store
            .insert_scanned_file(2, r"\\SRV\lotes\L01\0002.tif", None)
            .expect("insert");
        store
            .insert_scanned_file(3, r"\\SRV\lotes\L01\0003.tif", None)
            .expect("insert");
        store
    }

    fn assignment(file_id: i64, page: u32, code: &str) -> PageAssignment {
        PageAssignment {
            file_id,
            page_number: page,
            exam_code: Some(code.into()),
            prefix: Some(code[..3].into()),
        }
    }

    #[test]
    fn scanned_files_come_back_in_path_order() {
        let mut store = SqliteStore::open_in_memory().expect("open");
        store.insert_scanned_file(7, "b/0002.tif", None).expect("insert");
        store.insert_scanned_file(8, "a/0001.tif", Some("X01")).expect("insert");

        let files = store.load_scanned_files().expect("load");
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].id, 8);
        assert_eq!(files[0].barcode.as_deref(), Some("X01"));
        assert_eq!(files[1].barcode, None);
    }

    #[test]
    fn pagination_batch_updates_every_row() {
        let mut store = seeded_store();
        let updated = store
            .apply_pagination(&[
                assignment(1, 1, "MAT001"),
                assignment(2, 2, "MAT001"),
                assignment(3, 3, "MAT001"),
            ])
            .expect("apply");
        assert_eq!(updated, 3);

        let (page, code, prefix) = store.pagination_of(3).expect("read back");
        assert_eq!(page, Some(3));
        assert_eq!(code.as_deref(), Some("MAT001"));
        assert_eq!(prefix.as_deref(), Some("MAT"));

        let counts = store.verification_counts().expect("counts");
        assert_eq!(
            counts,
            VerificationCounts {
                total: 3,
                with_page_number: 3,
                with_exam_code: 3,
                with_prefix: 3,
            }
        );
    }

    #[test]
    fn failed_pagination_batch_rolls_back() {
        let mut store = seeded_store();
        store
            .connection()
            .execute_batch(
                "CREATE TRIGGER reject_third BEFORE UPDATE ON Codificacion
                 WHEN NEW.Id = 3
                 BEGIN SELECT RAISE(ABORT, 'row locked'); END;",
            )
            .expect("trigger");

        let result = store.apply_pagination(&[
            assignment(1, 1, "MAT001"),
            assignment(2, 2, "MAT001"),
            assignment(3, 3, "MAT001"),
        ]);
        assert!(matches!(result, Err(SchnittwerkError::Update(_))));

        let counts = store.verification_counts().expect("counts");
        assert_eq!(counts.total, 3);
        assert_eq!(counts.with_page_number, 0);
        assert_eq!(counts.with_exam_code, 0);
    }

    #[test]
    fn crop_jobs_join_catalogue_and_geometry() {
        let mut store = seeded_store();
        store
            .apply_pagination(&[assignment(1, 1, "MAT001"), assignment(2, 2, "MAT001")])
            .expect("apply");
        store.insert_field(10, 3.0, 1.5, 2.0, 1.0).expect("field");
        store
            .insert_listing_row("MAT001", 2, 10, "Op 1", "Matemática", "I-01", "0001.tif")
            .expect("listing");

        let jobs = store.load_crop_jobs(true).expect("load");
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.key.barcode, "MAT001");
        assert_eq!(job.key.page_number, 2);
        assert_eq!(job.key.field_id, 10);
        assert_eq!(job.scan_id, 2);
        assert_eq!(job.source_path, r"\\SRV\lotes\L01\0002.tif");
        assert_eq!(job.rect, InchRect::new(3.0, 1.5, 2.0, 1.0));
        assert_eq!(job.area, "Matemática");
        assert!(job.crop_path.is_none());
    }

    #[test]
    fn null_geometry_does_not_fail_the_selection() {
        let mut store = seeded_store();
        store
            .apply_pagination(&[assignment(1, 1, "MAT001"), assignment(2, 2, "MAT001")])
            .expect("apply");
        store.insert_field(10, 1.0, 1.0, 0.5, 0.5).expect("field");
        store.insert_field(11, 1.0, 1.0, 0.5, 0.5).expect("field");
        store
            .set_field_coordinate_null(11, "Cord_width")
            .expect("null width");
        store
            .insert_listing_row("MAT001", 1, 10, "Op", "Area", "I-01", "a.tif")
            .expect("listing");
        store
            .insert_listing_row("MAT001", 2, 11, "Op", "Area", "I-02", "b.tif")
            .expect("listing");

        let jobs = store.load_crop_jobs(true).expect("load");
        assert_eq!(jobs.len(), 2);
        let broken = jobs.iter().find(|j| j.key.field_id == 11).expect("field 11");
        assert!(broken.rect.width.is_nan());
        assert!(broken.rect.validate().is_err());
        let good = jobs.iter().find(|j| j.key.field_id == 10).expect("field 10");
        assert!(good.rect.validate().is_ok());
    }

    #[test]
    fn recorded_fields_drop_out_of_pending_selection() {
        let mut store = seeded_store();
        store
            .apply_pagination(&[assignment(1, 1, "MAT001")])
            .expect("apply");
        store.insert_field(10, 1.0, 1.0, 0.5, 0.5).expect("field");
        store
            .insert_listing_row("MAT001", 1, 10, "Op", "Area", "I-01", "a.tif")
            .expect("listing");

        let key = FieldKey {
            barcode: "MAT001".into(),
            page_number: 1,
            field_id: 10,
        };
        store.record_crop_path(&key, "/out/a.tif").expect("record");

        assert!(store.load_crop_jobs(true).expect("pending").is_empty());
        let all = store.load_crop_jobs(false).expect("all");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].crop_path.as_deref(), Some("/out/a.tif"));
        assert_eq!(store.crop_path_of(&key).expect("read").as_deref(), Some("/out/a.tif"));
    }

    #[test]
    fn recording_unknown_field_is_an_update_error() {
        let mut store = seeded_store();
        let key = FieldKey {
            barcode: "NOPE".into(),
            page_number: 1,
            field_id: 1,
        };
        assert!(matches!(
            store.record_crop_path(&key, "x.tif"),
            Err(SchnittwerkError::Update(_))
        ));
    }

    #[test]
    fn open_rejects_foreign_schema() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("other.db");
        {
            let conn = Connection::open(&path).expect("create");
            conn.execute_batch(
                "CREATE TABLE Codificacion (Id INTEGER PRIMARY KEY, Ruta TEXT);",
            )
            .expect("table");
        }

        match SqliteStore::open(&path) {
            Err(SchnittwerkError::SchemaMismatch { table, missing }) => {
                assert_eq!(table, "Codificacion");
                assert!(missing.contains(&"BarcodeC39".to_owned()));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("schema check should fail"),
        }
    }

    #[test]
    fn open_missing_database_is_a_connection_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = SqliteStore::open(dir.path().join("absent.db"));
        assert!(matches!(result, Err(SchnittwerkError::Connection(_))));
    }

    #[test]
    fn created_database_reopens_cleanly() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalogue.db");
        SqliteStore::create(&path).expect("create").close().expect("close");
        SqliteStore::open(&path).expect("reopen").close().expect("close");
    }
}
