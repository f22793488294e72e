// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Seeding and read-back helpers standing in for the capture stage in tests.

use rusqlite::{OptionalExtension, params};

use schnittwerk_core::error::{Result, SchnittwerkError};
use schnittwerk_core::types::{FieldKey, exam_prefix};

use crate::sqlite::SqliteStore;

fn fixture_err(e: rusqlite::Error) -> SchnittwerkError {
    SchnittwerkError::Update(format!("fixture: {e}"))
}

impl SqliteStore {
    /// Insert a catalogue row as the capture stage would (no pagination yet).
    pub fn insert_scanned_file(&self, id: i64, path: &str, barcode: Option<&str>) -> Result<()> {
        self.connection()
            .execute(
                "INSERT INTO Codificacion (Id, Ruta, BarcodeC39) VALUES (?1, ?2, ?3)",
                params![id, path, barcode],
            )
            .map_err(fixture_err)?;
        Ok(())
    }

    pub fn insert_field(&self, id: i64, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        self.connection()
            .execute(
                "INSERT INTO Tbl_Fields (ID, Cord_x, Cord_y, Cord_width, Cord_height)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, x, y, width, height],
            )
            .map_err(fixture_err)?;
        Ok(())
    }

    /// Clear one `Cord_*` column of a field, as a broken capture would.
    pub fn set_field_coordinate_null(&self, id: i64, column: &str) -> Result<()> {
        if !["Cord_x", "Cord_y", "Cord_width", "Cord_height"].contains(&column) {
            return Err(SchnittwerkError::Update(format!("fixture: unknown column {column}")));
        }
        self.connection()
            .execute(
                &format!("UPDATE Tbl_Fields SET {column} = NULL WHERE ID = ?1"),
                params![id],
            )
            .map_err(fixture_err)?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn insert_listing_row(
        &self,
        barcode: &str,
        page_number: i64,
        field_id: i64,
        operational_unit: &str,
        area: &str,
        item_code: &str,
        file_name: &str,
    ) -> Result<()> {
        self.connection()
            .execute(
                "INSERT INTO ListadoMuestraCodificacion
                 (Prefijo, cod_barra, NombreArchivo, NumeroPagina, Field_id, Operativo, Area, cod_item)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    exam_prefix(barcode),
                    barcode,
                    file_name,
                    page_number,
                    field_id,
                    operational_unit,
                    area,
                    item_code,
                ],
            )
            .map_err(fixture_err)?;
        Ok(())
    }

    /// Page number, exam code and prefix currently stored for a file.
    pub fn pagination_of(
        &self,
        file_id: i64,
    ) -> Result<(Option<u32>, Option<String>, Option<String>)> {
        self.connection()
            .query_row(
                "SELECT NumeroPagina, CodigoExamen, Prefijo FROM Codificacion WHERE Id = ?1",
                params![file_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(fixture_err)
    }

    /// Crop path stored for a field, `None` when unset or unknown.
    pub fn crop_path_of(&self, key: &FieldKey) -> Result<Option<String>> {
        let stored: Option<Option<String>> = self
            .connection()
            .query_row(
                "SELECT RutaRecorte FROM ListadoMuestraCodificacion
                 WHERE cod_barra = ?1 AND NumeroPagina = ?2 AND Field_id = ?3",
                params![key.barcode, key.page_number, key.field_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(fixture_err)?;
        Ok(stored.flatten())
    }
}
