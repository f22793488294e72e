// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Table definitions and the column sets each query relies on.
//
// The tables are owned by the capture stage; this crate never migrates them.
// `CREATE_TABLES_SQL` exists to bootstrap empty databases and test fixtures.

/// Catalogue of scanned page images.
pub const CODIFICACION: &str = "Codificacion";
/// Field rectangles, in inches.
pub const TBL_FIELDS: &str = "Tbl_Fields";
/// One row per field to extract per document page.
pub const LISTADO: &str = "ListadoMuestraCodificacion";

/// Columns that must exist for the queries in `sqlite.rs` to work.
pub const EXPECTED_COLUMNS: &[(&str, &[&str])] = &[
    (
        CODIFICACION,
        &[
            "Id",
            "Ruta",
            "BarcodeC39",
            "NumeroPagina",
            "CodigoExamen",
            "Prefijo",
        ],
    ),
    (
        TBL_FIELDS,
        &["ID", "Cord_x", "Cord_y", "Cord_width", "Cord_height"],
    ),
    (
        LISTADO,
        &[
            "Prefijo",
            "cod_barra",
            "NombreArchivo",
            "NumeroPagina",
            "Field_id",
            "Operativo",
            "Area",
            "cod_item",
            "RutaRecorte",
        ],
    ),
];

pub const CREATE_TABLES_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS Codificacion (
        Id            INTEGER PRIMARY KEY,
        Ruta          TEXT    NOT NULL,
        BarcodeC39    TEXT,
        NumeroPagina  INTEGER,
        CodigoExamen  TEXT,
        Prefijo       TEXT
    );

    CREATE TABLE IF NOT EXISTS Tbl_Fields (
        ID            INTEGER PRIMARY KEY,
        Cord_x        REAL,
        Cord_y        REAL,
        Cord_width    REAL,
        Cord_height   REAL
    );

    CREATE TABLE IF NOT EXISTS ListadoMuestraCodificacion (
        Prefijo       TEXT,
        cod_barra     TEXT    NOT NULL,
        NombreArchivo TEXT,
        NumeroPagina  INTEGER NOT NULL,
        Field_id      INTEGER NOT NULL,
        Operativo     TEXT,
        Area          TEXT,
        cod_item      TEXT,
        RutaRecorte   TEXT
    );
"#;

pub(crate) const SELECT_SCANNED_FILES_SQL: &str = r#"
    SELECT Id, Ruta, BarcodeC39
    FROM Codificacion
    ORDER BY Ruta
"#;

pub(crate) const UPDATE_PAGINATION_SQL: &str = r#"
    UPDATE Codificacion
    SET NumeroPagina = ?1,
        CodigoExamen = ?2,
        Prefijo = ?3
    WHERE Id = ?4
"#;

pub(crate) const VERIFICATION_SQL: &str = r#"
    SELECT
        COUNT(*)            AS total_records,
        COUNT(NumeroPagina) AS pages_updated,
        COUNT(CodigoExamen) AS exam_codes_updated,
        COUNT(Prefijo)      AS prefixes_updated
    FROM Codificacion
"#;

const SELECT_CROP_JOBS_SQL: &str = r#"
    SELECT DISTINCT
        l.Prefijo                     AS prefijo,
        l.cod_barra                   AS cod_barra,
        l.NombreArchivo               AS nombre_archivo,
        l.NumeroPagina                AS numero_pagina,
        l.Field_id                    AS field_id,
        l.Operativo                   AS operativo,
        l.Area                        AS area,
        l.cod_item                    AS cod_item,
        l.RutaRecorte                 AS ruta_recorte,
        c.Ruta                        AS ruta,
        CAST(f.Cord_x AS REAL)        AS cord_x,
        CAST(f.Cord_y AS REAL)        AS cord_y,
        CAST(f.Cord_width AS REAL)    AS cord_width,
        CAST(f.Cord_height AS REAL)   AS cord_height,
        c.Id                          AS codificacion_id
    FROM ListadoMuestraCodificacion l
    INNER JOIN Codificacion c
        ON (c.CodigoExamen = l.cod_barra AND c.NumeroPagina = l.NumeroPagina)
    INNER JOIN Tbl_Fields f ON f.ID = l.Field_id
"#;

/// Build the crop-job selection, optionally restricted to unset crop paths.
pub(crate) fn select_crop_jobs_sql(only_pending: bool) -> String {
    let filter = if only_pending {
        "WHERE l.RutaRecorte IS NULL"
    } else {
        ""
    };
    format!("{SELECT_CROP_JOBS_SQL} {filter} ORDER BY c.Id, l.cod_barra")
}

pub(crate) const UPDATE_CROP_PATH_SQL: &str = r#"
    UPDATE ListadoMuestraCodificacion
    SET RutaRecorte = ?1
    WHERE cod_barra = ?2
      AND NumeroPagina = ?3
      AND Field_id = ?4
"#;
