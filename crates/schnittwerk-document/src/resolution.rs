// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Resolution lookup — reads XResolution / YResolution / ResolutionUnit from
// the primary image directory (TIFF IFD0, JPEG APP1, PNG eXIf), then falls
// back to the container's own density (JPEG JFIF APP0, PNG pHYs).

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use exif::{In, Tag, Value};
use schnittwerk_core::error::{Result, SchnittwerkError};
use schnittwerk_core::geometry::Dpi;
use tracing::{debug, warn};

const CENTIMETERS_PER_INCH: f64 = 2.54;
const METERS_PER_INCH: f64 = 0.0254;

/// Read the embedded resolution of an image file.
///
/// EXIF/TIFF tags win; without them the JFIF or pHYs density is used.
/// Returns `Ok(None)` when the file carries no resolution or only an aspect
/// ratio. A missing YResolution copies X.
pub fn read_dpi(path: &Path) -> Result<Option<Dpi>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    if let Some(dpi) = exif_dpi(path, &mut reader)? {
        return Ok(Some(dpi));
    }
    reader.seek(SeekFrom::Start(0))?;
    container_dpi(path, &mut reader)
}

fn exif_dpi(path: &Path, reader: &mut BufReader<File>) -> Result<Option<Dpi>> {
    let exif = match exif::Reader::new().read_from_container(reader) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Ok(None),
        Err(e) => {
            return Err(SchnittwerkError::ImageUnreadable {
                path: path.to_path_buf(),
                reason: format!("resolution metadata: {e}"),
            });
        }
    };

    let Some(x) = rational(&exif, Tag::XResolution) else {
        return Ok(None);
    };
    let y = rational(&exif, Tag::YResolution).unwrap_or(x);

    let unit = exif
        .get_field(Tag::ResolutionUnit, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .unwrap_or(2);
    let scale = match unit {
        2 => 1.0,
        3 => CENTIMETERS_PER_INCH,
        _ => return Ok(None),
    };

    Ok(to_dpi(x * scale, y * scale))
}

/// Density stored by the container format itself.
fn container_dpi(path: &Path, reader: &mut BufReader<File>) -> Result<Option<Dpi>> {
    let mut magic = [0u8; 8];
    let n = reader.read(&mut magic)?;
    reader.seek(SeekFrom::Start(0))?;

    if n >= 2 && magic[..2] == [0xFF, 0xD8] {
        jfif_dpi(reader)
    } else if n == 8 && magic == *b"\x89PNG\r\n\x1a\n" {
        png_dpi(path, reader)
    } else {
        Ok(None)
    }
}

/// Density from a JFIF APP0 segment: units 1 = inch, 2 = centimeter.
fn jfif_dpi(reader: &mut impl Read) -> Result<Option<Dpi>> {
    // SOI, APP0 marker, length, "JFIF\0", version, units, X, Y.
    let mut header = [0u8; 18];
    if reader.read_exact(&mut header).is_err() {
        return Ok(None);
    }
    if header[2..4] != [0xFF, 0xE0] || &header[6..11] != b"JFIF\0" {
        return Ok(None);
    }
    let x = f64::from(u16::from_be_bytes([header[14], header[15]]));
    let y = f64::from(u16::from_be_bytes([header[16], header[17]]));
    Ok(match header[13] {
        1 => to_dpi(x, y),
        2 => to_dpi(x * CENTIMETERS_PER_INCH, y * CENTIMETERS_PER_INCH),
        _ => None,
    })
}

/// Density from a PNG pHYs chunk, stored in pixels per meter.
fn png_dpi(path: &Path, reader: &mut BufReader<File>) -> Result<Option<Dpi>> {
    let decoder = png::Decoder::new(reader);
    let png_reader = decoder
        .read_info()
        .map_err(|e| SchnittwerkError::ImageUnreadable {
            path: path.to_path_buf(),
            reason: format!("png header: {e}"),
        })?;
    Ok(match png_reader.info().pixel_dims {
        Some(png::PixelDimensions {
            xppu,
            yppu,
            unit: png::Unit::Meter,
        }) => to_dpi(
            f64::from(xppu) * METERS_PER_INCH,
            f64::from(yppu) * METERS_PER_INCH,
        ),
        _ => None,
    })
}

/// Resolve the DPI to use for a page, falling back when metadata is absent
/// or unreadable.
pub fn resolve_dpi(path: &Path, fallback: Dpi) -> Dpi {
    match read_dpi(path) {
        Ok(Some(dpi)) => {
            debug!(path = %path.display(), %dpi, "embedded resolution found");
            dpi
        }
        Ok(None) => {
            debug!(path = %path.display(), %fallback, "no embedded resolution, using default");
            fallback
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, %fallback, "failed to read resolution, using default");
            fallback
        }
    }
}

fn rational(exif: &exif::Exif, tag: Tag) -> Option<f64> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Rational(values) => values.first().map(|r| r.to_f64()),
        _ => field.value.get_uint(0).map(f64::from),
    }
}

fn to_dpi(x: f64, y: f64) -> Option<Dpi> {
    let round = |v: f64| {
        let rounded = v.round();
        (rounded.is_finite() && rounded >= 1.0 && rounded <= f64::from(u32::MAX))
            .then_some(rounded as u32)
    };
    Some(Dpi::new(round(x)?, round(y)?))
}
