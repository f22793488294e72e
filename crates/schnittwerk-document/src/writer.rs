// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// TIFF output — uncompressed strips with ResolutionUnit = inch and X/Y
// resolution taken from the source page, an RGB re-encode when the native
// layout cannot be written, and a post-write size check.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use image::DynamicImage;
use schnittwerk_core::error::{Result, SchnittwerkError};
use schnittwerk_core::geometry::Dpi;
use tiff::TiffResult;
use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::{Rational, TiffEncoder, TiffValue};
use tiff::tags::ResolutionUnit;
use tracing::{debug, instrument, warn};

/// Which encoder produced the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMethod {
    /// Native TIFF encoder, resolution tags set.
    Tiff,
    /// Re-encoded as 8-bit RGB after the native layout failed. Resolution
    /// tags are still written.
    Fallback,
}

/// Write `image` to `path` as TIFF carrying `dpi`.
///
/// Grayscale pages stay single-channel; everything else is written as 8-bit
/// RGB. If that fails the image is converted to RGB and encoded again with
/// the same resolution tags. Only when both fail is the write an error.
#[instrument(skip(image), fields(path = %path.display(), %dpi))]
pub fn write_tiff(image: &DynamicImage, dpi: Dpi, path: &Path) -> Result<WriteMethod> {
    let primary = match encode_tiff(image, dpi, path) {
        Ok(()) => {
            debug!("TIFF written");
            return Ok(WriteMethod::Tiff);
        }
        Err(err) => err,
    };

    warn!(error = %primary, "TIFF encoder failed, retrying as RGB");
    encode_rgb(image, dpi, path).map_err(|fallback| SchnittwerkError::WriteFailure {
        path: path.to_path_buf(),
        reason: format!("tiff encoder: {primary}; fallback encoder: {fallback}"),
    })?;

    debug!("TIFF written by fallback encoder");
    Ok(WriteMethod::Fallback)
}

/// Check that a written file exists and is not empty. Returns its size.
pub fn verify_output(path: &Path) -> Result<u64> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(meta.len()),
        _ => Err(SchnittwerkError::OutputVerification {
            path: path.to_path_buf(),
        }),
    }
}

fn encode_tiff(image: &DynamicImage, dpi: Dpi, path: &Path) -> TiffResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    {
        let mut encoder = TiffEncoder::new(&mut writer)?;
        let (width, height) = (image.width(), image.height());
        match image {
            DynamicImage::ImageLuma8(gray) => {
                write_plane::<_, colortype::Gray8>(&mut encoder, width, height, gray.as_raw(), dpi)?
            }
            DynamicImage::ImageLuma16(gray) => {
                write_plane::<_, colortype::Gray16>(&mut encoder, width, height, gray.as_raw(), dpi)?
            }
            other => {
                let rgb = other.to_rgb8();
                write_plane::<_, colortype::RGB8>(&mut encoder, width, height, rgb.as_raw(), dpi)?
            }
        }
    }
    writer.flush()?;
    Ok(())
}

fn encode_rgb(image: &DynamicImage, dpi: Dpi, path: &Path) -> TiffResult<()> {
    let rgb = image.to_rgb8();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    {
        let mut encoder = TiffEncoder::new(&mut writer)?;
        write_plane::<_, colortype::RGB8>(
            &mut encoder,
            rgb.width(),
            rgb.height(),
            rgb.as_raw(),
            dpi,
        )?;
    }
    writer.flush()?;
    Ok(())
}

fn write_plane<W, C>(
    encoder: &mut TiffEncoder<W>,
    width: u32,
    height: u32,
    data: &[C::Inner],
    dpi: Dpi,
) -> TiffResult<()>
where
    W: Write + Seek,
    C: ColorType,
    [C::Inner]: TiffValue,
{
    let mut page = encoder.new_image::<C>(width, height)?;
    page.resolution_unit(ResolutionUnit::Inch);
    page.x_resolution(Rational { n: dpi.x, d: 1 });
    page.y_resolution(Rational { n: dpi.y, d: 1 });
    page.write_data(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn grayscale_page_round_trips_through_decoder() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gray.tif");
        let mut gray = GrayImage::from_pixel(12, 8, Luma([200u8]));
        gray.put_pixel(3, 4, Luma([7u8]));

        let method = write_tiff(&DynamicImage::ImageLuma8(gray), Dpi::default(), &path)
            .expect("write");
        assert_eq!(method, WriteMethod::Tiff);

        let decoded = image::open(&path).expect("decode").to_luma8();
        assert_eq!(decoded.dimensions(), (12, 8));
        assert_eq!(decoded.get_pixel(3, 4), &Luma([7u8]));
    }

    #[test]
    fn color_page_is_written_as_rgb() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("color.tif");
        let rgb = RgbImage::from_pixel(5, 5, Rgb([10, 20, 30]));

        write_tiff(&DynamicImage::ImageRgb8(rgb), Dpi::new(150, 150), &path).expect("write");

        let decoded = image::open(&path).expect("decode").to_rgb8();
        assert_eq!(decoded.get_pixel(2, 2), &Rgb([10, 20, 30]));
        assert!(verify_output(&path).expect("verify") > 0);
    }

    #[test]
    fn fallback_encoding_keeps_resolution_tags() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fallback.tif");
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(6, 4, Luma([90u8])));

        encode_rgb(&gray, Dpi::new(240, 120), &path).expect("encode");

        assert_eq!(
            crate::resolution::read_dpi(&path).expect("read"),
            Some(Dpi::new(240, 120))
        );
        let decoded = image::open(&path).expect("decode").to_rgb8();
        assert_eq!(decoded.get_pixel(5, 3), &Rgb([90, 90, 90]));
    }

    #[test]
    fn unwritable_destination_fails_both_encoders() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing-dir").join("out.tif");
        let img = DynamicImage::ImageLuma8(GrayImage::new(4, 4));

        match write_tiff(&img, Dpi::default(), &path) {
            Err(SchnittwerkError::WriteFailure { reason, .. }) => {
                assert!(reason.contains("fallback encoder"));
            }
            other => panic!("expected WriteFailure, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_fails_verification() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.tif");
        std::fs::write(&path, b"").expect("touch");

        assert!(matches!(
            verify_output(&path),
            Err(SchnittwerkError::OutputVerification { .. })
        ));
        assert!(verify_output(&dir.path().join("absent.tif")).is_err());
    }
}
