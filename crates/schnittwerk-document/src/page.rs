// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page images — a decoded full-page scan together with the resolution used to
// map inch geometry onto it.

use std::fs::File;
use std::path::Path;

use image::{DynamicImage, ImageReader};
use schnittwerk_core::error::{Result, SchnittwerkError};
use schnittwerk_core::geometry::{BoundsPolicy, Dpi, Fitted, InchRect};
use tracing::{debug, info, instrument, warn};

use crate::resolution::resolve_dpi;

/// A decoded page image and its resolution.
///
/// The pixel buffer is owned; it is released when the `PageImage` is dropped,
/// on every exit path of the caller.
pub struct PageImage {
    image: DynamicImage,
    dpi: Dpi,
}

impl PageImage {
    // -- Construction ---------------------------------------------------------

    /// Validate, resolve DPI for, and decode the image at `path`.
    ///
    /// The file must exist and be readable; `fallback_dpi` applies when the
    /// file has no usable resolution metadata.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, fallback_dpi: Dpi) -> Result<Self> {
        let path = path.as_ref();
        let unreadable = |reason: String| SchnittwerkError::ImageUnreadable {
            path: path.to_path_buf(),
            reason,
        };

        let meta = std::fs::metadata(path).map_err(|e| unreadable(format!("does not exist: {e}")))?;
        if !meta.is_file() {
            return Err(unreadable("not a regular file".into()));
        }
        File::open(path).map_err(|e| unreadable(format!("not readable: {e}")))?;

        let dpi = resolve_dpi(path, fallback_dpi);

        let image = ImageReader::open(path)
            .map_err(|e| unreadable(format!("open failed: {e}")))?
            .with_guessed_format()
            .map_err(|e| unreadable(format!("format detection failed: {e}")))?
            .decode()
            .map_err(|e| unreadable(format!("decode failed: {e}")))?;

        info!(
            width = image.width(),
            height = image.height(),
            %dpi,
            "page image loaded"
        );
        Ok(Self { image, dpi })
    }

    /// Wrap an already-decoded image.
    pub fn from_dynamic(image: DynamicImage, dpi: Dpi) -> Self {
        Self { image, dpi }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dpi(&self) -> Dpi {
        self.dpi
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    // -- Extraction -----------------------------------------------------------

    /// Cut the field `rect` (inches, center-anchored) out of the page.
    ///
    /// The rectangle is converted at the page's DPI, then fitted to the image
    /// under `policy`. Truncation under `BoundsPolicy::Clamp` is logged.
    /// A rectangle with missing coordinates is `InvalidGeometry`.
    #[instrument(skip(self), fields(dpi = %self.dpi))]
    pub fn extract(&self, rect: &InchRect, policy: BoundsPolicy) -> Result<(DynamicImage, Fitted)> {
        rect.validate()?;
        let pixels = rect.to_pixels(self.dpi);
        let fitted = pixels.fit(self.width(), self.height(), policy)?;
        if fitted.truncated {
            warn!(
                x = pixels.x,
                y = pixels.y,
                width = pixels.width,
                height = pixels.height,
                image_width = self.width(),
                image_height = self.height(),
                "field rectangle exceeds the page, clamping"
            );
        }

        let crop = fitted.crop;
        debug!(
            x = crop.x,
            y = crop.y,
            width = crop.width,
            height = crop.height,
            "cropping field"
        );
        Ok((
            self.image.crop_imm(crop.x, crop.y, crop.width, crop.height),
            fitted,
        ))
    }
}
