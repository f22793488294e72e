// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Field geometry — inch-based, center-anchored rectangles converted to pixel
// rectangles at a given resolution, plus the bounds policy applied against
// the decoded page.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchnittwerkError};

/// Resolution assumed when an image carries no usable DPI metadata.
pub const DEFAULT_DPI: u32 = 300;

/// Image resolution in dots per inch, independent per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dpi {
    pub x: u32,
    pub y: u32,
}

impl Dpi {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl Default for Dpi {
    fn default() -> Self {
        Self::new(DEFAULT_DPI, DEFAULT_DPI)
    }
}

impl std::fmt::Display for Dpi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{} dpi", self.x, self.y)
    }
}

/// A field rectangle in inches. `x`/`y` locate the CENTER of the rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InchRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl InchRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Reject rectangles with missing (non-finite) coordinates or a
    /// non-positive size.
    pub fn validate(&self) -> Result<()> {
        let values = [self.x, self.y, self.width, self.height];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(SchnittwerkError::InvalidGeometry(format!(
                "missing or non-finite coordinate in {self:?}"
            )));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(SchnittwerkError::InvalidGeometry(format!(
                "non-positive size {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Convert to a top-left anchored pixel rectangle.
    ///
    /// The center-to-corner shift (`x - width / 2`) happens in inches, before
    /// scaling, so it matches the stored upstream convention exactly.
    pub fn to_pixels(&self, dpi: Dpi) -> PixelRect {
        let dx = f64::from(dpi.x);
        let dy = f64::from(dpi.y);
        PixelRect {
            x: ((self.x - self.width / 2.0) * dx).round() as i64,
            y: ((self.y - self.height / 2.0) * dy).round() as i64,
            width: (self.width * dx).round() as i64,
            height: (self.height * dy).round() as i64,
        }
    }
}

/// A pixel rectangle anchored at its top-left corner. May lie partly or
/// entirely outside the image it is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// A pixel rectangle guaranteed to lie inside a specific image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// What to do when a field rectangle extends beyond the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundsPolicy {
    /// Intersect with the image and keep going (logged as a warning).
    #[default]
    Clamp,
    /// Fail the field with `GeometryOutOfBounds`.
    Reject,
}

impl std::str::FromStr for BoundsPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clamp" => Ok(Self::Clamp),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown bounds policy: {other}")),
        }
    }
}

/// Outcome of fitting a rectangle into an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fitted {
    pub crop: CropBox,
    /// True when the rectangle had to be cut down to fit.
    pub truncated: bool,
}

impl PixelRect {
    /// Whether the rectangle lies fully inside a `width` x `height` image.
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.width > 0
            && self.height > 0
            && self.x.saturating_add(self.width) <= i64::from(width)
            && self.y.saturating_add(self.height) <= i64::from(height)
    }

    /// Fit the rectangle into a `width` x `height` image under `policy`.
    ///
    /// An empty intersection is an error under both policies.
    pub fn fit(&self, width: u32, height: u32, policy: BoundsPolicy) -> Result<Fitted> {
        let out_of_bounds = || SchnittwerkError::GeometryOutOfBounds {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            image_width: width,
            image_height: height,
        };

        let inside = self.is_within(width, height);
        if !inside && policy == BoundsPolicy::Reject {
            return Err(out_of_bounds());
        }

        let left = self.x.clamp(0, i64::from(width));
        let top = self.y.clamp(0, i64::from(height));
        let right = self.x.saturating_add(self.width).clamp(0, i64::from(width));
        let bottom = self.y.saturating_add(self.height).clamp(0, i64::from(height));
        if right <= left || bottom <= top {
            return Err(out_of_bounds());
        }

        Ok(Fitted {
            crop: CropBox {
                x: left as u32,
                y: top as u32,
                width: (right - left) as u32,
                height: (bottom - top) as u32,
            },
            truncated: !inside,
        })
    }
}
