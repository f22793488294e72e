// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// schnittwerk-document — Page image handling for the crop pipeline.
//
// Opens full-page scans, resolves their embedded resolution, cuts pixel
// rectangles out of them, and writes the result as uncompressed TIFF with
// resolution tags (falling back to the `image` crate's encoder if needed).

pub mod page;
pub mod resolution;
pub mod writer;

pub use page::PageImage;
pub use resolution::{read_dpi, resolve_dpi};
pub use writer::{WriteMethod, verify_output, write_tiff};
