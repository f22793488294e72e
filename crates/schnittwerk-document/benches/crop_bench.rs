// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for field extraction in the schnittwerk-document crate.
// Measures geometry conversion plus crop on a synthetic letter-size page at
// 300 dpi, the common case for exam scans.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, GrayImage, Luma};

use schnittwerk_core::geometry::{BoundsPolicy, Dpi, InchRect};
use schnittwerk_document::PageImage;

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Cut a 2x1in field out of an 8.5x11in grayscale page.
fn bench_extract_field(c: &mut Criterion) {
    let (width, height) = (2550u32, 3300u32);
    let img = GrayImage::from_pixel(width, height, Luma([255u8]));
    let page = PageImage::from_dynamic(DynamicImage::ImageLuma8(img), Dpi::default());
    let rect = InchRect::new(3.0, 1.5, 2.0, 1.0);

    c.bench_function("extract_field (letter @ 300dpi)", |b| {
        b.iter(|| {
            let (crop, _) = page
                .extract(black_box(&rect), BoundsPolicy::Clamp)
                .expect("field fits the page");
            black_box(crop);
        });
    });
}

/// Pure inch-to-pixel conversion.
fn bench_geometry(c: &mut Criterion) {
    let rect = InchRect::new(4.25, 5.5, 1.75, 0.4);
    c.bench_function("inch_rect_to_pixels", |b| {
        b.iter(|| black_box(black_box(&rect).to_pixels(Dpi::new(300, 300))));
    });
}

criterion_group!(benches, bench_extract_field, bench_geometry);
criterion_main!(benches);
