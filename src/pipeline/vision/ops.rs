//! Shared pixel operations for the vision stages.
//!
//! Everything works on 8-bit grayscale with a fixed ink threshold: chart
//! regions on rasterized report pages are dark strokes and fills on a
//! light background, so "fraction of ink per row/column" projections are
//! enough signal for the baseline detector, classifier and extractor.

use image::{DynamicImage, GenericImageView, GrayImage, Luma};

/// Pixels with luma below this value count as ink.
pub const INK_THRESHOLD: u8 = 160;

/// Convert to 8-bit grayscale using Rec. 601 luma weights.
/// Direct pixel conversion — avoids an intermediate `DynamicImage`.
pub fn to_gray(image: &DynamicImage) -> GrayImage {
    let (w, h) = image.dimensions();
    let mut gray = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let p = image.get_pixel(x, y);
            let luma =
                (0.299 * p.0[0] as f32 + 0.587 * p.0[1] as f32 + 0.114 * p.0[2] as f32) as u8;
            gray.put_pixel(x, y, Luma([luma]));
        }
    }
    gray
}

/// Copy a sub-rectangle out of an image.
///
/// The rectangle is clamped to the image bounds; a degenerate rectangle
/// yields an empty image.
pub fn crop(image: &DynamicImage, x: u32, y: u32, width: u32, height: u32) -> DynamicImage {
    let (img_w, img_h) = image.dimensions();
    let x = x.min(img_w);
    let y = y.min(img_h);
    let width = width.min(img_w - x);
    let height = height.min(img_h - y);

    let mut out = image::RgbaImage::new(width, height);
    for yy in 0..height {
        for xx in 0..width {
            out.put_pixel(xx, yy, image.get_pixel(x + xx, y + yy));
        }
    }
    DynamicImage::ImageRgba8(out)
}

/// Fraction of ink pixels in each row, top to bottom.
pub fn row_ink_profile(gray: &GrayImage) -> Vec<f32> {
    let (w, h) = gray.dimensions();
    if w == 0 {
        return vec![0.0; h as usize];
    }
    (0..h)
        .map(|y| {
            let ink = (0..w)
                .filter(|&x| gray.get_pixel(x, y).0[0] < INK_THRESHOLD)
                .count();
            ink as f32 / w as f32
        })
        .collect()
}

/// Fraction of ink pixels in each column, left to right.
pub fn column_ink_profile(gray: &GrayImage) -> Vec<f32> {
    let (w, h) = gray.dimensions();
    if h == 0 {
        return vec![0.0; w as usize];
    }
    (0..w)
        .map(|x| {
            let ink = (0..h)
                .filter(|&y| gray.get_pixel(x, y).0[0] < INK_THRESHOLD)
                .count();
            ink as f32 / h as f32
        })
        .collect()
}

/// Fraction of ink pixels over the whole image.
pub fn ink_fraction(gray: &GrayImage) -> f32 {
    let (w, h) = gray.dimensions();
    let total = (w as u64) * (h as u64);
    if total == 0 {
        return 0.0;
    }
    let ink = gray
        .pixels()
        .filter(|p| p.0[0] < INK_THRESHOLD)
        .count();
    ink as f32 / total as f32
}

/// Contiguous index runs where the profile value exceeds `threshold`.
///
/// Returns half-open `(start, end)` ranges at least `min_len` long, in
/// ascending order.
pub fn bands(profile: &[f32], threshold: f32, min_len: usize) -> Vec<(usize, usize)> {
    let mut result = Vec::new();
    let mut start: Option<usize> = None;

    for (i, &value) in profile.iter().enumerate() {
        if value > threshold {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            if i - s >= min_len {
                result.push((s, i));
            }
        }
    }
    if let Some(s) = start {
        if profile.len() - s >= min_len {
            result.push((s, profile.len()));
        }
    }

    result
}
