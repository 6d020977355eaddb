//! Baseline chart-region detection via ink projection.
//!
//! Charts on rasterized report pages sit in visually dense blocks separated
//! from body text by whitespace. The detector projects ink onto the
//! vertical axis, takes contiguous dense row bands as candidate blocks,
//! then trims each block horizontally to its inked extent.

use image::DynamicImage;
use tracing::debug;

use super::ops::{bands, column_ink_profile, crop, row_ink_profile, to_gray};
use super::types::{RegionDetector, RegionImage};
use super::VisionError;

/// Minimum fraction of ink for a row to participate in a region band.
/// Body text rows on a full-width page stay under this; plot areas,
/// axes and filled marks exceed it.
const MIN_ROW_INK: f32 = 0.02;

/// Minimum fraction of ink for a column to count toward the trimmed
/// horizontal extent of a band.
const MIN_COLUMN_INK: f32 = 0.02;

/// Minimum height and width (pixels) for a block to be kept as a region.
/// Filters out rules, headers and stray marks.
const MIN_REGION_PX: usize = 40;

/// Whitespace margin (pixels) preserved around each cropped region so
/// axis labels at the block edge are not cut off.
const MARGIN_PX: u32 = 4;

/// Ink-projection region detector.
pub struct InkBandRegionDetector;

impl RegionDetector for InkBandRegionDetector {
    fn detect_regions(
        &self,
        page: &crate::pipeline::raster::PageImage,
    ) -> Result<Vec<RegionImage>, VisionError> {
        let gray = to_gray(&page.image);
        let rows = row_ink_profile(&gray);

        let mut regions = Vec::new();
        for (top, bottom) in bands(&rows, MIN_ROW_INK, MIN_REGION_PX) {
            let band = crop(
                &page.image,
                0,
                top as u32,
                gray.width(),
                (bottom - top) as u32,
            );
            let band_gray = to_gray(&band);
            let cols = column_ink_profile(&band_gray);

            let Some((left, right)) = horizontal_extent(&cols) else {
                continue;
            };
            if right - left < MIN_REGION_PX {
                continue;
            }

            let x = (left as u32).saturating_sub(MARGIN_PX);
            let y = (top as u32).saturating_sub(MARGIN_PX);
            let width = (right - left) as u32 + 2 * MARGIN_PX;
            let height = (bottom - top) as u32 + 2 * MARGIN_PX;

            regions.push(crop(&page.image, x, y, width, height));
        }

        debug!(
            page = page.number,
            regions = regions.len(),
            "Detected candidate chart regions"
        );

        Ok(regions
            .into_iter()
            .enumerate()
            .map(|(index, image)| RegionImage {
                page: page.number,
                index,
                image,
            })
            .collect())
    }
}

/// First and last column indices with meaningful ink, as a half-open range.
fn horizontal_extent(cols: &[f32]) -> Option<(usize, usize)> {
    let left = cols.iter().position(|&c| c > MIN_COLUMN_INK)?;
    let right = cols.iter().rposition(|&c| c > MIN_COLUMN_INK)?;
    Some((left, right + 1))
}

// ── Mock for testing ──────────────────────────────────────

/// Scripted detector returning a fixed number of blank regions per page.
///
/// `per_page[n]` is the region count for page `n + 1`; pages beyond the
/// script yield zero regions. Optionally fails on one page to exercise
/// the failure policies.
pub struct ScriptedRegionDetector {
    per_page: Vec<usize>,
    fail_on_page: Option<usize>,
}

impl ScriptedRegionDetector {
    pub fn new(per_page: Vec<usize>) -> Self {
        Self {
            per_page,
            fail_on_page: None,
        }
    }

    /// Fail with a detection error when asked about `page` (1-indexed).
    pub fn with_failure_on_page(mut self, page: usize) -> Self {
        self.fail_on_page = Some(page);
        self
    }
}

impl RegionDetector for ScriptedRegionDetector {
    fn detect_regions(
        &self,
        page: &crate::pipeline::raster::PageImage,
    ) -> Result<Vec<RegionImage>, VisionError> {
        if self.fail_on_page == Some(page.number) {
            return Err(VisionError::Detection(format!(
                "mock: detector broke on page {}",
                page.number
            )));
        }
        let count = self.per_page.get(page.number - 1).copied().unwrap_or(0);
        Ok((0..count)
            .map(|index| RegionImage {
                page: page.number,
                index,
                image: blank_region(),
            })
            .collect())
    }
}

fn blank_region() -> DynamicImage {
    DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        16,
        16,
        image::Rgb([255, 255, 255]),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::raster::PageImage;
    use image::{GenericImageView, Rgb, RgbImage};

    /// White page with solid dark rectangles at the given (x, y, w, h) spots.
    fn page_with_rects(w: u32, h: u32, rects: &[(u32, u32, u32, u32)]) -> PageImage {
        let mut img = RgbImage::from_pixel(w, h, Rgb([255, 255, 255]));
        for &(rx, ry, rw, rh) in rects {
            for y in ry..(ry + rh).min(h) {
                for x in rx..(rx + rw).min(w) {
                    img.put_pixel(x, y, Rgb([30, 30, 30]));
                }
            }
        }
        PageImage {
            number: 1,
            image: DynamicImage::ImageRgb8(img),
        }
    }

    #[test]
    fn blank_page_yields_no_regions() {
        let page = page_with_rects(300, 400, &[]);
        let regions = InkBandRegionDetector.detect_regions(&page).unwrap();
        assert!(regions.is_empty());
    }

    #[test]
    fn single_block_yields_one_region() {
        let page = page_with_rects(300, 400, &[(50, 100, 150, 120)]);
        let regions = InkBandRegionDetector.detect_regions(&page).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].page, 1);
        assert_eq!(regions[0].index, 0);

        // Crop should roughly match the rectangle plus margins.
        let (w, h) = regions[0].image.dimensions();
        assert!((140..=170).contains(&(w as i32)), "region width {w}");
        assert!((110..=140).contains(&(h as i32)), "region height {h}");
    }

    #[test]
    fn stacked_blocks_are_ordered_top_to_bottom() {
        let page = page_with_rects(300, 600, &[(40, 320, 200, 100), (40, 60, 200, 100)]);
        let regions = InkBandRegionDetector.detect_regions(&page).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].index, 0);
        assert_eq!(regions[1].index, 1);
    }

    #[test]
    fn thin_rule_is_filtered_out() {
        // A 3px horizontal rule must not become a region.
        let page = page_with_rects(300, 400, &[(20, 200, 260, 3)]);
        let regions = InkBandRegionDetector.detect_regions(&page).unwrap();
        assert!(regions.is_empty());
    }

    #[test]
    fn narrow_block_is_filtered_out() {
        let page = page_with_rects(300, 400, &[(150, 100, 10, 200)]);
        let regions = InkBandRegionDetector.detect_regions(&page).unwrap();
        assert!(regions.is_empty());
    }

    // ── Scripted mock ──

    #[test]
    fn scripted_detector_respects_per_page_counts() {
        let detector = ScriptedRegionDetector::new(vec![1, 2]);
        let page1 = page_with_rects(50, 50, &[]);
        let regions = detector.detect_regions(&page1).unwrap();
        assert_eq!(regions.len(), 1);

        let page2 = PageImage {
            number: 2,
            ..page_with_rects(50, 50, &[])
        };
        let regions = detector.detect_regions(&page2).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].index, 0);
        assert_eq!(regions[1].index, 1);
    }

    #[test]
    fn scripted_detector_defaults_to_zero_regions() {
        let detector = ScriptedRegionDetector::new(vec![1]);
        let page3 = PageImage {
            number: 3,
            ..page_with_rects(50, 50, &[])
        };
        assert!(detector.detect_regions(&page3).unwrap().is_empty());
    }

    #[test]
    fn scripted_detector_failure_is_targeted() {
        let detector = ScriptedRegionDetector::new(vec![1, 1]).with_failure_on_page(2);
        let page1 = page_with_rects(50, 50, &[]);
        assert!(detector.detect_regions(&page1).is_ok());

        let page2 = PageImage {
            number: 2,
            ..page_with_rects(50, 50, &[])
        };
        assert!(matches!(
            detector.detect_regions(&page2),
            Err(VisionError::Detection(_))
        ));
    }
}
