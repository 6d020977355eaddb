//! Baseline chart-type classification from geometric features.
//!
//! Looks at three cheap signals on the grayscale region: vertical column
//! bands reaching well into the region (bars), ink concentrated in an
//! inscribed disc with empty corners (pie), and a sparse stroke spanning
//! most columns (line). Anything else is labelled `unknown` with low
//! confidence, which the orchestrator's gate then drops.

use std::sync::atomic::{AtomicUsize, Ordering};

use image::GrayImage;

use super::ops::{bands, column_ink_profile, ink_fraction, to_gray, INK_THRESHOLD};
use super::types::{labels, ChartClassifier, Classification, RegionImage};
use super::VisionError;

/// Minimum column ink fraction for a column to belong to a bar.
const BAR_COLUMN_INK: f32 = 0.3;

/// Minimum bar width in pixels.
const MIN_BAR_WIDTH: usize = 3;

/// Minimum number of distinct bars to call the region a bar chart.
const MIN_BAR_COUNT: usize = 3;

/// Minimum ink fill of the inscribed disc to call the region a pie chart.
const PIE_DISC_FILL: f32 = 0.5;

/// Maximum ink fraction outside the disc (the corners) for a pie chart.
const PIE_CORNER_INK: f32 = 0.1;

/// Maximum overall ink fraction for a line chart (thin strokes only).
const LINE_MAX_INK: f32 = 0.15;

/// Minimum fraction of columns touched by ink for a line chart.
const LINE_MIN_COVERAGE: f32 = 0.6;

/// Geometric feature classifier.
pub struct GeometricChartClassifier;

impl ChartClassifier for GeometricChartClassifier {
    fn classify(&self, region: &RegionImage) -> Result<Classification, VisionError> {
        let gray = to_gray(&region.image);
        let (w, h) = gray.dimensions();
        if w == 0 || h == 0 {
            return Err(VisionError::Classification("empty region image".into()));
        }

        let ink = ink_fraction(&gray);
        if ink < 0.01 {
            // Effectively blank — nothing to classify.
            return Ok(Classification {
                label: labels::UNKNOWN.into(),
                confidence: 0.2,
            });
        }

        let (disc_fill, corner_ink) = disc_features(&gray);
        let aspect = w as f32 / h as f32;
        if disc_fill > PIE_DISC_FILL
            && corner_ink < PIE_CORNER_INK
            && (0.75..=1.33).contains(&aspect)
        {
            let confidence = (0.55 + 0.35 * disc_fill).min(0.9);
            return Ok(Classification {
                label: labels::PIE.into(),
                confidence,
            });
        }

        let cols = column_ink_profile(&gray);
        let bar_bands = bands(&cols, BAR_COLUMN_INK, MIN_BAR_WIDTH);
        if bar_bands.len() >= MIN_BAR_COUNT {
            let extra = bar_bands.len() - MIN_BAR_COUNT;
            let confidence = (0.6 + 0.05 * extra as f32).min(0.9);
            return Ok(Classification {
                label: labels::BAR.into(),
                confidence,
            });
        }

        let coverage = cols.iter().filter(|&&c| c > 0.0).count() as f32 / cols.len() as f32;
        if ink < LINE_MAX_INK && coverage > LINE_MIN_COVERAGE {
            return Ok(Classification {
                label: labels::LINE.into(),
                confidence: 0.6,
            });
        }

        Ok(Classification {
            label: labels::UNKNOWN.into(),
            confidence: 0.35,
        })
    }
}

/// Ink fill of the inscribed disc and ink fraction of the bbox corners.
///
/// The disc radius is deliberately smaller than the inscribed circle so a
/// pie with a legend strip alongside still reads as disc-shaped.
fn disc_features(gray: &GrayImage) -> (f32, f32) {
    let (w, h) = gray.dimensions();
    let cx = w as f32 / 2.0;
    let cy = h as f32 / 2.0;
    let radius = (w.min(h) as f32 / 2.0) * 0.9;
    let corner_radius = radius * 1.1;

    let mut disc_total = 0u32;
    let mut disc_ink = 0u32;
    let mut corner_total = 0u32;
    let mut corner_ink = 0u32;

    for y in 0..h {
        for x in 0..w {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            let is_ink = gray.get_pixel(x, y).0[0] < INK_THRESHOLD;

            if dist <= radius {
                disc_total += 1;
                if is_ink {
                    disc_ink += 1;
                }
            } else if dist > corner_radius {
                corner_total += 1;
                if is_ink {
                    corner_ink += 1;
                }
            }
        }
    }

    let fill = if disc_total == 0 {
        0.0
    } else {
        disc_ink as f32 / disc_total as f32
    };
    let corners = if corner_total == 0 {
        0.0
    } else {
        corner_ink as f32 / corner_total as f32
    };
    (fill, corners)
}

// ── Mock for testing ──────────────────────────────────────

/// Scripted classifier replaying a fixed verdict sequence across calls.
///
/// Call `n` returns `script[n]` (the last entry repeats past the end).
/// Tracks its invocation count for call-order assertions, and can fail on
/// a chosen call to exercise the failure policies.
pub struct ScriptedClassifier {
    script: Vec<Classification>,
    calls: AtomicUsize,
    fail_on_call: Option<usize>,
}

impl ScriptedClassifier {
    pub fn new(script: Vec<(&str, f32)>) -> Self {
        Self {
            script: script
                .into_iter()
                .map(|(label, confidence)| Classification {
                    label: label.into(),
                    confidence,
                })
                .collect(),
            calls: AtomicUsize::new(0),
            fail_on_call: None,
        }
    }

    /// Fail with a classification error on the `n`-th call (0-indexed).
    pub fn with_failure_on_call(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChartClassifier for ScriptedClassifier {
    fn classify(&self, _region: &RegionImage) -> Result<Classification, VisionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_call == Some(call) {
            return Err(VisionError::Classification(format!(
                "mock: classifier broke on call {call}"
            )));
        }
        let index = call.min(self.script.len().saturating_sub(1));
        self.script
            .get(index)
            .cloned()
            .ok_or_else(|| VisionError::Classification("mock: empty script".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    fn region(img: RgbImage) -> RegionImage {
        RegionImage {
            page: 1,
            index: 0,
            image: DynamicImage::ImageRgb8(img),
        }
    }

    fn white(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([255, 255, 255]))
    }

    #[test]
    fn bar_image_classified_as_bar_chart() {
        // Four bars of varying height standing on the bottom edge.
        let mut img = white(200, 150);
        for (i, bar_h) in [60u32, 100, 80, 120].iter().enumerate() {
            let x0 = 20 + i as u32 * 45;
            for x in x0..x0 + 20 {
                for y in (150 - bar_h)..150 {
                    img.put_pixel(x, y, Rgb([40, 40, 40]));
                }
            }
        }
        let verdict = GeometricChartClassifier.classify(&region(img)).unwrap();
        assert_eq!(verdict.label, "bar_chart");
        assert!(verdict.confidence > 0.5, "got {}", verdict.confidence);
    }

    #[test]
    fn filled_circle_classified_as_pie_chart() {
        let mut img = white(140, 140);
        for y in 0..140 {
            for x in 0..140 {
                let dx = x as f32 - 70.0;
                let dy = y as f32 - 70.0;
                if (dx * dx + dy * dy).sqrt() <= 55.0 {
                    img.put_pixel(x, y, Rgb([50, 50, 50]));
                }
            }
        }
        let verdict = GeometricChartClassifier.classify(&region(img)).unwrap();
        assert_eq!(verdict.label, "pie_chart");
        assert!(verdict.confidence > 0.5, "got {}", verdict.confidence);
    }

    #[test]
    fn thin_stroke_classified_as_line_chart() {
        // A 2px-thick zig-zag spanning the full width.
        let mut img = white(200, 100);
        for x in 0..200u32 {
            let y = 30 + ((x / 25) % 2) * 30;
            img.put_pixel(x, y, Rgb([0, 0, 0]));
            img.put_pixel(x, y + 1, Rgb([0, 0, 0]));
        }
        let verdict = GeometricChartClassifier.classify(&region(img)).unwrap();
        assert_eq!(verdict.label, "line_chart");
        assert!(verdict.confidence > 0.5, "got {}", verdict.confidence);
    }

    #[test]
    fn blank_region_is_low_confidence_unknown() {
        let verdict = GeometricChartClassifier
            .classify(&region(white(100, 100)))
            .unwrap();
        assert_eq!(verdict.label, "unknown");
        assert!(verdict.confidence <= 0.5);
    }

    #[test]
    fn confidence_stays_in_unit_interval() {
        // A degenerate noisy input should still produce a bounded score.
        let mut img = white(120, 120);
        for y in (0..120).step_by(2) {
            for x in (0..120).step_by(2) {
                img.put_pixel(x, y, Rgb([10, 10, 10]));
            }
        }
        let verdict = GeometricChartClassifier.classify(&region(img)).unwrap();
        assert!((0.0..=1.0).contains(&verdict.confidence));
    }

    // ── Scripted mock ──

    #[test]
    fn scripted_classifier_replays_in_order() {
        let classifier = ScriptedClassifier::new(vec![("bar_chart", 0.9), ("pie_chart", 0.3)]);
        let r = region(white(10, 10));
        assert_eq!(classifier.classify(&r).unwrap().label, "bar_chart");
        assert_eq!(classifier.classify(&r).unwrap().label, "pie_chart");
        // Past the end the last verdict repeats.
        assert_eq!(classifier.classify(&r).unwrap().label, "pie_chart");
        assert_eq!(classifier.call_count(), 3);
    }

    #[test]
    fn scripted_classifier_fails_on_requested_call() {
        let classifier =
            ScriptedClassifier::new(vec![("bar_chart", 0.9)]).with_failure_on_call(1);
        let r = region(white(10, 10));
        assert!(classifier.classify(&r).is_ok());
        assert!(classifier.classify(&r).is_err());
        assert!(classifier.classify(&r).is_ok());
    }
}
