//! Baseline chart data extraction via ink projection.
//!
//! Produces a structured JSON value whose shape depends on the chart-type
//! label: bar charts yield a category→value series, pie charts a
//! slice→proportion mapping, line charts a sampled point list. The
//! orchestrator never inspects these values — they flow through to the
//! insight generator and the caller unchanged.

use std::sync::atomic::{AtomicUsize, Ordering};

use image::GrayImage;
use serde_json::{json, Map, Value};

use super::ops::{bands, column_ink_profile, ink_fraction, to_gray, INK_THRESHOLD};
use super::types::{labels, DataExtractor, RegionImage};
use super::VisionError;

/// Column ink fraction marking a bar (mirrors the classifier's notion).
const BAR_COLUMN_INK: f32 = 0.3;

/// Minimum bar width in pixels.
const MIN_BAR_WIDTH: usize = 3;

/// Number of horizontal sample buckets for line charts.
const LINE_SAMPLES: u32 = 16;

/// Projection-based data extractor.
pub struct ProjectionDataExtractor;

impl DataExtractor for ProjectionDataExtractor {
    fn extract(&self, region: &RegionImage, label: &str) -> Result<Value, VisionError> {
        let gray = to_gray(&region.image);
        let (w, h) = gray.dimensions();
        if w == 0 || h == 0 {
            return Err(VisionError::Extraction("empty region image".into()));
        }

        let data = match label {
            labels::BAR => extract_bars(&gray),
            labels::PIE => extract_slices(&gray),
            labels::LINE => extract_points(&gray),
            _ => json!({ "ink_fraction": ink_fraction(&gray) }),
        };
        Ok(data)
    }
}

/// Bar chart: one entry per detected bar, value = relative bar height.
fn extract_bars(gray: &GrayImage) -> Value {
    let cols = column_ink_profile(gray);
    let mut series = Map::new();
    for (i, (start, end)) in bands(&cols, BAR_COLUMN_INK, MIN_BAR_WIDTH).iter().enumerate() {
        let height = cols[*start..*end].iter().cloned().fold(0.0f32, f32::max);
        series.insert(format!("bar_{}", i + 1), json!(round3(height)));
    }
    json!({ "series": Value::Object(series) })
}

/// Pie chart: ink share of each quadrant around the region center.
///
/// A deliberately coarse approximation — slice boundaries are not traced;
/// the quadrant shares still tell the insight generator which side of the
/// pie dominates.
fn extract_slices(gray: &GrayImage) -> Value {
    let (w, h) = gray.dimensions();
    let cx = w / 2;
    let cy = h / 2;
    let mut counts = [0u32; 4];
    let mut total = 0u32;

    for y in 0..h {
        for x in 0..w {
            if gray.get_pixel(x, y).0[0] >= INK_THRESHOLD {
                continue;
            }
            total += 1;
            let quadrant = match (x >= cx, y >= cy) {
                (true, false) => 0,  // top-right
                (false, false) => 1, // top-left
                (false, true) => 2,  // bottom-left
                (true, true) => 3,   // bottom-right
            };
            counts[quadrant] += 1;
        }
    }

    let names = ["top_right", "top_left", "bottom_left", "bottom_right"];
    let mut slices = Map::new();
    for (name, count) in names.iter().zip(counts.iter()) {
        let share = if total == 0 {
            0.0
        } else {
            *count as f32 / total as f32
        };
        slices.insert((*name).into(), json!(round3(share)));
    }
    json!({ "slices": Value::Object(slices) })
}

/// Line chart: sampled (x, y) points in unit coordinates, y up.
fn extract_points(gray: &GrayImage) -> Value {
    let (w, h) = gray.dimensions();
    let samples = LINE_SAMPLES.min(w);
    let mut points = Vec::new();

    for s in 0..samples {
        let x = s * w / samples + w / (2 * samples);
        // Topmost ink pixel in this column; skip columns without ink.
        let top = (0..h).find(|&y| gray.get_pixel(x, y).0[0] < INK_THRESHOLD);
        if let Some(top) = top {
            let unit_x = x as f32 / w as f32;
            let unit_y = 1.0 - top as f32 / h as f32;
            points.push(json!({ "x": round3(unit_x), "y": round3(unit_y) }));
        }
    }

    json!({ "points": points })
}

fn round3(v: f32) -> f32 {
    (v * 1000.0).round() / 1000.0
}

// ── Mock for testing ──────────────────────────────────────

/// Counting extractor returning a fixed JSON value.
///
/// Tracks its invocation count so tests can assert the extractor is never
/// reached for gated regions, and can fail on a chosen call.
pub struct ScriptedExtractor {
    value: Value,
    calls: AtomicUsize,
    fail_on_call: Option<usize>,
}

impl ScriptedExtractor {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            calls: AtomicUsize::new(0),
            fail_on_call: None,
        }
    }

    /// Fail with an extraction error on the `n`-th call (0-indexed).
    pub fn with_failure_on_call(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DataExtractor for ScriptedExtractor {
    fn extract(&self, _region: &RegionImage, _label: &str) -> Result<Value, VisionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_call == Some(call) {
            return Err(VisionError::Extraction(format!(
                "mock: extractor broke on call {call}"
            )));
        }
        Ok(self.value.clone())
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
    fn bar_extraction_counts_bars_and_orders_heights() {
        let mut img = white(200, 100);
        for (i, bar_h) in [40u32, 80].iter().enumerate() {
            let x0 = 30 + i as u32 * 90;
            for x in x0..x0 + 30 {
                for y in (100 - bar_h)..100 {
                    img.put_pixel(x, y, Rgb([0, 0, 0]));
                }
            }
        }
        let data = ProjectionDataExtractor
            .extract(&region(img), "bar_chart")
            .unwrap();
        let series = data["series"].as_object().unwrap();
        assert_eq!(series.len(), 2);
        let v1 = series["bar_1"].as_f64().unwrap();
        let v2 = series["bar_2"].as_f64().unwrap();
        assert!(v2 > v1, "second bar is taller: {v1} vs {v2}");
    }

    #[test]
    fn pie_extraction_shares_sum_to_one() {
        let mut img = white(100, 100);
        // Ink only in the left half.
        for y in 0..100 {
            for x in 0..50 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        let data = ProjectionDataExtractor
            .extract(&region(img), "pie_chart")
            .unwrap();
        let slices = data["slices"].as_object().unwrap();
        let sum: f64 = slices.values().map(|v| v.as_f64().unwrap()).sum();
        assert!((sum - 1.0).abs() < 0.01, "shares sum to {sum}");
        assert!(slices["top_left"].as_f64().unwrap() > 0.4);
        assert_eq!(slices["top_right"].as_f64().unwrap(), 0.0);
    }

    #[test]
    fn line_extraction_tracks_stroke_height() {
        let mut img = white(160, 100);
        // Horizontal stroke at a quarter from the top.
        for x in 0..160 {
            img.put_pixel(x, 25, Rgb([0, 0, 0]));
        }
        let data = ProjectionDataExtractor
            .extract(&region(img), "line_chart")
            .unwrap();
        let points = data["points"].as_array().unwrap();
        assert_eq!(points.len(), 16);
        for p in points {
            let y = p["y"].as_f64().unwrap();
            assert!((y - 0.75).abs() < 0.05, "expected y ~0.75, got {y}");
        }
    }

    #[test]
    fn unknown_label_yields_raw_ink_fraction() {
        let data = ProjectionDataExtractor
            .extract(&region(white(50, 50)), "unknown")
            .unwrap();
        assert_eq!(data["ink_fraction"].as_f64().unwrap(), 0.0);
    }

    #[test]
    fn blank_bar_region_yields_empty_series() {
        let data = ProjectionDataExtractor
            .extract(&region(white(50, 50)), "bar_chart")
            .unwrap();
        assert!(data["series"].as_object().unwrap().is_empty());
    }

    // ── Scripted mock ──

    #[test]
    fn scripted_extractor_counts_calls() {
        let extractor = ScriptedExtractor::new(json!({"sample": "data"}));
        let r = region(white(10, 10));
        assert_eq!(extractor.call_count(), 0);
        let value = extractor.extract(&r, "bar_chart").unwrap();
        assert_eq!(value["sample"], "data");
        assert_eq!(extractor.call_count(), 1);
    }

    #[test]
    fn scripted_extractor_fails_on_requested_call() {
        let extractor = ScriptedExtractor::new(json!({})).with_failure_on_call(0);
        let r = region(white(10, 10));
        assert!(extractor.extract(&r, "bar_chart").is_err());
        assert!(extractor.extract(&r, "bar_chart").is_ok());
    }
}
