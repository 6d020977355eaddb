use image::DynamicImage;
use serde_json::Value;

use super::VisionError;

/// Chart-type labels the baseline classifier emits.
///
/// The pipeline itself treats labels as opaque strings; these constants
/// exist so implementations and tests agree on spelling.
pub mod labels {
    pub const BAR: &str = "bar_chart";
    pub const LINE: &str = "line_chart";
    pub const PIE: &str = "pie_chart";
    pub const UNKNOWN: &str = "unknown";
}

/// A candidate chart sub-image within a page.
///
/// Immutable; consumed by the classifier and the data extractor.
#[derive(Debug, Clone)]
pub struct RegionImage {
    /// 1-indexed parent page number.
    pub page: usize,
    /// 0-indexed position within the page, top-to-bottom.
    pub index: usize,
    pub image: DynamicImage,
}

/// Chart-type verdict for one region.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    /// In `[0, 1]`. The orchestrator gates on this value.
    pub confidence: f32,
}

/// Locates candidate chart regions on a page (allows mocking for tests).
pub trait RegionDetector {
    /// Detect candidate regions, ordered top-to-bottom and 0-indexed.
    /// An empty vector is a valid outcome, not an error.
    fn detect_regions(
        &self,
        page: &crate::pipeline::raster::PageImage,
    ) -> Result<Vec<RegionImage>, VisionError>;
}

/// Assigns a chart-type label and confidence to a region.
pub trait ChartClassifier {
    fn classify(&self, region: &RegionImage) -> Result<Classification, VisionError>;
}

/// Extracts structured data from a classified region.
///
/// The returned value's shape depends on the label; the pipeline stores
/// and forwards it without inspection.
pub trait DataExtractor {
    fn extract(&self, region: &RegionImage, label: &str) -> Result<Value, VisionError>;
}
