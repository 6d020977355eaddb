//! Vision collaborators: region detection, chart classification and
//! chart data extraction.
//!
//! The orchestrator only depends on the traits in [`types`]. The baseline
//! implementations here are deliberately simple geometric heuristics —
//! they make the crate runnable end-to-end and are expected to be swapped
//! for model-backed implementations behind the same traits.

pub mod classifier;
pub mod detector;
pub mod extractor;
pub mod ops;
pub mod types;

pub use classifier::{GeometricChartClassifier, ScriptedClassifier};
pub use detector::{InkBandRegionDetector, ScriptedRegionDetector};
pub use extractor::{ProjectionDataExtractor, ScriptedExtractor};
pub use types::{ChartClassifier, Classification, DataExtractor, RegionDetector, RegionImage};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("region detection failed: {0}")]
    Detection(String),

    #[error("classification failed: {0}")]
    Classification(String),

    #[error("data extraction failed: {0}")]
    Extraction(String),

    #[error("image processing error: {0}")]
    ImageProcessing(String),
}
