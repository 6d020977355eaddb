//! Document chart-mining pipeline.
//!
//! Stage layout mirrors the data flow: [`raster`] → [`vision`] → [`insight`],
//! sequenced by [`analyzer`]. Each stage module owns its collaborator traits,
//! its production implementation and its mocks.

pub mod analyzer;
pub mod insight;
pub mod raster;
pub mod types;
pub mod vision;

pub use analyzer::{build_analyzer, ChartAnalyzer};
pub use types::{AnalysisResult, ChartRecord, RegionFailure};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::raster::RasterError;

/// Pipeline stage at which a region (or the summary) was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Detection,
    Classification,
    Extraction,
    Insight,
    Summary,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureStage::Detection => "region detection",
            FailureStage::Classification => "classification",
            FailureStage::Extraction => "data extraction",
            FailureStage::Insight => "insight generation",
            FailureStage::Summary => "summary generation",
        };
        f.write_str(name)
    }
}

/// Fatal pipeline errors.
///
/// These never cross the public `analyze` boundary: the orchestrator folds
/// them into an error-only [`types::AnalysisResult`] so callers always
/// receive a result object and check its `error` field.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The document bytes could not be rasterized. Always fatal — no
    /// per-page recovery is attempted.
    #[error("document decode failed: {0}")]
    DocumentDecode(#[from] RasterError),

    /// A collaborator failed for a specific region. Fatal only under
    /// [`crate::config::FailurePolicy::AbortAll`].
    #[error("{stage} failed on page {page}, region {region}: {reason}")]
    Collaborator {
        stage: FailureStage,
        /// 1-indexed page; 0-indexed region within it. Detection failures
        /// carry region 0 since no region was produced yet.
        page: usize,
        region: usize,
        reason: String,
    },

    /// Cross-chart summary generation failed. Fatal only under
    /// [`crate::config::FailurePolicy::AbortAll`].
    #[error("summary generation failed: {0}")]
    Summary(String),

    /// A production collaborator could not be constructed.
    #[error("pipeline construction failed: {0}")]
    Init(String),
}
