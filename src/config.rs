/// Application-level constants
pub const APP_NAME: &str = "InsightForge";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Classification confidence a region must strictly exceed to be surfaced
/// as a chart. Fixed policy: low-confidence chart-type guesses are dropped
/// rather than returned as structured data the caller would treat as
/// ground truth.
pub const CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Default rasterization DPI. 200 DPI balances region-detection accuracy
/// against render cost. Not adaptive per document.
pub const DEFAULT_RENDER_DPI: u32 = 200;

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "info,insightforge=debug"
}

/// What the pipeline does when a collaborator fails for a single region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record a failure marker for the region and keep processing the rest
    /// of the document (default).
    IsolateRegions,
    /// Fail the whole invocation on the first region error. Matches the
    /// historical behavior where one bad region failed the entire document.
    AbortAll,
}

/// Per-invocation pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub render_dpi: u32,
    pub failure_policy: FailurePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            render_dpi: DEFAULT_RENDER_DPI,
            failure_policy: FailurePolicy::IsolateRegions,
        }
    }
}
