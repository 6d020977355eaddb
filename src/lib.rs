//! InsightForge document chart-mining pipeline.
//!
//! Turns a multi-page PDF byte stream into a structured, insight-annotated
//! [`pipeline::AnalysisResult`]: pages are rasterized, chart-like regions
//! are located and classified, accepted charts have their data extracted,
//! and a language service writes per-chart narratives plus one cross-chart
//! summary.
//!
//! The orchestration lives in [`pipeline::analyzer`]. Every stage behind it
//! is a trait, so the pipeline can be driven with mock collaborators in
//! tests or re-wired by an embedding service.

pub mod config;
pub mod pipeline;
pub mod session; // Persistence collaborator boundary (storage stays external)

use tracing_subscriber::EnvFilter;

/// Initialize tracing for an embedding binary.
///
/// Honors `RUST_LOG` when set, otherwise falls back to the crate default
/// filter. Call once at startup.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
