//! Rasterization adapter: document bytes → ordered page images.
//!
//! Isolates the orchestrator from the decoding mechanism. The production
//! implementation renders through Google PDFium; tests use the mock.

pub mod pdfium;
pub mod types;

pub use pdfium::{MockRasterizer, PdfiumRasterizer};
pub use types::{PageImage, Rasterizer};

use thiserror::Error;

/// Errors decoding or rendering a document.
///
/// Every variant is fatal to the invocation: after a decode failure the
/// pipeline returns an error-only result and attempts no per-page recovery.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("not a parseable PDF document: {0}")]
    DocumentDecode(String),

    #[error("PDF document is password protected")]
    Encrypted,

    #[error("failed to render page {page}: {reason}")]
    PageRender { page: usize, reason: String },

    #[error("PDFium library unavailable: {0}")]
    LibraryLoad(String),
}
