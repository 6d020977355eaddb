use image::DynamicImage;

use super::RasterError;

/// A single rasterized page.
///
/// Immutable once produced; owned by the orchestration loop for the
/// duration of processing that page.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 1-indexed position within the document.
    pub number: usize,
    pub image: DynamicImage,
}

/// Document rasterization abstraction (allows mocking for tests).
pub trait Rasterizer {
    /// Rasterize the whole document at `dpi`, in page order.
    ///
    /// The returned pages are numbered 1..=n. An empty document yields an
    /// empty vector, not an error.
    fn rasterize(&self, document: &[u8], dpi: u32) -> Result<Vec<PageImage>, RasterError>;
}
