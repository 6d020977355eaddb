//! PDF rasterization via Google PDFium.
//!
//! Renders every page of a PDF byte stream to a bitmap for region
//! detection. PDFium handles the PDF complexities that matter for charts
//! rendered by reporting tools: embedded fonts, transparency, vector
//! drawing operators, form XObjects.
//!
//! `PdfiumRasterizer` is stateless (`Send + Sync`). Each operation creates
//! a fresh `Pdfium` instance because the upstream type is `!Send`. The OS
//! caches `dlopen`/`LoadLibrary` calls, so repeat loads are near-free.

use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, warn};

use super::types::{PageImage, Rasterizer};
use super::RasterError;

/// Maximum dimension (width or height) for rendered page images.
/// Prevents OOM on extremely large pages or absurd DPI settings.
const MAX_DIMENSION_PX: u32 = 4096;

/// PDF points per inch (standard PDF unit).
const POINTS_PER_INCH: f32 = 72.0;

/// Renders PDF pages to bitmaps using Google PDFium.
///
/// Stateless: the `Pdfium` library handle is loaded per-operation because
/// the upstream `Pdfium` type is `!Send + !Sync`. OS-level library caching
/// (dlopen/LoadLibrary) makes repeat loads effectively free.
pub struct PdfiumRasterizer;

impl PdfiumRasterizer {
    /// Create a new rasterizer, verifying the PDFium library is loadable.
    ///
    /// Fails fast at construction so a missing library surfaces at service
    /// startup instead of on the first analysis request.
    pub fn new() -> Result<Self, RasterError> {
        let _ = load_pdfium()?;
        Ok(Self)
    }
}

/// Load the PDFium dynamic library.
///
/// Discovery order:
/// 1. `PDFIUM_DYNAMIC_LIB_PATH` env var (explicit path to library file)
/// 2. Alongside the running executable
/// 3. System library search paths
fn load_pdfium() -> Result<Pdfium, RasterError> {
    // 1. Explicit path via env var
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        debug!(path = %path, "Loading PDFium from env var");
        let bindings = Pdfium::bind_to_library(&path).map_err(|e| {
            RasterError::LibraryLoad(format!("Failed to load PDFium from {path}: {e}"))
        })?;
        return Ok(Pdfium::new(bindings));
    }

    // 2. Alongside the executable (dev / portable install).
    // pdfium_platform_library_name_at_path() handles platform names:
    //   Windows → pdfium.dll | Linux → libpdfium.so | macOS → libpdfium.dylib
    if let Ok(exe) = std::env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            let lib_path =
                Pdfium::pdfium_platform_library_name_at_path(exe_dir.to_string_lossy().as_ref());
            if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
                debug!(dir = %exe_dir.display(), "Loaded PDFium from executable directory");
                return Ok(Pdfium::new(bindings));
            }
        }
    }

    // 3. System library
    let bindings = Pdfium::bind_to_system_library().map_err(|e| {
        RasterError::LibraryLoad(format!(
            "PDFium library not found. Set PDFIUM_DYNAMIC_LIB_PATH or install PDFium: {e}"
        ))
    })?;
    Ok(Pdfium::new(bindings))
}

/// Map PDF load errors — detect encrypted PDFs for a precise error variant.
fn map_load_error(e: PdfiumError) -> RasterError {
    let msg = format!("{e}");
    let lower = msg.to_lowercase();
    if lower.contains("password") || lower.contains("encrypt") {
        RasterError::Encrypted
    } else {
        RasterError::DocumentDecode(msg)
    }
}

/// Compute pixel dimensions for rendering, applying the dimension guard.
///
/// Returns (width_px, height_px), both clamped to [1, MAX_DIMENSION_PX].
/// Preserves aspect ratio when capping.
fn compute_render_dimensions(width_points: f32, height_points: f32, dpi: u32) -> (u32, u32) {
    let scale = dpi as f32 / POINTS_PER_INCH;
    let raw_w = (width_points * scale).max(1.0);
    let raw_h = (height_points * scale).max(1.0);

    let max_dim = raw_w.max(raw_h);
    if max_dim > MAX_DIMENSION_PX as f32 {
        let ratio = MAX_DIMENSION_PX as f32 / max_dim;
        let w = ((raw_w * ratio) as u32).max(1).min(MAX_DIMENSION_PX);
        let h = ((raw_h * ratio) as u32).max(1).min(MAX_DIMENSION_PX);
        (w, h)
    } else {
        (raw_w as u32, raw_h as u32)
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn rasterize(&self, document: &[u8], dpi: u32) -> Result<Vec<PageImage>, RasterError> {
        let pdfium = load_pdfium()?;
        let pdf = pdfium
            .load_pdf_from_byte_slice(document, None)
            .map_err(map_load_error)?;

        let pages = pdf.pages();
        let mut rendered: Vec<PageImage> = Vec::with_capacity(pages.len() as usize);

        for (index, page) in pages.iter().enumerate() {
            let number = index + 1; // pages are 1-indexed downstream

            let width_points = page.width().value;
            let height_points = page.height().value;
            let (target_w, target_h) = compute_render_dimensions(width_points, height_points, dpi);

            let uncapped_w = (width_points * dpi as f32 / POINTS_PER_INCH) as u32;
            let uncapped_h = (height_points * dpi as f32 / POINTS_PER_INCH) as u32;
            if target_w != uncapped_w || target_h != uncapped_h {
                warn!(
                    page = number,
                    raw_width = uncapped_w,
                    raw_height = uncapped_h,
                    capped_width = target_w,
                    capped_height = target_h,
                    "Page dimensions capped to {MAX_DIMENSION_PX}px",
                );
            }

            let config = PdfRenderConfig::new()
                .set_target_width(target_w as i32)
                .set_maximum_height(target_h as i32);

            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| RasterError::PageRender {
                    page: number,
                    reason: format!("Rendering failed: {e}"),
                })?;

            let image = bitmap.as_image();

            debug!(
                page = number,
                width = target_w,
                height = target_h,
                "Rasterized PDF page"
            );

            rendered.push(PageImage { number, image });
        }

        Ok(rendered)
    }
}

// ── Mock for testing ──────────────────────────────────────

/// Mock rasterizer returning blank white pages, or a decode failure.
///
/// Used by analyzer tests that need page sequences without requiring the
/// actual PDFium binary.
pub struct MockRasterizer {
    page_count: usize,
    fail_decode: bool,
}

impl MockRasterizer {
    pub fn new(page_count: usize) -> Self {
        Self {
            page_count,
            fail_decode: false,
        }
    }

    /// A rasterizer that rejects every document as undecodable.
    pub fn failing() -> Self {
        Self {
            page_count: 0,
            fail_decode: true,
        }
    }
}

impl Rasterizer for MockRasterizer {
    fn rasterize(&self, _document: &[u8], _dpi: u32) -> Result<Vec<PageImage>, RasterError> {
        if self.fail_decode {
            return Err(RasterError::DocumentDecode(
                "mock: byte stream is not a PDF".into(),
            ));
        }
        Ok((1..=self.page_count)
            .map(|number| PageImage {
                number,
                image: blank_page(64, 64),
            })
            .collect())
    }
}

/// Solid white RGB page for mock rendering.
fn blank_page(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([255, 255, 255]),
    ))
}
