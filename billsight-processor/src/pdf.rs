//! First-page rendering of PDF bills.
//!
//! Rendering is synchronous and CPU bound; callers run it on the blocking
//! pool. [`PdfiumRasterizer`] needs the pdfium shared library at runtime,
//! looked up in the working directory first and then on
//! the system library path.

use image::{ImageFormat, RgbaImage};
use pdfium_render::prelude::{PdfRenderConfig, Pdfium};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

use crate::error::ProcessError;

/// Renders page 1 of a PDF to PNG bytes.
pub trait PdfRasterizer: Send + Sync {
    /// Renders the first page of `path` so that neither edge exceeds
    /// `max_dimension`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Validation`] if the document cannot be read
    /// or rendered.
    fn render_first_page(&self, path: &Path, max_dimension: u32) -> Result<Vec<u8>, ProcessError>;
}

/// [`PdfRasterizer`] backed by pdfium.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumRasterizer;

fn bind_pdfium() -> Result<Pdfium, ProcessError> {
    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| conversion_error(format!("pdfium library unavailable: {e}")))
}

fn conversion_error(message: impl std::fmt::Display) -> ProcessError {
    ProcessError::Validation(format!("PDF conversion failed: {message}"))
}

impl PdfRasterizer for PdfiumRasterizer {
    fn render_first_page(&self, path: &Path, max_dimension: u32) -> Result<Vec<u8>, ProcessError> {
        let pdfium = bind_pdfium()?;
        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(conversion_error)?;
        let page = document.pages().get(0).map_err(conversion_error)?;

        let edge = i32::try_from(max_dimension).unwrap_or(i32::MAX);
        let config = PdfRenderConfig::new()
            .set_target_width(edge)
            .set_maximum_height(edge);
        let bitmap = page.render_with_config(&config).map_err(conversion_error)?;

        let width = u32::try_from(bitmap.width()).map_err(conversion_error)?;
        let height = u32::try_from(bitmap.height()).map_err(conversion_error)?;
        let pixels = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes())
            .ok_or_else(|| conversion_error("bitmap size mismatch"))?;

        let mut png = Vec::new();
        pixels
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(conversion_error)?;

        debug!(width, height, bytes = png.len(), "Rendered PDF page");
        Ok(png)
    }
}
