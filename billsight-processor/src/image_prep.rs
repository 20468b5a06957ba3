//! Image validation and preprocessing.
//!
//! Input files are checked for existence, extension and size. A PDF has its
//! first page rendered to PNG. The image is then decoded, flattened to RGB
//! when it carries alpha or a palette, and scaled down so the longest edge
//! fits the configured maximum.

use async_trait::async_trait;
use billsight_fetch::ImagePayload;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use serde::Serialize;
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::ProcessError;
use crate::pdf::{PdfRasterizer, PdfiumRasterizer};

/// Default upload limit in bytes.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default longest edge after scaling.
pub const DEFAULT_MAX_DIMENSION: u32 = 2048;

const JPEG_QUALITY: u8 = 95;

// ============================================================================
// Input Format
// ============================================================================

/// File types accepted as bill images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// PNG image.
    Png,
    /// JPEG image (`.jpg` or `.jpeg`).
    Jpeg,
    /// PDF document.
    Pdf,
}

impl InputFormat {
    /// Detects the format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Returns the short format name used in data URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Pdf => "pdf",
        }
    }

    fn image_format(self) -> Option<ImageFormat> {
        match self {
            Self::Png => Some(ImageFormat::Png),
            Self::Jpeg => Some(ImageFormat::Jpeg),
            Self::Pdf => None,
        }
    }
}

// ============================================================================
// Prepared Image
// ============================================================================

/// Decoded image properties after preprocessing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    /// Encoded format, upper case.
    pub format: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel layout, e.g. `Rgb8`.
    pub color: String,
}

/// What happened to the input during preparation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageMetadata {
    /// Path the caller supplied.
    pub original_path: PathBuf,
    /// The file passed validation.
    pub validation_passed: bool,
    /// The image was rendered from a PDF page.
    pub converted_from_pdf: bool,
    /// Pixels were converted or rescaled.
    pub preprocessed: bool,
    /// Properties of the final image, if it could be decoded.
    pub image_info: Option<ImageInfo>,
}

/// An image ready to be sent to a vision model.
#[derive(Clone, PartialEq)]
pub struct PreparedImage {
    /// Source path.
    pub path: PathBuf,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
    /// Short format name (`png` or `jpeg`).
    pub format: String,
    /// Preparation details.
    pub metadata: ImageMetadata,
}

impl PreparedImage {
    /// Converts into the payload of a vision request.
    pub fn into_payload(self) -> ImagePayload {
        ImagePayload::new(self.bytes, self.format)
    }
}

impl fmt::Debug for PreparedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedImage")
            .field("path", &self.path)
            .field("bytes", &self.bytes.len())
            .field("format", &self.format)
            .field("metadata", &self.metadata)
            .finish()
    }
}

// ============================================================================
// Preparer Trait
// ============================================================================

/// Turns a file path into model-ready image bytes.
#[async_trait]
pub trait ImagePreparer: Send + Sync {
    /// Validates and normalizes the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Validation`] for a missing, unsupported or
    /// oversized file.
    async fn prepare(&self, path: &Path) -> Result<PreparedImage, ProcessError>;
}

// ============================================================================
// Image Processor
// ============================================================================

/// File-system backed [`ImagePreparer`].
#[derive(Clone)]
pub struct ImageProcessor {
    max_file_size: u64,
    max_dimension: u32,
    pdf: Arc<dyn PdfRasterizer>,
}

impl fmt::Debug for ImageProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageProcessor")
            .field("max_file_size", &self.max_file_size)
            .field("max_dimension", &self.max_dimension)
            .finish_non_exhaustive()
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_DIMENSION)
    }
}

impl ImageProcessor {
    /// Creates a processor with the given limits, rendering PDFs with pdfium.
    pub fn new(max_file_size: u64, max_dimension: u32) -> Self {
        Self {
            max_file_size,
            max_dimension,
            pdf: Arc::new(PdfiumRasterizer),
        }
    }

    /// Replaces the PDF renderer.
    #[must_use]
    pub fn with_pdf_rasterizer(mut self, pdf: Arc<dyn PdfRasterizer>) -> Self {
        self.pdf = pdf;
        self
    }

    /// Renders page 1 of the PDF at `path` on the blocking pool.
    async fn render_pdf(&self, path: &Path) -> Result<Vec<u8>, ProcessError> {
        let pdf = Arc::clone(&self.pdf);
        let path = path.to_path_buf();
        let max_dimension = self.max_dimension;
        tokio::task::spawn_blocking(move || pdf.render_first_page(&path, max_dimension))
            .await
            .map_err(|e| ProcessError::Internal(format!("PDF task failed: {e}")))?
    }

    /// Checks existence, extension and size.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Validation`] describing the first failed check.
    pub async fn validate(&self, path: &Path) -> Result<InputFormat, ProcessError> {
        let Ok(meta) = tokio::fs::metadata(path).await else {
            return Err(ProcessError::Validation("File does not exist".to_string()));
        };
        if !meta.is_file() {
            return Err(ProcessError::Validation("Not a regular file".to_string()));
        }

        let format = InputFormat::from_path(path).ok_or_else(|| {
            let ext = path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy().to_ascii_lowercase()))
                .unwrap_or_default();
            ProcessError::Validation(format!("Unsupported format: {ext}"))
        })?;

        if meta.len() > self.max_file_size {
            return Err(ProcessError::Validation(format!(
                "File too large: {:.2}MB (max: {:.0}MB)",
                to_mb(meta.len()),
                to_mb(self.max_file_size)
            )));
        }

        Ok(format)
    }
}

#[async_trait]
impl ImagePreparer for ImageProcessor {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn prepare(&self, path: &Path) -> Result<PreparedImage, ProcessError> {
        let input = self.validate(path).await?;
        let converted_from_pdf = input == InputFormat::Pdf;

        let (original, format) = if converted_from_pdf {
            info!("Converting first PDF page");
            (self.render_pdf(path).await?, InputFormat::Png)
        } else {
            (tokio::fs::read(path).await?, input)
        };
        let Some(image_format) = format.image_format() else {
            return Err(ProcessError::Internal(format!(
                "no image encoding for {}",
                format.as_str()
            )));
        };

        let max_dimension = self.max_dimension;
        let input = original.clone();
        let processed = tokio::task::spawn_blocking(move || {
            preprocess(&input, image_format, max_dimension)
        })
        .await
        .map_err(|e| ProcessError::Internal(format!("image task failed: {e}")))?;

        let (bytes, preprocessed, image_info) = match processed {
            Ok(Preprocessed { bytes, info, changed }) => {
                (bytes.unwrap_or(original), changed, Some(info))
            }
            Err(e) => {
                warn!(error = %e, "Preprocessing failed, using original bytes");
                (original, false, None)
            }
        };

        debug!(bytes = bytes.len(), preprocessed, converted_from_pdf, "Image prepared");

        Ok(PreparedImage {
            path: path.to_path_buf(),
            bytes,
            format: format.as_str().to_string(),
            metadata: ImageMetadata {
                original_path: path.to_path_buf(),
                validation_passed: true,
                converted_from_pdf,
                preprocessed,
                image_info,
            },
        })
    }
}

// ============================================================================
// Pixel Work
// ============================================================================

struct Preprocessed {
    /// Re-encoded bytes, `None` when the original can be sent as is.
    bytes: Option<Vec<u8>>,
    info: ImageInfo,
    changed: bool,
}

fn preprocess(
    bytes: &[u8],
    format: ImageFormat,
    max_dimension: u32,
) -> Result<Preprocessed, image::ImageError> {
    let mut img = image::load_from_memory_with_format(bytes, format)?;
    let mut changed = false;

    if !matches!(img, DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_)) {
        img = DynamicImage::ImageRgb8(img.to_rgb8());
        changed = true;
    }

    if img.width().max(img.height()) > max_dimension {
        img = img.resize(max_dimension, max_dimension, FilterType::Lanczos3);
        changed = true;
    }

    let info = ImageInfo {
        format: format!("{format:?}").to_uppercase(),
        width: img.width(),
        height: img.height(),
        color: format!("{:?}", img.color()),
    };

    if !changed {
        return Ok(Preprocessed {
            bytes: None,
            info,
            changed,
        });
    }

    let mut out = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
            img.write_with_encoder(encoder)?;
        }
        _ => img.write_to(&mut Cursor::new(&mut out), format)?,
    }

    Ok(Preprocessed {
        bytes: Some(out),
        info,
        changed,
    })
}

#[allow(clippy::cast_precision_loss)]
fn to_mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    fn write_png(dir: &TempDir, name: &str, img: &DynamicImage) -> PathBuf {
        let path = dir.path().join(name);
        img.save_with_format(&path, ImageFormat::Png).unwrap();
        path
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(InputFormat::from_path(Path::new("a.PNG")), Some(InputFormat::Png));
        assert_eq!(InputFormat::from_path(Path::new("a.jpg")), Some(InputFormat::Jpeg));
        assert_eq!(InputFormat::from_path(Path::new("a.jpeg")), Some(InputFormat::Jpeg));
        assert_eq!(InputFormat::from_path(Path::new("a.pdf")), Some(InputFormat::Pdf));
        assert_eq!(InputFormat::from_path(Path::new("a.gif")), None);
        assert_eq!(InputFormat::from_path(Path::new("receipt")), None);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = ImageProcessor::default()
            .prepare(Path::new("/nonexistent/bill.png"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Image validation failed: File does not exist");
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bill.gif");
        std::fs::write(&path, b"GIF89a").unwrap();

        let err = ImageProcessor::default().prepare(&path).await.unwrap_err();
        assert!(err.to_string().contains("Unsupported format: .gif"));
    }

    #[tokio::test]
    async fn test_oversized_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bill.png");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        let err = ImageProcessor::new(1024, DEFAULT_MAX_DIMENSION)
            .prepare(&path)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Validation(ref m) if m.starts_with("File too large")));
    }

    /// Renders a fixed RGBA page regardless of the input.
    struct FixedPage {
        width: u32,
        height: u32,
    }

    impl PdfRasterizer for FixedPage {
        fn render_first_page(&self, _: &Path, _: u32) -> Result<Vec<u8>, ProcessError> {
            let page = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                self.width,
                self.height,
                Rgba([255, 255, 255, 255]),
            ));
            let mut png = Vec::new();
            page.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
                .unwrap();
            Ok(png)
        }
    }

    struct BrokenPdf;

    impl PdfRasterizer for BrokenPdf {
        fn render_first_page(&self, _: &Path, _: u32) -> Result<Vec<u8>, ProcessError> {
            Err(ProcessError::Validation(
                "PDF conversion failed: no pages".to_string(),
            ))
        }
    }

    fn write_pdf(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("bill.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();
        path
    }

    #[tokio::test]
    async fn test_pdf_first_page_converted_to_png() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(&dir);

        let prepared = ImageProcessor::new(DEFAULT_MAX_FILE_SIZE, 200)
            .with_pdf_rasterizer(Arc::new(FixedPage {
                width: 400,
                height: 100,
            }))
            .prepare(&path)
            .await
            .unwrap();

        assert_eq!(prepared.format, "png");
        assert_eq!(prepared.path, path);
        assert!(prepared.metadata.converted_from_pdf);
        assert!(prepared.metadata.preprocessed);
        let info = prepared.metadata.image_info.as_ref().unwrap();
        assert_eq!((info.width, info.height), (200, 50));
        assert_eq!(info.format, "PNG");

        let decoded = image::load_from_memory_with_format(&prepared.bytes, ImageFormat::Png).unwrap();
        assert_eq!(decoded.width(), 200);
    }

    #[tokio::test]
    async fn test_pdf_conversion_failure_is_validation_error() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(&dir);

        let err = ImageProcessor::default()
            .with_pdf_rasterizer(Arc::new(BrokenPdf))
            .prepare(&path)
            .await
            .unwrap_err();

        assert!(matches!(err, ProcessError::Validation(ref m) if m.starts_with("PDF conversion failed")));
        assert_eq!(err.stage(), billsight_core::Stage::Preparation);
    }

    #[tokio::test]
    async fn test_oversized_pdf_not_rendered() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bill.pdf");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        let err = ImageProcessor::new(1024, DEFAULT_MAX_DIMENSION)
            .with_pdf_rasterizer(Arc::new(BrokenPdf))
            .prepare(&path)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Validation(ref m) if m.starts_with("File too large")));
    }

    #[tokio::test]
    async fn test_small_rgb_image_passes_through() {
        let dir = TempDir::new().unwrap();
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 20, Rgb([255, 255, 255])));
        let path = write_png(&dir, "bill.png", &img);
        let original = std::fs::read(&path).unwrap();

        let prepared = ImageProcessor::default().prepare(&path).await.unwrap();

        assert_eq!(prepared.bytes, original);
        assert_eq!(prepared.format, "png");
        assert!(prepared.metadata.validation_passed);
        assert!(!prepared.metadata.preprocessed);
        let info = prepared.metadata.image_info.unwrap();
        assert_eq!((info.width, info.height), (40, 20));
        assert_eq!(info.format, "PNG");
    }

    #[tokio::test]
    async fn test_large_rgba_image_is_scaled_and_flattened() {
        let dir = TempDir::new().unwrap();
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(400, 100, Rgba([0, 0, 0, 128])));
        let path = write_png(&dir, "wide.png", &img);

        let prepared = ImageProcessor::new(DEFAULT_MAX_FILE_SIZE, 200)
            .prepare(&path)
            .await
            .unwrap();

        assert!(prepared.metadata.preprocessed);
        let info = prepared.metadata.image_info.as_ref().unwrap();
        assert_eq!((info.width, info.height), (200, 50));
        assert_eq!(info.color, "Rgb8");

        let decoded = image::load_from_memory(&prepared.bytes).unwrap();
        assert_eq!(decoded.width(), 200);
    }

    #[tokio::test]
    async fn test_undecodable_image_sent_as_is() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not really a jpeg").unwrap();

        let prepared = ImageProcessor::default().prepare(&path).await.unwrap();

        assert_eq!(prepared.bytes, b"not really a jpeg");
        assert_eq!(prepared.format, "jpeg");
        assert!(prepared.metadata.image_info.is_none());
        assert!(!prepared.metadata.preprocessed);
    }
}
