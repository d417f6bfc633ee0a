//! Configuration types for PDF-to-Word conversion and for the web service.
//!
//! Conversion behaviour is controlled through [`ConversionConfig`], built via
//! its [`ConversionConfigBuilder`]. The HTTP service adds a small
//! [`ServerConfig`] on top: where uploads and outputs live, how big an upload
//! may be, and how long finished jobs are kept around.
//!
//! Both structs are plain data; the `pdf2docx` binary fills them from CLI
//! flags and environment variables.

use crate::error::Pdf2DocxError;
use crate::pipeline::ocr::TextRecogniser;
use crate::pipeline::render::PageRasteriser;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Tesseract's language code for the Sinhala script model.
pub const SINHALA_LANGUAGE: &str = "sin";

/// Configuration for a PDF-to-Word conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use sinhala_pdf2docx::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .dpi(300)
///     .tesseract_path("/usr/bin/tesseract")
///     .build()
///     .unwrap();
/// assert_eq!(config.language, "sin");
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Directory holding the pdfium shared library. Default: None.
    ///
    /// When `None` the system library search path is used.
    pub pdfium_library_dir: Option<PathBuf>,

    /// Path to (or bare name of) the tesseract executable. Default: `tesseract`.
    pub tesseract_path: PathBuf,

    /// Override for tesseract's `tessdata` directory. Default: None.
    pub tessdata_dir: Option<PathBuf>,

    /// OCR language model. Default: `sin`.
    pub language: String,

    /// Tesseract page segmentation mode (`--psm`, 0–13). Default: None
    /// (tesseract's own default, fully automatic segmentation).
    pub page_segmentation_mode: Option<u8>,

    /// Rendering DPI used when rasterising each page. Range: 72–600. Default: 200.
    ///
    /// 200 DPI matches what common PDF-to-image tools use when no resolution
    /// is given. Tesseract's Sinhala model reads noticeably better at 300 on
    /// small print.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 5000.
    ///
    /// Caps memory for oversized pages independently of DPI.
    pub max_rendered_pixels: u32,

    /// Apply deterministic cleanup to OCR text before writing it. Default: true.
    pub clean_text: bool,

    /// Pre-constructed rasteriser. Takes precedence over `pdfium_library_dir`.
    pub rasteriser: Option<Arc<dyn PageRasteriser>>,

    /// Pre-constructed recogniser. Takes precedence over the tesseract fields.
    pub recogniser: Option<Arc<dyn TextRecogniser>>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            pdfium_library_dir: None,
            tesseract_path: PathBuf::from("tesseract"),
            tessdata_dir: None,
            language: SINHALA_LANGUAGE.to_string(),
            page_segmentation_mode: None,
            dpi: 200,
            max_rendered_pixels: 5000,
            clean_text: true,
            rasteriser: None,
            recogniser: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("pdfium_library_dir", &self.pdfium_library_dir)
            .field("tesseract_path", &self.tesseract_path)
            .field("tessdata_dir", &self.tessdata_dir)
            .field("language", &self.language)
            .field("page_segmentation_mode", &self.page_segmentation_mode)
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("clean_text", &self.clean_text)
            .field("rasteriser", &self.rasteriser.as_ref().map(|_| "<dyn PageRasteriser>"))
            .field("recogniser", &self.recogniser.as_ref().map(|_| "<dyn TextRecogniser>"))
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn pdfium_library_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_dir = Some(dir.into());
        self
    }

    pub fn tesseract_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tesseract_path = path.into();
        self
    }

    pub fn tessdata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.tessdata_dir = Some(dir.into());
        self
    }

    pub fn language(mut self, lang: impl Into<String>) -> Self {
        self.config.language = lang.into();
        self
    }

    pub fn page_segmentation_mode(mut self, psm: u8) -> Self {
        self.config.page_segmentation_mode = Some(psm);
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn clean_text(mut self, v: bool) -> Self {
        self.config.clean_text = v;
        self
    }

    pub fn rasteriser(mut self, rasteriser: Arc<dyn PageRasteriser>) -> Self {
        self.config.rasteriser = Some(rasteriser);
        self
    }

    pub fn recogniser(mut self, recogniser: Arc<dyn TextRecogniser>) -> Self {
        self.config.recogniser = Some(recogniser);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2DocxError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(Pdf2DocxError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.language.trim().is_empty() {
            return Err(Pdf2DocxError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        if let Some(psm) = c.page_segmentation_mode {
            if psm > 13 {
                return Err(Pdf2DocxError::InvalidConfig(format!(
                    "Page segmentation mode must be 0–13, got {psm}"
                )));
            }
        }
        if c.tesseract_path.as_os_str().is_empty() {
            return Err(Pdf2DocxError::InvalidConfig(
                "Tesseract path must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Server ───────────────────────────────────────────────────────────────

/// Settings for the HTTP service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on. Default: `0.0.0.0:5000`.
    pub bind: SocketAddr,
    /// Where uploaded PDFs are written. Default: `uploads`.
    pub upload_dir: PathBuf,
    /// Where finished `.docx` files are written. Default: `converts`.
    pub output_dir: PathBuf,
    /// Largest accepted request body in bytes. Default: 100 MiB.
    pub max_upload_bytes: usize,
    /// How long a finished job (and its output file) is kept. Default: 24 h.
    ///
    /// `None` keeps everything until the process exits.
    pub retention: Option<Duration>,
    /// How often the retention sweeper runs. Default: 10 min.
    pub sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("converts"),
            max_upload_bytes: 100 * 1024 * 1024,
            retention: Some(Duration::from_secs(24 * 60 * 60)),
            sweep_interval: Duration::from_secs(10 * 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_sinhala() {
        let c = ConversionConfig::default();
        assert_eq!(c.language, "sin");
        assert_eq!(c.dpi, 200);
        assert_eq!(c.tesseract_path, PathBuf::from("tesseract"));
        assert!(c.clean_text);
        assert!(c.rasteriser.is_none());
    }

    #[test]
    fn builder_clamps_dpi() {
        let c = ConversionConfig::builder().dpi(20).build().unwrap();
        assert_eq!(c.dpi, 72);
        let c = ConversionConfig::builder().dpi(10_000).build().unwrap();
        assert_eq!(c.dpi, 600);
    }

    #[test]
    fn builder_rejects_bad_psm() {
        let err = ConversionConfig::builder()
            .page_segmentation_mode(14)
            .build()
            .unwrap_err();
        assert!(matches!(err, Pdf2DocxError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_empty_language() {
        let err = ConversionConfig::builder().language("  ").build().unwrap_err();
        assert!(err.to_string().contains("language"));
    }

    #[test]
    fn debug_hides_engine_objects() {
        let dbg = format!("{:?}", ConversionConfig::default());
        assert!(dbg.contains("language: \"sin\""));
        assert!(dbg.contains("rasteriser: None"));
    }

    #[test]
    fn server_defaults() {
        let s = ServerConfig::default();
        assert_eq!(s.bind.port(), 5000);
        assert_eq!(s.upload_dir, PathBuf::from("uploads"));
        assert_eq!(s.output_dir, PathBuf::from("converts"));
        assert_eq!(s.retention, Some(Duration::from_secs(86_400)));
    }
}
