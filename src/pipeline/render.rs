//! PDF rasterisation: render every page to a `DynamicImage` via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto the blocking pool so
//! request handlers and other jobs keep running while a scan renders.
//!
//! ## Resolution
//!
//! Pages are rendered at the configured DPI (default 200) and the longest
//! edge is capped at `max_rendered_pixels`, so an oversized page cannot
//! exhaust memory. All pages of a document are held in memory until OCR
//! finishes.

use crate::config::ConversionConfig;
use crate::error::Pdf2DocxError;
use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Turns a PDF on disk into one image per page, in page order.
///
/// Implemented by [`PdfiumRasteriser`]; tests and embedders can supply their
/// own through [`crate::ConversionConfigBuilder::rasteriser`].
#[async_trait]
pub trait PageRasteriser: Send + Sync {
    /// Render all pages of `pdf_path`. An empty PDF yields an empty vector.
    async fn rasterise(&self, pdf_path: &Path) -> Result<Vec<DynamicImage>, Pdf2DocxError>;
}

/// Rasteriser backed by a dynamically bound pdfium library.
#[derive(Debug, Clone)]
pub struct PdfiumRasteriser {
    library_dir: Option<PathBuf>,
    dpi: u32,
    max_pixels: u32,
}

impl PdfiumRasteriser {
    pub fn new(library_dir: Option<PathBuf>, dpi: u32, max_pixels: u32) -> Self {
        Self {
            library_dir,
            dpi,
            max_pixels,
        }
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        Self::new(
            config.pdfium_library_dir.clone(),
            config.dpi,
            config.max_rendered_pixels,
        )
    }

    /// Check that the pdfium library can be bound.
    pub async fn probe(&self) -> Result<(), Pdf2DocxError> {
        let dir = self.library_dir.clone();
        tokio::task::spawn_blocking(move || bind_pdfium(dir.as_deref()).map(|_| ()))
            .await
            .map_err(|e| Pdf2DocxError::Internal(format!("Probe task panicked: {}", e)))?
    }
}

#[async_trait]
impl PageRasteriser for PdfiumRasteriser {
    async fn rasterise(&self, pdf_path: &Path) -> Result<Vec<DynamicImage>, Pdf2DocxError> {
        let path = pdf_path.to_path_buf();
        let dir = self.library_dir.clone();
        let dpi = self.dpi;
        let max_pixels = self.max_pixels;

        tokio::task::spawn_blocking(move || {
            render_pages_blocking(&path, dir.as_deref(), dpi, max_pixels)
        })
        .await
        .map_err(|e| Pdf2DocxError::Internal(format!("Render task panicked: {}", e)))?
    }
}

/// Bind pdfium from `dir` if given, otherwise from the system library path.
fn bind_pdfium(dir: Option<&Path>) -> Result<Pdfium, Pdf2DocxError> {
    let bindings = match dir {
        Some(dir) => {
            let lib = Pdfium::pdfium_platform_library_name_at_path(dir);
            debug!("Binding pdfium from {}", lib.display());
            Pdfium::bind_to_library(&lib)
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| Pdf2DocxError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Pixel width for a page `width_points` wide at `dpi`, capped at `max_pixels`.
fn target_width(width_points: f32, dpi: u32, max_pixels: u32) -> i32 {
    let px = (width_points / 72.0 * dpi as f32).round() as u32;
    px.clamp(1, max_pixels) as i32
}

/// Blocking implementation of page rendering.
fn render_pages_blocking(
    pdf_path: &Path,
    library_dir: Option<&Path>,
    dpi: u32,
    max_pixels: u32,
) -> Result<Vec<DynamicImage>, Pdf2DocxError> {
    let pdfium = bind_pdfium(library_dir)?;

    let document = pdfium.load_pdf_from_file(pdf_path, None).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            Pdf2DocxError::PasswordRequired {
                path: pdf_path.to_path_buf(),
            }
        } else {
            Pdf2DocxError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let mut results = Vec::with_capacity(total_pages);

    for (idx, page) in pages.iter().enumerate() {
        let render_config = PdfRenderConfig::new()
            .set_target_width(target_width(page.width().value, dpi, max_pixels))
            .set_maximum_height(max_pixels as i32);

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            Pdf2DocxError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );

        results.push(image);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_width_at_200_dpi() {
        // A4 is 595.28pt wide → 8.27in → 1654px at 200 DPI.
        assert_eq!(target_width(595.28, 200, 5000), 1654);
    }

    #[test]
    fn width_is_capped() {
        assert_eq!(target_width(2384.0, 600, 5000), 5000);
        assert_eq!(target_width(0.0, 200, 5000), 1);
    }

    #[test]
    fn from_config_copies_settings() {
        let config = ConversionConfig::builder()
            .pdfium_library_dir("/opt/pdfium/lib")
            .dpi(300)
            .build()
            .unwrap();
        let r = PdfiumRasteriser::from_config(&config);
        assert_eq!(r.library_dir, Some(PathBuf::from("/opt/pdfium/lib")));
        assert_eq!(r.dpi, 300);
        assert_eq!(r.max_pixels, 5000);
    }
}
