//! Conversion entry points.
//!
//! [`Converter`] owns the two engines (rasteriser and recogniser) and runs
//! the pipeline for one PDF at a time. The web service builds one converter
//! at startup and shares it between jobs; the free functions below build a
//! throwaway converter for one-off library use.
//!
//! Pages are recognised strictly in order and the first failure aborts the
//! conversion. There is no partial output: if page N fails, nothing is
//! written, even though pages 1..N were recognised.

use crate::config::ConversionConfig;
use crate::error::Pdf2DocxError;
use crate::output::{ConversionOutput, ConversionStats, PageResult};
use crate::pipeline::docx::WordDocument;
use crate::pipeline::ocr::{TesseractRecogniser, TextRecogniser};
use crate::pipeline::render::{PageRasteriser, PdfiumRasteriser};
use crate::pipeline::{input, postprocess};
use crate::progress::{ConversionProgressCallback, NoopProgressCallback};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Runs the rasterise → OCR → assemble pipeline.
#[derive(Clone)]
pub struct Converter {
    rasteriser: Arc<dyn PageRasteriser>,
    recogniser: Arc<dyn TextRecogniser>,
    clean_text: bool,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("clean_text", &self.clean_text)
            .finish_non_exhaustive()
    }
}

impl Converter {
    /// Build a converter, preferring pre-built engines from `config` and
    /// otherwise constructing pdfium / tesseract engines from its paths.
    pub fn new(config: &ConversionConfig) -> Self {
        let rasteriser: Arc<dyn PageRasteriser> = match config.rasteriser {
            Some(ref r) => Arc::clone(r),
            None => Arc::new(PdfiumRasteriser::from_config(config)),
        };
        let recogniser: Arc<dyn TextRecogniser> = match config.recogniser {
            Some(ref r) => Arc::clone(r),
            None => Arc::new(TesseractRecogniser::from_config(config)),
        };
        Self {
            rasteriser,
            recogniser,
            clean_text: config.clean_text,
        }
    }

    /// Convert `pdf_path` into an in-memory document.
    pub async fn convert(
        &self,
        pdf_path: &Path,
        progress: &dyn ConversionProgressCallback,
    ) -> Result<ConversionOutput, Pdf2DocxError> {
        let total_start = Instant::now();
        info!("Starting conversion: {}", pdf_path.display());

        // ── Step 1: Rasterise pages ──────────────────────────────────────────
        progress.on_rasterise_start();
        let render_start = Instant::now();
        let images = self.rasteriser.rasterise(pdf_path).await?;
        let render_duration_ms = render_start.elapsed().as_millis() as u64;
        let total_pages = images.len();
        info!("Rendered {} pages in {}ms", total_pages, render_duration_ms);

        progress.on_conversion_start(total_pages);

        // ── Step 2: OCR each page in order ───────────────────────────────────
        let title = pdf_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut document = WordDocument::new().with_title(title);
        let mut pages = Vec::with_capacity(total_pages);
        let ocr_start = Instant::now();

        for (idx, image) in images.iter().enumerate() {
            let page_num = idx + 1;
            progress.on_page_start(page_num, total_pages);

            let page_start = Instant::now();
            let raw = self.recogniser.recognise(page_num, image).await?;
            let text = if self.clean_text {
                postprocess::clean_text(&raw)
            } else {
                raw
            };
            debug!("Page {}: {} bytes of text", page_num, text.len());

            document.add_paragraph(text.clone());
            document.add_page_break();

            progress.on_page_complete(page_num, total_pages, text.len());
            pages.push(PageResult {
                page_num,
                text,
                duration_ms: page_start.elapsed().as_millis() as u64,
            });
        }

        let ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;

        // ── Step 3: Stats ────────────────────────────────────────────────────
        let stats = ConversionStats {
            total_pages,
            empty_pages: pages.iter().filter(|p| p.text.trim().is_empty()).count(),
            total_chars: pages.iter().map(|p| p.text.chars().count()).sum(),
            render_duration_ms,
            ocr_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };

        info!(
            "Recognised {} pages ({} chars) in {}ms",
            total_pages, stats.total_chars, stats.total_duration_ms
        );

        Ok(ConversionOutput {
            pages,
            document,
            stats,
            output_path: None,
        })
    }

    /// Convert `pdf_path` and save the document to `output_path`.
    ///
    /// The save is atomic (temp file + rename), so a failed job never leaves
    /// a truncated `.docx` behind.
    pub async fn convert_to_file(
        &self,
        pdf_path: &Path,
        output_path: &Path,
        progress: &dyn ConversionProgressCallback,
    ) -> Result<ConversionOutput, Pdf2DocxError> {
        let mut output = self.convert(pdf_path, progress).await?;

        let document = std::mem::take(&mut output.document);
        let path = output_path.to_path_buf();
        let (document, saved) = tokio::task::spawn_blocking(move || {
            let saved = document.save(&path);
            (document, saved)
        })
        .await
        .map_err(|e| Pdf2DocxError::Internal(format!("Save task panicked: {}", e)))?;
        saved?;

        info!("Saved {}", output_path.display());
        progress.on_conversion_complete(output.stats.total_pages);

        output.document = document;
        output.output_path = Some(output_path.to_path_buf());
        Ok(output)
    }
}

/// Convert a local PDF file to an in-memory Word document.
///
/// The path is checked for existence and PDF magic bytes first.
pub async fn convert(
    pdf_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2DocxError> {
    let path = input::resolve_local(pdf_path)?;
    Converter::new(config)
        .convert(&path, &NoopProgressCallback)
        .await
}

/// Convert a local PDF file and write the `.docx` to `output_path`.
pub async fn convert_to_file(
    pdf_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Pdf2DocxError> {
    let path = input::resolve_local(pdf_path)?;
    let output = Converter::new(config)
        .convert_to_file(&path, output_path.as_ref(), &NoopProgressCallback)
        .await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    pdf_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2DocxError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2DocxError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(pdf_path, config))
}

/// Convert PDF bytes held in memory.
///
/// The bytes are written to a managed [`tempfile`] that is removed when the
/// conversion returns.
pub async fn convert_from_bytes(
    bytes: &[u8],
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2DocxError> {
    let mut tmp = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| Pdf2DocxError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| Pdf2DocxError::Internal(format!("tempfile write: {e}")))?;
    // `tmp` is dropped (and the file deleted) when `convert` returns
    convert(tmp.path(), config).await
}
