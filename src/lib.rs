//! # sinhala-pdf2docx
//!
//! Convert scanned Sinhala PDF documents into editable Word (`.docx`) files
//! with OCR, either through a small web service or as a library / CLI.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Render   rasterise pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 2. Encode   page image → PNG bytes
//!  ├─ 3. OCR      tesseract with the Sinhala model (`-l sin`), page by page
//!  ├─ 4. Clean    deterministic whitespace / form-feed cleanup
//!  └─ 5. Assemble one paragraph + one page break per page → .docx
//! ```
//!
//! Pages are recognised in order, one at a time. The first failing page
//! aborts the whole conversion and nothing is written.
//!
//! ## Web service
//!
//! [`server::serve`] exposes an upload page, an upload endpoint that starts a
//! background job, a progress endpoint for polling, and a download endpoint.
//! Jobs live in an in-memory [`jobs::JobRegistry`]; finished jobs are swept
//! after a retention period.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sinhala_pdf2docx::{convert_to_file, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .tesseract_path("/usr/bin/tesseract")
//!         .build()?;
//!     let stats = convert_to_file("scan.pdf", "scan.docx", &config).await?;
//!     eprintln!("{} pages, {} characters", stats.total_pages, stats.total_chars);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2docx` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## External engines
//!
//! | Engine | Located by | Notes |
//! |--------|-----------|-------|
//! | pdfium    | `pdfium_library_dir` or the system library path | bound at render time |
//! | tesseract | `tesseract_path` (default `tesseract` on `PATH`) | needs `sin.traineddata` |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod jobs;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, ServerConfig, SINHALA_LANGUAGE};
pub use convert::{convert, convert_from_bytes, convert_sync, convert_to_file, Converter};
pub use error::{FailureStage, Pdf2DocxError};
pub use output::{ConversionOutput, ConversionStats, PageResult};
pub use pipeline::docx::WordDocument;
pub use pipeline::ocr::{TesseractRecogniser, TextRecogniser};
pub use pipeline::render::{PageRasteriser, PdfiumRasteriser};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
