//! Error types for the sinhala-pdf2docx library.
//!
//! Every fatal conversion error is a [`Pdf2DocxError`]. Each variant belongs
//! to exactly one [`FailureStage`] so a job that dies can report *where* it
//! died (rasterising, recognising or writing the document) without parsing
//! the message text.
//!
//! There is no page-level, non-fatal error type: one page failing to OCR
//! aborts the whole document. Callers that poll a job see the `Display` of
//! the error prefixed with `Error: ` and the stage tag alongside it.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the sinhala-pdf2docx library.
#[derive(Debug, Error)]
pub enum Pdf2DocxError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Rasterisation errors ──────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_DIR (or --pdfium-lib-dir) to the directory containing\n\
libpdfium.so / libpdfium.dylib / pdfium.dll, or install pdfium on the\n\
system library path.\n"
    )]
    PdfiumBindingFailed(String),

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password; encrypted scans are not supported.
    #[error("PDF '{path}' is encrypted and requires a password.")]
    PasswordRequired { path: PathBuf },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    // ── Recognition errors ────────────────────────────────────────────────
    /// The OCR engine binary could not be started.
    #[error(
        "Could not start OCR engine '{program}': {source}\n\
Install tesseract-ocr with the Sinhala model (tesseract-ocr-sin) or set\n\
TESSERACT_PATH (or --tesseract-path) to the tesseract executable."
    )]
    RecogniserUnavailable {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The page image could not be encoded for the OCR engine.
    #[error("Image encoding failed for page {page}: {detail}")]
    ImageEncodingFailed { page: usize, detail: String },

    /// The OCR engine ran but reported a failure for a page.
    #[error("OCR failed for page {page}: {detail}")]
    RecognitionFailed { page: usize, detail: String },

    // ── Persistence errors ────────────────────────────────────────────────
    /// Could not create or write the output document.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The Word package could not be assembled (zip or XML serialisation).
    #[error("Failed to build Word document: {0}")]
    DocumentBuildFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The pipeline step a [`Pdf2DocxError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    /// Loading the PDF or rendering its pages.
    Rasterise,
    /// Running OCR over a rendered page.
    Recognise,
    /// Assembling or saving the output document.
    Persist,
    /// Input resolution, configuration, or internal failures.
    Other,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureStage::Rasterise => "rasterise",
            FailureStage::Recognise => "recognise",
            FailureStage::Persist => "persist",
            FailureStage::Other => "other",
        };
        f.write_str(s)
    }
}

impl Pdf2DocxError {
    /// Which pipeline step produced this error.
    pub fn stage(&self) -> FailureStage {
        match self {
            Pdf2DocxError::PdfiumBindingFailed(_)
            | Pdf2DocxError::CorruptPdf { .. }
            | Pdf2DocxError::PasswordRequired { .. }
            | Pdf2DocxError::RasterisationFailed { .. } => FailureStage::Rasterise,

            Pdf2DocxError::RecogniserUnavailable { .. }
            | Pdf2DocxError::ImageEncodingFailed { .. }
            | Pdf2DocxError::RecognitionFailed { .. } => FailureStage::Recognise,

            Pdf2DocxError::OutputWriteFailed { .. } | Pdf2DocxError::DocumentBuildFailed(_) => {
                FailureStage::Persist
            }

            Pdf2DocxError::FileNotFound { .. }
            | Pdf2DocxError::PermissionDenied { .. }
            | Pdf2DocxError::NotAPdf { .. }
            | Pdf2DocxError::InvalidConfig(_)
            | Pdf2DocxError::Internal(_) => FailureStage::Other,
        }
    }
}

impl From<zip::result::ZipError> for Pdf2DocxError {
    fn from(e: zip::result::ZipError) -> Self {
        Pdf2DocxError::DocumentBuildFailed(format!("zip: {e}"))
    }
}

impl From<quick_xml::Error> for Pdf2DocxError {
    fn from(e: quick_xml::Error) -> Self {
        Pdf2DocxError::DocumentBuildFailed(format!("xml: {e}"))
    }
}
