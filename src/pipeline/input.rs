//! Input validation for the two ways a PDF enters the system.
//!
//! * Web uploads are accepted by **file name only** ([`is_pdf_filename`]).
//!   The bytes are not sniffed; a mislabelled file fails later, during
//!   rasterisation, and the job reports the error.
//! * Local paths given to the CLI are checked for existence, readability and
//!   the `%PDF` magic bytes ([`resolve_local`]) so a typo fails before pdfium
//!   is even loaded.

use crate::error::Pdf2DocxError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// True when `filename` ends in `.pdf`, ignoring case.
pub fn is_pdf_filename(filename: &str) -> bool {
    filename.to_ascii_lowercase().ends_with(".pdf")
}

/// Validate a local PDF path, returning it unchanged on success.
pub fn resolve_local(path: impl AsRef<Path>) -> Result<PathBuf, Pdf2DocxError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(Pdf2DocxError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(Pdf2DocxError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2DocxError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Pdf2DocxError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}
