//! Result types returned by the conversion entry points.

use crate::pipeline::docx::WordDocument;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Recognised text for one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Text as written into the document (after cleanup, if enabled).
    pub text: String,
    /// Wall-clock time spent in OCR for this page.
    pub duration_ms: u64,
}

/// Timings and counters for one conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    pub total_pages: usize,
    /// Pages whose OCR produced no text at all (blank or unreadable scans).
    pub empty_pages: usize,
    pub total_chars: usize,
    pub render_duration_ms: u64,
    pub ocr_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything a full conversion produced.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub pages: Vec<PageResult>,
    pub document: WordDocument,
    pub stats: ConversionStats,
    /// Where the document was saved, for the `*_to_file` entry points.
    pub output_path: Option<PathBuf>,
}
