//! Pipeline stages for PDF-to-Word conversion.
//!
//! Each submodule implements exactly one transformation step, so each is
//! independently testable and the engines can be swapped (tests use fake
//! rasterisers and recognisers) without touching the other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ ocr ──▶ postprocess ──▶ docx
//! (checks)  (pdfium)   (PNG)   (tesseract) (cleanup)    (zip+xml)
//! ```
//!
//! 1. [`input`]  — validate an upload name or a local path
//! 2. [`render`] — rasterise every page; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`encode`] — PNG-encode a page for tesseract's stdin
//! 4. [`ocr`]    — run tesseract with the Sinhala model; the only stage that
//!    spawns processes
//! 5. [`postprocess`] — deterministic cleanup of OCR text
//! 6. [`docx`]   — assemble paragraphs and page breaks into a `.docx`

pub mod docx;
pub mod encode;
pub mod input;
pub mod ocr;
pub mod postprocess;
pub mod render;
