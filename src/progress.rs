//! Progress-callback trait for per-page conversion events.
//!
//! The conversion pipeline knows nothing about where progress goes. The web
//! service forwards events into the job registry
//! ([`crate::jobs::RegistryProgress`]); the CLI drives a terminal progress
//! bar. Both implement [`ConversionProgressCallback`].
//!
//! # Example
//!
//! ```rust
//! use sinhala_pdf2docx::ConversionProgressCallback;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} done ({} bytes)", page_num, total_pages, text_len);
//!     }
//! }
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it works through a document.
///
/// Pages are processed strictly in order, one at a time, so events for a
/// single conversion never overlap. Implementations must still be
/// `Send + Sync` because the conversion itself runs on a spawned task.
/// All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called before the PDF is loaded and rendered.
    fn on_rasterise_start(&self) {}

    /// Called once rendering finished and the page count is known.
    ///
    /// # Arguments
    /// * `total_pages` — number of pages that will be recognised
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before OCR runs on a page.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages in the document
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called after a page's text was appended to the document.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages
    /// * `text_len`    — byte length of the recognised (cleaned) text
    fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
        let _ = (page_num, total_pages, text_len);
    }

    /// Called once the document has been written.
    fn on_conversion_complete(&self, total_pages: usize) {
        let _ = total_pages;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias for a shared callback.
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        rasterise_starts: AtomicUsize,
        started_total: AtomicUsize,
        page_starts: AtomicUsize,
        completes: AtomicUsize,
        finished_total: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_rasterise_start(&self) {
            self.rasterise_starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_start(&self, total_pages: usize) {
            self.started_total.store(total_pages, Ordering::SeqCst);
        }

        fn on_page_start(&self, _page_num: usize, _total_pages: usize) {
            self.page_starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_complete(&self, _page_num: usize, _total_pages: usize, _text_len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_complete(&self, total_pages: usize) {
            self.finished_total.store(total_pages, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_rasterise_start();
        cb.on_conversion_start(5);
        cb.on_page_start(1, 5);
        cb.on_page_complete(1, 5, 42);
        cb.on_conversion_complete(5);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_rasterise_start();
        tracker.on_conversion_start(2);
        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 2);

        tracker.on_page_start(1, 2);
        tracker.on_page_complete(1, 2, 100);
        tracker.on_page_start(2, 2);
        tracker.on_page_complete(2, 2, 0);
        tracker.on_conversion_complete(2);

        assert_eq!(tracker.rasterise_starts.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.page_starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.finished_total.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_conversion_start(10);
        cb.on_page_complete(1, 10, 512);
    }
}
