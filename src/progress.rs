//! Progress-callback trait for per-file and per-page events.
//!
//! Inject an [`Arc<dyn SheetProgressCallback>`] via
//! [`crate::config::SheetConfigBuilder::progress_callback`] to receive
//! real-time events as the pipeline ingests each file and exports each page.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a channel, a GUI overlay, or a terminal progress bar —
//! without the library knowing anything about how the host application
//! communicates. The trait is `Send + Sync` so implementations can be shared
//! freely; the pipeline itself is strictly sequential, so events always
//! arrive in order.

use std::sync::Arc;

/// Called by the pipeline as it ingests files and exports pages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events fire from a single control flow, one file or
/// page at a time, in input order.
pub trait SheetProgressCallback: Send + Sync {
    /// Called once before any file is read.
    fn on_ingest_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called after each file attempt, whether it produced an image or was
    /// dropped. `current` is the 1-indexed attempt number.
    fn on_file_done(&self, current: usize, total: usize) {
        let _ = (current, total);
    }

    /// Called when a file is dropped (unreadable, undecodable, or a legacy
    /// format with no transcoder). Fires just before `on_file_done`.
    fn on_file_dropped(&self, current: usize, total: usize, reason: &str) {
        let _ = (current, total, reason);
    }

    /// Called once before any page is composed.
    fn on_export_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page is composed and appended to the document.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page has been appended to the document.
    ///
    /// `failed_cells` counts cells left blank on this page.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, failed_cells: usize) {
        let _ = (page_num, total_pages, failed_cells);
    }

    /// Called when a page could not be composed and was skipped.
    fn on_page_skipped(&self, page_num: usize, total_pages: usize, reason: &str) {
        let _ = (page_num, total_pages, reason);
    }

    /// Called once after all pages have been attempted.
    fn on_export_complete(&self, total_pages: usize, written_pages: usize) {
        let _ = (total_pages, written_pages);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl SheetProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SheetConfig`].
pub type ProgressCallback = Arc<dyn SheetProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        files: AtomicUsize,
        drops: AtomicUsize,
        pages: AtomicUsize,
        skips: AtomicUsize,
        written: AtomicUsize,
    }

    impl SheetProgressCallback for TrackingCallback {
        fn on_file_done(&self, _current: usize, _total: usize) {
            self.files.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_dropped(&self, _current: usize, _total: usize, _reason: &str) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_complete(&self, _page: usize, _total: usize, _failed: usize) {
            self.pages.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_skipped(&self, _page: usize, _total: usize, _reason: &str) {
            self.skips.fetch_add(1, Ordering::SeqCst);
        }

        fn on_export_complete(&self, _total: usize, written: usize) {
            self.written.store(written, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_ingest_start(4);
        cb.on_file_done(1, 4);
        cb.on_file_dropped(2, 4, "unreadable");
        cb.on_export_start(1);
        cb.on_page_start(1, 1);
        cb.on_page_complete(1, 1, 0);
        cb.on_page_skipped(1, 1, "no surface");
        cb.on_export_complete(1, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let t = TrackingCallback {
            files: AtomicUsize::new(0),
            drops: AtomicUsize::new(0),
            pages: AtomicUsize::new(0),
            skips: AtomicUsize::new(0),
            written: AtomicUsize::new(0),
        };

        t.on_ingest_start(3);
        t.on_file_done(1, 3);
        t.on_file_dropped(2, 3, "bad decode");
        t.on_file_done(2, 3);
        t.on_file_done(3, 3);
        t.on_export_start(1);
        t.on_page_start(1, 1);
        t.on_page_complete(1, 1, 0);
        t.on_export_complete(1, 1);

        assert_eq!(t.files.load(Ordering::SeqCst), 3);
        assert_eq!(t.drops.load(Ordering::SeqCst), 1);
        assert_eq!(t.pages.load(Ordering::SeqCst), 1);
        assert_eq!(t.skips.load(Ordering::SeqCst), 0);
        assert_eq!(t.written.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Arc<dyn SheetProgressCallback>>();
    }
}
