//! Progress-callback trait for per-attachment conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the driver converts the attachments of the top-level mail.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a channel, a job record or a terminal progress bar
//! without the library knowing how the host application communicates. The
//! trait is `Send + Sync` because attachments convert concurrently.
//!
//! # Example
//!
//! ```rust
//! use mailpdf::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_attachment_complete(&self, index: usize, total: usize, pdf_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Attachment {}/{} done ({} bytes)", index, total, pdf_len);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the driver as it converts the top-level mail's attachments.
///
/// Nested mails are reported as a single attachment of their parent. All
/// methods default to no-ops. `index` is 1-based.
///
/// # Thread safety
///
/// `on_attachment_start`, `on_attachment_complete` and `on_attachment_error`
/// may be called concurrently; protect shared state accordingly.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once, after decoding, before any attachment is converted.
    fn on_conversion_start(&self, total_attachments: usize) {
        let _ = total_attachments;
    }

    fn on_attachment_start(&self, index: usize, total: usize, filename: &str) {
        let _ = (index, total, filename);
    }

    /// `pdf_len` is the byte length of the produced PDF.
    fn on_attachment_complete(&self, index: usize, total: usize, pdf_len: usize) {
        let _ = (index, total, pdf_len);
    }

    fn on_attachment_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after every attachment was attempted.
    fn on_conversion_complete(&self, total_attachments: usize, succeeded: usize) {
        let _ = (total_attachments, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        started_total: AtomicUsize,
        succeeded: AtomicUsize,
        names: Mutex<Vec<String>>,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_conversion_start(&self, total: usize) {
            self.started_total.store(total, Ordering::SeqCst);
        }

        fn on_attachment_start(&self, _index: usize, _total: usize, filename: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.names.lock().unwrap().push(filename.to_string());
        }

        fn on_attachment_complete(&self, _index: usize, _total: usize, _pdf_len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_attachment_error(&self, _index: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_complete(&self, _total: usize, succeeded: usize) {
            self.succeeded.store(succeeded, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(2);
        cb.on_attachment_start(1, 2, "a.docx");
        cb.on_attachment_complete(1, 2, 42);
        cb.on_attachment_error(2, 2, "renderer down");
        cb.on_conversion_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_conversion_start(3);
        tracker.on_attachment_start(1, 3, "a.pdf");
        tracker.on_attachment_complete(1, 3, 100);
        tracker.on_attachment_start(2, 3, "b.xlsx");
        tracker.on_attachment_complete(2, 3, 200);
        tracker.on_attachment_start(3, 3, "c.bin");
        tracker.on_attachment_error(3, 3, "empty document");
        tracker.on_conversion_complete(3, 2);

        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.succeeded.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.names.lock().unwrap().len(), 3);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_conversion_start(10);
        cb.on_attachment_start(1, 10, "x");
    }
}
