//! Progress-callback trait for per-image events.
//!
//! Inject an `Arc<dyn RunProgressCallback>` via
//! [`crate::config::RunConfigBuilder::progress_callback`] to receive
//! real-time events as the pipeline works through each image.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a channel, a WebSocket, a database record, or a terminal
//! progress bar without the library knowing anything about how the host
//! application communicates. The trait is `Send + Sync` so callbacks can be
//! shared freely even though the pipeline itself processes images one at a
//! time.

use std::sync::Arc;

/// Called by the pipeline as it processes each image.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Images are processed strictly sequentially, so
/// events for one image always complete before the next image starts.
pub trait RunProgressCallback: Send + Sync {
    /// Called once after extraction, before any vision call.
    ///
    /// # Arguments
    /// * `total_images` — number of images that will be processed
    fn on_run_start(&self, total_images: usize) {
        let _ = total_images;
    }

    /// Called just before the vision request is sent for an image.
    ///
    /// # Arguments
    /// * `page`  — 1-indexed page number
    /// * `index` — 1-indexed image position within the page
    fn on_image_start(&self, page: u32, index: usize) {
        let _ = (page, index);
    }

    /// Called when an image's alt-text was generated successfully.
    ///
    /// # Arguments
    /// * `page`         — 1-indexed page number
    /// * `index`        — 1-indexed image position within the page
    /// * `alt_text_len` — byte length of the cleaned alt-text
    fn on_image_complete(&self, page: u32, index: usize, alt_text_len: usize) {
        let _ = (page, index, alt_text_len);
    }

    /// Called when an image's vision call failed.
    ///
    /// # Arguments
    /// * `page`  — 1-indexed page number
    /// * `index` — 1-indexed image position within the page
    /// * `error` — human-readable error description
    fn on_image_error(&self, page: u32, index: usize, error: &str) {
        let _ = (page, index, error);
    }

    /// Called once after every image has been attempted.
    ///
    /// # Arguments
    /// * `total_images`  — total images in the run
    /// * `success_count` — images that produced alt-text without error
    fn on_run_complete(&self, total_images: usize, success_count: usize) {
        let _ = (total_images, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RunConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        final_success: AtomicUsize,
    }

    impl RunProgressCallback for TrackingCallback {
        fn on_image_start(&self, _page: u32, _index: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_image_complete(&self, _page: u32, _index: usize, _len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_image_error(&self, _page: u32, _index: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_run_complete(&self, _total: usize, success_count: usize) {
            self.final_success.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(4);
        cb.on_image_start(1, 1);
        cb.on_image_complete(1, 1, 42);
        cb.on_image_error(2, 1, "some error");
        cb.on_run_complete(4, 3);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            starts: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            final_success: AtomicUsize::new(0),
        };

        tracker.on_run_start(3);
        tracker.on_image_start(1, 1);
        tracker.on_image_complete(1, 1, 100);
        tracker.on_image_start(1, 2);
        tracker.on_image_complete(1, 2, 80);
        tracker.on_image_start(2, 1);
        tracker.on_image_error(2, 1, "vision timeout");
        tracker.on_run_complete(3, 2);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.final_success.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn RunProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_run_start(10);
        cb.on_image_complete(1, 1, 512);
    }
}
