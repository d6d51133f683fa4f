//! Progress-callback trait for batch export events.
//!
//! Pass an [`Arc<dyn BatchProgressCallback>`] to
//! [`crate::batch::export_pdf_with_progress`] to observe a batch as each page
//! is composed. The HTTP API does not use it; the CLI drives a terminal
//! progress bar with it.
//!
//! # Example
//!
//! ```rust
//! use codeplate::BatchProgressCallback;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct Counter(AtomicUsize);
//!
//! impl BatchProgressCallback for Counter {
//!     fn on_page_composed(&self, page_num: usize, total_pages: usize, value: &str) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{page_num}/{total_pages}: {value}");
//!     }
//! }
//! ```

use std::sync::Arc;

/// Called by the batch pipeline as it composes each page.
///
/// Pages are composed sequentially on a blocking thread, so events arrive
/// in page order from a thread other than the caller's. All methods have
/// no-op defaults.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after validation, before the first page is composed.
    fn on_batch_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after each page is composed.
    ///
    /// # Arguments
    /// * `page_num`:    1-indexed position in the batch
    /// * `total_pages`: pages in the batch
    /// * `value`:       the encoded value stamped on this page
    fn on_page_composed(&self, page_num: usize, total_pages: usize, value: &str) {
        let _ = (page_num, total_pages, value);
    }

    /// Called once the PDF has been assembled.
    fn on_batch_complete(&self, total_pages: usize, pdf_bytes: usize) {
        let _ = (total_pages, pdf_bytes);
    }
}

/// Shared, thread-safe handle to a progress callback.
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

/// A no-op implementation used when no callback is supplied.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}
