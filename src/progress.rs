//! Progress-callback trait for host notifications.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to hear about
//! staged files, per-unit pipeline progress and emitted artifacts. A "unit" is
//! whatever the operation steps over: an image, a page, a source PDF or a
//! slide.
//!
//! # Example
//!
//! ```rust
//! use docshift::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     emitted: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_artifact_emitted(&self, filename: &str, bytes: usize) {
//!         self.emitted.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("saved {filename} ({bytes} bytes)");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { emitted: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

use crate::stager::OperationKind;

/// Called by the session and pipelines as a conversion proceeds.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Pipelines run on a blocking worker thread, so
/// implementations must be `Send + Sync`.
pub trait ConversionProgressCallback: Send + Sync {
    /// A file passed the type filter and is staged at `index`.
    fn on_file_staged(&self, name: &str, index: usize) {
        let _ = (name, index);
    }

    /// A file was refused; `reason` is the user-facing message.
    fn on_file_rejected(&self, name: &str, reason: &str) {
        let _ = (name, reason);
    }

    /// Called once before the first unit is processed.
    ///
    /// # Arguments
    /// * `kind`: the operation being run
    /// * `units`: number of input units known up front (staged files; page
    ///   counts are reported per unit as they become known)
    fn on_conversion_start(&self, kind: OperationKind, units: usize) {
        let _ = (kind, units);
    }

    /// Called after each unit, with 1-based `unit` out of `total`.
    fn on_unit_complete(&self, unit: usize, total: usize) {
        let _ = (unit, total);
    }

    /// An artifact was handed to the output emitter.
    fn on_artifact_emitted(&self, filename: &str, bytes: usize) {
        let _ = (filename, bytes);
    }

    /// The run failed; `notice` is the kind's generic failure notice.
    fn on_conversion_failed(&self, kind: OperationKind, notice: &str) {
        let _ = (kind, notice);
    }

    /// The run succeeded with `artifacts` outputs.
    fn on_conversion_complete(&self, kind: OperationKind, artifacts: usize) {
        let _ = (kind, artifacts);
    }
}

/// A no-op implementation, used when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

/// The configured callback, or a no-op one.
pub(crate) fn or_noop(cb: Option<&ProgressCallback>) -> ProgressCallback {
    cb.cloned().unwrap_or_else(|| Arc::new(NoopProgressCallback))
}
