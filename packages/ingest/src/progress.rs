//! Progress reporting for batch workflows.
//!
//! Imports and refreshes report through [`ProgressCallback`] so the
//! workflows stay independent of how (or whether) progress is drawn.

use std::sync::Arc;

/// Receives progress updates from a batch workflow.
pub trait ProgressCallback: Send + Sync {
    /// Sets the number of documents the batch will process.
    fn set_total(&self, total: u64);

    /// Advances by `delta` documents.
    fn inc(&self, delta: u64);

    /// Shows what is currently being processed.
    fn set_message(&self, msg: String);

    /// Marks the batch as finished.
    fn finish(&self, msg: String);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
