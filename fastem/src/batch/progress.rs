//! Progress reporting for section-level batch operations.

use common::SharedFn;

/// Progress information for batch operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    /// Section being processed.
    pub section: String,
    /// Current step (0-based).
    pub current: usize,
    /// Total number of steps.
    pub total: usize,
    pub stage: BatchStage,
}

/// Stage of a batch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStage {
    /// Writing mipmap levels for each tile.
    Unpacking,
    /// Reading the coarsest level of each reference tile.
    Measuring,
    /// Classifying tiles against the reference statistics.
    Classifying,
}

/// Callback type for progress reporting.
pub type ProgressCallback = SharedFn<dyn Fn(BatchProgress) + Send + Sync>;

/// Report progress using the callback if set.
pub fn report_progress(
    callback: &ProgressCallback,
    section: &str,
    current: usize,
    total: usize,
    stage: BatchStage,
) {
    if let Some(f) = callback.as_ref() {
        f(BatchProgress {
            section: section.to_string(),
            current,
            total,
            stage,
        });
    }
}
