//! Stage-level progress notifications.

use crate::report::StepReport;

/// Receives progress events while a pipeline runs.
///
/// Both methods default to doing nothing. `index` is zero-based and
/// `total` is the number of stages in the run.
pub trait ProgressSink: Send + Sync {
    fn stage_started(&self, _stage: &str, _index: usize, _total: usize) {}

    fn stage_completed(&self, _step: &StepReport, _index: usize, _total: usize) {}
}

/// A sink that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ProgressSink for NoopSink {}
