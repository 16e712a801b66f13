//! Refactoring lifecycle notifications.

use tracing::{info, warn};

use excise_model::ElementId;

use crate::conflicts::Conflict;
use crate::executor::ExecutionReport;

/// Observes a Safe Delete run. Every hook defaults to doing nothing.
pub trait SafeDeleteListener: Send + Sync {
    /// Conflicts were found and are about to be shown.
    fn conflicts_detected(&self, _refactoring_id: &str, _conflicts: &[Conflict]) {}

    /// Execution is about to start for `elements`.
    fn before(&self, _refactoring_id: &str, _elements: &[ElementId]) {}

    /// Execution finished successfully.
    fn after(&self, _refactoring_id: &str, _report: &ExecutionReport) {}
}

/// Logs lifecycle events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl SafeDeleteListener for TracingListener {
    fn conflicts_detected(&self, refactoring_id: &str, conflicts: &[Conflict]) {
        for conflict in conflicts {
            warn!(refactoring = refactoring_id, severity = ?conflict.severity, "{}", conflict.message);
        }
    }

    fn before(&self, refactoring_id: &str, elements: &[ElementId]) {
        info!(refactoring = refactoring_id, elements = elements.len(), "refactoring started");
    }

    fn after(&self, refactoring_id: &str, report: &ExecutionReport) {
        info!(
            refactoring = refactoring_id,
            deleted = report.deleted.len(),
            dangling = report.dangling.len(),
            "refactoring done"
        );
    }
}
