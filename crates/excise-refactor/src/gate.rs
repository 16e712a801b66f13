//! Confirmation gate between collection and execution.

use tracing::{info, warn};

use crate::conflicts::Conflict;

/// Answer to the conflict dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictDecision {
    /// Show the raw usage list.
    ViewUsages,
    /// Delete despite the conflicts.
    ProceedAnyway,
    /// Abort without mutating anything.
    Cancel,
}

/// Answer given from the usage view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageViewDecision {
    /// Re-resolve the symbols and collect again from scratch.
    Retry,
    /// Delete the shown usages' symbols without re-collecting.
    DeleteAnyway,
    /// Close the view and abort.
    Close,
}

/// The user-facing side of Safe Delete.
///
/// The processor never holds a model lock while calling into the gate.
pub trait ConfirmationGate {
    /// False for batch and test contexts, where a declined conflict dialog
    /// is reported as an error instead of a quiet cancellation.
    fn is_interactive(&self) -> bool;

    /// Presents conflicts.
    fn on_conflicts(&mut self, conflicts: &[Conflict]) -> ConflictDecision;

    /// Shows the collected usages, one line each.
    fn view_usages(&mut self, usages: &[String]) -> UsageViewDecision;

    /// Shows non-code occurrences before an unconfirmed deletion. Returns
    /// true to proceed.
    fn preview_non_code(&mut self, usages: &[String]) -> bool;
}

/// Non-interactive gate: conflicts fail unless explicitly waived.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchGate {
    /// Proceed even when conflicts are found.
    pub ignore_conflicts: bool,
}

impl BatchGate {
    /// Creates a batch gate.
    #[must_use]
    pub fn new(ignore_conflicts: bool) -> Self {
        Self { ignore_conflicts }
    }
}

impl ConfirmationGate for BatchGate {
    fn is_interactive(&self) -> bool {
        false
    }

    fn on_conflicts(&mut self, conflicts: &[Conflict]) -> ConflictDecision {
        if self.ignore_conflicts {
            warn!(conflicts = conflicts.len(), "ignoring conflicts");
            ConflictDecision::ProceedAnyway
        } else {
            ConflictDecision::Cancel
        }
    }

    fn view_usages(&mut self, _usages: &[String]) -> UsageViewDecision {
        UsageViewDecision::Close
    }

    fn preview_non_code(&mut self, usages: &[String]) -> bool {
        for usage in usages {
            info!(%usage, "non-code occurrence left in place");
        }
        true
    }
}

/// Phases of one Safe Delete run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Searching usages.
    Collecting,
    /// Conflicts are waiting on the user.
    ConflictsFound,
    /// The usage view is open.
    ViewUsages,
    /// The user chose to delete despite conflicts.
    ProceedAnyway,
    /// The user cancelled.
    Cancelled,
    /// Delegates adjust the final usage list.
    Preprocessing,
    /// The run ended without deleting.
    Terminated,
}

impl GateState {
    /// Returns true if the run may move from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: GateState) -> bool {
        use GateState::{
            Cancelled, Collecting, ConflictsFound, Preprocessing, ProceedAnyway, Terminated,
            ViewUsages,
        };
        matches!(
            (self, next),
            (Collecting, ConflictsFound | Preprocessing | Terminated)
                | (ConflictsFound, ViewUsages | ProceedAnyway | Cancelled)
                | (ViewUsages, Collecting | Preprocessing | Terminated)
                | (ProceedAnyway, Preprocessing)
                | (Cancelled | Preprocessing, Terminated)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use excise_model::ElementId;

    #[test]
    fn batch_gate_cancels_unless_waived() {
        let conflicts = [Conflict::error(ElementId(1), "broken")];
        assert_eq!(
            BatchGate::new(false).on_conflicts(&conflicts),
            ConflictDecision::Cancel
        );
        assert_eq!(
            BatchGate::new(true).on_conflicts(&conflicts),
            ConflictDecision::ProceedAnyway
        );
        assert!(BatchGate::default().preview_non_code(&["README.md".to_string()]));
    }

    #[test]
    fn state_machine_edges() {
        use GateState::*;
        assert!(Collecting.can_transition_to(ConflictsFound));
        assert!(ConflictsFound.can_transition_to(ViewUsages));
        assert!(ViewUsages.can_transition_to(Collecting));
        assert!(ProceedAnyway.can_transition_to(Preprocessing));
        assert!(Cancelled.can_transition_to(Terminated));
        assert!(!Cancelled.can_transition_to(Preprocessing));
        assert!(!ConflictsFound.can_transition_to(Preprocessing));
    }
}
