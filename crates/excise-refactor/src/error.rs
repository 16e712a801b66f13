//! Safe Delete errors.

use std::fmt;

use thiserror::Error;

use excise_model::{Cancelled, StructuralEditError};

use crate::conflicts::Conflict;
use crate::usage::UsageInfo;

/// Why a selected symbol cannot be deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// The element no longer exists.
    Missing,
    /// The element is synthetic.
    NotPhysical,
    /// The element kind does not support safe deletion.
    Unsupported,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Missing => "it no longer exists",
            Self::NotPhysical => "it is not a physical element",
            Self::Unsupported => "its kind cannot be safely deleted",
        })
    }
}

/// Errors raised by the Safe Delete engine.
#[derive(Debug, Error)]
pub enum SafeDeleteError {
    /// The search was cancelled through its progress ticket.
    #[error("safe delete cancelled")]
    Cancelled,

    /// A selected symbol is not a valid deletion target.
    #[error("cannot safely delete {name}: {reason}")]
    InvalidElement {
        /// Description of the rejected symbol.
        name: String,
        /// Why it was rejected.
        reason: InvalidReason,
    },

    /// Conflicts were found and the caller did not waive them.
    #[error("{}", conflict_summary(.conflicts))]
    Conflicts {
        /// Every conflict found.
        conflicts: Vec<Conflict>,
        /// The usages collected for the run.
        usages: Vec<UsageInfo>,
    },

    /// A usage rewrite or deletion failed; the command was rolled back.
    #[error(transparent)]
    StructuralEdit(#[from] StructuralEditError),

    /// A configured delegate name is not known.
    #[error("unknown safe delete delegate `{0}`")]
    UnknownDelegate(String),
}

impl From<Cancelled> for SafeDeleteError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

fn conflict_summary(conflicts: &[Conflict]) -> String {
    let mut summary = match conflicts.len() {
        1 => "safe delete found 1 conflict".to_string(),
        n => format!("safe delete found {n} conflicts"),
    };
    for conflict in conflicts {
        summary.push_str("\n  ");
        summary.push_str(&conflict.message);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use excise_model::ElementId;
    use expect_test::expect;

    #[test]
    fn conflicts_error_lists_messages() {
        let err = SafeDeleteError::Conflicts {
            conflicts: vec![
                Conflict::error(ElementId(1), "Field `A.x` has 1 usage that is not safe to delete."),
                Conflict::warning(ElementId(2), "Method `A.run` overrides a kept method."),
            ],
            usages: Vec::new(),
        };
        expect![[r#"
            safe delete found 2 conflicts
              Field `A.x` has 1 usage that is not safe to delete.
              Method `A.run` overrides a kept method."#]]
        .assert_eq(&err.to_string());
    }

    #[test]
    fn invalid_element_names_the_symbol() {
        let err = SafeDeleteError::InvalidElement {
            name: "field `A.x`".to_string(),
            reason: InvalidReason::NotPhysical,
        };
        assert_eq!(
            err.to_string(),
            "cannot safely delete field `A.x`: it is not a physical element"
        );
    }
}
