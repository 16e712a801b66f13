//! Model and editor errors.

use thiserror::Error;

use crate::element::ElementId;

/// Errors raised while loading or validating a workspace snapshot.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Snapshot JSON could not be parsed or produced.
    #[error("invalid workspace snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot I/O failed.
    #[error("failed to access workspace snapshot: {0}")]
    Io(#[from] std::io::Error),

    /// An element links to a slot that does not exist.
    #[error("element {element} links to missing element {missing} via `{link}`")]
    DanglingLink {
        /// The element holding the link.
        element: u32,
        /// The missing target.
        missing: u32,
        /// Name of the link field.
        link: &'static str,
    },

    /// Parent and child links disagree.
    #[error("element {child} lists parent {parent} but is not among its children")]
    InconsistentParent {
        /// Child element.
        child: u32,
        /// Claimed parent.
        parent: u32,
    },

    /// Following parent links from an element leads back to a visited one.
    #[error("element {element} is its own ancestor")]
    ParentCycle {
        /// Element whose parent chain loops.
        element: u32,
    },
}

/// Failure while rewriting a usage site or deleting an element.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralEditError {
    /// The element was deleted or re-parsed since it was found.
    #[error("{description} is no longer valid")]
    InvalidTarget {
        /// The stale element.
        element: ElementId,
        /// Human readable description captured before the failure.
        description: String,
    },

    /// The element is synthetic or otherwise cannot be removed.
    #[error("cannot delete {description}: {reason}")]
    NotDeletable {
        /// Human readable description.
        description: String,
        /// Why deletion was refused.
        reason: String,
    },

    /// A delegate-owned rewrite could not be applied.
    #[error("cannot update {description}: {reason}")]
    RewriteFailed {
        /// Human readable description of the usage site.
        description: String,
        /// Why the rewrite failed.
        reason: String,
    },
}

impl StructuralEditError {
    /// Convenience constructor for stale elements.
    pub fn invalid(element: ElementId) -> Self {
        Self::InvalidTarget {
            element,
            description: format!("element #{}", element.0),
        }
    }
}
