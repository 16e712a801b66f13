//! Usage classification and conflict aggregation.

use std::fmt;

use serde::{Deserialize, Serialize};

use excise_model::{CodeModel, DescriptionLocation, ElementId};

use crate::deletion_set::DeletionSet;
use crate::usage::UsageInfo;

/// How serious a conflict is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    /// Deleting leaves something inconsistent but compilable.
    Warning,
    /// Deleting breaks code.
    Error,
}

/// A human-readable reason deletion may be unsafe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// Message shown to the user.
    pub message: String,
    /// Severity.
    pub severity: ConflictSeverity,
    /// The symbol the conflict is about, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementId>,
}

impl Conflict {
    /// An error-severity conflict about `element`.
    pub fn error(element: ElementId, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: ConflictSeverity::Error,
            element: Some(element),
        }
    }

    /// A warning-severity conflict about `element`.
    pub fn warning(element: ElementId, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: ConflictSeverity::Warning,
            element: Some(element),
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Per-symbol tally of usages that would dangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageHolder {
    element: ElementId,
    unsafe_usages: usize,
    non_code_usages: usize,
}

impl UsageHolder {
    /// Counts the usages of `element` that are not safe to delete.
    #[must_use]
    pub fn new(element: ElementId, usages: &[UsageInfo]) -> Self {
        let mut holder = Self {
            element,
            unsafe_usages: 0,
            non_code_usages: 0,
        };
        for usage in usages.iter().filter(|usage| usage.referenced() == element) {
            if usage.is_safe_delete() {
                continue;
            }
            holder.unsafe_usages += 1;
            if usage.is_non_code() {
                holder.non_code_usages += 1;
            }
        }
        holder
    }

    /// The counted symbol.
    #[must_use]
    pub fn element(&self) -> ElementId {
        self.element
    }

    /// Unsafe usages, code and non-code.
    #[must_use]
    pub fn unsafe_usages(&self) -> usize {
        self.unsafe_usages
    }

    /// Unsafe usages found in comments, strings or non-source files.
    #[must_use]
    pub fn non_code_usages(&self) -> usize {
        self.non_code_usages
    }

    /// Conflict message, or `None` when nothing in code would break.
    ///
    /// Textual occurrences alone never produce a conflict; they are shown
    /// in the preview instead.
    #[must_use]
    pub fn description(&self, model: &dyn CodeModel) -> Option<String> {
        if self.unsafe_usages <= self.non_code_usages {
            return None;
        }
        let subject = capitalize(&model.description(self.element, DescriptionLocation::Usage));
        let mut message = format!(
            "{subject} has {} {} not safe to delete.",
            self.unsafe_usages,
            if self.unsafe_usages == 1 {
                "usage that is"
            } else {
                "usages that are"
            }
        );
        if self.non_code_usages > 0 {
            message.push_str(&format!(
                " Of those, {} {} in strings, comments, or non-code files.",
                self.non_code_usages,
                if self.non_code_usages == 1 { "is" } else { "are" }
            ));
        }
        Some(message)
    }
}

/// One conflict per member of `set` whose usages include unsafe code
/// references, in registration order.
#[must_use]
pub fn usage_conflicts(
    model: &dyn CodeModel,
    set: &DeletionSet,
    usages: &[UsageInfo],
) -> Vec<Conflict> {
    set.members()
        .filter_map(|element| {
            UsageHolder::new(element, usages)
                .description(model)
                .map(|message| Conflict::error(element, message))
        })
        .collect()
}

pub(crate) fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
