//! Usage records produced by the collector.

use std::fmt;
use std::sync::Arc;

use indexmap::map::Entry;
use indexmap::IndexMap;
use text_size::TextRange;

use excise_model::{CodeModel, DescriptionLocation, ElementId, ModelEditor, StructuralEditError};

/// A delegate-owned rewrite applied to a usage site before deletion.
pub trait UsageRewrite: fmt::Debug + Send + Sync {
    /// Short description for logs and reports.
    fn describe(&self) -> String;

    /// Applies the rewrite.
    fn perform(&self, editor: &mut dyn ModelEditor) -> Result<(), StructuralEditError>;
}

/// A code reference to a symbol in the deletion set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceUsage {
    /// The referencing element.
    pub element: ElementId,
    /// The symbol being deleted.
    pub referenced: ElementId,
    /// True when the reference disappears together with the deletion set.
    pub safe_delete: bool,
}

/// A textual occurrence in a comment, string literal or non-source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NonCodeUsage {
    /// Smallest element containing the occurrence.
    pub element: ElementId,
    /// The symbol being deleted.
    pub referenced: ElementId,
    /// Occurrence offsets relative to `element`.
    pub range: TextRange,
}

/// A usage whose site is rewritten by a delegate during execution.
#[derive(Debug, Clone)]
pub struct CustomUsage {
    /// The usage site.
    pub element: ElementId,
    /// The symbol being deleted.
    pub referenced: ElementId,
    /// The rewrite to perform.
    pub rewrite: Arc<dyn UsageRewrite>,
}

impl CustomUsage {
    /// Creates a custom usage.
    pub fn new(element: ElementId, referenced: ElementId, rewrite: impl UsageRewrite + 'static) -> Self {
        Self {
            element,
            referenced,
            rewrite: Arc::new(rewrite),
        }
    }
}

/// A discovered reference or occurrence relevant to a symbol being deleted.
#[derive(Debug, Clone)]
pub enum UsageInfo {
    /// Code reference.
    Reference(ReferenceUsage),
    /// Informational textual occurrence.
    NonCode(NonCodeUsage),
    /// Delegate-owned usage with its own rewrite.
    Custom(CustomUsage),
}

/// Location + referenced symbol; equal keys collapse during deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct UsageKey {
    element: ElementId,
    range: Option<TextRange>,
    referenced: ElementId,
}

impl UsageInfo {
    /// Unsafe code reference.
    #[must_use]
    pub fn unsafe_reference(element: ElementId, referenced: ElementId) -> Self {
        Self::Reference(ReferenceUsage {
            element,
            referenced,
            safe_delete: false,
        })
    }

    /// Safe code reference.
    #[must_use]
    pub fn safe_reference(element: ElementId, referenced: ElementId) -> Self {
        Self::Reference(ReferenceUsage {
            element,
            referenced,
            safe_delete: true,
        })
    }

    /// The usage site.
    #[must_use]
    pub fn element(&self) -> ElementId {
        match self {
            Self::Reference(usage) => usage.element,
            Self::NonCode(usage) => usage.element,
            Self::Custom(usage) => usage.element,
        }
    }

    /// The symbol this usage refers to.
    #[must_use]
    pub fn referenced(&self) -> ElementId {
        match self {
            Self::Reference(usage) => usage.referenced,
            Self::NonCode(usage) => usage.referenced,
            Self::Custom(usage) => usage.referenced,
        }
    }

    /// Occurrence offsets for non-code usages.
    #[must_use]
    pub fn range(&self) -> Option<TextRange> {
        match self {
            Self::NonCode(usage) => Some(usage.range),
            Self::Reference(_) | Self::Custom(_) => None,
        }
    }

    /// False when deleting the set would leave this usage dangling.
    ///
    /// Non-code occurrences are never safe; custom usages are safe because
    /// their delegate rewrites the site.
    #[must_use]
    pub fn is_safe_delete(&self) -> bool {
        match self {
            Self::Reference(usage) => usage.safe_delete,
            Self::NonCode(_) => false,
            Self::Custom(_) => true,
        }
    }

    /// True for informational textual occurrences.
    #[must_use]
    pub fn is_non_code(&self) -> bool {
        matches!(self, Self::NonCode(_))
    }

    /// Whether the usage site is changed during execution.
    #[must_use]
    pub fn is_to_be_changed(&self) -> bool {
        match self {
            Self::Reference(usage) => usage.safe_delete,
            Self::NonCode(_) => false,
            Self::Custom(_) => true,
        }
    }

    /// One-line description naming the referenced symbol and the
    /// declaration or file containing the usage.
    pub fn describe(&self, model: &dyn CodeModel) -> String {
        let target = model.description(self.referenced(), DescriptionLocation::Usage);
        let site = model
            .ancestor_matching(self.element(), &|kind| kind.is_declaration() || kind.is_file())
            .map_or_else(
                || format!("element #{}", self.element().0),
                |site| model.description(site, DescriptionLocation::Usage),
            );
        match self {
            Self::Reference(usage) if usage.safe_delete => {
                format!("safe reference to {target} in {site}")
            }
            Self::Reference(_) => format!("reference to {target} in {site}"),
            Self::NonCode(usage) => format!(
                "occurrence of {target} in {site} at {}..{}",
                u32::from(usage.range.start()),
                u32::from(usage.range.end())
            ),
            Self::Custom(usage) => format!("{} in {site}", usage.rewrite.describe()),
        }
    }

    fn key(&self) -> UsageKey {
        UsageKey {
            element: self.element(),
            range: self.range(),
            referenced: self.referenced(),
        }
    }

    /// Higher wins when two usages share a key.
    fn specificity(&self) -> u8 {
        match self {
            Self::Custom(_) => 3,
            Self::Reference(usage) if !usage.safe_delete => 2,
            Self::Reference(_) => 1,
            Self::NonCode(_) => 0,
        }
    }
}

/// Collapses usages with the same location and referenced symbol, keeping
/// the first-seen order and the more specific variant.
#[must_use]
pub fn dedup_usages(usages: Vec<UsageInfo>) -> Vec<UsageInfo> {
    let mut unique: IndexMap<UsageKey, UsageInfo> = IndexMap::with_capacity(usages.len());
    for usage in usages {
        match unique.entry(usage.key()) {
            Entry::Occupied(mut slot) => {
                if usage.specificity() > slot.get().specificity() {
                    slot.insert(usage);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(usage);
            }
        }
    }
    unique.into_values().collect()
}

/// Keeps everything except unsafe code references.
#[must_use]
pub fn filter_to_be_deleted(usages: &[UsageInfo]) -> Vec<UsageInfo> {
    usages
        .iter()
        .filter(|usage| !matches!(usage, UsageInfo::Reference(r) if !r.safe_delete))
        .cloned()
        .collect()
}
