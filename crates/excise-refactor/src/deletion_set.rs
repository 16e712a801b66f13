//! The closure of symbols removed by one Safe Delete invocation.

use indexmap::IndexSet;

use excise_model::{CodeModel, ElementId};

/// Deduplicated, ancestor-filtered set of symbols to delete.
///
/// `members` keeps every symbol in registration order (all of them are
/// deleted); `roots` drops members whose container is also a member and is
/// what containment checks run against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionSet {
    members: IndexSet<ElementId>,
    roots: Vec<ElementId>,
}

impl DeletionSet {
    /// Builds the set from an ordered list of symbols.
    pub fn new(model: &dyn CodeModel, elements: impl IntoIterator<Item = ElementId>) -> Self {
        let members: IndexSet<ElementId> = elements.into_iter().collect();
        let roots = members
            .iter()
            .copied()
            .filter(|&candidate| {
                !members
                    .iter()
                    .any(|&other| other != candidate && model.is_ancestor(other, candidate, true))
            })
            .collect();
        Self { members, roots }
    }

    /// All symbols in registration order.
    pub fn members(&self) -> impl ExactSizeIterator<Item = ElementId> + '_ {
        self.members.iter().copied()
    }

    /// Members as a vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<ElementId> {
        self.members.iter().copied().collect()
    }

    /// Members not contained in another member.
    #[must_use]
    pub fn roots(&self) -> &[ElementId] {
        &self.roots
    }

    /// Returns true if `element` is a member.
    #[must_use]
    pub fn contains(&self, element: ElementId) -> bool {
        self.members.contains(&element)
    }

    /// Returns true if `element` is a member that lives inside another member.
    #[must_use]
    pub fn is_covered(&self, element: ElementId) -> bool {
        self.contains(element) && !self.roots.contains(&element)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true if there is nothing to delete.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use excise_model::WorkspaceBuilder;

    #[test]
    fn deduplicates_and_filters_nested_members() {
        let mut b = WorkspaceBuilder::new();
        let file = b.source_file(None, "A.java");
        let class = b.class(file, "A");
        let field = b.field(class, "x");
        let other = b.class(file, "B");
        let ws = b.finish();

        let set = DeletionSet::new(&ws, [field, class, field, other]);
        assert_eq!(set.to_vec(), vec![field, class, other]);
        assert_eq!(set.roots(), &[class, other]);
        assert!(set.is_covered(field));
        assert!(!set.is_covered(class));
        assert!(!set.is_covered(ElementId(999)));
    }
}
