//! Provider and editor contracts consumed by the refactoring engine.

use smol_str::SmolStr;
use text_size::TextRange;

use crate::element::{ElementId, ElementKind};
use crate::error::StructuralEditError;
use crate::pointer::SymbolPointer;
use crate::progress::{Cancelled, ProgressTicket};

/// A code reference to a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reference {
    /// The referencing element (a reference or call).
    pub element: ElementId,
    /// The referenced declaration.
    pub target: ElementId,
}

/// A free-text occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Occurrence {
    /// Smallest element containing the occurrence.
    pub element: ElementId,
    /// Range relative to the start of `element`.
    pub range: TextRange,
}

/// Where a free-text search looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextSearchScope {
    /// Comments and string literals inside source files.
    CommentsAndStrings,
    /// Whole text of non-source files.
    NonSource,
}

/// Which flavour of element description is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptionLocation {
    /// Search string for comments and string literals (short name).
    StringsAndComments,
    /// Search string for non-source files (qualified name for types).
    NonSource,
    /// User-facing description such as ``field `Counter.count` ``.
    Usage,
}

/// Read-only view of the code model: structure plus search.
pub trait CodeModel {
    /// Returns true if the element still exists.
    fn is_valid(&self, element: ElementId) -> bool;

    /// Returns the element kind.
    fn kind(&self, element: ElementId) -> Option<ElementKind>;

    /// Returns the declared name.
    fn name(&self, element: ElementId) -> Option<SmolStr>;

    /// Returns the syntactic parent.
    fn parent(&self, element: ElementId) -> Option<ElementId>;

    /// Returns the syntactic children in source order.
    fn children(&self, element: ElementId) -> Vec<ElementId>;

    /// Returns the name token of a declaration.
    fn name_identifier(&self, element: ElementId) -> Option<ElementId>;

    /// Returns the injection host of the fragment containing `place`.
    fn injection_host(&self, place: ElementId) -> Option<ElementId>;

    /// Returns the directories backing a directory container (package).
    fn directories(&self, container: ElementId) -> Vec<ElementId>;

    /// Returns every file sharing the view of `file`, including itself.
    fn view_files(&self, file: ElementId) -> Vec<ElementId>;

    /// Returns false for synthetic elements.
    fn is_physical(&self, element: ElementId) -> bool;

    /// Returns true if the element kind supports safe deletion.
    fn safe_delete_available(&self, element: ElementId) -> bool;

    /// Returns the super method a method overrides or implements.
    fn overridden(&self, method: ElementId) -> Option<ElementId>;

    /// Describes an element for search or display.
    fn description(&self, element: ElementId, location: DescriptionLocation) -> String;

    /// Captures a structural pointer to the element.
    fn pointer(&self, element: ElementId) -> Option<SymbolPointer>;

    /// Resolves a structural pointer.
    fn resolve(&self, pointer: &SymbolPointer) -> Option<ElementId>;

    /// Finds every code reference to `element`.
    fn find_references(
        &self,
        element: ElementId,
        ticket: &ProgressTicket,
    ) -> Result<Vec<Reference>, Cancelled>;

    /// Finds methods overriding or implementing `method`.
    fn find_overriders(
        &self,
        method: ElementId,
        ticket: &ProgressTicket,
    ) -> Result<Vec<ElementId>, Cancelled>;

    /// Finds whole-word occurrences of `text` in the given scope.
    fn search_text_occurrences(
        &self,
        text: &str,
        scope: TextSearchScope,
        ticket: &ProgressTicket,
    ) -> Result<Vec<Occurrence>, Cancelled>;

    /// Returns true if `ancestor` is `element` or one of its parents.
    ///
    /// With `strict`, `element` itself does not count.
    fn is_ancestor(&self, ancestor: ElementId, element: ElementId, strict: bool) -> bool {
        let mut current = if strict {
            self.parent(element)
        } else {
            Some(element)
        };
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Returns the nearest ancestor (inclusive) matching `predicate`.
    fn ancestor_matching(
        &self,
        element: ElementId,
        predicate: &dyn Fn(ElementKind) -> bool,
    ) -> Option<ElementId> {
        let mut current = Some(element);
        while let Some(node) = current {
            if self.kind(node).is_some_and(predicate) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }
}

/// Mutating access to the code model.
pub trait ModelEditor: CodeModel {
    /// Deletes an element and its subtree.
    fn delete(&mut self, element: ElementId) -> Result<(), StructuralEditError>;

    /// Clears the `overrides` link of every method overriding `method`.
    fn unlink_overriders(&mut self, method: ElementId) -> Result<(), StructuralEditError>;

    /// Starts a named command. Edits until [`ModelEditor::finish_command`]
    /// form one logical mutation.
    fn begin_command(&mut self, _name: &str) {}

    /// Ends the current command; `committed == false` asks the model to
    /// discard the command's edits if it is able to.
    fn finish_command(&mut self, _committed: bool) {}
}
