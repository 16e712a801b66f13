//! In-memory code model.
//!
//! [`Workspace`] stores elements in an arena of slots. Deleting an element
//! empties its slot (and the slots of its subtree) so ids held by stale
//! usages stop resolving instead of pointing at unrelated elements.

use std::path::Path;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use text_size::TextRange;
use tracing::{debug, warn};

use crate::element::{Element, ElementId, ElementKind};
use crate::error::{ModelError, StructuralEditError};
use crate::pointer::SymbolPointer;
use crate::progress::{Cancelled, ProgressTicket};
use crate::provider::{
    CodeModel, DescriptionLocation, ModelEditor, Occurrence, Reference, TextSearchScope,
};
use crate::search::word_occurrences;

/// How many elements are scanned between cancellation checks.
const CANCEL_CHECK_INTERVAL: usize = 256;

#[derive(Debug, Clone)]
struct PendingCommand {
    name: String,
    snapshot: Vec<Option<Element>>,
}

/// An in-memory code model loaded from or saved to a JSON snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(default)]
    elements: Vec<Option<Element>>,
    #[serde(skip)]
    revision: u64,
    #[serde(skip)]
    pending: Option<PendingCommand>,
}

impl Workspace {
    /// Creates an empty workspace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON snapshot.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let workspace: Workspace = serde_json::from_str(json)?;
        workspace.validate()?;
        Ok(workspace)
    }

    /// Serializes the workspace as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads a snapshot from disk.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Writes the snapshot to disk.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Inserts an element, attaching it to its parent's children.
    pub fn insert(&mut self, element: Element) -> ElementId {
        let id = ElementId(self.elements.len() as u32);
        if let Some(parent) = element.parent {
            if let Some(Some(parent_element)) = self.elements.get_mut(parent.index()) {
                parent_element.children.push(id);
            }
        }
        self.elements.push(Some(element));
        self.revision += 1;
        id
    }

    /// Returns the element for an id if it is still valid.
    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Iterates over all valid elements.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|el| (ElementId(index as u32), el)))
    }

    /// Number of valid elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns true if the workspace has no valid elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Modification counter, bumped by every edit.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the file containing `id` (inclusive).
    #[must_use]
    pub fn file_of(&self, id: ElementId) -> Option<ElementId> {
        self.ancestor_matching(id, &ElementKind::is_file)
    }

    /// Slash-separated path of a file or directory.
    #[must_use]
    pub fn path(&self, id: ElementId) -> Option<String> {
        let element = self.get(id)?;
        if !(element.kind.is_file() || element.kind == ElementKind::Directory) {
            return None;
        }
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            let el = self.get(node)?;
            if el.kind.is_file() || el.kind == ElementKind::Directory {
                parts.push(el.name.clone().unwrap_or_default());
            }
            current = el.parent;
        }
        parts.reverse();
        Some(parts.join("/"))
    }

    /// Dot-separated name built from declaration ancestors.
    #[must_use]
    pub fn qualified_name(&self, id: ElementId) -> Option<String> {
        let mut parts: Vec<SmolStr> = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            let el = self.get(node)?;
            if el.kind.is_declaration() {
                if let Some(name) = &el.name {
                    parts.push(name.clone());
                }
            }
            current = el.parent;
        }
        if parts.is_empty() {
            return None;
        }
        parts.reverse();
        Some(parts.join("."))
    }

    /// Finds elements by path (`src/Counter.java`) or qualified name
    /// (`Counter.count`).
    #[must_use]
    pub fn lookup(&self, query: &str) -> Vec<ElementId> {
        self.iter()
            .filter(|(id, element)| {
                if element.kind.is_file() || element.kind == ElementKind::Directory {
                    self.path(*id).as_deref() == Some(query)
                } else if element.kind.is_declaration() {
                    self.qualified_name(*id).as_deref() == Some(query)
                } else {
                    false
                }
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Returns the element's range within its file.
    #[must_use]
    pub fn range(&self, id: ElementId) -> Option<TextRange> {
        self.get(id).map(|el| el.range)
    }

    /// Text covered by an element, taken from its file.
    #[must_use]
    pub fn element_text(&self, id: ElementId) -> Option<&str> {
        let file = self.file_of(id)?;
        let text = self.get(file)?.text.as_deref()?;
        if file == id {
            return Some(text);
        }
        let range = self.get(id)?.range;
        text.get(std::ops::Range::<usize>::from(range))
    }

    /// Checks parent/child consistency, link bounds and that no parent chain
    /// loops back on itself.
    pub fn validate(&self) -> Result<(), ModelError> {
        let slots = self.elements.len();
        let in_bounds = |element: ElementId, missing: ElementId, link: &'static str| {
            if missing.index() < slots {
                Ok(())
            } else {
                Err(ModelError::DanglingLink {
                    element: element.0,
                    missing: missing.0,
                    link,
                })
            }
        };
        for (id, element) in self.iter() {
            if let Some(parent) = element.parent {
                in_bounds(id, parent, "parent")?;
                let listed = self
                    .get(parent)
                    .is_some_and(|parent_el| parent_el.children.contains(&id));
                if !listed {
                    return Err(ModelError::InconsistentParent {
                        child: id.0,
                        parent: parent.0,
                    });
                }
            }
            for &child in &element.children {
                in_bounds(id, child, "children")?;
            }
            let optional_links = [
                (element.target, "target"),
                (element.overrides, "overrides"),
                (element.name_identifier, "name_identifier"),
                (element.injection_host, "injection_host"),
            ];
            for (link, name) in optional_links {
                if let Some(other) = link {
                    in_bounds(id, other, name)?;
                }
            }
            for &dir in &element.directories {
                in_bounds(id, dir, "directories")?;
            }
            for &file in &element.linked_files {
                in_bounds(id, file, "linked_files")?;
            }
        }
        for (id, _) in self.iter() {
            let mut seen = FxHashSet::default();
            let mut current = Some(id);
            while let Some(element) = current {
                if !seen.insert(element) {
                    return Err(ModelError::ParentCycle { element: id.0 });
                }
                current = self.get(element).and_then(|el| el.parent);
            }
        }
        Ok(())
    }

    /// Runs `edit` as one command, rolling back every edit if it fails.
    pub fn transaction<T>(
        &mut self,
        name: &str,
        edit: impl FnOnce(&mut Self) -> Result<T, StructuralEditError>,
    ) -> Result<T, StructuralEditError> {
        self.begin_command(name);
        let result = edit(self);
        self.finish_command(result.is_ok());
        result
    }

    fn subtree(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if let Some(element) = self.get(node) {
                out.push(node);
                stack.extend(element.children.iter().copied());
            }
        }
        out
    }

    fn stale(&self, element: ElementId) -> StructuralEditError {
        StructuralEditError::invalid(element)
    }
}

impl CodeModel for Workspace {
    fn is_valid(&self, element: ElementId) -> bool {
        self.get(element).is_some()
    }

    fn kind(&self, element: ElementId) -> Option<ElementKind> {
        self.get(element).map(|el| el.kind)
    }

    fn name(&self, element: ElementId) -> Option<SmolStr> {
        self.get(element).and_then(|el| el.name.clone())
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.get(element).and_then(|el| el.parent)
    }

    fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.get(element)
            .map(|el| {
                el.children
                    .iter()
                    .copied()
                    .filter(|child| self.is_valid(*child))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn name_identifier(&self, element: ElementId) -> Option<ElementId> {
        self.get(element)
            .and_then(|el| el.name_identifier)
            .filter(|id| self.is_valid(*id))
    }

    fn injection_host(&self, place: ElementId) -> Option<ElementId> {
        let mut current = Some(place);
        while let Some(node) = current {
            let element = self.get(node)?;
            if let Some(host) = element.injection_host {
                return self.is_valid(host).then_some(host);
            }
            current = element.parent;
        }
        None
    }

    fn directories(&self, container: ElementId) -> Vec<ElementId> {
        match self.get(container) {
            Some(el) if el.kind == ElementKind::Package => el
                .directories
                .iter()
                .copied()
                .filter(|dir| self.is_valid(*dir))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn view_files(&self, file: ElementId) -> Vec<ElementId> {
        match self.get(file) {
            Some(el) if el.kind.is_file() => std::iter::once(file)
                .chain(
                    el.linked_files
                        .iter()
                        .copied()
                        .filter(|linked| self.is_valid(*linked)),
                )
                .collect(),
            _ => Vec::new(),
        }
    }

    fn is_physical(&self, element: ElementId) -> bool {
        self.get(element).is_some_and(|el| el.physical)
    }

    fn safe_delete_available(&self, element: ElementId) -> bool {
        self.get(element).is_some_and(|el| {
            el.kind.is_declaration() || el.kind.is_file() || el.kind == ElementKind::Directory
        })
    }

    fn overridden(&self, method: ElementId) -> Option<ElementId> {
        self.get(method)
            .and_then(|el| el.overrides)
            .filter(|id| self.is_valid(*id))
    }

    fn description(&self, element: ElementId, location: DescriptionLocation) -> String {
        let Some(el) = self.get(element) else {
            return String::new();
        };
        let short = el.name.as_ref().map(ToString::to_string).unwrap_or_default();
        match location {
            DescriptionLocation::StringsAndComments => short,
            DescriptionLocation::NonSource => match el.kind {
                ElementKind::Class | ElementKind::Interface | ElementKind::Package => {
                    self.qualified_name(element).unwrap_or(short)
                }
                _ => short,
            },
            DescriptionLocation::Usage => {
                let label = if el.kind.is_file() || el.kind == ElementKind::Directory {
                    self.path(element)
                } else {
                    self.qualified_name(element)
                };
                let label = label.unwrap_or_else(|| format!("#{}", element.0));
                format!("{} `{label}`", el.kind.display_name())
            }
        }
    }

    fn pointer(&self, element: ElementId) -> Option<SymbolPointer> {
        let el = self.get(element)?;
        let path = if el.kind == ElementKind::Directory {
            self.path(element)
        } else {
            self.file_of(element).and_then(|file| self.path(file))
        };
        Some(SymbolPointer {
            path,
            range: el.range,
            kind: el.kind,
            name: el.name.clone(),
        })
    }

    fn resolve(&self, pointer: &SymbolPointer) -> Option<ElementId> {
        self.iter()
            .filter(|(_, el)| {
                el.kind == pointer.kind && el.name == pointer.name && el.range == pointer.range
            })
            .map(|(id, _)| id)
            .find(|id| self.pointer(*id).as_ref() == Some(pointer))
    }

    fn find_references(
        &self,
        element: ElementId,
        ticket: &ProgressTicket,
    ) -> Result<Vec<Reference>, Cancelled> {
        if !self.is_valid(element) {
            return Ok(Vec::new());
        }
        let mut references = Vec::new();
        for (scanned, (id, el)) in self.iter().enumerate() {
            if scanned % CANCEL_CHECK_INTERVAL == 0 {
                ticket.check()?;
            }
            if el.kind.is_reference() && el.target == Some(element) {
                references.push(Reference {
                    element: id,
                    target: element,
                });
            }
        }
        Ok(references)
    }

    fn find_overriders(
        &self,
        method: ElementId,
        ticket: &ProgressTicket,
    ) -> Result<Vec<ElementId>, Cancelled> {
        if !self.is_valid(method) {
            return Ok(Vec::new());
        }
        let mut overriders = Vec::new();
        for (scanned, (id, el)) in self.iter().enumerate() {
            if scanned % CANCEL_CHECK_INTERVAL == 0 {
                ticket.check()?;
            }
            if el.overrides == Some(method) {
                overriders.push(id);
            }
        }
        Ok(overriders)
    }

    fn search_text_occurrences(
        &self,
        text: &str,
        scope: TextSearchScope,
        ticket: &ProgressTicket,
    ) -> Result<Vec<Occurrence>, Cancelled> {
        let mut occurrences = Vec::new();
        if text.is_empty() {
            return Ok(occurrences);
        }
        for (scanned, (id, el)) in self.iter().enumerate() {
            if scanned % CANCEL_CHECK_INTERVAL == 0 {
                ticket.check()?;
            }
            let eligible = match scope {
                TextSearchScope::CommentsAndStrings => {
                    el.kind.is_text_carrier()
                        && self
                            .file_of(id)
                            .and_then(|file| self.kind(file))
                            .is_some_and(|kind| kind == ElementKind::SourceFile)
                }
                TextSearchScope::NonSource => el.kind == ElementKind::TextFile,
            };
            if !eligible {
                continue;
            }
            let Some(haystack) = self.element_text(id) else {
                continue;
            };
            occurrences.extend(
                word_occurrences(haystack, text)
                    .into_iter()
                    .map(|range| Occurrence { element: id, range }),
            );
        }
        Ok(occurrences)
    }
}

impl ModelEditor for Workspace {
    fn delete(&mut self, element: ElementId) -> Result<(), StructuralEditError> {
        let Some(el) = self.get(element) else {
            return Err(self.stale(element));
        };
        if !el.physical {
            return Err(StructuralEditError::NotDeletable {
                description: self.description(element, DescriptionLocation::Usage),
                reason: "element is not physical".to_string(),
            });
        }
        let parent = el.parent;
        let doomed = self.subtree(element);
        debug!(
            element = element.0,
            removed = doomed.len(),
            "deleting element subtree"
        );
        if let Some(parent) = parent {
            if let Some(parent_el) = self.get_mut(parent) {
                parent_el.children.retain(|child| *child != element);
            }
        }
        let doomed: FxHashSet<ElementId> = doomed.into_iter().collect();
        for id in &doomed {
            if let Some(slot) = self.elements.get_mut(id.index()) {
                *slot = None;
            }
        }
        self.revision += 1;
        Ok(())
    }

    fn unlink_overriders(&mut self, method: ElementId) -> Result<(), StructuralEditError> {
        if !self.is_valid(method) {
            return Err(self.stale(method));
        }
        let mut touched = false;
        for element in self.elements.iter_mut().flatten() {
            if element.overrides == Some(method) {
                element.overrides = None;
                touched = true;
            }
        }
        if touched {
            self.revision += 1;
        }
        Ok(())
    }

    fn begin_command(&mut self, name: &str) {
        if let Some(pending) = &self.pending {
            warn!(
                outer = %pending.name,
                inner = name,
                "nested command; edits join the outer command"
            );
            return;
        }
        self.pending = Some(PendingCommand {
            name: name.to_string(),
            snapshot: self.elements.clone(),
        });
    }

    fn finish_command(&mut self, committed: bool) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if committed {
            debug!(command = %pending.name, "command committed");
        } else {
            debug!(command = %pending.name, "command rolled back");
            self.elements = pending.snapshot;
            self.revision += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::WorkspaceBuilder;

    fn counter() -> (Workspace, ElementId, ElementId, ElementId) {
        let mut b = WorkspaceBuilder::new();
        let src = b.directory(None, "src");
        let file = b.source_file(Some(src), "Counter.java");
        let class = b.class(file, "Counter");
        let field = b.field(class, "count");
        let method = b.method(class, "increment");
        b.reference(method, field);
        b.comment(class, "// count starts at zero");
        (b.finish(), file, class, field)
    }

    #[test]
    fn paths_and_qualified_names() {
        let (ws, file, class, field) = counter();
        assert_eq!(ws.path(file).as_deref(), Some("src/Counter.java"));
        assert_eq!(ws.qualified_name(class).as_deref(), Some("Counter"));
        assert_eq!(ws.qualified_name(field).as_deref(), Some("Counter.count"));
        assert_eq!(ws.lookup("Counter.count"), vec![field]);
        assert_eq!(ws.lookup("src/Counter.java"), vec![file]);
    }

    #[test]
    fn delete_removes_subtree_and_detaches_from_parent() {
        let (mut ws, file, class, field) = counter();
        ws.delete(class).unwrap();
        assert!(!ws.is_valid(class));
        assert!(!ws.is_valid(field));
        assert!(ws.children(file).is_empty());
        assert_eq!(
            ws.delete(class),
            Err(StructuralEditError::invalid(class)),
            "deleting twice reports a stale target"
        );
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let (mut ws, _, class, field) = counter();
        let result = ws.transaction("Deleting field", |ws| {
            ws.delete(field)?;
            ws.delete(field)
        });
        assert!(result.is_err());
        assert!(ws.is_valid(field));
        assert!(ws.is_valid(class));
    }

    #[test]
    fn pointer_resolves_after_unrelated_deletion() {
        let (mut ws, _, class, field) = counter();
        let pointer = ws.pointer(field).unwrap();
        let method = ws.lookup("Counter.increment")[0];
        ws.delete(method).unwrap();
        assert_eq!(ws.resolve(&pointer), Some(field));
        ws.delete(class).unwrap();
        assert_eq!(ws.resolve(&pointer), None);
    }

    #[test]
    fn comment_occurrences_are_relative_to_comment() {
        let (ws, ..) = counter();
        let hits = ws
            .search_text_occurrences(
                "count",
                TextSearchScope::CommentsAndStrings,
                &ProgressTicket::detached(),
            )
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].range, TextRange::new(3.into(), 8.into()));
        assert_eq!(ws.kind(hits[0].element), Some(ElementKind::Comment));
    }

    #[test]
    fn snapshot_round_trip_keeps_tombstones() {
        let (mut ws, _, _, field) = counter();
        ws.delete(field).unwrap();
        let json = ws.to_json().unwrap();
        let loaded = Workspace::from_json(&json).unwrap();
        assert!(!loaded.is_valid(field));
        assert_eq!(loaded.len(), ws.len());
    }

    #[test]
    fn rejects_inconsistent_parent_links() {
        let json = r#"{"elements":[{"kind":"class","name":"A"},{"kind":"field","name":"x","parent":0}]}"#;
        let err = Workspace::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            ModelError::InconsistentParent { child: 1, parent: 0 }
        ));
    }

    #[test]
    fn rejects_parent_cycles() {
        let json = r#"{"elements":[
            {"kind":"class","name":"A","parent":1,"children":[1]},
            {"kind":"class","name":"B","parent":0,"children":[0]}
        ]}"#;
        let err = Workspace::from_json(json).unwrap_err();
        assert!(matches!(err, ModelError::ParentCycle { element: 0 }));
        expect_test::expect!["element 0 is its own ancestor"].assert_eq(&err.to_string());
    }
}
