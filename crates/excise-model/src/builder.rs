//! Fluent construction of workspaces for fixtures and tests.
//!
//! The builder writes a line of pseudo-source for every element it creates
//! and extends the ranges of enclosing elements, so ranges, pointers and
//! text search behave like they would on a parsed file.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use crate::element::{Element, ElementId, ElementKind};
use crate::workspace::Workspace;

/// Builds a [`Workspace`] element by element.
#[derive(Debug, Default)]
pub struct WorkspaceBuilder {
    workspace: Workspace,
}

impl WorkspaceBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the workspace built so far.
    #[must_use]
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Finishes building.
    #[must_use]
    pub fn finish(self) -> Workspace {
        self.workspace
    }

    /// Adds a directory.
    pub fn directory(&mut self, parent: Option<ElementId>, name: &str) -> ElementId {
        self.container(ElementKind::Directory, parent, name, None)
    }

    /// Adds a package backed by the given directories.
    pub fn package(&mut self, name: &str, directories: &[ElementId]) -> ElementId {
        let id = self.container(ElementKind::Package, None, name, None);
        if let Some(element) = self.workspace.get_mut(id) {
            element.directories = directories.to_vec();
        }
        id
    }

    /// Adds an empty source file; declarations appended below it write its text.
    pub fn source_file(&mut self, parent: Option<ElementId>, name: &str) -> ElementId {
        self.container(ElementKind::SourceFile, parent, name, Some(String::new()))
    }

    /// Adds a non-source file with fixed content.
    pub fn text_file(&mut self, parent: Option<ElementId>, name: &str, content: &str) -> ElementId {
        let id = self.container(ElementKind::TextFile, parent, name, Some(content.to_string()));
        if let Some(element) = self.workspace.get_mut(id) {
            element.range = TextRange::up_to(TextSize::of(content));
        }
        id
    }

    /// Adds a class.
    pub fn class(&mut self, parent: ElementId, name: &str) -> ElementId {
        self.declaration(ElementKind::Class, parent, name)
    }

    /// Adds an interface.
    pub fn interface(&mut self, parent: ElementId, name: &str) -> ElementId {
        self.declaration(ElementKind::Interface, parent, name)
    }

    /// Adds a method.
    pub fn method(&mut self, parent: ElementId, name: &str) -> ElementId {
        self.declaration(ElementKind::Method, parent, name)
    }

    /// Adds a constructor.
    pub fn constructor(&mut self, parent: ElementId, name: &str) -> ElementId {
        self.declaration(ElementKind::Constructor, parent, name)
    }

    /// Adds a field.
    pub fn field(&mut self, parent: ElementId, name: &str) -> ElementId {
        self.declaration(ElementKind::Field, parent, name)
    }

    /// Adds a parameter.
    pub fn parameter(&mut self, method: ElementId, name: &str) -> ElementId {
        self.declaration(ElementKind::Parameter, method, name)
    }

    /// Adds a local variable.
    pub fn variable(&mut self, parent: ElementId, name: &str) -> ElementId {
        self.declaration(ElementKind::Variable, parent, name)
    }

    /// Adds a reference to `target`.
    pub fn reference(&mut self, parent: ElementId, target: ElementId) -> ElementId {
        let text = self.workspace.get(target).and_then(|t| t.name.clone()).unwrap_or_default();
        let id = self.leaf(ElementKind::Reference, Some(parent), &text);
        if let Some(element) = self.workspace.get_mut(id) {
            element.target = Some(target);
        }
        id
    }

    /// Adds a call of `method`; arguments are added with [`Self::argument`].
    pub fn call(&mut self, parent: ElementId, method: ElementId) -> ElementId {
        let name = self.workspace.get(method).and_then(|t| t.name.clone()).unwrap_or_default();
        let id = self.leaf(ElementKind::Call, Some(parent), &format!("{name}()"));
        if let Some(element) = self.workspace.get_mut(id) {
            element.target = Some(method);
        }
        id
    }

    /// Adds an argument to a call.
    pub fn argument(&mut self, call: ElementId, text: &str) -> ElementId {
        self.leaf(ElementKind::Argument, Some(call), text)
    }

    /// Adds a comment.
    pub fn comment(&mut self, parent: ElementId, text: &str) -> ElementId {
        self.leaf(ElementKind::Comment, Some(parent), text)
    }

    /// Adds a string literal.
    pub fn string_literal(&mut self, parent: ElementId, text: &str) -> ElementId {
        self.leaf(ElementKind::StringLiteral, Some(parent), text)
    }

    /// Adds a bare identifier token.
    pub fn identifier(&mut self, parent: ElementId, text: &str) -> ElementId {
        self.leaf(ElementKind::Identifier, Some(parent), text)
    }

    /// Adds a structural block. Blocks without a parent model injected
    /// fragments and carry no file text.
    pub fn block(&mut self, parent: Option<ElementId>, label: &str) -> ElementId {
        self.leaf(ElementKind::Block, parent, label)
    }

    /// Points a declaration at a (possibly detached) name token.
    pub fn set_name_identifier(&mut self, declaration: ElementId, identifier: ElementId) {
        if let Some(element) = self.workspace.get_mut(declaration) {
            element.name_identifier = Some(identifier);
        }
    }

    /// Marks `fragment` as injected into `host`.
    pub fn set_injection_host(&mut self, fragment: ElementId, host: ElementId) {
        if let Some(element) = self.workspace.get_mut(fragment) {
            element.injection_host = Some(host);
        }
    }

    /// Records that `method` overrides or implements `super_method`.
    pub fn set_overrides(&mut self, method: ElementId, super_method: ElementId) {
        if let Some(element) = self.workspace.get_mut(method) {
            element.overrides = Some(super_method);
        }
    }

    /// Makes `a` and `b` share one file view.
    pub fn link_files(&mut self, a: ElementId, b: ElementId) {
        if let Some(element) = self.workspace.get_mut(a) {
            element.linked_files.push(b);
        }
        if let Some(element) = self.workspace.get_mut(b) {
            element.linked_files.push(a);
        }
    }

    /// Marks an element as synthetic or physical.
    pub fn set_physical(&mut self, id: ElementId, physical: bool) {
        if let Some(element) = self.workspace.get_mut(id) {
            element.physical = physical;
        }
    }

    fn container(
        &mut self,
        kind: ElementKind,
        parent: Option<ElementId>,
        name: &str,
        text: Option<String>,
    ) -> ElementId {
        let mut element = Element::new(kind, Some(SmolStr::new(name)));
        element.parent = parent;
        element.text = text;
        self.workspace.insert(element)
    }

    fn declaration(&mut self, kind: ElementKind, parent: ElementId, name: &str) -> ElementId {
        let header = format!("{} {name}", kind.display_name());
        let range = self.append(Some(parent), &header);
        let mut element = Element::new(kind, Some(SmolStr::new(name)));
        element.parent = Some(parent);
        element.range = range;
        let id = self.workspace.insert(element);

        let name_start = range.end() - TextSize::of(name);
        let mut ident = Element::new(ElementKind::Identifier, None);
        ident.parent = Some(id);
        ident.range = TextRange::new(name_start, range.end());
        let ident_id = self.workspace.insert(ident);
        self.set_name_identifier(id, ident_id);
        id
    }

    fn leaf(&mut self, kind: ElementKind, parent: Option<ElementId>, text: &str) -> ElementId {
        let range = self.append(parent, text);
        let mut element = Element::new(kind, None);
        element.parent = parent;
        element.range = range;
        self.workspace.insert(element)
    }

    /// Appends a line of text to the file containing `parent` and widens the
    /// ranges of every enclosing element below the file.
    fn append(&mut self, parent: Option<ElementId>, text: &str) -> TextRange {
        let Some(parent) = parent else {
            return TextRange::default();
        };
        let Some(file) = self.workspace.file_of(parent) else {
            return TextRange::default();
        };
        let Some(buffer) = self.workspace.get_mut(file).and_then(|f| f.text.as_mut()) else {
            return TextRange::default();
        };
        let start = TextSize::of(buffer.as_str());
        buffer.push_str(text);
        buffer.push('\n');
        let file_len = TextSize::of(buffer.as_str());
        let range = TextRange::at(start, TextSize::of(text));

        if let Some(file_el) = self.workspace.get_mut(file) {
            file_el.range = TextRange::up_to(file_len);
        }
        let mut current = Some(parent);
        while let Some(node) = current {
            if node == file {
                break;
            }
            let Some(element) = self.workspace.get_mut(node) else {
                break;
            };
            element.range = element.range.cover(range);
            current = element.parent;
        }
        range
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::CodeModel;
    use expect_test::expect;

    #[test]
    fn builder_writes_pseudo_source() {
        let mut b = WorkspaceBuilder::new();
        let file = b.source_file(None, "Counter.java");
        let class = b.class(file, "Counter");
        let field = b.field(class, "count");
        let method = b.method(class, "increment");
        b.reference(method, field);
        b.string_literal(method, "\"count\"");
        let ws = b.finish();

        expect![[r#"
            class Counter
            field count
            method increment
            count
            "count"
        "#]]
        .assert_eq(ws.get(file).and_then(|f| f.text.as_deref()).unwrap());
        assert_eq!(ws.element_text(field), Some("field count"));
        let ident = ws.name_identifier(field).unwrap();
        assert_eq!(ws.element_text(ident), Some("count"));
        assert!(ws.is_ancestor(class, ident, true));
    }

    #[test]
    fn enclosing_ranges_cover_children() {
        let mut b = WorkspaceBuilder::new();
        let file = b.source_file(None, "A.java");
        let class = b.class(file, "A");
        let method = b.method(class, "run");
        let comment = b.comment(method, "// run it");
        let ws = b.finish();
        let class_range = ws.range(class).unwrap();
        assert!(class_range.contains_range(ws.range(method).unwrap()));
        assert!(class_range.contains_range(ws.range(comment).unwrap()));
    }
}
