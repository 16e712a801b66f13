//! Element arena types.
//!
//! Every addressable node of the code model (directories, files,
//! declarations, references, comments) is an [`Element`] identified by an
//! [`ElementId`].

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use text_size::TextRange;

/// A unique identifier for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u32);

impl ElementId {
    /// Index into the element arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The kind of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// A directory on disk.
    Directory,
    /// A package spanning one or more directories.
    Package,
    /// A file parsed by the analysis engine.
    SourceFile,
    /// A plain text file (configs, docs, manifests).
    TextFile,
    /// A class declaration.
    Class,
    /// An interface declaration.
    Interface,
    /// A method declaration.
    Method,
    /// A constructor declaration.
    Constructor,
    /// A field declaration.
    Field,
    /// A method or constructor parameter.
    Parameter,
    /// A local variable.
    Variable,
    /// A plain reference to a declaration.
    Reference,
    /// A call expression; its target is the invoked method.
    Call,
    /// A call argument.
    Argument,
    /// A comment.
    Comment,
    /// A string literal.
    StringLiteral,
    /// A name token.
    Identifier,
    /// Any other structural node (bodies, parameter lists, injected fragments).
    Block,
}

impl ElementKind {
    /// Returns true for file kinds.
    #[must_use]
    pub fn is_file(self) -> bool {
        matches!(self, Self::SourceFile | Self::TextFile)
    }

    /// Returns true for kinds that declare a named program entity.
    #[must_use]
    pub fn is_declaration(self) -> bool {
        matches!(
            self,
            Self::Package
                | Self::Class
                | Self::Interface
                | Self::Method
                | Self::Constructor
                | Self::Field
                | Self::Parameter
                | Self::Variable
        )
    }

    /// Returns true for kinds whose text is scanned for non-code occurrences.
    #[must_use]
    pub fn is_text_carrier(self) -> bool {
        matches!(self, Self::Comment | Self::StringLiteral)
    }

    /// Returns true for kinds that point at another element.
    #[must_use]
    pub fn is_reference(self) -> bool {
        matches!(self, Self::Reference | Self::Call)
    }

    /// Returns true for callable declarations.
    #[must_use]
    pub fn is_callable(self) -> bool {
        matches!(self, Self::Method | Self::Constructor)
    }

    /// Human readable kind name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Package => "package",
            Self::SourceFile | Self::TextFile => "file",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Method => "method",
            Self::Constructor => "constructor",
            Self::Field => "field",
            Self::Parameter => "parameter",
            Self::Variable => "variable",
            Self::Reference => "reference",
            Self::Call => "call",
            Self::Argument => "argument",
            Self::Comment => "comment",
            Self::StringLiteral => "string literal",
            Self::Identifier => "identifier",
            Self::Block => "block",
        }
    }
}

fn default_physical() -> bool {
    true
}

/// A node of the code model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Element kind.
    pub kind: ElementKind,
    /// Declared name (declarations, files, directories).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<SmolStr>,
    /// Syntactic parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ElementId>,
    /// Syntactic children in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementId>,
    /// Range within the containing file's text.
    #[serde(default)]
    pub range: TextRange,
    /// Full text (files only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Name token of a declaration; may live outside the declaration subtree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_identifier: Option<ElementId>,
    /// Host element for injected fragments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injection_host: Option<ElementId>,
    /// Resolved target for references and calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ElementId>,
    /// Overridden or implemented super method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ElementId>,
    /// Directories backing a package.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directories: Vec<ElementId>,
    /// Other files sharing this file's view (multi-language files).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_files: Vec<ElementId>,
    /// False for synthetic elements that do not exist on disk.
    #[serde(default = "default_physical")]
    pub physical: bool,
}

impl Element {
    /// Creates a physical element with the given kind and optional name.
    #[must_use]
    pub fn new(kind: ElementKind, name: Option<SmolStr>) -> Self {
        Self {
            kind,
            name,
            parent: None,
            children: Vec::new(),
            range: TextRange::default(),
            text: None,
            name_identifier: None,
            injection_host: None,
            target: None,
            overrides: None,
            directories: Vec::new(),
            linked_files: Vec::new(),
            physical: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_kinds_exclude_references_and_text() {
        assert!(ElementKind::Field.is_declaration());
        assert!(ElementKind::Parameter.is_declaration());
        assert!(!ElementKind::Reference.is_declaration());
        assert!(!ElementKind::Comment.is_declaration());
        assert!(!ElementKind::SourceFile.is_declaration());
    }

    #[test]
    fn element_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ElementKind::StringLiteral).unwrap();
        assert_eq!(json, "\"string_literal\"");
        let kind: ElementKind = serde_json::from_str("\"text_file\"").unwrap();
        assert_eq!(kind, ElementKind::TextFile);
    }

    #[test]
    fn element_defaults_to_physical_when_deserialized() {
        let element: Element = serde_json::from_str(r#"{"kind":"field","name":"x"}"#).unwrap();
        assert!(element.physical);
        assert_eq!(element.name.as_deref(), Some("x"));
    }
}
