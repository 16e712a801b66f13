//! Structural element pointers.
//!
//! Element ids are only stable while the model is unchanged. A
//! [`SymbolPointer`] captures an element by where it lives and what it is, so
//! it can be resolved again after edits or a snapshot reload.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use text_size::TextRange;

use crate::element::ElementKind;

/// Structural identity of an element: file path, range and kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolPointer {
    /// Path of the containing file or directory (the element's own path for
    /// files and directories; absent for packages).
    pub path: Option<String>,
    /// Range within the containing file.
    pub range: TextRange,
    /// Element kind.
    pub kind: ElementKind,
    /// Declared name.
    pub name: Option<SmolStr>,
}

impl fmt::Display for SymbolPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.display_name())?;
        if let Some(name) = &self.name {
            write!(f, " {name}")?;
        }
        if let Some(path) = &self.path {
            write!(
                f,
                " ({path}@{}..{})",
                u32::from(self.range.start()),
                u32::from(self.range.end())
            )?;
        }
        Ok(())
    }
}
