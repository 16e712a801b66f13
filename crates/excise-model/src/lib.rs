//! `excise-model` - Code model consumed by the excise safe-delete engine.
//!
//! This crate defines the boundary between the refactoring engine and the
//! language-analysis side of the world:
//!
//! - **Elements**: Addressable program entities stored in an arena
//! - **Provider**: Reference search and free-text occurrence search
//! - **Editor**: Structural mutation (deleting elements, unlinking hierarchies)
//! - **Pointers**: Structural identities that survive re-resolution
//! - **Workspace**: An in-memory model implementing all of the above
//!
//! # Architecture
//!
//! The engine only talks to [`CodeModel`] and [`ModelEditor`]. The bundled
//! [`Workspace`] is a complete implementation backed by JSON snapshots, used
//! by the `excise` binary and by the test suites.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod builder;
pub mod element;
pub mod error;
pub mod pointer;
pub mod progress;
pub mod provider;
pub mod search;
pub mod workspace;

pub use builder::WorkspaceBuilder;
pub use element::{Element, ElementId, ElementKind};
pub use error::{ModelError, StructuralEditError};
pub use pointer::SymbolPointer;
pub use progress::{Cancelled, ProgressSource, ProgressTicket};
pub use provider::{
    CodeModel, DescriptionLocation, ModelEditor, Occurrence, Reference, TextSearchScope,
};
pub use workspace::Workspace;
