//! `excise-refactor` - Safe Delete refactoring engine.
//!
//! Given a set of symbols to remove, the engine:
//!
//! - **Expands** the selection through claiming delegates (satellites such as
//!   accessors are added once, before search)
//! - **Collects** code references and non-code occurrences per symbol
//! - **Classifies** each usage as safe (inside the deletion set) or unsafe
//! - **Aggregates** unsafe usages and delegate-reported conflicts
//! - **Confirms** through a [`ConfirmationGate`] when conflicts exist
//! - **Executes** delegate rewrites, preparation hooks and deletions as one
//!   command
//!
//! # Architecture
//!
//! Every phase is a plain function or small struct over
//! [`excise_model::CodeModel`]; [`SafeDeleteProcessor`] sequences them and
//! owns the lock discipline (shared access while collecting, exclusive
//! access while executing, no lock while waiting on the gate).

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod collector;
pub mod conflicts;
pub mod containment;
pub mod delegate;
pub mod delegates;
pub mod deletion_set;
pub mod error;
pub mod executor;
pub mod gate;
pub mod listener;
pub mod processor;
pub mod registry;
pub mod settings;
pub mod usage;

pub use collector::UsageCollector;
pub use conflicts::{Conflict, ConflictSeverity, UsageHolder};
pub use containment::{is_inside, is_inside_any, InsideDeletedFilter};
pub use delegate::{DelegateSearch, NonCodeSearchInfo, SafeDeleteDelegate};
pub use deletion_set::DeletionSet;
pub use error::{InvalidReason, SafeDeleteError};
pub use executor::ExecutionReport;
pub use gate::{BatchGate, ConfirmationGate, ConflictDecision, GateState, UsageViewDecision};
pub use listener::{SafeDeleteListener, TracingListener};
pub use processor::{
    CollectionResult, SafeDeleteOptions, SafeDeleteOutcome, SafeDeleteProcessor, REFACTORING_ID,
};
pub use registry::DelegateRegistry;
pub use settings::{SearchToggles, SettingsKey, SettingsStore};
pub use usage::{CustomUsage, NonCodeUsage, ReferenceUsage, UsageInfo, UsageRewrite};
