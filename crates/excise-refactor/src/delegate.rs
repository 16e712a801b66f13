//! Delegate contract: symbol-kind specific customisation of Safe Delete.
//!
//! A delegate claims symbols through [`SafeDeleteDelegate::handles_element`].
//! For a claimed symbol the engine calls the remaining hooks instead of its
//! generic behaviour; unclaimed symbols get plain reference search,
//! ancestry-based safety and no extra conflicts.

use std::fmt;

use excise_model::{Cancelled, CodeModel, ElementId, ModelEditor, ProgressTicket, StructuralEditError};

use crate::conflicts::Conflict;
use crate::containment::InsideDeletedFilter;
use crate::deletion_set::DeletionSet;
use crate::usage::UsageInfo;

/// Which symbols to scan for non-code occurrences, and how to tell whether
/// an occurrence is inside the deletion set.
#[derive(Clone, Default)]
pub struct NonCodeSearchInfo {
    /// Symbols whose descriptive names are searched for.
    pub elements_to_search: Vec<ElementId>,
    /// Replaces the default containment filter when set.
    pub inside_deleted: Option<InsideDeletedFilter>,
}

impl NonCodeSearchInfo {
    /// Scan `elements` with the default filter.
    #[must_use]
    pub fn new(elements: Vec<ElementId>) -> Self {
        Self {
            elements_to_search: elements,
            inside_deleted: None,
        }
    }
}

impl fmt::Debug for NonCodeSearchInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonCodeSearchInfo")
            .field("elements_to_search", &self.elements_to_search)
            .field("custom_filter", &self.inside_deleted.is_some())
            .finish()
    }
}

/// Result of a delegate's usage search.
#[derive(Debug, Clone, Default)]
pub struct DelegateSearch {
    /// Usages the delegate produced itself.
    pub usages: Vec<UsageInfo>,
    /// Non-code scanning the engine should perform on its behalf.
    pub non_code: NonCodeSearchInfo,
}

/// A pluggable handler for one family of symbol kinds.
pub trait SafeDeleteDelegate: Send + Sync {
    /// Stable name used in configuration and the settings store.
    fn name(&self) -> &'static str;

    /// Returns true if this delegate claims `element`.
    fn handles_element(&self, model: &dyn CodeModel, element: ElementId) -> bool;

    /// Symbols to delete in place of a selected one. `None` aborts the run.
    fn elements_to_search(
        &self,
        _model: &dyn CodeModel,
        element: ElementId,
        _selection: &[ElementId],
    ) -> Option<Vec<ElementId>> {
        Some(vec![element])
    }

    /// Searches usages of `element`. `Ok(None)` declines and aborts the run.
    fn find_usages(
        &self,
        model: &dyn CodeModel,
        element: ElementId,
        set: &DeletionSet,
        ticket: &ProgressTicket,
    ) -> Result<Option<DelegateSearch>, Cancelled>;

    /// Conflicts specific to this symbol kind.
    fn find_conflicts(
        &self,
        _model: &dyn CodeModel,
        _element: ElementId,
        _set: &DeletionSet,
        _ticket: &ProgressTicket,
    ) -> Result<Vec<Conflict>, Cancelled> {
        Ok(Vec::new())
    }

    /// Satellite symbols that should be deleted together with `element`.
    ///
    /// `ask_user` is false when the user opted out of satellites.
    fn additional_elements_to_delete(
        &self,
        _model: &dyn CodeModel,
        _element: ElementId,
        _selection: &[ElementId],
        _ask_user: bool,
    ) -> Option<Vec<ElementId>> {
        None
    }

    /// Adjusts the final usage list. Runs for every registered delegate;
    /// `None` aborts the run.
    fn preprocess_usages(
        &self,
        _model: &dyn CodeModel,
        usages: Vec<UsageInfo>,
    ) -> Option<Vec<UsageInfo>> {
        Some(usages)
    }

    /// Detaches `element` from surrounding structures before it is deleted.
    fn prepare_for_deletion(
        &self,
        _editor: &mut dyn ModelEditor,
        _element: ElementId,
    ) -> Result<(), StructuralEditError> {
        Ok(())
    }

    /// Default for the comments and strings toggle when nothing is stored.
    fn is_to_search_in_comments(&self, _model: &dyn CodeModel, _element: ElementId) -> bool {
        false
    }

    /// Default for the non-source files toggle when nothing is stored.
    fn is_to_search_for_text_occurrences(
        &self,
        _model: &dyn CodeModel,
        _element: ElementId,
    ) -> bool {
        false
    }
}
