use excise_model::{
    Cancelled, CodeModel, DescriptionLocation, ElementId, ElementKind, ModelEditor,
    ProgressTicket, StructuralEditError,
};

use crate::conflicts::{capitalize, Conflict};
use crate::containment::is_inside_any;
use crate::delegate::{DelegateSearch, NonCodeSearchInfo, SafeDeleteDelegate};
use crate::deletion_set::DeletionSet;

use super::reference_usages;

/// Claims methods and constructors and guards override relationships.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodDelegate;

impl MethodDelegate {
    /// Registry name.
    pub const NAME: &'static str = "method";
}

impl SafeDeleteDelegate for MethodDelegate {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn handles_element(&self, model: &dyn CodeModel, element: ElementId) -> bool {
        model.kind(element).is_some_and(ElementKind::is_callable)
    }

    fn find_usages(
        &self,
        model: &dyn CodeModel,
        method: ElementId,
        set: &DeletionSet,
        ticket: &ProgressTicket,
    ) -> Result<Option<DelegateSearch>, Cancelled> {
        Ok(Some(DelegateSearch {
            usages: reference_usages(model, method, set, ticket)?,
            non_code: NonCodeSearchInfo::new(vec![method]),
        }))
    }

    fn find_conflicts(
        &self,
        model: &dyn CodeModel,
        method: ElementId,
        set: &DeletionSet,
        ticket: &ProgressTicket,
    ) -> Result<Vec<Conflict>, Cancelled> {
        let describe = |element: ElementId| model.description(element, DescriptionLocation::Usage);
        let mut conflicts = Vec::new();

        if let Some(super_method) = model.overridden(method) {
            if !set.contains(super_method) {
                let in_interface = model
                    .parent(super_method)
                    .and_then(|owner| model.kind(owner))
                    == Some(ElementKind::Interface);
                let message = format!(
                    "{} {} {}, which is not being deleted.",
                    capitalize(&describe(method)),
                    if in_interface { "implements" } else { "overrides" },
                    describe(super_method)
                );
                conflicts.push(if in_interface {
                    Conflict::error(method, message)
                } else {
                    Conflict::warning(method, message)
                });
            }
        }

        for overrider in model.find_overriders(method, ticket)? {
            if set.contains(overrider) || is_inside_any(model, overrider, set.roots()) {
                continue;
            }
            conflicts.push(Conflict::error(
                method,
                format!(
                    "{} overrides {}, which is being deleted.",
                    capitalize(&describe(overrider)),
                    describe(method)
                ),
            ));
        }
        Ok(conflicts)
    }

    fn prepare_for_deletion(
        &self,
        editor: &mut dyn ModelEditor,
        method: ElementId,
    ) -> Result<(), StructuralEditError> {
        editor.unlink_overriders(method)
    }

    fn is_to_search_in_comments(&self, _model: &dyn CodeModel, _element: ElementId) -> bool {
        true
    }

    fn is_to_search_for_text_occurrences(
        &self,
        _model: &dyn CodeModel,
        _element: ElementId,
    ) -> bool {
        true
    }
}
