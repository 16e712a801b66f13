use excise_model::{Cancelled, CodeModel, ElementId, ElementKind, ProgressTicket};

use crate::conflicts::capitalize;
use crate::delegate::{DelegateSearch, NonCodeSearchInfo, SafeDeleteDelegate};
use crate::deletion_set::DeletionSet;

use super::reference_usages;

/// Claims fields. Accessor methods (`getX`, `isX`, `setX`) declared next to
/// the field are offered as satellites.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldDelegate;

impl FieldDelegate {
    /// Registry name.
    pub const NAME: &'static str = "field";
}

/// Accessor methods declared in the same class as `field`.
fn accessors(model: &dyn CodeModel, field: ElementId) -> Vec<ElementId> {
    let (Some(owner), Some(name)) = (model.parent(field), model.name(field)) else {
        return Vec::new();
    };
    let suffix = capitalize(&name);
    let candidates = [
        format!("get{suffix}"),
        format!("is{suffix}"),
        format!("set{suffix}"),
    ];
    model
        .children(owner)
        .into_iter()
        .filter(|&child| {
            model.kind(child) == Some(ElementKind::Method)
                && model
                    .name(child)
                    .is_some_and(|method| candidates.iter().any(|c| c == method.as_str()))
        })
        .collect()
}

impl SafeDeleteDelegate for FieldDelegate {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn handles_element(&self, model: &dyn CodeModel, element: ElementId) -> bool {
        model.kind(element) == Some(ElementKind::Field)
    }

    fn find_usages(
        &self,
        model: &dyn CodeModel,
        field: ElementId,
        set: &DeletionSet,
        ticket: &ProgressTicket,
    ) -> Result<Option<DelegateSearch>, Cancelled> {
        let mut elements_to_search = vec![field];
        elements_to_search.extend(
            accessors(model, field)
                .into_iter()
                .filter(|accessor| set.contains(*accessor)),
        );
        Ok(Some(DelegateSearch {
            usages: reference_usages(model, field, set, ticket)?,
            non_code: NonCodeSearchInfo::new(elements_to_search),
        }))
    }

    fn additional_elements_to_delete(
        &self,
        model: &dyn CodeModel,
        field: ElementId,
        selection: &[ElementId],
        ask_user: bool,
    ) -> Option<Vec<ElementId>> {
        if !ask_user {
            return None;
        }
        let extra: Vec<ElementId> = accessors(model, field)
            .into_iter()
            .filter(|accessor| !selection.contains(accessor))
            .collect();
        (!extra.is_empty()).then_some(extra)
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
