use excise_model::{
    Cancelled, CodeModel, DescriptionLocation, ElementId, ElementKind, ModelEditor,
    ProgressTicket, StructuralEditError,
};

use crate::containment::is_inside_any;
use crate::delegate::{DelegateSearch, NonCodeSearchInfo, SafeDeleteDelegate};
use crate::deletion_set::DeletionSet;
use crate::usage::{CustomUsage, UsageInfo, UsageRewrite};

use super::reference_usages;

/// Claims method and constructor parameters.
///
/// Each call site of the owning method passes an argument for the
/// parameter; those arguments are removed together with it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterDelegate;

impl ParameterDelegate {
    /// Registry name.
    pub const NAME: &'static str = "parameter";
}

/// Removes one call argument.
#[derive(Debug, Clone)]
struct DeleteArgument {
    argument: ElementId,
    description: String,
}

impl UsageRewrite for DeleteArgument {
    fn describe(&self) -> String {
        self.description.clone()
    }

    fn perform(&self, editor: &mut dyn ModelEditor) -> Result<(), StructuralEditError> {
        if !editor.is_valid(self.argument) {
            return Err(StructuralEditError::RewriteFailed {
                description: self.description.clone(),
                reason: "the argument no longer exists".to_string(),
            });
        }
        editor.delete(self.argument)
    }
}

fn parameter_index(model: &dyn CodeModel, method: ElementId, parameter: ElementId) -> Option<usize> {
    model
        .children(method)
        .into_iter()
        .filter(|&child| model.kind(child) == Some(ElementKind::Parameter))
        .position(|child| child == parameter)
}

impl SafeDeleteDelegate for ParameterDelegate {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn handles_element(&self, model: &dyn CodeModel, element: ElementId) -> bool {
        model.kind(element) == Some(ElementKind::Parameter)
            && model
                .parent(element)
                .and_then(|parent| model.kind(parent))
                .is_some_and(ElementKind::is_callable)
    }

    fn find_usages(
        &self,
        model: &dyn CodeModel,
        parameter: ElementId,
        set: &DeletionSet,
        ticket: &ProgressTicket,
    ) -> Result<Option<DelegateSearch>, Cancelled> {
        let mut usages = reference_usages(model, parameter, set, ticket)?;

        let owner = model.parent(parameter).filter(|method| !set.contains(*method));
        let index = owner.and_then(|method| parameter_index(model, method, parameter));
        if let (Some(method), Some(index)) = (owner, index) {
            let method_name = model.description(method, DescriptionLocation::Usage);
            for call in model.find_references(method, ticket)? {
                if model.kind(call.element) != Some(ElementKind::Call)
                    || is_inside_any(model, call.element, set.roots())
                {
                    continue;
                }
                let argument = model
                    .children(call.element)
                    .into_iter()
                    .filter(|&child| model.kind(child) == Some(ElementKind::Argument))
                    .nth(index);
                if let Some(argument) = argument {
                    usages.push(UsageInfo::Custom(CustomUsage::new(
                        argument,
                        parameter,
                        DeleteArgument {
                            argument,
                            description: format!(
                                "remove argument {} from call to {method_name}",
                                index + 1
                            ),
                        },
                    )));
                }
            }
        }

        Ok(Some(DelegateSearch {
            usages,
            non_code: NonCodeSearchInfo::new(vec![parameter]),
        }))
    }

    fn is_to_search_in_comments(&self, _model: &dyn CodeModel, _element: ElementId) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use excise_model::{Workspace, WorkspaceBuilder};

    #[test]
    fn call_site_arguments_become_custom_usages() {
        let mut b = WorkspaceBuilder::new();
        let file = b.source_file(None, "Greeter.java");
        let class = b.class(file, "Greeter");
        let method = b.method(class, "greet");
        let _name = b.parameter(method, "name");
        let loud = b.parameter(method, "loud");
        let body_ref = b.reference(method, loud);
        let caller = b.method(class, "main");
        let call = b.call(caller, method);
        b.argument(call, "\"Ada\"");
        let loud_arg = b.argument(call, "true");
        let mut ws: Workspace = b.finish();

        let set = DeletionSet::new(&ws, [loud]);
        let delegate = ParameterDelegate;
        assert!(delegate.handles_element(&ws, loud));
        assert!(!delegate.handles_element(&ws, method));

        let search = delegate
            .find_usages(&ws, loud, &set, &ProgressTicket::detached())
            .unwrap()
            .unwrap();
        assert_eq!(search.usages.len(), 2);
        assert_eq!(search.usages[0].element(), body_ref);
        assert!(!search.usages[0].is_safe_delete());
        let UsageInfo::Custom(custom) = &search.usages[1] else {
            panic!("expected a custom usage, got {:?}", search.usages[1]);
        };
        assert_eq!(custom.element, loud_arg);
        assert_eq!(
            custom.rewrite.describe(),
            "remove argument 2 from call to method `Greeter.greet`"
        );

        custom.rewrite.perform(&mut ws).unwrap();
        assert!(!ws.is_valid(loud_arg));
        let err = custom.rewrite.perform(&mut ws).unwrap_err();
        assert!(matches!(err, StructuralEditError::RewriteFailed { .. }));
    }

    #[test]
    fn deleting_the_method_too_skips_call_rewrites() {
        let mut b = WorkspaceBuilder::new();
        let file = b.source_file(None, "A.java");
        let class = b.class(file, "A");
        let method = b.method(class, "run");
        let flag = b.parameter(method, "flag");
        let caller = b.method(class, "main");
        let call = b.call(caller, method);
        b.argument(call, "false");
        let ws = b.finish();

        let set = DeletionSet::new(&ws, [method, flag]);
        let search = ParameterDelegate
            .find_usages(&ws, flag, &set, &ProgressTicket::detached())
            .unwrap()
            .unwrap();
        assert!(search.usages.is_empty());
    }
}
