//! Built-in delegates for parameters, methods and fields.

mod field;
mod method;
mod parameter;

pub use field::FieldDelegate;
pub use method::MethodDelegate;
pub use parameter::ParameterDelegate;

use excise_model::{Cancelled, CodeModel, ElementId, ProgressTicket};

use crate::containment::is_inside_any;
use crate::deletion_set::DeletionSet;
use crate::usage::UsageInfo;

/// Every reference to `element`, flagged safe when its site lies inside the
/// deletion set.
fn reference_usages(
    model: &dyn CodeModel,
    element: ElementId,
    set: &DeletionSet,
    ticket: &ProgressTicket,
) -> Result<Vec<UsageInfo>, Cancelled> {
    Ok(model
        .find_references(element, ticket)?
        .into_iter()
        .map(|reference| {
            if is_inside_any(model, reference.element, set.roots()) {
                UsageInfo::safe_reference(reference.element, element)
            } else {
                UsageInfo::unsafe_reference(reference.element, element)
            }
        })
        .collect())
}
