//! Containment predicate: is a usage site inside the deletion set?
//!
//! A false negative only produces a noisy conflict, a false positive hides a
//! dangling reference. Every rule here therefore answers `false` when in
//! doubt.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use excise_model::{CodeModel, ElementId, ElementKind};

use crate::deletion_set::DeletionSet;

/// Decides whether a non-code occurrence site is inside the deletion set.
pub type InsideDeletedFilter = Arc<dyn Fn(&dyn CodeModel, ElementId) -> bool + Send + Sync>;

/// Returns true if `place` lies inside any of `ancestors`.
pub fn is_inside_any(model: &dyn CodeModel, place: ElementId, ancestors: &[ElementId]) -> bool {
    ancestors
        .iter()
        .any(|&ancestor| is_inside(model, place, ancestor))
}

/// Returns true if `place` lies inside `ancestor`.
///
/// Accounts for:
/// - directory containers (packages), checked through their directories
/// - files sharing one view, all of which die with the file
/// - plain syntactic ancestry
/// - a name token detached from its declaration
/// - injected fragments whose host chain reaches into `ancestor`
pub fn is_inside(model: &dyn CodeModel, place: ElementId, ancestor: ElementId) -> bool {
    match model.kind(ancestor) {
        None => return false,
        Some(ElementKind::Package) => {
            if model
                .directories(ancestor)
                .into_iter()
                .any(|dir| is_inside(model, place, dir))
            {
                return true;
            }
        }
        Some(kind) if kind.is_file() => {
            if model
                .view_files(ancestor)
                .into_iter()
                .any(|file| model.is_ancestor(file, place, false))
            {
                return true;
            }
        }
        Some(_) => {}
    }

    model.is_ancestor(ancestor, place, false)
        || inside_detached_name(model, place, ancestor)
        || inside_injection_host(model, place, ancestor)
}

/// A declaration's name token may sit outside the declaration subtree, for
/// example wrapped in a small sibling node. Usages inside that wrapper die
/// with the declaration. The wrapper only counts when it is not a
/// declaration itself and does not enclose `ancestor`; otherwise only the
/// name token's own subtree counts.
fn inside_detached_name(model: &dyn CodeModel, place: ElementId, ancestor: ElementId) -> bool {
    let Some(name) = model.name_identifier(ancestor) else {
        return false;
    };
    if model.is_ancestor(ancestor, name, true) {
        return false;
    }
    let wrapper = model.parent(name).filter(|&wrapper| {
        !model.is_ancestor(wrapper, ancestor, false)
            && model
                .kind(wrapper)
                .is_some_and(|kind| !kind.is_declaration() && !kind.is_file())
    });
    model.is_ancestor(wrapper.unwrap_or(name), place, false)
}

fn inside_injection_host(model: &dyn CodeModel, place: ElementId, ancestor: ElementId) -> bool {
    let mut seen = FxHashSet::default();
    let mut host = model.injection_host(place);
    while let Some(current) = host {
        if !seen.insert(current) {
            break;
        }
        if model.is_ancestor(ancestor, current, false) {
            return true;
        }
        host = model.injection_host(current);
    }
    false
}

/// Default filter for non-code occurrences: anything inside the set except
/// whole files, whose occurrences always stay reportable.
#[must_use]
pub fn default_inside_deleted(set: &DeletionSet) -> InsideDeletedFilter {
    let roots = set.roots().to_vec();
    Arc::new(move |model: &dyn CodeModel, place: ElementId| {
        !model.kind(place).is_some_and(ElementKind::is_file) && is_inside_any(model, place, &roots)
    })
}
