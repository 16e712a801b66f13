//! Deletion executor: usage rewrites, preparation hooks, deletions.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use excise_model::{DescriptionLocation, ElementId, ModelEditor, StructuralEditError};

use crate::delegate::SafeDeleteDelegate;
use crate::deletion_set::DeletionSet;
use crate::registry::DelegateRegistry;
use crate::usage::UsageInfo;

/// What one execution changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    /// Descriptions of the delegate rewrites that ran.
    pub rewritten: Vec<String>,
    /// Descriptions of the deleted symbols, in registration order.
    pub deleted: Vec<String>,
    /// Members already removed with a deleted ancestor.
    pub skipped_covered: Vec<String>,
    /// Confirmed unsafe usages left pointing at deleted symbols.
    pub dangling: Vec<String>,
}

/// Applies the final usage list and deletes the set as one command.
///
/// Order: every custom usage's rewrite, then per member (registration
/// order) the claiming delegate's preparation hook followed by the deletion
/// itself. The first failure finishes the command uncommitted, so a model
/// that supports rollback discards every edit of the run.
pub fn execute<M: ModelEditor>(
    editor: &mut M,
    registry: &DelegateRegistry,
    set: &DeletionSet,
    usages: &[UsageInfo],
    command_name: &str,
) -> Result<ExecutionReport, StructuralEditError> {
    let claims: Vec<(ElementId, Option<Arc<dyn SafeDeleteDelegate>>)> = set
        .members()
        .map(|element| (element, registry.claiming(&*editor, element).cloned()))
        .collect();
    let descriptions: Vec<String> = set
        .members()
        .map(|element| editor.description(element, DescriptionLocation::Usage))
        .collect();
    let dangling = usages
        .iter()
        .filter(|usage| matches!(usage, UsageInfo::Reference(r) if !r.safe_delete))
        .map(|usage| usage.describe(&*editor))
        .collect();

    editor.begin_command(command_name);
    let result = apply(editor, set, usages, &claims, &descriptions);
    editor.finish_command(result.is_ok());

    let mut report = result?;
    report.dangling = dangling;
    info!(
        command = command_name,
        deleted = report.deleted.len(),
        rewritten = report.rewritten.len(),
        "safe delete executed"
    );
    Ok(report)
}

fn apply<M: ModelEditor>(
    editor: &mut M,
    set: &DeletionSet,
    usages: &[UsageInfo],
    claims: &[(ElementId, Option<Arc<dyn SafeDeleteDelegate>>)],
    descriptions: &[String],
) -> Result<ExecutionReport, StructuralEditError> {
    let mut report = ExecutionReport::default();

    for usage in usages {
        if let UsageInfo::Custom(custom) = usage {
            debug!(site = custom.element.0, rewrite = %custom.rewrite.describe(), "rewriting usage");
            custom.rewrite.perform(editor)?;
            report.rewritten.push(custom.rewrite.describe());
        }
    }

    for ((element, delegate), description) in claims.iter().zip(descriptions) {
        if !editor.is_valid(*element) && set.is_covered(*element) {
            report.skipped_covered.push(description.clone());
            continue;
        }
        if let Some(delegate) = delegate {
            delegate.prepare_for_deletion(editor, *element)?;
        }
        editor.delete(*element)?;
        report.deleted.push(description.clone());
    }
    Ok(report)
}
