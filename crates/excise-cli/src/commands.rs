//! `delete` and `usages` command handlers.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::info;

use excise_model::{CodeModel, DescriptionLocation, ElementId, Workspace};
use excise_refactor::{
    BatchGate, ConfirmationGate, DelegateRegistry, SafeDeleteError, SafeDeleteOptions,
    SafeDeleteOutcome, SafeDeleteProcessor, TracingListener,
};

use crate::cli::{SearchFlags, Target};
use crate::config::ExciseConfig;
use crate::prompt::{use_dialoguer, TerminalGate};
use crate::report::{DeleteReport, UsagesReport};

/// Exit status when conflicts stopped a batch run.
const EXIT_CONFLICTS: u8 = 2;

pub(crate) struct DeleteArgs {
    pub target: Target,
    pub search: SearchFlags,
    pub ignore_conflicts: bool,
    pub batch: bool,
    pub ask_for_accessors: Option<bool>,
    pub dry_run: bool,
    pub json: bool,
}

fn load_snapshot(path: &Path) -> anyhow::Result<Workspace> {
    Workspace::load(path).with_context(|| format!("failed to load snapshot {}", path.display()))
}

/// Maps each query to exactly one element.
pub(crate) fn resolve_symbols(
    workspace: &Workspace,
    symbols: &[String],
) -> anyhow::Result<Vec<ElementId>> {
    let mut selection = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        match workspace.lookup(symbol).as_slice() {
            [] => bail!("no symbol matches `{symbol}`"),
            [element] => selection.push(*element),
            candidates => {
                let names: Vec<String> = candidates
                    .iter()
                    .map(|id| workspace.description(*id, DescriptionLocation::Usage))
                    .collect();
                bail!("`{symbol}` is ambiguous: {}", names.join(", "));
            }
        }
    }
    Ok(selection)
}

fn processor(
    config: &ExciseConfig,
    model: &Arc<RwLock<Workspace>>,
    options: SafeDeleteOptions,
) -> anyhow::Result<SafeDeleteProcessor<Workspace>> {
    let registry = DelegateRegistry::from_names(&config.delegates)
        .with_context(|| format!("invalid delegate list in {}", config.config_path.display()))?;
    let mut processor = SafeDeleteProcessor::new(Arc::clone(model), Arc::new(registry))
        .with_settings(config.settings.clone())
        .with_options(options);
    processor.add_listener(Arc::new(TracingListener));
    Ok(processor)
}

fn print_report(
    report: &impl Serialize,
    text: impl FnOnce() -> String,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", text());
    }
    Ok(())
}

pub(crate) fn delete(mut config: ExciseConfig, args: DeleteArgs) -> anyhow::Result<ExitCode> {
    let workspace = load_snapshot(&args.target.snapshot)?;
    let selection = resolve_symbols(&workspace, &args.target.symbols)?;
    let model = Arc::new(RwLock::new(workspace));
    let options = SafeDeleteOptions {
        search_in_comments: args.search.comments(),
        search_non_source: args.search.non_source(),
        ask_for_accessors: args.ask_for_accessors,
        preview_non_code: config.preview_non_code,
    };
    let mut processor = processor(&config, &model, options)?;

    let interactive = !args.batch && !args.json && !args.ignore_conflicts && use_dialoguer();
    let mut gate: Box<dyn ConfirmationGate> = if interactive {
        Box::new(TerminalGate::default())
    } else {
        Box::new(BatchGate::new(args.ignore_conflicts))
    };

    let (report, code) = match processor.run(&selection, gate.as_mut()) {
        Ok(SafeDeleteOutcome::Deleted(report)) => {
            if !args.dry_run {
                model
                    .read()
                    .save(&args.target.snapshot)
                    .with_context(|| {
                        format!("failed to write snapshot {}", args.target.snapshot.display())
                    })?;
            }
            let report = DeleteReport::Deleted {
                report,
                dry_run: args.dry_run,
            };
            (report, ExitCode::SUCCESS)
        }
        Ok(SafeDeleteOutcome::Cancelled) => (DeleteReport::Cancelled, ExitCode::FAILURE),
        Err(SafeDeleteError::Conflicts { conflicts, usages }) => {
            let guard = model.read();
            let usages = usages.iter().map(|usage| usage.describe(&*guard)).collect();
            (
                DeleteReport::Conflicts { conflicts, usages },
                ExitCode::from(EXIT_CONFLICTS),
            )
        }
        Err(err) => return Err(err.into()),
    };

    let settings = processor.into_settings();
    if !args.dry_run && settings != config.settings {
        config.settings = settings;
        config.save()?;
        info!(path = %config.config_path.display(), "search settings saved");
    }

    print_report(&report, || report.render_text(), args.json)?;
    Ok(code)
}

pub(crate) fn usages(
    config: &ExciseConfig,
    target: &Target,
    search: &SearchFlags,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let workspace = load_snapshot(&target.snapshot)?;
    let selection = resolve_symbols(&workspace, &target.symbols)?;
    let model = Arc::new(RwLock::new(workspace));
    let options = SafeDeleteOptions {
        search_in_comments: search.comments(),
        search_non_source: search.non_source(),
        ..SafeDeleteOptions::default()
    };
    let processor = processor(config, &model, options)?;

    let Some((set, collected)) = processor.find_usages(&selection)? else {
        bail!("usage search was declined for the selection");
    };
    let guard = model.read();
    let report = UsagesReport {
        targets: set
            .members()
            .map(|element| guard.description(element, DescriptionLocation::Usage))
            .collect(),
        usages: collected
            .usages
            .iter()
            .map(|usage| usage.describe(&*guard))
            .collect(),
        conflicts: collected.conflicts,
    };
    print_report(&report, || report.render_text(), json)?;
    Ok(ExitCode::SUCCESS)
}
