//! Interactive confirmation on a terminal.

use std::io::IsTerminal;

use dialoguer::{theme::ColorfulTheme, Confirm, Select};
use tracing::warn;

use excise_refactor::{Conflict, ConfirmationGate, ConflictDecision, UsageViewDecision};

/// True when both stdin and stdout are attached to a terminal.
pub(crate) fn use_dialoguer() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}

const CONFLICT_CHOICES: &[&str] = &["View usages", "Delete anyway", "Cancel"];
const VIEW_CHOICES: &[&str] = &["Rerun safe delete", "Delete anyway", "Close"];

/// Asks the user through `dialoguer` prompts. Prompt failures (closed
/// stdin, no terminal) count as cancel.
#[derive(Default)]
pub(crate) struct TerminalGate {
    theme: ColorfulTheme,
}

impl TerminalGate {
    fn select(&self, prompt: &str, items: &[&str]) -> Option<usize> {
        match Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(items.len() - 1)
            .interact()
        {
            Ok(index) => Some(index),
            Err(err) => {
                warn!("prompt failed: {err}");
                None
            }
        }
    }
}

impl ConfirmationGate for TerminalGate {
    fn is_interactive(&self) -> bool {
        true
    }

    fn on_conflicts(&mut self, conflicts: &[Conflict]) -> ConflictDecision {
        eprintln!("Problems detected:");
        for conflict in conflicts {
            eprintln!("  {conflict}");
        }
        match self.select("Continue?", CONFLICT_CHOICES) {
            Some(0) => ConflictDecision::ViewUsages,
            Some(1) => ConflictDecision::ProceedAnyway,
            _ => ConflictDecision::Cancel,
        }
    }

    fn view_usages(&mut self, usages: &[String]) -> UsageViewDecision {
        eprintln!("Usages:");
        for usage in usages {
            eprintln!("  {usage}");
        }
        match self.select("Fix the usages above, then", VIEW_CHOICES) {
            Some(0) => UsageViewDecision::Retry,
            Some(1) => UsageViewDecision::DeleteAnyway,
            _ => UsageViewDecision::Close,
        }
    }

    fn preview_non_code(&mut self, usages: &[String]) -> bool {
        eprintln!("Occurrences in comments, strings and non-code files will not be changed:");
        for usage in usages {
            eprintln!("  {usage}");
        }
        Confirm::with_theme(&self.theme)
            .with_prompt("Delete anyway?")
            .default(true)
            .interact()
            .unwrap_or_else(|err| {
                warn!("prompt failed: {err}");
                false
            })
    }
}
