//! Text and JSON rendering of run results.

use std::fmt::Write as _;

use serde::Serialize;

use excise_refactor::{Conflict, ExecutionReport};

/// Result of `excise delete`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeleteReport {
    Deleted {
        #[serde(flatten)]
        report: ExecutionReport,
        dry_run: bool,
    },
    Cancelled,
    Conflicts {
        conflicts: Vec<Conflict>,
        usages: Vec<String>,
    },
}

/// Result of `excise usages`.
#[derive(Debug, Serialize)]
pub struct UsagesReport {
    pub targets: Vec<String>,
    pub usages: Vec<String>,
    pub conflicts: Vec<Conflict>,
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("1 {one}")
    } else {
        format!("{count} {many}")
    }
}

fn section(out: &mut String, heading: &str, lines: &[String]) {
    let _ = writeln!(out, "{heading}:");
    for line in lines {
        let _ = writeln!(out, "  {line}");
    }
}

impl DeleteReport {
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        match self {
            Self::Deleted { report, dry_run } => {
                section(
                    &mut out,
                    &format!("Deleted {}", plural(report.deleted.len(), "element", "elements")),
                    &report.deleted,
                );
                if !report.rewritten.is_empty() {
                    section(
                        &mut out,
                        &format!(
                            "Rewrote {}",
                            plural(report.rewritten.len(), "usage", "usages")
                        ),
                        &report.rewritten,
                    );
                }
                if !report.skipped_covered.is_empty() {
                    section(
                        &mut out,
                        "Already removed with their container",
                        &report.skipped_covered,
                    );
                }
                if !report.dangling.is_empty() {
                    section(
                        &mut out,
                        &format!(
                            "Left {} dangling",
                            plural(report.dangling.len(), "reference", "references")
                        ),
                        &report.dangling,
                    );
                }
                if *dry_run {
                    out.push_str("Dry run: snapshot not written.\n");
                }
            }
            Self::Cancelled => out.push_str("Safe delete cancelled; nothing was changed.\n"),
            Self::Conflicts { conflicts, usages } => {
                let messages: Vec<String> = conflicts.iter().map(ToString::to_string).collect();
                section(
                    &mut out,
                    &format!(
                        "Refused: {}",
                        plural(conflicts.len(), "conflict", "conflicts")
                    ),
                    &messages,
                );
                section(&mut out, "Usages", usages);
                out.push_str("Rerun with --ignore-conflicts to delete anyway.\n");
            }
        }
        out
    }
}

impl UsagesReport {
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let heading = format!(
            "{} of {}",
            plural(self.usages.len(), "usage", "usages"),
            self.targets.join(", ")
        );
        if self.usages.is_empty() {
            let _ = writeln!(out, "{heading}.");
        } else {
            section(&mut out, &heading, &self.usages);
        }
        if !self.conflicts.is_empty() {
            let messages: Vec<String> = self.conflicts.iter().map(ToString::to_string).collect();
            section(
                &mut out,
                &plural(self.conflicts.len(), "conflict", "conflicts"),
                &messages,
            );
        }
        out
    }
}
