//! CLI definitions for excise.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "excise",
    version,
    about = "Safely delete symbols from a code model snapshot",
    after_help = "Examples:\n  excise usages Counter.count --snapshot model.json\n  excise delete Counter.count --snapshot model.json --dry-run\n  excise delete src/Legacy.java --snapshot model.json --ignore-conflicts"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(long, short, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    /// Config file (defaults to excise.toml or .excise.toml in the working directory).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Delete symbols after checking their usages.
    Delete {
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        search: SearchFlags,
        /// Delete even when conflicts are found.
        #[arg(long)]
        ignore_conflicts: bool,
        /// Never prompt; conflicts fail the run unless --ignore-conflicts is set.
        #[arg(long)]
        batch: bool,
        /// Offer accessor methods of deleted fields for deletion too.
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "no_accessors")]
        accessors: bool,
        /// Never add accessor methods.
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "accessors")]
        no_accessors: bool,
        /// Run everything but leave the snapshot and config untouched.
        #[arg(long)]
        dry_run: bool,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List usages and conflicts without deleting anything.
    Usages {
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        search: SearchFlags,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Which symbols, in which snapshot.
#[derive(Debug, Args)]
pub struct Target {
    /// Symbols as qualified names (Counter.count) or paths (src/Counter.java).
    #[arg(required = true)]
    pub symbols: Vec<String>,
    /// Workspace snapshot (JSON).
    #[arg(long, short)]
    pub snapshot: PathBuf,
}

/// Overrides for the persisted non-code search toggles.
#[derive(Debug, Args)]
pub struct SearchFlags {
    /// Search comments and string literals.
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "no_comments")]
    pub comments: bool,
    /// Skip comments and string literals.
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "comments")]
    pub no_comments: bool,
    /// Search non-source text files.
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "no_non_source")]
    pub non_source: bool,
    /// Skip non-source text files.
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "non_source")]
    pub no_non_source: bool,
}

impl SearchFlags {
    pub fn comments(&self) -> Option<bool> {
        flag_pair(self.comments, self.no_comments)
    }

    pub fn non_source(&self) -> Option<bool> {
        flag_pair(self.non_source, self.no_non_source)
    }
}

/// `--x` / `--no-x` as a tri-state; unset leaves the stored value alone.
pub fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_flags_parse_into_tri_states() {
        let cli = Cli::try_parse_from([
            "excise",
            "delete",
            "Counter.count",
            "Counter.reset",
            "--snapshot",
            "model.json",
            "--no-comments",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Delete { target, search, .. } = cli.command else {
            panic!("expected delete");
        };
        assert_eq!(target.symbols, vec!["Counter.count", "Counter.reset"]);
        assert_eq!(search.comments(), Some(false));
        assert_eq!(search.non_source(), None);
    }

    #[test]
    fn contradicting_flags_are_rejected() {
        let err = Cli::try_parse_from([
            "excise",
            "usages",
            "A",
            "--snapshot",
            "m.json",
            "--comments",
            "--no-comments",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
