//! `excise` - command line front end for the Safe Delete engine.
//!
//! Loads a workspace snapshot, resolves the requested symbols and runs Safe
//! Delete over them, writing the mutated snapshot back.

mod cli;
mod commands;
mod config;
mod prompt;
mod report;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

use cli::{flag_pair, Cli, Command};
use commands::DeleteArgs;
use config::ExciseConfig;

type FilterHandle = reload::Handle<EnvFilter, Registry>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter = init_tracing(cli.verbose);
    match run(cli, filter.as_ref()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr. `RUST_LOG` wins, then `-v`; with neither, the
/// returned handle lets the config file pick the level.
fn init_tracing(verbose: u8) -> Option<FilterHandle> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return None;
    }
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let (filter, handle) = reload::Layer::new(EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    (verbose == 0).then_some(handle)
}

fn apply_log_level(handle: &FilterHandle, level: &str) {
    match EnvFilter::try_new(level) {
        Ok(filter) => {
            if let Err(err) = handle.reload(filter) {
                warn!("Failed to apply log level `{level}`: {err}");
            }
        }
        Err(err) => warn!("Invalid log level `{level}` in config: {err}"),
    }
}

fn run(cli: Cli, filter: Option<&FilterHandle>) -> anyhow::Result<ExitCode> {
    let root = std::env::current_dir().context("failed to read the working directory")?;
    let config = ExciseConfig::load(&root, cli.config.as_deref());
    if let Some(handle) = filter {
        apply_log_level(handle, &config.log_level);
    }

    match cli.command {
        Command::Delete {
            target,
            search,
            ignore_conflicts,
            batch,
            accessors,
            no_accessors,
            dry_run,
            json,
        } => commands::delete(
            config,
            DeleteArgs {
                target,
                search,
                ignore_conflicts,
                batch,
                ask_for_accessors: flag_pair(accessors, no_accessors),
                dry_run,
                json,
            },
        ),
        Command::Usages {
            target,
            search,
            json,
        } => commands::usages(&config, &target, &search, json),
    }
}
