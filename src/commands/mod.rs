//! Command handlers for the sqlfmt-runner CLI.
//!
//! Each subcommand has its own module with a public handler function that
//! `main()` dispatches to. Handlers return the process exit code; `main`
//! turns unexpected errors into a tool-error exit.

pub mod fmt;
pub mod init;
pub mod locate;
pub mod version;
pub mod workspace;

use crate::cli_types::GlobalOptions;
use crate::config::{self, LoadedConfig};
use crate::driver::FormatterDriver;
use crate::exit_codes::{FORMAT_FAILED, TOOL_ERROR};
use crate::executor::FormatterError;
use crate::interpreter::VirtualEnvDiscovery;
use anyhow::Context;
use colored::Colorize;
use std::path::PathBuf;

/// Load configuration and prepare a driver for one command run.
///
/// The workspace root is, in order: the explicit flag, an override from the
/// caller, the directory containing the discovered config file.
fn prepare_driver(
    global: &GlobalOptions,
    root_override: Option<PathBuf>,
) -> anyhow::Result<(FormatterDriver, LoadedConfig)> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let loaded = config::load(global.config.as_deref(), &cwd)?;

    let workspace_root = root_override
        .or_else(|| global.workspace_root.clone())
        .or_else(|| loaded.source_dir());

    let driver = FormatterDriver::prepare(&loaded.config, workspace_root, &VirtualEnvDiscovery)
        .context("failed to prepare formatter invocation")?;
    Ok((driver, loaded))
}

/// Print a classified failure the way its class calls for and map it to an
/// exit code.
///
/// `ExecutionFailed` relays the formatter's own stderr; it is usually a
/// precise syntax diagnostic. Everything else gets a one-line error notice,
/// with detail in the log.
fn report_failure(err: &FormatterError) -> i32 {
    log::error!("{err}");
    match err {
        FormatterError::ExecutionFailed { stderr, .. } => {
            let trimmed = stderr.trim_end();
            if !trimmed.is_empty() {
                eprintln!("{trimmed}");
            }
            FORMAT_FAILED
        }
        _ => {
            eprintln!("{}: {err}", "Error".red().bold());
            TOOL_ERROR
        }
    }
}
