//! Handler for the `workspace` command: mutate-mode formatting of a whole
//! workspace root. The formatter rewrites files on disk itself; its output
//! is only captured for the log.

use super::{prepare_driver, report_failure};
use crate::cli_types::{GlobalOptions, WorkspaceArgs};
use crate::exit_codes::SUCCESS;
use anyhow::Context;
use colored::Colorize;

pub fn handle_workspace(global: &GlobalOptions, args: &WorkspaceArgs) -> anyhow::Result<i32> {
    let (driver, _loaded) = prepare_driver(global, args.root.clone())?;

    let root = driver
        .context()
        .workspace_root
        .clone()
        .unwrap_or_else(|| driver.context().cwd.clone());
    let root = root
        .canonicalize()
        .with_context(|| format!("workspace root {} is not accessible", root.display()))?;

    log::info!("formatting workspace {}", root.display());
    match driver.format_in_place(&[root.clone()]) {
        Ok(()) => {
            println!("{} Formatted workspace {}", "✓".green(), root.display());
            Ok(SUCCESS)
        }
        Err(err) => Ok(report_failure(&err)),
    }
}
