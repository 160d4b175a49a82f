//! Handler for the `locate` command: report which sqlfmt executable a
//! formatting run would use, and whether it is actually runnable.

use super::prepare_driver;
use crate::cli_types::GlobalOptions;
use crate::exit_codes::{SUCCESS, TOOL_ERROR};
use colored::Colorize;

pub fn handle_locate(global: &GlobalOptions) -> anyhow::Result<i32> {
    let (driver, loaded) = prepare_driver(global, None)?;

    if let Some(source) = &loaded.source {
        println!("config: {}", source.display().to_string().dimmed());
    }
    if !driver.args().is_empty() {
        println!("args:   {}", driver.args().join(" ").dimmed());
    }

    let command = driver.command();
    if command.is_available {
        println!("{} {}", "✓".green(), command.path);
        Ok(SUCCESS)
    } else {
        println!(
            "{} {} {}",
            "✗".yellow(),
            command.path,
            "(not found or not executable)".dimmed()
        );
        Ok(TOOL_ERROR)
    }
}
