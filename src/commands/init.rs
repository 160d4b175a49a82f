//! Handler for the `init` command.

use crate::exit_codes::SUCCESS;
use crate::init::create_default_config;
use colored::Colorize;

const DEFAULT_CONFIG_FILE: &str = ".sqlfmt-runner.toml";

/// Write a starter configuration file in the current directory.
pub fn handle_init() -> anyhow::Result<i32> {
    if create_default_config(DEFAULT_CONFIG_FILE)? {
        println!("{} Created {DEFAULT_CONFIG_FILE}", "✓".green());
    } else {
        println!("{DEFAULT_CONFIG_FILE} already exists");
    }
    Ok(SUCCESS)
}
