//!
//! This module provides initialization utilities, such as creating a default
//! configuration file.

use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Error type for initialization operations
#[derive(Error, Debug)]
pub enum InitError {
    #[error("Failed to access file {path}: {source}")]
    IoError { source: io::Error, path: String },
}

/// Create a default configuration file at the specified path.
///
/// Returns `true` if the file was created, or `false` if it already exists.
///
/// # Errors
///
/// Returns an error if the file cannot be created due to permissions or other I/O errors.
pub fn create_default_config(path: &str) -> Result<bool, InitError> {
    if Path::new(path).exists() {
        return Ok(false);
    }

    let default_config = r#"# sqlfmt-runner configuration file

# Path to the sqlfmt executable. Supports the ${workspaceFolder}, ${cwd},
# ${userHome}, ${env:NAME}, and ${interpreter} placeholders. When omitted,
# sqlfmt is looked up next to the active Python interpreter and then on PATH.
# path = "${workspaceFolder}/.venv/bin/sqlfmt"

# Extra arguments passed to sqlfmt on every run.
# args = ["--line-length", "100"]

# Timeout per invocation in milliseconds (0 disables the deadline).
timeout = 30000

# Extra named workspace folders, usable as ${workspaceFolder:name}.
# [workspace-folders]
# shared = "/work/shared"
"#;

    fs::write(path, default_config).map_err(|e| InitError::IoError {
        source: e,
        path: path.to_string(),
    })?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_config_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".sqlfmt-runner.toml");
        let path_str = path.display().to_string();

        assert!(create_default_config(&path_str).unwrap());
        assert!(!create_default_config(&path_str).unwrap());
    }

    #[test]
    fn default_config_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".sqlfmt-runner.toml");
        let path_str = path.display().to_string();
        create_default_config(&path_str).unwrap();

        let loaded = crate::config::load(Some(path.as_path()), dir.path()).unwrap();
        assert_eq!(loaded.config.timeout, 30_000);
        assert_eq!(loaded.config.path, None);
    }
}
