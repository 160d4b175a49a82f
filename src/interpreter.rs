//! Discovery of an associated Python interpreter.
//!
//! sqlfmt is usually installed into a project's virtual environment, so the
//! locator wants to know where that environment's interpreter lives: it looks
//! for a `sqlfmt` binary next to it, and the `${interpreter}` placeholder
//! expands to the candidate list. Discovery sits behind a trait so embedders
//! and tests can supply their own candidates; this crate only ships the
//! virtual-environment lookup and must tolerate finding nothing.

use crate::variables::VariableContext;
use std::path::{Path, PathBuf};

/// Source of interpreter candidates for one formatting request.
pub trait InterpreterDiscovery {
    /// Candidate interpreter paths, best first. May be empty; callers fall
    /// through to the default command name.
    fn discover(&self, ctx: &VariableContext) -> Vec<String>;
}

/// Default discovery: the active virtual environment (`VIRTUAL_ENV`), then a
/// `.venv` directory under the workspace root. Yields zero or one candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct VirtualEnvDiscovery;

impl InterpreterDiscovery for VirtualEnvDiscovery {
    fn discover(&self, ctx: &VariableContext) -> Vec<String> {
        if let Some(venv) = ctx.env_var("VIRTUAL_ENV") {
            let python = python_in_venv(Path::new(venv));
            if python.is_file() {
                return vec![python.display().to_string()];
            }
            log::debug!("VIRTUAL_ENV is set but {} does not exist", python.display());
        }

        if let Some(root) = &ctx.workspace_root {
            let python = python_in_venv(&root.join(".venv"));
            if python.is_file() {
                return vec![python.display().to_string()];
            }
        }

        Vec::new()
    }
}

#[cfg(not(windows))]
fn python_in_venv(venv: &Path) -> PathBuf {
    venv.join("bin").join("python")
}

#[cfg(windows)]
fn python_in_venv(venv: &Path) -> PathBuf {
    venv.join("Scripts").join("python.exe")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn ctx(workspace_root: Option<PathBuf>, environment: Vec<(String, String)>) -> VariableContext {
        VariableContext::new(workspace_root, Vec::new(), PathBuf::from("/tmp"), environment)
    }

    #[test]
    fn no_sources_means_no_candidates() {
        let candidates = VirtualEnvDiscovery.discover(&ctx(None, Vec::new()));
        assert!(candidates.is_empty());
    }

    #[test]
    fn stale_virtual_env_is_skipped() {
        let environment = vec![("VIRTUAL_ENV".to_string(), "/nonexistent/venv".to_string())];
        let candidates = VirtualEnvDiscovery.discover(&ctx(None, environment));
        assert!(candidates.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn active_virtual_env_yields_its_interpreter() {
        let venv = tempfile::tempdir().unwrap();
        let bin = venv.path().join("bin");
        fs::create_dir(&bin).unwrap();
        fs::write(bin.join("python"), "").unwrap();

        let environment = vec![("VIRTUAL_ENV".to_string(), venv.path().display().to_string())];
        let candidates = VirtualEnvDiscovery.discover(&ctx(None, environment));
        assert_eq!(candidates, vec![bin.join("python").display().to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn workspace_venv_is_the_fallback() {
        let workspace = tempfile::tempdir().unwrap();
        let bin = workspace.path().join(".venv").join("bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("python"), "").unwrap();

        let candidates =
            VirtualEnvDiscovery.discover(&ctx(Some(workspace.path().to_path_buf()), Vec::new()));
        assert_eq!(candidates, vec![bin.join("python").display().to_string()]);
    }
}
