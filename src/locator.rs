//! Executable resolution for the sqlfmt binary.
//!
//! Resolution is layered: an explicitly configured path (after placeholder
//! expansion) wins, then a `sqlfmt` binary living next to a discovered Python
//! interpreter, then the bare default command name. The winning candidate is
//! validated with cheap filesystem checks before a `--version` liveness probe
//! confirms it can actually run; a file can look executable and still be
//! broken (wrong architecture, missing shared library, corrupted install).
//!
//! "Not installed" is an expected, user-facing outcome, so the locator
//! reports availability as a flag instead of erroring.

use crate::executor::wait_with_deadline;
use crate::variables::{self, VariableContext};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

/// Command name used when nothing is configured and no sibling is found.
pub const DEFAULT_COMMAND: &str = "sqlfmt";

/// Deadline for the `--version` liveness probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of executable resolution. Built fresh per invocation and never
/// cached across requests; the environment may change between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    /// The resolved path, or the original candidate when resolution failed.
    pub path: String,
    /// Whether the path passed both the filesystem checks and the probe.
    pub is_available: bool,
}

impl ResolvedCommand {
    fn unavailable(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_available: false,
        }
    }
}

/// Resolve the formatter executable to run.
pub fn locate(
    configured: Option<&str>,
    ctx: &VariableContext,
    interpreter: Option<&[String]>,
) -> ResolvedCommand {
    let candidate = select_candidate(configured, ctx, interpreter);
    log::debug!("formatter candidate: {candidate:?}");
    validate(&candidate, ctx)
}

/// Pick the candidate command string, in priority order: configured path,
/// interpreter sibling, default name.
fn select_candidate(
    configured: Option<&str>,
    ctx: &VariableContext,
    interpreter: Option<&[String]>,
) -> String {
    if let Some(path) = configured {
        let resolved = variables::resolve(&[path.to_string()], ctx, interpreter);
        if let Some(first) = resolved.into_iter().next() {
            return first;
        }
    }

    for python in interpreter.unwrap_or_default() {
        if let Some(dir) = Path::new(python).parent() {
            let sibling = dir.join(DEFAULT_COMMAND);
            if sibling.exists() {
                log::debug!("found sqlfmt next to interpreter: {}", sibling.display());
                return sibling.display().to_string();
            }
        }
    }

    DEFAULT_COMMAND.to_string()
}

/// Validate a candidate: locate it on disk, check it is a runnable regular
/// file, then probe it.
fn validate(candidate: &str, ctx: &VariableContext) -> ResolvedCommand {
    let resolved = if has_path_separator(candidate) {
        absolutize(candidate, &ctx.cwd)
    } else {
        // A bare command name is searched on PATH; the search uses the
        // context's environment snapshot, not the ambient one.
        match search_path(candidate, ctx) {
            Some(found) => found,
            None => {
                log::debug!("{candidate:?} not found on PATH");
                return ResolvedCommand::unavailable(candidate);
            }
        }
    };

    let path = resolved.display().to_string();
    if !is_executable_file(&resolved) {
        log::debug!("{path:?} is missing, not a regular file, or not executable");
        return ResolvedCommand::unavailable(path);
    }

    let is_available = probe(&path);
    ResolvedCommand { path, is_available }
}

fn has_path_separator(command: &str) -> bool {
    #[cfg(windows)]
    {
        command.contains(['\\', '/'])
    }
    #[cfg(not(windows))]
    {
        command.contains('/')
    }
}

fn absolutize(candidate: &str, cwd: &Path) -> PathBuf {
    let path = Path::new(candidate);
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    // Components-collect drops interior `.` segments, so the reported path
    // is stable regardless of how the user spelled it.
    joined.components().collect()
}

/// Walk the PATH entries of the environment snapshot looking for an
/// executable named `command`. Empty and relative entries resolve against
/// the context's working directory.
fn search_path(command: &str, ctx: &VariableContext) -> Option<PathBuf> {
    let path_value = ctx.env_var("PATH")?;
    for entry in std::env::split_paths(path_value) {
        let dir = if entry.as_os_str().is_empty() {
            ctx.cwd.clone()
        } else if entry.is_absolute() {
            entry
        } else {
            ctx.cwd.join(entry)
        };
        for candidate in candidate_paths(&dir, command) {
            if is_executable_file(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

#[cfg(not(windows))]
fn candidate_paths(dir: &Path, command: &str) -> Vec<PathBuf> {
    vec![dir.join(command)]
}

#[cfg(windows)]
fn candidate_paths(dir: &Path, command: &str) -> Vec<PathBuf> {
    const DEFAULT_PATHEXT: &[&str] = &[".exe", ".cmd", ".bat", ".com"];
    let base = dir.join(command);
    if base.extension().is_some() {
        return vec![base];
    }
    DEFAULT_PATHEXT
        .iter()
        .map(|ext| {
            let mut with_ext = base.clone().into_os_string();
            with_ext.push(ext);
            PathBuf::from(with_ext)
        })
        .collect()
}

fn is_executable_file(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|meta| meta.is_file() && has_execute_permission(&meta))
}

#[cfg(unix)]
fn has_execute_permission(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn has_execute_permission(meta: &std::fs::Metadata) -> bool {
    meta.is_file()
}

/// Liveness probe: run the candidate with `--version`, all output discarded.
/// Only a clean zero exit within the deadline confirms availability.
fn probe(command: &str) -> bool {
    let spawned = Command::new(command)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    let child = match spawned {
        Ok(child) => child,
        Err(err) => {
            log::debug!("liveness probe could not start {command:?}: {err}");
            return false;
        }
    };

    match wait_with_deadline(child, PROBE_TIMEOUT) {
        Ok(status) if status.success() => true,
        Ok(status) => {
            log::debug!("liveness probe for {command:?} exited with {status}");
            false
        }
        Err(err) => {
            log::debug!("liveness probe for {command:?} failed: {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_with(cwd: &Path, environment: Vec<(String, String)>) -> VariableContext {
        VariableContext::new(None, Vec::new(), cwd.to_path_buf(), environment)
    }

    #[test]
    fn bare_name_without_path_entry_is_unavailable() {
        let ctx = ctx_with(Path::new("/tmp"), Vec::new());
        let resolved = locate(None, &ctx, None);
        assert_eq!(resolved.path, DEFAULT_COMMAND);
        assert!(!resolved.is_available);
    }

    #[test]
    fn missing_configured_path_is_unavailable_with_that_path() {
        let ctx = ctx_with(Path::new("/tmp"), Vec::new());
        let resolved = locate(Some("/nonexistent/sqlfmt"), &ctx, None);
        assert_eq!(resolved.path, "/nonexistent/sqlfmt");
        assert!(!resolved.is_available);
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        const PROBE_OK: &str = "#!/bin/sh\nexit 0\n";
        const PROBE_FAIL: &str = "#!/bin/sh\nexit 1\n";

        fn write_tool(dir: &Path, name: &str, body: &str, mode: u32) -> PathBuf {
            let path = dir.join(name);
            fs::write(&path, body).unwrap();
            let mut perms = fs::metadata(&path).unwrap().permissions();
            perms.set_mode(mode);
            fs::set_permissions(&path, perms).unwrap();
            path
        }

        fn path_env(dir: &Path) -> Vec<(String, String)> {
            vec![("PATH".to_string(), dir.display().to_string())]
        }

        #[test]
        fn bare_name_is_searched_on_path() {
            let dir = tempfile::tempdir().unwrap();
            let tool = write_tool(dir.path(), "sqlfmt", PROBE_OK, 0o755);
            let ctx = ctx_with(Path::new("/tmp"), path_env(dir.path()));
            let resolved = locate(None, &ctx, None);
            assert_eq!(resolved.path, tool.display().to_string());
            assert!(resolved.is_available);
        }

        #[test]
        fn command_with_separator_skips_path_search() {
            // A tool on PATH must not win over a direct relative path.
            let path_dir = tempfile::tempdir().unwrap();
            write_tool(path_dir.path(), "sqlfmt", PROBE_OK, 0o755);

            let work = tempfile::tempdir().unwrap();
            fs::create_dir(work.path().join("tools")).unwrap();
            let local = write_tool(&work.path().join("tools"), "sqlfmt", PROBE_OK, 0o755);

            let mut env = path_env(path_dir.path());
            env.push(("HOME".to_string(), "/home/ada".to_string()));
            let ctx = ctx_with(work.path(), env);
            let resolved = locate(Some("./tools/sqlfmt"), &ctx, None);
            assert_eq!(resolved.path, local.display().to_string());
            assert!(resolved.is_available);
        }

        #[test]
        fn non_executable_file_is_rejected() {
            let dir = tempfile::tempdir().unwrap();
            let tool = write_tool(dir.path(), "sqlfmt", PROBE_OK, 0o644);
            let ctx = ctx_with(dir.path(), Vec::new());
            let resolved = locate(Some(tool.display().to_string().as_str()), &ctx, None);
            assert_eq!(resolved.path, tool.display().to_string());
            assert!(!resolved.is_available);
        }

        #[test]
        fn directory_is_rejected() {
            let dir = tempfile::tempdir().unwrap();
            let subdir = dir.path().join("sqlfmt");
            fs::create_dir(&subdir).unwrap();
            let ctx = ctx_with(dir.path(), Vec::new());
            let resolved = locate(Some(subdir.display().to_string().as_str()), &ctx, None);
            assert!(!resolved.is_available);
        }

        #[test]
        fn liveness_probe_rejects_broken_executable() {
            let dir = tempfile::tempdir().unwrap();
            let tool = write_tool(dir.path(), "sqlfmt", PROBE_FAIL, 0o755);
            let ctx = ctx_with(dir.path(), Vec::new());
            let resolved = locate(Some(tool.display().to_string().as_str()), &ctx, None);
            assert_eq!(resolved.path, tool.display().to_string());
            assert!(!resolved.is_available);
        }

        #[test]
        fn sibling_of_interpreter_is_found() {
            let venv = tempfile::tempdir().unwrap();
            let bin = venv.path().join("bin");
            fs::create_dir(&bin).unwrap();
            let python = write_tool(&bin, "python", PROBE_OK, 0o755);
            let sibling = write_tool(&bin, "sqlfmt", PROBE_OK, 0o755);

            let ctx = ctx_with(Path::new("/tmp"), Vec::new());
            let candidates = vec![python.display().to_string()];
            let resolved = locate(None, &ctx, Some(&candidates));
            assert_eq!(resolved.path, sibling.display().to_string());
            assert!(resolved.is_available);
        }

        #[test]
        fn configured_path_wins_over_interpreter_sibling() {
            let venv = tempfile::tempdir().unwrap();
            let bin = venv.path().join("bin");
            fs::create_dir(&bin).unwrap();
            let python = write_tool(&bin, "python", PROBE_OK, 0o755);
            write_tool(&bin, "sqlfmt", PROBE_OK, 0o755);

            let other = tempfile::tempdir().unwrap();
            let configured = write_tool(other.path(), "my-sqlfmt", PROBE_OK, 0o755);

            let ctx = ctx_with(Path::new("/tmp"), Vec::new());
            let candidates = vec![python.display().to_string()];
            let resolved = locate(
                Some(configured.display().to_string().as_str()),
                &ctx,
                Some(&candidates),
            );
            assert_eq!(resolved.path, configured.display().to_string());
        }

        #[test]
        fn configured_path_expands_placeholders() {
            let dir = tempfile::tempdir().unwrap();
            let tool = write_tool(dir.path(), "sqlfmt", PROBE_OK, 0o755);
            let ctx = VariableContext::new(
                Some(dir.path().to_path_buf()),
                Vec::new(),
                PathBuf::from("/tmp"),
                Vec::new(),
            );
            let resolved = locate(Some("${workspaceFolder}/sqlfmt"), &ctx, None);
            assert_eq!(resolved.path, tool.display().to_string());
            assert!(resolved.is_available);
        }
    }
}
