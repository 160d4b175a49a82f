//! Placeholder expansion for configured paths and arguments.
//!
//! Configuration strings may reference runtime values through literal tokens
//! like `${workspaceFolder}` or `${env:NAME}`. Expansion works off a
//! [`VariableContext`] snapshot that is built once per request and passed in
//! explicitly, so resolution is deterministic and tests can run against a
//! synthetic environment instead of the ambient one.
//!
//! Substitution is plain ordered find-and-replace: each table entry replaces
//! the first occurrence of its token, entries are applied in insertion order,
//! and there is no recursive expansion. Unrecognized tokens pass through
//! verbatim.

use indexmap::IndexMap;
use std::io;
use std::path::PathBuf;

/// Token replaced by the full interpreter candidate list, element-wise.
///
/// Only an argument that is *exactly* this token is spliced; a longer string
/// containing it is left alone.
pub const INTERPRETER_TOKEN: &str = "${interpreter}";

/// Snapshot of the runtime values available for placeholder expansion.
#[derive(Debug, Clone)]
pub struct VariableContext {
    /// Home directory (`HOME`, falling back to `USERPROFILE`).
    pub home: Option<String>,
    /// Root of the active workspace, if any.
    pub workspace_root: Option<PathBuf>,
    /// Current working directory.
    pub cwd: PathBuf,
    /// Named workspace folders, in declaration order.
    pub workspace_folders: Vec<(String, PathBuf)>,
    /// Environment snapshot, in iteration order.
    pub environment: Vec<(String, String)>,
}

impl VariableContext {
    /// Capture the live process environment and working directory.
    pub fn from_process(
        workspace_root: Option<PathBuf>,
        workspace_folders: Vec<(String, PathBuf)>,
    ) -> io::Result<Self> {
        let cwd = std::env::current_dir()?;
        let environment: Vec<(String, String)> = std::env::vars().collect();
        Ok(Self::new(workspace_root, workspace_folders, cwd, environment))
    }

    /// Build a context from explicit values. This is the deterministic path
    /// used by tests and embedders.
    pub fn new(
        workspace_root: Option<PathBuf>,
        workspace_folders: Vec<(String, PathBuf)>,
        cwd: PathBuf,
        environment: Vec<(String, String)>,
    ) -> Self {
        let home = lookup(&environment, "HOME").or_else(|| lookup(&environment, "USERPROFILE"));
        Self {
            home,
            workspace_root,
            cwd,
            workspace_folders,
            environment,
        }
    }

    /// Value of an environment variable in this snapshot.
    pub fn env_var(&self, name: &str) -> Option<&str> {
        self.environment
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The substitution table, keyed by literal token. Insertion order is
    /// part of the contract: entries are applied to each string in this
    /// order, first occurrence only.
    fn substitutions(&self) -> IndexMap<String, String> {
        let mut table = IndexMap::new();
        if let Some(home) = &self.home {
            table.insert("${userHome}".to_string(), home.clone());
        }
        if let Some(root) = &self.workspace_root {
            table.insert("${workspaceFolder}".to_string(), root.display().to_string());
        }
        table.insert("${cwd}".to_string(), self.cwd.display().to_string());
        for (name, path) in &self.workspace_folders {
            table.insert(format!("${{workspaceFolder:{name}}}"), path.display().to_string());
        }
        for (key, value) in &self.environment {
            // An empty environment variable is not a usable substitution.
            if !value.is_empty() {
                table.insert(format!("${{env:{key}}}"), value.clone());
            }
        }
        table
    }
}

fn lookup(environment: &[(String, String)], name: &str) -> Option<String> {
    environment
        .iter()
        .find(|(key, value)| key == name && !value.is_empty())
        .map(|(_, value)| value.clone())
}

/// Expand placeholder tokens in `values`.
///
/// When `interpreter` is provided, an element that is exactly
/// [`INTERPRETER_TOKEN`] is replaced by the whole candidate list spliced in
/// place, which can change the element count. All other elements get the
/// substitution table applied.
pub fn resolve(
    values: &[String],
    ctx: &VariableContext,
    interpreter: Option<&[String]>,
) -> Vec<String> {
    let table = ctx.substitutions();

    let mut spliced = Vec::with_capacity(values.len());
    for value in values {
        if let Some(candidates) = interpreter
            && value == INTERPRETER_TOKEN
        {
            spliced.extend(candidates.iter().cloned());
        } else {
            spliced.push(value.clone());
        }
    }

    spliced
        .into_iter()
        .map(|mut value| {
            if ctx.workspace_root.is_none() && value.contains("${workspaceFolder}") {
                log::warn!("no workspace root is active; leaving {value:?} unexpanded");
            }
            for (token, replacement) in &table {
                value = value.replacen(token.as_str(), replacement.as_str(), 1);
            }
            value
        })
        .collect()
}
