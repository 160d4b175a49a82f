//! Configuration loading for sqlfmt-runner.
//!
//! Settings live in `.sqlfmt-runner.toml` / `sqlfmt-runner.toml`, or in a
//! `[tool.sqlfmt-runner]` table inside `pyproject.toml` (sqlfmt itself is a
//! Python tool, so its projects usually already carry one). Discovery walks
//! upward from the starting directory; the directory containing the winning
//! file doubles as the default workspace root.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Dedicated config file names, checked in order in every ancestor directory.
pub const CONFIG_FILE_NAMES: &[&str] = &[".sqlfmt-runner.toml", "sqlfmt-runner.toml"];

const PYPROJECT_FILE: &str = "pyproject.toml";

/// Error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Runner configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct RunnerConfig {
    /// Explicit path to the sqlfmt executable. May contain placeholder
    /// tokens; when absent, the locator falls back to an interpreter sibling
    /// and then the bare command name.
    pub path: Option<String>,

    /// Extra arguments passed to sqlfmt on every run, before the
    /// mode-specific ones. Scalar non-string entries are coerced to strings.
    #[serde(deserialize_with = "coerce_string_vec")]
    pub args: Vec<String>,

    /// Timeout per invocation in milliseconds (0 disables the deadline).
    pub timeout: u64,

    /// Extra named workspace folders, usable as `${workspaceFolder:name}`.
    pub workspace_folders: IndexMap<String, String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            path: None,
            args: Vec::new(),
            timeout: default_timeout(),
            workspace_folders: IndexMap::new(),
        }
    }
}

fn default_timeout() -> u64 {
    30_000
}

/// Coerce TOML scalars in `args` to strings instead of failing outright; a
/// numeric line length in an args list is a cosmetic mistake, not a fatal
/// one. Arrays and tables are still rejected.
fn coerce_string_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<toml::Value>::deserialize(deserializer)?;
    values
        .into_iter()
        .map(|value| match value {
            toml::Value::String(s) => Ok(s),
            toml::Value::Integer(n) => Ok(n.to_string()),
            toml::Value::Float(f) => Ok(f.to_string()),
            toml::Value::Boolean(b) => Ok(b.to_string()),
            _ => Err(serde::de::Error::custom(
                "args entries must be strings, numbers, or booleans",
            )),
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
struct PyprojectRoot {
    #[serde(default)]
    tool: PyprojectTool,
}

#[derive(Debug, Default, Deserialize)]
struct PyprojectTool {
    #[serde(rename = "sqlfmt-runner", default)]
    sqlfmt_runner: Option<RunnerConfig>,
}

/// A loaded configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: RunnerConfig,
    /// The file the configuration was read from; `None` means defaults.
    pub source: Option<PathBuf>,
}

impl LoadedConfig {
    /// Directory containing the source file, the default workspace root.
    pub fn source_dir(&self) -> Option<PathBuf> {
        self.source
            .as_ref()
            .and_then(|path| path.parent())
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }
}

/// Load configuration: an explicit file wins, otherwise discover one upward
/// from `start_dir`, otherwise defaults.
pub fn load(explicit: Option<&Path>, start_dir: &Path) -> Result<LoadedConfig, ConfigError> {
    if let Some(path) = explicit {
        return Ok(LoadedConfig {
            config: read_config_file(path)?,
            source: Some(path.to_path_buf()),
        });
    }
    discover(start_dir)
}

/// Walk `start_dir` and its ancestors for the nearest configuration file.
pub fn discover(start_dir: &Path) -> Result<LoadedConfig, ConfigError> {
    for dir in start_dir.ancestors() {
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                log::debug!("using config file {}", candidate.display());
                return Ok(LoadedConfig {
                    config: read_config_file(&candidate)?,
                    source: Some(candidate),
                });
            }
        }

        let pyproject = dir.join(PYPROJECT_FILE);
        if pyproject.is_file()
            && let Some(config) = read_pyproject(&pyproject)?
        {
            log::debug!("using [tool.sqlfmt-runner] from {}", pyproject.display());
            return Ok(LoadedConfig {
                config,
                source: Some(pyproject),
            });
        }
    }

    Ok(LoadedConfig {
        config: RunnerConfig::default(),
        source: None,
    })
}

fn read_config_file(path: &Path) -> Result<RunnerConfig, ConfigError> {
    // An explicitly passed pyproject.toml gets the table treatment too.
    if path.file_name().is_some_and(|name| name == PYPROJECT_FILE) {
        return Ok(read_pyproject(path)?.unwrap_or_default());
    }

    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn read_pyproject(path: &Path) -> Result<Option<RunnerConfig>, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: PyprojectRoot = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parsed.tool.sqlfmt_runner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config() {
        let config = RunnerConfig::default();
        assert_eq!(config.path, None);
        assert!(config.args.is_empty());
        assert_eq!(config.timeout, 30_000);
        assert!(config.workspace_folders.is_empty());
    }

    #[test]
    fn deserializes_kebab_case_config() {
        let toml = r#"
path = "${workspaceFolder}/.venv/bin/sqlfmt"
args = ["--line-length", "100"]
timeout = 60000

[workspace-folders]
shared = "/work/shared"
"#;
        let config: RunnerConfig = toml::from_str(toml).expect("failed to parse TOML");
        assert_eq!(config.path.as_deref(), Some("${workspaceFolder}/.venv/bin/sqlfmt"));
        assert_eq!(config.args, vec!["--line-length", "100"]);
        assert_eq!(config.timeout, 60_000);
        assert_eq!(config.workspace_folders.get("shared").map(String::as_str), Some("/work/shared"));
    }

    #[test]
    fn coerces_scalar_args_to_strings() {
        let config: RunnerConfig =
            toml::from_str(r#"args = ["--line-length", 100, true]"#).expect("failed to parse TOML");
        assert_eq!(config.args, vec!["--line-length", "100", "true"]);
    }

    #[test]
    fn rejects_structured_args_entries() {
        let result = toml::from_str::<RunnerConfig>(r#"args = [["nested"]]"#);
        assert!(result.is_err());
    }

    #[test]
    fn serializes_back_to_kebab_case() {
        let config = RunnerConfig {
            path: Some("sqlfmt".to_string()),
            ..Default::default()
        };
        let rendered = toml::to_string(&config).expect("failed to serialize");
        assert!(rendered.contains("path = \"sqlfmt\""));
        assert!(rendered.contains("timeout = 30000"));
    }

    #[test]
    fn discovers_config_in_ancestor_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".sqlfmt-runner.toml"), "timeout = 1000\n").unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let loaded = discover(&nested).unwrap();
        assert_eq!(loaded.config.timeout, 1000);
        assert_eq!(loaded.source, Some(dir.path().join(".sqlfmt-runner.toml")));
        assert_eq!(loaded.source_dir(), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn dedicated_file_wins_over_pyproject_in_same_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".sqlfmt-runner.toml"), "timeout = 1\n").unwrap();
        fs::write(
            dir.path().join("pyproject.toml"),
            "[tool.sqlfmt-runner]\ntimeout = 2\n",
        )
        .unwrap();

        let loaded = discover(dir.path()).unwrap();
        assert_eq!(loaded.config.timeout, 1);
    }

    #[test]
    fn reads_pyproject_tool_table() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("pyproject.toml"),
            "[project]\nname = \"demo\"\n\n[tool.sqlfmt-runner]\nargs = [\"--fast\"]\n",
        )
        .unwrap();

        let loaded = discover(dir.path()).unwrap();
        assert_eq!(loaded.config.args, vec!["--fast"]);
        assert_eq!(loaded.source, Some(dir.path().join("pyproject.toml")));
    }

    #[test]
    fn pyproject_without_table_falls_through_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("pyproject.toml"), "[project]\nname = \"demo\"\n").unwrap();

        let loaded = discover(dir.path()).unwrap();
        assert_eq!(loaded.config, RunnerConfig::default());
        assert_eq!(loaded.source, None);
    }

    #[test]
    fn explicit_path_wins_over_discovery() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".sqlfmt-runner.toml"), "timeout = 1\n").unwrap();
        let other = dir.path().join("other.toml");
        fs::write(&other, "timeout = 2\n").unwrap();

        let loaded = load(Some(other.as_path()), dir.path()).unwrap();
        assert_eq!(loaded.config.timeout, 2);
        assert_eq!(loaded.source, Some(other));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("absent.toml");
        let result = load(Some(absent.as_path()), dir.path());
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
