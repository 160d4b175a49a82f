//! Per-request assembly of a formatter invocation.
//!
//! The driver coordinates the pieces a single formatting request needs:
//! capture the variable context, discover the interpreter, resolve the
//! executable, expand the configured arguments, and hand the result to the
//! executor. Everything here is built fresh per request and thrown away;
//! two concurrent requests share nothing.

use crate::config::RunnerConfig;
use crate::executor::{FormatterError, FormatterExecutor, Invocation};
use crate::interpreter::InterpreterDiscovery;
use crate::locator::{self, ResolvedCommand};
use crate::variables::{self, VariableContext};
use std::io;
use std::path::PathBuf;

/// A prepared formatting request: resolved command, expanded arguments, and
/// the executor to run them with.
#[derive(Debug)]
pub struct FormatterDriver {
    context: VariableContext,
    command: ResolvedCommand,
    args: Vec<String>,
    executor: FormatterExecutor,
}

impl FormatterDriver {
    /// Resolve everything needed to run the formatter once.
    ///
    /// The workspace root (when known) becomes `${workspaceFolder}`, a named
    /// folder entry under its directory name, and the child's working
    /// directory.
    pub fn prepare(
        config: &RunnerConfig,
        workspace_root: Option<PathBuf>,
        discovery: &dyn InterpreterDiscovery,
    ) -> io::Result<Self> {
        let mut folders: Vec<(String, PathBuf)> = Vec::new();
        if let Some(root) = &workspace_root
            && let Some(name) = root.file_name().and_then(|name| name.to_str())
        {
            folders.push((name.to_string(), root.clone()));
        }
        for (name, path) in &config.workspace_folders {
            folders.push((name.clone(), PathBuf::from(path)));
        }

        let context = VariableContext::from_process(workspace_root, folders)?;
        let candidates = discovery.discover(&context);
        let command = locator::locate(config.path.as_deref(), &context, Some(&candidates));
        let args = variables::resolve(&config.args, &context, Some(&candidates));
        log::info!(
            "resolved formatter: {} (available: {})",
            command.path,
            command.is_available
        );

        Ok(Self {
            context,
            command,
            args,
            executor: FormatterExecutor::new(config.timeout),
        })
    }

    pub fn command(&self) -> &ResolvedCommand {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn context(&self) -> &VariableContext {
        &self.context
    }

    /// Filter mode: format `input` and return the formatted text.
    pub fn format_text(&self, input: &str) -> Result<String, FormatterError> {
        self.require_available()?;
        self.executor.run_as_filter(&self.invocation(), input, None)
    }

    /// Mutate mode: run the formatter over `targets`, letting it rewrite
    /// them on disk.
    pub fn format_in_place(&self, targets: &[PathBuf]) -> Result<(), FormatterError> {
        self.require_available()?;
        self.executor.run_in_place(&self.invocation(), targets, None)
    }

    fn invocation(&self) -> Invocation {
        Invocation {
            command: self.command.path.clone(),
            args: self.args.clone(),
            working_dir: self
                .context
                .workspace_root
                .clone()
                .or_else(|| Some(self.context.cwd.clone())),
        }
    }

    /// An unavailable command short-circuits before any formatting process
    /// is spawned; retrying without the user fixing their install cannot
    /// succeed.
    fn require_available(&self) -> Result<(), FormatterError> {
        if self.command.is_available {
            Ok(())
        } else {
            Err(FormatterError::NotInstalled {
                command: self.command.path.clone(),
            })
        }
    }
}
