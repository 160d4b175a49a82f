use clap::Args;
use std::path::PathBuf;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Explicit configuration file, bypassing discovery.
    pub config: Option<PathBuf>,
    /// Workspace root for `${workspaceFolder}` and interpreter discovery.
    pub workspace_root: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct FmtArgs {
    /// Files or directories to format (use '-' for stdin)
    #[arg(required = false)]
    pub paths: Vec<String>,

    /// Read from stdin and print the formatted result to stdout
    #[arg(long)]
    pub stdin: bool,

    /// Rewrite files in place instead of printing to stdout
    #[arg(short, long)]
    pub write: bool,

    /// Exit with code 1 if any file would change (for CI)
    #[arg(long)]
    pub check: bool,
}

#[derive(Args, Debug)]
pub struct WorkspaceArgs {
    /// Workspace root to format (defaults to the discovered workspace)
    pub root: Option<PathBuf>,
}
