use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process;

use sqlfmt_runner::cli_types::{FmtArgs, GlobalOptions, WorkspaceArgs};
use sqlfmt_runner::commands;
use sqlfmt_runner::exit_codes::TOOL_ERROR;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Workspace root for ${workspaceFolder} and interpreter discovery
    #[arg(long, global = true)]
    workspace_root: Option<PathBuf>,

    /// Show detailed output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Command to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Format SQL through sqlfmt, reading stdin or files (the originals are
    /// untouched unless --write is given)
    Fmt(FmtArgs),
    /// Run sqlfmt over a whole workspace, rewriting files in place
    Workspace(WorkspaceArgs),
    /// Show which sqlfmt executable would be used
    Locate,
    /// Initialize a new configuration file
    Init,
    /// Print version information
    Version,
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let global = GlobalOptions {
        config: cli.config.clone(),
        workspace_root: cli.workspace_root.clone(),
    };

    let result = match &cli.command {
        Commands::Fmt(args) => commands::fmt::handle_fmt(&global, args),
        Commands::Workspace(args) => commands::workspace::handle_workspace(&global, args),
        Commands::Locate => commands::locate::handle_locate(&global),
        Commands::Init => commands::init::handle_init(),
        Commands::Version => {
            commands::version::handle_version();
            Ok(sqlfmt_runner::exit_codes::SUCCESS)
        }
    };

    match result {
        Ok(code) => process::exit(code),
        Err(err) => {
            log::error!("{err:#}");
            eprintln!("{}: {err:#}", "Error".red().bold());
            process::exit(TOOL_ERROR);
        }
    }
}
