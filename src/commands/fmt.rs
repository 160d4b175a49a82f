//! Handler for the `fmt` command: filter-mode formatting of stdin or files.
//!
//! The document bytes are read in-process and written straight to the
//! formatter's stdin; the original file is only touched when `--write` is
//! given, and then only with the formatter's stdout.

use super::{prepare_driver, report_failure};
use crate::cli_types::{FmtArgs, GlobalOptions};
use crate::driver::FormatterDriver;
use crate::exit_codes::{FORMAT_FAILED, SUCCESS};
use crate::executor::FormatterError;
use anyhow::{Context, bail};
use colored::Colorize;
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

pub fn handle_fmt(global: &GlobalOptions, args: &FmtArgs) -> anyhow::Result<i32> {
    let read_stdin = args.stdin || args.paths.iter().any(|p| p == "-") || args.paths.is_empty();
    let has_file_paths = args.paths.iter().any(|p| p != "-");
    if read_stdin && has_file_paths {
        bail!("cannot combine stdin with file paths");
    }
    if read_stdin && args.write {
        bail!("--write requires file paths");
    }

    let (driver, _loaded) = prepare_driver(global, None)?;

    if read_stdin {
        return format_stdin(&driver, args.check);
    }

    let files = collect_targets(&args.paths)?;
    if files.is_empty() {
        println!("No SQL files found");
        return Ok(SUCCESS);
    }

    if args.write {
        rewrite_files(&driver, &files)
    } else if args.check {
        check_files(&driver, &files)
    } else {
        print_formatted(&driver, &files)
    }
}

fn format_stdin(driver: &FormatterDriver, check: bool) -> anyhow::Result<i32> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read from stdin")?;

    match driver.format_text(&input) {
        Ok(formatted) => {
            if check {
                if formatted == input {
                    Ok(SUCCESS)
                } else {
                    eprintln!("stdin would be reformatted");
                    Ok(FORMAT_FAILED)
                }
            } else {
                // The formatter's output is the result, byte for byte.
                print!("{formatted}");
                Ok(SUCCESS)
            }
        }
        Err(err) => Ok(report_failure(&err)),
    }
}

/// Format every file through the filter and rewrite the ones that changed.
/// Files are independent, so the batch runs in parallel.
fn rewrite_files(driver: &FormatterDriver, files: &[PathBuf]) -> anyhow::Result<i32> {
    let results: Vec<(&PathBuf, Result<bool, FormatterError>)> = files
        .par_iter()
        .map(|path| (path, rewrite_file(driver, path)))
        .collect();

    let mut changed = 0usize;
    let mut exit = SUCCESS;
    for (path, result) in results {
        match result {
            Ok(true) => {
                changed += 1;
                log::debug!("reformatted {}", path.display());
            }
            Ok(false) => {}
            Err(err) => {
                eprintln!("{}:", path.display().to_string().bold());
                exit = exit.max(report_failure(&err));
            }
        }
    }

    if exit == SUCCESS {
        let unchanged = files.len() - changed;
        println!(
            "{} {changed} file(s) reformatted, {unchanged} left unchanged",
            "✓".green()
        );
    }
    Ok(exit)
}

fn rewrite_file(driver: &FormatterDriver, path: &Path) -> Result<bool, FormatterError> {
    let input = fs::read_to_string(path)?;
    let formatted = driver.format_text(&input)?;
    if formatted == input {
        return Ok(false);
    }
    fs::write(path, &formatted)?;
    Ok(true)
}

fn check_files(driver: &FormatterDriver, files: &[PathBuf]) -> anyhow::Result<i32> {
    let mut exit = SUCCESS;
    for path in files {
        let input = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        match driver.format_text(&input) {
            Ok(formatted) if formatted != input => {
                println!("{} would be reformatted", path.display());
                exit = exit.max(FORMAT_FAILED);
            }
            Ok(_) => {}
            Err(err) => {
                eprintln!("{}:", path.display().to_string().bold());
                exit = exit.max(report_failure(&err));
            }
        }
    }
    Ok(exit)
}

fn print_formatted(driver: &FormatterDriver, files: &[PathBuf]) -> anyhow::Result<i32> {
    let mut exit = SUCCESS;
    for path in files {
        let input = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        match driver.format_text(&input) {
            Ok(formatted) => print!("{formatted}"),
            Err(err) => {
                eprintln!("{}:", path.display().to_string().bold());
                exit = exit.max(report_failure(&err));
            }
        }
    }
    Ok(exit)
}

/// Expand the command-line paths into concrete SQL files. Directories are
/// walked with `.gitignore` respected; explicitly named files are taken
/// as-is.
fn collect_targets(paths: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for raw in paths {
        if raw == "-" {
            continue;
        }
        let path = PathBuf::from(raw);
        if path.is_dir() {
            files.extend(discover_sql_files(&path));
        } else if path.is_file() {
            files.push(path);
        } else {
            bail!("path not found: {raw}");
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn discover_sql_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkBuilder::new(root).build().flatten() {
        let path = entry.path();
        if entry.file_type().is_some_and(|t| t.is_file())
            && path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("sql"))
        {
            files.push(path.to_path_buf());
        }
    }
    files
}
