//! Process exit codes, one per failure class so CI scripts can tell a
//! formatting rejection apart from a broken install.

/// Formatting completed, or nothing needed formatting.
pub const SUCCESS: i32 = 0;

/// sqlfmt rejected the input, or `--check` found differences.
pub const FORMAT_FAILED: i32 = 1;

/// The formatter is not installed, or configuration/spawning failed.
pub const TOOL_ERROR: i32 = 2;
