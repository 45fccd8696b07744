use colored::Colorize;
use gsi_deploy_core::GsiError;
use std::fmt;
use std::process;

use crate::config::ConfigFileError;

/// Exit codes for the CLI.
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
/// Conventional 128 + SIGINT
pub const EXIT_CANCELLED: i32 = 130;

/// Unified error type for CLI operations.
pub enum CliError {
    /// Extraction or reconciliation failure.
    Gsi(GsiError),
    /// Config file issues.
    Config(String),
    /// Bad file path, unreadable input, parse failure.
    Input(String),
    /// Argument / usage errors, including out-of-range settings.
    Usage(String),
    /// Some tables failed while others carried on (`--keep-going`).
    Incomplete(usize),
    /// Interrupted before every index was handled.
    Cancelled,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Gsi(e) => {
                write!(f, "{} {e}", "error:".red().bold())?;
                if matches!(e.root(), GsiError::ResourceInUse(_) | GsiError::Timeout { .. }) {
                    write!(
                        f,
                        "\n  {} re-run 'gsi-deploy reconcile' once the table is idle; existing indexes are skipped",
                        "help:".cyan().bold()
                    )?;
                }
                Ok(())
            }
            CliError::Config(msg) => write!(f, "{} {msg}", "error:".red().bold()),
            CliError::Input(msg) => write!(f, "{} {msg}", "error:".red().bold()),
            CliError::Usage(msg) => write!(f, "{} {msg}", "error:".red().bold()),
            CliError::Incomplete(failed) => write!(
                f,
                "{} {failed} table(s) failed to reconcile",
                "error:".red().bold()
            ),
            CliError::Cancelled => write!(
                f,
                "{} cancelled; indexes already requested keep building\n  {} re-run 'gsi-deploy reconcile' to resume",
                "error:".red().bold(),
                "help:".cyan().bold(),
            ),
        }
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<GsiError> for CliError {
    fn from(e: GsiError) -> Self {
        CliError::Gsi(e)
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        match e {
            ConfigFileError::InvalidValue(msg) => CliError::Usage(msg),
            other => CliError::Config(other.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Input(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Input(format!("JSON parse error: {e}"))
    }
}

/// Exit code for an error.
pub fn exit_code(err: &CliError) -> i32 {
    match err {
        CliError::Usage(_) => EXIT_USAGE,
        CliError::Cancelled => EXIT_CANCELLED,
        _ => EXIT_ERROR,
    }
}

/// Print error and exit with the appropriate code.
pub fn exit_with_error(err: CliError) -> ! {
    eprintln!("{err}");
    process::exit(exit_code(&err))
}

pub type CliResult<T> = std::result::Result<T, CliError>;
