//! CLI module for the Py++ compiler
//!
//! ## Commands
//!
//! - `build <file>` - Compile to C++ and run the native compiler
//! - `emit <file>` - Print the generated C++ translation unit
//! - `<file>` - Shorthand for `build <file>`
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;
pub mod progress;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
    /// A function header could not be parsed.
    pub const MALFORMED_SOURCE: ExitCode = ExitCode(2);
    /// The entry file or an imported module does not exist.
    pub const NOT_FOUND: ExitCode = ExitCode(404);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// The Py++ compiler
#[derive(Parser, Debug)]
#[command(name = "pypp")]
#[command(version = VERSION)]
#[command(about = "Compile Py++ programs to C++ and native executables", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// File to build (default action when no subcommand given)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub build: BuildArgs,
}

/// Options shared by `build` and the bare `pypp FILE` form.
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Executable to produce (default: FILE without its extension)
    #[arg(short = 'o', long = "output", value_name = "OUT")]
    pub output: Option<PathBuf>,

    /// Produce an assembly listing (out.s) instead of an executable
    #[arg(long = "dump-asm")]
    pub dump_asm: bool,

    /// Keep the generated out.cpp after a successful build
    #[arg(short = 'p', long = "preserve")]
    pub preserve: bool,

    /// Native C++ compiler (default: $PYPP_CXX or g++)
    #[arg(long = "cxx", value_name = "PROGRAM")]
    pub cxx: Option<String>,

    /// Global modules directory searched first for imports
    #[arg(long = "modules", value_name = "DIR")]
    pub modules: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile to C++ and build an executable
    Build {
        /// Source file to compile
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[command(flatten)]
        args: BuildArgs,
    },

    /// Print the generated C++ to stdout
    Emit {
        /// Source file to compile
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Leave out the headers and runtime helpers
        #[arg(long = "no-prelude")]
        no_prelude: bool,
        /// Global modules directory searched first for imports
        #[arg(long = "modules", value_name = "DIR")]
        modules: Option<PathBuf>,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Some(Command::Build { file, args }) => commands::build_file(&file, &args),
        Some(Command::Emit {
            file,
            no_prelude,
            modules,
        }) => commands::emit_cpp(&file, !no_prelude, modules),
        None => match cli.file {
            Some(file) => commands::build_file(&file, &cli.build),
            None => Err(CliError::failure("Usage: pypp <file>")),
        },
    }
}

// ============================================================================
// Tests
// ============================================================================
