//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::toolchain::{NativeCompiler, OutputKind, ToolchainError, default_executable};
use crate::config::{CXX_ENV, CompilerConfig, DEFAULT_CXX};
use crate::frontend::diagnostics::CompileError;
use crate::Compiler;

use super::progress::ConsoleProgress;
use super::{BuildArgs, CliError, CliResult, ExitCode};

/// Generated translation unit, written to the working directory.
pub const CPP_OUTPUT: &str = "out.cpp";
/// Assembly listing produced by `--dump-asm`.
pub const ASM_OUTPUT: &str = "out.s";

/// Environment-derived config with an optional global modules override.
fn config_for(modules: Option<PathBuf>) -> CompilerConfig {
    let config = CompilerConfig::from_env();
    match modules {
        Some(dir) => config.with_global_modules_dir(dir),
        None => config,
    }
}

/// Map a compile error to its exit code and a rendered diagnostic.
pub fn compile_failure(err: CompileError) -> CliError {
    let code = if err.is_not_found() {
        ExitCode::NOT_FOUND
    } else if matches!(err, CompileError::MalformedFunction { .. }) {
        ExitCode::MALFORMED_SOURCE
    } else {
        ExitCode::FAILURE
    };
    CliError::new(format!("{:?}", miette::Report::new(err)), code)
}

/// Native compiler from `--cxx`, then `$PYPP_CXX`, then the default.
fn native_compiler(cxx: Option<&str>) -> NativeCompiler {
    let program = cxx
        .map(str::to_string)
        .or_else(|| env::var(CXX_ENV).ok().filter(|p| !p.is_empty()))
        .unwrap_or_else(|| DEFAULT_CXX.to_string());
    NativeCompiler::new(program)
}

/// Print the generated C++ for a file.
pub fn emit_cpp(file: &Path, prelude: bool, modules: Option<PathBuf>) -> CliResult<ExitCode> {
    let config = config_for(modules).with_prelude(prelude);
    let cpp = Compiler::new(config).compile(file).map_err(compile_failure)?;
    print!("{cpp}");
    Ok(ExitCode::SUCCESS)
}

/// Compile a file to C++ and run the native compiler on it.
pub fn build_file(file: &Path, args: &BuildArgs) -> CliResult<ExitCode> {
    let cxx = native_compiler(args.cxx.as_deref());
    if !cxx.is_installed() {
        return Err(CliError::failure(format!(
            "please install the {} compiler (or point {} at one)",
            cxx.program, CXX_ENV
        )));
    }

    let cpp = Compiler::new(config_for(args.modules.clone()))
        .with_progress(ConsoleProgress::new())
        .compile(file)
        .map_err(compile_failure)?;

    let cpp_path = PathBuf::from(CPP_OUTPUT);
    fs::write(&cpp_path, cpp)
        .map_err(|e| CliError::failure(format!("Error writing '{}': {}", cpp_path.display(), e)))?;

    let (kind, output) = if args.dump_asm {
        (OutputKind::Assembly, PathBuf::from(ASM_OUTPUT))
    } else {
        let output = args.output.clone().unwrap_or_else(|| default_executable(file));
        (OutputKind::Executable, output)
    };

    match cxx.compile(&cpp_path, &output, kind) {
        Ok(output) => {
            println!("Compilation successful: {}", output.display());
            if !args.preserve {
                fs::remove_file(&cpp_path)
                    .map_err(|e| CliError::failure(format!("Error removing '{}': {}", cpp_path.display(), e)))?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(ToolchainError::Failed { stderr, .. }) => Err(CliError::failure(format!(
            "Compilation failed:\n\n{}\n{} preserved for debugging",
            stderr.trim_end(),
            CPP_OUTPUT
        ))),
        Err(e) => Err(CliError::failure(format!("Error running {}: {}", cxx.program, e))),
    }
}
