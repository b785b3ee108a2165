//! Native compiler handoff
//!
//! Writes nothing itself: takes a `.cpp` file that already exists and runs the
//! configured C++ compiler on it. Diagnostics from the compiler are returned
//! verbatim.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::config::DEFAULT_CXX;

/// C++ language standard passed to the native compiler.
pub const CXX_STANDARD: &str = "-std=c++17";
/// Optimization level passed to the native compiler.
pub const OPT_LEVEL: &str = "-O3";

/// What the native compiler should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Executable,
    /// Assembly listing (`-S`).
    Assembly,
}

#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("native compiler '{program}' is not installed")]
    NotInstalled { program: String },

    #[error("failed to run '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("native compilation failed ({status})")]
    Failed { status: String, stderr: String },
}

/// An external C++ compiler such as `g++` or `clang++`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeCompiler {
    pub program: String,
    pub extra_args: Vec<String>,
}

impl Default for NativeCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_CXX)
    }
}

impl NativeCompiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Append an argument placed before the input file.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Whether `PROGRAM --version` runs successfully.
    pub fn is_installed(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success())
    }

    /// Full argument list for one invocation.
    pub fn args(&self, cpp: &Path, output: &Path, kind: OutputKind) -> Vec<String> {
        let mut args = Vec::new();
        if kind == OutputKind::Assembly {
            args.push("-S".to_string());
        }
        args.push(CXX_STANDARD.to_string());
        args.push(OPT_LEVEL.to_string());
        args.extend(self.extra_args.iter().cloned());
        args.push(cpp.display().to_string());
        args.push("-o".to_string());
        args.push(output.display().to_string());
        args
    }

    /// Compile `cpp` into `output`.
    #[tracing::instrument(skip(self), fields(program = %self.program))]
    pub fn compile(&self, cpp: &Path, output: &Path, kind: OutputKind) -> Result<PathBuf, ToolchainError> {
        let result = Command::new(&self.program)
            .args(self.args(cpp, output, kind))
            .output()
            .map_err(|source| match source.kind() {
                io::ErrorKind::NotFound => ToolchainError::NotInstalled {
                    program: self.program.clone(),
                },
                _ => ToolchainError::Spawn {
                    program: self.program.clone(),
                    source,
                },
            })?;

        if !result.status.success() {
            return Err(ToolchainError::Failed {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
            });
        }
        tracing::debug!(output = %output.display(), "native compilation succeeded");
        Ok(output.to_path_buf())
    }
}

/// Default executable path for an entry file: the path without its extension (`.exe` on Windows).
pub fn default_executable(entry: &Path) -> PathBuf {
    let stem = entry.with_extension("");
    if cfg!(windows) {
        stem.with_extension("exe")
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executable_args() {
        let cxx = NativeCompiler::new("g++");
        assert_eq!(cxx.args(Path::new("out.cpp"), Path::new("prog"), OutputKind::Executable), vec![
            "-std=c++17",
            "-O3",
            "out.cpp",
            "-o",
            "prog"
        ]);
    }

    #[test]
    fn test_assembly_args_with_extra() {
        let cxx = NativeCompiler::new("clang++").with_arg("-Wall");
        assert_eq!(cxx.args(Path::new("out.cpp"), Path::new("out.s"), OutputKind::Assembly), vec![
            "-S",
            "-std=c++17",
            "-O3",
            "-Wall",
            "out.cpp",
            "-o",
            "out.s"
        ]);
    }

    #[test]
    fn test_missing_program() {
        let cxx = NativeCompiler::new("pypp-no-such-compiler");
        assert!(!cxx.is_installed());
        let err = cxx
            .compile(Path::new("out.cpp"), Path::new("out"), OutputKind::Executable)
            .unwrap_err();
        assert!(matches!(err, ToolchainError::NotInstalled { .. }));
    }

    #[test]
    fn test_default_executable() {
        let exe = default_executable(Path::new("dir/hello.pypp"));
        if cfg!(windows) {
            assert_eq!(exe, PathBuf::from("dir/hello.exe"));
        } else {
            assert_eq!(exe, PathBuf::from("dir/hello"));
        }
    }
}
