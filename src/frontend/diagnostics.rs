//! Diagnostics and error reporting for Py++
//!
//! Only two kinds of problems stop a compilation: a file that cannot be found
//! or read, and a function header that cannot be parsed. Everything else
//! (malformed `define` lines, unterminated blocks, repeated imports) is
//! tolerated and left for the native compiler to judge.

use std::io;
use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// A fatal compilation error.
#[derive(Debug, Error, Diagnostic)]
pub enum CompileError {
    #[error("file '{}' not found", .path.display())]
    #[diagnostic(code(pypp::entry_not_found))]
    EntryNotFound { path: PathBuf },

    #[error("module '{name}' not found in global or local paths (imported from '{}')", .importer.display())]
    #[diagnostic(code(pypp::module_not_found))]
    ModuleNotFound {
        name: String,
        importer: PathBuf,
        searched: Vec<PathBuf>,
        #[help]
        hint: String,
    },

    #[error("module directory for '{name}' has no index file '{}'", .path.display())]
    #[diagnostic(code(pypp::missing_index))]
    MissingIndex { name: String, path: PathBuf },

    #[error("cannot read '{}'", .path.display())]
    #[diagnostic(code(pypp::io))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error at line {line}: {reason}")]
    #[diagnostic(
        code(pypp::malformed_function),
        help("function definitions look like `fn name(params) -> return_type`")
    )]
    MalformedFunction {
        /// 1-based line in the resolved unit, with imports spliced in place and
        /// `#define` lines removed.
        line: usize,
        reason: pypp_syntax::SyntaxError,
        #[source_code]
        src: NamedSource<String>,
        #[label("cannot parse this function header")]
        span: SourceSpan,
    },
}

impl CompileError {
    /// Build a [`CompileError::ModuleNotFound`] listing every location searched.
    pub fn module_not_found(name: impl Into<String>, importer: impl Into<PathBuf>, searched: Vec<PathBuf>) -> Self {
        let hint = format!("searched: {}", display_paths(&searched));
        CompileError::ModuleNotFound {
            name: name.into(),
            importer: importer.into(),
            searched,
            hint,
        }
    }

    /// Whether this error is a missing entry file or module.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CompileError::EntryNotFound { .. } | CompileError::ModuleNotFound { .. } | CompileError::MissingIndex { .. }
        )
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
