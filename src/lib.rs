#![forbid(unsafe_code)]
//! Py++ Compiler
//!
//! Py++ is a small keyword-delimited language that compiles to C++17. This
//! crate holds the whole pipeline:
//!
//! 1. macro preprocessing of every file (`define`)
//! 2. import resolution with per-module symbol namespacing (`imp`)
//! 3. a second preprocessing pass over the combined text
//! 4. range literal expansion and statement transpilation
//!
//! The result is a self-contained C++ translation unit; invoking the native
//! compiler on it is left to [`backend::toolchain`].
//!
//! ```no_run
//! let cpp = pypp::compile(std::path::Path::new("hello.pypp"))?;
//! println!("{cpp}");
//! # Ok::<(), pypp::CompileError>(())
//! ```
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod backend;
pub mod cli;
pub mod config;
pub mod frontend;
pub mod progress;

use std::path::Path;

pub use backend::transpiler::Transpiler;
pub use config::{CompilerConfig, TranspileOptions};
pub use frontend::diagnostics::CompileError;
pub use frontend::module::{
    CompilationContext, FsLoader, MemoryLoader, ModuleReport, ModuleResolver, SearchPaths, SourceLoader,
};
pub use frontend::preprocessor::preprocess;
pub use progress::{NoProgress, Progress, TracingProgress};

/// Compile an entry file to C++ with the environment's search paths and the real filesystem.
pub fn compile(entry: &Path) -> Result<String, CompileError> {
    Compiler::new(CompilerConfig::from_env()).compile(entry)
}

/// A configured compiler. Each call to [`Compiler::compile`] is an independent compilation.
pub struct Compiler {
    config: CompilerConfig,
    loader: Box<dyn SourceLoader>,
    progress: Box<dyn Progress>,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            loader: Box::new(FsLoader),
            progress: Box::new(NoProgress),
        }
    }

    /// Read sources through `loader` instead of the filesystem.
    pub fn with_loader(mut self, loader: impl SourceLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Report progress to `sink`.
    pub fn with_progress(mut self, sink: impl Progress + 'static) -> Self {
        self.progress = Box::new(sink);
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Resolve, preprocess and transpile `entry` and everything it imports.
    #[tracing::instrument(skip_all, fields(entry = %entry.display()))]
    pub fn compile(&self, entry: &Path) -> Result<String, CompileError> {
        let mut ctx = CompilationContext::new();
        let resolver = ModuleResolver::new(self.loader.as_ref(), &self.config.search, self.progress.as_ref());
        let combined = resolver.resolve(entry, &mut ctx)?;
        tracing::debug!(modules = ctx.modules().len(), "imports resolved");

        // Diagnostics point into the combined text, not the entry file alone.
        let source = preprocess(&combined);
        Transpiler::new(&self.config.transpile, self.progress.as_ref())
            .with_source_name(format!("{} (resolved unit)", entry.display()))
            .transpile(&source)
    }

    /// Preprocess and transpile in-memory text. `imp` lines are not resolved.
    pub fn compile_source(&self, text: &str) -> Result<String, CompileError> {
        let source = preprocess(text);
        Transpiler::new(&self.config.transpile, self.progress.as_ref()).transpile(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare() -> CompilerConfig {
        CompilerConfig::new().with_prelude(false)
    }

    #[test]
    fn test_compile_source_runs_macros_and_ranges() {
        let out = Compiler::new(bare())
            .compile_source("define N 3\nforeach i 1..3\nprint(i * N)\nend")
            .unwrap();
        assert_eq!(out, "for (auto &i : {1,2,3}) {\n    std::cout << i * 3;\n}\n");
    }

    #[test]
    fn test_compile_in_memory_project() {
        let loader = MemoryLoader::new()
            .with_file("/p/math.pypp", "fn square(int x) -> int\nreturn x * x\nend")
            .with_file("/p/main.pypp", "imp math.pypp\nfn main() -> int\nreturn square(4)\nend");
        let out = Compiler::new(bare())
            .with_loader(loader)
            .compile(Path::new("/p/main.pypp"))
            .unwrap();
        assert_eq!(
            out,
            "int math_square(int x) {\n    return x * x;\n}\nint main() {\n    return square(4);\n}\n"
        );
    }

    #[test]
    fn test_missing_entry_is_not_found() {
        let err = Compiler::new(bare())
            .with_loader(MemoryLoader::new())
            .compile(Path::new("/nope.pypp"))
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
