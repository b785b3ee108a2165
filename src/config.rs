//! Compiler configuration
//!
//! Defaults match a normal install: modules next to the binary, the standard
//! install location from `PYPP_HOME`, and the runtime prelude enabled.

use std::path::PathBuf;

use crate::frontend::module::SearchPaths;

/// Directory holding importable modules, under the exe dir and the install dir.
pub const MODULES_DIR: &str = "modules";
/// Environment variable overriding the standard install location.
pub const HOME_ENV: &str = "PYPP_HOME";
/// Environment variable naming the native C++ compiler.
pub const CXX_ENV: &str = "PYPP_CXX";
/// Native compiler used when none is configured.
pub const DEFAULT_CXX: &str = "g++";

/// Options for the statement transpiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranspileOptions {
    /// Emit the headers and runtime helpers that make the output self-contained.
    pub emit_prelude: bool,
    /// Spaces per block level in the emitted C++.
    pub indent_width: usize,
}

impl Default for TranspileOptions {
    fn default() -> Self {
        Self {
            emit_prelude: true,
            indent_width: 4,
        }
    }
}

/// Everything a compilation needs to know besides its input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerConfig {
    pub search: SearchPaths,
    pub transpile: TranspileOptions,
}

impl CompilerConfig {
    /// Local imports only, prelude on.
    pub fn new() -> Self {
        Self::default()
    }

    /// Search paths derived from the running executable and the environment.
    pub fn from_env() -> Self {
        Self {
            search: SearchPaths::from_env(),
            transpile: TranspileOptions::default(),
        }
    }

    /// Set the global modules directory
    pub fn with_global_modules_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search.global_modules_dir = Some(dir.into());
        self
    }

    /// Set the standard install location
    pub fn with_standard_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search.standard_install_dir = Some(dir.into());
        self
    }

    /// Enable or disable the runtime prelude
    pub fn with_prelude(mut self, enabled: bool) -> Self {
        self.transpile.emit_prelude = enabled;
        self
    }

    /// Set the indentation width
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.transpile.indent_width = width;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================
    // Defaults
    // ========================================

    #[test]
    fn test_default_transpile_options() {
        let options = TranspileOptions::default();
        assert!(options.emit_prelude);
        assert_eq!(options.indent_width, 4);
    }

    #[test]
    fn test_new_searches_locally_only() {
        let config = CompilerConfig::new();
        assert_eq!(config.search, SearchPaths::local_only());
    }

    // ========================================
    // Builder
    // ========================================

    #[test]
    fn test_builder_chain() {
        let config = CompilerConfig::new()
            .with_global_modules_dir("/exe/modules")
            .with_standard_install_dir("/opt/pypp")
            .with_prelude(false)
            .with_indent_width(2);
        assert_eq!(config.search.global_modules_dir, Some(PathBuf::from("/exe/modules")));
        assert_eq!(config.search.standard_install_dir, Some(PathBuf::from("/opt/pypp")));
        assert!(!config.transpile.emit_prelude);
        assert_eq!(config.transpile.indent_width, 2);
    }
}
