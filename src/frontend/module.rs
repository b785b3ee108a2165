//! Module resolution for multi-file Py++ programs
//!
//! Resolves `imp TARGET` lines to files, loads each module at most once per
//! compilation, namespaces the top-level symbols of every imported module, and
//! splices the result in place of the import line.
//!
//! Lookup order for a target, first match wins:
//!
//! 1. the global modules directory (`<exe dir>/modules/TARGET`)
//! 2. the standard install location (`<install>/modules/TARGET`)
//! 3. the importing file's own directory
//!
//! A directory match resolves to its `__init__.pypp`.
//!
//! All filesystem access goes through [`SourceLoader`] so resolution can run
//! against an in-memory tree in tests.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use pypp_syntax::lexer::strip_comment;
use pypp_syntax::statement::import_target;

use super::diagnostics::CompileError;
use super::preprocessor::preprocess;
use super::renamer::{Renamer, scan_declarations};
use crate::config::{HOME_ENV, MODULES_DIR};
use crate::progress::Progress;

/// Index file used when an import names a directory.
pub const INDEX_FILE: &str = "__init__.pypp";

// ============================================================================
// Source loading
// ============================================================================

/// Read access to module sources.
pub trait SourceLoader {
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
    /// Absolute, normalized identity of a path. Two paths naming the same file must canonicalize equally.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        path.canonicalize()
    }
}

/// An in-memory file tree keyed by normalized absolute path.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file (builder style).
    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, contents: impl Into<String>) {
        self.files.insert(normalize(path.as_ref()), contents.into());
    }
}

impl SourceLoader for MemoryLoader {
    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(&normalize(path))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let dir = normalize(path);
        self.files.keys().any(|file| file != &dir && file.starts_with(&dir))
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{} not in memory tree", path.display())))
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(normalize(path))
    }
}

/// Lexically resolve `.` and `..` components, rooting relative paths at `/`.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::from("/");
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out = PathBuf::from(prefix.as_os_str()),
            Component::RootDir => out.push(Component::RootDir),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

// ============================================================================
// Search paths
// ============================================================================

/// The two fixed lookup roots tried before the importer's own directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPaths {
    /// Modules shipped next to the compiler binary.
    pub global_modules_dir: Option<PathBuf>,
    /// Installation root; its modules live in `<root>/modules`.
    pub standard_install_dir: Option<PathBuf>,
}

impl SearchPaths {
    /// Only the importer's directory is searched.
    pub fn local_only() -> Self {
        Self::default()
    }

    /// Derive the lookup roots from the running executable and `PYPP_HOME`.
    pub fn from_env() -> Self {
        let global_modules_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(MODULES_DIR)));
        let standard_install_dir = std::env::var_os(HOME_ENV)
            .map(PathBuf::from)
            .or_else(|| Some(default_install_dir()));
        Self {
            global_modules_dir,
            standard_install_dir,
        }
    }

    /// Candidate paths for `target`, in lookup order.
    pub fn candidates(&self, target: &str, importer_dir: &Path) -> Vec<PathBuf> {
        let mut candidates = Vec::with_capacity(3);
        if let Some(global) = &self.global_modules_dir {
            candidates.push(global.join(target));
        }
        if let Some(install) = &self.standard_install_dir {
            candidates.push(install.join(MODULES_DIR).join(target));
        }
        candidates.push(importer_dir.join(target));
        candidates
    }
}

fn default_install_dir() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\pypp")
    } else {
        PathBuf::from("/opt/pypp")
    }
}

// ============================================================================
// Compilation context
// ============================================================================

/// What one imported module contributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleReport {
    /// Module name (file stem), used as the rename prefix.
    pub name: String,
    pub path: PathBuf,
    pub functions: usize,
    pub variables: usize,
}

/// State owned by a single compilation.
#[derive(Debug, Default)]
pub struct CompilationContext {
    loaded: HashSet<PathBuf>,
    modules: Vec<ModuleReport>,
}

impl CompilationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path` as loaded. Returns `false` when it already was.
    pub fn mark_loaded(&mut self, path: PathBuf) -> bool {
        self.loaded.insert(path)
    }

    pub fn is_loaded(&self, path: &Path) -> bool {
        self.loaded.contains(path)
    }

    /// Imported modules in load order; the entry file is not included.
    pub fn modules(&self) -> &[ModuleReport] {
        &self.modules
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Loads an entry file and everything it imports into one source text.
pub struct ModuleResolver<'a> {
    loader: &'a dyn SourceLoader,
    search: &'a SearchPaths,
    progress: &'a dyn Progress,
}

impl<'a> ModuleResolver<'a> {
    pub fn new(loader: &'a dyn SourceLoader, search: &'a SearchPaths, progress: &'a dyn Progress) -> Self {
        Self {
            loader,
            search,
            progress,
        }
    }

    /// Resolve `entry` and all its transitive imports.
    ///
    /// The entry file's own symbols keep their names; every imported module is
    /// preprocessed on its own and namespaced before being spliced in.
    #[tracing::instrument(skip_all, fields(entry = %entry.display()))]
    pub fn resolve(&self, entry: &Path, ctx: &mut CompilationContext) -> Result<String, CompileError> {
        if !self.loader.is_file(entry) {
            return Err(CompileError::EntryNotFound {
                path: entry.to_path_buf(),
            });
        }
        let combined = self.load(entry, false, ctx)?.unwrap_or_default();
        tracing::debug!(modules = ctx.modules.len(), "resolved imports");
        Ok(combined)
    }

    /// Load one module. `None` means it was already part of this compilation.
    fn load(&self, path: &Path, is_import: bool, ctx: &mut CompilationContext) -> Result<Option<String>, CompileError> {
        let canonical = self.loader.canonicalize(path).map_err(|source| CompileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if !ctx.mark_loaded(canonical.clone()) {
            tracing::trace!(path = %canonical.display(), "skipping already loaded module");
            return Ok(None);
        }

        let raw = self.loader.read_to_string(&canonical).map_err(|source| CompileError::Io {
            path: canonical.clone(),
            source,
        })?;
        let source = preprocess(&raw);

        let renamer = if is_import {
            let name = module_name(&canonical);
            let symbols = scan_declarations(source.lines());
            tracing::debug!(
                module = %name,
                functions = symbols.functions.len(),
                variables = symbols.variables.len(),
                "loaded module"
            );
            let report = ModuleReport {
                name: name.clone(),
                path: canonical.clone(),
                functions: symbols.functions.len(),
                variables: symbols.variables.len(),
            };
            let renamer = Renamer::new(&name, &symbols);
            self.progress.module_imported(&report);
            ctx.modules.push(report);
            Some(renamer)
        } else {
            None
        };

        let mut lines = Vec::new();
        for line in source.lines() {
            if let Some(target) = import_target(strip_comment(line)) {
                let module_path = self.locate(target, &canonical)?;
                if let Some(text) = self.load(&module_path, true, ctx)? {
                    lines.push(text);
                }
                continue;
            }
            lines.push(match &renamer {
                Some(renamer) => renamer.rename_line(line),
                None => line.to_string(),
            });
        }
        Ok(Some(lines.join("\n")))
    }

    /// Find the file an import refers to.
    fn locate(&self, target: &str, importer: &Path) -> Result<PathBuf, CompileError> {
        let importer_dir = importer.parent().unwrap_or_else(|| Path::new("."));
        let candidates = self.search.candidates(target, importer_dir);

        for candidate in &candidates {
            tracing::debug!(candidate = %candidate.display(), "trying module path");
            if self.loader.is_dir(candidate) {
                let index = candidate.join(INDEX_FILE);
                if self.loader.is_file(&index) {
                    return Ok(index);
                }
                return Err(CompileError::MissingIndex {
                    name: target.to_string(),
                    path: index,
                });
            }
            if self.loader.is_file(candidate) {
                return Ok(candidate.clone());
            }
        }
        Err(CompileError::module_not_found(target, importer, candidates))
    }
}

/// The rename prefix for a module file: its stem.
fn module_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
