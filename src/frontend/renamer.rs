//! Cross-module symbol renaming
//!
//! Every imported module's top-level functions and global variables are
//! prefixed with the module name (`square` in `math.pypp` becomes
//! `math_square`) so that independently written modules can be concatenated
//! into one translation unit without link-time collisions.
//!
//! Renaming is token-boundary safe: only whole identifiers match, occurrences
//! inside string/char literals are left alone, and full-line comments are not
//! touched at all.

use std::collections::HashMap;

use pypp_syntax::lexer::{is_comment_line, rewrite_idents, strip_comment};
use pypp_syntax::statement::{self, BlockEffect, Statement};

/// Top-level declarations found in one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSymbols {
    pub functions: Vec<String>,
    pub variables: Vec<String>,
}

impl ModuleSymbols {
    /// All symbols, functions first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().chain(&self.variables).map(String::as_str)
    }

    fn add_function(&mut self, name: &str) {
        if !self.functions.iter().any(|f| f == name) {
            self.functions.push(name.to_string());
        }
    }

    fn add_variable(&mut self, name: &str) {
        if !self.variables.iter().any(|v| v == name) {
            self.variables.push(name.to_string());
        }
    }
}

/// Collect top-level function and global-variable declarations.
///
/// Block depth is tracked with the statement classifier, so methods inside a
/// `cls` body and locals inside functions or loops are not collected. `imp`
/// lines are skipped.
pub fn scan_declarations<'a>(lines: impl IntoIterator<Item = &'a str>) -> ModuleSymbols {
    let mut symbols = ModuleSymbols::default();
    let mut depth = 0usize;

    for line in lines {
        let text = strip_comment(line).trim();
        if text.is_empty() || statement::import_target(text).is_some() {
            continue;
        }

        let effect = match Statement::classify(text) {
            Ok(stmt) => {
                if depth == 0 {
                    match &stmt {
                        Statement::Function(header) => symbols.add_function(header.name),
                        Statement::Code(code) => {
                            if let Some(name) = statement::variable_declaration(code) {
                                symbols.add_variable(name);
                            }
                        }
                        _ => {}
                    }
                }
                stmt.block_effect()
            }
            // A broken function header still opens a body.
            Err(_) => BlockEffect::Open,
        };

        match effect {
            BlockEffect::Open => depth += 1,
            BlockEffect::Close => depth = depth.saturating_sub(1),
            BlockEffect::Reopen | BlockEffect::None => {}
        }
    }

    symbols
}

/// Renames a module's symbols to `<module>_<symbol>`.
#[derive(Debug, Clone)]
pub struct Renamer {
    renames: HashMap<String, String>,
}

impl Renamer {
    pub fn new(module_name: &str, symbols: &ModuleSymbols) -> Self {
        let renames = symbols
            .iter()
            .map(|name| (name.to_string(), format!("{module_name}_{name}")))
            .collect();
        Self { renames }
    }

    /// The new name for `symbol`, if it is one of this module's symbols.
    pub fn renamed(&self, symbol: &str) -> Option<&str> {
        self.renames.get(symbol).map(String::as_str)
    }

    /// Rename every symbol occurrence on a line in one pass.
    pub fn rename_line(&self, line: &str) -> String {
        if self.renames.is_empty() || is_comment_line(line) {
            return line.to_string();
        }
        rewrite_idents(line, |ident| self.renamed(ident).map(str::to_string))
    }
}

/// Replace whole-identifier occurrences of `name` outside literals and comment lines.
pub fn safe_replace(line: &str, name: &str, replacement: &str) -> String {
    if is_comment_line(line) {
        return line.to_string();
    }
    rewrite_idents(line, |ident| (ident == name).then(|| replacement.to_string()))
}
