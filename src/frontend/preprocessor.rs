//! Macro preprocessor for Py++
//!
//! Collects `define` directives, removes them from the text, and expands their
//! uses. Two macro shapes exist:
//!
//! - `define NAME BODY` replaces every whole-word `NAME` with `BODY`.
//! - `define NAME(a, b) BODY` replaces every call site `NAME(x, y)` with `BODY`
//!   where the formals `a`, `b` have been replaced by `x`, `y`.
//!
//! ## Expansion order
//!
//! Macros are applied one after another in definition order, prelude first.
//! There is no rescan: a body that mentions a macro defined *later* gets
//! expanded when that later macro is applied, while a body mentioning an
//! *earlier* macro is left as written. Redefining a macro replaces its body but
//! keeps its original position in that order.
//!
//! Substitution never looks inside string or character literals.

use pypp_syntax::lexer::{
    TokenKind, is_ident_continue, is_ident_start, matching_paren, rewrite_idents, split_top_level, tokenize,
};

/// Built-in defines available to every file.
pub const PRELUDE_DEFINES: &[&str] = &[
    "define __argcv__ int argc, char** argv",
    "define strvec std::vector<std::string>",
    "define vec std::vector",
];

/// A textual macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Define {
    pub name: String,
    /// Formal parameters; empty for a plain alias.
    pub params: Vec<String>,
    pub body: String,
}

impl Define {
    /// Parse a `define` directive line. Returns `None` for anything that is not a well-formed directive.
    pub fn parse(line: &str) -> Option<Define> {
        let rest = line.trim().strip_prefix("define")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let rest = rest.trim_start();

        let name_end = rest
            .char_indices()
            .find(|&(i, c)| {
                if i == 0 { !is_ident_start(c) } else { !is_ident_continue(c) }
            })
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if name_end == 0 {
            return None;
        }
        let (name, mut rest) = rest.split_at(name_end);

        let mut params = Vec::new();
        if let Some(inner) = rest.strip_prefix('(') {
            let close = inner.find(')')?;
            params = inner[..close]
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
            rest = &inner[close + 1..];
        }

        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let body = rest.trim();
        if body.is_empty() {
            return None;
        }

        Some(Define {
            name: name.to_string(),
            params,
            body: body.to_string(),
        })
    }

    /// Whether this is a call-style macro.
    pub fn is_call(&self) -> bool {
        !self.params.is_empty()
    }

    /// Expand this macro on one line.
    fn apply(&self, line: &str) -> String {
        if self.is_call() {
            self.apply_call(line)
        } else {
            rewrite_idents(line, |ident| (ident == self.name).then(|| self.body.clone()))
        }
    }

    fn apply_call(&self, line: &str) -> String {
        let tokens = tokenize(line);
        let mut out = String::with_capacity(line.len());
        let mut copied_to = 0;

        for (i, token) in tokens.iter().enumerate() {
            // Tokens inside an already expanded call belong to its arguments.
            if token.start < copied_to {
                continue;
            }
            let is_call_site = token.kind == TokenKind::Ident
                && token.text == self.name
                && tokens.get(i + 1).is_some_and(|next| next.is_punct('('));
            if !is_call_site {
                continue;
            }
            if let Some(close) = matching_paren(line, token.end()) {
                let args = split_top_level(&line[token.end() + 1..close], ',');
                out.push_str(&line[copied_to..token.start]);
                out.push_str(&self.substitute(&args));
                copied_to = close + 1;
            }
        }
        out.push_str(&line[copied_to..]);
        out
    }

    /// The body with formals replaced by actual arguments. Formals without an actual argument stay as written.
    fn substitute(&self, args: &[&str]) -> String {
        rewrite_idents(&self.body, |ident| {
            self.params
                .iter()
                .zip(args)
                .find(|(param, _)| param.as_str() == ident)
                .map(|(_, arg)| arg.to_string())
        })
    }
}

/// The set of defines collected from one preprocessing pass.
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    defines: Vec<Define>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table seeded with [`PRELUDE_DEFINES`].
    pub fn with_prelude() -> Self {
        let mut table = Self::new();
        for line in PRELUDE_DEFINES {
            if let Some(define) = Define::parse(line) {
                table.insert(define);
            }
        }
        table
    }

    /// Add a define; a redefinition replaces the body in place.
    pub fn insert(&mut self, define: Define) {
        match self.defines.iter_mut().find(|d| d.name == define.name) {
            Some(existing) => *existing = define,
            None => self.defines.push(define),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Define> {
        self.defines.iter().find(|d| d.name == name)
    }

    pub fn len(&self) -> usize {
        self.defines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defines.is_empty()
    }

    /// Expand every define on a single line, in definition order.
    pub fn expand_line(&self, line: &str) -> String {
        self.defines
            .iter()
            .fold(line.to_string(), |acc, define| define.apply(&acc))
    }
}

/// Remove `define` directives from `source` and expand them, together with the prelude defines.
///
/// Lines that look like a directive but do not parse stay in the output as ordinary code.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn preprocess(source: &str) -> String {
    let mut table = MacroTable::with_prelude();
    let mut kept = Vec::new();

    for line in source.lines() {
        match Define::parse(line) {
            Some(define) => {
                tracing::trace!(name = %define.name, params = define.params.len(), "collected define");
                table.insert(define);
            }
            None => kept.push(line),
        }
    }

    kept.iter()
        .map(|line| table.expand_line(line))
        .collect::<Vec<_>>()
        .join("\n")
}
