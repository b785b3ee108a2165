//! Statement model for Py++ lines
//!
//! Every non-blank source line classifies into exactly one [`Statement`]. The
//! classifier is shared by the transpiler (which emits C++ for each variant)
//! and the module resolver (which only needs [`BlockEffect`] to know whether a
//! declaration sits at the top level).
//!
//! Classification expects a line that is already trimmed and has had its
//! trailing comment removed.

use thiserror::Error;

use crate::lexer::{is_ident_continue, is_ident_start, matching_paren, split_top_level};

/// Errors for lines that look like a construct but cannot be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("missing function name")]
    MissingFunctionName,
    #[error("missing parameter list")]
    MissingParameters,
    #[error("missing return type")]
    MissingReturnType,
}

/// A classified source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement<'a> {
    Blank,
    End,
    If { condition: &'a str },
    Elif { condition: &'a str },
    Else,
    While { condition: &'a str },
    Forever,
    Repeat { count: &'a str },
    Foreach { var: &'a str, container: &'a str },
    Try,
    Catch { pattern: &'a str },
    Function(FunctionHeader<'a>),
    /// `cls Name` with an optional base clause (`: public Base`).
    Class { name: &'a str, bases: Option<&'a str> },
    Print { args: Vec<&'a str> },
    Input { prompt: &'a str, target: &'a str, numeric: bool },
    Assert { expr: &'a str },
    /// Anything else: passed through as target-language code.
    Code(&'a str),
}

/// How a statement changes block nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockEffect {
    None,
    /// Pushes a new block.
    Open,
    /// Closes the current block and opens a sibling (`elif`, `else`, `catch`).
    Reopen,
    /// Closes the current block.
    Close,
}

/// A parsed `[const] fn name(params) -> type` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionHeader<'a> {
    pub is_const: bool,
    pub name: &'a str,
    pub params: &'a str,
    pub return_type: &'a str,
}

impl<'a> Statement<'a> {
    /// Classify a trimmed, comment-free line.
    pub fn classify(line: &'a str) -> Result<Self, SyntaxError> {
        if line.is_empty() {
            return Ok(Statement::Blank);
        }

        match line {
            "end" => return Ok(Statement::End),
            "else" => return Ok(Statement::Else),
            "try" => return Ok(Statement::Try),
            "forever" => return Ok(Statement::Forever),
            _ => {}
        }

        if let Some(header) = parse_function_header(line) {
            return header.map(Statement::Function);
        }

        if let Some((keyword, rest)) = split_keyword(line) {
            let stmt = match keyword {
                "if" => Some(Statement::If { condition: rest }),
                "elif" => Some(Statement::Elif { condition: rest }),
                "while" => Some(Statement::While { condition: rest }),
                "repeat" => Some(Statement::Repeat { count: rest }),
                "catch" => Some(Statement::Catch { pattern: rest }),
                "foreach" => parse_foreach(rest),
                "cls" => parse_class(rest),
                _ => None,
            };
            if let Some(stmt) = stmt {
                return Ok(stmt);
            }
        }

        if let Some(args) = call_args(line, "print") {
            return Ok(Statement::Print {
                args: split_top_level(args, ','),
            });
        }

        for (callee, numeric) in [("input", false), ("numinput", true)] {
            if let Some(args) = call_args(line, callee) {
                let parts = split_top_level(args, ',');
                if let [prompt, target, ..] = parts[..] {
                    return Ok(Statement::Input { prompt, target, numeric });
                }
            }
        }

        if let Some(expr) = line.strip_prefix("assert:").map(str::trim) {
            if !expr.is_empty() {
                return Ok(Statement::Assert { expr });
            }
        }

        Ok(Statement::Code(line))
    }

    /// How this statement affects block nesting.
    pub fn block_effect(&self) -> BlockEffect {
        match self {
            Statement::If { .. }
            | Statement::While { .. }
            | Statement::Forever
            | Statement::Repeat { .. }
            | Statement::Foreach { .. }
            | Statement::Try
            | Statement::Function(_)
            | Statement::Class { .. } => BlockEffect::Open,
            Statement::Elif { .. } | Statement::Else | Statement::Catch { .. } => BlockEffect::Reopen,
            Statement::End => BlockEffect::Close,
            Statement::Blank
            | Statement::Print { .. }
            | Statement::Input { .. }
            | Statement::Assert { .. }
            | Statement::Code(_) => BlockEffect::None,
        }
    }
}

/// Split `keyword rest` where the keyword is a leading identifier followed by whitespace and a non-empty remainder.
fn split_keyword(line: &str) -> Option<(&str, &str)> {
    let word_end = line.find(|c: char| !is_ident_continue(c))?;
    let (word, tail) = line.split_at(word_end);
    if word.is_empty() || !tail.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = tail.trim();
    (!rest.is_empty()).then_some((word, rest))
}

/// Take a leading identifier, returning it and the remaining text.
fn take_ident(text: &str) -> (&str, &str) {
    match text.char_indices().next() {
        Some((_, c)) if is_ident_start(c) => {
            let end = text.find(|c: char| !is_ident_continue(c)).unwrap_or(text.len());
            text.split_at(end)
        }
        _ => ("", text),
    }
}

fn parse_foreach(rest: &str) -> Option<Statement<'_>> {
    let (var, tail) = take_ident(rest);
    if var.is_empty() || !tail.starts_with(char::is_whitespace) {
        return None;
    }
    let container = tail.trim();
    (!container.is_empty()).then_some(Statement::Foreach { var, container })
}

fn parse_class(rest: &str) -> Option<Statement<'_>> {
    let (name, tail) = take_ident(rest);
    if name.is_empty() {
        return None;
    }
    let tail = tail.trim();
    if tail.is_empty() {
        return Some(Statement::Class { name, bases: None });
    }
    let bases = tail.strip_prefix(':')?.trim();
    (!bases.is_empty()).then_some(Statement::Class {
        name,
        bases: Some(bases),
    })
}

/// Arguments of `callee(...)` when the line is a call to `callee`.
fn call_args<'a>(line: &'a str, callee: &str) -> Option<&'a str> {
    let after = line.strip_prefix(callee)?.strip_prefix('(')?;
    let close = after.rfind(')')?;
    Some(&after[..close])
}

/// Parse a function-definition header.
///
/// Returns `None` when the line is not a function definition at all, and `Some(Err(..))` when it starts like one
/// (`fn` or `const fn` followed by whitespace, with a parameter list somewhere) but cannot be completed.
pub fn parse_function_header(line: &str) -> Option<Result<FunctionHeader<'_>, SyntaxError>> {
    let (is_const, rest) = match split_keyword(line) {
        Some(("const", rest)) => (true, rest),
        _ => (false, line),
    };
    let (keyword, after) = split_keyword(rest)?;
    if keyword != "fn" || !after.contains('(') {
        return None;
    }

    Some(parse_function_parts(after).map(|(name, params, return_type)| FunctionHeader {
        is_const,
        name,
        params,
        return_type,
    }))
}

fn parse_function_parts(text: &str) -> Result<(&str, &str, &str), SyntaxError> {
    let (name, tail) = take_ident(text);
    if name.is_empty() {
        return Err(SyntaxError::MissingFunctionName);
    }
    let tail = tail.trim_start();
    if !tail.starts_with('(') {
        return Err(SyntaxError::MissingFunctionName);
    }
    let close = matching_paren(tail, 0).ok_or(SyntaxError::MissingParameters)?;
    let params = tail[1..close].trim();
    let return_type = tail[close + 1..]
        .trim_start()
        .strip_prefix("->")
        .map(str::trim)
        .filter(|ty| !ty.is_empty())
        .ok_or(SyntaxError::MissingReturnType)?;
    Ok((name, params, return_type))
}

/// Scalar and string types recognised for global variable declarations.
const SCALAR_TYPES: &[&str] = &["int", "float", "double", "char", "bool", "auto", "std::string"];

/// Name declared by a global-variable declaration line, if the line is one.
///
/// Recognises `[const] TYPE name [= init][;]` where TYPE is one of [`SCALAR_TYPES`] or `std::vector<...>`.
pub fn variable_declaration(line: &str) -> Option<&str> {
    let line = line.trim();
    let rest = match split_keyword(line) {
        Some(("const", rest)) => rest,
        _ => line,
    };
    let after_type = strip_declared_type(rest)?;
    if !after_type.starts_with(char::is_whitespace) {
        return None;
    }
    let (name, tail) = take_ident(after_type.trim_start());
    if name.is_empty() {
        return None;
    }
    let tail = tail.trim_start();
    let initializer = tail.starts_with('=') && !tail.starts_with("==");
    (tail.is_empty() || tail == ";" || initializer).then_some(name)
}

fn strip_declared_type(text: &str) -> Option<&str> {
    if let Some(inner) = text.strip_prefix("std::vector<") {
        let mut depth = 1usize;
        for (i, c) in inner.char_indices() {
            match c {
                '<' => depth += 1,
                '>' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&inner[i + 1..]);
                    }
                }
                _ => {}
            }
        }
        return None;
    }
    SCALAR_TYPES.iter().find_map(|ty| {
        let rest = text.strip_prefix(ty)?;
        rest.starts_with(char::is_whitespace).then_some(rest)
    })
}

/// Target of an `imp TARGET` line.
pub fn import_target(line: &str) -> Option<&str> {
    match split_keyword(line.trim()) {
        Some(("imp", target)) => Some(target),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(line: &str) -> Statement<'_> {
        Statement::classify(line).expect("classify")
    }

    // ========================================
    // Block keywords
    // ========================================

    #[test]
    fn test_classify_exact_keywords() {
        assert_eq!(classify("end"), Statement::End);
        assert_eq!(classify("else"), Statement::Else);
        assert_eq!(classify("try"), Statement::Try);
        assert_eq!(classify("forever"), Statement::Forever);
        assert_eq!(classify(""), Statement::Blank);
    }

    #[test]
    fn test_classify_conditions() {
        assert_eq!(classify("if x > 1"), Statement::If { condition: "x > 1" });
        assert_eq!(classify("elif  x == 2"), Statement::Elif { condition: "x == 2" });
        assert_eq!(classify("while i < n"), Statement::While { condition: "i < n" });
        assert_eq!(classify("repeat 3 * n"), Statement::Repeat { count: "3 * n" });
        assert_eq!(classify("catch const std::exception &e"), Statement::Catch {
            pattern: "const std::exception &e"
        });
    }

    #[test]
    fn test_classify_keyword_needs_whitespace() {
        assert_eq!(classify("if(x)"), Statement::Code("if(x)"));
        assert_eq!(classify("iffy = 1"), Statement::Code("iffy = 1"));
        assert_eq!(classify("endpoint = 2"), Statement::Code("endpoint = 2"));
    }

    #[test]
    fn test_classify_foreach() {
        assert_eq!(classify("foreach item items"), Statement::Foreach {
            var: "item",
            container: "items"
        });
        assert_eq!(classify("foreach i {1,2,3}"), Statement::Foreach {
            var: "i",
            container: "{1,2,3}"
        });
        assert_eq!(classify("foreach i"), Statement::Code("foreach i"));
    }

    #[test]
    fn test_classify_class() {
        assert_eq!(classify("cls Point"), Statement::Class {
            name: "Point",
            bases: None
        });
        assert_eq!(classify("cls Dog : public Animal"), Statement::Class {
            name: "Dog",
            bases: Some("public Animal")
        });
        assert_eq!(classify("cls Dog extends"), Statement::Code("cls Dog extends"));
    }

    #[test]
    fn test_block_effects() {
        assert_eq!(classify("if x").block_effect(), BlockEffect::Open);
        assert_eq!(classify("catch ...").block_effect(), BlockEffect::Reopen);
        assert_eq!(classify("end").block_effect(), BlockEffect::Close);
        assert_eq!(classify("x++").block_effect(), BlockEffect::None);
    }

    // ========================================
    // Function headers
    // ========================================

    #[test]
    fn test_function_header() {
        let header = parse_function_header("fn add(int a, int b) -> int").unwrap().unwrap();
        assert_eq!(header, FunctionHeader {
            is_const: false,
            name: "add",
            params: "int a, int b",
            return_type: "int",
        });
    }

    #[test]
    fn test_function_header_const_and_nested_parens() {
        let header = parse_function_header("const fn apply(std::function<int(int)> f)->int").unwrap().unwrap();
        assert!(header.is_const);
        assert_eq!(header.params, "std::function<int(int)> f");
        assert_eq!(header.return_type, "int");
    }

    #[test]
    fn test_function_header_missing_name() {
        assert_eq!(
            parse_function_header("fn (int a) -> int"),
            Some(Err(SyntaxError::MissingFunctionName))
        );
    }

    #[test]
    fn test_function_header_missing_return_type() {
        assert_eq!(parse_function_header("fn f(int a)"), Some(Err(SyntaxError::MissingReturnType)));
        assert_eq!(parse_function_header("fn f(int a) ->"), Some(Err(SyntaxError::MissingReturnType)));
    }

    #[test]
    fn test_function_header_missing_close_paren() {
        assert_eq!(parse_function_header("fn f(int a -> int"), Some(Err(SyntaxError::MissingParameters)));
    }

    #[test]
    fn test_not_a_function_header() {
        assert_eq!(parse_function_header("fn(3)"), None);
        assert_eq!(parse_function_header("fn = 3"), None);
        assert_eq!(parse_function_header("int fn2(int x)"), None);
    }

    #[test]
    fn test_classify_function_error_propagates() {
        assert_eq!(Statement::classify("fn (x) -> int"), Err(SyntaxError::MissingFunctionName));
    }

    // ========================================
    // I/O statements
    // ========================================

    #[test]
    fn test_classify_print() {
        assert_eq!(classify(r#"print("a, b", x, f(1, 2))"#), Statement::Print {
            args: vec![r#""a, b""#, "x", "f(1, 2)"]
        });
        assert_eq!(classify("print()"), Statement::Print { args: vec![] });
    }

    #[test]
    fn test_classify_input() {
        assert_eq!(classify(r#"input("Name: ", name)"#), Statement::Input {
            prompt: r#""Name: ""#,
            target: "name",
            numeric: false
        });
        assert_eq!(classify(r#"numinput("Age: ", age)"#), Statement::Input {
            prompt: r#""Age: ""#,
            target: "age",
            numeric: true
        });
        assert_eq!(classify("input(x)"), Statement::Code("input(x)"));
    }

    #[test]
    fn test_classify_assert() {
        assert_eq!(classify("assert: x == 1"), Statement::Assert { expr: "x == 1" });
        assert_eq!(classify("assert:"), Statement::Code("assert:"));
    }

    // ========================================
    // Declarations and imports
    // ========================================

    #[test]
    fn test_variable_declaration() {
        assert_eq!(variable_declaration("int counter = 0"), Some("counter"));
        assert_eq!(variable_declaration("const double PI = 3.14"), Some("PI"));
        assert_eq!(variable_declaration("std::string name;"), Some("name"));
        assert_eq!(variable_declaration("std::vector<std::vector<int>> grid"), Some("grid"));
        assert_eq!(variable_declaration("bool ready"), Some("ready"));
    }

    #[test]
    fn test_not_variable_declaration() {
        assert_eq!(variable_declaration("int main(int argc)"), None);
        assert_eq!(variable_declaration("integer x = 1"), None);
        assert_eq!(variable_declaration("size_t n = 0"), None);
        assert_eq!(variable_declaration("int a, b"), None);
    }

    #[test]
    fn test_import_target() {
        assert_eq!(import_target("imp std/time.pypp"), Some("std/time.pypp"));
        assert_eq!(import_target("  imp   math.pypp  "), Some("math.pypp"));
        assert_eq!(import_target("import x"), None);
        assert_eq!(import_target("imp"), None);
    }
}
