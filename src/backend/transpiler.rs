//! Block-structured statement transpiler
//!
//! Turns keyword-delimited Py++ into brace-delimited C++ one line at a time.
//! Each line is classified into a [`Statement`]; openers push a [`BlockFrame`],
//! `end` pops one, and `elif`/`else`/`catch` swap the top frame for a sibling.
//! Whatever is still open at end of input is closed in LIFO order.
//!
//! The only fatal condition is a function header that cannot be parsed.

use miette::{NamedSource, SourceSpan};
use pypp_syntax::lexer::strip_comment;
use pypp_syntax::statement::{FunctionHeader, Statement};

use super::emitter::CppEmitter;
use super::prelude::{HEADERS, RUNTIME_SOURCE, runtime_line_count};
use crate::config::TranspileOptions;
use crate::frontend::diagnostics::CompileError;
use crate::frontend::ranges::{Comprehension, expand_ranges, symbolic_bounds};
use crate::progress::{NoProgress, Progress};

/// Kind of an open block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Root,
    If,
    Elif,
    Else,
    While,
    Forever,
    Repeat,
    Foreach,
    Try,
    Catch,
    Function,
    Class,
}

impl BlockKind {
    /// Text that closes a block of this kind.
    pub fn closer(self) -> &'static str {
        match self {
            BlockKind::Class => "};",
            _ => "}",
        }
    }
}

/// One open block and the source line that opened it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockFrame {
    pub kind: BlockKind,
    pub line: usize,
}

/// Transpile with default naming and no progress reporting.
pub fn transpile(source: &str, options: &TranspileOptions) -> Result<String, CompileError> {
    Transpiler::new(options, &NoProgress).transpile(source)
}

/// Line-by-line Py++ to C++ translator. One instance translates one unit.
pub struct Transpiler<'a> {
    options: &'a TranspileOptions,
    progress: &'a dyn Progress,
    source_name: String,
    emitter: CppEmitter,
    stack: Vec<BlockFrame>,
    repeat_count: usize,
    assert_count: usize,
}

impl<'a> Transpiler<'a> {
    pub fn new(options: &'a TranspileOptions, progress: &'a dyn Progress) -> Self {
        Self {
            options,
            progress,
            source_name: "<input>".to_string(),
            emitter: CppEmitter::new(options.indent_width),
            stack: vec![BlockFrame {
                kind: BlockKind::Root,
                line: 0,
            }],
            repeat_count: 0,
            assert_count: 0,
        }
    }

    /// Name shown for the source in diagnostics.
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }

    /// Translate a preprocessed, import-resolved unit.
    ///
    /// Line numbers in errors refer to `source`, which for a file compile is the
    /// whole resolved unit rather than the entry file. The runtime helpers
    /// prepended when the prelude is enabled are not counted.
    #[tracing::instrument(skip_all, fields(source_len = source.len()))]
    pub fn transpile(mut self, source: &str) -> Result<String, CompileError> {
        let (unit, offset) = if self.options.emit_prelude {
            for header in HEADERS {
                self.emitter.raw_line(header);
            }
            (format!("{RUNTIME_SOURCE}\n{source}"), runtime_line_count())
        } else {
            (source.to_string(), 0)
        };

        let expanded = expand_ranges(&unit);
        let lines: Vec<&str> = expanded.lines().collect();
        let total = lines.len();

        for (index, raw) in lines.iter().enumerate() {
            let line = (index + 1).saturating_sub(offset);
            self.line(raw, line).map_err(|reason| CompileError::MalformedFunction {
                line,
                reason,
                src: NamedSource::new(&self.source_name, source.to_string()),
                span: line_span(source, line),
            })?;
            self.progress.transpile_progress(index + 1, total);
        }

        self.close_all();
        tracing::debug!(lines = total, "transpiled unit");
        Ok(self.emitter.finish())
    }

    fn line(&mut self, raw: &str, line: usize) -> Result<(), pypp_syntax::SyntaxError> {
        if let Some(comp) = Comprehension::parse(raw) {
            self.emitter.line(&comp.declaration());
            self.emitter.open(&comp.loop_header());
            self.emitter.line(&comp.push_statement());
            self.emitter.close("}");
            return Ok(());
        }

        let text = strip_comment(raw).trim();
        match Statement::classify(text)? {
            Statement::Blank => {}
            Statement::End => self.close_block(line),
            Statement::If { condition } => self.open(BlockKind::If, line, &format!("if ({condition}) {{")),
            Statement::Elif { condition } => {
                self.reopen(BlockKind::Elif, line, &format!("}} else if ({condition}) {{"))
            }
            Statement::Else => self.reopen(BlockKind::Else, line, "} else {"),
            Statement::While { condition } => self.open(BlockKind::While, line, &format!("while ({condition}) {{")),
            Statement::Forever => self.open(BlockKind::Forever, line, "while (true) {"),
            Statement::Repeat { count } => {
                let counter = format!("__pypp_repeat_{}", self.repeat_count);
                self.repeat_count += 1;
                let header = format!("for (int {counter} = 0; {counter} < ({count}); ++{counter}) {{");
                self.open(BlockKind::Repeat, line, &header);
            }
            Statement::Foreach { var, container } => {
                let header = match symbolic_bounds(container) {
                    Some((lower, upper)) => format!("for (auto {var} = ({lower}); {var} <= ({upper}); ++{var}) {{"),
                    None => format!("for (auto &{var} : {container}) {{"),
                };
                self.open(BlockKind::Foreach, line, &header);
            }
            Statement::Try => self.open(BlockKind::Try, line, "try {"),
            Statement::Catch { pattern } => self.reopen(BlockKind::Catch, line, &format!("}} catch ({pattern}) {{")),
            Statement::Function(header) => self.open(BlockKind::Function, line, &function_header(&header)),
            Statement::Class { name, bases } => {
                let header = match bases {
                    Some(bases) => format!("class {name} : {bases} {{"),
                    None => format!("class {name} {{"),
                };
                self.open(BlockKind::Class, line, &header);
            }
            Statement::Print { args } => {
                if args.is_empty() {
                    self.emitter.line("std::cout << std::flush;");
                } else {
                    self.emitter.linef(format_args!("std::cout << {};", args.join(" << ")));
                }
            }
            Statement::Input {
                prompt,
                target,
                numeric,
            } => {
                self.emitter.linef(format_args!("std::cout << {prompt} << std::flush;"));
                if numeric {
                    self.emitter.linef(format_args!("std::cin >> {target};"));
                    self.emitter
                        .line("std::cin.ignore(std::numeric_limits<std::streamsize>::max(), '\\n');");
                } else {
                    self.emitter.linef(format_args!("std::getline(std::cin, {target});"));
                }
            }
            Statement::Assert { expr } => self.assert(expr),
            Statement::Code(code) if code.starts_with('#') => self.emitter.raw_line(code),
            Statement::Code(code) => self.emitter.line(&terminate(code)),
        }
        Ok(())
    }

    fn open(&mut self, kind: BlockKind, line: usize, header: &str) {
        self.emitter.open(header);
        self.stack.push(BlockFrame { kind, line });
    }

    /// Replace the top frame with a sibling. The root frame is never popped.
    fn reopen(&mut self, kind: BlockKind, line: usize, header: &str) {
        if self.stack.len() > 1 {
            self.stack.pop();
        } else {
            tracing::debug!(line, ?kind, "continuation clause at top level");
        }
        self.emitter.reopen(header);
        self.stack.push(BlockFrame { kind, line });
    }

    fn close_block(&mut self, line: usize) {
        if self.stack.len() > 1 {
            if let Some(frame) = self.stack.pop() {
                self.emitter.close(frame.kind.closer());
            }
        } else {
            tracing::debug!(line, "ignoring `end` at top level");
        }
    }

    /// Close every open block, innermost first.
    fn close_all(&mut self) {
        while self.stack.len() > 1 {
            if let Some(frame) = self.stack.pop() {
                tracing::trace!(kind = ?frame.kind, opened_at = frame.line, "closing unterminated block");
                self.emitter.close(frame.kind.closer());
            }
        }
    }

    fn assert(&mut self, expr: &str) {
        let tmp = format!("__pypp_assert_{}", self.assert_count);
        self.assert_count += 1;
        self.emitter.linef(format_args!("bool {tmp} = ({expr});"));
        self.emitter.open(&format!("if (!{tmp}) {{"));
        self.emitter.linef(format_args!(
            "std::cout << \"Assertion failed:\\n    {}\\nResult: \" << {tmp} << std::endl;",
            escape_cpp_string(expr)
        ));
        self.emitter.line("std::exit(1);");
        self.emitter.close("}");
    }
}

fn function_header(header: &FunctionHeader<'_>) -> String {
    let qualifier = if header.is_const { "const " } else { "" };
    format!(
        "{qualifier}{} {}({}) {{",
        header.return_type, header.name, header.params
    )
}

/// Append `;` unless the line already ends a statement or block.
fn terminate(code: &str) -> String {
    if code.ends_with([';', '{', '}', '>', ',']) {
        code.to_string()
    } else {
        format!("{code};")
    }
}

fn escape_cpp_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}

/// Span of the trimmed text of 1-based `line` in `source`.
fn line_span(source: &str, line: usize) -> SourceSpan {
    let mut offset = 0;
    for (index, text) in source.split('\n').enumerate() {
        if index + 1 == line {
            let text = text.trim_end_matches('\r');
            let lead = text.len() - text.trim_start().len();
            return (offset + lead, text.trim().len()).into();
        }
        offset += text.len() + 1;
    }
    (source.len(), 0).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(source: &str) -> String {
        let options = TranspileOptions {
            emit_prelude: false,
            indent_width: 4,
        };
        transpile(source, &options).unwrap()
    }

    // ========================================
    // Blocks
    // ========================================

    #[test]
    fn test_if_elif_else() {
        let out = emit("if x > 1\nprint(\"big\")\nelif x == 1\nprint(\"one\")\nelse\nprint(\"small\")\nend");
        assert_eq!(
            out,
            "if (x > 1) {\n    std::cout << \"big\";\n} else if (x == 1) {\n    std::cout << \"one\";\n} else {\n    std::cout << \"small\";\n}\n"
        );
    }

    #[test]
    fn test_loops() {
        assert_eq!(emit("while i < 3\ni++\nend"), "while (i < 3) {\n    i++;\n}\n");
        assert_eq!(emit("forever\nbreak\nend"), "while (true) {\n    break;\n}\n");
    }

    #[test]
    fn test_nested_repeats_use_distinct_counters() {
        assert_eq!(
            emit("repeat 2\nrepeat n\nx++\nend\nend"),
            "for (int __pypp_repeat_0 = 0; __pypp_repeat_0 < (2); ++__pypp_repeat_0) {\n    \
             for (int __pypp_repeat_1 = 0; __pypp_repeat_1 < (n); ++__pypp_repeat_1) {\n        \
             x++;\n    }\n}\n"
        );
    }

    #[test]
    fn test_foreach_forms() {
        assert_eq!(emit("foreach i 1..3\nend"), "for (auto &i : {1,2,3}) {\n}\n");
        assert_eq!(emit("foreach s names\nend"), "for (auto &s : names) {\n}\n");
        assert_eq!(emit("foreach k 0..n - 1\nend"), "for (auto k = (0); k <= (n - 1); ++k) {\n}\n");
    }

    #[test]
    fn test_try_catch() {
        assert_eq!(
            emit("try\nrisky()\ncatch const std::exception &e\nprint(e.what())\nend"),
            "try {\n    risky();\n} catch (const std::exception &e) {\n    std::cout << e.what();\n}\n"
        );
    }

    #[test]
    fn test_function_and_class() {
        assert_eq!(
            emit("cls Box : public Base\npublic:\nconst fn size() -> int\nreturn 1\nend\nend"),
            "class Box : public Base {\n    public:;\n    const int size() {\n        return 1;\n    }\n};\n"
        );
    }

    #[test]
    fn test_unterminated_blocks_close_lifo() {
        assert_eq!(emit("cls A\nfn f() -> void\nif x"), "class A {\n    void f() {\n        if (x) {\n        }\n    }\n};\n");
    }

    #[test]
    fn test_end_at_root_is_ignored() {
        assert_eq!(emit("end\nx = 1"), "x = 1;\n");
    }

    #[test]
    fn test_else_at_root_keeps_root() {
        assert_eq!(emit("else\ny()\nend\nend"), "} else {\n    y();\n}\n");
    }

    // ========================================
    // Statements
    // ========================================

    #[test]
    fn test_print_splits_top_level_commas() {
        assert_eq!(
            emit("print(\"a, b\", ',', f(1, 2), \"\\n\")"),
            "std::cout << \"a, b\" << ',' << f(1, 2) << \"\\n\";\n"
        );
        assert_eq!(emit("print()"), "std::cout << std::flush;\n");
    }

    #[test]
    fn test_input_forms() {
        assert_eq!(
            emit("input(\"Name: \", name)"),
            "std::cout << \"Name: \" << std::flush;\nstd::getline(std::cin, name);\n"
        );
        assert_eq!(
            emit("numinput(\"Age: \", age)"),
            "std::cout << \"Age: \" << std::flush;\nstd::cin >> age;\n\
             std::cin.ignore(std::numeric_limits<std::streamsize>::max(), '\\n');\n"
        );
        assert_eq!(emit("input(x)"), "input(x);\n");
    }

    #[test]
    fn test_assert() {
        assert_eq!(
            emit("assert: s == \"ok\""),
            "bool __pypp_assert_0 = (s == \"ok\");\nif (!__pypp_assert_0) {\n    \
             std::cout << \"Assertion failed:\\n    s == \\\"ok\\\"\\nResult: \" << __pypp_assert_0 << std::endl;\n    \
             std::exit(1);\n}\n"
        );
    }

    #[test]
    fn test_comprehension() {
        assert_eq!(
            emit("std::vector<int> sq = (i * i foreach i 1..3)"),
            "std::vector<int> sq = {};\nfor (auto &i : {1,2,3}) {\n    sq.push_back(i * i);\n}\n"
        );
    }

    #[test]
    fn test_passthrough_terminators() {
        assert_eq!(
            emit("#include <cmath>\nx = 1;\nauto f = [] {\n}\nstd::vector<int>\nfoo(a,\ncall()"),
            "#include <cmath>\nx = 1;\nauto f = [] {\n}\nstd::vector<int>\nfoo(a,\ncall();\n"
        );
    }

    #[test]
    fn test_comments_are_stripped() {
        assert_eq!(emit("%> heading\nx = 1 %> note\nprint(\"%>\")"), "x = 1;\nstd::cout << \"%>\";\n");
    }

    #[test]
    fn test_indent_width_option() {
        let options = TranspileOptions {
            emit_prelude: false,
            indent_width: 2,
        };
        assert_eq!(transpile("if a\nb\nend", &options).unwrap(), "if (a) {\n  b;\n}\n");
    }

    // ========================================
    // Prelude and errors
    // ========================================

    #[test]
    fn test_prelude_is_self_contained() {
        let out = transpile("x = sstoi(\"4\")", &TranspileOptions::default()).unwrap();
        assert!(out.starts_with("#include <iostream>\n"));
        assert!(out.contains("#define __THIS__ fs::path(__argv[0])\n"));
        assert!(out.contains("int sstoi(std::string s) {\n    try {\n        return std::stoi(s);\n    } catch (...) {\n        return -1;\n    }\n}\n"));
        assert!(out.ends_with("x = sstoi(\"4\");\n"));
    }

    #[test]
    fn test_malformed_function_reports_user_line() {
        let err = transpile("x = 1\n  fn (int a) -> int\nend", &TranspileOptions::default()).unwrap_err();
        match err {
            CompileError::MalformedFunction { line, reason, span, .. } => {
                assert_eq!(line, 2);
                assert_eq!(reason, pypp_syntax::SyntaxError::MissingFunctionName);
                assert_eq!(span, SourceSpan::from((8, 17)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_full_width_range_loop_transpiles() {
        let out = emit("foreach i -9223372036854775808..9223372036854775807\nend");
        assert_eq!(
            out,
            "for (auto i = (-9223372036854775808); i <= (9223372036854775807); ++i) {\n}\n"
        );
    }

    #[test]
    fn test_missing_return_type_is_fatal() {
        let options = TranspileOptions {
            emit_prelude: false,
            indent_width: 4,
        };
        let err = transpile("fn f(int a)\nend", &options).unwrap_err();
        assert_eq!(err.to_string(), "error at line 1: missing return type");
    }
}
