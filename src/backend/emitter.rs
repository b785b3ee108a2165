//! C++ code emitter - builds the output translation unit
//!
//! A line buffer that tracks block depth and indents each line accordingly.

use std::fmt::Write;

/// A buffer for building C++ source with block indentation
#[derive(Debug, Clone)]
pub struct CppEmitter {
    buffer: String,
    indent_level: usize,
    indent_str: String,
}

impl Default for CppEmitter {
    fn default() -> Self {
        Self::new(4)
    }
}

impl CppEmitter {
    pub fn new(indent_width: usize) -> Self {
        Self {
            buffer: String::new(),
            indent_level: 0,
            indent_str: " ".repeat(indent_width),
        }
    }

    /// Get the generated code
    pub fn finish(self) -> String {
        self.buffer
    }

    /// Get current buffer as string slice
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Current indentation depth
    pub fn depth(&self) -> usize {
        self.indent_level
    }

    /// Write a line with current indentation
    pub fn line(&mut self, s: &str) {
        self.write_indent();
        self.buffer.push_str(s);
        self.buffer.push('\n');
    }

    /// Write a line at column zero (preprocessor directives, verbatim header blocks)
    pub fn raw_line(&mut self, s: &str) {
        self.buffer.push_str(s);
        self.buffer.push('\n');
    }

    /// Write a formatted line with current indentation
    pub fn linef(&mut self, args: std::fmt::Arguments<'_>) {
        self.write_indent();
        let _ = self.buffer.write_fmt(args);
        self.buffer.push('\n');
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.buffer.push_str(&self.indent_str);
        }
    }

    /// Increase indent level
    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    /// Decrease indent level
    pub fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    /// Write a block opener (`header` ends with `{`) and indent
    pub fn open(&mut self, header: &str) {
        self.line(header);
        self.indent();
    }

    /// Dedent and write a block closer
    pub fn close(&mut self, closer: &str) {
        self.dedent();
        self.line(closer);
    }

    /// Close the current block and open a sibling on the same line (`} else {`)
    pub fn reopen(&mut self, header: &str) {
        self.dedent();
        self.line(header);
        self.indent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_blocks_indent() {
        let mut e = CppEmitter::new(4);
        e.open("if (a) {");
        e.line("x();");
        e.reopen("} else {");
        e.open("while (b) {");
        e.line("y();");
        e.close("}");
        e.close("}");
        assert_eq!(e.finish(), "if (a) {\n    x();\n} else {\n    while (b) {\n        y();\n    }\n}\n");
    }

    #[test]
    fn test_raw_line_ignores_depth() {
        let mut e = CppEmitter::new(2);
        e.open("struct S {");
        e.raw_line("#define X 1");
        e.linef(format_args!("int v = {};", 3));
        assert_eq!(e.as_str(), "struct S {\n#define X 1\n  int v = 3;\n");
        assert_eq!(e.depth(), 1);
    }

    #[test]
    fn test_dedent_saturates() {
        let mut e = CppEmitter::default();
        e.close("}");
        assert_eq!(e.finish(), "}\n");
    }
}
