//! Line tokenizer for Py++ source
//!
//! Py++ is a line-oriented language: every construct the compiler cares about
//! (directives, imports, block keywords, declarations) lives on a single line.
//! The tokenizer therefore works one line at a time and is *lossless*: the
//! concatenation of all token texts is exactly the input line. Higher layers
//! rewrite identifier tokens and copy everything else through untouched.
//!
//! String and character literals are single tokens. An unterminated literal
//! runs to the end of the line, so a stray quote cannot leak literal state into
//! the following lines.

/// Kind of a token produced by [`tokenize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `[A-Za-z_][A-Za-z0-9_]*`
    Ident,
    /// A run starting with a digit. Trailing letters are absorbed (`1u`, `0x1F`), so an identifier glued to a number
    /// is never seen as a standalone identifier.
    Number,
    /// Double-quoted literal including its quotes.
    Str,
    /// Single-quoted literal including its quotes.
    Char,
    /// Any other single character.
    Punct,
    /// A run of whitespace.
    Space,
}

/// A token borrowing its text from the tokenized line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    /// Byte offset of the token within the line.
    pub start: usize,
}

impl<'src> Token<'src> {
    /// Byte offset one past the end of the token.
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    /// Whether this token is a string or character literal.
    pub fn is_literal(&self) -> bool {
        matches!(self.kind, TokenKind::Str | TokenKind::Char)
    }

    /// Whether this token is the identifier `name`.
    pub fn is_ident(&self, name: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == name
    }

    /// Whether this token is the punctuation character `ch`.
    pub fn is_punct(&self, ch: char) -> bool {
        self.kind == TokenKind::Punct && self.text.starts_with(ch)
    }
}

/// Tokenize a single line.
pub fn tokenize(line: &str) -> Vec<Token<'_>> {
    Lexer::new(line).run()
}

struct Lexer<'src> {
    source: &'src str,
    chars: std::iter::Peekable<std::str::CharIndices<'src>>,
    tokens: Vec<Token<'src>>,
}

impl<'src> Lexer<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token<'src>> {
        while let Some((start, ch)) = self.chars.next() {
            let kind = if ch.is_whitespace() {
                self.eat_while(char::is_whitespace);
                TokenKind::Space
            } else if is_ident_start(ch) {
                self.eat_while(is_ident_continue);
                TokenKind::Ident
            } else if ch.is_ascii_digit() {
                self.eat_while(is_ident_continue);
                TokenKind::Number
            } else if ch == '"' {
                self.eat_literal('"');
                TokenKind::Str
            } else if ch == '\'' {
                self.eat_literal('\'');
                TokenKind::Char
            } else {
                TokenKind::Punct
            };
            let end = self.position();
            self.tokens.push(Token {
                kind,
                text: &self.source[start..end],
                start,
            });
        }
        self.tokens
    }

    fn position(&mut self) -> usize {
        self.chars.peek().map(|(i, _)| *i).unwrap_or(self.source.len())
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some((_, c)) = self.chars.peek() {
            if pred(*c) {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    /// Consume a literal body after its opening quote, honouring backslash escapes.
    fn eat_literal(&mut self, quote: char) {
        while let Some((_, c)) = self.chars.next() {
            if c == '\\' {
                self.chars.next();
            } else if c == quote {
                return;
            }
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Check if a character can start an identifier.
pub fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Check if a character can continue an identifier.
pub fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Marker that starts a comment running to the end of the line.
pub const COMMENT_MARKER: &str = "%>";

/// Cut a line at the first comment marker that is not inside a literal.
pub fn strip_comment(line: &str) -> &str {
    let tokens = tokenize(line);
    for pair in tokens.windows(2) {
        if pair[0].is_punct('%') && pair[1].is_punct('>') {
            return &line[..pair[0].start];
        }
    }
    line
}

/// Whether the whole line is a comment (ignoring leading whitespace).
pub fn is_comment_line(line: &str) -> bool {
    line.trim_start().starts_with(COMMENT_MARKER)
}

/// Split `text` on `sep` at nesting depth zero.
///
/// Separators inside string/char literals or inside `()`, `[]`, `{}` are not split points. Each part is trimmed; a
/// trailing empty part is dropped.
pub fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut part_start = 0;
    for token in tokenize(text) {
        if token.kind != TokenKind::Punct {
            continue;
        }
        match token.text {
            "(" | "[" | "{" => depth += 1,
            ")" | "]" | "}" => depth = depth.saturating_sub(1),
            _ if depth == 0 && token.is_punct(sep) => {
                parts.push(text[part_start..token.start].trim());
                part_start = token.end();
            }
            _ => {}
        }
    }
    let last = text[part_start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

/// Find the byte offset of the `)` matching the `(` at byte offset `open`.
///
/// Parentheses inside literals are ignored. Returns `None` when `open` is not a `(` or the group is unterminated.
pub fn matching_paren(text: &str, open: usize) -> Option<usize> {
    if !text[open..].starts_with('(') {
        return None;
    }
    let mut depth = 0usize;
    for token in tokenize(&text[open..]) {
        if token.is_punct('(') {
            depth += 1;
        } else if token.is_punct(')') {
            depth -= 1;
            if depth == 0 {
                return Some(open + token.start);
            }
        }
    }
    None
}

/// Rewrite identifiers outside literals.
///
/// `rename` is called for every identifier token; returning `Some` replaces the token text.
pub fn rewrite_idents<F>(line: &str, mut rename: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(line.len());
    for token in tokenize(line) {
        match token.kind {
            TokenKind::Ident => match rename(token.text) {
                Some(replacement) => out.push_str(&replacement),
                None => out.push_str(token.text),
            },
            _ => out.push_str(token.text),
        }
    }
    out
}
