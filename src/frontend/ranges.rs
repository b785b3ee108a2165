//! Range literals and collection comprehensions
//!
//! Integer range literals outside string and character literals are rewritten
//! into explicit brace lists:
//!
//! ```text
//! 3..7     =>  {3,4,5,6,7}
//! 3..7:2   =>  {3,5,7}
//! 5..1     =>  {5,4,3,2,1}
//! ```
//!
//! Both bounds are inclusive. When the end is below the start the range counts
//! down; an explicit step only contributes its magnitude, the direction always
//! comes from the bounds. A zero step, or a range longer than
//! [`MAX_RANGE_LEN`], is left exactly as written; an over-long literal is
//! reported with `warn!`.
//!
//! Comprehensions (`std::vector<int> sq = (i * i foreach i xs)`) are recognised
//! here but expanded by the transpiler, which owns indentation and the block
//! stack.

use pypp_syntax::lexer::{TokenKind, is_ident_continue, is_ident_start, matching_paren, strip_comment, tokenize};

/// Longest range that is expanded into a brace list.
pub const MAX_RANGE_LEN: u64 = 1 << 16;

/// An integer range literal `START..END[:STEP]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeLiteral {
    pub start: i64,
    pub end: i64,
    pub step: Option<i64>,
}

impl RangeLiteral {
    /// Parse a range literal at the very start of `text`, returning it and its byte length.
    pub fn parse_prefix(text: &str) -> Option<(RangeLiteral, usize)> {
        let (start, pos) = parse_int(text, 0)?;
        let pos = skip_spaces(text, pos);
        let pos = skip_spaces(text, text[pos..].starts_with("..").then_some(pos + 2)?);
        let (end, mut pos) = parse_int(text, pos)?;

        let mut step = None;
        if text[pos..].starts_with(':') {
            if let Some((value, after)) = parse_int(text, pos + 1) {
                step = Some(value);
                pos = after;
            }
        }

        // `1..3x` or `1..3.5` is not a range.
        if text[pos..].starts_with(|c: char| is_ident_continue(c) || c == '.') {
            return None;
        }
        Some((RangeLiteral { start, end, step }, pos))
    }

    /// The values of the range, or `None` when it is not expanded.
    pub fn values(&self) -> Option<Vec<i64>> {
        let magnitude = match self.step {
            Some(0) => return None,
            Some(step) => step.unsigned_abs(),
            None => 1,
        };
        let count = (self.start.abs_diff(self.end) / magnitude)
            .checked_add(1)
            .filter(|&count| count <= MAX_RANGE_LEN);
        let Some(count) = count else {
            tracing::warn!(
                start = self.start,
                end = self.end,
                max = MAX_RANGE_LEN,
                "range literal too long to expand, left as written"
            );
            return None;
        };

        let stride = if self.end >= self.start {
            i128::from(magnitude)
        } else {
            -i128::from(magnitude)
        };
        (0..count)
            .map(|k| i64::try_from(i128::from(self.start) + stride * i128::from(k)).ok())
            .collect()
    }
}

/// Render values as a C++ brace list: `{1,2,3}`.
pub fn brace_list(values: &[i64]) -> String {
    let items: Vec<String> = values.iter().map(i64::to_string).collect();
    format!("{{{}}}", items.join(","))
}

fn parse_int(text: &str, pos: usize) -> Option<(i64, usize)> {
    let rest = &text[pos..];
    let sign = usize::from(rest.starts_with('-'));
    let digits = rest[sign..].bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let end = pos + sign + digits;
    let value = text[pos..end].parse().ok()?;
    Some((value, end))
}

fn skip_spaces(text: &str, pos: usize) -> usize {
    pos + text[pos..].len() - text[pos..].trim_start().len()
}

/// Expand range literals on every line of `source`.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn expand_ranges(source: &str) -> String {
    source.lines().map(expand_line).collect::<Vec<_>>().join("\n")
}

/// Expand range literals on one line, leaving string and char literals alone.
pub fn expand_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut segment_start = 0;
    for token in tokenize(line) {
        if token.is_literal() {
            expand_segment(&line[segment_start..token.start], &mut out);
            out.push_str(token.text);
            segment_start = token.end();
        }
    }
    expand_segment(&line[segment_start..], &mut out);
    out
}

fn expand_segment(text: &str, out: &mut String) {
    let mut copied = 0;
    let mut pos = 0;
    let mut prev: Option<char> = None;

    while let Some(ch) = text[pos..].chars().next() {
        let at_boundary = !prev.is_some_and(|c| is_ident_continue(c) || c == '.');
        if at_boundary && (ch == '-' || ch.is_ascii_digit()) {
            if let Some((range, len)) = RangeLiteral::parse_prefix(&text[pos..]) {
                if let Some(values) = range.values() {
                    out.push_str(&text[copied..pos]);
                    out.push_str(&brace_list(&values));
                    pos += len;
                    copied = pos;
                    prev = Some('}');
                    continue;
                }
            }
        }
        prev = Some(ch);
        pos += ch.len_utf8();
    }
    out.push_str(&text[copied..]);
}

/// Split a `foreach` container of the form `A..B` whose bounds are not integer literals.
pub fn symbolic_bounds(container: &str) -> Option<(&str, &str)> {
    let tokens = tokenize(container);
    let split = tokens.windows(3).find(|w| {
        w[0].is_punct('.') && w[1].is_punct('.') && !w[2].is_punct('.')
    })?;
    let lower = container[..split[0].start].trim();
    let upper = container[split[1].end()..].trim();
    if lower.is_empty() || upper.is_empty() || lower.ends_with('.') {
        return None;
    }
    Some((lower, upper))
}

/// A `[TYPE] NAME = (EXPR foreach VAR CONTAINER)` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comprehension<'a> {
    pub ty: Option<&'a str>,
    pub name: &'a str,
    pub expr: &'a str,
    pub var: &'a str,
    pub container: &'a str,
}

impl<'a> Comprehension<'a> {
    /// Recognise a comprehension line. Trailing comments and a trailing `;` are allowed.
    pub fn parse(line: &'a str) -> Option<Self> {
        let line = strip_comment(line).trim();
        let tokens = tokenize(line);

        // First lone `=`: not part of `==`, `<=`, `>=`, `!=`.
        let assign = tokens.iter().enumerate().find_map(|(i, t)| {
            let lone = t.is_punct('=')
                && !tokens.get(i + 1).is_some_and(|n| n.is_punct('='))
                && !i
                    .checked_sub(1)
                    .and_then(|p| tokens.get(p))
                    .is_some_and(|p| p.kind == TokenKind::Punct && "=<>!".contains(p.text));
            lone.then_some(t.start)
        })?;

        let lhs = line[..assign].trim_end();
        let name_start = lhs
            .char_indices()
            .rev()
            .take_while(|&(_, c)| is_ident_continue(c))
            .last()
            .map(|(i, _)| i)?;
        let name = &lhs[name_start..];
        if !name.starts_with(is_ident_start) {
            return None;
        }
        let ty = Some(lhs[..name_start].trim()).filter(|t| !t.is_empty());

        let rhs_offset = assign + 1 + (line[assign + 1..].len() - line[assign + 1..].trim_start().len());
        let close = matching_paren(line, rhs_offset)?;
        let trailing = line[close + 1..].trim();
        if !(trailing.is_empty() || trailing == ";") {
            return None;
        }
        let inner = &line[rhs_offset + 1..close];
        let (expr, var, container) = split_generator(inner)?;

        Some(Comprehension {
            ty,
            name,
            expr,
            var,
            container,
        })
    }

    /// `TYPE NAME = {};`
    pub fn declaration(&self) -> String {
        match self.ty {
            Some(ty) => format!("{ty} {} = {{}};", self.name),
            None => format!("{} = {{}};", self.name),
        }
    }

    /// `for (auto &VAR : CONTAINER) {`
    pub fn loop_header(&self) -> String {
        format!("for (auto &{} : {}) {{", self.var, self.container)
    }

    /// `NAME.push_back(EXPR);`
    pub fn push_statement(&self) -> String {
        format!("{}.push_back({});", self.name, self.expr)
    }
}

/// Split `EXPR foreach VAR CONTAINER` at the first top-level `foreach` keyword.
fn split_generator(inner: &str) -> Option<(&str, &str, &str)> {
    let tokens = tokenize(inner);
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token.text {
            "(" | "[" | "{" if token.kind == TokenKind::Punct => depth += 1,
            ")" | "]" | "}" if token.kind == TokenKind::Punct => depth = depth.saturating_sub(1),
            _ => {}
        }
        let spaced = i > 0
            && tokens[i - 1].kind == TokenKind::Space
            && tokens.get(i + 1).is_some_and(|t| t.kind == TokenKind::Space);
        if depth != 0 || !token.is_ident("foreach") || !spaced {
            continue;
        }

        let expr = inner[..token.start].trim();
        let rest = inner[token.end()..].trim_start();
        let var_len = rest.find(|c: char| !is_ident_continue(c)).unwrap_or(rest.len());
        let (var, tail) = rest.split_at(var_len);
        let container = tail.trim();
        let valid = !expr.is_empty()
            && var.starts_with(is_ident_start)
            && tail.starts_with(char::is_whitespace)
            && !container.is_empty();
        return valid.then_some((expr, var, container));
    }
    None
}
