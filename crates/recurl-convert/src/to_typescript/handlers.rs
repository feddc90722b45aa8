//! Line classification and per-construct handlers.
//!
//! Handlers rewrite the line they were dispatched on and return the index
//! of the next line to scan, which is always past the current one.
//! Block-introducing handlers insert the closing `}` at the boundary found
//! by [`find_indented_block`]; that line is scanned later like any other.

use std::sync::LazyLock;

use recurl_core::buffer::LineBuffer;
use recurl_core::scan::skip_to_matching_bracket;
use regex::{Captures, Regex};

use super::{content, do_operators, ends_statement, find_indented_block, kill_semicolons};
use super::{translate_operators, PythonToTypescript, KILL_SEMICOLON};

/// The construct a line introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Comment,
    Docstring,
    SectionRef,
    Class,
    Def,
    Elif,
    Else,
    Except,
    Finally,
    For,
    If,
    Import,
    Try,
    While,
    With,
    TrailingComment,
}

/// Line patterns in priority order.
///
/// Comments, docstrings and section references must be tried first and the
/// trailing-comment pattern last; the order of the rest does not matter.
/// Every pattern captures the leading whitespace as group 1.
pub static PATTERNS: LazyLock<Vec<(LineKind, Regex)>> = LazyLock::new(|| {
    [
        (LineKind::Comment, r"^([ \t]*)#(.*)$"),
        (LineKind::Docstring, r#"^([ \t]*)r?("""|''')(.*)$"#),
        (LineKind::SectionRef, r"^([ \t]*)(<<.*?>>)\s*(.*)$"),
        (LineKind::Class, r"^([ \t]*)class\b(.*):(.*)$"),
        (
            LineKind::Def,
            r"^([ \t]*)def[ \t]+(\w+)\s*\((.*)\)\s*(?:->\s*(.*?))?\s*:(.*)$",
        ),
        (LineKind::Elif, r"^([ \t]*)elif\b(?:[ \t]*(.*):(.*)|[ \t]*\((.*))$"),
        (LineKind::Else, r"^([ \t]*)else:(.*)$"),
        (LineKind::Except, r"^([ \t]*)except\b(.*):(.*)$"),
        (LineKind::Finally, r"^([ \t]*)finally:(.*)$"),
        (LineKind::For, r"^([ \t]*)for\b(?:[ \t]*(.*):(.*)|[ \t]*\((.*))$"),
        (LineKind::If, r"^([ \t]*)if\b(?:[ \t]*(.*):(.*)|[ \t]*\((.*))$"),
        (
            LineKind::Import,
            r"^([ \t]*)(?:import[ \t]+(.*)|from[ \t]+(.*?)[ \t]+import[ \t]+(.*))$",
        ),
        (LineKind::Try, r"^([ \t]*)try:(.*)$"),
        (LineKind::While, r"^([ \t]*)while\b(?:[ \t]*(.*):(.*)|[ \t]*\((.*))$"),
        (LineKind::With, r"^([ \t]*)with\b(.*):(.*)$"),
        (LineKind::TrailingComment, r"^([ \t]*)(.*?)#(.*)$"),
    ]
    .into_iter()
    .map(|(kind, pat)| (kind, Regex::new(pat).unwrap()))
    .collect()
});

static FOR_IN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+(?:\s*,\s*\w+)*)\s+in\s+(.+)$").unwrap());

/// Classify `line` by the first matching pattern.
pub fn classify(line: &str) -> Option<(LineKind, Captures<'_>)> {
    let line = content(line);
    PATTERNS
        .iter()
        .find_map(|(kind, re)| re.captures(line).map(|caps| (*kind, caps)))
}

fn group<'h>(caps: &Captures<'h>, n: usize) -> &'h str {
    caps.get(n).map_or("", |m| m.as_str())
}

/// ` // text` for a non-empty tail, else the empty string.
fn tail_comment(tail: &str) -> String {
    let tail = tail.trim();
    let tail = tail.strip_prefix('#').map_or(tail, str::trim);
    if tail.is_empty() {
        String::new()
    } else {
        format!(" // {}", tail)
    }
}

/// Rewrite line `i` as a block header and close the block with `}`.
fn open_block(lines: &mut LineBuffer, i: usize, lws: &str, header: String) -> usize {
    let j = find_indented_block(lines, i, lws);
    lines.set(i, header);
    lines.insert(j, format!("{}}}\n", lws));
    i + 1
}

/// Wrap `cond` in parentheses unless one pair already encloses all of it.
fn parenthesize(cond: &str) -> String {
    let chars: Vec<char> = cond.chars().collect();
    if chars.first() == Some(&'(') && skip_to_matching_bracket(&chars, 0) + 1 == chars.len() {
        cond.to_string()
    } else {
        format!("({})", cond)
    }
}

/// `x in xs` becomes `(const x of xs)`; `a, b in xs` destructures.
fn for_clause(cond: &str) -> String {
    match FOR_IN.captures(cond) {
        Some(caps) => {
            let target = group(&caps, 1);
            let iter = group(&caps, 2).trim();
            if target.contains(',') {
                format!("(const [{}] of {})", target, iter)
            } else {
                format!("(const {} of {})", target, iter)
            }
        }
        None => parenthesize(cond),
    }
}

/// Byte offset of the first `#` outside a string literal.
pub fn find_comment_start(line: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (pos, ch) in line.char_indices() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if ch == '\\' => escaped = true,
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '\'' || ch == '"' => quote = Some(ch),
            None if ch == '#' => return Some(pos),
            None => {}
        }
    }
    None
}

/// Python annotation to TypeScript type.
fn ts_type(annotation: &str) -> String {
    match annotation.trim() {
        "int" | "float" => "number".to_string(),
        "str" => "string".to_string(),
        "bool" => "boolean".to_string(),
        "None" => "void".to_string(),
        "Any" => "any".to_string(),
        other => other.to_string(),
    }
}

/// Split `s` at commas not nested in brackets.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (pos, ch) in s.char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..pos]);
                start = pos + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

impl PythonToTypescript {
    /// Run the handler for `kind`. `None` sends the line down the default path.
    pub(crate) fn dispatch(
        &self,
        kind: LineKind,
        caps: &Captures<'_>,
        i: usize,
        lines: &mut LineBuffer,
    ) -> Option<usize> {
        let lws = group(caps, 1);
        let next = match kind {
            LineKind::Comment => do_comment(caps, i, lines),
            LineKind::Docstring => do_docstring(caps, i, lines),
            LineKind::SectionRef => do_section_ref(caps, i, lines),
            LineKind::Class => do_class(caps, i, lines),
            LineKind::Def => self.do_def(caps, i, lines),
            LineKind::Elif => do_conditional("else if", caps, i, lines),
            LineKind::Else => {
                let header = format!("{}else {{{}\n", lws, tail_comment(group(caps, 2)));
                open_block(lines, i, lws, header)
            }
            LineKind::Except => do_except(caps, i, lines),
            LineKind::Finally => {
                let header = format!("{}finally {{{}\n", lws, tail_comment(group(caps, 2)));
                open_block(lines, i, lws, header)
            }
            LineKind::For => do_conditional("for", caps, i, lines),
            LineKind::If => do_conditional("if", caps, i, lines),
            LineKind::Import => do_import(caps, i, lines),
            LineKind::Try => {
                let header = format!("{}try {{{}\n", lws, tail_comment(group(caps, 2)));
                open_block(lines, i, lws, header)
            }
            LineKind::While => do_conditional("while", caps, i, lines),
            LineKind::With => {
                let clause = group(caps, 2).trim();
                let clause = if clause.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", clause)
                };
                let header = format!("{}with{} {{{}\n", lws, clause, tail_comment(group(caps, 3)));
                open_block(lines, i, lws, header)
            }
            LineKind::TrailingComment => return do_trailing_comment(i, lines),
        };
        Some(next)
    }

    /// `def name(args) -> ret:` becomes `public [function ]name(args): type {`.
    ///
    /// Methods (functions taking `this`) drop the `function` keyword and the
    /// `this` argument. `__init__` becomes `constructor`, without a type.
    fn do_def(&self, caps: &Captures<'_>, i: usize, lines: &mut LineBuffer) -> usize {
        let lws = group(caps, 1);
        let mut name = group(caps, 2);
        let args = group(caps, 3);
        let is_method = split_top_level(args).iter().any(|a| a.trim() == "this");
        if name == "__init__" {
            name = "constructor";
        }
        let type_s = if name == "constructor" {
            " ".to_string()
        } else {
            match caps.get(4) {
                Some(ret) => format!(": {} ", ts_type(ret.as_str())),
                None => ": void ".to_string(),
            }
        };
        let function_s = if is_method { " " } else { " function " };
        let header = format!(
            "{}public{}{}({}){}{{{}\n",
            lws,
            function_s,
            name,
            self.do_args(args),
            type_s,
            tail_comment(group(caps, 5))
        );
        open_block(lines, i, lws, header)
    }

    /// Drop `this` and add configured types to un-annotated arguments.
    pub fn do_args(&self, args: &str) -> String {
        let mut result = Vec::new();
        for arg in split_top_level(args).into_iter().map(str::trim) {
            if arg.is_empty() || arg == "this" {
                continue;
            }
            let (name, default) = match arg.split_once('=') {
                Some((n, d)) => (n.trim(), Some(d.trim())),
                None => (arg, None),
            };
            match self.config().types.get(name) {
                Some(ty) if !name.contains(':') => match default {
                    Some(d) => result.push(format!("{}: {} = {}", name, ty, d)),
                    None => result.push(format!("{}: {}", name, ty)),
                },
                _ => result.push(arg.to_string()),
            }
        }
        result.join(", ")
    }
}

fn do_comment(caps: &Captures<'_>, i: usize, lines: &mut LineBuffer) -> usize {
    let lws = group(caps, 1);
    let comment = group(caps, 2).trim();
    if comment.is_empty() {
        lines.set(i, "\n");
    } else {
        lines.set(i, format!("{}// {}\n", lws, comment));
    }
    i + 1
}

/// A docstring becomes a `/** ... */` block, one ` * ` line per source line.
fn do_docstring(caps: &Captures<'_>, i: usize, lines: &mut LineBuffer) -> usize {
    let lws = group(caps, 1).to_string();
    let delim = group(caps, 2).to_string();
    let first = group(caps, 3).trim().to_string();
    let mut i = i;

    lines.set(i, format!("{}/**\n", lws));
    let text = first.replace(&delim, "");
    let text = text.trim();
    if !text.is_empty() {
        lines.insert(i + 1, format!("{} * {}\n", lws, text));
        i += 1;
    }
    if first.contains(&delim) {
        lines.insert(i + 1, format!("{} */\n", lws));
        return i + 2;
    }

    i += 1;
    while i < lines.len() {
        let line = lines.line(i).to_string();
        let text = line.replace(&delim, "");
        let text = text.trim();
        if line.contains(&delim) {
            if text.is_empty() {
                lines.set(i, format!("{} */\n", lws));
                return i + 1;
            }
            lines.set(i, format!("{} * {}\n", lws, text));
            lines.insert(i + 1, format!("{} */\n", lws));
            return i + 2;
        }
        if text.is_empty() {
            lines.set(i, format!("{} *\n", lws));
        } else {
            lines.set(i, format!("{} * {}\n", lws, text));
        }
        i += 1;
    }
    i
}

/// A trailing `#` comment on a section reference becomes `//`.
fn do_section_ref(caps: &Captures<'_>, i: usize, lines: &mut LineBuffer) -> usize {
    let tail = group(caps, 3).trim();
    if let Some(comment) = tail.strip_prefix('#') {
        let line = format!("{}{}  // {}\n", group(caps, 1), group(caps, 2), comment.trim());
        lines.set(i, line);
    }
    i + 1
}

/// `class Name(Base):` becomes `class Name extends Base {`.
fn do_class(caps: &Captures<'_>, i: usize, lines: &mut LineBuffer) -> usize {
    let lws = group(caps, 1);
    let decl = group(caps, 2).trim();
    let (name, bases) = match decl.split_once('(') {
        Some((name, rest)) => (name.trim(), rest.trim_end().trim_end_matches(')')),
        None => (decl, ""),
    };
    let base = split_top_level(bases)
        .into_iter()
        .map(str::trim)
        .find(|b| !b.is_empty() && *b != "object");
    let mut header = format!("{}class", lws);
    if !name.is_empty() {
        header.push(' ');
        header.push_str(name);
    }
    if let Some(base) = base {
        header.push_str(" extends ");
        header.push_str(base);
    }
    header.push_str(&format!(" {{{}\n", tail_comment(group(caps, 3))));
    open_block(lines, i, lws, header)
}

/// `except E as e:` becomes `catch (e) { // E`.
fn do_except(caps: &Captures<'_>, i: usize, lines: &mut LineBuffer) -> usize {
    let lws = group(caps, 1);
    let clause = group(caps, 2).trim();
    let tail = tail_comment(group(caps, 3));
    let header = match clause.split_once(" as ") {
        Some((error, name)) => {
            let note = format!(" // {}", error.trim());
            let tail = if tail.is_empty() {
                note
            } else {
                format!("{}:{}", note, tail.trim_start_matches(" //"))
            };
            format!("{}catch ({}) {{{}\n", lws, name.trim(), tail)
        }
        None if clause.is_empty() => format!("{}catch {{{}\n", lws, tail),
        None => format!("{}catch ({}) {{{}\n", lws, clause, tail),
    };
    open_block(lines, i, lws, header)
}

/// `if`, `elif`, `while` and `for` in both their one-line and their
/// parenthesized multi-line forms.
///
/// In the multi-line form, the lines up to the one that closes the
/// parenthesis get no semicolons; that line loses its `:` and gains `{`.
fn do_conditional(keyword: &str, caps: &Captures<'_>, i: usize, lines: &mut LineBuffer) -> usize {
    let lws = group(caps, 1);
    if let Some(cond) = caps.get(2) {
        let cond = cond.as_str().trim();
        let cond = if keyword == "for" {
            for_clause(cond)
        } else {
            parenthesize(cond)
        };
        let header = format!("{}{} {} {{{}\n", lws, keyword, cond, tail_comment(group(caps, 3)));
        let next = open_block(lines, i, lws, header);
        do_operators(lines, i);
        return next;
    }

    let rest = group(caps, 4).trim_end();
    let j = find_indented_block(lines, i, lws);
    lines.set(i, format!("{}{} ({}\n", lws, keyword, rest));
    do_operators(lines, i);
    kill_semicolons(lines, i, j);
    if j < lines.len() {
        let close = format!("{} {{\n", content(lines.line(j)).trim_end().replace(':', ""));
        lines.set(j, close);
        let k = find_indented_block(lines, j, lws);
        lines.insert(k, format!("{}}}\n", lws));
    }
    i + 1
}

/// Imports are commented out.
fn do_import(caps: &Captures<'_>, i: usize, lines: &mut LineBuffer) -> usize {
    let lws = group(caps, 1);
    let line = match caps.get(2) {
        Some(names) => format!("{}// import \"{}\"\n", lws, names.as_str().trim()),
        None => format!(
            "{}// from \"{}\" import {}\n",
            lws,
            group(caps, 3).trim(),
            group(caps, 4).trim()
        ),
    };
    lines.set(i, line);
    i + 1
}

/// `stmt  # comment` becomes `stmt;  // comment`.
///
/// Returns `None` when every `#` on the line is inside a string.
fn do_trailing_comment(i: usize, lines: &mut LineBuffer) -> Option<usize> {
    let line = content(lines.line(i)).to_string();
    let (line, killed) = match line.strip_suffix(KILL_SEMICOLON) {
        Some(stripped) => (stripped.to_string(), true),
        None => (line, false),
    };
    let pos = find_comment_start(&line)?;
    let comment = line[pos + 1..].trim().to_string();
    let statement = translate_operators(line[..pos].trim_end());

    lines.set(i, format!("{}\n", statement));
    let semicolon = if !killed && ends_statement(lines, i) { ";" } else { "" };
    lines.set(i, format!("{}{}  // {}\n", statement, semicolon, comment));
    Some(i + 1)
}
