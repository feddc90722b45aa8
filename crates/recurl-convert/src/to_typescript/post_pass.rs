//! Whole-buffer rewrites run after the line pass.

use std::sync::LazyLock;

use recurl_core::buffer::LineBuffer;
use recurl_core::scan::is_word_char;
use regex::{Captures, Regex};

use super::{content, KILL_SEMICOLON};

static CLASS_OR_DEF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)(public|class)\s+(\w+)").unwrap());
static F_STRING_DQ: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bf"([^"]*)""#).unwrap());
static F_STRING_SQ: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bf'([^']*)'").unwrap());
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").unwrap());
static TERNARY_ASSIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([ \t]*)(.*?)\s*=\s*(.*?) if (.*?) else (.*);$").unwrap()
});
static TERNARY_RETURN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ \t]*)return\s+(.*?) if (.*?) else (.*);$").unwrap());
static ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ \t]*)(.*?)\s+=\s+(.*)$").unwrap());
static NONE_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bNone\b").unwrap());

/// Substrings of an assignment target that suppress `const`.
const ASSIGNMENT_EXCLUSIONS: &[&str] = &[",", "*", "`", "//", "=", ".", "["];

/// Words of an assignment target that suppress `const`.
const ASSIGNMENT_KEYWORDS: &[&str] = &[
    "class", "const", "def", "elif", "for", "if", "let", "print", "public", "return", "var",
    "while", "with",
];

/// Run every post-pass rewrite and join the lines.
///
/// `const` insertion runs last so it never sees the comments added by the
/// other passes.
pub fn post_pass(mut lines: LineBuffer) -> String {
    move_docstrings(&mut lines);
    do_f_strings(&mut lines);
    do_ternary(&mut lines);
    do_assignment(&mut lines);
    let s = lines
        .into_text()
        .replace("@language python", "@language typescript")
        .replace(KILL_SEMICOLON, "");
    NONE_WORD.replace_all(&s, "null").into_owned()
}

/// Move each converted docstring in front of its `class` or `def` line.
///
/// The moved lines lose four spaces of indentation.
pub fn move_docstrings(lines: &mut LineBuffer) {
    let mut i = 0;
    while i < lines.len() {
        let is_header = CLASS_OR_DEF.is_match(&lines[i]);
        i += 1;
        if !is_header {
            continue;
        }
        let Some(j) = (i..lines.len()).find(|&j| !lines[j].trim().is_empty()) else {
            continue;
        };
        if !lines[j].trim().starts_with("/**") {
            continue;
        }
        let Some(k) = (j..lines.len()).find(|&k| lines[k].contains("*/")) else {
            continue;
        };
        let mut moved: Vec<String> = lines[j..=k]
            .iter()
            .map(|l| l.strip_prefix("    ").unwrap_or(l).to_string())
            .collect();
        moved.push(lines[i - 1].clone());
        lines.splice(i - 1..k + 1, moved);
        i = k + 1;
    }
}

/// `f"a {b!r:>4}"` becomes `` `a ${b}` ``.
pub fn do_f_strings(lines: &mut LineBuffer) {
    for i in 0..lines.len() {
        let line = content(&lines[i]);
        if !F_STRING_DQ.is_match(line) && !F_STRING_SQ.is_match(line) {
            continue;
        }
        let standalone = first_f_string_start(line).is_some_and(|p| line[..p].trim().is_empty());
        let s = F_STRING_DQ.replace_all(line, template);
        let s = F_STRING_SQ.replace_all(&s, template);
        let mut s = s.trim_end().to_string();
        if standalone && s.ends_with(';') {
            s.pop();
        }
        lines.set(i, format!("{}\n", s));
    }
}

fn first_f_string_start(line: &str) -> Option<usize> {
    [&*F_STRING_DQ, &*F_STRING_SQ]
        .iter()
        .filter_map(|re| re.find(line).map(|m| m.start()))
        .min()
}

/// Build a template literal from the body of an f-string.
fn template(caps: &Captures<'_>) -> String {
    let body = caps[1].replace("! ", "not ");
    let body = PLACEHOLDER.replace_all(&body, |c: &Captures<'_>| {
        format!("${{{}}}", strip_format_spec(&c[1]))
    });
    format!("`{}`", body)
}

/// Drop a `!r` conversion and a `:spec` suffix from a placeholder.
fn strip_format_spec(expr: &str) -> &str {
    let mut depth = 0usize;
    let bytes = expr.as_bytes();
    for (pos, ch) in expr.char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => return expr[..pos].trim_end(),
            '!' if depth == 0 && bytes.get(pos + 1) != Some(&b'=') => {
                return expr[..pos].trim_end();
            }
            _ => {}
        }
    }
    expr.trim_end()
}

/// `x = a if c else b;` becomes the source line as a comment plus
/// `x = c ? a : b;`. `return` statements are handled the same way.
pub fn do_ternary(lines: &mut LineBuffer) {
    let mut i = 0;
    while i < lines.len() {
        let line = content(&lines[i]).to_string();
        let rewritten = if let Some(m) = TERNARY_RETURN.captures(&line) {
            Some((m[1].to_string(), format!("return {} ? {} : {};", &m[3], &m[2], &m[4])))
        } else {
            TERNARY_ASSIGN.captures(&line).map(|m| {
                (
                    m[1].to_string(),
                    format!("{} = {} ? {} : {};", &m[2], &m[4], &m[3], &m[5]),
                )
            })
        };
        match rewritten {
            Some((lws, statement)) => {
                lines.set(i, format!("{}// {}\n", lws, line.trim()));
                lines.insert(i + 1, format!("{}{}\n", lws, statement));
                i += 2;
            }
            None => i += 1,
        }
    }
}

/// Prefix simple `name = value` assignments with `const`.
///
/// Tuple, attribute and subscript targets, comments, docstring lines and
/// lines continuing an argument list are left alone.
pub fn do_assignment(lines: &mut LineBuffer) {
    for i in 0..lines.len() {
        let line = content(&lines[i]);
        let Some(m) = ASSIGNMENT.captures(line) else {
            continue;
        };
        let (lws, lhs, rhs) = (&m[1], &m[2], m[3].trim_end());
        if lhs.is_empty()
            || ASSIGNMENT_EXCLUSIONS.iter().any(|x| lhs.contains(x))
            || lhs
                .split(|c: char| !is_word_char(c))
                .any(|w| ASSIGNMENT_KEYWORDS.contains(&w))
            || rhs.trim_end_matches(';').ends_with(',')
        {
            continue;
        }
        let rewritten = format!("{}const {} = {}\n", lws, lhs, rhs);
        lines.set(i, rewritten);
    }
}
