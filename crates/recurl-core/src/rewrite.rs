//! Whole-buffer rewrite passes.
//!
//! These passes run over a [`CharBuffer`] after the structural work of a
//! brace-to-indent converter is done. With the exception of
//! [`replace_all`] and [`remove_trailing_ws`], every pass steps over
//! string literals and comments as opaque units.

use tracing::trace;

use crate::buffer::CharBuffer;
use crate::scan::{
    is_string_or_comment, is_word_char, match_at, match_word, skip_block_comment, skip_past_line,
    skip_past_word, skip_string_or_comment, skip_to_matching_bracket, skip_ws,
};
use crate::text::indent_width;

// ============================================================================
// Replacement
// ============================================================================

/// Replace every occurrence of `find` with `change`, ignoring lexical context.
pub fn replace_all(buf: &mut CharBuffer, find: &str, change: &str) {
    if find.is_empty() {
        return;
    }
    let n = find.chars().count();
    let mut i = 0;
    while i < buf.len() {
        if match_at(buf, i, find) {
            i += buf.splice_str(i..i + n, change);
        } else {
            i += 1;
        }
    }
}

/// Replace `find` with `change` everywhere outside strings and comments.
///
/// Patterns that begin with a letter only match whole words: a match must
/// start at the beginning of an identifier and must not run into the next
/// identifier character. Other patterns match anywhere.
pub fn safe_replace(buf: &mut CharBuffer, find: &str, change: &str) {
    let Some(first) = find.chars().next() else {
        return;
    };
    let words = first.is_alphabetic();
    let n = find.chars().count();
    let mut i = 0;
    while i < buf.len() {
        if is_string_or_comment(buf, i) {
            i = skip_string_or_comment(buf, i);
        } else if words {
            if match_word(buf, i, find) {
                i += buf.splice_str(i..i + n, change);
            } else if is_word_char(buf[i]) {
                i = skip_past_word(buf, i).max(i + 1);
            } else {
                i += 1;
            }
        } else if match_at(buf, i, find) {
            i += buf.splice_str(i..i + n, change);
        } else {
            i += 1;
        }
    }
}

/// Apply a table of `(find, change)` pairs with [`safe_replace`], in order.
pub fn safe_replace_all(buf: &mut CharBuffer, table: &[(&str, &str)]) {
    for (find, change) in table {
        safe_replace(buf, find, change);
    }
}

// ============================================================================
// Comments
// ============================================================================

/// Translate `//` and `/* ... */` comments into `#` comments.
///
/// Line comments keep their text and position. Block comments become one
/// `#` line per non-blank source line, indented like the comment itself.
pub fn replace_comments(buf: &mut CharBuffer, tab_width: usize) {
    let mut i = 0;
    while i < buf.len() {
        if match_at(buf, i, "//") {
            buf.splice_str(i..i + 2, "#");
            i = skip_past_line(buf, i);
        } else if match_at(buf, i, "/*") {
            let j = skip_block_comment(buf, i);
            let terminated = j >= i + 4 && match_at(buf, j - 2, "*/");
            let body_end = if terminated { j - 2 } else { j };
            let mut k = i;
            while k > 0 && matches!(buf[k - 1], ' ' | '\t') {
                k -= 1;
            }
            let lws = buf.text(k..i);
            let body = buf.text(i + 2..body_end);
            let replacement = munge_block_comment(&lws, &body, tab_width).join("\n");
            trace!(start = k, end = j, "block comment");
            i = k + buf.splice_str(k..j, &replacement);
        } else if is_string_or_comment(buf, i) {
            i = skip_string_or_comment(buf, i);
        } else {
            i += 1;
        }
    }
}

/// Render the body of a block comment as `#` lines.
///
/// `lws` is the whitespace preceding the `/*`; every emitted line is
/// indented to its width. A leading `*` decoration on a line is dropped.
/// Blank interior lines become empty lines; blank first and last lines
/// are omitted.
pub fn munge_block_comment(lws: &str, body: &str, tab_width: usize) -> Vec<String> {
    let pad = " ".repeat(indent_width(lws, tab_width));
    let render = |line: &str| -> String {
        let t = line.trim();
        let t = t.strip_prefix('*').map(str::trim_start).unwrap_or(t);
        if t.is_empty() {
            format!("{}#", pad)
        } else {
            format!("{}# {}", pad, t)
        }
    };

    let lines: Vec<&str> = body.split('\n').collect();
    if lines.len() == 1 {
        return vec![render(lines[0])];
    }

    let last = lines.len() - 1;
    let mut out = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        let t = line.trim();
        let blank = t.is_empty() || t == "*";
        if !blank {
            out.push(render(line));
        } else if idx != 0 && idx != last {
            out.push(String::new());
        }
    }
    if out.is_empty() {
        out.push(format!("{}#", pad));
    }
    out
}

// ============================================================================
// Statements and Whitespace
// ============================================================================

/// Delete a `;` that ends its line (optionally followed by a comment).
pub fn remove_semicolons_at_end_of_lines(buf: &mut CharBuffer) {
    let mut i = 0;
    while i < buf.len() {
        if is_string_or_comment(buf, i) {
            i = skip_string_or_comment(buf, i);
        } else if buf[i] == ';' {
            let j = skip_ws(buf, i + 1);
            let at_end = j >= buf.len()
                || match_at(buf, j, "\n")
                || match_at(buf, j, "#")
                || match_at(buf, j, "//")
                || match_at(buf, j, "/*");
            if at_end {
                buf.remove_range(i..i + 1);
            } else {
                i += 1;
            }
        } else {
            i += 1;
        }
    }
}

/// Delete lines that contain only whitespace.
pub fn remove_blank_lines(buf: &mut CharBuffer) {
    let mut i = 0;
    while i < buf.len() {
        let j = skip_ws(buf, i);
        if match_at(buf, j, "\n") {
            buf.remove_range(i..j + 1);
        } else {
            i = skip_past_line(buf, i);
        }
    }
}

/// Collapse interior runs of spaces and tabs to a single space.
///
/// Leading indentation and the contents of strings and comments are left
/// untouched.
pub fn remove_excess_ws(buf: &mut CharBuffer) {
    let mut i = 0;
    let mut at_line_start = true;
    while i < buf.len() {
        if at_line_start {
            i = skip_ws(buf, i);
            at_line_start = false;
            continue;
        }
        if is_string_or_comment(buf, i) {
            let j = skip_string_or_comment(buf, i);
            at_line_start = j > i && buf[j - 1] == '\n';
            i = j;
        } else if buf[i] == '\n' {
            i += 1;
            at_line_start = true;
        } else if matches!(buf[i], ' ' | '\t') {
            let j = skip_ws(buf, i);
            if j > i + 1 {
                buf.splice_str(i..j, " ");
            }
            i += 1;
        } else {
            i += 1;
        }
    }
}

/// Delete spaces and tabs at the end of every line.
pub fn remove_trailing_ws(buf: &mut CharBuffer) {
    let mut i = 0;
    while i < buf.len() {
        if matches!(buf[i], ' ' | '\t') {
            let j = skip_ws(buf, i);
            if j >= buf.len() || buf[j] == '\n' {
                buf.remove_range(i..j);
            } else {
                i = j;
            }
        } else {
            i += 1;
        }
    }
}

// ============================================================================
// Brackets and Operators
// ============================================================================

/// Delete the bracket at `i` together with its matching closer.
///
/// Returns the index just past the formerly bracketed text. When the
/// bracket is unmatched nothing is deleted and the scan position of the
/// closer is returned.
pub fn remove_matching_brackets(buf: &mut CharBuffer, i: usize) -> usize {
    let j = skip_to_matching_bracket(buf, i);
    if i < j && j < buf.len() && matches!(buf[j], ')' | ']' | '}') {
        buf.remove_range(j..j + 1);
        buf.remove_range(i..i + 1);
        return j - 1;
    }
    j
}

/// Rewrite logical-negation `!` (but not `!=`) as `not `.
pub fn insert_not(buf: &mut CharBuffer) {
    let mut i = 0;
    while i < buf.len() {
        if is_string_or_comment(buf, i) {
            i = skip_string_or_comment(buf, i);
        } else if buf[i] == '!' && !match_at(buf, i + 1, "=") {
            i += buf.splice_str(i..i + 1, "not ");
        } else {
            i += 1;
        }
    }
}
