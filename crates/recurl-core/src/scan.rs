//! Lexical scanning primitives over character slices.
//!
//! Every function takes a slice and a start index and returns a new index;
//! none of them mutate. The scanners understand just enough of a C-family
//! language to step over string literals (`'...'`, `"..."`), line comments
//! (`//`) and block comments (`/* ... */`) without looking inside them.
//!
//! Scanners never fail. Unterminated constructs run to the end of the
//! slice and the returned index is clamped to `s.len()`.

/// Identifier characters: alphanumerics and underscore.
pub fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// True when `pat` occurs at position `i`.
pub fn match_at(s: &[char], i: usize, pat: &str) -> bool {
    if pat.is_empty() {
        return false;
    }
    let mut j = i;
    for pc in pat.chars() {
        match s.get(j) {
            Some(&c) if c == pc => j += 1,
            _ => return false,
        }
    }
    true
}

/// True when `pat` occurs at `i` and is not followed by an identifier char.
///
/// Patterns whose last character is not alphanumeric (such as `"new "`)
/// match like [`match_at`].
pub fn match_word(s: &[char], i: usize, pat: &str) -> bool {
    if !match_at(s, i, pat) {
        return false;
    }
    if !pat.chars().last().is_some_and(char::is_alphanumeric) {
        return true;
    }
    let j = i + pat.chars().count();
    !s.get(j).copied().is_some_and(is_word_char)
}

/// True when a string literal or comment starts at `i`.
pub fn is_string_or_comment(s: &[char], i: usize) -> bool {
    match s.get(i) {
        Some('\'') | Some('"') => true,
        Some('/') => matches!(s.get(i + 1), Some('/') | Some('*')),
        _ => false,
    }
}

/// Skip the string literal starting at `i`, honoring backslash escapes.
///
/// Returns the index just past the closing delimiter.
pub fn skip_string(s: &[char], i: usize) -> usize {
    let Some(&delim) = s.get(i) else {
        return s.len();
    };
    let mut i = i + 1;
    while i < s.len() {
        let ch = s[i];
        if ch == delim {
            return i + 1;
        }
        i += if ch == '\\' { 2 } else { 1 };
    }
    s.len()
}

/// Skip the `/* ... */` comment starting at `i`.
pub fn skip_block_comment(s: &[char], i: usize) -> usize {
    let mut i = i + 2;
    while i < s.len() {
        if match_at(s, i, "*/") {
            return i + 2;
        }
        i += 1;
    }
    s.len()
}

/// Skip the string or comment starting at `i`.
///
/// Line comments are skipped through their newline. When `i` does not
/// start a string or comment, returns `i + 1`.
pub fn skip_string_or_comment(s: &[char], i: usize) -> usize {
    if match_at(s, i, "'") || match_at(s, i, "\"") {
        skip_string(s, i)
    } else if match_at(s, i, "//") {
        skip_past_line(s, i)
    } else if match_at(s, i, "/*") {
        skip_block_comment(s, i)
    } else {
        (i + 1).min(s.len())
    }
}

/// Find the bracket matching the opener at `i`.
///
/// Handles `()`, `[]` and `{}` with nesting, stepping over strings and
/// comments. Returns the index of the matching closer, or `s.len()` when
/// unterminated. When `s[i]` is not an opening bracket, returns `i`.
pub fn skip_to_matching_bracket(s: &[char], i: usize) -> usize {
    let close = match s.get(i) {
        Some('(') => ')',
        Some('[') => ']',
        Some('{') => '}',
        _ => return i,
    };
    let mut i = i + 1;
    while i < s.len() {
        let ch = s[i];
        if ch == close {
            return i;
        } else if is_string_or_comment(s, i) {
            i = skip_string_or_comment(s, i);
        } else if matches!(ch, '(' | '[' | '{') {
            i = skip_to_matching_bracket(s, i) + 1;
        } else {
            i += 1;
        }
    }
    s.len()
}

/// Skip spaces and tabs.
pub fn skip_ws(s: &[char], mut i: usize) -> usize {
    while matches!(s.get(i), Some(' ') | Some('\t')) {
        i += 1;
    }
    i
}

/// Skip spaces, tabs and newlines.
pub fn skip_ws_and_nl(s: &[char], mut i: usize) -> usize {
    while matches!(s.get(i), Some(' ') | Some('\t') | Some('\n') | Some('\r')) {
        i += 1;
    }
    i
}

/// Advance to the `\n` ending the current line, or to the end of `s`.
pub fn skip_line(s: &[char], mut i: usize) -> usize {
    while i < s.len() && s[i] != '\n' {
        i += 1;
    }
    i.min(s.len())
}

/// Advance past the `\n` ending the current line.
pub fn skip_past_line(s: &[char], i: usize) -> usize {
    (skip_line(s, i) + 1).min(s.len())
}

/// Skip an identifier (optionally preceded by `~`, for destructor names).
pub fn skip_past_word(s: &[char], mut i: usize) -> usize {
    if s.get(i) == Some(&'~') {
        i += 1;
    }
    while s.get(i).copied().is_some_and(is_word_char) {
        i += 1;
    }
    i.min(s.len())
}

/// Index of the nearest character before `i` that is not a space or tab.
pub fn prev_non_ws_char(s: &[char], i: usize) -> Option<usize> {
    let mut i = i.min(s.len());
    while i > 0 {
        i -= 1;
        if !matches!(s[i], ' ' | '\t') {
            return Some(i);
        }
    }
    None
}

/// Index of the nearest character before `i` that is not whitespace.
pub fn prev_non_ws_or_nl_char(s: &[char], i: usize) -> Option<usize> {
    let mut i = i.min(s.len());
    while i > 0 {
        i -= 1;
        if !matches!(s[i], ' ' | '\t' | '\n' | '\r') {
            return Some(i);
        }
    }
    None
}

/// Start of the line containing position `i`.
pub fn line_start(s: &[char], i: usize) -> usize {
    let mut i = i.min(s.len());
    while i > 0 && s[i - 1] != '\n' {
        i -= 1;
    }
    i
}

/// True when `line` contains a `<< name >>` section reference.
pub fn is_section_ref(line: &str) -> bool {
    let Some(open) = line.find("<<") else {
        return false;
    };
    let rest = &line[open + 2..];
    match rest.find(">>") {
        Some(close) => !rest[..close].trim().is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    mod matching {
        use super::*;

        #[test]
        fn match_at_basic() {
            let s = chars("else if");
            assert!(match_at(&s, 0, "else"));
            assert!(match_at(&s, 5, "if"));
            assert!(!match_at(&s, 6, "if"));
            assert!(!match_at(&s, 0, ""));
        }

        #[test]
        fn match_word_requires_boundary() {
            let s = chars("iffy if(");
            assert!(!match_word(&s, 0, "if"));
            assert!(match_word(&s, 5, "if"));
        }

        #[test]
        fn match_word_at_end_of_text() {
            let s = chars("x = NULL");
            assert!(match_word(&s, 4, "NULL"));
        }

        #[test]
        fn match_word_with_trailing_punctuation_pattern() {
            let s = chars("new Foo");
            assert!(match_word(&s, 0, "new "));
        }
    }

    mod strings_and_comments {
        use super::*;

        #[test]
        fn detects_starts() {
            let s = chars("'a' \"b\" // c /* d */ / e");
            assert!(is_string_or_comment(&s, 0));
            assert!(is_string_or_comment(&s, 4));
            assert!(is_string_or_comment(&s, 8));
            assert!(is_string_or_comment(&s, 13));
            assert!(!is_string_or_comment(&s, 21));
        }

        #[test]
        fn skip_string_honors_escapes() {
            let s = chars(r#""a\"b" x"#);
            assert_eq!(skip_string(&s, 0), 6);
        }

        #[test]
        fn unterminated_string_runs_to_end() {
            let s = chars("'abc");
            assert_eq!(skip_string(&s, 0), 4);
            let s = chars("'ab\\");
            assert_eq!(skip_string(&s, 0), 4);
        }

        #[test]
        fn line_comment_skips_through_newline() {
            let s = chars("// hi\nx");
            assert_eq!(skip_string_or_comment(&s, 0), 6);
        }

        #[test]
        fn block_comment() {
            let s = chars("/* a\n b */x");
            assert_eq!(skip_string_or_comment(&s, 0), 10);
            let s = chars("/* open");
            assert_eq!(skip_string_or_comment(&s, 0), 7);
        }

        #[test]
        fn non_string_advances_by_one() {
            let s = chars("ab");
            assert_eq!(skip_string_or_comment(&s, 0), 1);
            assert_eq!(skip_string_or_comment(&s, 2), 2);
        }
    }

    mod brackets {
        use super::*;

        #[test]
        fn nested_brackets() {
            let s = chars("f(a, (b), [c]) x");
            assert_eq!(skip_to_matching_bracket(&s, 1), 13);
        }

        #[test]
        fn brackets_inside_strings_and_comments_are_ignored() {
            let s = chars("{ \")\" /* } */ '}' }");
            assert_eq!(skip_to_matching_bracket(&s, 0), s.len() - 1);
        }

        #[test]
        fn unterminated_returns_len() {
            let s = chars("{ ( ");
            assert_eq!(skip_to_matching_bracket(&s, 0), s.len());
        }

        #[test]
        fn non_bracket_returns_start() {
            let s = chars("abc");
            assert_eq!(skip_to_matching_bracket(&s, 1), 1);
        }

        #[test]
        fn matches_every_balanced_opener() {
            let text = "a(b[c{d}e]f)g{h(i)j}";
            let s = chars(text);
            for (i, ch) in text.chars().enumerate() {
                let close = match ch {
                    '(' => ')',
                    '[' => ']',
                    '{' => '}',
                    _ => continue,
                };
                let j = skip_to_matching_bracket(&s, i);
                assert_eq!(s[j], close, "opener at {}", i);
                let depth: i32 = s[i..=j]
                    .iter()
                    .map(|c| match c {
                        '(' | '[' | '{' => 1,
                        ')' | ']' | '}' => -1,
                        _ => 0,
                    })
                    .sum();
                assert_eq!(depth, 0);
            }
        }
    }

    mod whitespace_and_lines {
        use super::*;

        #[test]
        fn skip_ws_variants() {
            let s = chars(" \t\n x");
            assert_eq!(skip_ws(&s, 0), 2);
            assert_eq!(skip_ws_and_nl(&s, 0), 4);
            assert_eq!(skip_ws(&s, 9), 9);
        }

        #[test]
        fn lines() {
            let s = chars("ab\ncd");
            assert_eq!(skip_line(&s, 0), 2);
            assert_eq!(skip_past_line(&s, 0), 3);
            assert_eq!(skip_past_line(&s, 3), 5);
            assert_eq!(line_start(&s, 4), 3);
        }

        #[test]
        fn words() {
            let s = chars("~Foo_1 x");
            assert_eq!(skip_past_word(&s, 0), 6);
            assert_eq!(skip_past_word(&s, 6), 6);
        }

        #[test]
        fn previous_chars() {
            let s = chars("a)\n  \t{");
            assert_eq!(prev_non_ws_char(&s, 6), Some(2));
            assert_eq!(prev_non_ws_or_nl_char(&s, 6), Some(1));
            assert_eq!(prev_non_ws_or_nl_char(&s, 0), None);
        }

        #[test]
        fn section_refs() {
            assert!(is_section_ref("    << imports >>\n"));
            assert!(!is_section_ref("a << b"));
            assert!(!is_section_ref("x <<>> y"));
        }
    }
}
