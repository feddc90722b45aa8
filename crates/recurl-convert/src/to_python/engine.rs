//! Shared brace-to-indent machinery.
//!
//! The engine finds function definitions by scanning for a `{` at the top
//! level whose preceding text looks like `head(args)`, rewrites the header
//! into a `def` line, massages the body, and leaves everything else for the
//! token tables and normalization passes run by the dialect converters.

use recurl_core::buffer::CharBuffer;
use recurl_core::config::ConverterConfig;
use recurl_core::error::{ConvertError, ConvertResult};
use recurl_core::rewrite::{
    insert_not, remove_blank_lines, remove_excess_ws, remove_matching_brackets,
    remove_semicolons_at_end_of_lines, remove_trailing_ws, replace_all, replace_comments,
    safe_replace_all,
};
use recurl_core::scan::{
    is_string_or_comment, is_word_char, line_start, match_at, match_word, prev_non_ws_char,
    prev_non_ws_or_nl_char, skip_past_line, skip_past_word, skip_string_or_comment,
    skip_to_matching_bracket, skip_ws, skip_ws_and_nl,
};
use recurl_core::text::char_offset_to_position;
use tracing::{debug, trace};

/// Replaces the `{` of a bare nested block.
pub const START_DEDENTED_BLOCK: &str = "# <Start dedented block>...";
/// Replaces the `}` of a bare nested block.
pub const END_DEDENTED_BLOCK: &str = "    # <End dedented block>";

const STATEMENT_KEYWORDS: &[&str] = &["elif", "for", "if", "while"];

const CLASS_MODIFIERS: &[&str] = &[
    "abstract", "declare", "default", "export", "private", "protected", "public",
];

/// Source language of a brace-to-indent conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    C,
    TypeScript,
}

impl Dialect {
    /// First words that disqualify a `head(args) {` span from being a function.
    fn reserved_heads(self) -> &'static [&'static str] {
        match self {
            Dialect::C => &["catch", "class", "do", "for", "if", "struct", "switch", "while"],
            Dialect::TypeScript => &["catch", "do", "for", "if", "struct", "switch", "while"],
        }
    }
}

/// Function-level rewriting shared by the C and TypeScript converters.
///
/// The engine carries the class context: the class whose member is being
/// converted. Every function head starts from the enclosing `class Name {`
/// body (empty at top level) and a `Class::member` qualifier overrides it
/// for that function only.
#[derive(Debug, Clone)]
pub struct Engine {
    dialect: Dialect,
    config: ConverterConfig,
    class_name: String,
    /// Innermost `class Name {` body the scan is inside.
    body_class: String,
}

impl Engine {
    pub fn new(dialect: Dialect, config: ConverterConfig) -> Self {
        Engine {
            dialect,
            config,
            class_name: String::new(),
            body_class: String::new(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// The current class context (empty when none).
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    // ========================================================================
    // Function discovery
    // ========================================================================

    /// Rewrite every top-level function definition in `buf`.
    ///
    /// `prev_semi` tracks the start of the current statement: it moves past
    /// each `;`, comment, preprocessor line and handled block, so the text
    /// between it and the first `(` is the candidate function head.
    pub fn munge_all_functions(&mut self, buf: &mut CharBuffer) -> ConvertResult<()> {
        let mut class_bodies: Vec<String> = Vec::new();
        self.class_name.clear();
        self.body_class.clear();
        let mut prev_semi = 0;
        let mut first_open: Option<usize> = None;
        let mut i = 0;
        while i < buf.len() {
            let ch = buf[i];
            if is_string_or_comment(buf, i) {
                i = skip_string_or_comment(buf, i);
                if first_open.is_none() {
                    prev_semi = i;
                }
            } else if ch == '(' {
                if first_open.is_none() {
                    first_open = Some(i);
                }
                i += 1;
            } else if ch == '#' && self.dialect == Dialect::C {
                i = skip_past_line(buf, i);
                prev_semi = i;
            } else if ch == ';' {
                i += 1;
                prev_semi = i;
                first_open = None;
            } else if ch == '{' {
                if let Some(name) = class_header_name(buf, prev_semi, i) {
                    debug!(class = %name, "entering class body");
                    class_bodies.push(name.clone());
                    self.body_class = name;
                    i += 1;
                } else {
                    i = self.handle_possible_function_header(buf, i, prev_semi, first_open)?;
                }
                prev_semi = i;
                first_open = None;
            } else if ch == '}' {
                // Function and plain blocks are skipped whole, so a bare `}`
                // closes a class body.
                if let Some(name) = class_bodies.pop() {
                    debug!(class = %name, "leaving class body");
                }
                self.body_class = class_bodies.last().cloned().unwrap_or_default();
                i += 1;
                prev_semi = i;
                first_open = None;
            } else {
                i += 1;
            }
        }
        self.class_name.clear();
        self.body_class.clear();
        Ok(())
    }

    /// Convert the function whose body starts at the `{` at `i`, if any.
    ///
    /// Returns the index just past the converted function, or just past
    /// the matching `}` when the span is not a function definition.
    pub fn handle_possible_function_header(
        &mut self,
        buf: &mut CharBuffer,
        i: usize,
        prev_semi: usize,
        first_open: Option<usize>,
    ) -> ConvertResult<usize> {
        let past_block = (skip_to_matching_bracket(buf, i) + 1).min(buf.len());
        let prev_semi = skip_ws_and_nl(buf, prev_semi);

        let Some(mut close) = prev_non_ws_or_nl_char(buf, i) else {
            return Ok(past_block);
        };
        let mut body_start = close + 1;
        if buf[close] != ')' {
            match self.return_type_close(buf, i) {
                Some(paren) => {
                    close = paren;
                    body_start = i;
                }
                None => return Ok(past_block),
            }
        }
        let Some(open) = first_open else {
            return Ok(past_block);
        };
        if skip_to_matching_bracket(buf, open) != close || prev_semi > open {
            return Ok(past_block);
        }

        let head: Vec<char> = buf[prev_semi..open].to_vec();
        let k = skip_ws(&head, 0);
        if k >= head.len() || !head[k].is_alphabetic() {
            return Ok(past_block);
        }
        let first_word: String = head[k..skip_past_word(&head, k)].iter().collect();
        if self.dialect.reserved_heads().contains(&first_word.as_str()) {
            return Ok(past_block);
        }

        let (line, _) = char_offset_to_position(buf, open);
        let head = self.massage_function_head(&head);
        let args = self.massage_function_args(&buf[open..=close], line)?;
        let mut body = CharBuffer::from(buf[body_start.min(past_block)..past_block].to_vec());
        self.massage_function_body(&mut body);

        let mut result = head;
        result.push_str(&args);
        result.push_str(&body.to_string());
        debug!(line, head = %result.lines().next().unwrap_or(""), "converted function");
        let n = buf.splice_str(prev_semi..past_block, &result);
        Ok(prev_semi + n)
    }

    /// TypeScript only: for `(args): Type {`, the index of the `)`.
    fn return_type_close(&self, buf: &[char], brace: usize) -> Option<usize> {
        if self.dialect != Dialect::TypeScript {
            return None;
        }
        let start = line_start(buf, brace);
        (start..brace)
            .rev()
            .filter(|&p| buf[p] == ':')
            .find_map(|p| prev_non_ws_char(buf, p).filter(|&q| q >= start && buf[q] == ')'))
    }

    // ========================================================================
    // Function parts
    // ========================================================================

    /// Turn a function head into `def name`.
    ///
    /// Only the last word survives. The class context is reset to the
    /// enclosing class body; `Class::member` sets it for this function.
    /// `Class::Class` becomes `__init__` and `Class::~Class` `__del__`.
    pub fn massage_function_head(&mut self, head: &[char]) -> String {
        self.class_name = self.body_class.clone();
        let mut result = String::new();
        let mut i = 0;
        while i < head.len() {
            i = skip_ws_and_nl(head, i);
            let Some(&ch) = head.get(i) else {
                break;
            };
            if !(ch.is_alphabetic() || ch == '_' || ch == '~') {
                i += 1;
                continue;
            }
            let j = skip_past_word(head, i).max(i + 1);
            let word: String = head[i..j].iter().collect();
            i = skip_ws(head, j);
            if match_at(head, i, "::") {
                self.class_name = word.clone();
                i = skip_ws(head, i + 2);
                result.clear();
                if head.get(i).is_some_and(|&c| c == '~' || c.is_alphabetic() || c == '_') {
                    let j = skip_past_word(head, i).max(i + 1);
                    let member: String = head[i..j].iter().collect();
                    result = if member == word {
                        "__init__".to_string()
                    } else if member.strip_prefix('~') == Some(word.as_str()) {
                        "__del__".to_string()
                    } else {
                        member
                    };
                    i = j;
                }
            } else {
                result = word;
            }
        }
        if !self.class_name.is_empty() {
            if result == self.class_name {
                result = "__init__".to_string();
            } else if result.strip_prefix('~') == Some(self.class_name.as_str()) {
                result = "__del__".to_string();
            }
        }
        format!("def {}", result)
    }

    /// Reduce a parenthesized argument list to `(name,...):`.
    ///
    /// Keeps one identifier per argument: the last word in C (after type
    /// names), the first word in TypeScript (before `:`). Default values,
    /// annotations and nested brackets are dropped. `self,` is prepended
    /// when a class context is set.
    pub fn massage_function_args(&self, args: &[char], line: u32) -> ConvertResult<String> {
        if args.first() != Some(&'(') || args.last() != Some(&')') || args.len() < 2 {
            return Err(ConvertError::MalformedArguments {
                line,
                text: args.iter().collect(),
            });
        }
        let ts = self.dialect == Dialect::TypeScript;
        let end = args.len() - 1;
        let mut names: Vec<String> = Vec::new();
        let mut last_word: Option<String> = None;
        let mut skipping = false;
        let mut i = 1;
        while i < end {
            let ch = args[i];
            if is_string_or_comment(args, i) {
                i = skip_string_or_comment(args, i);
            } else if matches!(ch, '(' | '[' | '{') {
                i = skip_to_matching_bracket(args, i) + 1;
            } else if ch == '<' && ts {
                i = skip_angle_brackets(args, i, end);
            } else if ch == ',' {
                names.extend(last_word.take());
                skipping = false;
                i += 1;
            } else if ch == '=' || (ch == ':' && ts) {
                skipping = true;
                i += 1;
            } else if ch.is_alphabetic() || ch == '_' {
                let j = skip_past_word(args, i).max(i + 1);
                if !skipping {
                    let word: String = args[i..j].iter().collect();
                    if ts || !self.config.is_type_name(&word) {
                        last_word = Some(word);
                    }
                }
                i = j;
            } else {
                i += 1;
            }
        }
        names.extend(last_word);

        if !self.class_name.is_empty() {
            names.insert(0, "self".to_string());
        }
        Ok(format!("({}):", names.join(",")))
    }

    /// Dialect-specific body cleanup.
    pub fn massage_function_body(&self, body: &mut CharBuffer) {
        if self.dialect == Dialect::C {
            self.massage_ivars(body);
            self.remove_casts(body);
            self.remove_type_names(body);
        }
        dedent_blocks(body);
    }

    /// Prefix bare uses of the current class's instance variables with `self.`.
    pub fn massage_ivars(&self, body: &mut CharBuffer) {
        let ivars = self.config.ivars_for(&self.class_name);
        if ivars.is_empty() {
            return;
        }
        let mut i = 0;
        while i < body.len() {
            if is_string_or_comment(body, i) {
                i = skip_string_or_comment(body, i);
            } else if body[i].is_alphabetic() || body[i] == '_' {
                let j = skip_past_word(body, i).max(i + 1);
                let word: String = body[i..j].iter().collect();
                let member_access =
                    (i >= 1 && body[i - 1] == '.') || (i >= 2 && match_at(body, i - 2, "->"));
                if !member_access && ivars.contains(&word) {
                    let n = body.splice_str(i..j, &format!("self.{}", word));
                    i += n;
                } else {
                    i = j;
                }
            } else {
                i += 1;
            }
        }
    }

    /// Delete casts such as `(Foo *)` and `(int)`.
    pub fn remove_casts(&self, body: &mut CharBuffer) {
        let mut i = 0;
        while i < body.len() {
            if is_string_or_comment(body, i) {
                i = skip_string_or_comment(body, i);
            } else if body[i] == '(' {
                let start = i;
                let mut j = skip_ws(body, i + 1);
                if body.get(j).is_some_and(char::is_alphabetic) {
                    let k = skip_past_word(body, j);
                    let word: String = body[j..k].iter().collect();
                    if self.config.is_type_name(&word) {
                        j = skip_ws(body, k);
                        while match_at(body, j, "*") {
                            j += 1;
                        }
                        j = skip_ws(body, j);
                        if match_at(body, j, ")") {
                            trace!(cast = %body.text(start..j + 1), "removing cast");
                            body.remove_range(start..j + 1);
                            continue;
                        }
                    }
                }
                i = start + 1;
            } else {
                i += 1;
            }
        }
    }

    /// Delete declarations' type names (and their `*`s), except after `new`.
    pub fn remove_type_names(&self, body: &mut CharBuffer) {
        let mut i = 0;
        while i < body.len() {
            if is_string_or_comment(body, i) {
                i = skip_string_or_comment(body, i);
            } else if match_word(body, i, "new") {
                i = skip_ws(body, i + 3);
                if body.get(i).is_some_and(char::is_alphabetic) {
                    i = skip_past_word(body, i);
                }
            } else if body[i].is_alphabetic() || body[i] == '_' {
                let j = skip_past_word(body, i).max(i + 1);
                let word: String = body[i..j].iter().collect();
                if self.config.is_type_name(&word) {
                    let mut k = skip_ws(body, j);
                    while match_at(body, k, "*") {
                        k += 1;
                    }
                    k = skip_ws(body, k);
                    body.remove_range(i..k);
                } else {
                    i = j;
                }
            } else {
                i += 1;
            }
        }
    }

    // ========================================================================
    // Normalization
    // ========================================================================

    /// The passes every brace-to-indent conversion ends with, in order.
    ///
    /// `cosmetic` runs after whitespace collapsing but before comment
    /// translation, while comments are still opaque to `safe_replace`.
    pub fn normalize(&self, buf: &mut CharBuffer, cosmetic: &[(&str, &str)]) {
        insert_not(buf);
        remove_semicolons_at_end_of_lines(buf);
        remove_blank_lines(buf);
        remove_excess_ws(buf);
        safe_replace_all(buf, cosmetic);
        replace_comments(buf, self.config.tab_width);
        remove_trailing_ws(buf);
        replace_all(buf, "\t ", "\t");
    }
}

// ============================================================================
// Free helpers
// ============================================================================

/// Skip a `<...>` type-argument list. Returns the index past the `>`.
fn skip_angle_brackets(s: &[char], i: usize, end: usize) -> usize {
    let mut depth = 0usize;
    let mut i = i;
    while i < end {
        match s[i] {
            '<' => depth += 1,
            '>' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    end
}

/// The class named by `class Name ... {` between `start` and `brace`.
fn class_header_name(buf: &[char], start: usize, brace: usize) -> Option<String> {
    let header: String = buf[start.min(brace)..brace].iter().collect();
    let mut words = header
        .split_whitespace()
        .skip_while(|w| CLASS_MODIFIERS.contains(w));
    if words.next()? != "class" {
        return None;
    }
    let name: String = words.next()?.chars().take_while(|&c| is_word_char(c)).collect();
    (!name.is_empty()).then_some(name)
}

/// Rewrite bare nested blocks (a `{` right after `{`, `}` or `;`).
///
/// The braces become marker comments and the block's interior lines lose
/// up to four spaces of indentation, so the block does not add a Python
/// indentation level.
pub fn dedent_blocks(body: &mut CharBuffer) {
    let mut i = 0;
    while i < body.len() {
        if is_string_or_comment(body, i) {
            i = skip_string_or_comment(body, i);
            continue;
        }
        if !matches!(body[i], '{' | '}' | ';') {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        loop {
            let k = j;
            j = skip_ws_and_nl(body, j);
            if is_string_or_comment(body, j) {
                j = skip_string_or_comment(body, j);
            }
            if k == j {
                break;
            }
        }
        if body.get(j) != Some('{') {
            i += 1;
            continue;
        }

        let open = j;
        let close = skip_to_matching_bracket(body, open);
        let n = body.splice_str(open..open + 1, START_DEDENTED_BLOCK);
        let mut close = close + n - 1;
        let mut k = open + n;
        while k < close.min(body.len()) {
            if body[k] == '\n' {
                let mut m = 0;
                while m < 4 && body.get(k + 1 + m) == Some(' ') {
                    m += 1;
                }
                body.remove_range(k + 1..k + 1 + m);
                close -= m;
            }
            k += 1;
        }
        if body.get(close) == Some('}') {
            body.splice_str(close..close + 1, END_DEDENTED_BLOCK);
        }
        i = open + n;
    }
}

/// Rewrite the condition of every `if`, `elif`, `while` and `for`.
pub fn handle_all_keywords(buf: &mut CharBuffer) {
    let mut i = 0;
    while i < buf.len() {
        if is_string_or_comment(buf, i) {
            i = skip_string_or_comment(buf, i);
        } else if is_word_char(buf[i]) {
            match STATEMENT_KEYWORDS.iter().find(|kw| match_word(buf, i, kw)) {
                Some(kw) => i = handle_keyword(buf, i, kw).max(i + 1),
                None => i = skip_past_word(buf, i).max(i + 1),
            }
        } else {
            i += 1;
        }
    }
}

/// Convert `kw (cond)` at `i` into `kw cond:`.
///
/// A space is inserted after the keyword if missing. Single-line
/// conditions lose their parentheses; multi-line ones keep them. Returns
/// the index just past the inserted `:`, or past the keyword when no
/// parenthesized condition follows.
pub fn handle_keyword(buf: &mut CharBuffer, i: usize, kw: &str) -> usize {
    let mut i = i + kw.chars().count();
    let k = i;
    i = skip_ws(buf, i);
    if k == i && i < buf.len() {
        i += buf.insert_str(i, " ");
    }
    if buf.get(i) != Some('(') {
        return i;
    }
    let j = skip_to_matching_bracket(buf, i);
    if j >= buf.len() {
        return i + 1;
    }
    let end = if buf[i..j].contains(&'\n') {
        j + 1
    } else {
        remove_matching_brackets(buf, i)
    };
    end + buf.insert_str(end, ":")
}
