//! TypeScript and JavaScript to Python.

use recurl_core::buffer::CharBuffer;
use recurl_core::config::ConverterConfig;
use recurl_core::error::ConvertResult;
use recurl_core::rewrite::{replace_all, safe_replace_all};
use recurl_core::scan::{
    is_string_or_comment, is_word_char, match_word, skip_line, skip_past_word,
    skip_string_or_comment, skip_ws,
};

use super::engine::{handle_all_keywords, Dialect, Engine};
use crate::Converter;

const TOKENS: &[(&str, &str)] = &[
    (" -> ", "."),
    ("->", "."),
    (" . ", "."),
    ("{", ""),
    ("} ", ""),
    ("}", ""),
    ("===", "=="),
    ("!==", "!="),
    ("else if", "elif"),
    ("else", "else:"),
    ("&&", " and "),
    ("||", " or "),
    ("true", "True"),
    ("false", "False"),
    ("null", "None"),
    ("this", "self"),
    ("try", "try:"),
    ("catch", "except:"),
    ("constructor", "__init__"),
    ("new ", ""),
];

// Same spacing rules as the C table.
const COSMETIC: &[(&str, &str)] = &[
    (" :", ":"),
    (" ,", ","),
    ("( ", "("),
    (" )", ")"),
    ("@language javascript\n", "@language python\n"),
    ("@language typescript\n", "@language python\n"),
];

const SCOPE_WORDS: &[&str] = &["export", "private", "protected", "public"];

/// Converts TypeScript (and plain JavaScript) source to Python.
#[derive(Debug, Clone)]
pub struct TypescriptToPython {
    engine: Engine,
}

impl TypescriptToPython {
    pub fn new(config: ConverterConfig) -> Self {
        TypescriptToPython {
            engine: Engine::new(Dialect::TypeScript, config),
        }
    }
}

impl Converter for TypescriptToPython {
    fn name(&self) -> &'static str {
        "ts-to-python"
    }

    fn convert(&mut self, text: &str) -> ConvertResult<String> {
        let mut buf = CharBuffer::from(text);
        replace_all(&mut buf, "\r", "");
        self.engine.munge_all_functions(&mut buf)?;
        munge_all_classes(&mut buf);
        safe_replace_all(&mut buf, TOKENS);
        handle_all_keywords(&mut buf);
        comment_scope_ids(&mut buf);
        self.engine.normalize(&mut buf, COSMETIC);
        Ok(buf.to_string())
    }
}

/// Rewrite `class` and `interface` header lines.
///
/// `class A extends B {` becomes `class A(B): {` and `interface I {`
/// becomes `class I: # interface {`; the braces are removed later.
pub fn munge_all_classes(buf: &mut CharBuffer) {
    let mut i = 0;
    while i < buf.len() {
        if is_string_or_comment(buf, i) {
            i = skip_string_or_comment(buf, i);
        } else if match_word(buf, i, "class") {
            i = rewrite_class_line(buf, i, false);
        } else if match_word(buf, i, "interface") {
            i = rewrite_class_line(buf, i, true);
        } else if is_word_char(buf[i]) {
            i = skip_past_word(buf, i).max(i + 1);
        } else {
            i += 1;
        }
    }
}

fn rewrite_class_line(buf: &mut CharBuffer, i: usize, interface: bool) -> usize {
    let end = skip_line(buf, i);
    let line = buf.text(i..end);
    let (header, tail) = match line.find('{') {
        Some(p) => line.split_at(p),
        None => (line.as_str(), ""),
    };

    let ident = |w: &str| -> String { w.chars().take_while(|&c| is_word_char(c)).collect() };
    let mut words = header.split_whitespace().skip(1);
    let name = words.next().map(ident).unwrap_or_default();
    if name.is_empty() {
        return end.max(i + 1);
    }
    let base = match words.next() {
        Some("extends") => words.next().map(ident).filter(|b| !b.is_empty()),
        _ => None,
    };

    let mut new_line = match (interface, base) {
        (true, _) => format!("class {}: # interface", name),
        (false, Some(base)) => format!("class {}({}):", name, base),
        (false, None) => format!("class {}:", name),
    };
    if !tail.is_empty() {
        new_line.push(' ');
        new_line.push_str(tail);
    }
    i + buf.splice_str(i..end, &new_line)
}

/// Delete `public`, `private`, `protected` and `export` at the start of lines.
pub fn comment_scope_ids(buf: &mut CharBuffer) {
    let mut i = skip_ws(buf, 0);
    strip_scope_word(buf, i);
    while i < buf.len() {
        if is_string_or_comment(buf, i) {
            i = skip_string_or_comment(buf, i);
        } else if buf[i] == '\n' {
            i = skip_ws(buf, i + 1);
            strip_scope_word(buf, i);
        } else {
            i += 1;
        }
    }
}

fn strip_scope_word(buf: &mut CharBuffer, i: usize) {
    if let Some(word) = SCOPE_WORDS.iter().find(|w| match_word(buf, i, w)) {
        let j = skip_ws(buf, i + word.len());
        buf.remove_range(i..j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(src: &str) -> String {
        TypescriptToPython::new(ConverterConfig::default())
            .convert(src)
            .unwrap()
    }

    fn run(f: impl Fn(&mut CharBuffer), s: &str) -> String {
        let mut buf = CharBuffer::from(s);
        f(&mut buf);
        buf.to_string()
    }

    #[test]
    fn class_lines() {
        assert_eq!(
            run(munge_all_classes, "class A extends B {\n"),
            "class A(B): {\n"
        );
        assert_eq!(run(munge_all_classes, "export class A {\n"), "export class A: {\n");
        assert_eq!(
            run(munge_all_classes, "interface I {\n"),
            "class I: # interface {\n"
        );
        assert_eq!(
            run(munge_all_classes, "x = 'class A';\n"),
            "x = 'class A';\n"
        );
    }

    #[test]
    fn scope_words_removed_at_line_start() {
        let out = run(comment_scope_ids, "export x = 1\n    private y\nz = public\n");
        assert_eq!(out, "x = 1\n    y\nz = public\n");
    }

    #[test]
    fn class_with_methods() {
        let src = "class Foo extends Bar {\n    constructor(a: number) {\n        this.a = a;\n    }\n    public get(): number {\n        return this.a;\n    }\n}\n";
        let out = convert(src);
        assert_eq!(
            out,
            "class Foo(Bar):\n    def __init__(self,a):\n        self.a = a\n    def get(self):\n        return self.a\n"
        );
    }

    #[test]
    fn literals_and_operators() {
        let src = "function ok(x) {\n    if (x === null || !x.ready) {\n        return false;\n    }\n    return new Thing(true);\n}\n";
        let out = convert(src);
        assert_eq!(
            out,
            "def ok(x):\n    if x == None or not x.ready:\n        return False\n    return Thing(True)\n"
        );
    }
}
