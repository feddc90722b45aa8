//! Python to TypeScript.
//!
//! Conversion works line by line. Each line is classified by the first
//! matching entry of an ordered pattern table ([`handlers::PATTERNS`]); its
//! handler rewrites the line, inserts the closing `}` where the
//! indentation returns, and reports the index of the next line to scan.
//! Lines no pattern claims get operator translation and, when they end a
//! statement, a `;`. Constructs that span lines (docstring placement,
//! f-strings, ternaries, `const`) are finished by [`post_pass`].

use recurl_core::buffer::LineBuffer;
use recurl_core::config::ConverterConfig;
use recurl_core::error::{ConvertError, ConvertResult};
use recurl_core::scan::is_section_ref;
use recurl_core::text::leading_ws;
use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

use crate::Converter;

pub mod handlers;
pub mod post_pass;

/// Appended to lines that must not receive a `;`. Removed by the post-pass.
pub const KILL_SEMICOLON: &str = "  // **kill-semicolon**";

static OPERATORS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        ("True", "true"),
        ("False", "false"),
        ("default", "default_val"),
        ("and", "&&"),
        ("or", "||"),
        ("is not", "!="),
        ("is", "=="),
        ("not", "!"),
        ("assert", "// assert"),
    ]
    .into_iter()
    .map(|(word, repl)| (Regex::new(&format!(r"\b{}\b", word)).unwrap(), repl))
    .collect()
});

static SELF_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bself\b").unwrap());
static CMD_DECORATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^@cmd(.*?)$").unwrap());

const CODING_LINE: &str = "@first # -*- coding: utf-8 -*-\n";

/// Converts Python source to TypeScript.
#[derive(Debug, Clone)]
pub struct PythonToTypescript {
    config: ConverterConfig,
}

impl PythonToTypescript {
    pub fn new(config: ConverterConfig) -> Self {
        PythonToTypescript { config }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Whole-text rewrites that must happen before lines are classified.
    ///
    /// `self` becomes `this` everywhere. `@cmd` decorators are commented
    /// out. When a self alias is configured, `alias.` and `alias,` become
    /// `this.`/`this,` and the lines that bind the alias are removed.
    pub fn pre_pass(&self, text: &str) -> ConvertResult<String> {
        let s = text.replace(CODING_LINE, "");
        let s = SELF_WORD.replace_all(&s, "this");
        let mut s = CMD_DECORATOR.replace_all(&s, "// @cmd$1").into_owned();

        if let Some(alias) = self.config.self_alias.as_deref().filter(|a| !a.is_empty()) {
            let a = regex::escape(alias);
            let rewrites = [
                (format!(r"\b{a}\."), "this."),
                (format!(r"(?m)^[ \t]*{a}\s*=\s*this[ \t]*\n"), ""),
                (format!(r"(?m)^([ \t]*){a}\s*,\s*c\s*=\s*this,\s*this\.c[ \t]*\n"), "${1}c = this.c\n"),
                (format!(r"(?m)^([ \t]*){a}\s*,\s*p\s*=\s*this,\s*this\.p[ \t]*\n"), "${1}p = this.p\n"),
                (format!(r"\b{a},"), "this,"),
            ];
            for (pattern, repl) in rewrites {
                let re = Regex::new(&pattern).map_err(|e| ConvertError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
                s = re.replace_all(&s, repl).into_owned();
            }
        }
        Ok(s)
    }

    /// Convert already pre-passed lines in place.
    pub fn convert_lines(&self, lines: &mut LineBuffer) {
        let mut i = 0;
        while i < lines.len() {
            let line = lines.line(i).to_string();
            let next = match handlers::classify(&line) {
                Some((kind, caps)) => {
                    trace!(line = i + 1, ?kind, "matched");
                    self.dispatch(kind, &caps, i, lines)
                }
                None => None,
            };
            i = match next {
                Some(next) => next,
                None => {
                    do_operators(lines, i);
                    do_semicolon(lines, i);
                    i + 1
                }
            };
            debug_assert!(i > 0);
        }
    }
}

impl Converter for PythonToTypescript {
    fn name(&self) -> &'static str {
        "python-to-typescript"
    }

    fn convert(&mut self, text: &str) -> ConvertResult<String> {
        let text = self.pre_pass(text)?;
        let mut lines = LineBuffer::from_text(&text);
        self.convert_lines(&mut lines);
        Ok(post_pass::post_pass(lines))
    }

    /// `__init__` nodes become `constructor`; `.py` files become `.ts`.
    fn convert_headline(&self, headline: &str) -> String {
        let headline = headline.replace("__init__", "constructor");
        let is_file = headline.starts_with("@file ") || headline.starts_with("@@file ");
        match headline.strip_suffix(".py") {
            Some(stem) if is_file => format!("{}.ts", stem),
            _ => headline,
        }
    }
}

// ============================================================================
// Line helpers
// ============================================================================

/// The text of a line without its `\n`.
pub(crate) fn content(line: &str) -> &str {
    line.strip_suffix('\n').unwrap_or(line)
}

/// Index of the line that closes the block opened at line `i`.
///
/// That is the first later non-blank line indented no deeper than `lws`.
/// When the line before it is blank the boundary moves up one line so the
/// `}` does not follow an empty line.
pub fn find_indented_block(lines: &[String], i: usize, lws: &str) -> usize {
    let width = lws.len();
    let mut j = i + 1;
    while j < lines.len() {
        let line = &lines[j];
        if !line.trim().is_empty() && leading_ws(line).len() <= width {
            if j > i + 1 && lines[j - 1].trim().is_empty() {
                j -= 1;
            }
            break;
        }
        j += 1;
    }
    j
}

/// Mark `lines[i..j]` so that [`do_semicolon`] leaves them alone.
pub fn kill_semicolons(lines: &mut LineBuffer, i: usize, j: usize) {
    for n in i..j.min(lines.len()) {
        let marked = format!("{}{}\n", lines.line(n).trim_end(), KILL_SEMICOLON);
        lines.set(n, marked);
    }
}

/// Translate Python operators and literals in `s`.
pub fn translate_operators(s: &str) -> String {
    let mut s = s.to_string();
    for (re, repl) in OPERATORS.iter() {
        if re.is_match(&s) {
            s = re.replace_all(&s, *repl).into_owned();
        }
    }
    s
}

/// Translate Python operators and literals on line `i`.
pub fn do_operators(lines: &mut LineBuffer, i: usize) {
    let line = translate_operators(lines.line(i));
    lines.set(i, line);
}

/// End line `i` with `;` when it ends a statement.
pub fn do_semicolon(lines: &mut LineBuffer, i: usize) {
    let line = content(lines.line(i));
    if let Some(stripped) = line.strip_suffix(KILL_SEMICOLON) {
        let stripped = format!("{}\n", stripped);
        lines.set(i, stripped);
        return;
    }
    if ends_statement(lines, i) {
        let line = format!("{};\n", line.trim_end());
        lines.set(i, line);
    }
}

/// True when line `i` ends a statement and should end with `;`.
///
/// A heuristic: blank lines, directives (`@...`), section references,
/// lines already ending in `;` or in an opener, operator, comma or
/// backtick, lines followed by a continuation line and `}` lines are not
/// statement ends.
pub fn ends_statement(lines: &[String], i: usize) -> bool {
    let s = lines[i].trim();
    let next = lines.get(i + 1).map(|l| l.trim_start()).unwrap_or("");
    if s.is_empty() || s.starts_with('@') || is_section_ref(s) {
        return false;
    }
    const OPEN_ENDINGS: &[&str] = &["{", "(", "[", ":", "||", "&&", "!", ",", "`", ";", "\\"];
    if OPEN_ENDINGS.iter().any(|e| s.ends_with(e)) {
        return false;
    }
    const CONTINUATIONS: &[&str] = &["(", "[", "&&", "||", "!", "."];
    if CONTINUATIONS.iter().any(|c| next.starts_with(c)) && !next.starts_with("!=") {
        return false;
    }
    !s.starts_with('}')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(src: &str) -> String {
        PythonToTypescript::new(ConverterConfig::default())
            .convert(src)
            .unwrap()
    }

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    mod blocks {
        use super::*;

        #[test]
        fn block_ends_at_first_shallower_line() {
            let l = lines(&["if a:\n", "    b\n", "    c\n", "d\n"]);
            assert_eq!(find_indented_block(&l, 0, ""), 3);
        }

        #[test]
        fn blank_lines_inside_block_do_not_close_it() {
            let l = lines(&["if a:\n", "    b\n", "\n", "    c\n", "d\n"]);
            assert_eq!(find_indented_block(&l, 0, ""), 4);
        }

        #[test]
        fn boundary_moves_above_trailing_blank() {
            let l = lines(&["if a:\n", "    b\n", "\n", "d\n"]);
            assert_eq!(find_indented_block(&l, 0, ""), 2);
        }

        #[test]
        fn unterminated_block_runs_to_end() {
            let l = lines(&["    if a:\n", "        b\n"]);
            assert_eq!(find_indented_block(&l, 0, "    "), 2);
        }
    }

    mod statements {
        use super::*;

        #[test]
        fn openers_and_operators_do_not_end_statements() {
            for s in ["f(\n", "x = [\n", "if x:\n", "a ||\n", "a,\n", "}\n", "@language python\n", "x = 1;\n"] {
                let l = lines(&[s, "y\n"]);
                assert!(!ends_statement(&l, 0), "{s:?}");
            }
        }

        #[test]
        fn continuation_on_next_line() {
            let l = lines(&["x = a\n", "    && b\n"]);
            assert!(!ends_statement(&l, 0));
            let l = lines(&["x = a\n", "y != b\n"]);
            assert!(ends_statement(&l, 0));
        }

        #[test]
        fn section_refs_are_not_statements() {
            let l = lines(&["<< imports >>\n"]);
            assert!(!ends_statement(&l, 0));
        }

        #[test]
        fn semicolons_are_not_inflated() {
            let mut buf = LineBuffer::from_text("x = 1\n");
            do_semicolon(&mut buf, 0);
            do_semicolon(&mut buf, 0);
            assert_eq!(buf.line(0), "x = 1;\n");
        }

        #[test]
        fn killed_lines_get_no_semicolon() {
            let mut buf = LineBuffer::from_text("a and\nb\n");
            kill_semicolons(&mut buf, 0, 1);
            do_semicolon(&mut buf, 0);
            assert_eq!(buf.line(0), "a and\n");
        }
    }

    #[test]
    fn operators_on_word_boundaries() {
        let mut buf = LineBuffer::from_text("x = not a and b is not None or isinstance(y, Z)\n");
        do_operators(&mut buf, 0);
        assert_eq!(buf.line(0), "x = ! a && b != None || isinstance(y, Z)\n");
    }

    mod pre_pass {
        use super::*;

        #[test]
        fn self_and_decorators() {
            let p = PythonToTypescript::new(ConverterConfig::default());
            let out = p.pre_pass("@cmd('go')\ndef go(self, myself):\n    self.x = 1\n").unwrap();
            assert_eq!(out, "// @cmd('go')\ndef go(this, myself):\n    this.x = 1\n");
        }

        #[test]
        fn alias_rewritten() {
            let config = ConverterConfig {
                self_alias: Some("at".to_string()),
                ..ConverterConfig::default()
            };
            let p = PythonToTypescript::new(config);
            let out = p
                .pre_pass("    at = self\n    at, c = self, self.c\n    at.run(at, that)\n")
                .unwrap();
            assert_eq!(out, "    c = this.c\n    this.run(this, that)\n");
        }
    }

    mod scenarios {
        use super::*;

        #[test]
        fn if_block_gets_braces() {
            let out = convert("if (x > 0):\n    y = 1\nz = 2\n");
            assert_eq!(out, "if (x > 0) {\n    const y = 1;\n}\nconst z = 2;\n");
        }

        #[test]
        fn constructor() {
            let out = convert("def __init__(self, x=None):\n    self.x = x\n");
            assert_eq!(out, "public constructor(x=null) {\n    this.x = x;\n}\n");
        }

        #[test]
        fn method_with_docstring() {
            let src = "class Foo(Base):\n    def run(self, n):\n        \"\"\"Run it.\"\"\"\n        return n\n";
            let out = convert(src);
            assert_eq!(
                out,
                "class Foo extends Base {\n    /**\n     * Run it.\n     */\n    public run(n): void {\n        return n;\n    }\n}\n"
            );
        }

        #[test]
        fn multi_line_condition() {
            let src = "if (\n    a and\n    b\n):\n    go()\n";
            let out = convert(src);
            assert_eq!(out, "if (\n    a &&\n    b\n) {\n    go();\n}\n");
        }

        #[test]
        fn headline() {
            let p = PythonToTypescript::new(ConverterConfig::default());
            assert_eq!(p.convert_headline("@file leo/core.py"), "@file leo/core.ts");
            assert_eq!(p.convert_headline("Foo.__init__"), "Foo.constructor");
            assert_eq!(p.convert_headline("notes.py"), "notes.py");
        }
    }
}
