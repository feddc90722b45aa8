//! Type annotations for Python function headers.
//!
//! Every `def` header gets an annotation for each argument that lacks
//! one and a return annotation when it has none. No type analysis is
//! attempted: argument types come from the configured type map by name,
//! keyword defaults get the kind of their initial value, and everything
//! else is `Any`. `__init__` returns `None`.

use std::sync::LazyLock;

use recurl_core::config::ConverterConfig;
use recurl_core::error::{ConvertError, ConvertResult};
use regex::Regex;
use tracing::debug;

use crate::Converter;

static DEF_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)def[ \t]+(\w+)\s*\(").unwrap());
static RETURN_TAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\A([^:]*):([^\n]*)\n").unwrap());
static ARG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\A(\s*[*\w]+\s*)([:,=])?").unwrap());
static ARG_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\A(\s*#[^\n]*\n)").unwrap());

static BOOL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(True|False)").unwrap());
static FLOAT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]*\.[0-9]*").unwrap());
static INT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+").unwrap());
static STRING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"^['"].*['"]"#).unwrap());

/// Adds annotations to Python function and method headers.
#[derive(Debug, Clone)]
pub struct AddAnnotations {
    config: ConverterConfig,
}

impl AddAnnotations {
    pub fn new(config: ConverterConfig) -> Self {
        AddAnnotations { config }
    }

    /// Rewrite every `def` header in `text`.
    pub fn annotate(&self, text: &str) -> ConvertResult<String> {
        let added_newline = !text.ends_with('\n');
        let owned;
        let text = if added_newline {
            owned = format!("{}\n", text);
            owned.as_str()
        } else {
            text
        };

        let mut out = String::with_capacity(text.len() + text.len() / 8);
        let mut pos = 0;
        while let Some(caps) = DEF_HEAD.captures_at(text, pos) {
            let Some(head) = caps.get(0) else {
                break;
            };
            let (lws, name) = (&caps[1], &caps[2]);
            let Some(close) = find_close_paren(text, head.end()) else {
                let line = text[head.start()..].lines().next().unwrap_or("");
                return Err(ConvertError::UnbalancedArgument {
                    text: line.trim().to_string(),
                });
            };
            let Some(tail) = RETURN_TAIL.captures(&text[close + 1..]) else {
                out.push_str(&text[pos..head.end()]);
                pos = head.end();
                continue;
            };

            let args = self.do_args(&text[head.end()..close])?;
            let return_val = if tail[1].trim().is_empty() {
                if name == "__init__" { " -> None" } else { " -> Any" }
            } else {
                &tail[1]
            };
            let comment = if tail[2].trim().is_empty() { "" } else { &tail[2] };

            out.push_str(&text[pos..head.start()]);
            out.push_str(&format!("{}def {}({}){}:{}\n", lws, name, args, return_val, comment));
            pos = close + 1 + tail[0].len();
        }
        out.push_str(&text[pos..]);

        if added_newline {
            out.pop();
        }
        Ok(out)
    }

    /// Annotate one argument list (the text between the parentheses).
    ///
    /// Multi-line lists are re-emitted one argument per line, keeping each
    /// argument's trailing comment.
    pub fn do_args(&self, args: &str) -> ConvertResult<String> {
        let multiline = args.trim().contains('\n');
        let comma = if multiline { ",\n" } else { ", " };
        let lws = if multiline { "    " } else { "" };
        let mut result: Vec<String> = Vec::new();
        let mut i = 0;
        while i < args.len() {
            let rest = &args[i..];
            if rest.trim().is_empty() {
                break;
            }
            if multiline && !result.is_empty() {
                if let Some(m) = ARG_COMMENT.find(rest) {
                    i += m.len();
                    if let Some(last) = result.pop() {
                        result.push(format!("{}  {}\n", last.trim_end(), m.as_str().trim()));
                    }
                    continue;
                }
            }
            let Some(m) = ARG.captures(rest) else {
                debug!(args, "unrecognized argument list");
                return Ok(args.to_string());
            };
            let name = m[1].trim();
            i += m[1].len();
            match m.get(2).map(|t| t.as_str()) {
                _ if name == "self" => {
                    result.push(format!("{}{}{}", lws, name, comma));
                    if args[i..].starts_with(',') {
                        i += 1;
                    }
                }
                Some(":") => {
                    let (annotation, next) = find_arg(args, i)?;
                    result.push(format!("{}{}: {}{}", lws, name, annotation, comma));
                    i = next;
                }
                Some("=") => {
                    let (value, next) = find_arg(args, i)?;
                    result.push(format!("{}{}: {}={}{}", lws, name, kind(&value), value, comma));
                    i = next;
                }
                sep => {
                    let ty = self.config.types.get(name).map_or("Any", String::as_str);
                    result.push(format!("{}{}: {}{}", lws, name, ty, comma));
                    if sep == Some(",") {
                        i += 1;
                    }
                }
            }
        }

        let s = result.concat();
        Ok(if multiline {
            format!("\n{}", s)
        } else {
            s.strip_suffix(", ").unwrap_or(&s).to_string()
        })
    }
}

impl Converter for AddAnnotations {
    fn name(&self) -> &'static str {
        "add-annotations"
    }

    fn convert(&mut self, text: &str) -> ConvertResult<String> {
        self.annotate(text)
    }
}

/// Index of the `)` closing the argument list that starts at `start`.
///
/// Strings and `#` comments are skipped. `None` when the list is not
/// closed by a `)`.
fn find_close_paren(text: &str, start: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut iter = text[start..].char_indices();
    while let Some((off, ch)) = iter.next() {
        let pos = start + off;
        match ch {
            '\'' | '"' => {
                let end = skip_python_string(text, pos);
                while iter.offset() + start < end {
                    if iter.next().is_none() {
                        break;
                    }
                }
            }
            '#' => {
                for (_, c) in iter.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return (ch == ')').then_some(pos);
                }
            }
            _ => {}
        }
    }
    None
}

/// Index just past the string literal starting at `i`.
fn skip_python_string(s: &str, i: usize) -> usize {
    let rest = &s[i..];
    let delim: String = if rest.starts_with("\"\"\"") || rest.starts_with("'''") {
        rest[..3].to_string()
    } else {
        rest[..1].to_string()
    };
    let mut j = i + delim.len();
    while j < s.len() {
        if s[j..].starts_with('\\') {
            j += 1 + s[j + 1..].chars().next().map_or(0, char::len_utf8);
        } else if s[j..].starts_with(delim.as_str()) {
            return j + delim.len();
        } else {
            j += s[j..].chars().next().map_or(1, char::len_utf8);
        }
    }
    s.len()
}

/// Scan an annotation or default value starting at the `:` or `=` at `i`.
///
/// Returns the value and the index past its terminating comma.
fn find_arg(s: &str, i: usize) -> ConvertResult<(String, usize)> {
    let mut i = i + 1;
    while s[i..].starts_with(' ') {
        i += 1;
    }
    let start = i;
    let mut level = 0i32;
    while i < s.len() {
        let Some(ch) = s[i..].chars().next() else {
            break;
        };
        match ch {
            '\'' | '"' => {
                i = skip_python_string(s, i);
                continue;
            }
            '(' | '[' | '{' => level += 1,
            ')' | ']' | '}' => level -= 1,
            ',' if level == 0 => {
                i += 1;
                break;
            }
            _ => {}
        }
        i += ch.len_utf8();
    }
    let value = s[start..i].trim();
    if level != 0 {
        return Err(ConvertError::UnbalancedArgument {
            text: value.to_string(),
        });
    }
    let value = value.strip_suffix(',').unwrap_or(value).trim();
    Ok((value.to_string(), i))
}

/// The kind of a default value.
pub fn kind(value: &str) -> &'static str {
    if BOOL.is_match(value) {
        "bool"
    } else if FLOAT.is_match(value) {
        "float"
    } else if INT.is_match(value) {
        "int"
    } else if STRING.is_match(value) {
        "str"
    } else {
        "Any"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotate(src: &str) -> String {
        AddAnnotations::new(ConverterConfig::default())
            .annotate(src)
            .unwrap()
    }

    #[test]
    fn defaults_get_their_kind() {
        assert_eq!(
            annotate("def f(a, b=1, c='x', d=None, e=True, g=1.5):\n    pass\n"),
            "def f(a: Any, b: int=1, c: str='x', d: Any=None, e: bool=True, g: float=1.5) -> Any:\n    pass\n"
        );
    }

    #[test]
    fn configured_types_and_init() {
        let mut config = ConverterConfig::default();
        config.types.insert("c".to_string(), "Cmdr".to_string());
        let conv = AddAnnotations::new(config);
        assert_eq!(
            conv.annotate("    def run(self, c, event=None):\n").unwrap(),
            "    def run(self, c: Cmdr, event: Any=None) -> Any:\n"
        );
        assert_eq!(
            conv.annotate("    def __init__(self):\n").unwrap(),
            "    def __init__(self) -> None:\n"
        );
    }

    #[test]
    fn annotated_headers_unchanged() {
        let src = "def f(a: int, b: str = 'x') -> int:\n    return a\n";
        assert_eq!(annotate(src), src);
    }

    #[test]
    fn nested_defaults() {
        assert_eq!(
            annotate("def f(x=g(1, 2), y=[]):\n"),
            "def f(x: Any=g(1, 2), y: Any=[]) -> Any:\n"
        );
    }

    #[test]
    fn multi_line_arguments_keep_comments() {
        let src = "def f(\n    a,  # first\n    b=1,\n):\n    pass\n";
        assert_eq!(
            annotate(src),
            "def f(\n    a: Any,  # first\n    b: int=1,\n) -> Any:\n    pass\n"
        );
    }

    #[test]
    fn trailing_comment_kept() {
        assert_eq!(annotate("def f():  # note\n"), "def f() -> Any:  # note\n");
    }

    #[test]
    fn missing_final_newline() {
        assert_eq!(annotate("def f(a):"), "def f(a: Any) -> Any:");
    }

    #[test]
    fn unclosed_argument_list_fails() {
        let err = AddAnnotations::new(ConverterConfig::default())
            .annotate("def f(x=(1, 2):\n    pass\n")
            .unwrap_err();
        assert!(matches!(err, ConvertError::UnbalancedArgument { .. }));
    }

    #[test]
    fn text_without_defs_unchanged() {
        assert_eq!(annotate("x = 1\nundef(y)\n"), "x = 1\nundef(y)\n");
    }

    #[test]
    fn kinds() {
        assert_eq!(kind("False"), "bool");
        assert_eq!(kind(".5"), "float");
        assert_eq!(kind("42"), "int");
        assert_eq!(kind("\"s\""), "str");
        assert_eq!(kind("None"), "Any");
        assert_eq!(kind("x"), "Any");
    }
}
