//! C and C++ to Python.

use recurl_core::buffer::CharBuffer;
use recurl_core::config::ConverterConfig;
use recurl_core::error::ConvertResult;
use recurl_core::rewrite::{replace_all, safe_replace_all};

use super::engine::{handle_all_keywords, Dialect, Engine};
use crate::Converter;

/// Token translations applied after function headers are rewritten.
const TOKENS: &[(&str, &str)] = &[
    ("ASSERT", "assert"),
    (" -> ", "."),
    ("->", "."),
    (" . ", "."),
    ("this.self", "self"),
    ("{", ""),
    ("} ", ""),
    ("}", ""),
    ("#if", "if"),
    ("#else", "else"),
    ("#endif", ""),
    ("else if", "elif"),
    ("else", "else:"),
    ("&&", " and "),
    ("||", " or "),
    ("TRUE", "True"),
    ("FALSE", "False"),
    ("NULL", "None"),
    ("this", "self"),
    ("try", "try:"),
    ("catch", "except:"),
];

// Spaces after `,` and outside parentheses are kept.
const COSMETIC: &[(&str, &str)] = &[
    (" :", ":"),
    (" ,", ","),
    ("( ", "("),
    (" )", ")"),
    ("@language c\n", "@language python\n"),
];

/// Converts C and C++ source to Python.
///
/// Uses `class_list`, `type_list` and `ivars` from the configuration.
#[derive(Debug, Clone)]
pub struct CToPython {
    engine: Engine,
}

impl CToPython {
    pub fn new(config: ConverterConfig) -> Self {
        CToPython {
            engine: Engine::new(Dialect::C, config),
        }
    }
}

impl Converter for CToPython {
    fn name(&self) -> &'static str {
        "c-to-python"
    }

    fn convert(&mut self, text: &str) -> ConvertResult<String> {
        let mut buf = CharBuffer::from(text);
        replace_all(&mut buf, "\r", "");
        self.engine.munge_all_functions(&mut buf)?;
        safe_replace_all(&mut buf, TOKENS);
        handle_all_keywords(&mut buf);
        self.engine.normalize(&mut buf, COSMETIC);
        Ok(buf.to_string())
    }
}
