//! Lexical converters between brace and indentation syntaxes.
//!
//! Every converter implements [`Converter`]: it takes the text of one unit
//! and returns rewritten text. Converters never build a syntax tree; they
//! scan characters (brace-to-indent) or classify lines with regular
//! expressions (indent-to-brace). Output is best effort and meant to be
//! finished by hand.
//!
//! - [`to_python`]: C/C++ and TypeScript to Python
//! - [`to_typescript`]: Python to TypeScript
//! - [`annotate`]: type annotations for Python function headers
//! - [`registry`]: lookup by name

use recurl_core::error::ConvertResult;

pub mod annotate;
pub mod registry;
pub mod to_python;
pub mod to_typescript;

/// A source-to-source converter for one unit of text.
///
/// Converters may keep state across units of the same run (the class
/// context of the C converter, for example); a fresh instance starts a
/// fresh run.
pub trait Converter {
    /// Registry name, e.g. `c-to-python`.
    fn name(&self) -> &'static str;

    /// Convert one unit. Unrecognized constructs are passed through; an
    /// error means the unit could not be converted at all.
    fn convert(&mut self, text: &str) -> ConvertResult<String>;

    /// Rewrite a unit's headline after its body converted.
    fn convert_headline(&self, headline: &str) -> String {
        headline.to_string()
    }
}
