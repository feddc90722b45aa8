//! recurl: lexical transcoders between brace and indentation syntaxes.
//!
//! Rewrites C/C++ and TypeScript into Python, Python into TypeScript, and
//! adds annotations to Python function headers, all without building a
//! parse tree. Output is best effort and meant to be finished by hand.

// Core infrastructure - re-exported from recurl-core
pub use recurl_core::buffer;
pub use recurl_core::config;
pub use recurl_core::diff;
pub use recurl_core::error;
pub use recurl_core::outline;
pub use recurl_core::output;
pub use recurl_core::scan;
pub use recurl_core::text;

// Converters
pub use recurl_convert::{annotate, registry, to_python, to_typescript, Converter};

// Front door
pub mod cli;
pub mod driver;
