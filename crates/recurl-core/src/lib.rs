//! Core infrastructure for recurl.
//!
//! This crate provides the language-agnostic pieces shared by every converter:
//! - Mutable character and line buffers
//! - Lexical scanning primitives (strings, comments, brackets)
//! - Whole-buffer rewrite passes (comment translation, whitespace cleanup)
//! - Converter configuration
//! - The outline tree the driver walks
//! - Error types, error codes and JSON output types for CLI responses
//! - Text utilities and diff generation

pub mod buffer;
pub mod config;
pub mod diff;
pub mod error;
pub mod outline;
pub mod output;
pub mod rewrite;
pub mod scan;
pub mod text;
