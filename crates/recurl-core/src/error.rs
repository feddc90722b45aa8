//! Error types and error code constants for recurl.
//!
//! Two layers of errors live here:
//! - `ConvertError`: a single unit failed to convert (hard failure inside a converter)
//! - `RecurlError`: the unified error type rendered by the CLI as JSON
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (unknown converter, bad flags, bad config)
//! - `3`: Resolution errors (file not found)
//! - `4`: Apply errors (failed to write converted output)
//! - `5`: Conversion failed (one or more units raised a hard failure)
//! - `10`: Internal errors (bugs, unexpected state)

use std::fmt;
use std::io;

use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, malformed request).
    InvalidArguments = 2,
    /// Resolution errors (file not found).
    ResolutionError = 3,
    /// Apply errors (failed to write converted output).
    ApplyError = 4,
    /// One or more units could not be converted.
    ConversionFailed = 5,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Per-unit Conversion Errors
// ============================================================================

/// A hard failure raised while converting one unit of text.
///
/// Converters degrade gracefully on constructs they do not understand; these
/// variants cover the few conditions where no sensible output exists. The
/// driver records the failure against the unit and moves on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConvertError {
    /// A function argument list did not start with `(` or end with `)`.
    #[error("malformed argument list at line {line}: {text}")]
    MalformedArguments { line: u32, text: String },

    /// Bracket nesting inside a single argument never returned to zero.
    #[error("unbalanced argument: {text}")]
    UnbalancedArgument { text: String },

    /// A user-supplied pattern (such as an alias) could not be compiled.
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Result type for single-unit conversions.
pub type ConvertResult<T> = Result<T, ConvertError>;

// ============================================================================
// Configuration Errors
// ============================================================================

/// Errors raised while loading converter configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid JSON for `ConverterConfig`.
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    /// An instance-variable line lacks the `name:` prefix.
    #[error("invalid ivars line: {line}")]
    InvalidIvarsLine { line: String },

    /// A settings file names a `@data` section no converter reads.
    #[error("unknown @data section: {tag}")]
    UnknownSection { tag: String },

    /// A settings line appears before any `@data` header.
    #[error("data line outside an @data section: {line}")]
    StrayDataLine { line: String },
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
///
/// All subsystem errors are converted to this type before being rendered as
/// JSON output.
#[derive(Debug, Error)]
pub enum RecurlError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// Failed to write converted output.
    #[error("apply error: {message}")]
    ApplyError {
        message: String,
        file: Option<String>,
    },

    /// One or more units raised a hard conversion failure.
    #[error("conversion failed for {count} unit(s)")]
    ConversionFailed { count: usize },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl RecurlError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        RecurlError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        RecurlError::FileNotFound { path: path.into() }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        RecurlError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

impl From<&RecurlError> for OutputErrorCode {
    fn from(err: &RecurlError) -> Self {
        match err {
            RecurlError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            RecurlError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            RecurlError::ApplyError { .. } => OutputErrorCode::ApplyError,
            RecurlError::ConversionFailed { .. } => OutputErrorCode::ConversionFailed,
            RecurlError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<ConfigError> for RecurlError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io { path, source } if source.kind() == io::ErrorKind::NotFound => {
                RecurlError::FileNotFound { path }
            }
            other => RecurlError::InvalidArguments {
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for RecurlError {
    fn from(err: serde_json::Error) -> Self {
        RecurlError::InvalidArguments {
            message: format!("invalid JSON: {}", err),
        }
    }
}
