//! JSON output types and serialization for CLI responses.
//!
//! ## Design Principles
//!
//! 1. **Status first:** Every response has `status` as its first field
//! 2. **Deterministic:** Same input produces the same output
//! 3. **Nullable vs absent:** Absent field means "not applicable"
//! 4. **Versioned:** Schema version in every response

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::{OutputErrorCode, RecurlError};
use crate::outline::Node;

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Errors
// ============================================================================

/// Error information for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    /// Create from a RecurlError.
    pub fn from_error(err: &RecurlError) -> Self {
        let code = OutputErrorCode::from(err).code();
        let details = match err {
            RecurlError::ApplyError {
                file: Some(file), ..
            } => Some(serde_json::json!({ "file": file })),
            RecurlError::ConversionFailed { count } => Some(serde_json::json!({ "count": count })),
            _ => None,
        };
        ErrorInfo {
            code,
            message: err.to_string(),
            details,
        }
    }
}

/// Response for any failed command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Error information.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create an error response from a RecurlError.
    pub fn from_error(err: &RecurlError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Convert
// ============================================================================

/// Counts for one conversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryInfo {
    /// File nodes visited.
    pub files: usize,
    /// Nodes with a non-empty body visited.
    pub nodes: usize,
    /// Nodes whose text changed.
    pub changed: usize,
    /// Nodes that raised a hard failure.
    pub failed: usize,
}

/// One unit whose text changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInfo {
    /// Headline after conversion.
    pub headline: String,
    /// Line count before conversion.
    pub lines_before: usize,
    /// Line count after conversion.
    pub lines_after: usize,
}

/// One unit the converter could not handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureInfo {
    pub headline: String,
    pub message: String,
}

/// Response for `convert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertResponse {
    /// Status: "ok", or "partial" when some units failed.
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Converter name.
    pub converter: String,
    pub summary: SummaryInfo,
    /// Units whose text changed, in preorder.
    pub units: Vec<UnitInfo>,
    /// Units that raised a hard failure.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureInfo>,
    /// The converted outline (outline input without `--apply`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outline: Option<Node>,
    /// Whether changes were written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied: Option<bool>,
    /// Paths written when applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_written: Option<Vec<String>>,
}

impl ConvertResponse {
    /// Create a dry-run response.
    pub fn new(
        converter: impl Into<String>,
        summary: SummaryInfo,
        units: Vec<UnitInfo>,
        failures: Vec<FailureInfo>,
    ) -> Self {
        let status = if failures.is_empty() { "ok" } else { "partial" };
        ConvertResponse {
            status: status.to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            converter: converter.into(),
            summary,
            units,
            failures,
            outline: None,
            applied: None,
            files_written: None,
        }
    }

    /// Record that changes were written to `files_written`.
    pub fn with_apply(mut self, files_written: Vec<String>) -> Self {
        self.applied = Some(true);
        self.files_written = Some(files_written);
        self
    }

    /// Attach the converted outline.
    pub fn with_outline(mut self, outline: Node) -> Self {
        self.outline = Some(outline);
        self
    }
}

// ============================================================================
// List
// ============================================================================

/// Description of one registered converter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterInfo {
    pub name: String,
    /// Source language, e.g. "c".
    pub source: String,
    /// Target language, e.g. "python".
    pub target: String,
    /// File extensions picked up when walking directories.
    pub extensions: Vec<String>,
}

/// Response for `list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub status: String,
    pub schema_version: String,
    pub converters: Vec<ConverterInfo>,
}

impl ListResponse {
    pub fn new(converters: Vec<ConverterInfo>) -> Self {
        ListResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            converters,
        }
    }
}

// ============================================================================
// Emission
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
///
/// This is the single output path for CLI, ensuring consistency.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod error_response {
        use super::*;

        #[test]
        fn status_first_and_code() {
            let resp = ErrorResponse::from_error(&RecurlError::file_not_found("a.c"));
            let json = serde_json::to_string(&resp).unwrap();
            assert!(json.starts_with(r#"{"status":"error""#));
            assert_eq!(resp.error.code, 3);
            assert!(resp.error.details.is_none());
        }

        #[test]
        fn apply_error_details() {
            let err = RecurlError::ApplyError {
                message: "denied".to_string(),
                file: Some("out.py".to_string()),
            };
            let info = ErrorInfo::from_error(&err);
            assert_eq!(info.code, 4);
            assert_eq!(info.details, Some(serde_json::json!({"file": "out.py"})));
        }
    }

    mod convert_response {
        use super::*;

        #[test]
        fn ok_without_failures() {
            let resp = ConvertResponse::new("c-to-python", SummaryInfo::default(), vec![], vec![]);
            assert_eq!(resp.status, "ok");
            let json = serde_json::to_string(&resp).unwrap();
            assert!(!json.contains("failures"));
            assert!(!json.contains("applied"));
        }

        #[test]
        fn partial_with_failures() {
            let failures = vec![FailureInfo {
                headline: "@file a.py".to_string(),
                message: "boom".to_string(),
            }];
            let resp = ConvertResponse::new("add-annotations", SummaryInfo::default(), vec![], failures)
                .with_apply(vec!["a.py".to_string()]);
            assert_eq!(resp.status, "partial");
            assert_eq!(resp.applied, Some(true));
            let json = serde_json::to_string(&resp).unwrap();
            assert!(json.contains("\"files_written\":[\"a.py\"]"));
        }
    }

    #[test]
    fn emit_is_pretty_and_newline_terminated() {
        let resp = ListResponse::new(vec![ConverterInfo {
            name: "c-to-python".to_string(),
            source: "c".to_string(),
            target: "python".to_string(),
            extensions: vec!["c".to_string()],
        }]);
        let mut out = Vec::new();
        emit_response(&resp, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("}\n"));
        assert!(text.contains("\n  \"converters\": ["));
    }
}
