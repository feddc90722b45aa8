//! Converter configuration.
//!
//! A single `ConverterConfig` is shared by every converter; each converter
//! reads only the fields it cares about:
//!
//! - `c-to-python`: `class_list`, `type_list`, `ivars`
//! - `python-to-typescript`: `types`, `self_alias`
//! - `add-annotations`: `types`
//! - all brace-to-indent converters: `tab_width`
//!
//! Configuration is loaded from JSON, or from a settings file made of
//! `@data <tag>` sections (see [`ConverterConfig::from_data_str`]).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// Type names stripped from C declarations when no list is configured.
pub const DEFAULT_TYPE_LIST: &[&str] = &["char", "void", "short", "long", "int", "double", "float"];

/// Default tab width used when measuring indentation.
pub const DEFAULT_TAB_WIDTH: usize = 4;

const DATA_TAGS: &[&str] = &[
    "add-mypy-annotations",
    "python-to-typescript-types",
    "c-to-python-class-list",
    "c-to-python-type-list",
    "c-to-python-ivars-dict",
];

/// Read-only configuration for one conversion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Argument name to type annotation (`c` → `Cmdr`).
    pub types: BTreeMap<String, String>,
    /// Class names recognized inside C casts.
    pub class_list: Vec<String>,
    /// C type names removed from declarations and casts.
    pub type_list: Vec<String>,
    /// Instance variables per class; bare uses gain a `self.` prefix.
    pub ivars: BTreeMap<String, Vec<String>>,
    /// A local name used as an alias for `self` (e.g. `at` in `at = self`).
    pub self_alias: Option<String>,
    /// Width of a tab stop.
    pub tab_width: usize,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        ConverterConfig {
            types: BTreeMap::new(),
            class_list: Vec::new(),
            type_list: DEFAULT_TYPE_LIST.iter().map(|s| s.to_string()).collect(),
            ivars: BTreeMap::new(),
            self_alias: None,
            tab_width: DEFAULT_TAB_WIDTH,
        }
    }
}

impl ConverterConfig {
    /// Parse configuration from a JSON string. Missing fields take defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Parse a settings file made of `@data <tag>` sections.
    ///
    /// Recognized tags:
    ///
    /// - `add-mypy-annotations`, `python-to-typescript-types`: `name, type` lines
    /// - `c-to-python-class-list`, `c-to-python-type-list`: one name per line
    /// - `c-to-python-ivars-dict`: `Class:` headers followed by name lists
    ///
    /// Lines starting with `#` are comments. Fields without a section keep
    /// their defaults.
    pub fn from_data_str(s: &str) -> Result<Self, ConfigError> {
        let mut sections: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        let mut current: Option<&str> = None;
        for line in s.lines() {
            let trimmed = line.trim();
            if let Some(tag) = trimmed.strip_prefix("@data ") {
                let tag = tag.trim();
                if !DATA_TAGS.contains(&tag) {
                    return Err(ConfigError::UnknownSection {
                        tag: tag.to_string(),
                    });
                }
                sections.entry(tag).or_default();
                current = Some(tag);
            } else if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            } else if let Some(tag) = current {
                sections.entry(tag).or_default().push(trimmed);
            } else {
                return Err(ConfigError::StrayDataLine {
                    line: trimmed.to_string(),
                });
            }
        }

        let mut config = ConverterConfig::default();
        let type_lines: Vec<&str> = ["add-mypy-annotations", "python-to-typescript-types"]
            .iter()
            .filter_map(|tag| sections.get(tag))
            .flatten()
            .copied()
            .collect();
        config.types = parse_types_data(&type_lines);
        if let Some(lines) = sections.get("c-to-python-class-list") {
            config.class_list = lines.iter().map(|s| s.to_string()).collect();
        }
        if let Some(lines) = sections.get("c-to-python-type-list") {
            if !lines.is_empty() {
                config.type_list = lines.iter().map(|s| s.to_string()).collect();
            }
        }
        if let Some(lines) = sections.get("c-to-python-ivars-dict") {
            config.ivars = parse_ivars_data(lines)?;
        }
        Ok(config)
    }

    /// Load configuration from a file: JSON when the extension is `.json`,
    /// `@data` sections otherwise.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if path.extension().is_some_and(|ext| ext == "json") {
            return Self::from_json_file(path);
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_data_str(&content)
    }

    /// True when `word` is a configured C type or class name.
    pub fn is_type_name(&self, word: &str) -> bool {
        self.type_list.iter().any(|t| t == word) || self.class_list.iter().any(|c| c == word)
    }

    /// Instance variables declared for `class_name`.
    pub fn ivars_for(&self, class_name: &str) -> &[String] {
        self.ivars.get(class_name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Parse `name, type` lines into a type map.
///
/// Duplicate names and lines without a comma are ignored with a warning.
pub fn parse_types_data<S: AsRef<str>>(lines: &[S]) -> BTreeMap<String, String> {
    let mut types = BTreeMap::new();
    for line in lines {
        let line = line.as_ref().trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, val)) = line.split_once(',') else {
            warn!(line, "ignoring invalid key/value pair");
            continue;
        };
        let key = key.trim();
        if types.contains_key(key) {
            warn!(line, "ignoring duplicate key");
            continue;
        }
        types.insert(key.to_string(), val.trim().to_string());
    }
    types
}

/// Parse instance-variable data.
///
/// The format is a `ClassName:` header line followed by lines of
/// comma-separated names. Repeated headers accumulate.
pub fn parse_ivars_data<S: AsRef<str>>(
    lines: &[S],
) -> Result<BTreeMap<String, Vec<String>>, ConfigError> {
    let mut ivars: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut key: Option<String> = None;
    for line in lines {
        let line = line.as_ref().trim();
        if line.is_empty() {
            continue;
        }
        if let Some(name) = line.strip_suffix(':') {
            key = Some(name.trim().to_string());
        } else if let Some(k) = &key {
            let names = line
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            ivars.entry(k.clone()).or_default().extend(names);
        } else {
            return Err(ConfigError::InvalidIvarsLine {
                line: line.to_string(),
            });
        }
    }
    Ok(ivars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = ConverterConfig::default();
        assert_eq!(config.tab_width, 4);
        assert!(config.is_type_name("int"));
        assert!(!config.is_type_name("Foo"));
        assert!(config.ivars_for("Foo").is_empty());
    }

    #[test]
    fn json_fills_missing_fields() {
        let config =
            ConverterConfig::from_json_str(r#"{"class_list": ["Foo"], "types": {"c": "Cmdr"}}"#)
                .unwrap();
        assert!(config.is_type_name("Foo"));
        assert!(config.is_type_name("double"));
        assert_eq!(config.types.get("c").map(String::as_str), Some("Cmdr"));
        assert_eq!(config.self_alias, None);
    }

    #[test]
    fn json_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"self_alias": "at", "tab_width": 8}}"#).unwrap();
        let config = ConverterConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.self_alias.as_deref(), Some("at"));
        assert_eq!(config.tab_width, 8);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ConverterConfig::from_json_file(Path::new("/nonexistent/recurl.json"));
        assert!(matches!(err, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn types_data_ignores_duplicates_and_junk() {
        let types = parse_types_data(&["c, Cmdr", "p,Position", "c, Other", "junk", ""]);
        assert_eq!(types.len(), 2);
        assert_eq!(types["c"], "Cmdr");
        assert_eq!(types["p"], "Position");
    }

    #[test]
    fn ivars_data_accumulates() {
        let ivars = parse_ivars_data(&["Foo:", "a, b", "c", "Bar:", "x", "Foo:", "d"]).unwrap();
        assert_eq!(ivars["Foo"], vec!["a", "b", "c", "d"]);
        assert_eq!(ivars["Bar"], vec!["x"]);
    }

    #[test]
    fn data_sections_fill_config() {
        let text = "\
# settings
@data add-mypy-annotations
c, Cmdr
@data python-to-typescript-types
p, Position
c, Other
@data c-to-python-class-list
Foo
@data c-to-python-ivars-dict
Foo:
a, b
";
        let config = ConverterConfig::from_data_str(text).unwrap();
        assert_eq!(config.types["c"], "Cmdr");
        assert_eq!(config.types["p"], "Position");
        assert!(config.is_type_name("Foo"));
        assert!(config.is_type_name("int"));
        assert_eq!(config.ivars_for("Foo"), ["a", "b"]);
        assert_eq!(config.tab_width, DEFAULT_TAB_WIDTH);
    }

    #[test]
    fn data_errors() {
        assert!(matches!(
            ConverterConfig::from_data_str("@data colors\nred\n"),
            Err(ConfigError::UnknownSection { .. })
        ));
        assert!(matches!(
            ConverterConfig::from_data_str("c, Cmdr\n"),
            Err(ConfigError::StrayDataLine { .. })
        ));
        assert!(matches!(
            ConverterConfig::from_data_str("@data c-to-python-ivars-dict\na, b\n"),
            Err(ConfigError::InvalidIvarsLine { .. })
        ));
    }

    #[test]
    fn from_file_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("recurl.json");
        std::fs::write(&json, r#"{"tab_width": 2}"#).unwrap();
        assert_eq!(ConverterConfig::from_file(&json).unwrap().tab_width, 2);

        let data = dir.path().join("recurl.txt");
        std::fs::write(&data, "@data c-to-python-type-list\nint\n").unwrap();
        let config = ConverterConfig::from_file(&data).unwrap();
        assert_eq!(config.type_list, vec!["int"]);
    }

    #[test]
    fn ivars_data_without_header_is_error() {
        let err = parse_ivars_data(&["a, b"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidIvarsLine { .. }));
    }
}
