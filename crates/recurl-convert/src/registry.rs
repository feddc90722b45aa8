//! Converter lookup by name.

use recurl_core::config::ConverterConfig;
use recurl_core::output::ConverterInfo;

use crate::annotate::AddAnnotations;
use crate::to_python::{CToPython, TypescriptToPython};
use crate::to_typescript::PythonToTypescript;
use crate::Converter;

struct Entry {
    name: &'static str,
    source: &'static str,
    target: &'static str,
    extensions: &'static [&'static str],
}

const ENTRIES: &[Entry] = &[
    Entry {
        name: "c-to-python",
        source: "c",
        target: "python",
        extensions: &["c", "cc", "cpp", "h", "hpp"],
    },
    Entry {
        name: "ts-to-python",
        source: "typescript",
        target: "python",
        extensions: &["ts", "js"],
    },
    Entry {
        name: "python-to-typescript",
        source: "python",
        target: "typescript",
        extensions: &["py"],
    },
    Entry {
        name: "add-annotations",
        source: "python",
        target: "python",
        extensions: &["py"],
    },
];

/// Every registered converter, in registration order.
pub fn converters() -> Vec<ConverterInfo> {
    ENTRIES
        .iter()
        .map(|e| ConverterInfo {
            name: e.name.to_string(),
            source: e.source.to_string(),
            target: e.target.to_string(),
            extensions: e.extensions.iter().map(|x| x.to_string()).collect(),
        })
        .collect()
}

/// Look up a converter's description.
pub fn converter_info(name: &str) -> Option<ConverterInfo> {
    converters().into_iter().find(|c| c.name == name)
}

/// Build a fresh converter instance (a fresh run) by name.
pub fn converter_for_name(name: &str, config: ConverterConfig) -> Option<Box<dyn Converter>> {
    let conv: Box<dyn Converter> = match name {
        "c-to-python" => Box::new(CToPython::new(config)),
        "ts-to-python" => Box::new(TypescriptToPython::new(config)),
        "python-to-typescript" => Box::new(PythonToTypescript::new(config)),
        "add-annotations" => Box::new(AddAnnotations::new(config)),
        _ => return None,
    };
    Some(conv)
}

/// The file extension written by `--apply` for a target language.
pub fn target_extension(target: &str) -> &'static str {
    match target {
        "typescript" => "ts",
        _ => "py",
    }
}
