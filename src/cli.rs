//! CLI front door: load inputs, run a converter, assemble the response.
//!
//! Inputs are either source files (directories are walked and filtered by
//! the converter's source extensions) or JSON outlines. Nothing is written
//! unless `apply` is set:
//! - source files are written next to the input with the target
//!   language's extension (in place when source and target match)
//! - outlines are written back to the file they were read from
//!
//! All functions return `Result<T, RecurlError>` so `main.rs` can map
//! failures onto stable exit codes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use recurl_convert::registry::{converter_for_name, converter_info, target_extension};
use recurl_core::config::ConverterConfig;
use recurl_core::diff::UnitChange;
use recurl_core::error::RecurlError;
use recurl_core::outline::Node;
use recurl_core::output::{ConvertResponse, ConverterInfo};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::driver::{convert_tree, ConvertSummary};

/// Directory names never descended into when walking inputs.
const SKIPPED_DIRS: &[&str] = &["__pycache__", "node_modules", "target", "venv"];

/// Arguments of one `convert` invocation.
#[derive(Debug, Clone, Default)]
pub struct ConvertRequest {
    pub converter: String,
    pub paths: Vec<PathBuf>,
    pub config: Option<PathBuf>,
    pub outline: bool,
    pub apply: bool,
}

/// Result of a `convert` invocation.
#[derive(Debug, Clone)]
pub struct ConvertRun {
    pub response: ConvertResponse,
    /// Before/after text of every changed unit, for diff output.
    pub changes: Vec<UnitChange>,
}

/// Run a conversion as described by `request`.
pub fn run_convert(request: &ConvertRequest) -> Result<ConvertRun, RecurlError> {
    let info = converter_info(&request.converter).ok_or_else(|| {
        RecurlError::invalid_args(format!(
            "unknown converter '{}' (see `recurl list`)",
            request.converter
        ))
    })?;
    if request.paths.is_empty() {
        return Err(RecurlError::invalid_args("no input paths given"));
    }
    let config = match &request.config {
        Some(path) => ConverterConfig::from_file(path)?,
        None => ConverterConfig::default(),
    };
    let mut converter = converter_for_name(&info.name, config)
        .ok_or_else(|| RecurlError::internal(format!("converter '{}' not built", info.name)))?;

    let mut summary = ConvertSummary::default();
    let mut written = Vec::new();
    let mut outlines = Vec::new();

    if request.outline {
        for path in &request.paths {
            let mut root = load_outline(path)?;
            let before = root.clone();
            let result = convert_tree(&mut root, converter.as_mut());
            let changed = root != before;
            summary.merge(result);
            if request.apply && changed {
                let json = serde_json::to_string_pretty(&root)
                    .map_err(|e| RecurlError::internal(format!("JSON serialization error: {}", e)))?;
                write_output(path, &format!("{}\n", json))?;
                written.push(path.display().to_string());
            }
            outlines.push(root);
        }
    } else {
        let files = collect_files(&request.paths, &info.extensions)?;
        let mut root = Node::new("", "").with_children(
            files
                .iter()
                .map(|(path, content)| Node::file(path, content.as_str()))
                .collect(),
        );
        summary.merge(convert_tree(&mut root, converter.as_mut()));
        if request.apply {
            for ((path, before), node) in files.iter().zip(&root.children) {
                if node.body == *before {
                    continue;
                }
                let target = target_path(path, &info);
                write_output(&target, &node.body)?;
                written.push(target.display().to_string());
            }
        }
    }

    let mut response = ConvertResponse::new(
        info.name.clone(),
        summary.summary_info(),
        summary.units,
        summary.failures,
    );
    if request.apply {
        response = response.with_apply(written);
    } else if request.outline {
        let outline = match outlines.len() {
            1 => outlines.remove(0),
            _ => Node::new("", "").with_children(outlines),
        };
        response = response.with_outline(outline);
    }
    Ok(ConvertRun {
        response,
        changes: summary.changes,
    })
}

/// Where `--apply` writes the converted text of `path`.
pub fn target_path(path: &Path, info: &ConverterInfo) -> PathBuf {
    if info.source == info.target {
        path.to_path_buf()
    } else {
        path.with_extension(target_extension(&info.target))
    }
}

/// Read every input file.
///
/// Files named explicitly are taken whatever their extension; directories
/// are walked in name order, skipping hidden and build directories, and
/// only files with one of `extensions` are kept.
pub fn collect_files(
    paths: &[PathBuf],
    extensions: &[String],
) -> Result<Vec<(PathBuf, String)>, RecurlError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push((path.clone(), read_input(path)?));
            continue;
        }
        if !path.is_dir() {
            return Err(RecurlError::file_not_found(path.display().to_string()));
        }
        for p in walk_sources(path, extensions) {
            let content = read_input(&p)?;
            files.push((p, content));
        }
    }
    Ok(files)
}

/// Files under `root` with one of `extensions`, in name order.
///
/// Entries the walk cannot read are logged and skipped.
pub fn walk_sources(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e.path()));
    let mut found = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory entry");
                continue;
            }
        };
        let p = entry.path();
        if !entry.file_type().is_file() || !has_extension(p, extensions) {
            continue;
        }
        debug!(path = %p.display(), "input file");
        found.push(p.to_path_buf());
    }
    found
}

/// Parse a JSON outline.
pub fn load_outline(path: &Path) -> Result<Node, RecurlError> {
    let text = read_input(path)?;
    let node: Node = serde_json::from_str(&text)?;
    Ok(node)
}

fn is_skipped_dir(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy())
        .is_some_and(|n| n.starts_with('.') || SKIPPED_DIRS.contains(&n.as_ref()))
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy())
        .is_some_and(|e| extensions.iter().any(|x| *x == e))
}

fn read_input(path: &Path) -> Result<String, RecurlError> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => RecurlError::file_not_found(path.display().to_string()),
        _ => RecurlError::invalid_args(format!("cannot read {}: {}", path.display(), e)),
    })
}

fn write_output(path: &Path, content: &str) -> Result<(), RecurlError> {
    fs::write(path, content).map_err(|e| RecurlError::ApplyError {
        message: e.to_string(),
        file: Some(path.display().to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn request(converter: &str, paths: Vec<PathBuf>) -> ConvertRequest {
        ConvertRequest {
            converter: converter.to_string(),
            paths,
            ..Default::default()
        }
    }

    mod inputs {
        use super::*;

        #[test]
        fn walk_filters_by_extension_and_skips_hidden() {
            let dir = TempDir::new().unwrap();
            fs::create_dir(dir.path().join(".git")).unwrap();
            fs::create_dir(dir.path().join("sub")).unwrap();
            fs::write(dir.path().join(".git/x.py"), "").unwrap();
            fs::write(dir.path().join("sub/b.py"), "b = 1\n").unwrap();
            fs::write(dir.path().join("a.py"), "a = 1\n").unwrap();
            fs::write(dir.path().join("notes.txt"), "").unwrap();

            let files = collect_files(&[dir.path().to_path_buf()], &["py".to_string()]).unwrap();
            let names: Vec<_> = files
                .iter()
                .map(|(p, _)| p.strip_prefix(dir.path()).unwrap().to_path_buf())
                .collect();
            assert_eq!(names, vec![PathBuf::from("a.py"), PathBuf::from("sub/b.py")]);
        }

        #[test]
        fn walk_errors_are_skipped() {
            let missing = walk_sources(Path::new("/no/such/recurl/dir"), &["py".to_string()]);
            assert!(missing.is_empty());
        }

        #[cfg(unix)]
        #[test]
        fn unreadable_directory_does_not_stop_the_walk() {
            use std::os::unix::fs::PermissionsExt;

            let dir = TempDir::new().unwrap();
            let locked = dir.path().join("locked");
            fs::create_dir(&locked).unwrap();
            fs::write(dir.path().join("a.py"), "a = 1\n").unwrap();
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

            let found = walk_sources(dir.path(), &["py".to_string()]);
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            assert_eq!(found, vec![dir.path().join("a.py")]);
        }

        #[test]
        fn missing_path_is_not_found() {
            let err = collect_files(&[PathBuf::from("/no/such/recurl/input")], &[]).unwrap_err();
            assert!(matches!(err, RecurlError::FileNotFound { .. }));
        }

        #[test]
        fn target_paths() {
            let info = converter_info("python-to-typescript").unwrap();
            assert_eq!(target_path(Path::new("a/m.py"), &info), PathBuf::from("a/m.ts"));
            let info = converter_info("add-annotations").unwrap();
            assert_eq!(target_path(Path::new("m.py"), &info), PathBuf::from("m.py"));
        }
    }

    mod convert {
        use super::*;

        #[test]
        fn unknown_converter() {
            let err = run_convert(&request("cobol-to-python", vec![PathBuf::from(".")])).unwrap_err();
            assert!(matches!(err, RecurlError::InvalidArguments { .. }));
        }

        #[test]
        fn dry_run_writes_nothing() {
            let dir = TempDir::new().unwrap();
            let src = dir.path().join("m.py");
            fs::write(&src, "x = 1\n").unwrap();

            let run = run_convert(&request("python-to-typescript", vec![src.clone()])).unwrap();
            assert_eq!(run.response.summary.changed, 1);
            assert_eq!(run.changes[0].after, "const x = 1;\n");
            assert!(!dir.path().join("m.ts").exists());
            assert_eq!(run.response.applied, None);
        }

        #[test]
        fn apply_writes_target_extension() {
            let dir = TempDir::new().unwrap();
            let src = dir.path().join("m.c");
            fs::write(&src, "int f(int a) {\n    return a;\n}\n").unwrap();

            let mut req = request("c-to-python", vec![dir.path().to_path_buf()]);
            req.apply = true;
            let run = run_convert(&req).unwrap();
            let out = fs::read_to_string(dir.path().join("m.py")).unwrap();
            assert_eq!(out, "def f(a):\n    return a\n");
            assert_eq!(run.response.files_written.map(|f| f.len()), Some(1));
        }

        #[test]
        fn outline_round_trip() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("tree.json");
            let root = Node::new("@file m.py", "").with_children(vec![Node::new(
                "f",
                "def f(a):\n    return a\n",
            )]);
            fs::write(&path, serde_json::to_string(&root).unwrap()).unwrap();

            let mut req = request("add-annotations", vec![path.clone()]);
            req.outline = true;
            let run = run_convert(&req).unwrap();
            let outline = run.response.outline.unwrap();
            assert_eq!(outline.children[0].body, "def f(a: Any) -> Any:\n    return a\n");

            req.apply = true;
            run_convert(&req).unwrap();
            let saved = load_outline(&path).unwrap();
            assert_eq!(saved.children[0].body, "def f(a: Any) -> Any:\n    return a\n");
        }
    }
}
