//! Outline tree: the document model the driver walks.
//!
//! An outline is a tree of nodes, each with a one-line headline and a
//! text body. A node whose headline starts with `@file ` (or `@@file `)
//! stands for a file on disk; its body is the file's content. Outlines
//! serialize to JSON so callers can feed hierarchies that do not exist on
//! disk.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const FILE_PREFIXES: &[&str] = &["@file ", "@@file "];

/// One node of an outline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub headline: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    /// Create a leaf node.
    pub fn new(headline: impl Into<String>, body: impl Into<String>) -> Self {
        Node {
            headline: headline.into(),
            body: body.into(),
            children: Vec::new(),
        }
    }

    /// Create a file node for `path` holding `content`.
    pub fn file(path: &Path, content: impl Into<String>) -> Self {
        Node::new(format!("@file {}", path.display()), content)
    }

    /// Attach children, builder style.
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// True when the headline marks a file node.
    pub fn is_file_node(&self) -> bool {
        FILE_PREFIXES.iter().any(|p| self.headline.starts_with(p))
    }

    /// The path named by a file node's headline.
    pub fn file_path(&self) -> Option<PathBuf> {
        FILE_PREFIXES
            .iter()
            .find_map(|p| self.headline.strip_prefix(p))
            .map(|rest| PathBuf::from(rest.trim()))
    }

    /// Visit this node and its descendants in preorder, mutably.
    pub fn preorder_mut(&mut self, f: &mut impl FnMut(&mut Node)) {
        f(self);
        for child in &mut self.children {
            child.preorder_mut(f);
        }
    }
}
