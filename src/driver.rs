//! Outline driver: run one converter over a subtree.
//!
//! Nodes are visited in preorder. A node whose converter call fails is
//! left untouched and recorded; the run continues with the next node.
//! File nodes always take the converter's headline, so an empty or
//! unchanged file still gets the target extension.

use recurl_core::diff::UnitChange;
use recurl_core::outline::Node;
use recurl_core::output::{FailureInfo, SummaryInfo, UnitInfo};
use recurl_core::text::line_count;
use recurl_convert::Converter;
use tracing::{debug, info, warn};

/// Tally of one `convert_tree` call (or several, merged).
#[derive(Debug, Clone, Default)]
pub struct ConvertSummary {
    /// File nodes visited.
    pub files: usize,
    /// Nodes with a non-empty body visited.
    pub nodes: usize,
    /// Units whose text changed, in visit order.
    pub units: Vec<UnitInfo>,
    pub failures: Vec<FailureInfo>,
    /// Before/after text of every changed unit.
    pub changes: Vec<UnitChange>,
}

impl ConvertSummary {
    pub fn summary_info(&self) -> SummaryInfo {
        SummaryInfo {
            files: self.files,
            nodes: self.nodes,
            changed: self.units.len(),
            failed: self.failures.len(),
        }
    }

    pub fn merge(&mut self, other: ConvertSummary) {
        self.files += other.files;
        self.nodes += other.nodes;
        self.units.extend(other.units);
        self.failures.extend(other.failures);
        self.changes.extend(other.changes);
    }
}

/// Convert `root` and all of its descendants in place.
pub fn convert_tree(root: &mut Node, converter: &mut dyn Converter) -> ConvertSummary {
    let mut summary = ConvertSummary::default();
    root.preorder_mut(&mut |node| convert_node(node, converter, &mut summary));
    info!(
        converter = converter.name(),
        changed = summary.units.len(),
        failed = summary.failures.len(),
        "processed {} files, {} nodes",
        summary.files,
        summary.nodes
    );
    summary
}

fn convert_node(node: &mut Node, converter: &mut dyn Converter, summary: &mut ConvertSummary) {
    let is_file = node.is_file_node();
    if is_file {
        summary.files += 1;
    }
    if node.body.trim().is_empty() {
        if is_file {
            rename_file_node(node, converter);
        }
        return;
    }
    summary.nodes += 1;
    debug!(headline = %node.headline, "converting node");

    let after = match converter.convert(&node.body) {
        Ok(after) => after,
        Err(err) => {
            warn!(headline = %node.headline, error = %err, "node left unchanged");
            summary.failures.push(FailureInfo {
                headline: node.headline.clone(),
                message: err.to_string(),
            });
            return;
        }
    };
    if after == node.body {
        if is_file {
            rename_file_node(node, converter);
        }
        return;
    }

    let label = node
        .file_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| node.headline.clone());
    let headline = converter.convert_headline(&node.headline);
    summary.units.push(UnitInfo {
        headline: headline.clone(),
        lines_before: line_count(&node.body),
        lines_after: line_count(&after),
    });
    summary
        .changes
        .push(UnitChange::new(label, std::mem::take(&mut node.body), after.clone()));
    node.body = after;
    node.headline = headline;
}

fn rename_file_node(node: &mut Node, converter: &dyn Converter) {
    let headline = converter.convert_headline(&node.headline);
    if headline != node.headline {
        debug!(from = %node.headline, to = %headline, "renamed file node");
        node.headline = headline;
    }
}
