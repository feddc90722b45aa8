//! Unified diff generation utilities.
//!
//! Converters rewrite whole units, so each changed unit becomes a single
//! hunk spanning everything between its unchanged leading and trailing
//! lines.

/// Before and after text of one changed unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitChange {
    /// Label used in the `---`/`+++` headers (usually a path or headline).
    pub label: String,
    pub before: String,
    pub after: String,
}

impl UnitChange {
    pub fn new(label: impl Into<String>, before: impl Into<String>, after: impl Into<String>) -> Self {
        UnitChange {
            label: label.into(),
            before: before.into(),
            after: after.into(),
        }
    }
}

/// Generate a unified diff covering every change, in order.
pub fn generate_unified_diff(changes: &[UnitChange]) -> String {
    let mut diff = String::new();
    for change in changes {
        let old: Vec<&str> = change.before.lines().collect();
        let new: Vec<&str> = change.after.lines().collect();
        if old == new {
            continue;
        }

        let prefix = old.iter().zip(&new).take_while(|(a, b)| a == b).count();
        let max_suffix = old.len().min(new.len()) - prefix;
        let suffix = old
            .iter()
            .rev()
            .zip(new.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();

        let old_mid = &old[prefix..old.len() - suffix];
        let new_mid = &new[prefix..new.len() - suffix];

        diff.push_str(&format!("--- a/{}\n", change.label));
        diff.push_str(&format!("+++ b/{}\n", change.label));
        diff.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            hunk_start(prefix, old_mid.len()),
            old_mid.len(),
            hunk_start(prefix, new_mid.len()),
            new_mid.len()
        ));
        for line in old_mid {
            diff.push_str(&format!("-{}\n", line));
        }
        for line in new_mid {
            diff.push_str(&format!("+{}\n", line));
        }
    }
    diff
}

/// Empty ranges are addressed by the line before them.
fn hunk_start(prefix: usize, count: usize) -> usize {
    if count == 0 {
        prefix
    } else {
        prefix + 1
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_diff_single_change() {
        let changes = vec![UnitChange::new("a.c", "int x;\nfoo();\n", "x\nfoo()\n")];
        let diff = generate_unified_diff(&changes);
        assert!(diff.contains("--- a/a.c\n+++ b/a.c\n"));
        assert!(diff.contains("@@ -1,2 +1,2 @@\n"));
        assert!(diff.contains("-int x;\n"));
        assert!(diff.contains("+x\n"));
    }

    #[test]
    fn generate_diff_trims_common_lines() {
        let changes = vec![UnitChange::new("u", "a\nb\nc\n", "a\nB\nc\n")];
        let diff = generate_unified_diff(&changes);
        assert!(diff.contains("@@ -2,1 +2,1 @@\n-b\n+B\n"));
        assert!(!diff.contains("-a"));
    }

    #[test]
    fn generate_diff_pure_deletion() {
        let changes = vec![UnitChange::new("u", "a\n\nb\n", "a\nb\n")];
        let diff = generate_unified_diff(&changes);
        assert!(diff.contains("@@ -2,1 +1,0 @@\n-\n"));
    }

    #[test]
    fn generate_diff_multiple_units() {
        let changes = vec![
            UnitChange::new("a.py", "x", "y"),
            UnitChange::new("b.py", "same", "same"),
            UnitChange::new("c.py", "p", "q"),
        ];
        let diff = generate_unified_diff(&changes);
        assert_eq!(diff.matches("@@ -").count(), 2);
        assert!(!diff.contains("b.py"));
    }

    #[test]
    fn generate_diff_empty() {
        assert!(generate_unified_diff(&[]).is_empty());
    }
}
