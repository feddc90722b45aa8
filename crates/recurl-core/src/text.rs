//! Text utilities: indentation, line splitting, position conversion.
//!
//! ## Coordinate Conventions
//!
//! - Lines and columns are **1-indexed** (matching editor conventions)
//! - Character offsets are **0-indexed**

/// The leading spaces and tabs of `line`.
pub fn leading_ws(line: &str) -> &str {
    let end = line
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    &line[..end]
}

/// Display width of a run of leading whitespace.
///
/// Tabs advance to the next multiple of `tab_width`.
pub fn indent_width(ws: &str, tab_width: usize) -> usize {
    let tab_width = tab_width.max(1);
    let mut w = 0;
    for ch in ws.chars() {
        match ch {
            '\t' => w += tab_width - (w % tab_width),
            ' ' => w += 1,
            _ => break,
        }
    }
    w
}

/// Split `s` into lines, keeping each line's `\n`.
pub fn split_lines(s: &str) -> Vec<&str> {
    s.split_inclusive('\n').collect()
}

/// Number of lines in `s` (a final line without `\n` still counts).
pub fn line_count(s: &str) -> usize {
    split_lines(s).len()
}

/// Convert a character offset to 1-indexed line and column.
///
/// If `offset` exceeds the content length, returns the position at the end.
pub fn char_offset_to_position(content: &[char], offset: usize) -> (u32, u32) {
    let offset = offset.min(content.len());
    let mut line = 1u32;
    let mut col = 1u32;

    for &ch in &content[..offset] {
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}
