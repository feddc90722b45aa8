//! Mutable text buffers.
//!
//! Brace-to-indent conversion edits a flat sequence of characters in place;
//! indent-to-brace conversion edits a list of lines. Both buffers expose
//! their contents as read-only slices (via `Deref`) so the scanning
//! primitives in [`crate::scan`] work on either a whole buffer or a
//! sub-slice, while every mutation goes through a named method.
//!
//! All indices are character indices, not byte offsets. Ranges passed to
//! the mutating methods are clamped to the buffer length.

use std::fmt;
use std::ops::{Deref, Range};

// ============================================================================
// CharBuffer
// ============================================================================

/// A growable, editable sequence of characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharBuffer {
    chars: Vec<char>,
}

impl CharBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        CharBuffer { chars: Vec::new() }
    }

    /// The character at `i`, if any.
    pub fn get(&self, i: usize) -> Option<char> {
        self.chars.get(i).copied()
    }

    /// Copy the characters in `range` out as a `String`.
    pub fn text(&self, range: Range<usize>) -> String {
        let range = self.clamp(range);
        self.chars[range].iter().collect()
    }

    /// Replace the characters in `range` with `replacement`.
    ///
    /// Returns the number of characters inserted.
    pub fn splice_chars(&mut self, range: Range<usize>, replacement: &[char]) -> usize {
        let range = self.clamp(range);
        self.chars.splice(range, replacement.iter().copied());
        replacement.len()
    }

    /// Replace the characters in `range` with the characters of `replacement`.
    ///
    /// Returns the number of characters inserted.
    pub fn splice_str(&mut self, range: Range<usize>, replacement: &str) -> usize {
        let replacement: Vec<char> = replacement.chars().collect();
        self.splice_chars(range, &replacement)
    }

    /// Insert `s` before position `i`. Returns the number of characters inserted.
    pub fn insert_str(&mut self, i: usize, s: &str) -> usize {
        self.splice_str(i..i, s)
    }

    /// Delete the characters in `range`.
    pub fn remove_range(&mut self, range: Range<usize>) {
        let range = self.clamp(range);
        self.chars.drain(range);
    }

    /// Overwrite the character at `i`. Out-of-range writes are ignored.
    pub fn set(&mut self, i: usize, ch: char) {
        if let Some(slot) = self.chars.get_mut(i) {
            *slot = ch;
        }
    }

    fn clamp(&self, range: Range<usize>) -> Range<usize> {
        let end = range.end.min(self.chars.len());
        let start = range.start.min(end);
        start..end
    }
}

impl Deref for CharBuffer {
    type Target = [char];

    fn deref(&self) -> &[char] {
        &self.chars
    }
}

impl From<&str> for CharBuffer {
    fn from(s: &str) -> Self {
        CharBuffer {
            chars: s.chars().collect(),
        }
    }
}

impl From<Vec<char>> for CharBuffer {
    fn from(chars: Vec<char>) -> Self {
        CharBuffer { chars }
    }
}

impl fmt::Display for CharBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: String = self.chars.iter().collect();
        f.write_str(&s)
    }
}

// ============================================================================
// LineBuffer
// ============================================================================

/// An editable list of lines.
///
/// Each line keeps its trailing `\n`. [`LineBuffer::from_text`] guarantees
/// that every line, including the last, ends with a newline so that line
/// classification never has to special-case the end of the text;
/// [`LineBuffer::into_text`] restores the original trailing-newline state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    lines: Vec<String>,
    trailing_newline: bool,
}

impl LineBuffer {
    /// Split `text` into newline-terminated lines.
    pub fn from_text(text: &str) -> Self {
        let trailing_newline = text.is_empty() || text.ends_with('\n');
        let mut lines: Vec<String> = text.split_inclusive('\n').map(str::to_string).collect();
        if let Some(last) = lines.last_mut() {
            if !last.ends_with('\n') {
                last.push('\n');
            }
        }
        LineBuffer {
            lines,
            trailing_newline,
        }
    }

    /// Join the lines back into text.
    pub fn into_text(self) -> String {
        let mut text = self.lines.concat();
        if !self.trailing_newline && text.ends_with('\n') {
            text.pop();
        }
        text
    }

    /// The line at `i`, or `""` when out of range.
    pub fn line(&self, i: usize) -> &str {
        self.lines.get(i).map(String::as_str).unwrap_or("")
    }

    /// Replace the line at `i`. Out-of-range writes are ignored.
    pub fn set(&mut self, i: usize, line: impl Into<String>) {
        if let Some(slot) = self.lines.get_mut(i) {
            *slot = line.into();
        }
    }

    /// Insert a line before index `i` (appends when `i` is past the end).
    pub fn insert(&mut self, i: usize, line: impl Into<String>) {
        let i = i.min(self.lines.len());
        self.lines.insert(i, line.into());
    }

    /// Append a line.
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Replace the lines in `range` with `replacement`.
    pub fn splice(&mut self, range: Range<usize>, replacement: Vec<String>) {
        let end = range.end.min(self.lines.len());
        let start = range.start.min(end);
        self.lines.splice(start..end, replacement);
    }
}

impl Deref for LineBuffer {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod char_buffer {
        use super::*;

        #[test]
        fn splice_replaces_range() {
            let mut buf = CharBuffer::from("if (x) {");
            let n = buf.splice_str(3..4, "");
            assert_eq!(n, 0);
            assert_eq!(buf.to_string(), "if x) {");
        }

        #[test]
        fn splice_clamps_out_of_range() {
            let mut buf = CharBuffer::from("abc");
            buf.splice_str(2..10, "Z");
            assert_eq!(buf.to_string(), "abZ");
            buf.remove_range(7..9);
            assert_eq!(buf.to_string(), "abZ");
        }

        #[test]
        fn insert_and_text() {
            let mut buf = CharBuffer::from("def f");
            buf.insert_str(5, "():");
            assert_eq!(buf.text(0..5), "def f");
            assert_eq!(buf.to_string(), "def f():");
        }

        #[test]
        fn deref_gives_slice() {
            let buf = CharBuffer::from("héllo");
            assert_eq!(buf.len(), 5);
            assert_eq!(buf[1], 'é');
            assert_eq!(buf.get(9), None);
        }
    }

    mod line_buffer {
        use super::*;

        #[test]
        fn last_line_gets_newline() {
            let buf = LineBuffer::from_text("a\nb");
            assert_eq!(buf.len(), 2);
            assert_eq!(buf.line(1), "b\n");
            assert_eq!(buf.into_text(), "a\nb");
        }

        #[test]
        fn trailing_newline_round_trips() {
            let buf = LineBuffer::from_text("a\n\nb\n");
            assert_eq!(buf.len(), 3);
            assert_eq!(buf.into_text(), "a\n\nb\n");
        }

        #[test]
        fn insert_past_end_appends() {
            let mut buf = LineBuffer::from_text("x\n");
            buf.insert(10, "}\n");
            assert_eq!(buf.line(1), "}\n");
            assert_eq!(buf.line(5), "");
        }

        #[test]
        fn empty_text() {
            let buf = LineBuffer::from_text("");
            assert!(buf.is_empty());
            assert_eq!(buf.into_text(), "");
        }
    }
}
