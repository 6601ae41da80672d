//! Flat text buffer with a single byte-offset cursor.
//!
//! Lines are never materialized: a line is the run of text between two `\n`
//! separators (or the buffer edges) and is recomputed from the text and the
//! cursor whenever an operation needs it. A buffer that ends in `\n` therefore
//! has a final, empty line.

use std::ops::Range;

/// The text under edit plus the cursor.
///
/// The cursor is a byte offset that always sits on a `char` boundary and is
/// never greater than the text length. All mutation goes through
/// [`LineBuffer::insert`] and [`LineBuffer::delete`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    text: String,
    cursor: usize,
}

impl LineBuffer {
    /// Create an empty buffer with the cursor at 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer holding `text` with the cursor at offset 0
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            cursor: 0,
        }
    }

    /// Create a buffer holding `text` with the cursor at `cursor` (clamped)
    pub fn with_cursor(text: impl Into<String>, cursor: usize) -> Self {
        let mut buffer = Self::from_text(text);
        buffer.set_cursor(cursor);
        buffer
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Move the cursor, clamping to the buffer length and snapping back to the
    /// nearest `char` boundary.
    pub fn set_cursor(&mut self, position: usize) {
        let mut position = position.min(self.text.len());
        while !self.text.is_char_boundary(position) {
            position -= 1;
        }
        self.cursor = position;
    }

    /// Insert `text` at `position` and leave the cursor just after it.
    pub fn insert(&mut self, position: usize, text: &str) {
        let position = self.snap(position);
        self.text.insert_str(position, text);
        self.cursor = position + text.len();
    }

    /// Insert `text` at the cursor.
    pub fn insert_at_cursor(&mut self, text: &str) {
        self.insert(self.cursor, text);
    }

    /// Remove `range` from the text and return the removed slice.
    ///
    /// The cursor is left at `range.start`. An empty range removes nothing.
    pub fn delete(&mut self, range: Range<usize>) -> String {
        let start = self.snap(range.start);
        let end = self.snap(range.end.max(start));
        let removed: String = self.text.drain(start..end).collect();
        self.cursor = start;
        removed
    }

    /// Replace the whole text, moving the cursor to the new end.
    pub fn replace_all(&mut self, text: String) {
        self.text = text;
        self.cursor = self.text.len();
    }

    /// Consume the buffer, returning the text
    pub fn into_text(self) -> String {
        self.text
    }

    fn snap(&self, position: usize) -> usize {
        let mut position = position.min(self.text.len());
        while !self.text.is_char_boundary(position) {
            position -= 1;
        }
        position
    }
}

/// Character immediately before `pos`, if any.
pub fn char_before(text: &str, pos: usize) -> Option<char> {
    text[..pos].chars().next_back()
}

/// Character starting at `pos`, if any.
pub fn char_at(text: &str, pos: usize) -> Option<char> {
    text[pos..].chars().next()
}
