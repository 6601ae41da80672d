//! Low-level primitives and utilities
//!
//! Pure text algorithms over a buffer and cursor: line navigation, line
//! edits and grapheme boundaries.

pub mod grapheme;
pub mod line_edit;
pub mod line_navigation;
