//! Line-oriented kills and inserts
//!
//! Each operation works out a span or an insertion point from the buffer and
//! its cursor, applies it through [`LineBuffer::delete`] or
//! [`LineBuffer::insert`], repositions the cursor and reports the removed text
//! so the caller can keep it for yanking.

use crate::model::buffer::{char_at, char_before, LineBuffer};
use crate::primitives::line_navigation::{beginning_of_line, end_of_line};
use std::ops::Range;

/// Outcome of a mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Edit {
    /// Text removed by the operation, if any
    pub killed: Option<String>,
    /// True when the operation ran out of lines
    pub boundary: bool,
    /// True when a modal front end should switch to text insertion
    pub enter_insert: bool,
}

impl Edit {
    fn from_killed(text: String) -> Self {
        Self {
            killed: (!text.is_empty()).then_some(text),
            ..Self::default()
        }
    }
}

fn kill_range(buffer: &mut LineBuffer, range: Range<usize>) -> Edit {
    if range.is_empty() {
        buffer.set_cursor(range.start);
        return Edit::default();
    }
    Edit::from_killed(buffer.delete(range))
}

/// Kill from the cursor to the end of the line, leaving the newline.
pub fn kill_to_end_of_line(buffer: &mut LineBuffer) -> Edit {
    let start = buffer.cursor();
    let end = end_of_line(buffer.text(), start);
    kill_range(buffer, start..end)
}

/// Kill from the start of the line up to the cursor.
pub fn kill_to_beginning_of_line(buffer: &mut LineBuffer) -> Edit {
    let end = buffer.cursor();
    let start = beginning_of_line(buffer.text(), end);
    kill_range(buffer, start..end)
}

/// Kill the whole current line, including its newline when it has one.
pub fn kill_whole_line(buffer: &mut LineBuffer) -> Edit {
    let text = buffer.text();
    let start = beginning_of_line(text, buffer.cursor());
    let mut end = end_of_line(text, buffer.cursor());
    if end < text.len() {
        end += 1;
    }
    kill_range(buffer, start..end)
}

/// Vi `dd`: delete `count` whole lines starting with the current one.
///
/// A final line without a trailing newline is consumed in full and counts as
/// one of the `count` lines.
pub fn vi_delete_lines(buffer: &mut LineBuffer, count: usize) -> Edit {
    let text = buffer.text();
    let start = beginning_of_line(text, buffer.cursor());
    let mut end = start;
    for _ in 0..count {
        end = end_of_line(text, end);
        if end >= text.len() {
            break;
        }
        end += 1;
    }
    kill_range(buffer, start..end)
}

/// Vi `D`: delete to the end of the line, plus `count - 1` further lines.
///
/// The newline ending the last deleted segment is kept.
pub fn vi_delete_to_end_of_line(buffer: &mut LineBuffer, count: usize) -> Edit {
    let text = buffer.text();
    let start = buffer.cursor();
    let mut end = start;
    for i in 0..count {
        end = end_of_line(text, end);
        if i + 1 < count && end < text.len() {
            end += 1;
        }
    }
    kill_range(buffer, start..end)
}

/// Vi `J`: join the current line with the next one, `count` times.
///
/// The newline and any leading spaces or tabs of the continuation are removed
/// and replaced by a single space, unless the join point already has a space
/// or newline on either side or sits at a buffer edge. The cursor returns to
/// where it started after every join.
pub fn join_lines(buffer: &mut LineBuffer, count: usize) -> Edit {
    let origin = buffer.cursor();
    let mut edit = Edit::default();

    for _ in 0..count {
        let text = buffer.text();
        let newline = end_of_line(text, buffer.cursor());
        if newline >= text.len() {
            edit.boundary = true;
            break;
        }

        let indent = text[newline + 1..]
            .bytes()
            .take_while(|b| *b == b' ' || *b == b'\t')
            .count();
        buffer.delete(newline..newline + 1 + indent);

        let text = buffer.text();
        let needs_separator = match (char_before(text, newline), char_at(text, newline)) {
            (Some(before), Some(after)) => {
                before != ' ' && after != ' ' && before != '\n' && after != '\n'
            }
            _ => false,
        };
        if needs_separator {
            buffer.insert(newline, " ");
        }

        buffer.set_cursor(origin);
    }

    edit
}

/// Vi `o`: open an empty line below the current one.
pub fn insert_line_below(buffer: &mut LineBuffer) -> Edit {
    let end = end_of_line(buffer.text(), buffer.cursor());
    buffer.insert(end, "\n");
    Edit {
        enter_insert: true,
        ..Edit::default()
    }
}

/// Vi `O`: open an empty line above the current one.
pub fn insert_line_above(buffer: &mut LineBuffer) -> Edit {
    let start = beginning_of_line(buffer.text(), buffer.cursor());
    buffer.insert(start, "\n");
    buffer.set_cursor(start);
    Edit {
        enter_insert: true,
        ..Edit::default()
    }
}
