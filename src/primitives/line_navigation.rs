//! Line-relative cursor motion over a flat `\n`-separated buffer
//!
//! Every function here is pure: it takes the text and a cursor offset and
//! returns where the cursor should go. Nothing is cached; line bounds are
//! rescanned on each call, which is cheap at prompt sizes.
//!
//! Motions never fail. Running into the first or last line yields a
//! [`Motion`] with `boundary` set so the caller can ring the bell.
//!
//! Columns are counted in `char`s, not bytes, so moving between lines that
//! contain multi-byte text keeps the visual column for ordinary scripts.

use crate::model::buffer::char_at;

/// Result of a cursor motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Motion {
    /// New cursor offset
    pub position: usize,
    /// True when the motion ran out of lines before completing
    pub boundary: bool,
}

impl Motion {
    fn to(position: usize) -> Self {
        Self {
            position,
            boundary: false,
        }
    }

    fn blocked(position: usize) -> Self {
        Self {
            position,
            boundary: true,
        }
    }
}

/// Which line `goto_line` should land on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTarget {
    /// 1-based line number; 0 is treated as 1 and numbers past the end
    /// land on the last line
    Number(usize),
    /// The final line of the buffer
    Last,
}

/// Offset just after the nearest `\n` before `pos`, or 0.
pub fn beginning_of_line(text: &str, pos: usize) -> usize {
    text[..pos].rfind('\n').map_or(0, |i| i + 1)
}

/// Offset of the next `\n` at or after `pos`, or the buffer length.
pub fn end_of_line(text: &str, pos: usize) -> usize {
    text[pos..].find('\n').map_or(text.len(), |i| pos + i)
}

pub fn beginning_of_buffer(_text: &str) -> usize {
    0
}

pub fn end_of_buffer(text: &str) -> usize {
    text.len()
}

/// Column of `pos` within its line, in chars.
pub fn column(text: &str, pos: usize) -> usize {
    text[beginning_of_line(text, pos)..pos].chars().count()
}

/// Offset of `column` within the line `[line_start, line_end)`, clamped to the
/// line end.
fn offset_at_column(text: &str, line_start: usize, line_end: usize, column: usize) -> usize {
    text[line_start..line_end]
        .char_indices()
        .nth(column)
        .map_or(line_end, |(i, _)| line_start + i)
}

/// Move up `count` lines, keeping the column where the target line allows.
pub fn move_up(text: &str, pos: usize, count: usize) -> Motion {
    let mut pos = pos;
    for _ in 0..count {
        let line_start = beginning_of_line(text, pos);
        if line_start == 0 {
            return Motion::blocked(pos);
        }
        let col = column(text, pos);
        let prev_end = line_start - 1;
        let prev_start = beginning_of_line(text, prev_end);
        pos = offset_at_column(text, prev_start, prev_end, col);
    }
    Motion::to(pos)
}

/// Move down `count` lines, keeping the column where the target line allows.
pub fn move_down(text: &str, pos: usize, count: usize) -> Motion {
    let mut pos = pos;
    for _ in 0..count {
        let line_end = end_of_line(text, pos);
        if line_end >= text.len() {
            return Motion::blocked(pos);
        }
        let col = column(text, pos);
        let next_start = line_end + 1;
        let next_end = end_of_line(text, next_start);
        pos = offset_at_column(text, next_start, next_end, col);
    }
    Motion::to(pos)
}

/// First non-blank offset of the line starting at `line_start`.
///
/// Falls back to `line_start` when the line holds only blanks.
fn first_nonblank_from(text: &str, line_start: usize) -> usize {
    let mut pos = line_start;
    while let Some(c) = char_at(text, pos) {
        if c == '\n' {
            return line_start;
        }
        if !c.is_whitespace() {
            return pos;
        }
        pos += c.len_utf8();
    }
    line_start
}

/// First non-blank offset of the line containing `pos`.
pub fn first_nonblank_of_line(text: &str, pos: usize) -> usize {
    first_nonblank_from(text, beginning_of_line(text, pos))
}

/// Jump to the first non-blank character of a line counted from the top.
pub fn goto_line(text: &str, target: LineTarget) -> usize {
    let line_start = match target {
        LineTarget::Number(n) => text
            .match_indices('\n')
            .map(|(i, _)| i + 1)
            .take(n.max(1) - 1)
            .last()
            .unwrap_or(0),
        LineTarget::Last => text.rfind('\n').map_or(0, |i| i + 1),
    };
    first_nonblank_from(text, line_start)
}

/// Move to the first non-blank character of the following line, `count` times.
pub fn goto_first_nonblank_next_line(text: &str, pos: usize, count: usize) -> Motion {
    let mut pos = pos;
    for _ in 0..count {
        let line_end = end_of_line(text, pos);
        if line_end >= text.len() {
            return Motion::blocked(pos);
        }
        pos = first_nonblank_from(text, line_end + 1);
    }
    Motion::to(pos)
}
