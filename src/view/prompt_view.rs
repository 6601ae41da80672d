//! Full redraw of the prompt buffer
//!
//! The prompt occupies the rows from where it started (the origin) down to
//! the end of the text. Every redraw moves back to the origin, clears to the
//! end of the screen and repaints the whole buffer, wrapping at the terminal
//! width by display cell count.

use crate::model::buffer::LineBuffer;
use crossterm::{
    cursor::{MoveDown, MoveToColumn, MoveUp},
    terminal::{Clear, ClearType},
    QueueableCommand,
};
use std::io::{self, Write};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Tab stops every this many cells
pub const TAB_WIDTH: usize = 8;

/// Screen cell position relative to the prompt origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellPosition {
    pub row: usize,
    pub col: usize,
}

/// Output of laying the buffer out for a given width
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Painted {
    /// Bytes to write at the origin
    pub output: String,
    /// Where the terminal cursor is after writing `output`
    pub end: CellPosition,
    /// Where the buffer cursor is displayed
    pub cursor: CellPosition,
}

/// Lay out `text` from column 0 of the origin row.
pub fn paint(text: &str, cursor: usize, width: usize) -> Painted {
    let width = width.max(1);
    let mut output = String::with_capacity(text.len());
    let mut pos = CellPosition::default();
    let mut cursor_cell = None;

    for (idx, grapheme) in text.grapheme_indices(true) {
        // a cursor inside a cluster is shown on the cluster
        let holds_cursor = (idx..idx + grapheme.len()).contains(&cursor);
        if grapheme == "\n" || grapheme == "\r\n" {
            if holds_cursor {
                cursor_cell = Some(pos);
            }
            output.push_str("\r\n");
            pos = CellPosition {
                row: pos.row + 1,
                col: 0,
            };
            continue;
        }

        let (shown, cells) = display_form(grapheme, pos.col, width);
        if cells > 0 && pos.col + cells > width {
            output.push_str("\r\n");
            pos = CellPosition {
                row: pos.row + 1,
                col: 0,
            };
        }
        if holds_cursor {
            cursor_cell = Some(pos);
        }
        output.push_str(&shown);
        pos.col += cells;
        wrap_if_full(&mut output, &mut pos, width);
    }

    let cursor = cursor_cell.unwrap_or(pos);
    Painted {
        output,
        end: pos,
        cursor,
    }
}

/// A full row leaves the terminal in its pending-wrap state; move to the next
/// row explicitly so the tracked position always matches the terminal.
fn wrap_if_full(output: &mut String, pos: &mut CellPosition, width: usize) {
    if pos.col >= width {
        output.push_str("\r\n");
        *pos = CellPosition {
            row: pos.row + 1,
            col: 0,
        };
    }
}

/// How a grapheme is drawn and how many cells it takes at column `col`.
fn display_form(grapheme: &str, col: usize, width: usize) -> (String, usize) {
    if grapheme == "\t" {
        let cells = (TAB_WIDTH - col % TAB_WIDTH).min(width - col.min(width)).max(1);
        return (" ".repeat(cells), cells);
    }
    let mut chars = grapheme.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_control() {
            let caret = char::from_u32((c as u32) ^ 0x40).unwrap_or('?');
            return (format!("^{caret}"), 2);
        }
    }
    (grapheme.to_string(), grapheme.width())
}

/// Redraws the prompt and remembers where it left the cursor.
#[derive(Debug, Default)]
pub struct PromptView {
    /// Rows between the origin and the terminal cursor after the last draw
    cursor_row: usize,
    /// Rows between the origin and the end of the text after the last draw
    end_row: usize,
}

impl PromptView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repaint the whole buffer for a terminal `width` cells wide
    pub fn render(&mut self, out: &mut dyn Write, buffer: &LineBuffer, width: u16) -> io::Result<()> {
        let painted = paint(buffer.text(), buffer.cursor(), usize::from(width));

        self.move_to_origin(out)?;
        out.queue(Clear(ClearType::FromCursorDown))?;
        out.write_all(painted.output.as_bytes())?;

        let rows_up = painted.end.row - painted.cursor.row;
        if rows_up > 0 {
            out.queue(MoveUp(clamp_u16(rows_up)))?;
        }
        out.queue(MoveToColumn(clamp_u16(painted.cursor.col)))?;
        out.flush()?;

        self.cursor_row = painted.cursor.row;
        self.end_row = painted.end.row;
        Ok(())
    }

    /// Leave the terminal cursor on a fresh line below the text
    pub fn finish(&mut self, out: &mut dyn Write) -> io::Result<()> {
        let rows_down = self.end_row - self.cursor_row;
        if rows_down > 0 {
            out.queue(MoveDown(clamp_u16(rows_down)))?;
        }
        out.write_all(b"\r\n")?;
        out.flush()?;
        self.cursor_row = 0;
        self.end_row = 0;
        Ok(())
    }

    /// Audible bell
    pub fn bell(&self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(b"\x07")?;
        out.flush()
    }

    fn move_to_origin(&self, out: &mut dyn Write) -> io::Result<()> {
        if self.cursor_row > 0 {
            out.queue(MoveUp(clamp_u16(self.cursor_row)))?;
        }
        out.queue(MoveToColumn(0))?;
        Ok(())
    }
}

fn clamp_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}
