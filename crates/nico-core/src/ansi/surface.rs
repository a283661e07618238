//! Display surface the interpreter draws on

use super::attrs::{Attributes, Color};

/// Portion of the cursor's line to erase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineErase {
    /// From the cursor to the end of the line, cursor cell included
    ToEnd,
    /// From column 0 up to, but not including, the cursor cell
    ToCursor,
    /// The whole line
    All,
}

/// Portion of the screen to erase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayErase {
    /// From the cursor to the end of the screen
    ToEnd,
    /// Everything
    All,
}

/// A fixed-size character grid with a cursor
///
/// Erase, scroll and insert/delete operations never move the cursor.
/// Coordinates are 0-based `(row, col)`.
pub trait Surface {
    /// Grid size as `(rows, cols)`
    fn bounds(&self) -> (usize, usize);

    /// Current cursor position
    fn cursor(&self) -> (usize, usize);

    /// Move the cursor; callers pass in-bounds positions
    fn move_cursor(&mut self, row: usize, col: usize);

    /// Write a character with the current pen and advance the cursor,
    /// wrapping at the right margin and scrolling at the bottom
    fn write_char(&mut self, ch: char);

    /// Erase part of the cursor's line
    fn erase_line(&mut self, erase: LineErase);

    /// Erase part of the screen
    fn erase_display(&mut self, erase: DisplayErase);

    /// Scroll contents up (positive) or down (negative) by `lines`
    fn scroll(&mut self, lines: isize);

    /// Insert `n` blank lines at the cursor row
    fn insert_lines(&mut self, n: usize);

    /// Delete `n` lines at the cursor row
    fn delete_lines(&mut self, n: usize);

    /// Insert one blank character at the cursor
    fn insert_char(&mut self);

    /// Delete the character at the cursor
    fn delete_char(&mut self);

    /// Turn attributes on
    fn set_attributes(&mut self, attrs: Attributes);

    /// Turn attributes off
    fn clear_attributes(&mut self, attrs: Attributes);

    /// Set the colours used for subsequent writes
    fn set_colors(&mut self, fg: Color, bg: Color);

    /// Ring the bell
    fn bell(&mut self);
}
