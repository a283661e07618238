//! Terminal layout and rendering

use std::io::{self, Stdout, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{self, Attribute, Print, SetAttribute, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{
    self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use nico_core::ansi::{Attributes, Cell, Color, Grid, Pen, Surface};

use super::{App, Focus};

/// Console rows on a screen of at least 30 lines
const CONSOLE_ROWS: usize = 25;

/// Where each pane sits on the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Screen width
    pub cols: usize,
    /// Height of the console pane, starting at row 0
    pub console_rows: usize,
    /// Row of the divider line
    pub divider: usize,
    /// First row of the debug pane
    pub debug_top: usize,
    /// Height of the debug pane
    pub debug_rows: usize,
    /// Row of the command line
    pub command_row: usize,
}

impl Layout {
    /// Split a `rows` x `cols` screen
    ///
    /// The console gets 25 rows, or all but five on small screens.
    pub fn new(rows: u16, cols: u16) -> Self {
        let rows = rows as usize;
        let console_rows = if rows < CONSOLE_ROWS + 5 {
            rows.saturating_sub(5).max(1)
        } else {
            CONSOLE_ROWS
        };
        Self {
            cols: (cols as usize).max(1),
            console_rows,
            divider: console_rows,
            debug_top: console_rows + 1,
            debug_rows: rows.saturating_sub(console_rows + 2).max(1),
            command_row: rows.saturating_sub(1).max(console_rows + 2),
        }
    }
}

/// Map a pane colour to the host terminal's
fn term_color(color: Color) -> style::Color {
    match color {
        Color::Black => style::Color::Black,
        Color::Red => style::Color::DarkRed,
        Color::Green => style::Color::DarkGreen,
        Color::Yellow => style::Color::DarkYellow,
        Color::Blue => style::Color::DarkBlue,
        Color::Magenta => style::Color::DarkMagenta,
        Color::Cyan => style::Color::DarkCyan,
        Color::White => style::Color::Grey,
        Color::Default => style::Color::Reset,
    }
}

/// DEC special graphics for the alternate character set
fn line_drawing(ch: char) -> char {
    match ch {
        'j' => '┘',
        'k' => '┐',
        'l' => '┌',
        'm' => '└',
        'n' => '┼',
        'q' => '─',
        't' => '├',
        'u' => '┤',
        'v' => '┴',
        'w' => '┬',
        'x' => '│',
        'a' => '▒',
        '`' => '◆',
        'f' => '°',
        'g' => '±',
        '~' => '·',
        other => other,
    }
}

/// What actually gets printed for a cell
fn glyph(cell: &Cell) -> char {
    let ch = cell.ch;
    if cell.pen.attrs.contains(Attributes::ALT_CHARSET) {
        return line_drawing(ch);
    }
    match ch as u32 {
        // Control pictures keep raw control bytes off the host terminal
        c @ 0x00..=0x1F => char::from_u32(0x2400 + c).unwrap_or('?'),
        0x7F => '\u{2421}',
        0x80..=0x9F => '?',
        _ => ch,
    }
}

/// Owns the host terminal while the UI runs
pub struct Screen {
    out: Stdout,
}

impl Screen {
    /// Switch the terminal to raw mode on the alternate screen
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen, Clear(ClearType::All))?;
        Ok(Self { out })
    }

    /// Current terminal size as (columns, rows)
    pub fn size() -> io::Result<(u16, u16)> {
        terminal::size()
    }

    /// Redraw everything
    pub fn draw(&mut self, app: &mut App) -> io::Result<()> {
        let layout = app.layout();
        queue!(self.out, Hide)?;

        self.draw_grid(app.console(), 0)?;
        queue!(
            self.out,
            MoveTo(0, layout.divider as u16),
            SetAttribute(Attribute::Reset),
            Print("─".repeat(layout.cols))
        )?;
        self.draw_grid(app.debug_grid(), layout.debug_top)?;

        let (text, cursor) = app.command().view(layout.cols);
        queue!(
            self.out,
            MoveTo(0, layout.command_row as u16),
            SetAttribute(Attribute::Reset),
            Print(text),
            Clear(ClearType::UntilNewLine)
        )?;

        if app.prefix_pending() {
            let label = "Command?";
            let col = layout.cols.saturating_sub(label.len());
            queue!(
                self.out,
                MoveTo(col as u16, 0),
                SetAttribute(Attribute::Reverse),
                Print(label),
                SetAttribute(Attribute::Reset)
            )?;
        }

        if app.take_bell() {
            queue!(self.out, Print('\x07'))?;
        }

        let (row, col) = match app.focus() {
            Focus::Console => app.console().cursor(),
            Focus::Command => (layout.command_row, cursor),
        };
        queue!(self.out, MoveTo(col as u16, row as u16), Show)?;
        self.out.flush()
    }

    fn draw_grid(&mut self, grid: &Grid, top: usize) -> io::Result<()> {
        let (rows, _) = grid.bounds();
        for row in 0..rows {
            let Some(line) = grid.line(row) else {
                continue;
            };
            queue!(self.out, MoveTo(0, (top + row) as u16))?;
            let mut current: Option<Pen> = None;
            for cell in line {
                if current != Some(cell.pen) {
                    self.set_pen(cell.pen)?;
                    current = Some(cell.pen);
                }
                queue!(self.out, Print(glyph(cell)))?;
            }
        }
        queue!(self.out, SetAttribute(Attribute::Reset))
    }

    fn set_pen(&mut self, pen: Pen) -> io::Result<()> {
        queue!(self.out, SetAttribute(Attribute::Reset))?;
        let attributes = [
            (Attributes::BOLD, Attribute::Bold),
            (Attributes::DIM, Attribute::Dim),
            (Attributes::UNDERLINE, Attribute::Underlined),
            (Attributes::BLINK, Attribute::SlowBlink),
            (Attributes::REVERSE, Attribute::Reverse),
            (Attributes::CONCEAL, Attribute::Hidden),
        ];
        for (flag, attribute) in attributes {
            if pen.attrs.contains(flag) {
                queue!(self.out, SetAttribute(attribute))?;
            }
        }
        queue!(
            self.out,
            SetForegroundColor(term_color(pen.fg)),
            SetBackgroundColor(term_color(pen.bg))
        )
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let _ = execute!(
            self.out,
            SetAttribute(Attribute::Reset),
            Show,
            LeaveAlternateScreen
        );
        let _ = disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_large_screen() {
        let layout = Layout::new(40, 80);
        assert_eq!(layout.console_rows, 25);
        assert_eq!(layout.divider, 25);
        assert_eq!(layout.debug_top, 26);
        assert_eq!(layout.debug_rows, 13);
        assert_eq!(layout.command_row, 39);
    }

    #[test]
    fn test_layout_small_screen() {
        let layout = Layout::new(24, 80);
        assert_eq!(layout.console_rows, 19);
        assert_eq!(layout.debug_top, 20);
        assert_eq!(layout.debug_rows, 3);
        assert_eq!(layout.command_row, 23);
    }

    #[test]
    fn test_glyphs() {
        let mut cell = Cell {
            ch: 'q',
            pen: Pen::default(),
        };
        assert_eq!(glyph(&cell), 'q');
        cell.pen.attrs = Attributes::ALT_CHARSET;
        assert_eq!(glyph(&cell), '─');

        let esc = Cell {
            ch: '\x1b',
            pen: Pen::default(),
        };
        assert_eq!(glyph(&esc), '\u{241B}');
    }

    #[test]
    fn test_colors() {
        assert_eq!(term_color(Color::Red), style::Color::DarkRed);
        assert_eq!(term_color(Color::Default), style::Color::Reset);
    }
}
