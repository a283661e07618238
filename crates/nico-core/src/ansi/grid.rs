//! In-memory character grid

use super::attrs::{Attributes, Color, Pen};
use super::surface::{DisplayErase, LineErase, Surface};

/// One character cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Character shown in the cell
    pub ch: char,
    /// Pen the character was drawn with
    pub pen: Pen,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            pen: Pen::default(),
        }
    }
}

/// A fixed-size screen of [`Cell`]s with a cursor and a current pen
///
/// Writing past the right margin wraps to the next line and writing past
/// the bottom line scrolls the contents up.
#[derive(Debug, Clone)]
pub struct Grid {
    lines: Vec<Vec<Cell>>,
    cols: usize,
    row: usize,
    col: usize,
    pen: Pen,
    bells: usize,
}

impl Grid {
    /// Create a blank grid; both dimensions are at least 1
    pub fn new(rows: usize, cols: usize) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        Self {
            lines: vec![vec![Cell::default(); cols]; rows],
            cols,
            row: 0,
            col: 0,
            pen: Pen::default(),
            bells: 0,
        }
    }

    /// Change the grid size, keeping the top-left contents
    pub fn resize(&mut self, rows: usize, cols: usize) {
        let rows = rows.max(1);
        let cols = cols.max(1);
        for line in &mut self.lines {
            line.resize(cols, Cell::default());
        }
        self.lines.resize(rows, vec![Cell::default(); cols]);
        self.cols = cols;
        self.row = self.row.min(rows - 1);
        self.col = self.col.min(cols - 1);
    }

    /// Cell at `(row, col)`
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.lines.get(row).and_then(|line| line.get(col))
    }

    /// All cells of one line
    pub fn line(&self, row: usize) -> Option<&[Cell]> {
        self.lines.get(row).map(Vec::as_slice)
    }

    /// Characters of one line, including trailing blanks
    pub fn row_text(&self, row: usize) -> String {
        self.line(row)
            .map(|line| line.iter().map(|cell| cell.ch).collect())
            .unwrap_or_default()
    }

    /// Pen used for subsequent writes
    pub fn pen(&self) -> Pen {
        self.pen
    }

    /// Number of bells rung since the last call, resetting the count
    pub fn take_bells(&mut self) -> usize {
        std::mem::take(&mut self.bells)
    }

    fn rows(&self) -> usize {
        self.lines.len()
    }

    fn blank_line(&self) -> Vec<Cell> {
        vec![Cell::default(); self.cols]
    }
}

impl Surface for Grid {
    fn bounds(&self) -> (usize, usize) {
        (self.rows(), self.cols)
    }

    fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    fn move_cursor(&mut self, row: usize, col: usize) {
        self.row = row.min(self.rows() - 1);
        self.col = col.min(self.cols - 1);
    }

    fn write_char(&mut self, ch: char) {
        let pen = self.pen;
        self.lines[self.row][self.col] = Cell { ch, pen };
        self.col += 1;
        if self.col >= self.cols {
            self.col = 0;
            if self.row + 1 >= self.rows() {
                self.scroll(1);
            } else {
                self.row += 1;
            }
        }
    }

    fn erase_line(&mut self, erase: LineErase) {
        let col = self.col;
        let line = &mut self.lines[self.row];
        let range = match erase {
            LineErase::ToEnd => col..line.len(),
            LineErase::ToCursor => 0..col,
            LineErase::All => 0..line.len(),
        };
        line[range].fill(Cell::default());
    }

    fn erase_display(&mut self, erase: DisplayErase) {
        let first = match erase {
            DisplayErase::ToEnd => {
                self.erase_line(LineErase::ToEnd);
                self.row + 1
            }
            DisplayErase::All => 0,
        };
        for line in &mut self.lines[first..] {
            line.fill(Cell::default());
        }
    }

    fn scroll(&mut self, lines: isize) {
        let rows = self.rows();
        let n = lines.unsigned_abs().min(rows);
        if n == 0 {
            return;
        }
        if lines > 0 {
            self.lines.drain(..n);
            for _ in 0..n {
                let blank = self.blank_line();
                self.lines.push(blank);
            }
        } else {
            self.lines.truncate(rows - n);
            for _ in 0..n {
                let blank = self.blank_line();
                self.lines.insert(0, blank);
            }
        }
    }

    fn insert_lines(&mut self, n: usize) {
        let rows = self.rows();
        let n = n.min(rows - self.row);
        self.lines.truncate(rows - n);
        for _ in 0..n {
            let blank = self.blank_line();
            self.lines.insert(self.row, blank);
        }
    }

    fn delete_lines(&mut self, n: usize) {
        let n = n.min(self.rows() - self.row);
        self.lines.drain(self.row..self.row + n);
        for _ in 0..n {
            let blank = self.blank_line();
            self.lines.push(blank);
        }
    }

    fn insert_char(&mut self) {
        let line = &mut self.lines[self.row];
        line.pop();
        line.insert(self.col, Cell::default());
    }

    fn delete_char(&mut self) {
        let line = &mut self.lines[self.row];
        line.remove(self.col);
        line.push(Cell::default());
    }

    fn set_attributes(&mut self, attrs: Attributes) {
        self.pen.attrs.insert(attrs);
    }

    fn clear_attributes(&mut self, attrs: Attributes) {
        self.pen.attrs.remove(attrs);
    }

    fn set_colors(&mut self, fg: Color, bg: Color) {
        self.pen.fg = fg;
        self.pen.bg = bg;
    }

    fn bell(&mut self) {
        self.bells += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_str(grid: &mut Grid, s: &str) {
        for ch in s.chars() {
            grid.write_char(ch);
        }
    }

    #[test]
    fn test_write_advances_cursor() {
        let mut grid = Grid::new(3, 10);
        write_str(&mut grid, "abc");
        assert_eq!(grid.cursor(), (0, 3));
        assert_eq!(grid.row_text(0), "abc       ");
    }

    #[test]
    fn test_write_wraps_at_margin() {
        let mut grid = Grid::new(3, 4);
        write_str(&mut grid, "abcdef");
        assert_eq!(grid.row_text(0), "abcd");
        assert_eq!(grid.row_text(1), "ef  ");
        assert_eq!(grid.cursor(), (1, 2));
    }

    #[test]
    fn test_write_scrolls_at_bottom() {
        let mut grid = Grid::new(2, 2);
        write_str(&mut grid, "abcde");
        assert_eq!(grid.row_text(0), "cd");
        assert_eq!(grid.row_text(1), "e ");
        assert_eq!(grid.cursor(), (1, 1));
    }

    #[test]
    fn test_erase_line_variants() {
        let mut grid = Grid::new(1, 8);
        write_str(&mut grid, "abcdefg");
        grid.move_cursor(0, 3);
        grid.erase_line(LineErase::ToCursor);
        assert_eq!(grid.row_text(0), "   defg ");
        grid.erase_line(LineErase::ToEnd);
        assert_eq!(grid.row_text(0), "        ");
        assert_eq!(grid.cursor(), (0, 3));
    }

    #[test]
    fn test_erase_display_to_end() {
        let mut grid = Grid::new(3, 3);
        write_str(&mut grid, "abcdefgh");
        grid.move_cursor(1, 1);
        grid.erase_display(DisplayErase::ToEnd);
        assert_eq!(grid.row_text(0), "abc");
        assert_eq!(grid.row_text(1), "d  ");
        assert_eq!(grid.row_text(2), "   ");
    }

    #[test]
    fn test_scroll_both_directions() {
        let mut grid = Grid::new(3, 1);
        write_str(&mut grid, "ab");
        grid.move_cursor(2, 0);
        grid.write_char('c');
        assert_eq!(grid.row_text(0), "b");
        assert_eq!(grid.row_text(1), "c");

        grid.scroll(-1);
        assert_eq!(grid.row_text(0), " ");
        assert_eq!(grid.row_text(1), "b");
        assert_eq!(grid.row_text(2), "c");

        grid.scroll(2);
        assert_eq!(grid.row_text(0), "c");
        assert_eq!(grid.row_text(1), " ");

        grid.scroll(100);
        assert_eq!(grid.row_text(0), " ");
    }

    #[test]
    fn test_insert_and_delete_lines() {
        let mut grid = Grid::new(4, 2);
        for (row, ch) in "abcd".chars().enumerate() {
            grid.move_cursor(row, 0);
            grid.write_char(ch);
        }
        grid.move_cursor(1, 0);
        grid.insert_lines(2);
        let text: Vec<String> = (0..4).map(|r| grid.row_text(r)).collect();
        assert_eq!(text, ["a ", "  ", "  ", "b "]);

        grid.delete_lines(2);
        let text: Vec<String> = (0..4).map(|r| grid.row_text(r)).collect();
        assert_eq!(text, ["a ", "b ", "  ", "  "]);
        assert_eq!(grid.cursor(), (1, 0));
    }

    #[test]
    fn test_insert_and_delete_chars() {
        let mut grid = Grid::new(1, 6);
        write_str(&mut grid, "abcde");
        grid.move_cursor(0, 1);
        grid.insert_char();
        assert_eq!(grid.row_text(0), "a bcde");
        grid.delete_char();
        grid.delete_char();
        assert_eq!(grid.row_text(0), "acde  ");
    }

    #[test]
    fn test_pen_is_applied_to_writes() {
        let mut grid = Grid::new(1, 4);
        grid.set_attributes(Attributes::BOLD | Attributes::UNDERLINE);
        grid.set_colors(Color::Red, Color::Blue);
        grid.write_char('x');
        grid.clear_attributes(Attributes::UNDERLINE);
        grid.write_char('y');

        let x = grid.cell(0, 0).unwrap();
        assert_eq!(x.pen.attrs, Attributes::BOLD | Attributes::UNDERLINE);
        assert_eq!(x.pen.fg, Color::Red);
        assert_eq!(x.pen.bg, Color::Blue);
        assert_eq!(grid.cell(0, 1).unwrap().pen.attrs, Attributes::BOLD);
    }

    #[test]
    fn test_resize_keeps_contents() {
        let mut grid = Grid::new(2, 4);
        write_str(&mut grid, "abcdef");
        grid.resize(3, 2);
        assert_eq!(grid.bounds(), (3, 2));
        assert_eq!(grid.row_text(0), "ab");
        assert_eq!(grid.row_text(1), "ef");
        assert_eq!(grid.cursor(), (1, 1));
    }

    #[test]
    fn test_bells_are_counted() {
        let mut grid = Grid::new(1, 1);
        grid.bell();
        grid.bell();
        assert_eq!(grid.take_bells(), 2);
        assert_eq!(grid.take_bells(), 0);
    }
}
