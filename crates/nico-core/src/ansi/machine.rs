//! The VT100 parser state machine

use log::trace;

use super::attrs::{Attributes, Color};
use super::params::{Params, MAX_PARAMS};
use super::sgr::Sgr;
use super::surface::{DisplayErase, LineErase, Surface};

const BEL: u8 = 0x07;
const BS: u8 = 0x08;
const HT: u8 = 0x09;
const LF: u8 = 0x0A;
const VT: u8 = 0x0B;
const FF: u8 = 0x0C;
const CR: u8 = 0x0D;
const ESC: u8 = 0x1B;

/// Parser state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Plain text and C0 controls
    #[default]
    Ground,
    /// An ESC byte was received
    EscapeSeen,
    /// Inside `ESC [`, collecting parameters
    ParsingParameters,
}

/// Sink for bytes the terminal sends back to the remote side
pub trait Responder {
    /// Queue `bytes` for transmission to the sender of the stream
    fn respond(&mut self, bytes: &[u8]);
}

impl Responder for Vec<u8> {
    fn respond(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

/// VT100/ANSI interpreter
///
/// Feed it the console byte stream one byte at a time, in arrival order.
/// Visible effects go to the [`Surface`]; status reports go to the
/// [`Responder`].
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    mode: Mode,
    params: Params,
    fg: Color,
    bg: Color,
    saved: (usize, usize),
}

/// Move `pos` by `delta` and clamp the result to `0..len`
fn offset(pos: usize, delta: i64, len: usize) -> usize {
    let max = len.saturating_sub(1) as i64;
    (pos as i64).saturating_add(delta).clamp(0, max) as usize
}

impl Interpreter {
    /// Create an interpreter in the ground state with default colours
    pub fn new() -> Self {
        Self::default()
    }

    /// Current parser state
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current foreground and background colours
    pub fn colors(&self) -> (Color, Color) {
        (self.fg, self.bg)
    }

    /// Process one byte of the console stream
    pub fn feed<S, R>(&mut self, byte: u8, surface: &mut S, responder: &mut R)
    where
        S: Surface + ?Sized,
        R: Responder + ?Sized,
    {
        match self.mode {
            Mode::Ground => self.ground(byte, surface),
            Mode::EscapeSeen => self.escape(byte, surface),
            Mode::ParsingParameters => match byte {
                b'0'..=b'9' => self.params.push_digit(byte - b'0'),
                b';' => self.params.terminate(),
                _ => {
                    if self.params.has_pending() {
                        self.params.terminate();
                    }
                    self.mode = Mode::Ground;
                    if self.params.dropped() > 0 {
                        trace!(
                            "CSI {:?}: {} parameter(s) beyond {} dropped",
                            byte as char,
                            self.params.dropped(),
                            MAX_PARAMS
                        );
                    }
                    self.dispatch(byte, surface, responder);
                }
            },
        }
    }

    /// Feed a whole buffer
    pub fn feed_all<S, R>(&mut self, bytes: &[u8], surface: &mut S, responder: &mut R)
    where
        S: Surface + ?Sized,
        R: Responder + ?Sized,
    {
        for &byte in bytes {
            self.feed(byte, surface, responder);
        }
    }

    fn ground<S: Surface + ?Sized>(&mut self, byte: u8, surface: &mut S) {
        let (rows, cols) = surface.bounds();
        let (row, col) = surface.cursor();
        match byte {
            BEL => surface.bell(),
            BS => surface.move_cursor(row, offset(col, -1, cols)),
            HT => surface.move_cursor(row, ((col + 8) & !7).min(cols - 1)),
            LF => {
                if row + 1 >= rows {
                    surface.scroll(1);
                } else {
                    surface.move_cursor(row + 1, col);
                }
            }
            VT => surface.move_cursor(offset(row, -1, rows), col),
            FF => {
                surface.erase_display(DisplayErase::All);
                surface.move_cursor(0, 0);
            }
            CR => surface.move_cursor(row, 0),
            ESC => self.mode = Mode::EscapeSeen,
            _ => surface.write_char(byte as char),
        }
    }

    fn escape<S: Surface + ?Sized>(&mut self, byte: u8, surface: &mut S) {
        match byte {
            b'[' => {
                self.params.clear();
                self.mode = Mode::ParsingParameters;
            }
            b'c' => {
                trace!("terminal reset");
                self.mode = Mode::Ground;
                self.reset_rendition(surface);
                surface.erase_display(DisplayErase::All);
                surface.move_cursor(0, 0);
            }
            _ => {
                self.mode = Mode::Ground;
                surface.write_char(ESC as char);
                surface.write_char(byte as char);
            }
        }
    }

    fn reset_rendition<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        surface.clear_attributes(Attributes::all());
        self.fg = Color::Default;
        self.bg = Color::Default;
        surface.set_colors(self.fg, self.bg);
    }

    fn dispatch<S, R>(&mut self, command: u8, surface: &mut S, responder: &mut R)
    where
        S: Surface + ?Sized,
        R: Responder + ?Sized,
    {
        let (rows, cols) = surface.bounds();
        let (row, col) = surface.cursor();

        let defaults: &[u32] = match command {
            b'A'..=b'G' | b'L' | b'M' | b'P' | b'@' | b'S' | b'T' => &[1],
            b'H' | b'f' => &[1, 1],
            b'J' | b'K' => &[0],
            b'n' => &[6],
            _ => &[],
        };
        self.params.fill_defaults(defaults);
        let n = self.params.get(0) as i64;

        match command {
            b'A' => surface.move_cursor(offset(row, -n, rows), col),
            b'B' => surface.move_cursor(offset(row, n, rows), col),
            b'C' => surface.move_cursor(row, offset(col, n, cols)),
            b'D' => surface.move_cursor(row, offset(col, -n, cols)),
            b'E' => surface.move_cursor(offset(row, n, rows), 0),
            b'F' => surface.move_cursor(offset(row, -n, rows), 0),
            b'G' => surface.move_cursor(row, offset(0, n - 1, cols)),
            b'H' | b'f' => {
                let m = self.params.get(1) as i64;
                surface.move_cursor(offset(0, n - 1, rows), offset(0, m - 1, cols));
            }
            b'J' => match n {
                0 => surface.erase_display(DisplayErase::ToEnd),
                1 => {
                    for r in 0..row {
                        surface.move_cursor(r, 0);
                        surface.erase_line(LineErase::All);
                    }
                    surface.move_cursor(row, col);
                    surface.erase_line(LineErase::ToCursor);
                }
                2 | 3 => surface.erase_display(DisplayErase::All),
                _ => {}
            },
            b'K' => match n {
                0 => surface.erase_line(LineErase::ToEnd),
                1 => surface.erase_line(LineErase::ToCursor),
                2 => surface.erase_line(LineErase::All),
                _ => {}
            },
            b'L' => surface.insert_lines((n as usize).min(rows)),
            b'M' => surface.delete_lines((n as usize).min(rows)),
            b'P' => {
                for _ in 0..(n as usize).min(cols) {
                    surface.delete_char();
                }
            }
            b'@' => {
                for _ in 0..(n as usize).min(cols) {
                    surface.insert_char();
                }
            }
            b'S' => surface.scroll((n as usize).min(rows) as isize),
            b'T' => surface.scroll(-((n as usize).min(rows) as isize)),
            b'm' => self.select_rendition(surface),
            b'n' => match n {
                5 => responder.respond(b"\x1b[0n"),
                6 => {
                    let report = format!("\x1b[{};{}R", row + 1, col + 1);
                    responder.respond(report.as_bytes());
                }
                _ => {}
            },
            b'p' => surface.clear_attributes(Attributes::REVERSE),
            b'q' => surface.set_attributes(Attributes::REVERSE),
            b's' => self.saved = (row, col),
            b'u' => {
                let (r, c) = self.saved;
                surface.move_cursor(r.min(rows - 1), c.min(cols - 1));
            }
            _ => trace!("ignoring CSI command {:?}", command as char),
        }
    }

    fn select_rendition<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        let values: heapless::Vec<u32, MAX_PARAMS> = self.params.given().collect();
        for value in values {
            match Sgr::decode(value) {
                Some(Sgr::Reset) => self.reset_rendition(surface),
                Some(Sgr::Set(attrs)) => surface.set_attributes(attrs),
                Some(Sgr::Clear(attrs)) => surface.clear_attributes(attrs),
                Some(Sgr::Foreground(color)) => {
                    self.fg = color;
                    surface.set_colors(self.fg, self.bg);
                }
                Some(Sgr::Background(color)) => {
                    self.bg = color;
                    surface.set_colors(self.fg, self.bg);
                }
                None => trace!("ignoring SGR {}", value),
            }
        }
    }
}
