//! Text user interface
//!
//! A single thread owns every pane: the console [`Grid`] with its ANSI
//! [`Interpreter`], the debug transcript and the command line. Other threads
//! reach the screen only through [`UiEvent`]s, so nothing here is shared.
//!
//! Keys:
//!
//! | Key | Action |
//! |-----|--------|
//! | F1 | help |
//! | F2, Alt+Tab | switch input between console and command line |
//! | F10 | quit |
//! | `^]` then tab/c/d/h/q | switch, clear console, clear debug, help, quit |
//! | `^]` `^]` | send a literal `^]` to the console |
//! | Alt+S, Alt+G, Alt+R, Alt+Space, Alt+\` | stop, cont, run, step, reset |

pub mod command_line;
mod events;
mod screen;

use std::io;
use std::sync::mpsc::{Receiver, Sender};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::debug;
use nico_core::ansi::{Attributes, Color, DisplayErase, Grid, Interpreter, LineErase, Surface};

use crate::console::ConsoleRequest;
use command_line::{route, CommandLine, Route};

pub use events::{spawn_input, UiEvent};
pub use screen::{Layout, Screen};

const HELP: [&str; 3] = [
    "Help: F1=help; F2 or alt+tab=swap console/debug; F10=quit, ^]=command",
    "  commands: tab=swap, [c]lear console, clear [d]ebug, [h]elp, [q]uit",
    "  alt+s=stop, alt+g=cont, alt+r=run, alt+space=step, alt+`=reset",
];

/// Which pane receives typed keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Keys go to the target's console
    Console,
    /// Keys edit the debug command line
    Command,
}

/// The debug transcript pane
pub struct DebugPane {
    grid: Grid,
}

impl DebugPane {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            grid: Grid::new(rows, cols),
        }
    }

    fn write(&mut self, text: &str) {
        self.grid.erase_line(LineErase::ToEnd);
        for ch in text.chars() {
            self.grid.write_char(ch);
        }
    }

    /// Append a full line
    pub fn line(&mut self, text: &str) {
        self.write(text);
        let (_, cols) = self.grid.bounds();
        let len = text.chars().count();
        // A line that exactly fills the pane has already wrapped
        if len == 0 || len % cols != 0 {
            self.newline();
        }
    }

    /// Show text the next output will overwrite
    pub fn progress(&mut self, text: &str) {
        self.write(text);
        let (row, _) = self.grid.cursor();
        self.grid.move_cursor(row, 0);
    }

    fn newline(&mut self) {
        let (rows, _) = self.grid.bounds();
        let (row, _) = self.grid.cursor();
        if row + 1 >= rows {
            self.grid.scroll(1);
            self.grid.move_cursor(row, 0);
        } else {
            self.grid.move_cursor(row + 1, 0);
        }
    }

    fn clear(&mut self) {
        clear_grid(&mut self.grid);
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }
}

fn clear_grid(grid: &mut Grid) {
    grid.clear_attributes(Attributes::all());
    grid.set_colors(Color::Default, Color::Default);
    grid.erase_display(DisplayErase::All);
    grid.move_cursor(0, 0);
}

/// Bytes a key sends down the console link
fn key_bytes(key: &KeyEvent) -> Option<Vec<u8>> {
    let csi = |suffix: &str| Some(format!("\x1b[{}", suffix).into_bytes());
    match key.code {
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => match c {
            'a'..='z' | 'A'..='Z' => Some(vec![c.to_ascii_uppercase() as u8 & 0x1F]),
            ' ' | '@' | '2' => Some(vec![0x00]),
            '3' | '[' => Some(vec![0x1B]),
            '4' | '\\' => Some(vec![0x1C]),
            '5' | ']' => Some(vec![0x1D]),
            '6' | '^' => Some(vec![0x1E]),
            '7' | '_' | '/' => Some(vec![0x1F]),
            '8' | '?' => Some(vec![0x7F]),
            _ => None,
        },
        KeyCode::Char(c) => {
            let mut buf = [0u8; 4];
            Some(c.encode_utf8(&mut buf).as_bytes().to_vec())
        }
        KeyCode::Enter => Some(vec![0x0D]),
        KeyCode::Backspace => Some(vec![0x08]),
        KeyCode::Tab => Some(vec![0x09]),
        KeyCode::Esc => Some(vec![0x1B]),
        KeyCode::Delete => Some(vec![0x7F]),
        KeyCode::Up => csi("A"),
        KeyCode::Down => csi("B"),
        KeyCode::Right => csi("C"),
        KeyCode::Left => csi("D"),
        KeyCode::Home => csi("H"),
        KeyCode::End => csi("F"),
        KeyCode::BackTab => csi("Z"),
        KeyCode::Insert => csi("2~"),
        KeyCode::PageUp => csi("5~"),
        KeyCode::PageDown => csi("6~"),
        _ => None,
    }
}

/// `^]`, which terminals report either way
fn is_command_prefix(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char(']' | '5'))
}

/// All UI state
pub struct App {
    layout: Layout,
    console: Grid,
    terminal: Interpreter,
    debug: DebugPane,
    command: CommandLine,
    focus: Focus,
    prefix: bool,
    bell: bool,
    quit: Option<String>,
    console_tx: Sender<ConsoleRequest>,
    debug_tx: Sender<Vec<String>>,
}

impl App {
    pub fn new(
        cols: u16,
        rows: u16,
        console_tx: Sender<ConsoleRequest>,
        debug_tx: Sender<Vec<String>>,
    ) -> Self {
        let layout = Layout::new(rows, cols);
        Self {
            layout,
            console: Grid::new(layout.console_rows, layout.cols),
            terminal: Interpreter::new(),
            debug: DebugPane::new(layout.debug_rows, layout.cols),
            command: CommandLine::new(),
            focus: Focus::Console,
            prefix: false,
            bell: false,
            quit: None,
            console_tx,
            debug_tx,
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn console(&self) -> &Grid {
        &self.console
    }

    pub fn debug_grid(&self) -> &Grid {
        self.debug.grid()
    }

    pub fn command(&self) -> &CommandLine {
        &self.command
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Whether `^]` is waiting for its command key
    pub fn prefix_pending(&self) -> bool {
        self.prefix
    }

    /// Whether the terminal bell should ring, resetting the request
    pub fn take_bell(&mut self) -> bool {
        let rang = self.console.take_bells() > 0 || self.debug.grid.take_bells() > 0;
        std::mem::take(&mut self.bell) || rang
    }

    /// Exit reason once the UI should stop
    pub fn take_quit(&mut self) -> Option<String> {
        self.quit.take()
    }

    /// Act on one event
    pub fn handle(&mut self, event: UiEvent) {
        match event {
            UiEvent::Console(bytes) => self.console_output(&bytes),
            UiEvent::DebugLine(text) => self.debug.line(&text),
            UiEvent::DebugProgress(text) => self.debug.progress(&text),
            UiEvent::Key(key) => self.key(key),
            UiEvent::Resize(cols, rows) => self.resize(cols, rows),
            UiEvent::Quit(reason) => self.quit = Some(reason),
        }
    }

    fn console_output(&mut self, bytes: &[u8]) {
        let mut replies = Vec::new();
        self.terminal
            .feed_all(bytes, &mut self.console, &mut replies);
        if !replies.is_empty() {
            self.send_console(ConsoleRequest::Keys(replies));
        }
    }

    fn resize(&mut self, cols: u16, rows: u16) {
        self.layout = Layout::new(rows, cols);
        self.console
            .resize(self.layout.console_rows, self.layout.cols);
        self.debug
            .grid
            .resize(self.layout.debug_rows, self.layout.cols);
    }

    fn send_console(&mut self, request: ConsoleRequest) {
        if self.console_tx.send(request).is_err() {
            self.debug.line("Console is not available!");
        }
    }

    fn send_debug(&mut self, command: &str) {
        self.submit_debug(vec![command.to_string()]);
    }

    fn submit_debug(&mut self, words: Vec<String>) {
        if self.debug_tx.send(words).is_err() {
            self.debug.line("Debug interface is not available!");
        }
    }

    fn help(&mut self) {
        for line in HELP {
            self.debug.line(line);
        }
    }

    fn swap_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Console => Focus::Command,
            Focus::Command => Focus::Console,
        };
    }

    fn key(&mut self, key: KeyEvent) {
        if self.prefix {
            self.prefix = false;
            self.prefix_command(key);
            return;
        }
        if is_command_prefix(&key) {
            self.prefix = true;
            return;
        }

        let alt = key.modifiers.contains(KeyModifiers::ALT);
        match key.code {
            KeyCode::F(1) => self.help(),
            KeyCode::F(2) => self.swap_focus(),
            KeyCode::F(10) => self.quit = Some(String::new()),
            KeyCode::Tab if alt => self.swap_focus(),
            KeyCode::Char('s') if alt => self.send_debug("stop"),
            KeyCode::Char('g') if alt => self.send_debug("cont"),
            KeyCode::Char('r') if alt => self.send_debug("run"),
            KeyCode::Char(' ') if alt => self.send_debug("step"),
            KeyCode::Char('`') if alt => self.send_debug("reset"),
            _ => match self.focus {
                Focus::Console => self.console_key(key, alt),
                Focus::Command => self.command_key(key, alt),
            },
        }
    }

    fn prefix_command(&mut self, key: KeyEvent) {
        if is_command_prefix(&key) {
            if self.focus == Focus::Console {
                self.send_console(ConsoleRequest::Keys(vec![0x1D]));
            }
            return;
        }
        match key.code {
            KeyCode::Tab => self.swap_focus(),
            KeyCode::Char('c' | 'C') => clear_grid(&mut self.console),
            KeyCode::Char('d' | 'D') => self.debug.clear(),
            KeyCode::Char('h' | 'H') => self.help(),
            KeyCode::Char('q' | 'Q') => self.quit = Some(String::new()),
            KeyCode::Esc => {}
            _ => self.bell = true,
        }
    }

    fn console_key(&mut self, key: KeyEvent, alt: bool) {
        let Some(bytes) = key_bytes(&key) else {
            debug!("no console mapping for {:?}", key);
            return;
        };
        if alt {
            if let KeyCode::Char(c) = key.code {
                self.debug.line(&format!("[Alt+{}]", c));
            }
            let mut escaped = vec![0x1B];
            escaped.extend(bytes);
            self.send_console(ConsoleRequest::Keys(escaped));
        } else {
            self.send_console(ConsoleRequest::Keys(bytes));
        }
    }

    /// Send the command line to the console
    fn yank(&mut self, clear: bool) {
        let text = if clear {
            self.command.take()
        } else {
            self.command.text()
        };
        self.send_console(ConsoleRequest::Keys(text.into_bytes()));
    }

    fn command_key(&mut self, key: KeyEvent, alt: bool) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter if alt => self.yank(true),
            KeyCode::Char('b') if alt => self.command.word_left(),
            KeyCode::Char('f') if alt => self.command.word_right(),
            KeyCode::Char('y') if alt => self.yank(false),
            KeyCode::Char(c) if ctrl => match c.to_ascii_lowercase() {
                'a' => self.command.home(),
                'b' => self.command.left(),
                'd' => self.command.delete(),
                'e' => self.command.end(),
                'f' => self.command.right(),
                'h' => self.command.backspace(),
                'k' => self.command.kill_right(),
                'l' => self.debug.clear(),
                'x' => self.command.clear(),
                'y' => self.yank(true),
                other => self.debug.line(&format!("[^{}]", other.to_ascii_uppercase())),
            },
            KeyCode::Char(c) if !alt => self.command.insert(c),
            KeyCode::Backspace => self.command.backspace(),
            KeyCode::Delete => self.command.delete(),
            KeyCode::Left => self.command.left(),
            KeyCode::Right => self.command.right(),
            KeyCode::Home => self.command.home(),
            KeyCode::End => self.command.end(),
            KeyCode::Enter => self.submit(),
            other => debug!("no command line mapping for {:?}", other),
        }
    }

    fn submit(&mut self) {
        let line = self.command.take();
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        self.debug.line(&format!("> {}", line));
        match route(line) {
            Route::Nothing => {}
            Route::Quit => self.quit = Some(String::new()),
            Route::Help => self.help(),
            Route::Send { protocol, file } => {
                self.send_console(ConsoleRequest::Send { protocol, file })
            }
            Route::Cancel => self.send_console(ConsoleRequest::Cancel),
            Route::Debug(words) => self.submit_debug(words),
            Route::Error(message) => self.debug.line(&message),
        }
    }
}

/// Process events until something asks to quit; returns the exit reason
pub fn run(app: &mut App, screen: &mut Screen, events: &Receiver<UiEvent>) -> io::Result<String> {
    screen.draw(app)?;
    while let Ok(event) = events.recv() {
        app.handle(event);
        // Render once per burst
        while let Ok(event) = events.try_recv() {
            app.handle(event);
            if app.quit.is_some() {
                break;
            }
        }
        if let Some(reason) = app.take_quit() {
            return Ok(reason);
        }
        screen.draw(app)?;
    }
    Ok(String::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nico_core::xfer::Protocol;
    use std::path::PathBuf;
    use std::sync::mpsc::channel;

    struct Harness {
        app: App,
        console: Receiver<ConsoleRequest>,
        debug: Receiver<Vec<String>>,
    }

    impl Harness {
        fn new() -> Self {
            let (console_tx, console) = channel();
            let (debug_tx, debug) = channel();
            Self {
                app: App::new(80, 40, console_tx, debug_tx),
                console,
                debug,
            }
        }

        fn key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
            self.app.handle(UiEvent::Key(KeyEvent::new(code, modifiers)));
        }

        fn type_text(&mut self, text: &str) {
            for c in text.chars() {
                self.key(KeyCode::Char(c), KeyModifiers::NONE);
            }
        }

        fn console_requests(&self) -> Vec<ConsoleRequest> {
            self.console.try_iter().collect()
        }

        fn debug_row(&self, row: usize) -> String {
            self.app.debug_grid().row_text(row).trim_end().to_string()
        }
    }

    #[test]
    fn test_console_output_is_interpreted() {
        let mut h = Harness::new();
        h.app.handle(UiEvent::Console(b"\x1b[2;3Hhi".to_vec()));
        assert_eq!(h.app.console().row_text(1).trim_end(), "  hi");
        assert_eq!(h.app.console().cursor(), (1, 4));
    }

    #[test]
    fn test_status_reply_goes_to_console_link() {
        let mut h = Harness::new();
        h.app.handle(UiEvent::Console(b"\x1b[3;7H\x1b[6n".to_vec()));
        assert_eq!(
            h.console_requests(),
            [ConsoleRequest::Keys(b"\x1b[3;7R".to_vec())]
        );
    }

    #[test]
    fn test_console_keys() {
        let mut h = Harness::new();
        h.type_text("ls");
        h.key(KeyCode::Enter, KeyModifiers::NONE);
        h.key(KeyCode::Backspace, KeyModifiers::NONE);
        h.key(KeyCode::Char('c'), KeyModifiers::CONTROL);
        h.key(KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(
            h.console_requests(),
            [
                ConsoleRequest::Keys(b"l".to_vec()),
                ConsoleRequest::Keys(b"s".to_vec()),
                ConsoleRequest::Keys(vec![0x0D]),
                ConsoleRequest::Keys(vec![0x08]),
                ConsoleRequest::Keys(vec![0x03]),
                ConsoleRequest::Keys(b"\x1b[A".to_vec()),
            ]
        );
    }

    #[test]
    fn test_alt_keys_send_debug_commands() {
        let mut h = Harness::new();
        h.key(KeyCode::Char('s'), KeyModifiers::ALT);
        h.key(KeyCode::Char('g'), KeyModifiers::ALT);
        h.key(KeyCode::Char('r'), KeyModifiers::ALT);
        h.key(KeyCode::Char(' '), KeyModifiers::ALT);
        h.key(KeyCode::Char('`'), KeyModifiers::ALT);
        let commands: Vec<_> = h.debug.try_iter().collect();
        assert_eq!(
            commands,
            [
                vec!["stop".to_string()],
                vec!["cont".to_string()],
                vec!["run".to_string()],
                vec!["step".to_string()],
                vec!["reset".to_string()],
            ]
        );
    }

    #[test]
    fn test_other_alt_keys_are_escaped() {
        let mut h = Harness::new();
        h.key(KeyCode::Char('x'), KeyModifiers::ALT);
        assert_eq!(h.console_requests(), [ConsoleRequest::Keys(b"\x1bx".to_vec())]);
        assert_eq!(h.debug_row(0), "[Alt+x]");
    }

    #[test]
    fn test_command_line_submits_to_debug() {
        let mut h = Harness::new();
        h.key(KeyCode::F(2), KeyModifiers::NONE);
        assert_eq!(h.app.focus(), Focus::Command);
        h.type_text("read 0x1000");
        h.key(KeyCode::Enter, KeyModifiers::NONE);

        assert_eq!(h.debug_row(0), "> read 0x1000");
        let commands: Vec<_> = h.debug.try_iter().collect();
        assert_eq!(commands, [vec!["read".to_string(), "0x1000".to_string()]]);
        assert!(h.app.command().is_empty());
        assert!(h.console_requests().is_empty());
    }

    #[test]
    fn test_command_line_send_and_cancel() {
        let mut h = Harness::new();
        h.key(KeyCode::F(2), KeyModifiers::NONE);
        h.type_text("send ymodem rom.bin");
        h.key(KeyCode::Enter, KeyModifiers::NONE);
        h.type_text("cancel");
        h.key(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(
            h.console_requests(),
            [
                ConsoleRequest::Send {
                    protocol: Protocol::Ymodem,
                    file: PathBuf::from("rom.bin"),
                },
                ConsoleRequest::Cancel,
            ]
        );
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let mut h = Harness::new();
        h.key(KeyCode::F(2), KeyModifiers::NONE);
        h.type_text("program \"rom.hex");
        h.key(KeyCode::Enter, KeyModifiers::NONE);
        assert!(h.debug_row(1).starts_with("Command syntax error: "));
        assert!(h.debug.try_recv().is_err());
    }

    #[test]
    fn test_command_line_editing_keys() {
        let mut h = Harness::new();
        h.key(KeyCode::F(2), KeyModifiers::NONE);
        h.type_text("chipd");
        h.key(KeyCode::Char('b'), KeyModifiers::CONTROL);
        h.type_text("i");
        h.key(KeyCode::Char('e'), KeyModifiers::CONTROL);
        assert_eq!(h.app.command().text(), "chipid");
        h.key(KeyCode::Char('a'), KeyModifiers::CONTROL);
        h.key(KeyCode::Char('k'), KeyModifiers::CONTROL);
        assert!(h.app.command().is_empty());
    }

    #[test]
    fn test_yank_into_console() {
        let mut h = Harness::new();
        h.key(KeyCode::F(2), KeyModifiers::NONE);
        h.type_text("RUN");
        h.key(KeyCode::Char('y'), KeyModifiers::CONTROL);
        assert_eq!(h.console_requests(), [ConsoleRequest::Keys(b"RUN".to_vec())]);
        assert!(h.app.command().is_empty());
    }

    #[test]
    fn test_quit_paths() {
        let mut h = Harness::new();
        h.key(KeyCode::F(10), KeyModifiers::NONE);
        assert_eq!(h.app.take_quit(), Some(String::new()));

        h.key(KeyCode::Char(']'), KeyModifiers::CONTROL);
        assert!(h.app.prefix_pending());
        h.key(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(h.app.take_quit(), Some(String::new()));

        h.app.handle(UiEvent::Quit("Error reading from sock: eof".into()));
        assert_eq!(h.app.take_quit(), Some("Error reading from sock: eof".into()));
    }

    #[test]
    fn test_prefix_commands() {
        let mut h = Harness::new();
        h.app.handle(UiEvent::Console(b"junk".to_vec()));
        h.key(KeyCode::Char('5'), KeyModifiers::CONTROL);
        h.key(KeyCode::Char('c'), KeyModifiers::NONE);
        assert_eq!(h.app.console().row_text(0).trim_end(), "");
        assert_eq!(h.app.console().cursor(), (0, 0));

        h.key(KeyCode::Char(']'), KeyModifiers::CONTROL);
        h.key(KeyCode::Char(']'), KeyModifiers::CONTROL);
        assert_eq!(h.console_requests(), [ConsoleRequest::Keys(vec![0x1D])]);

        h.key(KeyCode::Char(']'), KeyModifiers::CONTROL);
        h.key(KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(h.app.focus(), Focus::Command);

        h.key(KeyCode::Char(']'), KeyModifiers::CONTROL);
        h.key(KeyCode::Char('z'), KeyModifiers::NONE);
        assert!(h.app.take_bell());
        assert!(!h.app.take_bell());
    }

    #[test]
    fn test_debug_pane_progress_is_overwritten() {
        let mut h = Harness::new();
        h.app.handle(UiEvent::DebugProgress("0%".into()));
        h.app.handle(UiEvent::DebugProgress("50%".into()));
        h.app.handle(UiEvent::DebugLine("Segment complete!".into()));
        h.app.handle(UiEvent::DebugLine("Flash complete!".into()));
        assert_eq!(h.debug_row(0), "Segment complete!");
        assert_eq!(h.debug_row(1), "Flash complete!");
    }

    #[test]
    fn test_debug_pane_scrolls() {
        let mut h = Harness::new();
        let rows = h.app.layout().debug_rows;
        for i in 0..rows + 2 {
            h.app.handle(UiEvent::DebugLine(format!("line {}", i)));
        }
        assert_eq!(h.debug_row(0), "line 3");
        assert_eq!(h.debug_row(rows - 2), format!("line {}", rows + 1));
    }

    #[test]
    fn test_help() {
        let mut h = Harness::new();
        h.key(KeyCode::F(1), KeyModifiers::NONE);
        assert!(h.debug_row(0).starts_with("Help: F1=help"));
    }

    #[test]
    fn test_resize() {
        let mut h = Harness::new();
        h.app.handle(UiEvent::Resize(100, 24));
        assert_eq!(h.app.layout().console_rows, 19);
        assert_eq!(h.app.console().bounds(), (19, 100));
        assert_eq!(h.app.debug_grid().bounds(), (3, 100));
    }
}
