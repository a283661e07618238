//! The one-line command editor and command routing

use std::path::PathBuf;

use nico_core::xfer::Protocol;

/// Editable command line, split at the cursor
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandLine {
    left: String,
    right: String,
}

impl CommandLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whole line
    pub fn text(&self) -> String {
        format!("{}{}", self.left, self.right)
    }

    /// Cursor position in characters
    pub fn cursor(&self) -> usize {
        self.left.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    pub fn insert(&mut self, ch: char) {
        self.left.push(ch);
    }

    pub fn backspace(&mut self) {
        self.left.pop();
    }

    pub fn delete(&mut self) {
        if let Some(ch) = self.right.chars().next() {
            self.right.drain(..ch.len_utf8());
        }
    }

    pub fn left(&mut self) {
        if let Some(ch) = self.left.pop() {
            self.right.insert(0, ch);
        }
    }

    pub fn right(&mut self) {
        if let Some(ch) = self.right.chars().next() {
            self.right.drain(..ch.len_utf8());
            self.left.push(ch);
        }
    }

    pub fn home(&mut self) {
        self.right.insert_str(0, &self.left);
        self.left.clear();
    }

    pub fn end(&mut self) {
        self.left.push_str(&self.right);
        self.right.clear();
    }

    /// Drop everything right of the cursor
    pub fn kill_right(&mut self) {
        self.right.clear();
    }

    /// Clear right of the cursor, or the whole line if that is empty
    pub fn clear(&mut self) {
        if self.right.is_empty() {
            self.left.clear();
        } else {
            self.right.clear();
        }
    }

    /// Move to the start of the previous word
    pub fn word_left(&mut self) {
        while self.left.ends_with(' ') {
            self.left();
        }
        while !self.left.is_empty() && !self.left.ends_with(' ') {
            self.left();
        }
    }

    /// Move past the next word and the spaces after it
    pub fn word_right(&mut self) {
        while !self.right.is_empty() && !self.right.starts_with(' ') {
            self.right();
        }
        while self.right.starts_with(' ') {
            self.right();
        }
    }

    /// Empty the line, returning what it held
    pub fn take(&mut self) -> String {
        let text = self.text();
        self.left.clear();
        self.right.clear();
        text
    }

    /// Visible slice of the line and cursor column for a `width`-column row
    ///
    /// When the line does not fit, a few characters right of the cursor stay
    /// visible, proportional to the width.
    pub fn view(&self, width: usize) -> (String, usize) {
        let left: Vec<char> = self.left.chars().collect();
        let right: Vec<char> = self.right.chars().collect();
        if width == 0 {
            return (String::new(), 0);
        }
        if left.len() + right.len() < width {
            return (self.text(), left.len());
        }
        let margin = width / 8;
        let (shown_left, shown_right) = if left.len() < width - margin {
            (left.len(), width - left.len())
        } else {
            let shown_right = margin.min(right.len());
            (width - shown_right - 1, shown_right)
        };
        let shown_right = shown_right.min(right.len());
        let mut text: String = left[left.len() - shown_left..].iter().collect();
        text.extend(&right[..shown_right]);
        (text, shown_left)
    }
}

/// Where a submitted command goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Nothing to do (blank line or comment)
    Nothing,
    /// Leave the program
    Quit,
    /// Show the key help
    Help,
    /// Start a file transfer on the console link
    Send {
        /// Transfer protocol
        protocol: Protocol,
        /// File to send
        file: PathBuf,
    },
    /// Cancel a running file transfer
    Cancel,
    /// Hand the words to the debug interface
    Debug(Vec<String>),
    /// Tell the user something went wrong
    Error(String),
}

/// Split a command line into words
///
/// A line starting with `#` is a comment. Errors come back as the text to
/// show the user.
pub fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let line = line.trim();
    if line.starts_with('#') {
        return Ok(Vec::new());
    }
    shell_words::split(line).map_err(|e| format!("Command syntax error: {}!", e))
}

/// Decide what a submitted command line does
pub fn route(line: &str) -> Route {
    let words = match tokenize(line) {
        Ok(words) => words,
        Err(message) => return Route::Error(message),
    };
    let Some(name) = words.first() else {
        return Route::Nothing;
    };
    match name.to_ascii_lowercase().as_str() {
        "quit" => Route::Quit,
        "help" => Route::Help,
        "cancel" => Route::Cancel,
        "send" => match (words.get(1), words.get(2)) {
            (Some(protocol), Some(file)) => match protocol.parse::<Protocol>() {
                Ok(protocol) => Route::Send {
                    protocol,
                    file: PathBuf::from(file),
                },
                Err(e) => Route::Error(format!("{}!", e)),
            },
            _ => Route::Error("Usage: send <ascii|xmodem|xmodem1k|ymodem> <file>".to_string()),
        },
        _ => Route::Debug(words),
    }
}
