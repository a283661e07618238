//! Character attributes and colours

use bitflags::bitflags;

bitflags! {
    /// Rendition attributes toggled by SGR and the `p`/`q` commands
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Attributes: u8 {
        /// Bold / increased intensity
        const BOLD = 1 << 0;
        /// Faint / decreased intensity
        const DIM = 1 << 1;
        /// Underline
        const UNDERLINE = 1 << 2;
        /// Blink (slow or fast)
        const BLINK = 1 << 3;
        /// Reverse video
        const REVERSE = 1 << 4;
        /// Concealed
        const CONCEAL = 1 << 5;
        /// Alternate character set
        const ALT_CHARSET = 1 << 6;
    }
}

/// One of the eight ANSI colours, or the terminal default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// ANSI 0
    Black,
    /// ANSI 1
    Red,
    /// ANSI 2
    Green,
    /// ANSI 3
    Yellow,
    /// ANSI 4
    Blue,
    /// ANSI 5
    Magenta,
    /// ANSI 6
    Cyan,
    /// ANSI 7
    White,
    /// Index 8: whatever the host terminal uses by default
    #[default]
    Default,
}

impl Color {
    const TABLE: [Color; 9] = [
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Yellow,
        Color::Blue,
        Color::Magenta,
        Color::Cyan,
        Color::White,
        Color::Default,
    ];

    /// Colour for index 0..=8; out of range maps to the default
    pub fn from_index(index: u32) -> Self {
        Self::TABLE
            .get(index as usize)
            .copied()
            .unwrap_or(Color::Default)
    }

    /// Index in 0..=8, 8 being the terminal default
    pub fn index(self) -> u8 {
        self as u8
    }
}

/// Everything needed to draw a character besides the character itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pen {
    /// Active attributes
    pub attrs: Attributes,
    /// Foreground colour
    pub fg: Color,
    /// Background colour
    pub bg: Color,
}
