//! Select Graphic Rendition parameter decoding

use super::attrs::{Attributes, Color};

/// Effect of one SGR parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sgr {
    /// Clear all attributes and both colours
    Reset,
    /// Turn attributes on
    Set(Attributes),
    /// Turn attributes off
    Clear(Attributes),
    /// Change the foreground colour
    Foreground(Color),
    /// Change the background colour
    Background(Color),
}

impl Sgr {
    /// Decode a single parameter; unknown values yield `None`
    pub fn decode(value: u32) -> Option<Self> {
        let sgr = match value {
            0 => Sgr::Reset,
            1 => Sgr::Set(Attributes::BOLD),
            2 => Sgr::Set(Attributes::DIM),
            4 => Sgr::Set(Attributes::UNDERLINE),
            5 | 6 => Sgr::Set(Attributes::BLINK),
            7 => Sgr::Set(Attributes::REVERSE),
            8 => Sgr::Set(Attributes::CONCEAL),
            10 => Sgr::Clear(Attributes::ALT_CHARSET),
            11..=19 => Sgr::Set(Attributes::ALT_CHARSET),
            21 => Sgr::Clear(Attributes::BOLD),
            22 => Sgr::Clear(Attributes::DIM),
            24 => Sgr::Clear(Attributes::UNDERLINE),
            25 | 26 => Sgr::Clear(Attributes::BLINK),
            27 => Sgr::Clear(Attributes::REVERSE),
            28 => Sgr::Clear(Attributes::CONCEAL),
            30..=37 => Sgr::Foreground(Color::from_index(value - 30)),
            39 => Sgr::Foreground(Color::Default),
            40..=47 => Sgr::Background(Color::from_index(value - 40)),
            49 => Sgr::Background(Color::Default),
            _ => return None,
        };
        Some(sgr)
    }
}
