//! ANSI/VT100 terminal interpretation
//!
//! The console pane shows whatever the target prints, interpreted as a
//! VT100-ish byte stream. [`Interpreter`] is the parser state machine; it
//! owns only parser state (mode, parameters, colours, saved cursor) and
//! drives a [`Surface`] for everything visible. [`Grid`] is the in-memory
//! surface used by the UI and by tests.
//!
//! Supported sequences:
//!
//! | Bytes | Effect |
//! |-------|--------|
//! | BEL BS HT LF VT FF CR | bell, left, tab stop, down/scroll, up, clear, column 0 |
//! | `ESC c` | full reset |
//! | `ESC [` *params* *letter* | cursor motion, erase, insert/delete, scroll, SGR, DSR |
//!
//! Anything after `ESC` other than `[` or `c` is written literally, ESC
//! included.

mod attrs;
mod grid;
mod machine;
mod params;
mod sgr;
mod surface;

pub use attrs::{Attributes, Color, Pen};
pub use grid::{Cell, Grid};
pub use machine::{Interpreter, Mode, Responder};
pub use params::{Params, MAX_PARAMS};
pub use sgr::Sgr;
pub use surface::{DisplayErase, LineErase, Surface};
