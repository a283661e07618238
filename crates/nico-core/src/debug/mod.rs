//! Debug monitor protocol engine
//!
//! The target's boot monitor accepts a terse ASCII protocol on its debug
//! port:
//!
//! | Wire | Meaning |
//! |------|---------|
//! | `]` `[` `R` `X` | stop, go, reset, single-step |
//! | `BB:OOOO#` | point at bank `BB`, offset `OOOO` |
//! | `@` | read the byte at the pointer (reply: two hex digits), advance |
//! | `DD!` | write `DD` at the pointer, advance |
//!
//! [`Debugger`] turns user commands (`read`, `write`, `program`, `flash`,
//! ...) into that protocol. [`Session`] holds the wire primitives, and the
//! flash chip's JEDEC sequences are built on top of them in [`flash`].

mod command;
mod dispatcher;
pub mod flash;
mod session;
mod transcript;

#[cfg(test)]
pub(crate) mod testing;

pub use command::{Command, Number, WriteArgs};
pub use dispatcher::{Debugger, Flow};
pub use session::Session;
pub use transcript::Transcript;
