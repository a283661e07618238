//! nico-core - Byte-stream interpreters for the nico console
//!
//! This crate holds the two state machines that do the real work behind the
//! console, independent of any UI or concrete transport:
//!
//! - [`ansi`] - a VT100/ANSI interpreter that turns the target's terminal
//!   output into operations on a character grid ([`ansi::Surface`]).
//! - [`debug`] - the debug monitor protocol engine: command dispatch, the
//!   hex wire protocol, and the JEDEC flash programming sequences.
//!
//! Both sit on top of the [`link::Link`] capability trait, which concrete
//! transports (serial port, Unix socket, the in-memory monitor emulator)
//! implement.
//!
//! # Example
//!
//! ```ignore
//! use nico_core::debug::Debugger;
//!
//! let mut transcript = Vec::<String>::new();
//! let mut debugger = Debugger::open(link, 57600, &mut transcript);
//! debugger.dispatch(&["read", "0x1000"]);
//! for line in &transcript {
//!     println!("{}", line);
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod ansi;
pub mod debug;
pub mod error;
pub mod hex;
pub mod link;
pub mod pacing;
pub mod segment;
pub mod xfer;

pub use error::{Error, Result};
