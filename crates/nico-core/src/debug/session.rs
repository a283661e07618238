//! Wire primitives of the debug monitor protocol
//!
//! A [`Session`] owns the debug link for as long as it is open. It knows how
//! to put characters on the wire at a safe pace, how to frame addresses and
//! byte writes, and how to read back two-digit hex replies. Transport
//! failures are written to the transcript and never returned: the protocol
//! carries on optimistically and the caller decides whether a wrong value
//! matters.

use std::time::Duration;

use log::{debug, trace, warn};

use super::transcript::{plural, Transcript};
use crate::error::Error;
use crate::hex;
use crate::link::Link;
use crate::pacing::Pacing;

/// How long a resync waits for stale bytes
const RESYNC_TIMEOUT: Duration = Duration::from_millis(100);

/// Size of the resync drain buffer
const RESYNC_BUFFER: usize = 16;

/// An open debug link plus the transcript its commands report to
pub struct Session<L, T> {
    link: L,
    pacing: Pacing,
    transcript: T,
}

impl<L: Link, T: Transcript> Session<L, T> {
    /// Wrap an open link running at `speed` (0 for unpaced links)
    pub fn new(link: L, speed: u32, transcript: T) -> Self {
        Self {
            link,
            pacing: Pacing::new(speed),
            transcript,
        }
    }

    /// Pacing applied to transmitted characters
    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// The underlying link
    pub fn link(&self) -> &L {
        &self.link
    }

    /// The underlying link, mutably
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Give back the link and transcript
    pub fn into_parts(self) -> (L, T) {
        (self.link, self.transcript)
    }

    /// Append a line to the transcript
    pub fn report(&mut self, text: &str) {
        self.transcript.line(text);
    }

    /// Report progress to the transcript
    pub fn progress(&mut self, text: &str) {
        self.transcript.progress(text);
    }

    /// Send `chars` one character at a time, pacing after each
    ///
    /// The first write error is reported and the rest of `chars` is dropped.
    pub fn send_chars(&mut self, chars: &str) {
        trace!("debug tx {:?}", chars);
        for byte in chars.bytes() {
            if let Err(e) = self.link.write(&[byte]) {
                warn!("debug link write failed: {}", e);
                self.report(&format!("Error writing to debug device: {}", e));
                return;
            }
            if let Some(delay) = self.pacing.char_delay() {
                self.link.delay(delay);
            }
        }
    }

    /// Send the low `digits` nibbles of `value` as hex
    pub fn send_hex(&mut self, value: u32, digits: usize) {
        self.send_chars(&hex::encode(value, digits));
    }

    /// Write `data` at `offset` within the selected bank: `OOOO#DD!`
    pub fn send_command(&mut self, offset: u32, data: u8) {
        self.send_hex(offset, 4);
        self.send_chars("#");
        self.send_hex(data as u32, 2);
        self.send_chars("!");
    }

    /// Select the 64K bank that subsequent offsets refer to: `BB:`
    pub fn select_bank(&mut self, bank: u32) {
        self.send_hex(bank, 2);
        self.send_chars(":");
    }

    /// Point the target at a full 24-bit address: `BB:OOOO#`
    pub fn set_address(&mut self, address: u32) {
        self.select_bank(address >> 16);
        self.send_hex(address, 4);
        self.send_chars("#");
    }

    /// Read one two-digit hex reply
    ///
    /// Failures are reported and read as 0.
    pub fn read_byte(&mut self) -> u8 {
        match self.read_reply() {
            Ok(byte) => {
                trace!("debug rx {:02X}", byte);
                byte
            }
            Err(e @ Error::BadReply(_)) => {
                warn!("debug link returned garbage: {}", e);
                self.report(&format!("Error parsing data from debug device: {}", e));
                0
            }
            Err(e) => {
                warn!("debug link read failed: {}", e);
                self.report(&format!("Error reading from debug device: {}", e));
                0
            }
        }
    }

    /// Request and read the byte at the current pointer: `@`
    pub fn fetch_byte(&mut self) -> u8 {
        self.send_chars("@");
        self.read_byte()
    }

    fn read_reply(&mut self) -> crate::Result<u8> {
        let mut buf = [0u8; 2];
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.link.read(&mut buf[filled..])?;
            if n == 0 {
                return Err(Error::Timeout);
            }
            filled += n;
        }
        hex::decode_byte(&buf)
    }

    /// Let the target finish an internal operation
    pub fn settle(&mut self, duration: Duration) {
        self.link.delay(duration);
    }

    /// Discard stale bytes waiting on the link
    ///
    /// Returns how many bytes were thrown away.
    pub fn resync(&mut self) -> usize {
        let mut buf = [0u8; RESYNC_BUFFER];
        let n = match self.link.read_nonblock(&mut buf, RESYNC_TIMEOUT) {
            Ok(n) => n,
            Err(e) => {
                debug!("resync read failed: {}", e);
                0
            }
        };
        if n > 0 {
            debug!("resync discarded {:02X?}", &buf[..n]);
            self.report(&format!(
                "Discarded {} byte{} from debug device.",
                n,
                plural(n)
            ));
        }
        n
    }
}
