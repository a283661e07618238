//! Bulk file transfer over the console link
//!
//! Files are pushed to the target with one of four strategies, all driven
//! through the same byte [`Port`]:
//!
//! - [`Protocol::Ascii`] - the raw file contents
//! - [`Protocol::Xmodem`] - 128-byte blocks, CRC-16 or additive checksum
//! - [`Protocol::Xmodem1k`] - 1024-byte blocks
//! - [`Protocol::Ymodem`] - a batch of one file with its name and size
//!
//! The port decides how long a read may wait ([`XFER_TIMEOUT`]) and fails
//! with [`Error::Cancelled`](crate::Error::Cancelled) once the user cancels.

mod ascii;
mod xmodem;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use log::info;

use crate::error::{Error, Result};

/// How long a transfer waits for the receiver before giving up
pub const XFER_TIMEOUT: Duration = Duration::from_secs(60);

/// Byte channel a transfer runs over
pub trait Port {
    /// Wait for the next byte from the receiver
    ///
    /// Fails with `Timeout` after [`XFER_TIMEOUT`] of silence and with
    /// `Cancelled` when the transfer is cancelled.
    fn read_byte(&mut self) -> Result<u8>;

    /// Send bytes to the receiver
    fn write(&mut self, data: &[u8]) -> Result<()>;
}

impl<P: Port + ?Sized> Port for &mut P {
    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }
}

/// File transfer protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Raw bytes, no framing
    Ascii,
    /// XMODEM with 128-byte blocks
    Xmodem,
    /// XMODEM with 1024-byte blocks
    Xmodem1k,
    /// YMODEM batch transfer
    Ymodem,
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ascii" => Ok(Protocol::Ascii),
            "xmodem" => Ok(Protocol::Xmodem),
            "xmodem1k" | "xmodem-1k" => Ok(Protocol::Xmodem1k),
            "ymodem" => Ok(Protocol::Ymodem),
            _ => Err(Error::Protocol(format!("Unknown protocol: {}", s))),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Protocol::Ascii => "ascii",
            Protocol::Xmodem => "xmodem",
            Protocol::Xmodem1k => "xmodem1k",
            Protocol::Ymodem => "ymodem",
        };
        f.write_str(name)
    }
}

/// Send `data` using `protocol`
///
/// `name` is only transmitted by YMODEM.
pub fn send<P: Port + ?Sized>(port: &mut P, protocol: Protocol, name: &str, data: &[u8]) -> Result<()> {
    info!("sending {} ({} bytes) via {}", name, data.len(), protocol);
    match protocol {
        Protocol::Ascii => ascii::send(port, data),
        Protocol::Xmodem => xmodem::send(port, data, xmodem::BLOCK_SIZE),
        Protocol::Xmodem1k => xmodem::send(port, data, xmodem::BLOCK_SIZE_1K),
        Protocol::Ymodem => xmodem::send_batch(port, name, data),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_names() {
        assert_eq!("ascii".parse::<Protocol>().unwrap(), Protocol::Ascii);
        assert_eq!("XMODEM".parse::<Protocol>().unwrap(), Protocol::Xmodem);
        assert_eq!("xmodem1k".parse::<Protocol>().unwrap(), Protocol::Xmodem1k);
        assert_eq!("ymodem".parse::<Protocol>().unwrap(), Protocol::Ymodem);
        assert!("kermit".parse::<Protocol>().is_err());
        assert_eq!(Protocol::Xmodem1k.to_string(), "xmodem1k");
    }

    #[test]
    fn test_send_ascii() {
        let mut port = testing::ScriptedPort::new(&[]);
        send(&mut port, Protocol::Ascii, "a.txt", b"hello\r\n").unwrap();
        assert_eq!(port.written, b"hello\r\n");
    }
}
