//! Byte link abstraction
//!
//! Every transport the console talks through (serial port, Unix socket,
//! the monitor emulator used in tests) is reduced to this blocking
//! read/write interface. Pacing and resynchronisation are layered on top by
//! the protocol code, never inside a transport.

use std::time::Duration;

use crate::error::Result;

/// A raw, blocking, bidirectional byte link
pub trait Link {
    /// Write bytes to the link, returning how many were accepted
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Read whatever is available into `buf`
    ///
    /// Blocks for at most the transport's configured timeout and returns
    /// `Ok(0)` if nothing arrived in that time.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Read with a short explicit timeout
    ///
    /// Returns the number of bytes read, or 0 if nothing arrived within
    /// `timeout`.
    fn read_nonblock(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Wait for `duration`
    ///
    /// Used for character pacing and flash settle times. Emulated links
    /// override this to return immediately.
    fn delay(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<L: Link + ?Sized> Link for Box<L> {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn read_nonblock(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        (**self).read_nonblock(buf, timeout)
    }

    fn delay(&mut self, duration: Duration) {
        (**self).delay(duration)
    }
}

impl<L: Link + ?Sized> Link for &mut L {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn read_nonblock(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        (**self).read_nonblock(buf, timeout)
    }

    fn delay(&mut self, duration: Duration) {
        (**self).delay(duration)
    }
}
