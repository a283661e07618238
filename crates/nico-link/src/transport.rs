//! Concrete byte links
//!
//! Both transports present the blocking [`Link`] interface with a one
//! second read timeout: a read that sees no data in that time returns
//! `Ok(0)` instead of failing. A socket whose peer has gone fails with
//! `UnexpectedEof`.

use std::io::{self, ErrorKind};
use std::time::Duration;

use nico_core::link::Link;

use crate::error::Result;

/// Default read timeout of every transport
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// A link that can be shared between a reader and a writer thread
pub trait Transport: Link + Send {
    /// Open a second handle on the same underlying device
    fn try_clone(&self) -> Result<Box<dyn Transport>>;
}

/// Map read timeouts to "no data"
fn no_data_on_timeout(result: io::Result<usize>) -> nico_core::Result<usize> {
    match result {
        Ok(n) => Ok(n),
        Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

/// A stream read of nothing into a non-empty buffer means the peer hung up
#[cfg(unix)]
fn eof_is_closed(result: io::Result<usize>, want: usize) -> io::Result<usize> {
    match result {
        Ok(0) if want > 0 => Err(io::Error::new(ErrorKind::UnexpectedEof, "EOF")),
        other => other,
    }
}

pub mod serial {
    //! Serial port transport implementation

    use super::*;
    use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
    use std::io::{Read, Write};

    /// Serial port transport, 8N1 without flow control
    pub struct SerialTransport {
        port: Box<dyn SerialPort>,
    }

    impl SerialTransport {
        /// Open a serial port at the given baud rate
        pub fn open(device: &str, baud: u32) -> Result<Self> {
            let port = serialport::new(device, baud)
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .flow_control(FlowControl::None)
                .timeout(READ_TIMEOUT)
                .open()?;

            log::info!("Opened serial port {} at {} baud", device, baud);

            Ok(Self { port })
        }
    }

    impl Link for SerialTransport {
        fn write(&mut self, data: &[u8]) -> nico_core::Result<usize> {
            self.port.write_all(data)?;
            Ok(data.len())
        }

        fn read(&mut self, buf: &mut [u8]) -> nico_core::Result<usize> {
            no_data_on_timeout(self.port.read(buf))
        }

        fn read_nonblock(&mut self, buf: &mut [u8], timeout: Duration) -> nico_core::Result<usize> {
            let old_timeout = self.port.timeout();
            self.port.set_timeout(timeout).map_err(io::Error::from)?;

            let result = no_data_on_timeout(self.port.read(buf));

            self.port.set_timeout(old_timeout).map_err(io::Error::from)?;
            result
        }
    }

    impl Transport for SerialTransport {
        fn try_clone(&self) -> Result<Box<dyn Transport>> {
            let port = self.port.try_clone()?;
            Ok(Box::new(SerialTransport { port }))
        }
    }
}

#[cfg(unix)]
pub mod unix {
    //! Unix-domain socket transport implementation

    use super::*;
    use crate::error::LinkError;
    use std::io::{Read, Write};
    use std::os::unix::net::UnixStream;
    use std::path::Path;

    /// Unix-domain stream socket transport
    pub struct UnixTransport {
        stream: UnixStream,
    }

    impl UnixTransport {
        /// Connect to the socket at `path`
        pub fn connect(path: &Path) -> Result<Self> {
            log::info!("Connecting to socket {}", path.display());

            let stream = UnixStream::connect(path)
                .map_err(|e| LinkError::ConnectionFailed(format!("{}: {}", path.display(), e)))?;
            stream.set_read_timeout(Some(READ_TIMEOUT)).map_err(|e| {
                LinkError::ConnectionFailed(format!("Failed to set read timeout: {}", e))
            })?;

            Ok(Self { stream })
        }

        /// Wrap an already connected stream
        pub fn from_stream(stream: UnixStream) -> Result<Self> {
            stream.set_read_timeout(Some(READ_TIMEOUT))?;
            Ok(Self { stream })
        }
    }

    impl Link for UnixTransport {
        fn write(&mut self, data: &[u8]) -> nico_core::Result<usize> {
            self.stream.write_all(data)?;
            Ok(data.len())
        }

        fn read(&mut self, buf: &mut [u8]) -> nico_core::Result<usize> {
            let want = buf.len();
            no_data_on_timeout(eof_is_closed(self.stream.read(buf), want))
        }

        fn read_nonblock(&mut self, buf: &mut [u8], timeout: Duration) -> nico_core::Result<usize> {
            self.stream.set_read_timeout(Some(timeout))?;
            let want = buf.len();
            let result = no_data_on_timeout(eof_is_closed(self.stream.read(buf), want));
            self.stream.set_read_timeout(Some(READ_TIMEOUT))?;
            result
        }
    }

    impl Transport for UnixTransport {
        fn try_clone(&self) -> Result<Box<dyn Transport>> {
            let stream = self.stream.try_clone()?;
            Ok(Box::new(UnixTransport { stream }))
        }
    }
}
