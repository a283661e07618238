//! nico-link - Byte links to the target
//!
//! The console and debug ports of the target are reached either through a
//! serial device or through a Unix-domain socket (an emulator, or a
//! `socat` bridge). [`open_link`] looks at what the path is and opens the
//! matching [`Transport`]:
//!
//! - socket: [`UnixTransport`], always unpaced (speed 0)
//! - character device: [`SerialTransport`] at the requested speed
//!
//! # Example
//!
//! ```no_run
//! use nico_link::open_link;
//!
//! let link = open_link("/dev/ttyUSB1", 57600)?;
//! println!("{:?} link at {} baud", link.kind, link.speed);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod transport;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub use error::{LinkError, Result};
pub use transport::serial::SerialTransport;
#[cfg(unix)]
pub use transport::unix::UnixTransport;
pub use transport::{Transport, READ_TIMEOUT};

/// What a device path refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// A Unix-domain socket
    Socket,
    /// A character device, driven as a serial port
    CharDevice,
}

/// An open link and how it was opened
pub struct OpenedLink {
    /// The transport itself
    pub transport: Box<dyn Transport>,
    /// What kind of device it is
    pub kind: LinkKind,
    /// Effective speed for pacing; 0 for sockets
    pub speed: u32,
}

/// Find out whether `path` is a socket or a character device
pub fn detect(path: &Path) -> Result<LinkKind> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => LinkError::NotFound(path.display().to_string()),
        _ => LinkError::from(e),
    })?;
    kind_of(path, &metadata.file_type())
}

#[cfg(unix)]
fn kind_of(path: &Path, file_type: &fs::FileType) -> Result<LinkKind> {
    use std::os::unix::fs::FileTypeExt;

    if file_type.is_socket() {
        Ok(LinkKind::Socket)
    } else if file_type.is_char_device() {
        Ok(LinkKind::CharDevice)
    } else {
        Err(LinkError::Unsupported(path.display().to_string()))
    }
}

#[cfg(not(unix))]
fn kind_of(path: &Path, _file_type: &fs::FileType) -> Result<LinkKind> {
    Err(LinkError::Unsupported(path.display().to_string()))
}

/// Open the device at `path`
///
/// `speed` applies to serial devices only; socket links report speed 0.
pub fn open_link(path: &str, speed: u32) -> Result<OpenedLink> {
    let kind = detect(Path::new(path))?;
    log::debug!("{} is a {:?}", path, kind);
    match kind {
        #[cfg(unix)]
        LinkKind::Socket => Ok(OpenedLink {
            transport: Box::new(UnixTransport::connect(Path::new(path))?),
            kind,
            speed: 0,
        }),
        #[cfg(not(unix))]
        LinkKind::Socket => Err(LinkError::Unsupported(path.to_string())),
        LinkKind::CharDevice => Ok(OpenedLink {
            transport: Box::new(SerialTransport::open(path, speed)?),
            kind,
            speed,
        }),
    }
}
