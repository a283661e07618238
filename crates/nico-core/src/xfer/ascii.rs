//! Raw byte transfer

use super::Port;
use crate::error::Result;

/// Send `data` one byte at a time so a cancel takes effect promptly
pub(super) fn send<P: Port + ?Sized>(port: &mut P, data: &[u8]) -> Result<()> {
    for byte in data {
        port.write(std::slice::from_ref(byte))?;
    }
    Ok(())
}
