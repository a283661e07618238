//! XMODEM, XMODEM-1K and YMODEM senders

use crc::{Crc, CRC_16_XMODEM};
use log::{debug, trace};

use super::Port;
use crate::error::{Error, Result};

const SOH: u8 = 0x01;
const STX: u8 = 0x02;
const EOT: u8 = 0x04;
const ACK: u8 = 0x06;
const NAK: u8 = 0x15;
const CAN: u8 = 0x18;
const SUB: u8 = 0x1A;
const CRC_REQUEST: u8 = b'C';

/// Payload size of an XMODEM block
pub(super) const BLOCK_SIZE: usize = 128;

/// Payload size of an XMODEM-1K block
pub(super) const BLOCK_SIZE_1K: usize = 1024;

/// Attempts per block before giving up
const MAX_RETRIES: usize = 10;

/// Unexpected bytes tolerated while waiting for the receiver to start
const MAX_NOISE: usize = 1024;

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Block check chosen by the receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Check {
    /// CRC-16/XMODEM, requested with `C`
    Crc16,
    /// 8-bit sum, requested with NAK
    Sum,
}

struct Sender<'a, P: ?Sized> {
    port: &'a mut P,
    check: Check,
}

impl<'a, P: Port + ?Sized> Sender<'a, P> {
    /// Wait for the receiver's start request
    fn start(port: &'a mut P) -> Result<Self> {
        let check = wait_for_start(port)?;
        debug!("receiver requested {:?}", check);
        Ok(Self { port, check })
    }

    fn send_block(&mut self, number: u8, payload: &[u8], size: usize, pad: u8) -> Result<()> {
        let mut frame = Vec::with_capacity(size + 5);
        frame.push(if size == BLOCK_SIZE { SOH } else { STX });
        frame.push(number);
        frame.push(!number);
        frame.extend_from_slice(payload);
        frame.resize(3 + size, pad);
        match self.check {
            Check::Crc16 => {
                let crc = CRC16.checksum(&frame[3..]);
                frame.extend_from_slice(&crc.to_be_bytes());
            }
            Check::Sum => {
                let sum = frame[3..].iter().fold(0u8, |sum, &b| sum.wrapping_add(b));
                frame.push(sum);
            }
        }

        for attempt in 0..MAX_RETRIES {
            trace!("block {} attempt {}", number, attempt);
            self.port.write(&frame)?;
            match self.port.read_byte()? {
                ACK => return Ok(()),
                CAN => return Err(Error::Cancelled),
                NAK => continue,
                other => trace!("unexpected reply {:#04x} to block {}", other, number),
            }
        }
        Err(Error::Protocol(format!(
            "Block {} not acknowledged after {} attempts",
            number, MAX_RETRIES
        )))
    }

    /// Send `data` as numbered blocks starting at 1
    fn send_data(&mut self, data: &[u8], size: usize) -> Result<()> {
        let mut number = 1u8;
        for chunk in data.chunks(size) {
            self.send_block(number, chunk, size, SUB)?;
            number = number.wrapping_add(1);
        }
        Ok(())
    }

    /// Send EOT until the receiver acknowledges it
    fn finish(&mut self) -> Result<()> {
        for _ in 0..MAX_RETRIES {
            self.port.write(&[EOT])?;
            match self.port.read_byte()? {
                ACK => return Ok(()),
                CAN => return Err(Error::Cancelled),
                _ => continue,
            }
        }
        Err(Error::Protocol("End of transfer not acknowledged".to_string()))
    }
}

fn wait_for_start<P: Port + ?Sized>(port: &mut P) -> Result<Check> {
    for _ in 0..MAX_NOISE {
        match port.read_byte()? {
            CRC_REQUEST => return Ok(Check::Crc16),
            NAK => return Ok(Check::Sum),
            CAN => return Err(Error::Cancelled),
            other => trace!("ignoring {:#04x} before start", other),
        }
    }
    Err(Error::Protocol("Receiver did not start".to_string()))
}

/// Plain XMODEM with `size`-byte blocks
pub(super) fn send<P: Port + ?Sized>(port: &mut P, data: &[u8], size: usize) -> Result<()> {
    let mut sender = Sender::start(port)?;
    sender.send_data(data, size)?;
    sender.finish()
}

/// YMODEM batch of a single file
pub(super) fn send_batch<P: Port + ?Sized>(port: &mut P, name: &str, data: &[u8]) -> Result<()> {
    let mut header = Vec::with_capacity(BLOCK_SIZE);
    header.extend_from_slice(name.as_bytes());
    header.push(0);
    header.extend_from_slice(data.len().to_string().as_bytes());
    header.push(0);
    let header_size = if header.len() <= BLOCK_SIZE {
        BLOCK_SIZE
    } else {
        BLOCK_SIZE_1K
    };
    header.truncate(BLOCK_SIZE_1K);

    let mut sender = Sender::start(port)?;
    sender.send_block(0, &header, header_size, 0)?;

    sender.check = wait_for_start(&mut *sender.port)?;
    sender.send_data(data, BLOCK_SIZE_1K)?;
    sender.finish()?;

    // An empty header ends the batch
    sender.check = wait_for_start(&mut *sender.port)?;
    sender.send_block(0, &[], BLOCK_SIZE, 0)
}
