//! Object file segments
//!
//! `program`, `verify`, `flash` and `verify-rom` operate on the contiguous
//! runs of data an Intel HEX file describes. Runs are kept in file order;
//! data records that continue exactly where the previous one ended are
//! joined into one segment.

use std::fs;
use std::path::Path;

use ihex::Record;
use log::debug;

use crate::error::{Error, Result};

/// A contiguous run of bytes destined for one address range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Target address of the first byte
    pub address: u32,
    /// Segment contents
    pub data: Vec<u8>,
}

impl Segment {
    /// Address one past the last byte
    pub fn end(&self) -> u32 {
        self.address.wrapping_add(self.data.len() as u32)
    }
}

/// Something that turns a file into segments
pub trait SegmentLoader {
    /// Load the segments described by `path`
    fn load(&mut self, path: &Path) -> Result<Vec<Segment>>;
}

/// Loads Intel HEX files from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct IntelHexLoader;

impl SegmentLoader for IntelHexLoader {
    fn load(&mut self, path: &Path) -> Result<Vec<Segment>> {
        let text = fs::read_to_string(path).map_err(Error::File)?;
        parse_intel_hex(&text)
    }
}

/// Parse Intel HEX text into segments in file order
pub fn parse_intel_hex(text: &str) -> Result<Vec<Segment>> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut base = 0u32;

    for record in ihex::Reader::new(text) {
        match record? {
            Record::Data { offset, value } => {
                let address = base.wrapping_add(offset as u32);
                match segments.last_mut() {
                    Some(last) if last.end() == address => last.data.extend_from_slice(&value),
                    _ => segments.push(Segment {
                        address,
                        data: value,
                    }),
                }
            }
            Record::ExtendedSegmentAddress(segment) => base = (segment as u32) << 4,
            Record::ExtendedLinearAddress(upper) => base = (upper as u32) << 16,
            Record::EndOfFile => break,
            Record::StartSegmentAddress { .. } | Record::StartLinearAddress(_) => {}
        }
    }

    segments.retain(|s| !s.data.is_empty());
    debug!(
        "parsed {} segment(s), {} bytes",
        segments.len(),
        segments.iter().map(|s| s.data.len()).sum::<usize>()
    );
    Ok(segments)
}
