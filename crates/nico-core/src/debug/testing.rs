//! Scripted link for protocol tests

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::link::Link;

/// Records everything written and plays back canned replies
#[derive(Debug, Default)]
pub(crate) struct ScriptedLink {
    pub sent: Vec<u8>,
    pub replies: VecDeque<u8>,
    pub delays: Vec<Duration>,
    pub fail_writes: bool,
}

impl ScriptedLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the next reads
    pub fn reply(&mut self, bytes: &[u8]) {
        self.replies.extend(bytes.iter().copied());
    }

    pub fn sent_text(&self) -> String {
        String::from_utf8_lossy(&self.sent).into_owned()
    }

    fn drain_into(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.replies.len());
        for (slot, byte) in buf.iter_mut().zip(self.replies.drain(..n)) {
            *slot = byte;
        }
        n
    }
}

impl Link for ScriptedLink {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        if self.fail_writes {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "link down",
            )));
        }
        self.sent.extend_from_slice(data);
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.drain_into(buf))
    }

    fn read_nonblock(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        Ok(self.drain_into(buf))
    }

    fn delay(&mut self, duration: Duration) {
        self.delays.push(duration);
    }
}
