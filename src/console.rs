//! Console I/O servicer
//!
//! One thread owns the write side of the console link and a second thread
//! blocks on its read side. Everything the servicer does arrives as a
//! [`ConsoleRequest`] on one channel, including the bytes the reader thread
//! picks up, so a file transfer can take over the incoming byte stream
//! simply by reading that channel itself.

use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use log::{debug, info, trace, warn};
use nico_core::link::Link;
use nico_core::pacing::Pacing;
use nico_core::xfer::{self, Port, Protocol, XFER_TIMEOUT};
use nico_core::Error;
use nico_link::{LinkKind, Transport};

use crate::ui::UiEvent;

/// Work for the console servicer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleRequest {
    /// Bytes typed by the user or produced by the terminal for the target
    Keys(Vec<u8>),
    /// Bytes the reader thread received from the target
    Incoming(Vec<u8>),
    /// Send a file with a bulk transfer protocol
    Send {
        /// Transfer protocol
        protocol: Protocol,
        /// File to send
        file: PathBuf,
    },
    /// Cancel the running transfer
    Cancel,
    /// The read side of the link failed
    Closed(String),
}

/// Open the console servicer for a real link
pub fn spawn(
    transport: Box<dyn Transport>,
    device: &str,
    kind: LinkKind,
    speed: u32,
    events: Sender<UiEvent>,
) -> io::Result<Sender<ConsoleRequest>> {
    let (tx, rx) = mpsc::channel();

    let reader = transport
        .try_clone()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    let incoming = tx.clone();
    thread::Builder::new()
        .name("nico-console-rx".to_owned())
        .spawn(move || read_loop(reader, incoming))?;

    let servicer = Console::new(transport, device, speed, events).with_kind(kind);
    thread::Builder::new()
        .name("nico-console".to_owned())
        .spawn(move || servicer.run(rx))?;
    Ok(tx)
}

/// Open the test mode servicer, which loops keys back to the screen
pub fn spawn_test(events: Sender<UiEvent>) -> io::Result<Sender<ConsoleRequest>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("nico-console".to_owned())
        .spawn(move || run_test(rx, events))?;
    Ok(tx)
}

fn read_loop<L: Link>(mut link: L, requests: Sender<ConsoleRequest>) {
    let mut buf = [0u8; 1024];
    loop {
        let request = match link.read(&mut buf) {
            Ok(0) => continue,
            Ok(n) => ConsoleRequest::Incoming(buf[..n].to_vec()),
            Err(e) => {
                warn!("console link read failed: {}", e);
                ConsoleRequest::Closed(e.to_string())
            }
        };
        let closed = matches!(request, ConsoleRequest::Closed(_));
        if requests.send(request).is_err() || closed {
            return;
        }
    }
}

/// The write side of a console link
pub struct Console<L> {
    link: L,
    device: String,
    kind: LinkKind,
    pacing: Pacing,
    events: Sender<UiEvent>,
    xfer_timeout: Duration,
}

impl<L: Link> Console<L> {
    pub fn new(link: L, device: &str, speed: u32, events: Sender<UiEvent>) -> Self {
        Self {
            link,
            device: device.to_string(),
            kind: LinkKind::CharDevice,
            pacing: Pacing::new(speed),
            events,
            xfer_timeout: XFER_TIMEOUT,
        }
    }

    /// Set what kind of device the link is, for the connect message
    pub fn with_kind(mut self, kind: LinkKind) -> Self {
        self.kind = kind;
        self
    }

    fn console(&self, text: &str) {
        let _ = self.events.send(UiEvent::Console(text.as_bytes().to_vec()));
    }

    fn report(&self, text: String) {
        let _ = self.events.send(UiEvent::DebugLine(text));
    }

    fn quit(&self, reason: String) {
        let _ = self.events.send(UiEvent::Quit(reason));
    }

    /// Service requests until the channel closes or the link fails
    pub fn run(mut self, requests: Receiver<ConsoleRequest>) {
        let what = match self.kind {
            LinkKind::Socket => "socket",
            LinkKind::CharDevice => "device",
        };
        self.console(&format!("Connected to {}: {}\r\n", what, self.device));
        while let Ok(request) = requests.recv() {
            match request {
                ConsoleRequest::Keys(bytes) => {
                    if let Err(e) = write_paced(&mut self.link, self.pacing, &bytes) {
                        self.quit(format!("Error writing to {}: {}", self.device, e));
                        return;
                    }
                }
                ConsoleRequest::Incoming(bytes) => {
                    let _ = self.events.send(UiEvent::Console(bytes));
                }
                ConsoleRequest::Send { protocol, file } => {
                    if let Some(reason) = self.transfer(protocol, &file, &requests) {
                        self.quit(format!("Error reading from {}: {}", self.device, reason));
                        return;
                    }
                }
                ConsoleRequest::Cancel => self.report("No transfer in progress!".to_string()),
                ConsoleRequest::Closed(reason) => {
                    self.quit(format!("Error reading from {}: {}", self.device, reason));
                    return;
                }
            }
        }
        debug!("console servicer for {} stopped", self.device);
    }

    /// Run one file transfer; returns the link failure, if the link died
    fn transfer(
        &mut self,
        protocol: Protocol,
        file: &Path,
        requests: &Receiver<ConsoleRequest>,
    ) -> Option<String> {
        let data = match fs::read(file) {
            Ok(data) => data,
            Err(e) => {
                self.report(format!("Could not open {}: {}", file.display(), e));
                return None;
            }
        };
        self.report(format!("Sending {}, size {}...", file.display(), data.len()));
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut port = TransferPort {
            link: &mut self.link,
            pacing: self.pacing,
            requests,
            pending: VecDeque::new(),
            timeout: self.xfer_timeout,
            closed: None,
        };
        let result = xfer::send(&mut port, protocol, &name, &data);
        let closed = port.closed.take();
        match result {
            Ok(()) => {
                info!("sent {} via {}", file.display(), protocol);
                self.report("Transfer complete!".to_string());
            }
            Err(Error::Cancelled) => self.report("Transfer cancelled!".to_string()),
            Err(e) => self.report(format!("Transfer failed: {}", e)),
        }
        closed
    }
}

fn write_paced<L: Link>(link: &mut L, pacing: Pacing, bytes: &[u8]) -> nico_core::Result<()> {
    for byte in bytes {
        link.write(std::slice::from_ref(byte))?;
        if let Some(delay) = pacing.char_delay() {
            link.delay(delay);
        }
    }
    Ok(())
}

/// Byte log entry for transfer traffic
fn describe_byte(byte: u8) -> String {
    if (32..127).contains(&byte) {
        format!("[0x{:02X} '{}']", byte, byte as char)
    } else {
        format!("[0x{:02X}]", byte)
    }
}

/// The console link as seen by a bulk transfer
struct TransferPort<'a, L> {
    link: &'a mut L,
    pacing: Pacing,
    requests: &'a Receiver<ConsoleRequest>,
    pending: VecDeque<u8>,
    timeout: Duration,
    closed: Option<String>,
}

impl<L> TransferPort<'_, L> {
    /// Take in one request that arrived during the transfer
    fn accept(&mut self, request: ConsoleRequest) -> nico_core::Result<()> {
        match request {
            ConsoleRequest::Incoming(bytes) => self.pending.extend(bytes),
            ConsoleRequest::Cancel => return Err(Error::Cancelled),
            ConsoleRequest::Closed(reason) => {
                let error = io::Error::new(io::ErrorKind::BrokenPipe, reason.clone());
                self.closed = Some(reason);
                return Err(Error::Io(error));
            }
            other => debug!("ignoring {:?} during transfer", other),
        }
        Ok(())
    }
}

impl<L: Link> Port for TransferPort<'_, L> {
    fn read_byte(&mut self) -> nico_core::Result<u8> {
        loop {
            if let Some(byte) = self.pending.pop_front() {
                trace!("Xfer: Neon->Proto {}", describe_byte(byte));
                return Ok(byte);
            }
            match self.requests.recv_timeout(self.timeout) {
                Ok(request) => self.accept(request)?,
                Err(RecvTimeoutError::Timeout) => return Err(Error::Timeout),
                Err(RecvTimeoutError::Disconnected) => return Err(Error::Cancelled),
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> nico_core::Result<()> {
        while let Ok(request) = self.requests.try_recv() {
            self.accept(request)?;
        }
        for &byte in data {
            trace!("Xfer: Proto->Neon {}", describe_byte(byte));
        }
        write_paced(&mut *self.link, self.pacing, data)
    }
}

/// Printable name of a key byte for the test mode echo
fn key_name(byte: u8) -> String {
    match byte {
        0x20..=0x7E => (byte as char).to_string(),
        0x7F => "^?".to_string(),
        0x00..=0x1F => format!("^{}", (byte + 0x40) as char),
        _ => format!("\\x{:02X}", byte),
    }
}

fn run_test(requests: Receiver<ConsoleRequest>, events: Sender<UiEvent>) {
    while let Ok(request) = requests.recv() {
        let sent = match request {
            ConsoleRequest::Keys(bytes) => bytes.iter().all(|&byte| {
                events.send(UiEvent::Console(vec![byte])).is_ok()
                    && events
                        .send(UiEvent::DebugProgress(format!("<{},{}>", key_name(byte), byte)))
                        .is_ok()
            }),
            ConsoleRequest::Send { .. } | ConsoleRequest::Cancel => events
                .send(UiEvent::DebugLine("No console link in test mode!".to_string()))
                .is_ok(),
            ConsoleRequest::Incoming(_) | ConsoleRequest::Closed(_) => true,
        };
        if !sent {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    /// Console link that records writes and never has anything to read
    #[derive(Default)]
    struct RecordingLink {
        written: Vec<u8>,
        delays: Vec<Duration>,
        fail: bool,
    }

    impl Link for RecordingLink {
        fn write(&mut self, data: &[u8]) -> nico_core::Result<usize> {
            if self.fail {
                return Err(Error::Io(io::Error::new(io::ErrorKind::BrokenPipe, "gone")));
            }
            self.written.extend_from_slice(data);
            Ok(data.len())
        }

        fn read(&mut self, _buf: &mut [u8]) -> nico_core::Result<usize> {
            Ok(0)
        }

        fn read_nonblock(&mut self, _buf: &mut [u8], _timeout: Duration) -> nico_core::Result<usize> {
            Ok(0)
        }

        fn delay(&mut self, duration: Duration) {
            self.delays.push(duration);
        }
    }

    fn drain(events: &Receiver<UiEvent>) -> Vec<UiEvent> {
        events.try_iter().collect()
    }

    fn temp_file(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("nico-{}-{}", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_keys_are_paced() {
        let mut link = RecordingLink::default();
        write_paced(&mut link, Pacing::new(9600), b"ls\r").unwrap();
        assert_eq!(link.written, b"ls\r");
        assert_eq!(link.delays, vec![Duration::from_micros(1041); 3]);

        let mut link = RecordingLink::default();
        write_paced(&mut link, Pacing::NONE, b"ls\r").unwrap();
        assert!(link.delays.is_empty());
    }

    #[test]
    fn test_incoming_reaches_screen() {
        let (events, screen) = channel();
        let console = Console::new(RecordingLink::default(), "/dev/ttyUSB0", 0, events);
        let (tx, requests) = channel();
        tx.send(ConsoleRequest::Incoming(b"ok\r\n".to_vec())).unwrap();
        drop(tx);
        console.run(requests);

        assert_eq!(
            drain(&screen),
            [
                UiEvent::Console(b"Connected to device: /dev/ttyUSB0\r\n".to_vec()),
                UiEvent::Console(b"ok\r\n".to_vec()),
            ]
        );
    }

    #[test]
    fn test_write_failure_quits() {
        let (events, screen) = channel();
        let link = RecordingLink {
            fail: true,
            ..Default::default()
        };
        let console = Console::new(link, "sock", 0, events);
        let (tx, requests) = channel();
        tx.send(ConsoleRequest::Keys(b"x".to_vec())).unwrap();
        console.run(requests);

        let events = drain(&screen);
        assert_eq!(events.last(), Some(&UiEvent::Quit("Error writing to sock: gone".into())));
    }

    #[test]
    fn test_read_failure_quits() {
        let (events, screen) = channel();
        let console = Console::new(RecordingLink::default(), "sock", 0, events);
        let (tx, requests) = channel();
        tx.send(ConsoleRequest::Closed("reset by peer".into())).unwrap();
        console.run(requests);

        let events = drain(&screen);
        assert_eq!(
            events.last(),
            Some(&UiEvent::Quit("Error reading from sock: reset by peer".into()))
        );
    }

    #[test]
    fn test_ascii_transfer() {
        let path = temp_file("ascii.txt", b"10 PRINT\r");
        let (events, screen) = channel();
        let mut console = Console::new(RecordingLink::default(), "tty", 0, events);
        let (_tx, requests) = channel();
        let closed = console.transfer(Protocol::Ascii, &path, &requests);
        let _ = fs::remove_file(&path);

        assert_eq!(closed, None);
        assert_eq!(console.link.written, b"10 PRINT\r");
        let lines = drain(&screen);
        assert_eq!(
            lines[0],
            UiEvent::DebugLine(format!("Sending {}, size 9...", path.display()))
        );
        assert_eq!(lines[1], UiEvent::DebugLine("Transfer complete!".into()));
    }

    #[test]
    fn test_xmodem_transfer_through_requests() {
        let path = temp_file("boot.bin", &[0x5A; 10]);
        let (events, screen) = channel();
        let mut console = Console::new(RecordingLink::default(), "tty", 0, events);
        let (tx, requests) = channel();
        tx.send(ConsoleRequest::Incoming(b"C".to_vec())).unwrap();
        tx.send(ConsoleRequest::Keys(b"ignored".to_vec())).unwrap();
        tx.send(ConsoleRequest::Incoming(vec![0x06, 0x06])).unwrap();
        let closed = console.transfer(Protocol::Xmodem, &path, &requests);
        let _ = fs::remove_file(&path);

        assert_eq!(closed, None);
        let written = &console.link.written;
        assert_eq!(written.len(), 3 + 128 + 2 + 1);
        assert_eq!(&written[..3], [0x01, 1, 0xFE]);
        assert_eq!(written.last(), Some(&0x04));
        assert_eq!(
            drain(&screen).last(),
            Some(&UiEvent::DebugLine("Transfer complete!".into()))
        );
    }

    #[test]
    fn test_transfer_cancel() {
        let path = temp_file("cancel.bin", &[1, 2, 3]);
        let (events, screen) = channel();
        let mut console = Console::new(RecordingLink::default(), "tty", 0, events);
        let (tx, requests) = channel();
        tx.send(ConsoleRequest::Cancel).unwrap();
        let closed = console.transfer(Protocol::Ymodem, &path, &requests);
        let _ = fs::remove_file(&path);

        assert_eq!(closed, None);
        assert!(console.link.written.is_empty());
        assert_eq!(
            drain(&screen).last(),
            Some(&UiEvent::DebugLine("Transfer cancelled!".into()))
        );
    }

    #[test]
    fn test_transfer_timeout() {
        let path = temp_file("timeout.bin", &[1]);
        let (events, screen) = channel();
        let mut console = Console::new(RecordingLink::default(), "tty", 0, events);
        console.xfer_timeout = Duration::from_millis(10);
        let (_tx, requests) = channel();
        console.transfer(Protocol::Xmodem1k, &path, &requests);
        let _ = fs::remove_file(&path);

        assert_eq!(
            drain(&screen).last(),
            Some(&UiEvent::DebugLine(
                "Transfer failed: timed out waiting for data".into()
            ))
        );
    }

    #[test]
    fn test_missing_file() {
        let (events, screen) = channel();
        let mut console = Console::new(RecordingLink::default(), "tty", 0, events);
        let (_tx, requests) = channel();
        console.transfer(Protocol::Ascii, Path::new("/nonexistent/file.bin"), &requests);
        let lines = drain(&screen);
        assert_eq!(lines.len(), 1);
        assert!(matches!(&lines[0], UiEvent::DebugLine(l) if l.starts_with("Could not open /nonexistent/file.bin")));
    }

    #[test]
    fn test_key_names() {
        assert_eq!(key_name(b'a'), "a");
        assert_eq!(key_name(0x0D), "^M");
        assert_eq!(key_name(0x7F), "^?");
        assert_eq!(key_name(0x9B), "\\x9B");
    }

    #[test]
    fn test_test_mode_echoes() {
        let (events, screen) = channel();
        let (tx, requests) = channel();
        tx.send(ConsoleRequest::Keys(vec![b'k'])).unwrap();
        drop(tx);
        run_test(requests, events);
        assert_eq!(
            drain(&screen),
            [
                UiEvent::Console(vec![b'k']),
                UiEvent::DebugProgress("<k,107>".into()),
            ]
        );
    }

    #[test]
    fn test_socket_connect_message() {
        let (events, screen) = channel();
        let console = Console::new(RecordingLink::default(), "/tmp/neon.sock", 0, events)
            .with_kind(LinkKind::Socket);
        let (tx, requests) = channel();
        drop(tx);
        console.run(requests);

        assert_eq!(
            drain(&screen),
            [UiEvent::Console(b"Connected to socket: /tmp/neon.sock\r\n".to_vec())]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_socket_hangup_closes_console() {
        use nico_link::UnixTransport;
        use std::os::unix::net::UnixListener;

        let path = std::env::temp_dir().join(format!("nico-{}-hangup.sock", std::process::id()));
        let _ = fs::remove_file(&path);
        let listener = UnixListener::bind(&path).unwrap();
        let transport = UnixTransport::connect(&path).unwrap();
        let (peer, _) = listener.accept().unwrap();
        drop(peer);

        let (tx, requests) = channel();
        let reader = thread::spawn(move || read_loop(transport, tx));
        let request = requests.recv_timeout(Duration::from_secs(3));
        let _ = fs::remove_file(&path);

        assert_eq!(request, Ok(ConsoleRequest::Closed("EOF".into())));
        reader.join().unwrap();
    }
}
