//! Debug command execution

use std::fmt::Write as _;
use std::path::Path;

use log::{debug, info};

use super::command::{Command, Number, WriteArgs};
use super::flash::{describe_chip, flash_address, FLASH_BANK};
use super::session::Session;
use super::transcript::{plural, Transcript};
use crate::error::Error;
use crate::link::Link;
use crate::segment::{IntelHexLoader, Segment, SegmentLoader};

/// Bank holding the memory mapper's remap registers
const MAPPER_BANK: u32 = 0x08;

/// Number of 16-byte rows printed per `read` address
const READ_ROWS: usize = 4;

/// Bytes per printed `read` row
const ROW_BYTES: usize = 16;

/// Flash progress is reported every this many bytes of a segment
const PROGRESS_INTERVAL: usize = 0x800;

/// Whether a multi-segment operation should carry on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Go on with the next segment
    Continue,
    /// Stop the whole command
    Abort,
}

/// Which memory a file operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    /// RAM at the file's own addresses
    Ram,
    /// The flash chip, with addresses moved into the flash window
    Rom,
}

/// Executes debug commands against the monitor on the other end of a link
///
/// Commands are synchronous: [`Debugger::dispatch`] returns once every wire
/// exchange of the command is done and its transcript lines are written.
/// Nothing carries over from one command to the next except the link.
pub struct Debugger<L, T, F = IntelHexLoader> {
    session: Session<L, T>,
    loader: F,
}

impl<L: Link, T: Transcript> Debugger<L, T> {
    /// Create a debugger for a link running at `speed` (0 for no pacing)
    pub fn new(link: L, speed: u32, transcript: T) -> Self {
        Self {
            session: Session::new(link, speed, transcript),
            loader: IntelHexLoader,
        }
    }

    /// Create a debugger for a freshly opened link and drain stale bytes
    pub fn open(link: L, speed: u32, transcript: T) -> Self {
        let mut debugger = Self::new(link, speed, transcript);
        debugger.session.resync();
        debugger
    }
}

impl<L: Link, T: Transcript, F: SegmentLoader> Debugger<L, T, F> {
    /// Replace the object file loader
    pub fn with_loader<G: SegmentLoader>(self, loader: G) -> Debugger<L, T, G> {
        Debugger {
            session: self.session,
            loader,
        }
    }

    /// The wire session
    pub fn session(&self) -> &Session<L, T> {
        &self.session
    }

    /// The wire session, mutably
    pub fn session_mut(&mut self) -> &mut Session<L, T> {
        &mut self.session
    }

    /// Give back the link and transcript
    pub fn into_parts(self) -> (L, T) {
        self.session.into_parts()
    }

    /// Parse and execute one tokenized command line
    pub fn dispatch<S: AsRef<str>>(&mut self, tokens: &[S]) {
        if let Some(command) = Command::parse(tokens) {
            self.execute(command);
        }
    }

    /// Execute one command
    pub fn execute(&mut self, command: Command) {
        info!("debug command: {:?}", command);
        match command {
            Command::Stop => self.control("]", "Stop sent!"),
            Command::Go => self.control("[", "Go sent!"),
            Command::Reset => self.control("R", "Reset sent!"),
            Command::Step => self.control("X", "Step sent!"),
            Command::Run => self.control("]R[", "Run sent!"),
            Command::Read(addresses) => self.read(&addresses),
            Command::Write(args) => self.write(args),
            Command::Program(file) => self.transfer(file, Target::Ram, false),
            Command::Verify(file) => self.transfer(file, Target::Ram, true),
            Command::Flash(file) => self.transfer(file, Target::Rom, false),
            Command::VerifyRom(file) => self.transfer(file, Target::Rom, true),
            Command::MapRam => self.map_ram(),
            Command::Erase => {
                self.session.erase_chip(FLASH_BANK);
                self.session.report("Flash ROM erased!");
            }
            Command::EraseSector(address) => self.erase_sector(address),
            Command::ChipId => {
                let (manufacturer, device) = self.session.chip_id(FLASH_BANK);
                debug!("chip id {:02X} {:02X}", manufacturer, device);
                self.session.report(&describe_chip(manufacturer, device));
            }
            Command::Resync => {
                self.session.resync();
            }
            Command::Unknown(name) => {
                self.session.report(&format!("Unknown command: '{}'", name))
            }
        }
    }

    fn control(&mut self, wire: &str, message: &str) {
        self.session.send_chars(wire);
        self.session.report(message);
    }

    fn read(&mut self, addresses: &[Number]) {
        for address in addresses {
            let mut address = match address {
                Number::Valid(address) => *address,
                Number::Invalid(token) => {
                    self.session.report(&format!("Bad address: {}", token));
                    continue;
                }
            };
            self.session.set_address(address);
            for _ in 0..READ_ROWS {
                let mut row = [0u8; ROW_BYTES];
                for byte in row.iter_mut() {
                    *byte = self.session.fetch_byte();
                }
                self.session.report(&format_row(address, &row));
                address = address.wrapping_add(ROW_BYTES as u32);
            }
        }
    }

    fn write(&mut self, args: Option<WriteArgs>) {
        let mut written = 0;
        if let Some(args) = args {
            match args.address {
                Number::Valid(address) => {
                    self.session.set_address(address);
                    for byte in &args.data {
                        self.session.send_hex(*byte as u32, 2);
                        self.session.send_chars("!");
                        written += 1;
                    }
                    if let Some(token) = args.rejected {
                        self.session.report(&format!("Bad data: {}", token));
                    }
                }
                Number::Invalid(token) => {
                    self.session.report(&format!("Bad address: {}", token));
                }
            }
        }
        self.session
            .report(&format!("Wrote {} byte{}!", written, plural(written)));
    }

    fn load(&mut self, file: Option<String>) -> Option<Vec<Segment>> {
        let Some(file) = file else {
            self.session.report("No file specified!");
            return None;
        };
        match self.loader.load(Path::new(&file)) {
            Ok(segments) => Some(segments),
            Err(Error::File(e)) => {
                self.session
                    .report(&format!("Could not open {}: {}", file, e));
                None
            }
            Err(e) => {
                self.session
                    .report(&format!("Could not parse {}: {}", file, e));
                None
            }
        }
    }

    fn transfer(&mut self, file: Option<String>, target: Target, verify: bool) {
        let Some(segments) = self.load(file) else {
            return;
        };

        self.session.send_chars("]R");
        if target == Target::Rom {
            if verify {
                self.session.report("Verifying...");
            } else {
                self.session.report("Erasing chip...");
                self.session.erase_chip(FLASH_BANK);
                self.session.report("Flashing...");
            }
        }

        for (number, segment) in segments.iter().enumerate() {
            let address = match target {
                Target::Ram => segment.address,
                Target::Rom => flash_address(segment.address),
            };
            let len = segment.data.len();
            self.session.report(&format!(
                "{} segment {} at 0x{:08x}, {} byte{}",
                if verify { "Verifying" } else { "Programming" },
                number,
                address,
                len,
                plural(len)
            ));

            let flow = match target {
                Target::Ram => self.ram_segment(address, &segment.data, verify),
                Target::Rom => self.rom_segment(address, &segment.data, verify),
            };
            if flow == Flow::Abort {
                return;
            }
            self.session.report("Segment complete!");
        }

        self.session.report(match (target, verify) {
            (_, true) => "Verify complete!",
            (Target::Ram, false) => "Program complete!",
            (Target::Rom, false) => "Flash complete!",
        });
    }

    /// Compare the byte at the target's pointer with `expected`
    fn check(&mut self, address: u32, expected: u8) -> Flow {
        let actual = self.session.fetch_byte();
        if actual == expected {
            return Flow::Continue;
        }
        debug!(
            "mismatch at {:06X}: expected {:02X}, read {:02X}",
            address, expected, actual
        );
        self.session
            .report(&format!("Validation failed at {:08x}!", address));
        Flow::Abort
    }

    fn ram_segment(&mut self, base: u32, data: &[u8], verify: bool) -> Flow {
        self.session.set_address(base);
        for (idx, &byte) in data.iter().enumerate() {
            let address = base.wrapping_add(idx as u32);
            if idx != 0 && address & 0xFFFF == 0 {
                self.session.set_address(address);
            }
            if verify {
                if self.check(address, byte) == Flow::Abort {
                    return Flow::Abort;
                }
            } else {
                self.session.send_hex(byte as u32, 2);
                self.session.send_chars("!");
            }
        }
        Flow::Continue
    }

    fn rom_segment(&mut self, base: u32, data: &[u8], verify: bool) -> Flow {
        // Programming addresses every byte itself, so only the bank is needed
        let select = |session: &mut Session<L, T>, address: u32| {
            if verify {
                session.set_address(address);
            } else {
                session.select_bank(address >> 16);
            }
        };

        select(&mut self.session, base);
        for (idx, &byte) in data.iter().enumerate() {
            if idx % PROGRESS_INTERVAL == 0 {
                self.session
                    .progress(&format!("{}%", idx * 100 / data.len()));
            }
            let address = base.wrapping_add(idx as u32);
            if idx != 0 && address & 0xFFFF == 0 {
                select(&mut self.session, address);
            }
            if verify {
                if self.check(address, byte) == Flow::Abort {
                    return Flow::Abort;
                }
            } else if byte != 0xFF {
                self.session.program_byte(address, byte);
            }
        }
        Flow::Continue
    }

    fn map_ram(&mut self) {
        self.session.send_chars("]R");
        self.session.select_bank(MAPPER_BANK);
        for i in 0..16u32 {
            self.session.send_command(2 * i, (i * 16) as u8);
            self.session.send_command(2 * i + 1, 0x80);
        }
        self.session.report("RAM mapped to bank 0!");
    }

    fn erase_sector(&mut self, address: Option<Number>) {
        match address {
            None => self.session.report("No address specified!"),
            Some(Number::Invalid(token)) => {
                self.session.report(&format!("Bad address: {}", token))
            }
            Some(Number::Valid(address)) => {
                self.session.erase_sector(address);
                self.session
                    .report(&format!("Sector at 0x{:06X} erased!", address));
            }
        }
    }
}

/// Format one `read` row: address, 16 hex bytes, printable ASCII
fn format_row(address: u32, bytes: &[u8; ROW_BYTES]) -> String {
    let mut line = format!("{:08X}  ", address);
    for (i, byte) in bytes.iter().enumerate() {
        if i == 8 {
            line.push(' ');
        }
        let _ = write!(line, "{:02X} ", byte);
    }
    line.push('[');
    line.extend(bytes.iter().map(|&b| {
        if (32..127).contains(&b) {
            b as char
        } else {
            ' '
        }
    }));
    line.push(']');
    line
}
