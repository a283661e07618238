//! nico-dummy - In-memory debug monitor emulator for testing
//!
//! This crate provides a [`Link`] that behaves like the target's boot
//! monitor on its debug port. It interprets the hex wire protocol against
//! emulated memory, so the whole debug command set can be exercised
//! without hardware:
//!
//! - sparse RAM everywhere nothing else is mapped
//! - the memory mapper's remap registers at bank 0x08
//! - an SST39SF0x0 parallel flash at 0x200000, complete with its JEDEC
//!   unlock, program, erase and software ID sequences

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use log::trace;
use nico_core::link::Link;
use nico_core::Result;

/// Bank holding the remap registers
pub const MAPPER_BANK: u8 = 0x08;

/// Number of remap registers
pub const MAPPER_REGISTERS: usize = 32;

/// Configuration for the emulated flash chip
#[derive(Debug, Clone)]
pub struct FlashConfig {
    /// JEDEC manufacturer ID
    pub manufacturer_id: u8,
    /// JEDEC device ID
    pub device_id: u8,
    /// Address the chip is mapped at
    pub base: u32,
    /// Chip size in bytes
    pub size: usize,
    /// Size of the smallest erasable sector
    pub sector_size: usize,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            manufacturer_id: 0xBF, // SST
            device_id: 0xD7,       // SST39SF040
            base: 0x20_0000,
            size: 512 * 1024,
            sector_size: 4096,
        }
    }
}

const UNLOCK_1: u32 = 0x5555;
const UNLOCK_2: u32 = 0x2AAA;

/// Position in the chip's command sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlashState {
    Read,
    Unlocked1,
    Unlocked2,
    Program,
    EraseSetup,
    EraseUnlocked1,
    EraseUnlocked2,
}

/// Emulated SST39SF0x0 flash chip
///
/// Addresses are relative to the chip. Command cycles are decoded on the
/// low 15 address bits, like the real part.
pub struct DummyFlash {
    config: FlashConfig,
    data: Vec<u8>,
    state: FlashState,
    id_mode: bool,
}

impl DummyFlash {
    /// Create an erased chip
    pub fn new(config: FlashConfig) -> Self {
        let data = vec![0xFF; config.size];
        Self {
            config,
            data,
            state: FlashState::Read,
            id_mode: false,
        }
    }

    /// Create an erased SST39SF040
    pub fn new_default() -> Self {
        Self::new(FlashConfig::default())
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash data
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &FlashConfig {
        &self.config
    }

    /// Whether the chip is answering reads with its ID
    pub fn in_id_mode(&self) -> bool {
        self.id_mode
    }

    /// Chip-relative offset of a bus address, if the chip decodes it
    fn offset_of(&self, address: u32) -> Option<usize> {
        let offset = address.checked_sub(self.config.base)? as usize;
        (offset < self.config.size).then_some(offset)
    }

    fn read(&self, offset: usize) -> u8 {
        if self.id_mode {
            if offset & 1 == 0 {
                self.config.manufacturer_id
            } else {
                self.config.device_id
            }
        } else {
            self.data[offset]
        }
    }

    fn write(&mut self, offset: usize, value: u8) {
        let cycle = offset as u32 & 0x7FFF;
        self.state = match (self.state, cycle, value) {
            (FlashState::Program, _, _) => {
                // Programming can only clear bits
                self.data[offset] &= value;
                FlashState::Read
            }
            (FlashState::Read, UNLOCK_1, 0xAA) => FlashState::Unlocked1,
            (FlashState::Unlocked1, UNLOCK_2, 0x55) => FlashState::Unlocked2,
            (FlashState::Unlocked2, UNLOCK_1, 0xA0) => FlashState::Program,
            (FlashState::Unlocked2, UNLOCK_1, 0x80) => FlashState::EraseSetup,
            (FlashState::Unlocked2, UNLOCK_1, 0x90) => {
                self.id_mode = true;
                FlashState::Read
            }
            (FlashState::EraseSetup, UNLOCK_1, 0xAA) => FlashState::EraseUnlocked1,
            (FlashState::EraseUnlocked1, UNLOCK_2, 0x55) => FlashState::EraseUnlocked2,
            (FlashState::EraseUnlocked2, UNLOCK_1, 0x10) => {
                trace!("flash: chip erase");
                self.data.fill(0xFF);
                FlashState::Read
            }
            (FlashState::EraseUnlocked2, _, 0x30) => {
                let start = offset - offset % self.config.sector_size;
                trace!("flash: sector erase at {:#07x}", start);
                self.data[start..start + self.config.sector_size].fill(0xFF);
                FlashState::Read
            }
            (_, _, 0xF0) => {
                self.id_mode = false;
                FlashState::Read
            }
            (state, _, _) => {
                trace!(
                    "flash: ignoring {:02X} at {:#07x} in {:?}",
                    value,
                    offset,
                    state
                );
                FlashState::Read
            }
        };
    }
}

/// How many of each run-control character the monitor has seen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    /// `]`
    pub stop: usize,
    /// `[`
    pub go: usize,
    /// `R`
    pub reset: usize,
    /// `X`
    pub step: usize,
}

/// Emulated debug monitor
pub struct DummyMonitor {
    ram: BTreeMap<u32, u8>,
    remap: [u8; MAPPER_REGISTERS],
    flash: DummyFlash,
    pointer: u32,
    digits: u32,
    replies: VecDeque<u8>,
    wire: Vec<u8>,
    controls: Controls,
}

impl DummyMonitor {
    /// Create a monitor with empty RAM and an erased SST39SF040
    pub fn new() -> Self {
        Self::with_flash(FlashConfig::default())
    }

    /// Create a monitor with the given flash chip
    pub fn with_flash(config: FlashConfig) -> Self {
        Self {
            ram: BTreeMap::new(),
            remap: [0; MAPPER_REGISTERS],
            flash: DummyFlash::new(config),
            pointer: 0,
            digits: 0,
            replies: VecDeque::new(),
            wire: Vec::new(),
            controls: Controls::default(),
        }
    }

    /// Leave bytes in the receive buffer as if from an earlier session
    pub fn preload_stale(&mut self, bytes: &[u8]) {
        self.replies.extend(bytes.iter().copied());
    }

    /// Store bytes directly, bypassing the flash command decoder
    pub fn poke(&mut self, address: u32, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            let address = address.wrapping_add(i as u32);
            match self.flash.offset_of(address) {
                Some(offset) => self.flash.data[offset] = byte,
                None => {
                    self.ram.insert(address, byte);
                }
            }
        }
    }

    /// Read `len` bytes as the bus would see them
    pub fn peek(&self, address: u32, len: usize) -> Vec<u8> {
        (0..len)
            .map(|i| self.load(address.wrapping_add(i as u32)))
            .collect()
    }

    /// The flash chip
    pub fn flash(&self) -> &DummyFlash {
        &self.flash
    }

    /// The flash chip, mutably
    pub fn flash_mut(&mut self) -> &mut DummyFlash {
        &mut self.flash
    }

    /// The remap registers
    pub fn remap(&self) -> &[u8; MAPPER_REGISTERS] {
        &self.remap
    }

    /// Run-control characters received so far
    pub fn controls(&self) -> Controls {
        self.controls
    }

    /// Everything received so far
    pub fn wire(&self) -> &[u8] {
        &self.wire
    }

    /// Everything received so far, as text
    pub fn wire_text(&self) -> String {
        String::from_utf8_lossy(&self.wire).into_owned()
    }

    /// Current 24-bit read/write pointer
    pub fn pointer(&self) -> u32 {
        self.pointer
    }

    fn load(&self, address: u32) -> u8 {
        if let Some(offset) = self.flash.offset_of(address) {
            return self.flash.read(offset);
        }
        if let Some(register) = remap_register(address) {
            return self.remap[register];
        }
        self.ram.get(&address).copied().unwrap_or(0)
    }

    fn store(&mut self, address: u32, value: u8) {
        if let Some(offset) = self.flash.offset_of(address) {
            self.flash.write(offset, value);
        } else if let Some(register) = remap_register(address) {
            self.remap[register] = value;
        } else {
            self.ram.insert(address, value);
        }
    }

    fn advance(&mut self) {
        self.pointer = self.pointer.wrapping_add(1) & 0xFF_FFFF;
    }

    fn receive(&mut self, byte: u8) {
        self.wire.push(byte);
        if let Some(digit) = (byte as char).to_digit(16) {
            self.digits = (self.digits << 4) | digit;
            return;
        }
        let value = std::mem::take(&mut self.digits);
        match byte {
            b':' => self.pointer = (value & 0xFF) << 16,
            b'#' => self.pointer = (self.pointer & 0xFF_0000) | (value & 0xFFFF),
            b'!' => {
                trace!("monitor: {:06X} <- {:02X}", self.pointer, value & 0xFF);
                self.store(self.pointer, value as u8);
                self.advance();
            }
            b'@' => {
                let reply = format!("{:02X}", self.load(self.pointer));
                self.replies.extend(reply.bytes());
                self.advance();
            }
            b']' => self.controls.stop += 1,
            b'[' => self.controls.go += 1,
            b'R' => self.controls.reset += 1,
            b'X' => self.controls.step += 1,
            other => trace!("monitor: ignoring {:#04x}", other),
        }
    }

    fn drain_into(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.replies.len());
        for (slot, byte) in buf.iter_mut().zip(self.replies.drain(..n)) {
            *slot = byte;
        }
        n
    }
}

impl Default for DummyMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn remap_register(address: u32) -> Option<usize> {
    let offset = address.checked_sub((MAPPER_BANK as u32) << 16)? as usize;
    (offset < MAPPER_REGISTERS).then_some(offset)
}

impl Link for DummyMonitor {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        for &byte in data {
            self.receive(byte);
        }
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.drain_into(buf))
    }

    fn read_nonblock(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        Ok(self.drain_into(buf))
    }

    fn delay(&mut self, _duration: Duration) {}
}
