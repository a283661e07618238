//! JEDEC command sequences for the SST39SF0x0 parallel flash
//!
//! Every sequence is a series of single-byte writes at fixed offsets
//! within the flash bank. The unlock offsets 0x5555 and 0x2AAA are
//! the same whichever bank the chip is mapped at.

use std::time::Duration;

use super::session::Session;
use super::transcript::Transcript;
use crate::link::Link;

/// Bank the flash chip is mapped at
pub const FLASH_BANK: u32 = 0x20;

/// Base address of the flash window
pub const FLASH_WINDOW: u32 = FLASH_BANK << 16;

/// Mask applied to object file addresses before moving them into the window
pub const FLASH_OFFSET_MASK: u32 = 0x0F_FFFF;

const UNLOCK_1: u32 = 0x5555;
const UNLOCK_2: u32 = 0x2AAA;

const CMD_UNLOCK_1: u8 = 0xAA;
const CMD_UNLOCK_2: u8 = 0x55;
const CMD_ERASE_SETUP: u8 = 0x80;
const CMD_CHIP_ERASE: u8 = 0x10;
const CMD_SECTOR_ERASE: u8 = 0x30;
const CMD_PROGRAM: u8 = 0xA0;
const CMD_ID_ENTRY: u8 = 0x90;
const CMD_ID_EXIT: u8 = 0xF0;

const CHIP_ERASE_TIME: Duration = Duration::from_millis(100);
const SECTOR_ERASE_TIME: Duration = Duration::from_millis(50);

/// Move an object file address into the flash window
pub fn flash_address(address: u32) -> u32 {
    FLASH_WINDOW | (address & FLASH_OFFSET_MASK)
}

impl<L: Link, T: Transcript> Session<L, T> {
    fn unlock(&mut self) {
        self.send_command(UNLOCK_1, CMD_UNLOCK_1);
        self.send_command(UNLOCK_2, CMD_UNLOCK_2);
    }

    fn erase_setup(&mut self) {
        self.unlock();
        self.send_command(UNLOCK_1, CMD_ERASE_SETUP);
        self.unlock();
    }

    /// Stop and reset the target, then erase the whole chip at `bank`
    pub fn erase_chip(&mut self, bank: u32) {
        self.send_chars("]R");
        self.select_bank(bank);
        self.erase_setup();
        self.send_command(UNLOCK_1, CMD_CHIP_ERASE);
        self.settle(CHIP_ERASE_TIME);
    }

    /// Stop and reset the target, then erase the 4K sector holding `address`
    ///
    /// The unlock sequence goes to the chip's base bank; the erase command
    /// itself goes to the sector's own bank and offset.
    pub fn erase_sector(&mut self, address: u32) {
        self.send_chars("]R");
        self.select_bank((address >> 16) & 0xF0);
        self.erase_setup();
        self.select_bank(address >> 16);
        self.send_command(address & 0xFFFF, CMD_SECTOR_ERASE);
        self.settle(SECTOR_ERASE_TIME);
    }

    /// Program one byte at `offset` in the currently selected bank
    pub fn program_byte(&mut self, offset: u32, data: u8) {
        self.unlock();
        self.send_command(UNLOCK_1, CMD_PROGRAM);
        self.send_command(offset & 0xFFFF, data);
    }

    /// Read the manufacturer and device ID of the chip at `bank`
    pub fn chip_id(&mut self, bank: u32) -> (u8, u8) {
        self.send_chars("]");
        self.select_bank(bank);
        self.unlock();
        self.send_command(UNLOCK_1, CMD_ID_ENTRY);

        self.send_hex(0, 4);
        self.send_chars("#");
        let manufacturer = self.fetch_byte();
        let device = self.fetch_byte();

        self.unlock();
        self.send_command(UNLOCK_1, CMD_ID_EXIT);
        (manufacturer, device)
    }
}

/// Human-readable name for a manufacturer/device ID pair
pub fn describe_chip(manufacturer: u8, device: u8) -> String {
    match (manufacturer, device) {
        (0xBF, 0xD5) => "Manufacturer: SST, device: 39xF010 (128K)".to_string(),
        (0xBF, 0xD6) => "Manufacturer: SST, device: 39xF020 (256K)".to_string(),
        (0xBF, 0xD7) => "Manufacturer: SST, device: 39xF040 (512K)".to_string(),
        (0xBF, _) => format!("Manufacturer: SST, device: 0x{:02X}", device),
        _ => format!(
            "Manufacturer: 0x{:02X}, device: 0x{:02X}",
            manufacturer, device
        ),
    }
}
