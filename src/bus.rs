use serde::{Deserialize, Serialize};

use crate::{
    memory::{Ram, RAM_SIZE},
    pia::Pia,
    rom::MonitorRom,
    terminal::Terminal,
};

/// Base of the 16-byte PIA window.
pub const PIA_BASE: u16 = 0xD010;
/// Keyboard data register, read by the monitor's key loop.
pub const PIA_KBD: u16 = 0xD010;
/// Keyboard control register; non-zero while a key is pending.
pub const PIA_KBD_CTRL: u16 = 0xD011;
/// Display data register; a write emits one character.
pub const PIA_DSP: u16 = 0xD012;
/// Base of the monitor ROM page.
pub const ROM_BASE: u16 = 0xFF00;

/// The 4 KiB window at 0xE000 aliases RAM at 0x4000 so that BASIC, built
/// for the high bank, runs against low RAM.
pub const BANK_BASE: u16 = 0xE000;
const BANK_OFFSET: u16 = 0xA000;

/// Address decoder. Every CPU byte access lands here; decoding is total
/// over the 16-bit space, so no access can fail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bus {
    pub ram: Ram,
    pub rom: MonitorRom,
    pub pia: Pia,
    pub terminal: Terminal,
}

impl Bus {
    pub fn new(rom: MonitorRom) -> Self {
        Bus {
            ram: Ram::new(),
            rom,
            pia: Pia::new(),
            terminal: Terminal::new(),
        }
    }

    pub fn mem_size(&self) -> usize {
        self.ram.size()
    }

    /// Addresses at or above the aliased bank are folded down to the RAM
    /// region backing it. Used for the loader's target address as well.
    pub fn translate_load_address(address: u16) -> u16 {
        if address >= BANK_BASE {
            address - BANK_OFFSET
        } else {
            address
        }
    }

    pub fn read_byte(&mut self, address: u16) -> u8 {
        if (address as usize) < RAM_SIZE {
            self.ram.read(address)
        } else if address & 0xF000 == BANK_BASE {
            self.ram.read(address - BANK_OFFSET)
        } else if address & 0xFFF0 == PIA_BASE {
            self.pia.read(address - PIA_BASE)
        } else if address & 0xFF00 == ROM_BASE {
            self.rom.read(address - ROM_BASE)
        } else {
            tracing::trace!("[BUS] Read from unmapped address {:#06X}", address);
            0xFF
        }
    }

    pub fn write_byte(&mut self, address: u16, value: u8) {
        if (address as usize) < RAM_SIZE {
            self.ram.write(address, value);
        } else if address & 0xF000 == BANK_BASE {
            self.ram.write(address - BANK_OFFSET, value);
        } else if address == PIA_KBD {
            self.pia.write(0, value);
        } else if address == PIA_DSP {
            self.pia.write(2, value);
            // The display strobe line inverts the top bit on its way out
            self.terminal.write_char(value ^ 0x80);
        } else {
            // ROM and unmapped addresses swallow writes
            tracing::trace!(
                "[BUS] Ignored write to {:#06X} = {:#04X}",
                address,
                value
            );
        }
    }

    pub fn read_word(&mut self, address: u16) -> u16 {
        let low_byte = self.read_byte(address) as u16;
        let high_byte = self.read_byte(address.wrapping_add(1)) as u16;
        (high_byte << 8) | low_byte
    }

    pub fn write_word(&mut self, address: u16, value: u16) {
        self.write_byte(address, (value & 0x00FF) as u8);
        self.write_byte(address.wrapping_add(1), (value >> 8) as u8);
    }

    pub fn write_block(&mut self, start_addr: u16, data: &[u8]) {
        let mut addr = start_addr;
        for &byte in data {
            self.write_byte(addr, byte);
            addr = addr.wrapping_add(1);
        }
    }

    /// Machine reset: RAM to its unprogrammed fill, terminal blanked. The
    /// CPU registers are the engine's concern.
    pub fn reset(&mut self) {
        self.ram.fill();
        self.terminal.reset();
    }
}
