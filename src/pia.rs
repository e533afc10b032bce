use serde::{Deserialize, Serialize};

/// MC6821 peripheral interface, reduced to the keyboard/display register
/// pair the machine actually wires up.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Pia {
    pub keyboard_register: u8,
    pub keyboard_control: u8,
    pub display_register: u8,
    pub display_control: u8,
}

impl Pia {
    pub fn new() -> Self {
        Pia::default()
    }

    /// Single-slot keyboard mailbox: a later key overwrites an unread one.
    /// The stored byte always carries the strobe bit.
    pub fn deposit_key(&mut self, value: u8) {
        self.keyboard_register = value | 0x80;
        self.keyboard_control = 0xFF;
    }

    pub fn key_pending(&self) -> bool {
        self.keyboard_control != 0x00
    }

    pub fn read(&mut self, offset: u16) -> u8 {
        match offset {
            0x0 => {
                // Reading the keyboard data register acknowledges the key
                self.keyboard_control = 0x00;
                tracing::trace!(
                    "[PIA] [RD] [KeyboardReg] = {:02X}",
                    self.keyboard_register
                );
                self.keyboard_register
            }
            0x1 => self.keyboard_control,
            0x2 => self.display_register,
            0x3 => self.display_control,
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, offset: u16, value: u8) {
        match offset {
            0x0 => {
                tracing::trace!("[PIA] [WR] [KeyboardReg] = {:02X}", value);
                self.keyboard_register = value;
                self.keyboard_control = 0xFF;
            }
            0x2 => {
                self.display_register = value;
            }
            // control registers accept writes but nothing observes them
            0x1 => self.keyboard_control = value,
            0x3 => self.display_control = value,
            _ => (),
        }
    }
}
