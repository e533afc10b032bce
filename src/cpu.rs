use std::{cell::RefCell, rc::Rc};

use crate::bus::Bus;

/// Seam for the instruction engine. The machine core only schedules
/// execution and resets; fetch/decode/execute lives behind this trait.
pub trait Cpu {
    /// Reinitialize the engine's registers, as after the reset line.
    fn reset(&mut self);

    /// Run at most `instructions` instructions against the bus.
    fn exec(&mut self, instructions: u32);
}

/// Byte-level hooks handed to the engine. All memory traffic goes through
/// the shared bus so peripheral side effects fire on every access.
pub struct Io {
    pub bus: Rc<RefCell<Bus>>,
}

impl Io {
    pub fn new(bus: Rc<RefCell<Bus>>) -> Self {
        Io { bus }
    }

    pub fn read_byte(&self, address: u16) -> u8 {
        self.bus.borrow_mut().read_byte(address)
    }

    pub fn write_byte(&mut self, address: u16, value: u8) {
        self.bus.borrow_mut().write_byte(address, value);
    }
}
