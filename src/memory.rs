use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

/// Addressable RAM, 20 KiB.
pub const RAM_SIZE: usize = 0x5000;

#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct Ram {
    #[serde(with = "BigArray")]
    data: [u8; RAM_SIZE],
}

impl Ram {
    pub fn new() -> Self {
        Ram::default()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn read(&self, address: u16) -> u8 {
        self.data[address as usize]
    }

    pub fn write(&mut self, address: u16, value: u8) {
        self.data[address as usize] = value;
    }

    /// Reset fill, matching unprogrammed memory.
    pub fn fill(&mut self) {
        self.data = [0xFF; RAM_SIZE];
    }

    /// Block copy starting at `start`. Bytes that would land past the end of
    /// RAM are dropped.
    pub fn load(&mut self, start: u16, buffer: &[u8]) {
        let start = start as usize;
        if start >= RAM_SIZE {
            tracing::warn!(
                "Attempt to load {} bytes at out of bounds address {:#06X}",
                buffer.len(),
                start
            );
            return;
        }

        let len = buffer.len().min(RAM_SIZE - start);
        self.data[start..start + len].copy_from_slice(&buffer[..len]);
    }
}

impl Default for Ram {
    fn default() -> Self {
        Ram {
            data: [0xFF; RAM_SIZE],
        }
    }
}

impl std::fmt::Debug for Ram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ram {{ size: {:#06X} }}", self.data.len())
    }
}
