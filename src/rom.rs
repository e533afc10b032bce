use std::{fs::File, io::Read, path::PathBuf};

use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;
use thiserror::Error;

/// The monitor occupies the top page of the address space, 0xFF00-0xFFFF.
pub const ROM_SIZE: usize = 0x100;

#[derive(Debug, Error)]
pub enum RomError {
    #[error("monitor image must be exactly 256 bytes, got {0}")]
    InvalidSize(usize),
}

/// Read-only monitor ROM. The bus never routes writes here.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorRom {
    pub rom_path: Option<PathBuf>,
    #[serde(with = "BigArray")]
    data: [u8; ROM_SIZE],
}

impl MonitorRom {
    pub fn from_bytes(rom: &[u8]) -> Result<Self, RomError> {
        if rom.len() != ROM_SIZE {
            return Err(RomError::InvalidSize(rom.len()));
        }

        let mut data = [0xFF; ROM_SIZE];
        data.copy_from_slice(rom);

        Ok(MonitorRom {
            rom_path: None,
            data,
        })
    }

    pub fn load(rom_path: PathBuf) -> anyhow::Result<Self> {
        let mut file = File::open(&rom_path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;

        let mut rom = Self::from_bytes(&buffer)?;
        rom.rom_path = Some(rom_path);

        Ok(rom)
    }

    pub fn read(&self, offset: u16) -> u8 {
        self.data[offset as usize & 0xFF]
    }
}

impl Default for MonitorRom {
    fn default() -> Self {
        MonitorRom {
            rom_path: None,
            data: [0xFF; ROM_SIZE],
        }
    }
}

impl std::fmt::Debug for MonitorRom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MonitorRom {{ path: {:?} }}", self.rom_path)
    }
}
