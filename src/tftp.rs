use serde::{Deserialize, Serialize};

use crate::bus::Bus;

/// Loader socket, UDP port 69.
pub const TFTP_PORT: u16 = 69;

/// Zero-page vector the running program sets to the intended load address,
/// low byte first. Sampled when a write request arrives.
pub const LOAD_VECTOR: u16 = 0x0026;

const OPCODE_WRQ: u8 = 0x02;
const OPCODE_DATA: u8 = 0x03;

/// Write-only TFTP-style loader. The whole transfer state is one address
/// cursor: a write request points it at the target, each data packet
/// deposits its payload and advances it. There is no retry, no timeout and
/// no block sequencing; an interrupted transfer just leaves the cursor
/// where it was until the next write request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TftpLoader {
    cursor: u16,
}

impl TftpLoader {
    pub fn new() -> Self {
        TftpLoader::default()
    }

    pub fn cursor(&self) -> u16 {
        self.cursor
    }

    /// Handle one datagram. Returns the acknowledgment to send, if any:
    /// only data packets are acknowledged, echoing the incoming block
    /// number without validating it.
    pub fn receive(&mut self, bus: &mut Bus, packet: &[u8]) -> Option<[u8; 4]> {
        if packet.len() < 4 {
            return None;
        }

        match packet[1] {
            OPCODE_WRQ => {
                let target = bus.read_word(LOAD_VECTOR);
                self.cursor = Bus::translate_load_address(target);
                tracing::info!("[TFTP] Write request, loading at {:#06X}", self.cursor);
                None
            }
            OPCODE_DATA => {
                let payload = &packet[4..];
                bus.ram.load(self.cursor, payload);
                self.cursor = self.cursor.wrapping_add(payload.len() as u16);
                tracing::trace!(
                    "[TFTP] Block {:02X}{:02X}, {} bytes, cursor now {:#06X}",
                    packet[2],
                    packet[3],
                    payload.len(),
                    self.cursor
                );
                Some([0x00, 0x04, packet[2], packet[3]])
            }
            opcode => {
                tracing::trace!("[TFTP] Ignored opcode {:#04X}", opcode);
                None
            }
        }
    }
}
