pub mod bus;
pub mod cpu;
pub mod machine;
pub mod memory;
pub mod pia;
pub mod renderer;
pub mod rom;
pub mod server;
pub mod telnet;
pub mod terminal;
pub mod tftp;

pub use bus::Bus;
pub use cpu::{Cpu, Io};
pub use machine::{Event, Machine, Reply, SessionId, INSTRUCTIONS_CHUNK};
pub use memory::{Ram, RAM_SIZE};
pub use pia::Pia;
pub use renderer::Renderer;
pub use rom::{MonitorRom, RomError};
pub use server::Server;
pub use terminal::{Terminal, TERM_HEIGHT, TERM_WIDTH};
pub use tftp::TftpLoader;

/// Build a machine around a monitor image and an instruction engine.
pub fn get_machine<C, F>(monitor: &[u8], cpu: F) -> Result<Machine<C>, RomError>
where
    C: Cpu,
    F: FnOnce(Io) -> C,
{
    let rom = MonitorRom::from_bytes(monitor)?;
    Ok(Machine::new(rom, cpu))
}
