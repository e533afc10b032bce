use std::{cell::RefCell, rc::Rc};

use serde::{Deserialize, Serialize};

use crate::{
    bus::{Bus, PIA_KBD},
    cpu::{Cpu, Io},
    renderer::Renderer,
    rom::MonitorRom,
    telnet::{self, KeyAction},
    tftp::TftpLoader,
};

/// Instructions executed per scheduler tick.
pub const INSTRUCTIONS_CHUNK: u32 = 10_000;

/// Opaque handle for a network connection or datagram peer. Owned by the
/// socket layer; the machine only echoes it back in replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u32);

/// Everything that can happen to the machine, in the order the socket and
/// timer layer delivers it. Dispatch is strictly one event at a time; that
/// is the whole concurrency model.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Scheduler tick: run one instruction batch.
    Tick,
    /// Cursor blink timer.
    CursorBlink,
    /// A telnet client connected.
    TelnetOpen(SessionId),
    /// One byte from a telnet client.
    TelnetData(SessionId, u8),
    /// One datagram for the loader.
    TftpPacket(SessionId, Vec<u8>),
}

/// Bytes the machine wants sent back out.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Telnet(SessionId, Vec<u8>),
    Tftp(SessionId, Vec<u8>),
}

pub struct Machine<C: Cpu> {
    pub bus: Rc<RefCell<Bus>>,
    pub cpu: C,
    loader: TftpLoader,
    ticks: u64,
}

impl<C: Cpu> Machine<C> {
    pub fn new<F>(rom: MonitorRom, cpu: F) -> Self
    where
        F: FnOnce(Io) -> C,
    {
        let bus = Rc::new(RefCell::new(Bus::new(rom)));
        let cpu = cpu(Io::new(bus.clone()));

        Self {
            bus,
            cpu,
            loader: TftpLoader::new(),
            ticks: 0,
        }
    }

    /// Single entry point for the cooperative event loop. A call always
    /// runs to completion before the next event is delivered, so bus and
    /// terminal state never see interleaved mutation.
    pub fn dispatch(&mut self, event: Event) -> Option<Reply> {
        match event {
            Event::Tick => {
                self.tick();
                None
            }
            Event::CursorBlink => {
                self.bus.borrow_mut().terminal.toggle_cursor();
                None
            }
            Event::TelnetOpen(session) => {
                tracing::info!("[TELNET] Session {:?} connected", session);
                Some(Reply::Telnet(session, telnet::GREETING.to_vec()))
            }
            Event::TelnetData(_, value) => {
                match telnet::filter_byte(value) {
                    KeyAction::Key(key) => self.key_press(key),
                    KeyAction::Reset => {
                        tracing::info!("[TELNET] Ctrl-C, resetting machine");
                        self.reset();
                    }
                }
                None
            }
            Event::TftpPacket(session, packet) => {
                let mut bus = self.bus.borrow_mut();
                self.loader
                    .receive(&mut bus, &packet)
                    .map(|ack| Reply::Tftp(session, ack.to_vec()))
            }
        }
    }

    /// One scheduler tick: a bounded batch of instructions. Never runs
    /// concurrently with anything else.
    pub fn tick(&mut self) {
        self.cpu.exec(INSTRUCTIONS_CHUNK);
        self.ticks += 1;
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Inject a keypress the way the hardware does: through the bus write
    /// path, strobe bit set.
    pub fn key_press(&mut self, value: u8) {
        self.bus.borrow_mut().write_byte(PIA_KBD, value | 0x80);
    }

    /// Full reset: RAM to 0xFF, terminal blanked with the cursor home, CPU
    /// registers reinitialized.
    pub fn reset(&mut self) {
        self.bus.borrow_mut().reset();
        self.cpu.reset();
    }

    /// Boot banner, written straight to the terminal before the CPU runs.
    pub fn startup(&mut self) {
        let mut bus = self.bus.borrow_mut();
        bus.terminal.clear_screen();
        bus.terminal.write_str("ESPPLE STARTED");
        bus.terminal.new_line();
        bus.terminal.write_str("40X24 TEXT TERMINAL");
        bus.terminal.new_line();
    }

    /// Rendered screen contents for the display collaborator.
    pub fn screen_text(&self) -> String {
        let bus = self.bus.borrow();
        Renderer::new(&bus.terminal).as_text()
    }
}
