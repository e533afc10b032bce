use std::{
    collections::HashMap,
    io::{ErrorKind, Read, Write},
    net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs, UdpSocket},
    time::{Duration, Instant},
};

use crate::{
    cpu::Cpu,
    machine::{Event, Machine, Reply, SessionId},
    telnet::TELNET_PORT,
    tftp::TFTP_PORT,
};

/// Instruction batch cadence.
pub const TICK_INTERVAL: Duration = Duration::from_millis(10);
/// Cursor blink cadence.
pub const BLINK_INTERVAL: Duration = Duration::from_millis(600);

const MAX_DATAGRAM: usize = 4 + 512;

/// Socket front end. Owns the listener, the loader socket and the live
/// telnet sessions; everything it does is translate socket traffic into
/// [`Event`]s, hand them to the machine one at a time, and write the
/// resulting [`Reply`] bytes back out. No call here blocks.
pub struct Server {
    telnet: TcpListener,
    tftp: UdpSocket,
    sessions: HashMap<SessionId, TcpStream>,
    peers: HashMap<SessionId, SocketAddr>,
    next_session: u32,
}

impl Server {
    /// Bind the well-known ports on all interfaces. Needs the privileges
    /// that come with ports below 1024.
    pub fn bind_default() -> anyhow::Result<Self> {
        Self::bind(("0.0.0.0", TELNET_PORT), ("0.0.0.0", TFTP_PORT))
    }

    pub fn bind<A: ToSocketAddrs, B: ToSocketAddrs>(
        telnet_addr: A,
        tftp_addr: B,
    ) -> anyhow::Result<Self> {
        let telnet = TcpListener::bind(telnet_addr)?;
        telnet.set_nonblocking(true)?;

        let tftp = UdpSocket::bind(tftp_addr)?;
        tftp.set_nonblocking(true)?;

        tracing::info!(
            "Listening on {} (telnet) and {} (loader)",
            telnet.local_addr()?,
            tftp.local_addr()?
        );

        Ok(Server {
            telnet,
            tftp,
            sessions: HashMap::new(),
            peers: HashMap::new(),
            next_session: 0,
        })
    }

    pub fn telnet_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.telnet.local_addr()?)
    }

    pub fn tftp_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.tftp.local_addr()?)
    }

    /// Run the machine forever: poll sockets, fire the instruction batch
    /// every 10 ms and the cursor blink every 600 ms.
    pub fn run<C: Cpu>(&mut self, machine: &mut Machine<C>) -> anyhow::Result<()> {
        let mut last_tick = Instant::now();
        let mut last_blink = Instant::now();

        loop {
            self.poll(machine)?;

            if last_tick.elapsed() >= TICK_INTERVAL {
                machine.dispatch(Event::Tick);
                last_tick = Instant::now();
            }

            if last_blink.elapsed() >= BLINK_INTERVAL {
                machine.dispatch(Event::CursorBlink);
                last_blink = Instant::now();
            }

            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// One pass over all sockets. Every byte and datagram becomes an event
    /// dispatched to completion before the next one.
    pub fn poll<C: Cpu>(&mut self, machine: &mut Machine<C>) -> anyhow::Result<()> {
        self.accept_telnet(machine)?;
        self.read_telnet(machine);
        self.recv_tftp(machine)?;
        Ok(())
    }

    fn next_session_id(&mut self) -> SessionId {
        let id = SessionId(self.next_session);
        self.next_session = self.next_session.wrapping_add(1);
        id
    }

    fn accept_telnet<C: Cpu>(&mut self, machine: &mut Machine<C>) -> anyhow::Result<()> {
        loop {
            match self.telnet.accept() {
                Ok((stream, peer)) => {
                    stream.set_nonblocking(true)?;
                    let session = self.next_session_id();
                    tracing::info!("[TELNET] {} connected as {:?}", peer, session);

                    if let Some(Reply::Telnet(_, bytes)) =
                        machine.dispatch(Event::TelnetOpen(session))
                    {
                        let mut stream = stream;
                        if let Err(e) = stream.write_all(&bytes) {
                            tracing::warn!("[TELNET] Greeting to {} failed: {}", peer, e);
                            continue;
                        }
                        self.sessions.insert(session, stream);
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn read_telnet<C: Cpu>(&mut self, machine: &mut Machine<C>) {
        let mut closed = Vec::new();
        let mut inbound = Vec::new();
        let mut buffer = [0u8; 256];

        for (&session, stream) in &mut self.sessions {
            match stream.read(&mut buffer) {
                Ok(0) => closed.push(session),
                Ok(n) => inbound.extend(buffer[..n].iter().map(|&b| (session, b))),
                Err(e) if e.kind() == ErrorKind::WouldBlock => {}
                Err(e) => {
                    tracing::warn!("[TELNET] {:?} read error: {}", session, e);
                    closed.push(session);
                }
            }
        }

        for session in closed {
            tracing::info!("[TELNET] {:?} disconnected", session);
            self.sessions.remove(&session);
        }

        for (session, byte) in inbound {
            machine.dispatch(Event::TelnetData(session, byte));
        }
    }

    fn recv_tftp<C: Cpu>(&mut self, machine: &mut Machine<C>) -> anyhow::Result<()> {
        let mut buffer = [0u8; MAX_DATAGRAM];

        loop {
            match self.tftp.recv_from(&mut buffer) {
                Ok((len, peer)) => {
                    let session = self.next_session_id();
                    self.peers.insert(session, peer);

                    let reply =
                        machine.dispatch(Event::TftpPacket(session, buffer[..len].to_vec()));
                    if let Some(Reply::Tftp(session, bytes)) = reply {
                        if let Some(peer) = self.peers.get(&session) {
                            if let Err(e) = self.tftp.send_to(&bytes, peer) {
                                tracing::warn!("[TFTP] Ack to {} failed: {}", peer, e);
                            }
                        }
                    }
                    self.peers.remove(&session);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(e.into()),
            }
        }
    }
}
