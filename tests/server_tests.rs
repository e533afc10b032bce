use std::{
    io::{Read, Write},
    net::{TcpStream, UdpSocket},
    time::Duration,
};

use espple::{
    bus::{PIA_DSP, PIA_KBD, PIA_KBD_CTRL},
    get_machine,
    machine::Event,
    Cpu, Io, Machine, Server,
};

struct EchoCpu {
    io: Io,
}

impl Cpu for EchoCpu {
    fn reset(&mut self) {}

    fn exec(&mut self, _instructions: u32) {
        while self.io.read_byte(PIA_KBD_CTRL) != 0 {
            let key = self.io.read_byte(PIA_KBD);
            self.io.write_byte(PIA_DSP, key);
        }
    }
}

fn machine_and_server() -> (Machine<EchoCpu>, Server) {
    let machine = get_machine(&[0xEA; 0x100], |io| EchoCpu { io }).unwrap();
    let server = Server::bind("127.0.0.1:0", "127.0.0.1:0").unwrap();
    (machine, server)
}

fn settle() {
    std::thread::sleep(Duration::from_millis(20));
}

#[test]
fn test_telnet_session_end_to_end() {
    let (mut machine, mut server) = machine_and_server();
    let addr = server.telnet_addr().unwrap();

    let mut client = TcpStream::connect(addr).unwrap();
    client
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    settle();
    server.poll(&mut machine).unwrap();

    // greeting arrives on connect, negotiation bytes included
    let mut greeting = [0u8; 25];
    client.read_exact(&mut greeting).unwrap();
    assert!(greeting.starts_with(b"Welcome to Espple!\n"));
    assert_eq!(&greeting[19..], &[0xFF, 0xFD, 0x22, 0xFF, 0xFB, 0x01]);

    client.write_all(b"hi").unwrap();
    settle();
    server.poll(&mut machine).unwrap();
    machine.dispatch(Event::Tick);

    // only the last byte survives the single-slot mailbox
    assert!(machine.screen_text().starts_with('I'));
}

#[test]
fn test_tftp_load_end_to_end() {
    let (mut machine, mut server) = machine_and_server();
    let addr = server.tftp_addr().unwrap();

    machine.bus.borrow_mut().write_word(0x0026, 0x0300);

    let client = UdpSocket::bind("127.0.0.1:0").unwrap();
    client
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();

    client.send_to(&[0x00, 0x02, b'f', 0x00], addr).unwrap();
    settle();
    server.poll(&mut machine).unwrap();

    client
        .send_to(&[0x00, 0x03, 0x00, 0x01, b'A', b'B'], addr)
        .unwrap();
    settle();
    server.poll(&mut machine).unwrap();

    let mut ack = [0u8; 8];
    let (len, _) = client.recv_from(&mut ack).unwrap();
    assert_eq!(&ack[..len], &[0x00, 0x04, 0x00, 0x01]);

    let mut bus = machine.bus.borrow_mut();
    assert_eq!(bus.read_byte(0x0300), b'A');
    assert_eq!(bus.read_byte(0x0301), b'B');
}
