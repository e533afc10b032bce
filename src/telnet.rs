/// Telnet front door, TCP port 23.
pub const TELNET_PORT: u16 = 23;

/// Sent on connect: banner plus IAC DO LINEMODE, IAC WILL ECHO, which puts
/// the client into character-at-a-time mode.
pub const GREETING: &[u8] = b"Welcome to Espple!\n\xFF\xFD\x22\xFF\xFB\x01";

/// What an inbound session byte turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Deposit this byte as a keypress.
    Key(u8),
    /// Ctrl-C: full machine reset, nothing reaches the keyboard.
    Reset,
}

/// Per-byte filter between the socket and the keyboard register.
pub fn filter_byte(value: u8) -> KeyAction {
    match value {
        // lowercase to uppercase; the character set has no lowercase
        0x61..=0x7A => KeyAction::Key(value ^ 0x20),
        // LF to CR
        0x0A => KeyAction::Key(0x0D),
        // DEL to "rub out"
        0x7F => KeyAction::Key(b'_'),
        0x03 => KeyAction::Reset,
        _ => KeyAction::Key(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_maps_to_uppercase() {
        assert_eq!(filter_byte(b'a'), KeyAction::Key(b'A'));
        assert_eq!(filter_byte(b'z'), KeyAction::Key(b'Z'));
    }

    #[test]
    fn test_uppercase_is_unchanged() {
        assert_eq!(filter_byte(b'A'), KeyAction::Key(b'A'));
        assert_eq!(filter_byte(b'Z'), KeyAction::Key(b'Z'));
    }

    #[test]
    fn test_line_feed_becomes_carriage_return() {
        assert_eq!(filter_byte(0x0A), KeyAction::Key(0x0D));
    }

    #[test]
    fn test_delete_becomes_rub_out() {
        assert_eq!(filter_byte(0x7F), KeyAction::Key(b'_'));
    }

    #[test]
    fn test_ctrl_c_requests_reset() {
        assert_eq!(filter_byte(0x03), KeyAction::Reset);
    }

    #[test]
    fn test_other_bytes_pass_through() {
        assert_eq!(filter_byte(b'0'), KeyAction::Key(b'0'));
        assert_eq!(filter_byte(0x0D), KeyAction::Key(0x0D));
        assert_eq!(filter_byte(0x60), KeyAction::Key(0x60));
        assert_eq!(filter_byte(0x7B), KeyAction::Key(0x7B));
    }

    #[test]
    fn test_greeting_negotiation_bytes() {
        assert!(GREETING.starts_with(b"Welcome to Espple!\n"));
        assert_eq!(&GREETING[19..], &[0xFF, 0xFD, 0x22, 0xFF, 0xFB, 0x01]);
    }
}
