use crate::terminal::{Terminal, TERM_HEIGHT, TERM_WIDTH};

/// Decodes the terminal grid back to ASCII for whatever drives the actual
/// display. Cells store six-bit display codes: 0x00-0x1F are the '@'-'_'
/// block, 0x20-0x3F map straight to ASCII.
pub struct Renderer<'a> {
    terminal: &'a Terminal,
}

impl<'a> Renderer<'a> {
    pub fn new(terminal: &'a Terminal) -> Self {
        Self { terminal }
    }

    pub fn as_text(&self) -> String {
        let mut text = String::new();
        for y in 0..TERM_HEIGHT {
            for x in 0..TERM_WIDTH {
                text.push(decode(self.terminal.cell(x, y)));
            }
            text.push('\n');
        }
        text
    }

    pub fn line(&self, y: usize) -> String {
        (0..TERM_WIDTH)
            .map(|x| decode(self.terminal.cell(x, y)))
            .collect()
    }
}

fn decode(cell: u8) -> char {
    let code = cell & 0x3F;
    if code < 0x20 {
        (code + 0x40) as char
    } else {
        code as char
    }
}
