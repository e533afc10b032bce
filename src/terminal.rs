use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

pub const TERM_WIDTH: usize = 40;
pub const TERM_HEIGHT: usize = 24;

const BLANK: u8 = 0x20;

/// 40x24 character terminal. Cells hold display codes already masked to six
/// bits, the way the video shifter consumes them.
///
/// The cursor blink timer and `write_char` both repaint the cursor cell.
/// There is no preemption anywhere in this machine, so `cursor_disabled` is
/// not a lock: it only keeps an interleaved blink event from rendering the
/// cursor while a cell update is in flight.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct Terminal {
    #[serde(with = "BigArray")]
    cells: [u8; TERM_WIDTH * TERM_HEIGHT],
    x: u8,
    y: u8,
    cursor_visible: bool,
    cursor_disabled: bool,
}

impl Terminal {
    pub fn new() -> Self {
        Terminal::default()
    }

    pub fn cursor(&self) -> (u8, u8) {
        (self.x, self.y)
    }

    pub fn cell(&self, x: usize, y: usize) -> u8 {
        self.cells[y * TERM_WIDTH + x]
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Blink timer entry point. Flips visibility and repaints the cursor
    /// cell; while `cursor_disabled` is set the cell is painted blank.
    pub fn toggle_cursor(&mut self) {
        self.cursor_visible = !self.cursor_visible;
        self.paint_cursor_cell();
    }

    fn paint_cursor_cell(&mut self) {
        let index = self.y as usize * TERM_WIDTH + self.x as usize;
        // x sits at 40 after a character lands in the last column; the slot
        // past the end of the grid is simply not painted
        if let Some(cell) = self.cells.get_mut(index) {
            *cell = if self.cursor_visible || self.cursor_disabled {
                BLANK
            } else {
                0x00
            };
        }
    }

    pub fn write_char(&mut self, value: u8) {
        // Blank the cursor cell before touching the grid
        self.cursor_disabled = true;
        self.toggle_cursor();

        // End of line reached or return pressed
        if self.x > 39 || value == 0x0D || value == 0x0A {
            self.x = 0;

            if self.y >= 23 {
                self.scroll_up();
            } else {
                self.y += 1;
            }
        }

        // Only printable characters occupy a cell or move the cursor
        if (0x20..=0x7E).contains(&value) {
            self.cells[self.y as usize * TERM_WIDTH + self.x as usize] = value & 0x3F;
            self.x += 1;
        }

        self.cursor_disabled = false;
    }

    /// Copy rows 1..24 up one line and blank the last row.
    fn scroll_up(&mut self) {
        self.cells.copy_within(TERM_WIDTH.., 0);
        self.cells[TERM_WIDTH * (TERM_HEIGHT - 1)..].fill(BLANK);
    }

    /// Historic quirk, kept as-is: an out-of-range row clamps the *column*
    /// to height-1 instead of clamping the row. The row itself is still
    /// bounded so the cursor can never leave the grid.
    pub fn set_cursor_position(&mut self, x: u8, y: u8) {
        let mut x = x.min(TERM_WIDTH as u8 - 1);
        if y >= TERM_HEIGHT as u8 {
            x = TERM_HEIGHT as u8 - 1;
        }

        self.x = x;
        self.y = y.min(TERM_HEIGHT as u8 - 1);
    }

    pub fn clear_screen(&mut self) {
        for _ in 0..TERM_WIDTH * TERM_HEIGHT {
            self.write_char(BLANK);
        }
        self.x = 0;
        self.y = 0;
    }

    /// Hard reset: blank grid, cursor home. Unlike `clear_screen` this does
    /// not replay the write path.
    pub fn reset(&mut self) {
        self.cells = [BLANK; TERM_WIDTH * TERM_HEIGHT];
        self.x = 0;
        self.y = 0;
    }

    pub fn new_line(&mut self) {
        self.write_char(0x0A);
    }

    pub fn space(&mut self) {
        self.write_char(BLANK);
    }

    pub fn write_str(&mut self, text: &str) {
        for byte in text.bytes() {
            self.write_char(byte);
        }
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Terminal {
            cells: [BLANK; TERM_WIDTH * TERM_HEIGHT],
            x: 0,
            y: 0,
            cursor_visible: false,
            cursor_disabled: false,
        }
    }
}

impl std::fmt::Debug for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Terminal {{ cursor: ({}, {}), visible: {} }}",
            self.x, self.y, self.cursor_visible
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_after_forty_columns() {
        let mut term = Terminal::new();
        for _ in 0..41 {
            term.write_char(b'A');
        }

        // 40 characters fill row 0, the 41st wraps to row 1 column 0
        for x in 0..TERM_WIDTH {
            assert_eq!(term.cell(x, 0), b'A' & 0x3F);
        }
        assert_eq!(term.cell(0, 1), b'A' & 0x3F);
        assert_eq!(term.cursor(), (1, 1));
    }

    #[test]
    fn test_carriage_return_resets_column() {
        let mut term = Terminal::new();
        term.write_str("HI");
        term.write_char(0x0D);
        assert_eq!(term.cursor(), (0, 1));
        // CR itself occupies no cell
        assert_eq!(term.cell(2, 0), BLANK);
        assert_eq!(term.cell(0, 1), BLANK);
    }

    #[test]
    fn test_line_feed_behaves_like_carriage_return() {
        let mut term = Terminal::new();
        term.write_char(0x0A);
        assert_eq!(term.cursor(), (0, 1));
    }

    #[test]
    fn test_unprintable_bytes_do_not_move_cursor() {
        let mut term = Terminal::new();
        term.write_char(0x07);
        term.write_char(0x7F);
        assert_eq!(term.cursor(), (0, 0));
    }

    #[test]
    fn test_scroll_discards_top_row() {
        let mut term = Terminal::new();
        term.write_str("TOP");
        for _ in 0..24 {
            term.new_line();
        }
        term.write_str("BOTTOM");

        assert_eq!(term.cursor().1, 23);
        // row 0 content was discarded by the scroll
        assert_eq!(term.cell(0, 0), BLANK);
        assert_eq!(term.cell(0, 23), b'B' & 0x3F);
    }

    #[test]
    fn test_scroll_moves_rows_up() {
        let mut term = Terminal::new();
        for row in 0..24 {
            term.write_char(b'0' + (row % 10));
            if row < 23 {
                term.new_line();
            }
        }
        // cursor sits on row 23; one more newline scrolls
        term.new_line();
        assert_eq!(term.cell(0, 0), (b'0' + 1) & 0x3F);
        assert_eq!(term.cell(0, 22), (b'0' + 23 % 10) & 0x3F);
        for x in 0..TERM_WIDTH {
            assert_eq!(term.cell(x, 23), BLANK);
        }
    }

    #[test]
    fn test_clear_screen() {
        let mut term = Terminal::new();
        term.write_str("SOMETHING");
        term.clear_screen();
        assert!(term.cells().iter().all(|&c| c == BLANK));
        assert_eq!(term.cursor(), (0, 0));
    }

    #[test]
    fn test_set_cursor_position_clamps() {
        let mut term = Terminal::new();
        term.set_cursor_position(50, 3);
        assert_eq!(term.cursor(), (39, 3));

        // out-of-range row forces the column, not the row
        term.set_cursor_position(5, 99);
        assert_eq!(term.cursor().0, 23);
        assert!((term.cursor().1 as usize) < TERM_HEIGHT);
    }

    #[test]
    fn test_cursor_blink_paints_cell() {
        let mut term = Terminal::new();
        term.toggle_cursor();
        let shown = term.cell(0, 0);
        term.toggle_cursor();
        let hidden = term.cell(0, 0);
        assert_ne!(shown, hidden);
        // visible (or disabled) paints 0x20, the off phase paints 0x00
        assert_eq!(shown, BLANK);
        assert_eq!(hidden, 0x00);
    }

    #[test]
    fn test_write_leaves_cursor_cell_blank() {
        let mut term = Terminal::new();
        // blink lands right before a write; the write must still end with
        // the old cursor cell in its blank state
        term.toggle_cursor();
        term.write_char(b'Z');
        assert_eq!(term.cell(0, 0), b'Z' & 0x3F);
        assert_eq!(term.cell(1, 0), BLANK);
    }
}
