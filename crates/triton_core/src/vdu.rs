//! Thomson-CSF SFC96364 video display controller.
//!
//! The VDU sits between the port-5 latch and the 1 KiB text page at
//! 0x1000. It owns only the cursor and the ring-scroll start row; the
//! character cells themselves live in main memory, which is why `strobe`
//! takes the memory image. Scrolling never moves bytes: the controller
//! bumps `startrow` and every access goes through the rotated address
//! `0x1000 + ((64 * startrow + offset) % 1024)`.

/// Base address of the video page in main memory.
pub const VDU_BASE: usize = 0x1000;
/// Character cells per row.
pub const VDU_COLS: usize = 64;
/// Rows in the video page.
pub const VDU_ROWS: usize = 16;
/// Total character cells.
pub const VDU_CELLS: usize = VDU_COLS * VDU_ROWS;

/// The cleared cell value.
const BLANK: u8 = 0x20;

/// Cursor and scroll state of the display controller.
#[derive(Default)]
pub struct VduState {
    /// Linear cursor index into the displayed 64x16 grid, 0..1024.
    pub cursor_position: usize,
    /// Buffer row currently shown at the top of the screen, 0..16.
    pub startrow: usize,
}

impl VduState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotated main-memory address of the displayed cell `offset`.
    fn cell_addr(&self, offset: usize) -> usize {
        VDU_BASE + ((VDU_COLS * self.startrow + offset) % VDU_CELLS)
    }

    fn write_cell(&self, memory: &mut [u8], offset: usize, value: u8) {
        memory[self.cell_addr(offset)] = value;
    }

    /// Blank the 64 cells of the row containing `offset`.
    fn erase_row(&self, memory: &mut [u8], offset: usize) {
        let row_start = offset - offset % VDU_COLS;
        for i in 0..VDU_COLS {
            self.write_cell(memory, row_start + i, BLANK);
        }
    }

    /// Scroll one row: the cursor stays on the bottom visible row and the
    /// row it lands on is blanked.
    fn scroll_up(&mut self, memory: &mut [u8]) {
        self.cursor_position -= VDU_COLS;
        self.startrow = (self.startrow + 1) % VDU_ROWS;
        for i in 0..VDU_COLS {
            self.write_cell(memory, self.cursor_position + i, BLANK);
        }
    }

    /// Interpret one strobed byte.
    ///
    /// `memory` is the CPU's address space (the VDU only touches the page at
    /// 0x1000). The high bit of `value` is ignored; the port latch has
    /// already decided this byte deserves a strobe.
    pub fn strobe(&mut self, memory: &mut [u8], value: u8) {
        let input = value & 0x7f;
        match input {
            // NUL and EOT have no effect on this controller.
            0x00 | 0x04 => {}
            0x08 => {
                // Cursor left
                self.cursor_position = (self.cursor_position + VDU_CELLS - 1) % VDU_CELLS;
            }
            0x09 => {
                // Cursor right
                self.cursor_position = (self.cursor_position + 1) % VDU_CELLS;
            }
            0x0a => {
                // Cursor down, erasing the next line when the screen scrolls
                self.cursor_position += VDU_COLS;
                if self.cursor_position >= VDU_CELLS {
                    self.scroll_up(memory);
                }
            }
            0x0b => {
                // Cursor up
                self.cursor_position = (self.cursor_position + VDU_CELLS - VDU_COLS) % VDU_CELLS;
            }
            0x0c => {
                // Page clear and home
                memory[VDU_BASE..VDU_BASE + VDU_CELLS].fill(BLANK);
                self.cursor_position = 0;
                self.startrow = 0;
            }
            0x0d => {
                // Carriage return with end-of-line erasure
                if self.cursor_position % VDU_COLS != 0 {
                    while self.cursor_position % VDU_COLS != 0 {
                        self.write_cell(memory, self.cursor_position, BLANK);
                        self.cursor_position += 1;
                    }
                    self.cursor_position -= VDU_COLS;
                }
            }
            // Page up / page down: only one page of RAM is fitted.
            0x18 | 0x19 => {}
            0x1a => {
                // Erase the cursor's line, cursor unmoved
                self.erase_row(memory, self.cursor_position);
            }
            0x1b => {
                // Roll the display up one row without erasing text
                self.startrow = (self.startrow + 1) % VDU_ROWS;
                self.cursor_position = (self.cursor_position + VDU_CELLS - VDU_COLS) % VDU_CELLS;
            }
            0x1c => {
                // Home cursor
                self.cursor_position = 0;
            }
            0x1d => {
                // Carriage return without erasure
                self.cursor_position -= self.cursor_position % VDU_COLS;
            }
            _ => {
                // Character write, scrolling off the bottom of the page
                self.write_cell(memory, self.cursor_position, input);
                self.cursor_position += 1;
                if self.cursor_position >= VDU_CELLS {
                    self.scroll_up(memory);
                }
            }
        }
        debug_assert!(self.cursor_position < VDU_CELLS);
        debug_assert!(self.startrow < VDU_ROWS);
    }
}
