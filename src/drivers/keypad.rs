//! 4x4 matrix keypad.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::board::Keypad;
use crate::config::NO_KEY;

/// Key codes by [row][column]. Digits are raw values, not ASCII.
pub const KEYMAP: [[u8; 4]; 4] = [
    [7, 8, 9, b'/'],
    [4, 5, 6, b'x'],
    [1, 2, 3, b'-'],
    [b'C', 0, b'=', b'+'],
];

/// Rows are driven low one at a time; columns are pulled up and read low
/// while a key of the active row is held.
pub struct MatrixKeypad<O: OutputPin, I: InputPin> {
    rows: [O; 4],
    cols: [I; 4],
}

impl<O: OutputPin, I: InputPin> MatrixKeypad<O, I> {
    pub fn new(mut rows: [O; 4], cols: [I; 4]) -> Self {
        for row in rows.iter_mut() {
            let _ = row.set_high();
        }
        Self { rows, cols }
    }
}

impl<O: OutputPin, I: InputPin> Keypad for MatrixKeypad<O, I> {
    /// Scans once. A pressed key is reported after it is released.
    fn read_key(&mut self) -> u8 {
        for (r, row) in self.rows.iter_mut().enumerate() {
            let _ = row.set_low();
            for (c, col) in self.cols.iter_mut().enumerate() {
                if col.is_low().unwrap_or(false) {
                    while col.is_low().unwrap_or(false) {}
                    let _ = row.set_high();
                    return KEYMAP[r][c];
                }
            }
            let _ = row.set_high();
        }
        NO_KEY
    }
}
