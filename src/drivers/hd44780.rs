//! HD44780 character LCD in 4-bit mode (20x4 module).

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::board::CharDisplay;

const CMD_CLEAR_DISPLAY: u8 = 0x01;
const CMD_ENTRY_MODE_INC_SHIFT_OFF: u8 = 0x06;
const CMD_DISPLAY_ON_CURSOR_OFF: u8 = 0x0C;
const CMD_FUNCTION_SET_4BIT_2LINE: u8 = 0x28;
const CMD_SET_DDRAM_ADDR: u8 = 0x80;

/// DDRAM address of the first column of each row.
const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

pub struct Hd44780<P: OutputPin, D: DelayNs> {
    rs: P,
    en: P,
    /// D4..D7
    data: [P; 4],
    delay: D,
}

impl<P: OutputPin, D: DelayNs> Hd44780<P, D> {
    pub fn new(rs: P, en: P, data: [P; 4], delay: D) -> Self {
        Self {
            rs,
            en,
            data,
            delay,
        }
    }

    fn pulse_enable(&mut self) {
        let _ = self.en.set_high();
        self.delay.delay_us(1);
        let _ = self.en.set_low();
        self.delay.delay_us(100);
    }

    fn write_nibble(&mut self, nibble: u8) {
        for (bit, pin) in self.data.iter_mut().enumerate() {
            let _ = if nibble & (1 << bit) != 0 {
                pin.set_high()
            } else {
                pin.set_low()
            };
        }
        self.pulse_enable();
    }

    fn write(&mut self, byte: u8, is_data: bool) {
        let _ = if is_data {
            self.rs.set_high()
        } else {
            self.rs.set_low()
        };
        self.write_nibble(byte >> 4);
        self.write_nibble(byte & 0x0F);
    }

    pub fn command(&mut self, command: u8) {
        self.write(command, false);
        if command == CMD_CLEAR_DISPLAY {
            self.delay.delay_ms(2);
        }
    }
}

impl<P: OutputPin, D: DelayNs> CharDisplay for Hd44780<P, D> {
    fn init(&mut self) {
        self.delay.delay_ms(50);
        let _ = self.rs.set_low();
        let _ = self.en.set_low();

        // Reset into 8-bit mode three times, then switch to 4-bit
        for _ in 0..3 {
            self.write_nibble(0x03);
            self.delay.delay_ms(5);
        }
        self.write_nibble(0x02);

        self.command(CMD_FUNCTION_SET_4BIT_2LINE);
        self.command(CMD_DISPLAY_ON_CURSOR_OFF);
        self.command(CMD_CLEAR_DISPLAY);
        self.command(CMD_ENTRY_MODE_INC_SHIFT_OFF);
    }

    fn clear(&mut self) {
        self.command(CMD_CLEAR_DISPLAY);
    }

    fn set_cursor(&mut self, row: u8, col: u8) {
        let offset = ROW_OFFSETS[usize::from(row) % ROW_OFFSETS.len()];
        self.command(CMD_SET_DDRAM_ADDR | (offset + col));
    }

    fn write_byte(&mut self, byte: u8) {
        self.write(byte, true);
    }
}
