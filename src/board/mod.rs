//! Board abstraction
//!
//! The controller consumes narrow capabilities (serial byte I/O, text output,
//! keypad reads, servo positioning, LEDs, a passage sensor and a monotonic
//! clock). A [`Board`] names the concrete type behind each capability and
//! [`Devices`] bundles one instance of each.
//!
//! Implementations:
//! - `rp2350`: Raspberry Pi Pico 2 hardware (feature `rp2350`)
//! - `mock`: scripted host doubles for tests

use embedded_hal::digital::{InputPin, OutputPin};

use crate::drivers::Indicator;

#[cfg(feature = "rp2350")]
pub mod rp2350;

#[cfg(not(feature = "rp2350"))]
pub mod mock;

/// Board driving the controller in this build.
#[cfg(feature = "rp2350")]
pub type ActiveBoard = rp2350::Rp2350Board;

/// Board driving the controller in this build.
#[cfg(not(feature = "rp2350"))]
pub type ActiveBoard = mock::MockBoard;

/// Single-byte serial line of one gate.
pub trait SerialLine {
    /// Arms the receive notification that raises the line's pending flag.
    fn listen(&mut self);

    /// Blocks until one byte is available and returns it. Bytes that arrived
    /// behind it are dropped, so a burst counts as one request.
    fn receive(&mut self) -> u8;

    /// Sends one byte, blocking until it is queued.
    fn send(&mut self, byte: u8);
}

/// Drains a receive backlog. `read` fills the buffer from the backlog and
/// returns how many bytes it took, 0 once nothing is left.
pub fn discard_backlog(mut read: impl FnMut(&mut [u8]) -> usize) {
    let mut sink = [0u8; 32];
    while read(&mut sink) > 0 {}
}

/// Character display addressed by zero-based row and column.
pub trait CharDisplay {
    fn init(&mut self);

    fn clear(&mut self);

    fn set_cursor(&mut self, row: u8, col: u8);

    /// Writes one character code at the cursor and advances it.
    fn write_byte(&mut self, byte: u8);

    fn write_str(&mut self, text: &str) {
        for byte in text.bytes() {
            self.write_byte(byte);
        }
    }

    fn write_str_at(&mut self, text: &str, row: u8, col: u8) {
        self.set_cursor(row, col);
        self.write_str(text);
    }

    fn write_byte_at(&mut self, byte: u8, row: u8, col: u8) {
        self.set_cursor(row, col);
        self.write_byte(byte);
    }
}

/// Key source for admin enrollment.
pub trait Keypad {
    /// Returns the pressed key code or [`crate::config::NO_KEY`].
    fn read_key(&mut self) -> u8;
}

/// Barrier position of a gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GatePosition {
    Up,
    Down,
}

/// Servo actuator of one gate barrier.
pub trait GateServo {
    fn set_position(&mut self, position: GatePosition);
}

/// Free-running microsecond clock.
pub trait Monotonic {
    fn now_us(&self) -> u64;
}

/// Concrete device types of one board.
pub trait Board {
    type EntryLine: SerialLine;
    type ExitLine: SerialLine;
    type Display: CharDisplay;
    type Keypad: Keypad;
    type EntryServo: GateServo;
    type ExitServo: GateServo;
    /// Passage sensor, high while a vehicle is in the gate.
    type Sensor: InputPin;
    type Led: OutputPin;
    type Clock: Monotonic;
}

/// Every device the controller talks to.
pub struct Devices<B: Board> {
    pub entry_line: B::EntryLine,
    pub exit_line: B::ExitLine,
    pub admin_display: B::Display,
    pub user_display: B::Display,
    pub keypad: B::Keypad,
    pub entry_servo: B::EntryServo,
    pub exit_servo: B::ExitServo,
    pub entry_sensor: B::Sensor,
    pub exit_sensor: B::Sensor,
    pub green_led: Indicator<B::Led>,
    pub red_led: Indicator<B::Led>,
    pub clock: B::Clock,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discard_backlog_empties_queue() {
        let mut backlog: Vec<u8> = (0..70).collect();
        let mut reads = 0;

        discard_backlog(|buf| {
            reads += 1;
            let n = buf.len().min(backlog.len());
            backlog.drain(..n);
            n
        });

        assert!(backlog.is_empty());
        // 32 + 32 + 6, then the empty read
        assert_eq!(reads, 4);
    }

    #[test]
    fn test_discard_backlog_on_empty_queue() {
        let mut reads = 0;
        discard_backlog(|_| {
            reads += 1;
            0
        });
        assert_eq!(reads, 1);
    }
}
