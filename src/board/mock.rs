//! Mock board for host tests
//!
//! Every device records what the controller did to it and replays scripted
//! input. Scripted sources panic when they run dry: that is the "no data"
//! hook of the serial lines and keypad, the controller itself never sees it.

use core::cell::Cell;
use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use heapless::{Deque, Vec};

use super::{
    Board, CharDisplay, Devices, GatePosition, GateServo, Keypad, Monotonic, SerialLine,
    discard_backlog,
};
use crate::drivers::{Indicator, Polarity};

const SCRIPT_LEN: usize = 32;
const HISTORY_LEN: usize = 256;

pub const DISPLAY_ROWS: usize = 4;
pub const DISPLAY_COLS: usize = 20;

/// Marker type selecting the mock devices.
pub struct MockBoard;

impl Board for MockBoard {
    type EntryLine = MockLine;
    type ExitLine = MockLine;
    type Display = MockDisplay;
    type Keypad = MockKeypad;
    type EntryServo = MockServo;
    type ExitServo = MockServo;
    type Sensor = MockSensor;
    type Led = MockLed;
    type Clock = MockClock;
}

impl MockBoard {
    /// Fresh set of devices: no input scripted, clock stepping 1 ms per read.
    pub fn devices() -> Devices<MockBoard> {
        Devices {
            entry_line: MockLine::new(),
            exit_line: MockLine::new(),
            admin_display: MockDisplay::new(),
            user_display: MockDisplay::new(),
            keypad: MockKeypad::new(),
            entry_servo: MockServo::new(),
            exit_servo: MockServo::new(),
            entry_sensor: MockSensor::new(),
            exit_sensor: MockSensor::new(),
            green_led: Indicator::new(MockLed::new(), Polarity::ActiveLow),
            red_led: Indicator::new(MockLed::new(), Polarity::ActiveLow),
            clock: MockClock::new(1_000),
        }
    }
}

/// Serial line with a scripted receive queue.
pub struct MockLine {
    incoming: Deque<u8, SCRIPT_LEN>,
    sent: Vec<u8, HISTORY_LEN>,
    listening: bool,
}

impl MockLine {
    pub const fn new() -> Self {
        Self {
            incoming: Deque::new(),
            sent: Vec::new(),
            listening: false,
        }
    }

    /// Queues a byte on the line. `receive` takes the oldest and drops the
    /// rest, like the hardware FIFO flush.
    pub fn push_incoming(&mut self, byte: u8) {
        if self.incoming.push_back(byte).is_err() {
            panic!("mock serial line: incoming script full");
        }
    }

    pub fn pending_bytes(&self) -> usize {
        self.incoming.len()
    }

    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }
}

impl Default for MockLine {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialLine for MockLine {
    fn listen(&mut self) {
        self.listening = true;
    }

    fn receive(&mut self) -> u8 {
        let byte = match self.incoming.pop_front() {
            Some(byte) => byte,
            None => panic!("mock serial line: receive with no data"),
        };
        let incoming = &mut self.incoming;
        discard_backlog(|buf| {
            let mut taken = 0;
            while taken < buf.len() {
                match incoming.pop_front() {
                    Some(b) => buf[taken] = b,
                    None => break,
                }
                taken += 1;
            }
            taken
        });
        byte
    }

    fn send(&mut self, byte: u8) {
        if self.sent.push(byte).is_err() {
            panic!("mock serial line: sent history full");
        }
    }
}

/// Text grid mirroring what a character display would show.
pub struct MockDisplay {
    grid: [[u8; DISPLAY_COLS]; DISPLAY_ROWS],
    cursor: (usize, usize),
    clears: u32,
    initialized: bool,
}

impl MockDisplay {
    pub const fn new() -> Self {
        Self {
            grid: [[b' '; DISPLAY_COLS]; DISPLAY_ROWS],
            cursor: (0, 0),
            clears: 0,
            initialized: false,
        }
    }

    /// Row content without trailing blanks.
    pub fn row(&self, row: usize) -> &str {
        core::str::from_utf8(&self.grid[row])
            .unwrap_or("")
            .trim_end()
    }

    pub fn clears(&self) -> u32 {
        self.clears
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl Default for MockDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl CharDisplay for MockDisplay {
    fn init(&mut self) {
        self.initialized = true;
        self.clear();
    }

    fn clear(&mut self) {
        self.grid = [[b' '; DISPLAY_COLS]; DISPLAY_ROWS];
        self.cursor = (0, 0);
        self.clears += 1;
    }

    fn set_cursor(&mut self, row: u8, col: u8) {
        self.cursor = (usize::from(row) % DISPLAY_ROWS, usize::from(col));
    }

    fn write_byte(&mut self, byte: u8) {
        let (row, col) = self.cursor;
        if col < DISPLAY_COLS {
            self.grid[row][col] = byte;
        }
        self.cursor.1 += 1;
    }
}

/// Keypad replaying a script of key codes, `NO_KEY` included.
pub struct MockKeypad {
    script: Deque<u8, SCRIPT_LEN>,
    polls: u32,
}

impl MockKeypad {
    pub const fn new() -> Self {
        Self {
            script: Deque::new(),
            polls: 0,
        }
    }

    pub fn push_keys(&mut self, keys: &[u8]) {
        for &key in keys {
            if self.script.push_back(key).is_err() {
                panic!("mock keypad: script full");
            }
        }
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }
}

impl Default for MockKeypad {
    fn default() -> Self {
        Self::new()
    }
}

impl Keypad for MockKeypad {
    fn read_key(&mut self) -> u8 {
        self.polls += 1;
        match self.script.pop_front() {
            Some(key) => key,
            None => panic!("mock keypad: script exhausted"),
        }
    }
}

/// Servo remembering every commanded position.
pub struct MockServo {
    history: Vec<GatePosition, HISTORY_LEN>,
}

impl MockServo {
    pub const fn new() -> Self {
        Self {
            history: Vec::new(),
        }
    }

    pub fn position(&self) -> Option<GatePosition> {
        self.history.last().copied()
    }

    pub fn history(&self) -> &[GatePosition] {
        &self.history
    }
}

impl Default for MockServo {
    fn default() -> Self {
        Self::new()
    }
}

impl GateServo for MockServo {
    fn set_position(&mut self, position: GatePosition) {
        if self.history.push(position).is_err() {
            panic!("mock servo: history full");
        }
    }
}

/// Passage sensor reading high for a configurable number of polls.
pub struct MockSensor {
    blocked_reads: u32,
    reads: u32,
}

impl MockSensor {
    pub const fn new() -> Self {
        Self {
            blocked_reads: 0,
            reads: 0,
        }
    }

    /// Simulates a vehicle standing in the gate for `reads` polls.
    pub fn block_for(&mut self, reads: u32) {
        self.blocked_reads = reads;
    }

    pub fn reads(&self) -> u32 {
        self.reads
    }
}

impl Default for MockSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorType for MockSensor {
    type Error = Infallible;
}

impl InputPin for MockSensor {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.reads += 1;
        if self.blocked_reads > 0 {
            self.blocked_reads -= 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// LED pin recording every level written to it.
pub struct MockLed {
    levels: Vec<bool, HISTORY_LEN>,
}

impl MockLed {
    pub const fn new() -> Self {
        Self { levels: Vec::new() }
    }

    pub fn level(&self) -> Option<bool> {
        self.levels.last().copied()
    }

    fn record(&mut self, level: bool) {
        if self.levels.push(level).is_err() {
            panic!("mock led: history full");
        }
    }

    /// Number of times the pin was driven low (lit, for an active-low LED).
    pub fn times_driven_low(&self) -> usize {
        self.levels.iter().filter(|&&level| !level).count()
    }
}

impl Default for MockLed {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorType for MockLed {
    type Error = Infallible;
}

impl OutputPin for MockLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.record(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.record(true);
        Ok(())
    }
}

/// Clock advancing a fixed step on every read.
pub struct MockClock {
    now: Cell<u64>,
    step: u64,
}

impl MockClock {
    pub const fn new(step_us: u64) -> Self {
        Self {
            now: Cell::new(0),
            step: step_us,
        }
    }

    pub fn elapsed_us(&self) -> u64 {
        self.now.get()
    }
}

impl Monotonic for MockClock {
    fn now_us(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now + self.step);
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_line_receive_drops_backlog() {
        let mut line = MockLine::new();
        line.push_incoming(4);
        line.push_incoming(5);
        line.push_incoming(6);

        assert_eq!(line.receive(), 4);
        assert_eq!(line.pending_bytes(), 0);

        line.push_incoming(7);
        assert_eq!(line.receive(), 7);
    }

    #[test]
    #[should_panic(expected = "history full")]
    fn test_mock_led_history_overflow_panics() {
        let mut led = MockLed::new();
        for _ in 0..=HISTORY_LEN {
            let _ = led.set_low();
        }
    }

    #[test]
    #[should_panic(expected = "history full")]
    fn test_mock_servo_history_overflow_panics() {
        let mut servo = MockServo::new();
        for _ in 0..=HISTORY_LEN {
            servo.set_position(GatePosition::Down);
        }
    }

    #[test]
    #[should_panic(expected = "no data")]
    fn test_mock_line_empty_receive_panics() {
        let mut line = MockLine::new();
        line.receive();
    }

    #[test]
    fn test_mock_display_positions_text() {
        let mut display = MockDisplay::new();
        display.write_str_at("Welcome!", 0, 3);
        display.write_byte_at(b'2', 1, 0);
        display.write_str_at("Slots free!", 1, 2);

        assert_eq!(display.row(0), "   Welcome!");
        assert_eq!(display.row(1), "2 Slots free!");
    }

    #[test]
    fn test_mock_display_clips_long_rows() {
        let mut display = MockDisplay::new();
        display.write_str_at("0123456789ABCDEFGHIJKLMN", 2, 0);
        assert_eq!(display.row(2), "0123456789ABCDEFGHIJ");
    }

    #[test]
    fn test_mock_sensor_clears_after_blocked_reads() {
        let mut sensor = MockSensor::new();
        sensor.block_for(2);

        assert!(sensor.is_high().unwrap());
        assert!(sensor.is_high().unwrap());
        assert!(sensor.is_low().unwrap());
        assert_eq!(sensor.reads(), 3);
    }
}
