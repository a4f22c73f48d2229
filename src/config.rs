//! Compile-time configuration.
//!
//! The controller has no runtime settings: lot size, number of enrolled users
//! and actuator timings are fixed when the firmware is built.

/// Number of parking slots (lot capacity).
pub const NO_OF_SLOTS: u8 = 3;

/// Number of IDs collected during admin enrollment.
pub const USERS_COUNT: usize = 3;

/// Value returned by the keypad when no key is pressed.
pub const NO_KEY: u8 = b'F';

/// On/off cycles for every indicator blink sequence.
pub const BLINK_CYCLES: u8 = 3;

/// Time the indicator spends in each half of a blink cycle.
pub const BLINK_HALF_PERIOD_US: u64 = 150_000;

/// Baud rate of both gate serial lines (8N1).
pub const UART_BAUD: u32 = 115_200;

/// Servo frame period (50 Hz).
pub const SERVO_PERIOD_US: u16 = 20_000;

/// Pulse width that raises a gate barrier.
pub const SERVO_UP_PULSE_US: u16 = 500;

/// Pulse width that lowers a gate barrier.
pub const SERVO_DOWN_PULSE_US: u16 = 1_488;

// Free slots are rendered as a single digit.
const _: () = assert!(NO_OF_SLOTS >= 1 && NO_OF_SLOTS <= 9);
// One admin display row per user below the title row.
const _: () = assert!(USERS_COUNT >= 1 && USERS_COUNT <= 3);
