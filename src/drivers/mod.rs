//! Board-agnostic device drivers built on `embedded-hal` 1.0 traits.

mod hd44780;
mod indicator;
mod keypad;
mod servo;

pub use hd44780::Hd44780;
pub use indicator::{Indicator, Polarity};
pub use keypad::{KEYMAP, MatrixKeypad};
pub use servo::ServoGate;

use crate::board::Monotonic;

/// Busy-waits until `duration_us` has elapsed on `clock`.
pub fn wait_us<C: Monotonic + ?Sized>(clock: &C, duration_us: u64) {
    let start = clock.now_us();
    while clock.now_us().saturating_sub(start) < duration_us {
        core::hint::spin_loop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct StepClock {
        now: Cell<u64>,
        step: u64,
    }

    impl Monotonic for StepClock {
        fn now_us(&self) -> u64 {
            let now = self.now.get();
            self.now.set(now + self.step);
            now
        }
    }

    #[test]
    fn test_wait_us_returns_after_duration() {
        let clock = StepClock {
            now: Cell::new(0),
            step: 100,
        };
        wait_us(&clock, 1_000);
        assert!(clock.now.get() >= 1_000);
        assert!(clock.now.get() <= 1_200);
    }

    #[test]
    fn test_wait_us_zero_duration() {
        let clock = StepClock {
            now: Cell::new(500),
            step: 1,
        };
        wait_us(&clock, 0);
        assert_eq!(clock.now.get(), 502);
    }
}
