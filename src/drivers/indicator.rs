use embedded_hal::digital::OutputPin;

use super::wait_us;
use crate::board::Monotonic;

/// Electrical level that lights the LED.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

/// Status LED on a GPIO.
pub struct Indicator<P: OutputPin> {
    pin: P,
    polarity: Polarity,
}

impl<P: OutputPin> Indicator<P> {
    pub fn new(pin: P, polarity: Polarity) -> Self {
        Self { pin, polarity }
    }

    pub fn on(&mut self) {
        let _ = match self.polarity {
            Polarity::ActiveHigh => self.pin.set_high(),
            Polarity::ActiveLow => self.pin.set_low(),
        };
    }

    pub fn off(&mut self) {
        let _ = match self.polarity {
            Polarity::ActiveHigh => self.pin.set_low(),
            Polarity::ActiveLow => self.pin.set_high(),
        };
    }

    /// Flashes the LED `cycles` times, on then off, each half lasting
    /// `half_period_us`. Ends with the LED off.
    pub fn blink<C: Monotonic + ?Sized>(&mut self, clock: &C, cycles: u8, half_period_us: u64) {
        for _ in 0..cycles {
            self.on();
            wait_us(clock, half_period_us);
            self.off();
            wait_us(clock, half_period_us);
        }
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    #[derive(Default)]
    struct LevelLog {
        levels: Vec<bool>,
    }

    impl ErrorType for LevelLog {
        type Error = Infallible;
    }

    impl OutputPin for LevelLog {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.levels.push(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.levels.push(true);
            Ok(())
        }
    }

    struct Ticker(Cell<u64>);

    impl Monotonic for Ticker {
        fn now_us(&self) -> u64 {
            let now = self.0.get();
            self.0.set(now + 1_000);
            now
        }
    }

    #[test]
    fn test_active_low_levels() {
        let mut led = Indicator::new(LevelLog::default(), Polarity::ActiveLow);
        led.on();
        led.off();
        assert_eq!(led.pin().levels, vec![false, true]);
    }

    #[test]
    fn test_active_high_levels() {
        let mut led = Indicator::new(LevelLog::default(), Polarity::ActiveHigh);
        led.on();
        led.off();
        assert_eq!(led.pin().levels, vec![true, false]);
    }

    #[test]
    fn test_blink_cycles_and_duration() {
        let clock = Ticker(Cell::new(0));
        let mut led = Indicator::new(LevelLog::default(), Polarity::ActiveLow);

        led.blink(&clock, 3, 10_000);

        assert_eq!(led.pin().levels, vec![false, true, false, true, false, true]);
        // Six half periods of wall time went by on the fake clock
        assert!(clock.0.get() >= 60_000);
    }
}
