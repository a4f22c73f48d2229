use embedded_hal::pwm::SetDutyCycle;

use crate::board::{GatePosition, GateServo};
use crate::config::{SERVO_DOWN_PULSE_US, SERVO_PERIOD_US, SERVO_UP_PULSE_US};

/// Hobby servo on a 50 Hz PWM channel.
pub struct ServoGate<P: SetDutyCycle> {
    pwm: P,
}

impl<P: SetDutyCycle> ServoGate<P> {
    pub fn new(pwm: P) -> Self {
        Self { pwm }
    }

    fn pulse_us(position: GatePosition) -> u16 {
        match position {
            GatePosition::Up => SERVO_UP_PULSE_US,
            GatePosition::Down => SERVO_DOWN_PULSE_US,
        }
    }
}

impl<P: SetDutyCycle> GateServo for ServoGate<P> {
    fn set_position(&mut self, position: GatePosition) {
        let _ = self
            .pwm
            .set_duty_cycle_fraction(Self::pulse_us(position), SERVO_PERIOD_US);
    }
}
