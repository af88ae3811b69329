//! Hobby servo on a hardware PWM channel.
//!
//! 50 Hz frame, 2000-step duty range: a pulse of `100 + position` steps
//! gives 1.0 ms (position 0) to 2.0 ms (position 100).
//!
//! Optional hardware. When the build has no servo, the executor is handed
//! [`NoServo`](crate::app::ports::NoServo) instead.

use std::time::Duration;

use embedded_hal::pwm::SetDutyCycle;
use log::{error, info};

use crate::app::ports::ServoPort;
use crate::error::ActuatorError;
use crate::pins::{SERVO_DUTY_RANGE, SERVO_PULSE_MAX, SERVO_PULSE_MIN};

/// Delay between sweep steps.
pub const SWEEP_STEP: Duration = Duration::from_millis(10);

pub struct PwmServo<Pwm> {
    pwm: Pwm,
    step_delay: Duration,
    position: Option<u8>,
}

impl<Pwm: SetDutyCycle> PwmServo<Pwm> {
    pub fn new(pwm: Pwm) -> Self {
        Self::with_step_delay(pwm, SWEEP_STEP)
    }

    pub fn with_step_delay(pwm: Pwm, step_delay: Duration) -> Self {
        Self {
            pwm,
            step_delay,
            position: None,
        }
    }

    /// Pulse width (duty steps) for a position, clamped to 0–100.
    pub fn pulse_for(position: u8) -> u16 {
        SERVO_PULSE_MIN + u16::from(position.min(100))
    }

    /// Last commanded position, if any.
    pub fn position(&self) -> Option<u8> {
        self.position
    }

    fn write_pulse(&mut self, pulse: u16) -> Result<(), ActuatorError> {
        self.pwm
            .set_duty_cycle_fraction(pulse, SERVO_DUTY_RANGE)
            .map_err(|e| {
                error!("SERVO | duty write failed: {:?}", e);
                ActuatorError::PwmWriteFailed
            })
    }
}

impl<Pwm: SetDutyCycle> ServoPort for PwmServo<Pwm> {
    fn move_to(&mut self, position: u8) -> Result<u8, ActuatorError> {
        let position = position.min(100);
        self.write_pulse(Self::pulse_for(position))?;
        self.position = Some(position);
        info!("SERVO | moved to {}", position);
        Ok(position)
    }

    fn sweep(&mut self) -> Result<(), ActuatorError> {
        for pulse in SERVO_PULSE_MIN..SERVO_PULSE_MAX {
            self.write_pulse(pulse)?;
            std::thread::sleep(self.step_delay);
        }
        self.position = Some((SERVO_PULSE_MAX - 1 - SERVO_PULSE_MIN) as u8);
        info!("SERVO | sweep done");
        Ok(())
    }
}
