//! Command executor: turns a parsed [`Command`] into hardware action and
//! a chat reply.
//!
//! Validation happens here, before the pump is touched: anything outside
//! [`ActuationLimits`] is answered with a rejection and never reaches the
//! actuator. The actuator re-checks the ceiling anyway.

use std::sync::Arc;

use embedded_hal::digital::OutputPin;
use log::{error, info, warn};

use crate::config::ActuationLimits;
use crate::drivers::pump::HardwareActuator;
use crate::error::ActuatorError;

use super::commands::{Argument, Command, EXAMPLE_COMMAND};
use super::ports::{CancellableDelay, ServoPort};

pub const POSITION_PARSE_ERROR: &str = "Couldn't parse input. Must provide integer";
pub const WATER_PARSE_ERROR: &str = "Couldn't parse your input (try \"water 5\")";
pub const SWEEP_DONE: &str = "Did a position sweep";
pub const BUSY: &str = "I'm already watering, try again in a moment";
pub const PUMP_STUCK: &str = " The pump may still be running, switch it off at the supply.";

/// Reply text plus whether hardware was driven.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub response: String,
    pub actuated: bool,
}

impl Outcome {
    fn reply(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            actuated: false,
        }
    }

    fn actuated(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            actuated: true,
        }
    }
}

/// Help text for anything the parser did not recognise.
pub fn help_response() -> String {
    format!("Not sure what you mean. Try *{}*.", EXAMPLE_COMMAND)
}

/// Rejection for a watering request outside the limits.
pub fn range_response(limits: &ActuationLimits) -> String {
    format!(
        "I can't water for that long. Try a number between 0 and {}",
        limits.ceiling()
    )
}

/// Executes commands against the pump and the (optional) servo.
pub struct CommandExecutor<P, D, S> {
    pump: Arc<HardwareActuator<P, D>>,
    servo: S,
    limits: ActuationLimits,
}

impl<P, D, S> CommandExecutor<P, D, S>
where
    P: OutputPin,
    D: CancellableDelay,
    S: ServoPort,
{
    pub fn new(pump: Arc<HardwareActuator<P, D>>, servo: S, limits: ActuationLimits) -> Self {
        Self {
            pump,
            servo,
            limits,
        }
    }

    pub fn pump(&self) -> &Arc<HardwareActuator<P, D>> {
        &self.pump
    }

    pub fn servo(&self) -> &S {
        &self.servo
    }

    /// Run one command. Never fails: every problem becomes a reply.
    pub fn execute(&mut self, command: &Command) -> Outcome {
        match command {
            Command::Position(Argument::Value(v)) => self.position(*v),
            Command::Position(Argument::Missing | Argument::Invalid(_)) => {
                Outcome::reply(POSITION_PARSE_ERROR)
            }
            Command::Sweep => self.sweep(),
            Command::Water(Argument::Missing) => self.water(self.limits.default_water_secs),
            Command::Water(Argument::Invalid(token)) => {
                info!("Water: unparsable duration '{}'", token);
                Outcome::reply(WATER_PARSE_ERROR)
            }
            Command::Water(Argument::Value(secs)) => {
                if self.limits.allows(*secs) {
                    self.water(*secs)
                } else {
                    warn!("Water: {}s rejected, outside (0, {}]", secs, self.limits.ceiling());
                    Outcome::reply(range_response(&self.limits))
                }
            }
            Command::Unknown(_) => Outcome::reply(help_response()),
        }
    }

    // ── Handlers ──────────────────────────────────────────────

    fn position(&mut self, requested: i64) -> Outcome {
        let clamped = requested.clamp(0, 100) as u8;
        match self.servo.move_to(clamped) {
            Ok(pos) => Outcome {
                response: format!("Moved to position {}", pos),
                actuated: self.servo.is_wired(),
            },
            Err(e) => fault_response("servo", e, ""),
        }
    }

    fn sweep(&mut self) -> Outcome {
        match self.servo.sweep() {
            Ok(()) => Outcome {
                response: SWEEP_DONE.to_owned(),
                actuated: self.servo.is_wired(),
            },
            Err(e) => fault_response("servo", e, ""),
        }
    }

    fn water(&mut self, secs: f64) -> Outcome {
        match self.pump.actuate_for(secs) {
            Ok(report) if report.cancelled => Outcome::actuated(format!(
                "Watering stopped early after {:.1} seconds (shutting down)",
                report.elapsed.as_secs_f64()
            )),
            Ok(_) => Outcome::actuated(format!("Watered for {} seconds", secs)),
            Err(ActuatorError::Busy) => Outcome::reply(BUSY),
            Err(ActuatorError::InvalidDuration | ActuatorError::ExceedsCeiling) => {
                Outcome::reply(range_response(&self.limits))
            }
            Err(e) => {
                if self.force_pump_off() {
                    fault_response("pump", e, " Output switched off.")
                } else {
                    error!("PUMP | still on after fault, shutoff unconfirmed");
                    fault_response("pump", e, PUMP_STUCK)
                }
            }
        }
    }

    /// Retry the shutoff a bounded number of times. `true` once the pump is
    /// confirmed off.
    fn force_pump_off(&self) -> bool {
        for attempt in 1..=SHUTOFF_ATTEMPTS {
            if !self.pump.is_on() {
                return true;
            }
            if let Err(e) = self.pump.turn_off() {
                warn!("PUMP | shutoff attempt {}/{} failed: {}", attempt, SHUTOFF_ATTEMPTS, e);
            }
        }
        !self.pump.is_on()
    }
}

const SHUTOFF_ATTEMPTS: u32 = 3;

fn fault_response(what: &str, e: ActuatorError, detail: &str) -> Outcome {
    error!("{} fault: {}", what, e);
    Outcome::reply(format!("Hardware fault on the {} ({}).{}", what, e, detail))
}
