//! Water pump driver (relay on a single digital output).
//!
//! [`HardwareActuator`] exclusively owns the pump pin. It is the only code
//! in the system that drives the pump, and it guarantees the pin ends up
//! LOW on every exit path from an actuation.
//!
//! ## Safety contract
//!
//! - At most one actuation in flight; a second request is refused with
//!   [`ActuatorError::Busy`], never queued or extended.
//! - Durations outside `(0, max_water_secs]` are refused even when the
//!   caller already validated them. The ceiling never exceeds
//!   [`HARD_MAX_WATER_SECS`](crate::config::HARD_MAX_WATER_SECS), whatever limits are passed in.
//! - The on-state is owned by a [`PumpGuard`]. Dropping the guard (normal
//!   return, early `?`, unwinding panic) forces the pin off.
//! - [`HardwareActuator::enforce_deadline`] kills anything on longer than
//!   the ceiling. The bot loop calls it between cycles, so it only catches
//!   output left on outside `actuate_for` (a `PumpGuard` from a direct
//!   [`turn_on`](HardwareActuator::turn_on) that is held too long, or a
//!   shutoff that failed). While `actuate_for` blocks, the loop is not
//!   running and the guard is what bounds the on-time.
//!
//! The pin is any `embedded_hal::digital::OutputPin`, so the same driver
//! runs on sysfs GPIO, in simulation and against test doubles.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use embedded_hal::digital::OutputPin;
use log::{error, info, warn};

use crate::app::ports::{CancellableDelay, DelayOutcome};
use crate::config::ActuationLimits;
use crate::error::ActuatorError;

/// Point-in-time view of the pump output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorState {
    pub pin_id: u32,
    pub is_on: bool,
    pub on_since: Option<Instant>,
}

/// What an [`HardwareActuator::actuate_for`] call actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuationReport {
    pub requested: Duration,
    /// Wall time between pin HIGH and the end of the wait.
    pub elapsed: Duration,
    /// Shutdown cut the actuation short.
    pub cancelled: bool,
}

struct PinSlot<P> {
    pin: P,
    /// `Some` while the pin is (believed to be) HIGH.
    on_since: Option<Instant>,
}

/// Time-bounded, exclusive, fail-safe pump control.
pub struct HardwareActuator<P, D> {
    pin_id: u32,
    slot: Mutex<PinSlot<P>>,
    in_flight: AtomicBool,
    ceiling_secs: f64,
    delay: D,
}

impl<P: OutputPin, D: CancellableDelay> HardwareActuator<P, D> {
    /// Take ownership of `pin` and force it LOW.
    pub fn new(
        pin_id: u32,
        mut pin: P,
        limits: &ActuationLimits,
        delay: D,
    ) -> Result<Self, ActuatorError> {
        pin.set_low().map_err(|e| {
            error!("PUMP | GPIO{} init write failed: {:?}", pin_id, e);
            ActuatorError::GpioWriteFailed
        })?;
        let ceiling_secs = limits.ceiling();
        info!(
            "PUMP | GPIO{} configured as output, forced off (ceiling {}s)",
            pin_id, ceiling_secs
        );
        Ok(Self {
            pin_id,
            slot: Mutex::new(PinSlot {
                pin,
                on_since: None,
            }),
            in_flight: AtomicBool::new(false),
            ceiling_secs,
            delay,
        })
    }

    /// Drive the pin HIGH. The returned guard turns it off again.
    pub fn turn_on(&self) -> Result<PumpGuard<'_, P, D>, ActuatorError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("PUMP | on refused: actuation already in flight");
            return Err(ActuatorError::Busy);
        }

        let mut slot = self.lock_slot();
        if slot.on_since.is_some() {
            // A previous shutoff failed and the pin may still be HIGH.
            drop(slot);
            self.in_flight.store(false, Ordering::Release);
            warn!("PUMP | on refused: output not confirmed off");
            return Err(ActuatorError::Busy);
        }
        if let Err(e) = slot.pin.set_high() {
            error!("PUMP | GPIO{} set_high failed: {:?}", self.pin_id, e);
            let _ = slot.pin.set_low();
            drop(slot);
            self.in_flight.store(false, Ordering::Release);
            return Err(ActuatorError::GpioWriteFailed);
        }
        slot.on_since = Some(Instant::now());
        info!("PUMP | on");
        Ok(PumpGuard {
            actuator: self,
            released: false,
        })
    }

    /// Force the pin LOW, whatever else is going on.
    ///
    /// Safe to call at any time, including while an actuation is waiting
    /// and during shutdown.
    pub fn turn_off(&self) -> Result<(), ActuatorError> {
        let mut slot = self.lock_slot();
        match slot.pin.set_low() {
            Ok(()) => {
                if let Some(since) = slot.on_since.take() {
                    info!("PUMP | off after {:.2}s", since.elapsed().as_secs_f64());
                }
                Ok(())
            }
            Err(e) => {
                error!("PUMP | GPIO{} set_low failed: {:?}", self.pin_id, e);
                Err(ActuatorError::GpioWriteFailed)
            }
        }
    }

    /// Run the pump for `secs` seconds, then stop it.
    ///
    /// Blocks the caller for the whole duration unless shutdown interrupts
    /// the wait. The pin is LOW when this returns, on success and on error.
    pub fn actuate_for(&self, secs: f64) -> Result<ActuationReport, ActuatorError> {
        let requested = self.check_duration(secs)?;
        let guard = self.turn_on()?;

        let started = Instant::now();
        let outcome = self.delay.delay(requested);
        let elapsed = started.elapsed();

        guard.release()?;

        let cancelled = outcome == DelayOutcome::Cancelled;
        if cancelled {
            warn!(
                "PUMP | actuation cancelled after {:.2}s of {:.2}s",
                elapsed.as_secs_f64(),
                secs
            );
        }
        Ok(ActuationReport {
            requested,
            elapsed,
            cancelled,
        })
    }

    /// Kill the output if it has been on longer than the ceiling.
    ///
    /// Returns `true` if the pump had to be forced off.
    pub fn enforce_deadline(&self) -> bool {
        let overdue = {
            let slot = self.lock_slot();
            slot.on_since
                .is_some_and(|since| since.elapsed().as_secs_f64() > self.ceiling_secs)
        };
        if overdue {
            error!("PUMP | on past {}s ceiling, forcing off", self.ceiling_secs);
            let _ = self.turn_off();
        }
        overdue
    }

    pub fn state(&self) -> ActuatorState {
        let slot = self.lock_slot();
        ActuatorState {
            pin_id: self.pin_id,
            is_on: slot.on_since.is_some(),
            on_since: slot.on_since,
        }
    }

    pub fn is_on(&self) -> bool {
        self.state().is_on
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn ceiling_secs(&self) -> f64 {
        self.ceiling_secs
    }

    /// The time source actuations wait on.
    pub fn delay_source(&self) -> &D {
        &self.delay
    }

    // ── Internal ──────────────────────────────────────────────────

    fn check_duration(&self, secs: f64) -> Result<Duration, ActuatorError> {
        if !secs.is_finite() || secs <= 0.0 {
            warn!("PUMP | refused duration {}", secs);
            return Err(ActuatorError::InvalidDuration);
        }
        if secs > self.ceiling_secs {
            warn!("PUMP | refused {}s, ceiling is {}s", secs, self.ceiling_secs);
            return Err(ActuatorError::ExceedsCeiling);
        }
        Ok(Duration::from_secs_f64(secs))
    }

    /// Poisoning is ignored: after a panic the pin must still be reachable
    /// so it can be turned off.
    fn lock_slot(&self) -> MutexGuard<'_, PinSlot<P>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof that the pump is on. Turns it off when released or dropped.
#[must_use = "dropping the guard turns the pump off immediately"]
pub struct PumpGuard<'a, P: OutputPin, D: CancellableDelay> {
    actuator: &'a HardwareActuator<P, D>,
    released: bool,
}

impl<P: OutputPin, D: CancellableDelay> PumpGuard<'_, P, D> {
    /// Turn the pump off, reporting a failed shutoff.
    pub fn release(mut self) -> Result<(), ActuatorError> {
        self.released = true;
        let result = self.actuator.turn_off();
        self.actuator.in_flight.store(false, Ordering::Release);
        result
    }
}

impl<P: OutputPin, D: CancellableDelay> Drop for PumpGuard<'_, P, D> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if self.actuator.turn_off().is_err() {
            error!("PUMP | fail-safe shutoff failed on guard drop");
        }
        self.actuator.in_flight.store(false, Ordering::Release);
    }
}
