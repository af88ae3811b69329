//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BotLoop / CommandExecutor (domain)
//! ```
//!
//! Driven adapters (chat connection, servo, timers) implement these traits.
//! The pump pin itself is expressed with `embedded_hal::digital::OutputPin`
//! and owned by [`HardwareActuator`](crate::drivers::pump::HardwareActuator),
//! so nothing in the domain touches GPIO directly.

use std::time::Duration;

use crate::error::{ActuatorError, CommsError};

use super::events::{BotIdentity, ChannelId, ChatEvent};

// ───────────────────────────────────────────────────────────────
// Event source (driven adapter: chat platform → domain)
// ───────────────────────────────────────────────────────────────

/// Inbound side of the chat connection.
pub trait EventSource {
    /// Open the connection and resolve the bot's own user id.
    ///
    /// Called exactly once at startup. Failure here is fatal.
    fn connect(&mut self) -> Result<BotIdentity, CommsError>;

    /// Fetch whatever events arrived since the last call (may be empty).
    fn poll(&mut self) -> Result<Vec<ChatEvent>, CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Message sink (driven adapter: domain → chat platform)
// ───────────────────────────────────────────────────────────────

/// Outbound side of the chat connection. Fire-and-forget: the caller logs
/// failures and never retries.
pub trait MessageSink {
    fn send(&mut self, channel: &ChannelId, text: &str) -> Result<(), CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Servo port (optional PWM capability)
// ───────────────────────────────────────────────────────────────

/// Proportional output for a hobby servo.
pub trait ServoPort {
    /// Move to `position` (0–100). Returns the position actually commanded.
    fn move_to(&mut self, position: u8) -> Result<u8, ActuatorError>;

    /// Walk the full travel once. Bounded in time.
    fn sweep(&mut self) -> Result<(), ActuatorError>;

    /// Whether a real servo is wired up.
    fn is_wired(&self) -> bool {
        true
    }
}

/// Stand-in used when no servo is attached: acknowledges commands without
/// touching hardware.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoServo;

impl ServoPort for NoServo {
    fn move_to(&mut self, position: u8) -> Result<u8, ActuatorError> {
        log::info!("SERVO | not wired, ignoring move to {}", position);
        Ok(position)
    }

    fn sweep(&mut self) -> Result<(), ActuatorError> {
        log::info!("SERVO | not wired, ignoring sweep");
        Ok(())
    }

    fn is_wired(&self) -> bool {
        false
    }
}

impl<T: ServoPort + ?Sized> ServoPort for Box<T> {
    fn move_to(&mut self, position: u8) -> Result<u8, ActuatorError> {
        (**self).move_to(position)
    }

    fn sweep(&mut self) -> Result<(), ActuatorError> {
        (**self).sweep()
    }

    fn is_wired(&self) -> bool {
        (**self).is_wired()
    }
}

// ───────────────────────────────────────────────────────────────
// Cancellable delay (time source for actuation)
// ───────────────────────────────────────────────────────────────

/// How a [`CancellableDelay::delay`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayOutcome {
    /// The full duration passed.
    Elapsed,
    /// Shutdown was requested first.
    Cancelled,
}

/// Blocking wait that shutdown can cut short.
///
/// Implemented by [`ShutdownSignal`](crate::shutdown::ShutdownSignal) in
/// production; tests substitute an instant, recording implementation.
pub trait CancellableDelay {
    fn delay(&self, duration: Duration) -> DelayOutcome;
}

impl<T: CancellableDelay + ?Sized> CancellableDelay for &T {
    fn delay(&self, duration: Duration) -> DelayOutcome {
        (**self).delay(duration)
    }
}
