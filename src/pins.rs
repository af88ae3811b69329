//! GPIO / peripheral pin assignments for the waterbot board.
//!
//! Single source of truth for the default wiring. Every value here can be
//! overridden from [`BotConfig`](crate::config::BotConfig).

// ---------------------------------------------------------------------------
// Pump relay
// ---------------------------------------------------------------------------

/// Digital output (BCM numbering): HIGH = pump running.
pub const PUMP_GPIO: u32 = 14;

// ---------------------------------------------------------------------------
// Servo (hardware PWM)
// ---------------------------------------------------------------------------

/// BCM 18 is hardware PWM channel 0 on the Pi header.
pub const SERVO_PWM_GPIO: u32 = 18;
/// sysfs PWM chip exposing BCM 18.
pub const SERVO_PWM_CHIP: u32 = 0;
/// sysfs PWM channel on [`SERVO_PWM_CHIP`].
pub const SERVO_PWM_CHANNEL: u32 = 0;

/// Servo frame period: 50 Hz.
pub const SERVO_PERIOD_NS: u32 = 20_000_000;
/// Duty resolution of the servo channel (one step = 10 µs at 50 Hz).
pub const SERVO_DUTY_RANGE: u16 = 2000;
/// Pulse (in duty steps) for position 0 (1.0 ms).
pub const SERVO_PULSE_MIN: u16 = 100;
/// Pulse (in duty steps) for position 100 (2.0 ms).
pub const SERVO_PULSE_MAX: u16 = 200;
