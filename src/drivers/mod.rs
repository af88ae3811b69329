//! Actuator drivers: the pump relay and the optional servo.

pub mod pump;
pub mod servo;
