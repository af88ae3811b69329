//! Application core: command interpretation and dispatch, zero I/O.
//!
//! Everything that talks to the chat platform or the pins does so through
//! the **port traits** in [`ports`], keeping this layer fully testable
//! without real peripherals or a network.

pub mod commands;
pub mod events;
pub mod executor;
pub mod mention;
pub mod ports;
pub mod service;
