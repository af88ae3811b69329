//! Waterbot library.
//!
//! Exposes the command interpreter, actuation controller and adapters for
//! integration testing. The binary in `main.rs` only wires them together.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod shutdown;
