//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter   | Implements                  | Connects to                  |
//! |-----------|-----------------------------|------------------------------|
//! | `console` | EventSource, MessageSink    | stdin / stdout               |
//! | `gpio`    | OutputPin (embedded-hal)    | sysfs GPIO or simulation     |
//! |           | SetDutyCycle (embedded-hal) | sysfs PWM or simulation      |

pub mod console;
pub mod gpio;
