//! GPIO / PWM adapters implementing the `embedded-hal` output traits.
//!
//! - **`Sysfs*`**: Linux `/sys/class/gpio` and `/sys/class/pwm`, as found
//!   on a Raspberry Pi.
//! - **`Simulated*`**: in-memory state with log output, for development
//!   machines and dry runs.
//!
//! [`GpioPin`] and [`ServoPwm`] pick one of the two at runtime from
//! [`GpioBackend`].

use core::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use embedded_hal::digital::{self, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};
use log::{debug, info};

use crate::config::GpioBackend;
use crate::pins::{SERVO_DUTY_RANGE, SERVO_PERIOD_NS};

pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";
pub const SYSFS_PWM_ROOT: &str = "/sys/class/pwm";

/// Attempts to wait for udev to hand over a freshly exported pin.
const EXPORT_SETTLE_ATTEMPTS: u32 = 10;
const EXPORT_SETTLE_STEP: Duration = Duration::from_millis(50);

// ── Error type ────────────────────────────────────────────────

/// A failed sysfs write.
#[derive(Debug)]
pub struct GpioError {
    pub op: &'static str,
    pub path: PathBuf,
    pub source: io::Error,
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} failed: {}", self.op, self.path.display(), self.source)
    }
}

impl std::error::Error for GpioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl digital::Error for GpioError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

impl pwm::Error for GpioError {
    fn kind(&self) -> pwm::ErrorKind {
        pwm::ErrorKind::Other
    }
}

fn write_attr(path: &Path, value: &str, op: &'static str) -> Result<(), GpioError> {
    fs::write(path, value).map_err(|source| GpioError {
        op,
        path: path.to_path_buf(),
        source,
    })
}

/// Write `value`, retrying while a just-exported node is still being set up.
fn write_attr_settling(path: &Path, value: &str, op: &'static str) -> Result<(), GpioError> {
    let mut attempt = 1;
    loop {
        match write_attr(path, value, op) {
            Err(e) if attempt < EXPORT_SETTLE_ATTEMPTS => {
                debug!("{} (attempt {}), retrying", e, attempt);
                std::thread::sleep(EXPORT_SETTLE_STEP);
                attempt += 1;
            }
            other => return other,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Digital output
// ───────────────────────────────────────────────────────────────

/// In-memory output pin.
#[derive(Debug)]
pub struct SimulatedPin {
    gpio: u32,
    high: bool,
}

impl SimulatedPin {
    pub fn new(gpio: u32) -> Self {
        info!("gpio(sim): GPIO{} configured as output", gpio);
        Self { gpio, high: false }
    }

    pub fn is_high(&self) -> bool {
        self.high
    }

    fn set(&mut self, high: bool) {
        if self.high != high {
            info!("gpio(sim): GPIO{} -> {}", self.gpio, if high { "HIGH" } else { "LOW" });
        }
        self.high = high;
    }
}

/// Output pin driven through `/sys/class/gpio/gpioN`.
#[derive(Debug)]
pub struct SysfsPin {
    value_path: PathBuf,
}

impl SysfsPin {
    /// Export `gpio` under the standard sysfs root and make it an output, LOW.
    pub fn open(gpio: u32) -> Result<Self, GpioError> {
        Self::open_at(Path::new(SYSFS_GPIO_ROOT), gpio)
    }

    /// As [`open`](Self::open) with a custom sysfs root.
    pub fn open_at(root: &Path, gpio: u32) -> Result<Self, GpioError> {
        let dir = root.join(format!("gpio{gpio}"));
        if !dir.exists() {
            write_attr(&root.join("export"), &gpio.to_string(), "export")?;
        }
        // "low" sets the direction to output with the level already LOW.
        write_attr_settling(&dir.join("direction"), "low", "set direction")?;
        info!("gpio(sysfs): GPIO{} configured as output", gpio);
        Ok(Self {
            value_path: dir.join("value"),
        })
    }
}

impl digital::ErrorType for SysfsPin {
    type Error = GpioError;
}

impl OutputPin for SysfsPin {
    fn set_low(&mut self) -> Result<(), GpioError> {
        write_attr(&self.value_path, "0", "write value")
    }

    fn set_high(&mut self) -> Result<(), GpioError> {
        write_attr(&self.value_path, "1", "write value")
    }
}

/// Runtime-selected pump pin.
#[derive(Debug)]
pub enum GpioPin {
    Simulated(SimulatedPin),
    Sysfs(SysfsPin),
}

impl GpioPin {
    pub fn open(backend: GpioBackend, gpio: u32) -> Result<Self, GpioError> {
        Ok(match backend {
            GpioBackend::Simulated => Self::Simulated(SimulatedPin::new(gpio)),
            GpioBackend::Sysfs => Self::Sysfs(SysfsPin::open(gpio)?),
        })
    }
}

impl digital::ErrorType for GpioPin {
    type Error = GpioError;
}

impl OutputPin for GpioPin {
    fn set_low(&mut self) -> Result<(), GpioError> {
        match self {
            Self::Simulated(p) => {
                p.set(false);
                Ok(())
            }
            Self::Sysfs(p) => p.set_low(),
        }
    }

    fn set_high(&mut self) -> Result<(), GpioError> {
        match self {
            Self::Simulated(p) => {
                p.set(true);
                Ok(())
            }
            Self::Sysfs(p) => p.set_high(),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// PWM output
// ───────────────────────────────────────────────────────────────

/// In-memory PWM channel.
#[derive(Debug, Default)]
pub struct SimulatedPwm {
    duty: u16,
}

impl SimulatedPwm {
    pub fn duty(&self) -> u16 {
        self.duty
    }
}

/// PWM channel driven through `/sys/class/pwm/pwmchipN/pwmM`.
#[derive(Debug)]
pub struct SysfsPwm {
    duty_path: PathBuf,
    period_ns: u32,
}

impl SysfsPwm {
    /// Export the channel, set a 50 Hz period and enable it at 0 % duty.
    pub fn open(chip: u32, channel: u32) -> Result<Self, GpioError> {
        Self::open_at(Path::new(SYSFS_PWM_ROOT), chip, channel)
    }

    pub fn open_at(root: &Path, chip: u32, channel: u32) -> Result<Self, GpioError> {
        let chip_dir = root.join(format!("pwmchip{chip}"));
        let dir = chip_dir.join(format!("pwm{channel}"));
        if !dir.exists() {
            write_attr(&chip_dir.join("export"), &channel.to_string(), "export")?;
        }
        write_attr_settling(&dir.join("period"), &SERVO_PERIOD_NS.to_string(), "set period")?;
        write_attr(&dir.join("duty_cycle"), "0", "set duty")?;
        write_attr(&dir.join("enable"), "1", "enable")?;
        info!("pwm(sysfs): pwmchip{}/pwm{} enabled at 50 Hz", chip, channel);
        Ok(Self {
            duty_path: dir.join("duty_cycle"),
            period_ns: SERVO_PERIOD_NS,
        })
    }
}

impl pwm::ErrorType for SysfsPwm {
    type Error = GpioError;
}

impl SetDutyCycle for SysfsPwm {
    fn max_duty_cycle(&self) -> u16 {
        SERVO_DUTY_RANGE
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), GpioError> {
        let duty = u64::from(duty.min(SERVO_DUTY_RANGE));
        let ns = u64::from(self.period_ns) * duty / u64::from(SERVO_DUTY_RANGE);
        write_attr(&self.duty_path, &ns.to_string(), "set duty")
    }
}

/// Runtime-selected servo PWM channel.
#[derive(Debug)]
pub enum ServoPwm {
    Simulated(SimulatedPwm),
    Sysfs(SysfsPwm),
}

impl ServoPwm {
    pub fn open(backend: GpioBackend, chip: u32, channel: u32) -> Result<Self, GpioError> {
        Ok(match backend {
            GpioBackend::Simulated => {
                info!("pwm(sim): pwmchip{}/pwm{} configured", chip, channel);
                Self::Simulated(SimulatedPwm::default())
            }
            GpioBackend::Sysfs => Self::Sysfs(SysfsPwm::open(chip, channel)?),
        })
    }
}

impl pwm::ErrorType for ServoPwm {
    type Error = GpioError;
}

impl SetDutyCycle for ServoPwm {
    fn max_duty_cycle(&self) -> u16 {
        SERVO_DUTY_RANGE
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), GpioError> {
        match self {
            Self::Simulated(p) => {
                p.duty = duty.min(SERVO_DUTY_RANGE);
                debug!("pwm(sim): duty {}/{}", p.duty, SERVO_DUTY_RANGE);
                Ok(())
            }
            Self::Sysfs(p) => p.set_duty_cycle(duty),
        }
    }
}
