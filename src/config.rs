//! Bot configuration parameters
//!
//! All tunable parameters for the waterbot. Values can be overridden by a
//! JSON file named in `WATERBOT_CONFIG`; the bot id can also be set with
//! `WATERBOT_BOT_ID`.

use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pins;

/// Environment variable naming the JSON config file.
pub const CONFIG_PATH_ENV: &str = "WATERBOT_CONFIG";
/// Environment variable overriding [`BotConfig::bot_user_id`].
pub const BOT_ID_ENV: &str = "WATERBOT_BOT_ID";

/// Absolute cap on a single watering (seconds). No configuration can
/// raise the pump's on-time above this.
pub const HARD_MAX_WATER_SECS: f64 = 30.0;

/// Pump on-time bounds. The pump is never driven for a duration outside
/// `(0, max_water_secs]`, and `max_water_secs` never exceeds
/// [`HARD_MAX_WATER_SECS`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuationLimits {
    /// Hard ceiling on a single watering (seconds). Protects the pump from
    /// running dry for long stretches.
    pub max_water_secs: f64,
    /// Duration used by a bare `water` command (seconds).
    pub default_water_secs: f64,
}

impl Default for ActuationLimits {
    fn default() -> Self {
        Self {
            max_water_secs: HARD_MAX_WATER_SECS,
            default_water_secs: 10.0,
        }
    }
}

impl ActuationLimits {
    /// Effective ceiling: `max_water_secs`, capped at [`HARD_MAX_WATER_SECS`].
    pub fn ceiling(&self) -> f64 {
        self.max_water_secs.min(HARD_MAX_WATER_SECS)
    }

    /// True if `secs` lies in `(0, ceiling]`.
    pub fn allows(&self, secs: f64) -> bool {
        secs.is_finite() && secs > 0.0 && secs <= self.ceiling()
    }
}

/// Where GPIO writes go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpioBackend {
    /// In-memory pins that only log transitions.
    Simulated,
    /// Linux `/sys/class/gpio` and `/sys/class/pwm`.
    Sysfs,
}

/// Core bot configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    // --- Identity ---
    /// User id the bot answers to (mentions must target this id).
    pub bot_user_id: String,

    // --- Timing ---
    /// Delay between event polls (milliseconds)
    pub poll_delay_ms: u64,
    /// Upper bound on the retry delay after a failed poll (milliseconds)
    pub max_backoff_ms: u64,

    // --- Hardware ---
    pub gpio_backend: GpioBackend,
    /// BCM pin driving the pump relay
    pub pump_gpio: u32,
    /// Wire up the servo on hardware PWM. Off by default: most builds
    /// have no servo attached.
    pub servo_enabled: bool,

    // --- Safety ---
    pub limits: ActuationLimits,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_user_id: "UWATERBOT".into(),

            poll_delay_ms: 1000,   // 1 Hz
            max_backoff_ms: 30_000,

            gpio_backend: GpioBackend::Simulated,
            pump_gpio: pins::PUMP_GPIO,
            servo_enabled: false,

            limits: ActuationLimits::default(),
        }
    }
}

impl BotConfig {
    /// Check every field. Out-of-range values are rejected, never clamped.
    pub fn validate(&self) -> Result<()> {
        if self.bot_user_id.trim().is_empty() {
            return Err(Error::Config("bot_user_id must not be empty"));
        }
        if self.poll_delay_ms == 0 {
            return Err(Error::Config("poll_delay_ms must be > 0"));
        }
        if self.max_backoff_ms < self.poll_delay_ms {
            return Err(Error::Config("max_backoff_ms must be >= poll_delay_ms"));
        }
        let l = &self.limits;
        if !(l.max_water_secs.is_finite() && l.max_water_secs > 0.0) {
            return Err(Error::Config("limits.max_water_secs must be > 0"));
        }
        if l.max_water_secs > HARD_MAX_WATER_SECS {
            return Err(Error::Config("limits.max_water_secs must not exceed 30"));
        }
        if !l.allows(l.default_water_secs) {
            return Err(Error::Config(
                "limits.default_water_secs must lie in (0, max_water_secs]",
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON config document.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let cfg: Self = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from `path`, or defaults when no path is given.
    ///
    /// A missing or broken file falls back to defaults with a warning so a
    /// bad edit never keeps the bot from starting.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            info!("No {} set, using default config", CONFIG_PATH_ENV);
            return Self::default();
        };
        match std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|text| Self::from_json(&text))
        {
            Ok(cfg) => {
                info!("Config loaded from {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Config load from {} failed ({}), using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// [`load`](Self::load) driven by the process environment.
    pub fn from_env() -> Self {
        let path = std::env::var_os(CONFIG_PATH_ENV).map(std::path::PathBuf::from);
        let mut cfg = Self::load(path.as_deref());
        if let Ok(id) = std::env::var(BOT_ID_ENV) {
            if id.trim().is_empty() {
                warn!("{} is empty, keeping '{}'", BOT_ID_ENV, cfg.bot_user_id);
            } else {
                cfg.bot_user_id = id.trim().to_owned();
            }
        }
        cfg
    }
}
