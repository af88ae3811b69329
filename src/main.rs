//! Waterbot main entry point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  ConsoleSource / ConsoleSink      GpioPin / ServoPwm           │
//! │  (EventSource, MessageSink)       (OutputPin, SetDutyCycle)    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │   BotLoop · MentionFilter · Command · CommandExecutor  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  HardwareActuator (pump, fail-safe) · ShutdownSignal           │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, info, warn};
use tracing_subscriber::EnvFilter;

use waterbot::adapters::console::{ConsoleSink, ConsoleSource};
use waterbot::adapters::gpio::{GpioPin, ServoPwm};
use waterbot::app::executor::CommandExecutor;
use waterbot::app::ports::{NoServo, ServoPort};
use waterbot::app::service::BotLoop;
use waterbot::config::BotConfig;
use waterbot::drivers::pump::HardwareActuator;
use waterbot::drivers::servo::PwmServo;
use waterbot::error::Error;
use waterbot::pins;
use waterbot::shutdown::ShutdownSignal;

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Waterbot v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Config ─────────────────────────────────────────────
    let config = BotConfig::from_env();
    config.validate().context("invalid configuration")?;

    // ── 3. Shutdown wiring ────────────────────────────────────
    let shutdown = ShutdownSignal::new();
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            info!("Shutdown requested");
            shutdown.trigger();
        })
        .context("failed to install signal handler")?;
    }

    // ── 4. Hardware ───────────────────────────────────────────
    let pin = GpioPin::open(config.gpio_backend, config.pump_gpio)
        .with_context(|| format!("failed to open pump GPIO{}", config.pump_gpio))?;
    let pump = Arc::new(
        HardwareActuator::new(config.pump_gpio, pin, &config.limits, shutdown.clone())
            .map_err(Error::from)
            .context("failed to force pump off at startup")?,
    );

    let servo: Box<dyn ServoPort + Send> = if config.servo_enabled {
        let pwm = ServoPwm::open(config.gpio_backend, pins::SERVO_PWM_CHIP, pins::SERVO_PWM_CHANNEL)
            .context("failed to open servo PWM")?;
        info!("Servo enabled on GPIO{}", pins::SERVO_PWM_GPIO);
        Box::new(PwmServo::new(pwm))
    } else {
        info!("Servo disabled; position/sweep are acknowledged without moving");
        Box::new(NoServo)
    };

    let executor = CommandExecutor::new(Arc::clone(&pump), servo, config.limits);

    // ── 5. Connect ────────────────────────────────────────────
    let source = ConsoleSource::stdin(config.bot_user_id.clone());
    let mut bot = match BotLoop::connect(source, ConsoleSink::stdout(), executor, &config, shutdown) {
        Ok(bot) => bot,
        Err(e) => {
            error!("Connection failed, exiting");
            if let Err(off_err) = pump.turn_off() {
                warn!("Pump shutoff after failed connect failed: {}", off_err);
            }
            return Err(Error::from(e)).context("could not connect to the chat stream");
        }
    };

    // ── 6. Event loop ─────────────────────────────────────────
    bot.run();

    // ── 7. Teardown: pump off no matter what ──────────────────
    if let Err(e) = pump.turn_off() {
        warn!("Final pump shutoff failed: {}", e);
    }
    info!("Waterbot stopped");
    Ok(())
}
