//! Bot loop: the hexagonal core's driver.
//!
//! [`BotLoop`] owns the chat connection, the executor and the bot's own
//! identity. Each cycle it polls the event source, keeps the messages that
//! mention this bot, runs them, and posts the replies to the channel they
//! came from.
//!
//! ```text
//!  EventSource ──▶ ┌──────────────────────────────┐ ──▶ MessageSink
//!                  │          BotLoop             │
//!                  │ mention · parse · execute    │
//!                  └──────────────┬───────────────┘
//!                                 ▼
//!                       HardwareActuator (pump)
//! ```
//!
//! Watering runs inline, so the loop does not read new events while the
//! pump is on (at most `max_water_secs`).

use std::time::Duration;

use embedded_hal::digital::OutputPin;
use log::{error, info, warn};

use crate::config::BotConfig;
use crate::error::CommsError;
use crate::shutdown::ShutdownSignal;

use super::commands::Command;
use super::events::{BotIdentity, ChatEvent};
use super::executor::{CommandExecutor, Outcome};
use super::mention;
use super::ports::{CancellableDelay, EventSource, MessageSink, ServoPort};

// ───────────────────────────────────────────────────────────────
// Retry backoff
// ───────────────────────────────────────────────────────────────

/// Exponential retry delay for failed polls: base → 2× … capped at max.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            current: base,
        }
    }

    /// Delay to wait now; doubles the next one.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.base;
    }
}

// ───────────────────────────────────────────────────────────────
// Loop counters
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub cycles: u64,
    pub commands: u64,
    pub actuations: u64,
    pub poll_failures: u64,
    pub send_failures: u64,
}

// ───────────────────────────────────────────────────────────────
// BotLoop
// ───────────────────────────────────────────────────────────────

pub struct BotLoop<Src, Snk, P, D, S> {
    source: Src,
    sink: Snk,
    executor: CommandExecutor<P, D, S>,
    identity: BotIdentity,
    poll_delay: Duration,
    backoff: Backoff,
    shutdown: ShutdownSignal,
    stats: LoopStats,
}

impl<Src, Snk, P, D, S> BotLoop<Src, Snk, P, D, S>
where
    Src: EventSource,
    Snk: MessageSink,
    P: OutputPin,
    D: CancellableDelay,
    S: ServoPort,
{
    /// Connect the event source and resolve the bot identity.
    ///
    /// This is the only fatal failure point of the bot.
    pub fn connect(
        mut source: Src,
        sink: Snk,
        executor: CommandExecutor<P, D, S>,
        config: &BotConfig,
        shutdown: ShutdownSignal,
    ) -> Result<Self, CommsError> {
        let identity = source.connect().inspect_err(|e| {
            error!("Connection failed: {}", e);
        })?;
        info!("Bot connected and running as {}", identity);

        let poll_delay = Duration::from_millis(config.poll_delay_ms);
        Ok(Self {
            source,
            sink,
            executor,
            identity,
            poll_delay,
            backoff: Backoff::new(poll_delay, Duration::from_millis(config.max_backoff_ms)),
            shutdown,
            stats: LoopStats::default(),
        })
    }

    /// Run until shutdown is requested.
    pub fn run(&mut self) {
        while !self.shutdown.is_triggered() {
            let wait = self.run_cycle();
            if self.shutdown.wait_timeout(wait) {
                break;
            }
        }
        info!(
            "Bot loop stopped after {} cycles ({} commands, {} actuations)",
            self.stats.cycles, self.stats.commands, self.stats.actuations
        );
    }

    /// One poll-and-dispatch pass. Returns how long to wait before the next.
    pub fn run_cycle(&mut self) -> Duration {
        self.stats.cycles += 1;
        self.executor.pump().enforce_deadline();

        match self.source.poll() {
            Ok(events) => {
                self.backoff.reset();
                for event in &events {
                    if self.shutdown.is_triggered() {
                        break;
                    }
                    self.handle_event(event);
                }
                self.poll_delay
            }
            Err(e) => {
                self.stats.poll_failures += 1;
                let delay = self.backoff.next_delay();
                warn!("Event poll failed ({}), retrying in {:?}", e, delay);
                delay
            }
        }
    }

    /// Filter, execute and answer a single event.
    ///
    /// Returns `None` when the event is not a command for this bot.
    pub fn handle_event(&mut self, event: &ChatEvent) -> Option<Outcome> {
        let directed = mention::filter_for(event, &self.identity)?;
        info!("Received command \"{}\" in {}", directed.remainder, directed.channel);

        let command = Command::parse(&directed.remainder);
        let outcome = self.executor.execute(&command);
        self.stats.commands += 1;
        if outcome.actuated {
            self.stats.actuations += 1;
        }

        if let Err(e) = self.sink.send(&directed.channel, &outcome.response) {
            self.stats.send_failures += 1;
            warn!("Reply to {} failed: {}", directed.channel, e);
        }
        Some(outcome)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn identity(&self) -> &BotIdentity {
        &self.identity
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn executor(&self) -> &CommandExecutor<P, D, S> {
        &self.executor
    }

    pub fn sink(&self) -> &Snk {
        &self.sink
    }
}
