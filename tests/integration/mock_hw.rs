//! Mock adapters for integration tests.
//!
//! Records every pin write, delay request, servo move and outbound
//! message so tests can assert on the full history without real GPIO or
//! a chat connection.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use embedded_hal::digital::{ErrorType, OutputPin};
use waterbot::app::events::{ChannelId, ChatEvent};
use waterbot::app::executor::CommandExecutor;
use waterbot::app::ports::{
    CancellableDelay, DelayOutcome, EventSource, MessageSink, ServoPort,
};
use waterbot::app::service::BotLoop;
use waterbot::config::BotConfig;
use waterbot::drivers::pump::HardwareActuator;
use waterbot::error::{ActuatorError, CommsError};
use waterbot::shutdown::ShutdownSignal;

pub use waterbot::app::events::BotIdentity;

// ── MockPin ───────────────────────────────────────────────────

/// Shared-history output pin: clones observe the same writes.
#[derive(Clone, Default)]
pub struct MockPin {
    pub levels: Arc<Mutex<Vec<bool>>>,
}

#[allow(dead_code)]
impl MockPin {
    pub fn is_high(&self) -> bool {
        self.levels.lock().unwrap().last() == Some(&true)
    }

    /// Number of LOW → HIGH writes.
    pub fn activations(&self) -> usize {
        self.levels.lock().unwrap().iter().filter(|l| **l).count()
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.levels.lock().unwrap().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.levels.lock().unwrap().push(true);
        Ok(())
    }
}

// ── MockDelay ─────────────────────────────────────────────────

/// Returns immediately, recording each requested duration.
#[derive(Default)]
pub struct MockDelay {
    pub asked: Mutex<Vec<Duration>>,
}

impl CancellableDelay for MockDelay {
    fn delay(&self, duration: Duration) -> DelayOutcome {
        self.asked.lock().unwrap().push(duration);
        DelayOutcome::Elapsed
    }
}

// ── MockServo ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockServo {
    pub moves: Vec<u8>,
    pub sweeps: u32,
}

impl ServoPort for MockServo {
    fn move_to(&mut self, position: u8) -> Result<u8, ActuatorError> {
        self.moves.push(position);
        Ok(position)
    }

    fn sweep(&mut self) -> Result<(), ActuatorError> {
        self.sweeps += 1;
        Ok(())
    }
}

// ── MockSource ────────────────────────────────────────────────

/// Scripted event source. `identity: None` makes `connect` fail.
pub struct MockSource {
    pub identity: Option<String>,
    pub batches: VecDeque<Result<Vec<ChatEvent>, CommsError>>,
}

#[allow(dead_code)]
impl MockSource {
    pub fn new(identity: &str) -> Self {
        Self {
            identity: Some(identity.to_owned()),
            batches: VecDeque::new(),
        }
    }

    pub fn push_batch(&mut self, events: Vec<ChatEvent>) {
        self.batches.push_back(Ok(events));
    }

    pub fn push_error(&mut self, e: CommsError) {
        self.batches.push_back(Err(e));
    }
}

impl EventSource for MockSource {
    fn connect(&mut self) -> Result<BotIdentity, CommsError> {
        self.identity
            .as_deref()
            .map(BotIdentity::new)
            .ok_or(CommsError::ConnectFailed)
    }

    fn poll(&mut self) -> Result<Vec<ChatEvent>, CommsError> {
        self.batches.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

// ── MockSink ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MockSink {
    pub sent: Vec<(ChannelId, String)>,
    pub fail: bool,
}

impl MessageSink for MockSink {
    fn send(&mut self, channel: &ChannelId, text: &str) -> Result<(), CommsError> {
        if self.fail {
            return Err(CommsError::SendFailed);
        }
        self.sent.push((channel.clone(), text.to_owned()));
        Ok(())
    }
}

// ── Bot builder ───────────────────────────────────────────────

pub type TestBot = BotLoop<MockSource, MockSink, MockPin, MockDelay, MockServo>;

pub fn test_config(bot_id: &str) -> BotConfig {
    BotConfig {
        bot_user_id: bot_id.to_owned(),
        poll_delay_ms: 1000,
        max_backoff_ms: 4000,
        ..BotConfig::default()
    }
}

/// Connected bot over mock adapters, plus a handle on the pump pin.
#[allow(dead_code)]
pub fn make_bot(source: MockSource) -> (TestBot, MockPin) {
    make_bot_with(source, MockSink::default(), ShutdownSignal::new())
}

pub fn make_bot_with(
    source: MockSource,
    sink: MockSink,
    shutdown: ShutdownSignal,
) -> (TestBot, MockPin) {
    let config = test_config(source.identity.as_deref().unwrap_or("BOTID"));
    let pin = MockPin::default();
    let pump = HardwareActuator::new(14, pin.clone(), &config.limits, MockDelay::default())
        .expect("mock pin never fails");
    let executor = CommandExecutor::new(Arc::new(pump), MockServo::default(), config.limits);
    let bot = BotLoop::connect(source, sink, executor, &config, shutdown)
        .expect("mock source connects");
    (bot, pin)
}

/// Every duration the pump was asked to run for.
pub fn pump_runs(bot: &TestBot) -> Vec<Duration> {
    bot.executor()
        .pump()
        .delay_source()
        .asked
        .lock()
        .unwrap()
        .clone()
}
