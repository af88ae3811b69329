//! End-to-end tests for the event → mention → parse → execute → reply
//! pipeline, over mock adapters.

use std::thread;
use std::time::{Duration, Instant};

use waterbot::app::events::ChatEvent;
use waterbot::error::CommsError;
use waterbot::shutdown::ShutdownSignal;

use super::mock_hw::{make_bot, make_bot_with, pump_runs, MockSink, MockSource};

fn msg(text: &str) -> ChatEvent {
    ChatEvent::message("C1", text).from_user("U777")
}

fn one_batch(events: Vec<ChatEvent>) -> MockSource {
    let mut src = MockSource::new("BOTID");
    src.push_batch(events);
    src
}

// ── Scenarios ────────────────────────────────────────────────

#[test]
fn bare_water_runs_pump_for_ten_seconds() {
    let (mut bot, pin) = make_bot(one_batch(vec![msg("<@BOTID> water")]));
    bot.run_cycle();

    assert_eq!(bot.sink().sent.len(), 1);
    assert_eq!(bot.sink().sent[0].0.as_str(), "C1");
    assert_eq!(bot.sink().sent[0].1, "Watered for 10 seconds");
    assert_eq!(pump_runs(&bot), vec![Duration::from_secs(10)]);
    assert_eq!(pin.activations(), 1);
    assert!(!pin.is_high(), "pump must be off after the command");
}

#[test]
fn too_long_water_is_rejected_without_actuation() {
    let (mut bot, pin) = make_bot(one_batch(vec![msg("<@BOTID> water 45")]));
    bot.run_cycle();

    assert!(bot.sink().sent[0].1.contains("between 0 and 30"));
    assert!(pump_runs(&bot).is_empty());
    assert_eq!(pin.activations(), 0);
}

#[test]
fn unparsable_position_gets_parse_error() {
    let (mut bot, _pin) = make_bot(one_batch(vec![msg("<@BOTID> position abc")]));
    bot.run_cycle();
    assert_eq!(bot.sink().sent[0].1, "Couldn't parse input. Must provide integer");
    assert!(bot.executor().servo().moves.is_empty());
}

#[test]
fn unmentioned_text_gets_no_reply() {
    let (mut bot, _pin) = make_bot(one_batch(vec![msg("hello there")]));
    bot.run_cycle();
    assert!(bot.sink().sent.is_empty());
    assert_eq!(bot.stats().commands, 0);
}

#[test]
fn mentions_of_other_users_are_ignored() {
    let (mut bot, _pin) = make_bot(one_batch(vec![msg("<@U999> water")]));
    bot.run_cycle();
    assert!(bot.sink().sent.is_empty());
    assert!(pump_runs(&bot).is_empty());
}

#[test]
fn own_and_subtyped_messages_are_ignored() {
    let (mut bot, _pin) = make_bot(one_batch(vec![
        ChatEvent::message("C1", "<@BOTID> water").from_user("BOTID"),
        msg("<@BOTID> water").with_subtype("message_changed"),
    ]));
    bot.run_cycle();
    assert!(bot.sink().sent.is_empty());
    assert!(pump_runs(&bot).is_empty());
}

#[test]
fn every_command_in_a_batch_is_answered_in_its_channel() {
    let (mut bot, _pin) = make_bot(one_batch(vec![
        ChatEvent::message("C1", "<@BOTID> water 2"),
        ChatEvent::message("C2", "<@BOTID> position 30"),
        ChatEvent::message("C3", "<@BOTID> sweep"),
        ChatEvent::message("C4", "<@BOTID> dance"),
    ]));
    bot.run_cycle();

    let sent: Vec<(&str, &str)> = bot
        .sink()
        .sent
        .iter()
        .map(|(c, t)| (c.as_str(), t.as_str()))
        .collect();
    assert_eq!(
        sent,
        vec![
            ("C1", "Watered for 2 seconds"),
            ("C2", "Moved to position 30"),
            ("C3", "Did a position sweep"),
            ("C4", "Not sure what you mean. Try *position*."),
        ]
    );
    assert_eq!(bot.executor().servo().moves, vec![30]);
    assert_eq!(bot.executor().servo().sweeps, 1);

    let stats = bot.stats();
    assert_eq!(stats.commands, 4);
    assert_eq!(stats.actuations, 3);
}

// ── Connection behaviour ─────────────────────────────────────

#[test]
fn connect_failure_is_reported() {
    let source = MockSource {
        identity: None,
        batches: Default::default(),
    };
    let config = super::mock_hw::test_config("BOTID");
    let pump = waterbot::drivers::pump::HardwareActuator::new(
        14,
        super::mock_hw::MockPin::default(),
        &config.limits,
        super::mock_hw::MockDelay::default(),
    )
    .unwrap();
    let executor = waterbot::app::executor::CommandExecutor::new(
        std::sync::Arc::new(pump),
        super::mock_hw::MockServo::default(),
        config.limits,
    );
    let result = waterbot::app::service::BotLoop::connect(
        source,
        MockSink::default(),
        executor,
        &config,
        ShutdownSignal::new(),
    );
    assert!(matches!(result, Err(CommsError::ConnectFailed)));
}

#[test]
fn identity_is_resolved_once_at_connect() {
    let (bot, _pin) = make_bot(MockSource::new("BOTID"));
    assert_eq!(bot.identity().as_str(), "BOTID");
}

#[test]
fn poll_failures_back_off_then_recover() {
    let mut src = MockSource::new("BOTID");
    src.push_error(CommsError::ReceiveFailed);
    src.push_error(CommsError::ReceiveFailed);
    src.push_error(CommsError::ReceiveFailed);
    src.push_error(CommsError::ReceiveFailed);
    src.push_batch(vec![msg("<@BOTID> water 1")]);
    src.push_error(CommsError::ReceiveFailed);
    let (mut bot, _pin) = make_bot(src);

    assert_eq!(bot.run_cycle(), Duration::from_secs(1));
    assert_eq!(bot.run_cycle(), Duration::from_secs(2));
    assert_eq!(bot.run_cycle(), Duration::from_secs(4));
    assert_eq!(bot.run_cycle(), Duration::from_secs(4));
    // Success resets the backoff and still runs the command.
    assert_eq!(bot.run_cycle(), Duration::from_secs(1));
    assert_eq!(bot.sink().sent[0].1, "Watered for 1 seconds");
    assert_eq!(bot.run_cycle(), Duration::from_secs(1));
    assert_eq!(bot.stats().poll_failures, 5);
}

#[test]
fn send_failure_does_not_stop_the_loop() {
    let sink = MockSink {
        fail: true,
        ..Default::default()
    };
    let (mut bot, pin) = make_bot_with(
        one_batch(vec![msg("<@BOTID> water 3")]),
        sink,
        ShutdownSignal::new(),
    );
    bot.run_cycle();
    assert_eq!(bot.stats().send_failures, 1);
    assert_eq!(pump_runs(&bot), vec![Duration::from_secs(3)]);
    assert!(!pin.is_high());
    // Next cycle still polls normally.
    assert_eq!(bot.run_cycle(), Duration::from_secs(1));
}

#[test]
fn run_returns_when_shutdown_fires() {
    let shutdown = ShutdownSignal::new();
    let (mut bot, pin) = make_bot_with(
        one_batch(vec![msg("<@BOTID> water 5")]),
        MockSink::default(),
        shutdown.clone(),
    );

    let trigger = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        shutdown.trigger();
    });

    let start = Instant::now();
    bot.run();
    trigger.join().unwrap();

    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(bot.stats().cycles >= 1);
    assert_eq!(bot.sink().sent[0].1, "Watered for 5 seconds");
    assert!(!pin.is_high());
}

#[test]
fn run_with_shutdown_already_set_does_nothing() {
    let shutdown = ShutdownSignal::new();
    shutdown.trigger();
    let (mut bot, _pin) = make_bot_with(
        one_batch(vec![msg("<@BOTID> water")]),
        MockSink::default(),
        shutdown,
    );
    bot.run();
    assert_eq!(bot.stats().cycles, 0);
    assert!(pump_runs(&bot).is_empty());
}
