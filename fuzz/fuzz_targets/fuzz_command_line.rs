//! Fuzz target: console line → mention filter → command parser
//!
//! Feeds arbitrary UTF-8 through the whole inbound text path and checks:
//! - No panics on any input, JSON or plain text
//! - A filtered remainder never carries leading/trailing whitespace
//! - `water` arguments that parse are always finite
//!
//! cargo fuzz run fuzz_command_line

#![no_main]

use libfuzzer_sys::fuzz_target;
use waterbot::adapters::console::parse_line;
use waterbot::app::commands::{Argument, Command};
use waterbot::app::events::BotIdentity;
use waterbot::app::mention;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };
    let Some(event) = parse_line(line) else {
        return;
    };

    let Some(directed) = mention::filter(&event) else {
        return;
    };
    assert_eq!(directed.remainder, directed.remainder.trim());

    // Same event addressed to whoever was mentioned must pass the bot filter
    // unless that id also wrote it.
    let me = BotIdentity::new(directed.sender_id.clone());
    if event.user.as_deref() != Some(me.as_str()) {
        assert!(mention::filter_for(&event, &me).is_some());
    }

    if let Command::Water(Argument::Value(secs)) = Command::parse(&directed.remainder) {
        assert!(secs.is_finite());
    }
});
