//! Direct-mention filter.
//!
//! Picks out messages that start with a user mention (`<@U123> ...`) and
//! splits them into the mentioned id and the rest of the line.

use std::sync::LazyLock;

use regex::Regex;

use super::events::{BotIdentity, ChatEvent, DirectedCommand};

/// Optional `<@`, a user id (`U`/`W` users, `B` bots), optional `>`, rest of line.
static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:<@)?([UWB][A-Z0-9]*)>?(.*)").expect("mention pattern is valid")
});

/// Extract a [`DirectedCommand`] from a plain, un-subtyped message that
/// starts with a mention. Anything else yields `None`.
pub fn filter(event: &ChatEvent) -> Option<DirectedCommand> {
    if event.kind != "message" || event.has_subtype() {
        return None;
    }
    let caps = MENTION_RE.captures(&event.text)?;
    Some(DirectedCommand {
        sender_id: caps[1].to_owned(),
        remainder: caps[2].trim().to_owned(),
        channel: event.channel.clone(),
    })
}

/// [`filter`], keeping only mentions of `me` that `me` did not write.
pub fn filter_for(event: &ChatEvent, me: &BotIdentity) -> Option<DirectedCommand> {
    if event.user.as_deref() == Some(me.as_str()) {
        return None;
    }
    filter(event).filter(|cmd| cmd.sender_id == me.as_str())
}
