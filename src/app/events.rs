//! Inbound chat events and the bot-directed commands extracted from them.
//!
//! [`ChatEvent`] mirrors the chat platform's real-time event JSON closely
//! enough to deserialize it directly. Only `message` events without a
//! subtype can carry commands; edits, joins, bot echoes and the like all
//! arrive with a subtype set.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Opaque channel identifier, echoed back when replying.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The bot's own user id, resolved once when the connection comes up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BotIdentity(String);

impl BotIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BotIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A raw event from the real-time stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub channel: ChannelId,
    /// Author of the message, when the platform reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl ChatEvent {
    /// A plain `message` event with no subtype.
    pub fn message(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: "message".into(),
            subtype: None,
            text: text.into(),
            channel: ChannelId::new(channel),
            user: None,
        }
    }

    /// Builder: set the author.
    #[must_use]
    pub fn from_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Builder: set a subtype (`message_changed`, `channel_join`, ...).
    #[must_use]
    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    pub fn has_subtype(&self) -> bool {
        self.subtype.is_some()
    }
}

/// Text addressed to someone via a leading mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectedCommand {
    /// The mentioned user id (who the message is addressed to).
    pub sender_id: String,
    /// Everything after the mention, trimmed.
    pub remainder: String,
    /// Where the message was posted; replies go back here.
    pub channel: ChannelId,
}
