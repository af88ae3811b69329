//! Console chat adapter.
//!
//! Implements [`EventSource`] over a line reader (stdin by default) and
//! [`MessageSink`] over a writer (stdout by default), so the bot can be
//! driven from a terminal or a pipe without a chat platform.
//!
//! Each input line is either a JSON [`ChatEvent`] (lines starting with
//! `{`) or plain text, which is wrapped as a `message` from user
//! `console` in channel `console`.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use log::{debug, info, warn};

use crate::app::events::{BotIdentity, ChannelId, ChatEvent};
use crate::app::ports::{EventSource, MessageSink};
use crate::error::CommsError;

pub const CONSOLE_CHANNEL: &str = "console";
pub const CONSOLE_USER: &str = "console";

/// Turn one input line into an event. Blank and malformed lines yield `None`.
pub fn parse_line(line: &str) -> Option<ChatEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if line.starts_with('{') {
        return match serde_json::from_str::<ChatEvent>(line) {
            Ok(ev) => Some(ev),
            Err(e) => {
                warn!("console: ignoring malformed event JSON: {}", e);
                None
            }
        };
    }
    Some(ChatEvent::message(CONSOLE_CHANNEL, line).from_user(CONSOLE_USER))
}

/// Reads events from a line-oriented stream on a background thread.
pub struct ConsoleSource {
    bot_id: String,
    reader: Option<Box<dyn BufRead + Send>>,
    rx: Option<Receiver<ChatEvent>>,
}

impl ConsoleSource {
    /// Read from the process's stdin.
    pub fn stdin(bot_id: impl Into<String>) -> Self {
        Self::from_reader(bot_id, io::BufReader::new(io::stdin()))
    }

    pub fn from_reader(bot_id: impl Into<String>, reader: impl BufRead + Send + 'static) -> Self {
        Self {
            bot_id: bot_id.into(),
            reader: Some(Box::new(reader)),
            rx: None,
        }
    }
}

impl EventSource for ConsoleSource {
    fn connect(&mut self) -> Result<BotIdentity, CommsError> {
        if self.bot_id.trim().is_empty() {
            warn!("console: no bot id configured");
            return Err(CommsError::ConnectFailed);
        }
        let Some(reader) = self.reader.take() else {
            warn!("console: already connected");
            return Err(CommsError::ConnectFailed);
        };

        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("console-reader".into())
            .spawn(move || {
                for line in reader.lines() {
                    let Ok(line) = line else { break };
                    if let Some(ev) = parse_line(&line) {
                        if tx.send(ev).is_err() {
                            break;
                        }
                    }
                }
                debug!("console: input closed");
            })
            .map_err(|e| {
                warn!("console: reader thread spawn failed: {}", e);
                CommsError::ConnectFailed
            })?;
        self.rx = Some(rx);

        info!("console: connected as {}", self.bot_id);
        Ok(BotIdentity::new(self.bot_id.clone()))
    }

    fn poll(&mut self) -> Result<Vec<ChatEvent>, CommsError> {
        let rx = self.rx.as_ref().ok_or(CommsError::ReceiveFailed)?;
        let mut events = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(ev) => events.push(ev),
                Err(TryRecvError::Empty) => return Ok(events),
                Err(TryRecvError::Disconnected) => {
                    return if events.is_empty() {
                        Err(CommsError::StreamClosed)
                    } else {
                        Ok(events)
                    };
                }
            }
        }
    }
}

/// Writes replies as `[#channel] text` lines.
pub struct ConsoleSink<W> {
    out: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }
}

impl<W: Write> MessageSink for ConsoleSink<W> {
    fn send(&mut self, channel: &ChannelId, text: &str) -> Result<(), CommsError> {
        writeln!(self.out, "[#{}] {}", channel, text)
            .and_then(|()| self.out.flush())
            .map_err(|e| {
                warn!("console: write failed: {}", e);
                CommsError::SendFailed
            })
    }
}
