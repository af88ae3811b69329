//! Bot commands and the parser that produces them.
//!
//! Grammar (case-sensitive, first token prefix-matched):
//!
//! ```text
//! position <int>       move the servo (clamped to 0–100)
//! sweep                walk the servo through its travel
//! water [seconds]      run the pump, default 10 s, at most 30 s
//! ```
//!
//! Parsing never fails. A missing or malformed numeric argument is a
//! normal value of [`Argument`], and anything unrecognised becomes
//! [`Command::Unknown`].

use core::str::FromStr;

/// Keyword shown in the help reply.
pub const EXAMPLE_COMMAND: &str = "position";

/// A numeric argument as typed by the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument<T> {
    /// No token after the keyword.
    Missing,
    /// A token was given but does not parse.
    Invalid(String),
    Value(T),
}

impl<T> Argument<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Commands the bot understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Move the servo to a position.
    Position(Argument<i64>),
    /// Full servo sweep.
    Sweep,
    /// Run the pump for a number of seconds.
    Water(Argument<f64>),
    /// Anything else; carries the original text.
    Unknown(String),
}

impl Command {
    /// Parse the text that followed the bot mention.
    pub fn parse(remainder: &str) -> Self {
        let mut tokens = remainder.split_whitespace();
        let Some(keyword) = tokens.next() else {
            return Self::Unknown(remainder.to_owned());
        };
        let arg = tokens.next();

        if keyword.starts_with("position") {
            Self::Position(parse_int(arg))
        } else if keyword.starts_with("sweep") {
            Self::Sweep
        } else if keyword.starts_with("water") {
            Self::Water(parse_float(arg))
        } else {
            Self::Unknown(remainder.to_owned())
        }
    }
}

/// Integer argument; `Invalid` on anything `i64` rejects.
pub fn parse_int(token: Option<&str>) -> Argument<i64> {
    parse_token(token, |_| true)
}

/// Float argument; `Invalid` on unparsable, NaN or infinite input.
pub fn parse_float(token: Option<&str>) -> Argument<f64> {
    parse_token(token, |v: &f64| v.is_finite())
}

fn parse_token<T: FromStr>(token: Option<&str>, accept: impl Fn(&T) -> bool) -> Argument<T> {
    let Some(token) = token else {
        return Argument::Missing;
    };
    match token.parse::<T>() {
        Ok(v) if accept(&v) => Argument::Value(v),
        _ => Argument::Invalid(token.to_owned()),
    }
}

/// `Some(v)` if `s` is an integer, otherwise `fallback`.
pub fn try_parse_int(s: &str, fallback: Option<i64>) -> Option<i64> {
    parse_int(Some(s)).value().copied().or(fallback)
}

/// `Some(v)` if `s` is a finite float, otherwise `fallback`.
pub fn try_parse_float(s: &str, fallback: Option<f64>) -> Option<f64> {
    parse_float(Some(s)).value().copied().or(fallback)
}
