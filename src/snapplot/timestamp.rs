//! # Timestamp Tokens
//!
//! Every capture is identified by a token derived from the UTC wall clock:
//!
//! ```text
//! 20241201_143022_123
//! ^^^^^^^^ ^^^^^^ ^^^
//! date     time   milliseconds
//! ```
//!
//! Tokens sort lexically in creation order, decode back into a UTC instant with
//! millisecond precision, and prefix every file written by one capture so that the
//! code, image and page of a capture can always be matched up.
//!
//! ## Uniqueness
//!
//! Two captures in the same millisecond would produce the same token and overwrite
//! each other's files. [`TokenSource::next`] therefore never returns the token it
//! issued last: when the clock has not advanced far enough it spins until it has.
//! The wait is unconditional and has no timeout; it resolves within a clock tick.
//!
//! ## Epochs
//!
//! A [`TokenSource`] also caches a *current* token. [`TokenSource::current`] keeps
//! returning it until [`TokenSource::reset`] starts a new epoch, so every sub-step of
//! one capture can ask for "the" token and get the same answer. Capture sessions
//! hold their token directly (see `capture::CaptureSession`); the cache is there for
//! callers that coordinate several writers around one identifier.

use crate::error::{Result, SnapError};
use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

/// `strftime` pattern of a token.
pub const TOKEN_FORMAT: &str = "%Y%m%d_%H%M%S_%3f";

/// Length in bytes of every token.
pub const TOKEN_LEN: usize = 19;

/// A sortable, unique capture identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Token(String);

impl Token {
    /// Builds the token for an instant, truncating to milliseconds.
    pub fn from_datetime(instant: DateTime<Utc>) -> Self {
        Token(instant.format(TOKEN_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The instant this token encodes.
    pub fn datetime(&self) -> DateTime<Utc> {
        // Tokens are only constructed from valid instants or validated strings.
        parse_token(&self.0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Human-readable form, e.g. `2024-12-01 14:30:22 UTC`.
    pub fn display_time(&self) -> String {
        self.datetime().format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Token {
    type Err = SnapError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() == TOKEN_LEN && parse_token(s).is_some() {
            Ok(Token(s.to_string()))
        } else {
            Err(SnapError::InvalidToken(s.to_string()))
        }
    }
}

impl TryFrom<String> for Token {
    type Error = SnapError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Token> for String {
    fn from(token: Token) -> Self {
        token.0
    }
}

fn parse_token(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, TOKEN_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Decodes the instant at the start of a name such as
/// `20250717_152701_767_Random-Walk` or `20250717_152701_plot`.
///
/// The millisecond part is optional. Returns `None` when the name does not start
/// with a date and time.
pub fn parse_prefix(name: &str) -> Option<DateTime<Utc>> {
    let mut parts = name.split('_');
    let date = parts.next()?;
    let time = parts.next()?;
    if date.len() != 8 || time.len() != 6 {
        return None;
    }

    let millis = parts
        .next()
        .filter(|p| p.len() == 3 && p.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or("000");

    parse_token(&format!("{}_{}_{}", date, time, millis))
}

/// Source of the current instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Issues tokens that never repeat the previously issued one.
#[derive(Debug)]
pub struct TokenSource<C: Clock = SystemClock> {
    clock: C,
    last_issued: Option<Token>,
    current: Option<Token>,
}

impl Default for TokenSource<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSource<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> TokenSource<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            last_issued: None,
            current: None,
        }
    }

    /// Issues a fresh token, spinning until the clock yields one that differs from
    /// the last token issued by this source.
    pub fn next(&mut self) -> Token {
        let token = loop {
            let candidate = Token::from_datetime(self.clock.now());
            if self.last_issued.as_ref() != Some(&candidate) {
                break candidate;
            }
            std::hint::spin_loop();
        };
        self.last_issued = Some(token.clone());
        self.current = Some(token.clone());
        token
    }

    /// Returns the token of the current epoch, issuing one if none is cached.
    pub fn current(&mut self) -> Token {
        match &self.current {
            Some(token) => token.clone(),
            None => self.next(),
        }
    }

    /// Ends the current epoch; the next [`current`](Self::current) call issues a new token.
    pub fn reset(&mut self) {
        self.current = None;
    }

    pub fn last_issued(&self) -> Option<&Token> {
        self.last_issued.as_ref()
    }
}

static GLOBAL_SOURCE: Lazy<Mutex<TokenSource>> = Lazy::new(|| Mutex::new(TokenSource::new()));

/// Issues a fresh token from the process-wide source.
///
/// All capture sessions draw from this source, so two sessions in the same
/// process never share a token.
pub fn next_token() -> Token {
    let mut source = GLOBAL_SOURCE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    source.next()
}
