//! Channel/signal service response types.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::json::{
    RawChannel, RawSignal, deserialize_empty_string_as_none, deserialize_null_as_default,
};

/// A monitored channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawChannel")]
pub struct Channel {
    /// Server-assigned channel ID.
    pub id: i64,
    /// Channel handle without the leading `@`.
    pub channel_username: String,
    /// Display name (falls back to the handle).
    pub channel_title: String,
    /// Whether the scraper visits this channel.
    pub is_active: bool,
    /// Scrape cursor: the last processed message ID.
    pub last_message_id: i64,
}

impl Channel {
    /// Returns the handle with a leading `@` for display.
    #[must_use]
    pub fn handle(&self) -> String {
        format!("@{}", self.channel_username)
    }

    /// Returns the public web link for the channel.
    #[must_use]
    pub fn web_url(&self) -> String {
        format!("https://t.me/{}", self.channel_username)
    }
}

impl From<RawChannel> for Channel {
    fn from(raw: RawChannel) -> Self {
        let channel_username = raw.channel_username.unwrap_or_default();
        let channel_title = raw
            .channel_title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| channel_username.clone());
        Self {
            id: raw.id,
            channel_username,
            channel_title,
            is_active: raw.is_active.unwrap_or(true),
            last_message_id: raw.last_message_id.unwrap_or(0),
        }
    }
}

/// Direction of a trade signal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum SignalType {
    /// `BUY` (long).
    Buy,
    /// `SELL` (short).
    Sell,
    /// Any other label the server sent.
    Other(String),
    /// Missing or empty.
    #[default]
    Unknown,
}

impl SignalType {
    /// Returns the label as shown to users.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Other(s) => s,
            Self::Unknown => "-",
        }
    }
}

impl From<Option<String>> for SignalType {
    fn from(value: Option<String>) -> Self {
        match value.as_deref().map(str::trim) {
            None | Some("") => Self::Unknown,
            Some(s) if s.eq_ignore_ascii_case("BUY") => Self::Buy,
            Some(s) if s.eq_ignore_ascii_case("SELL") => Self::Sell,
            Some(s) => Self::Other(String::from(s)),
        }
    }
}

impl From<SignalType> for Option<String> {
    fn from(value: SignalType) -> Self {
        match value {
            SignalType::Buy => Some(String::from("BUY")),
            SignalType::Sell => Some(String::from("SELL")),
            SignalType::Other(s) => Some(s),
            SignalType::Unknown => None,
        }
    }
}

impl Serialize for SignalType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Option::<String>::from(self.clone()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SignalType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Self::from(Option::<String>::deserialize(deserializer)?))
    }
}

/// A trade signal extracted from a channel message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSignal")]
pub struct Signal {
    /// Server-assigned signal ID.
    pub id: i64,
    /// Ticker symbol (if one was recognised).
    pub ticker: Option<String>,
    /// Signal direction.
    pub signal_type: SignalType,
    /// Entry price.
    pub entry_price: Option<f64>,
    /// Target price.
    pub target_price: Option<f64>,
    /// Stop-loss price.
    pub stop_loss: Option<f64>,
    /// Username of the channel the message came from.
    pub channel_username: String,
    /// Original message text.
    pub message_text: String,
    /// Creation timestamp as sent by the server.
    pub created_at: String,
}

/// Formats accepted for `created_at` besides RFC 3339.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

impl Signal {
    /// Parses `created_at` into a naive timestamp.
    ///
    /// Accepts RFC 3339 (offset is normalised to UTC) and the
    /// `YYYY-MM-DD HH:MM:SS[.ffffff]` form. Returns `None` otherwise.
    #[must_use]
    pub fn created_at_parsed(&self) -> Option<NaiveDateTime> {
        let raw = self.created_at.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.naive_utc());
        }
        NAIVE_TIMESTAMP_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    }

    /// Potential return in percent: `(target - entry) / entry * 100`.
    ///
    /// `None` unless both prices are present and `entry > 0`.
    #[must_use]
    pub fn potential_return_pct(&self) -> Option<f64> {
        let entry = self.entry_price?;
        let target = self.target_price?;
        if entry <= 0.0 {
            return None;
        }
        Some((target - entry) / entry * 100.0)
    }
}

impl From<RawSignal> for Signal {
    fn from(raw: RawSignal) -> Self {
        Self {
            id: raw.id,
            ticker: raw.ticker,
            signal_type: raw.signal_type,
            entry_price: raw.entry_price,
            target_price: raw.target_price,
            stop_loss: raw.stop_loss,
            channel_username: raw.channel_username.unwrap_or_default(),
            message_text: raw.message_text.unwrap_or_default(),
            created_at: raw.created_at.unwrap_or_default(),
        }
    }
}

/// Result of a scrape run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScrapeReport {
    /// Status label (`"success"` on HTTP 200).
    #[serde(default, deserialize_with = "deserialize_null_as_default")]
    pub status: String,
    /// Number of messages stored as signals.
    #[serde(default, deserialize_with = "deserialize_null_as_default")]
    pub parsed_messages: u64,
}

/// Result of pushing a message batch to the parser.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IngestReport {
    /// Messages recognised as signals.
    #[serde(default, deserialize_with = "deserialize_null_as_default")]
    pub parsed_count: u64,
    /// Messages submitted.
    #[serde(default, deserialize_with = "deserialize_null_as_default")]
    pub total_messages: u64,
}

/// Error body returned by the service on non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    /// Parser-style error (`{"error": "..."}`).
    #[serde(default, deserialize_with = "deserialize_empty_string_as_none")]
    pub error: Option<String>,
    /// Scraper-style error (`{"status": "error", "message": "..."}`).
    #[serde(default, deserialize_with = "deserialize_empty_string_as_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Returns the most specific message available.
    pub(crate) fn into_message(self) -> Option<String> {
        self.error.or(self.message)
    }
}
