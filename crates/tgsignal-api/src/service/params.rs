//! Request parameter and body types.

use serde::Serialize;

/// Body for `POST <channels>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewChannel {
    /// Handle without the leading `@`.
    pub channel_username: String,
    /// Display name.
    pub channel_title: String,
}

impl NewChannel {
    /// Creates a request that uses the handle as both username and title.
    pub fn from_handle(handle: impl Into<String>) -> Self {
        let channel_username = handle.into();
        Self {
            channel_title: channel_username.clone(),
            channel_username,
        }
    }
}

/// Query parameters for `GET <signals>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalQuery {
    /// Maximum number of signals (server default: 100).
    pub limit: Option<u32>,
    /// Ticker substring (case-insensitive on the server).
    pub ticker: Option<String>,
    /// Exact channel username.
    pub channel: Option<String>,
}

impl SignalQuery {
    /// Creates an empty query (server defaults).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the result limit.
    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the ticker filter.
    #[must_use]
    pub fn ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = Some(ticker.into());
        self
    }

    /// Sets the channel filter. A leading `@` is stripped.
    #[must_use]
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        let channel: String = channel.into();
        self.channel = Some(String::from(channel.trim().trim_start_matches('@')));
        self
    }

    /// Builds the query-string pairs. Empty filters are omitted.
    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(ticker) = self.ticker.as_deref().filter(|t| !t.is_empty()) {
            query.push(("ticker", String::from(ticker)));
        }
        if let Some(channel) = self.channel.as_deref().filter(|c| !c.is_empty()) {
            query.push(("channel", String::from(channel)));
        }
        query
    }
}

/// A raw channel message submitted for parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct RawMessage {
    /// Message ID within the channel.
    pub id: i64,
    /// Message text.
    #[serde(default)]
    pub text: String,
    /// Message date (ISO-8601).
    #[serde(default)]
    pub date: Option<String>,
}

/// Body for `PUT <signals>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageBatch {
    /// Channel the messages came from (without `@`).
    pub channel_username: String,
    /// Messages in channel order.
    pub messages: Vec<RawMessage>,
}
