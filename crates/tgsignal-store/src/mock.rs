//! In-memory `LocalSignalService` used by the store tests.
#![allow(clippy::unwrap_used)]
#![allow(clippy::arithmetic_side_effects)]

use std::sync::Mutex;

use anyhow::Result;
use tgsignal_api::service::{
    Channel, IngestReport, LocalSignalService, MessageBatch, NewChannel, ScrapeReport,
    ServiceError, Signal, SignalQuery, SignalType,
};

/// Builds a channel.
pub fn make_channel(id: i64, username: &str, title: &str, is_active: bool) -> Channel {
    Channel {
        id,
        channel_username: String::from(username),
        channel_title: String::from(title),
        is_active,
        last_message_id: 0,
    }
}

/// Builds a signal from channel `alpha`.
pub fn make_signal(id: i64, ticker: Option<&str>, created_at: &str) -> Signal {
    Signal {
        id,
        ticker: ticker.map(String::from),
        signal_type: SignalType::Buy,
        entry_price: None,
        target_price: None,
        stop_loss: None,
        channel_username: String::from("alpha"),
        message_text: String::new(),
        created_at: String::from(created_at),
    }
}

/// A service that keeps server state in memory and records every call.
#[derive(Default)]
pub struct MockService {
    /// Server-side channel list.
    pub channels: Mutex<Vec<Channel>>,
    /// Server-side signal list.
    pub signals: Mutex<Vec<Signal>>,
    /// When set, every call fails with this error.
    pub failure: Mutex<Option<ServiceError>>,
    /// When set, only `delete_signal` fails with this error.
    pub delete_failure: Option<ServiceError>,
    /// Report returned by `trigger_scrape`.
    pub scrape_report: Option<ScrapeReport>,
    /// Call log: operation name and argument summary.
    pub calls: Mutex<Vec<String>>,
    /// Bodies received by `create_channel`.
    pub created: Mutex<Vec<NewChannel>>,
}

impl MockService {
    pub fn with_state(channels: Vec<Channel>, signals: Vec<Signal>) -> Self {
        Self {
            channels: Mutex::new(channels),
            signals: Mutex::new(signals),
            ..Self::default()
        }
    }

    pub fn fail_all(&self, err: ServiceError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) -> Result<()> {
        self.calls.lock().unwrap().push(call.into());
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}

impl LocalSignalService for MockService {
    async fn list_channels(&self) -> Result<Vec<Channel>> {
        self.record("list_channels")?;
        Ok(self.channels.lock().unwrap().clone())
    }

    async fn create_channel(&self, channel: &NewChannel) -> Result<Option<Channel>> {
        self.record(format!("create_channel {}", channel.channel_username))?;
        self.created.lock().unwrap().push(channel.clone());
        let mut channels = self.channels.lock().unwrap();
        let id = channels.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let created = make_channel(id, &channel.channel_username, &channel.channel_title, true);
        channels.push(created.clone());
        Ok(Some(created))
    }

    async fn list_signals(&self, _query: &SignalQuery) -> Result<Vec<Signal>> {
        self.record("list_signals")?;
        Ok(self.signals.lock().unwrap().clone())
    }

    async fn delete_signal(&self, id: i64) -> Result<()> {
        self.record(format!("delete_signal {id}"))?;
        if let Some(err) = self.delete_failure.clone() {
            return Err(err.into());
        }
        self.signals.lock().unwrap().retain(|s| s.id != id);
        Ok(())
    }

    async fn ingest_messages(&self, batch: &MessageBatch) -> Result<IngestReport> {
        self.record(format!("ingest_messages {}", batch.channel_username))?;
        Ok(IngestReport {
            parsed_count: 1,
            total_messages: u64::try_from(batch.messages.len()).unwrap(),
        })
    }

    async fn trigger_scrape(&self) -> Result<ScrapeReport> {
        self.record("trigger_scrape")?;
        Ok(self.scrape_report.clone().unwrap_or(ScrapeReport {
            status: String::from("success"),
            parsed_messages: 0,
        }))
    }
}
