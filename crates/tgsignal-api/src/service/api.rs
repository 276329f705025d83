//! `SignalService` trait definition.
#![allow(clippy::future_not_send)]

use anyhow::Result;

use super::params::{MessageBatch, NewChannel, SignalQuery};
use super::types::{Channel, IngestReport, ScrapeReport, Signal};

/// Channel/signal service trait.
///
/// Abstracts service operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(SignalService: Send)]
pub trait LocalSignalService {
    /// Lists all monitored channels.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the status is not 2xx,
    /// or the body does not match the schema.
    async fn list_channels(&self) -> Result<Vec<Channel>>;

    /// Creates (or re-activates) a channel.
    ///
    /// Returns the channel echoed by the service, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the status is not 2xx.
    async fn create_channel(&self, channel: &NewChannel) -> Result<Option<Channel>>;

    /// Lists signals, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the status is not 2xx,
    /// or the body does not match the schema.
    async fn list_signals(&self, query: &SignalQuery) -> Result<Vec<Signal>>;

    /// Deletes a signal by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the status is not 2xx.
    async fn delete_signal(&self, id: i64) -> Result<()>;

    /// Submits raw channel messages to the parser.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the status is not 2xx,
    /// or the body does not match the schema.
    async fn ingest_messages(&self, batch: &MessageBatch) -> Result<IngestReport>;

    /// Starts a scrape run over all active channels and waits for it.
    ///
    /// # Errors
    ///
    /// Returns an error if no scrape endpoint is configured, the HTTP request
    /// fails, or the status is not 2xx.
    async fn trigger_scrape(&self) -> Result<ScrapeReport>;
}
