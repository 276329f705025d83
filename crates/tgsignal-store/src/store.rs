//! `Store` - client state backed by the channel/signal service.
#![allow(clippy::future_not_send)]

use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use tgsignal_api::service::{
    Channel, IngestReport, LocalSignalService, MessageBatch, NewChannel, RawMessage, ScrapeReport,
    ServiceError, Signal, SignalQuery,
};
use tracing::instrument;

use crate::analytics::Summary;
use crate::channels::{ChannelStore, normalize_handle};
use crate::export::{ExportFormat, ExportRecord, export_to_dir};
use crate::filter::filter_signals;
use crate::notify::Notifier;
use crate::request::{Completion, PendingRequest, Request, Started};
use crate::signals::SignalStore;

/// Result of an add-channel request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddChannelOutcome {
    /// The input was empty after trimming. No request was sent.
    Rejected,
    /// A create request is already in flight.
    Busy,
    /// The channel was created and the list reloaded.
    Created(String),
}

/// Channel and signal snapshots plus the service they come from.
///
/// Every server mutation is followed by a full re-fetch. Local-only edits
/// (toggle, channel delete) are tracked by [`ChannelStore`] until the next
/// reload.
///
/// The async methods run one action to the end. [`Store::begin`] and
/// [`Store::complete`] split the same actions around the service call so a
/// UI can keep drawing while requests are in flight.
#[derive(Debug)]
pub struct Store<S> {
    service: Rc<S>,
    channels: ChannelStore,
    signals: SignalStore,
    notifier: Notifier,
    last_scrape: Option<ScrapeReport>,
    exports: Vec<ExportRecord>,
}

impl<S: LocalSignalService> Store<S> {
    /// Creates an empty store. Call [`Store::hydrate`] to load data.
    #[must_use]
    pub fn new(service: S) -> Self {
        Self {
            service: Rc::new(service),
            channels: ChannelStore::new(),
            signals: SignalStore::new(),
            notifier: Notifier::new(),
            last_scrape: None,
            exports: Vec::new(),
        }
    }

    /// Service the store reads from.
    #[must_use]
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Channel snapshot.
    #[must_use]
    pub const fn channels(&self) -> &ChannelStore {
        &self.channels
    }

    /// Signal snapshot.
    #[must_use]
    pub const fn signals(&self) -> &SignalStore {
        &self.signals
    }

    /// Notification queue.
    #[must_use]
    pub const fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Mutable notification queue.
    pub const fn notifier_mut(&mut self) -> &mut Notifier {
        &mut self.notifier
    }

    /// Report of the last scrape run in this session.
    #[must_use]
    pub const fn last_scrape(&self) -> Option<&ScrapeReport> {
        self.last_scrape.as_ref()
    }

    /// Exports written in this session, oldest first.
    #[must_use]
    pub fn exports(&self) -> &[ExportRecord] {
        &self.exports
    }

    /// Dashboard summary of the current snapshots.
    #[must_use]
    pub fn summary(&self) -> Summary {
        Summary::compute(self.channels.all(), self.signals.all())
    }

    /// Loads both channels and signals.
    ///
    /// Both loads are attempted even if the first fails.
    ///
    /// # Errors
    ///
    /// Returns the first load error.
    #[instrument(skip_all)]
    pub async fn hydrate(&mut self) -> Result<()> {
        let channels = self.reload_channels().await;
        let signals = self.reload_signals().await;
        channels.and(signals)
    }

    /// Replaces the channel snapshot with the server's list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails. The snapshot is left untouched.
    #[instrument(skip_all)]
    pub async fn reload_channels(&mut self) -> Result<()> {
        let result = self.service.list_channels().await;
        self.commit_channels(result)
    }

    /// Replaces the signal snapshot with the server's list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails. The snapshot is left untouched.
    #[instrument(skip_all)]
    pub async fn reload_signals(&mut self) -> Result<()> {
        let result = self.service.list_signals(&SignalQuery::new()).await;
        self.commit_signals(result)
    }

    /// Creates a channel from user input, then reloads the channel list.
    ///
    /// Empty input is rejected without a request. A leading `@` is stripped
    /// and the handle is used as both username and title.
    ///
    /// # Errors
    ///
    /// Returns an error if the create request or the reload fails. A failed
    /// create leaves the snapshot untouched.
    #[instrument(skip_all)]
    pub async fn add_channel(&mut self, input: &str) -> Result<AddChannelOutcome> {
        let handle = match self.start_add(input) {
            Ok(handle) => handle,
            Err(outcome) => return Ok(outcome),
        };
        let result = self
            .service
            .create_channel(&NewChannel::from_handle(handle.clone()))
            .await;
        self.commit_create(&handle, result)?;
        self.reload_channels().await?;
        Ok(AddChannelOutcome::Created(handle))
    }

    /// Flips a channel's `is_active` locally. No request is sent.
    ///
    /// Returns the new state, or `None` if the channel is not in the list.
    pub fn toggle_channel(&mut self, id: i64) -> Option<bool> {
        let was_active = self.channels.toggle(id)?;
        let handle = self.channels.get(id).map(Channel::handle).unwrap_or_default();
        let label = if was_active { "Active" } else { "Stopped" };
        self.notifier.info(format!("{handle}: was {label}"));
        Some(!was_active)
    }

    /// Removes a channel from the local list only.
    ///
    /// Returns `true` if the channel was present.
    pub fn remove_channel(&mut self, id: i64) -> bool {
        let Some(channel) = self.channels.remove(id) else {
            return false;
        };
        self.notifier
            .info(format!("{} removed from the list", channel.handle()));
        true
    }

    /// Deletes a signal: drops it locally, sends the delete, then reloads.
    ///
    /// The confirmation is shown whatever status the server returns. A
    /// transport failure shows "could not connect" and skips the reload.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or if the reload fails.
    #[instrument(skip_all, fields(id))]
    pub async fn delete_signal(&mut self, id: i64) -> Result<()> {
        self.signals.remove(id);
        let result = self.service.delete_signal(id).await;
        self.commit_delete(id, result)?;
        self.reload_signals().await
    }

    /// Runs a scrape over all active channels, then reloads everything.
    ///
    /// # Errors
    ///
    /// Returns an error if the scrape or a reload fails.
    #[instrument(skip_all)]
    pub async fn trigger_scrape(&mut self) -> Result<ScrapeReport> {
        let result = self.service.trigger_scrape().await;
        let report = self.commit_scrape(result)?;
        self.hydrate().await?;
        Ok(report)
    }

    /// Submits raw messages from one channel to the parser.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip_all, fields(channel))]
    pub async fn ingest_messages(
        &mut self,
        channel: &str,
        messages: Vec<RawMessage>,
    ) -> Result<IngestReport> {
        let channel = normalize_handle(channel).context("channel handle is empty")?;
        let batch = MessageBatch {
            channel_username: channel.clone(),
            messages,
        };
        match self.service.ingest_messages(&batch).await {
            Ok(report) => {
                self.notifier.success(format!(
                    "@{channel}: {} of {} message(s) parsed as signals",
                    report.parsed_count, report.total_messages
                ));
                Ok(report)
            }
            Err(e) => {
                self.notifier.failure("Ingest", &e);
                Err(e.context(format!("failed to ingest messages for @{channel}")))
            }
        }
    }

    /// Writes the signals matching `query` to a timestamped file in `dir`
    /// and records it in the session history.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn export_signals(
        &mut self,
        format: ExportFormat,
        dir: &Path,
        query: &str,
    ) -> Result<ExportRecord> {
        let selected = filter_signals(self.signals.all(), query);
        match export_to_dir(format, &selected, dir) {
            Ok(record) => {
                self.notifier.success(format!(
                    "Exported {} signal(s) to {}",
                    record.records,
                    record.path.display()
                ));
                self.exports.push(record.clone());
                Ok(record)
            }
            Err(e) => {
                self.notifier.error(format!("{} export failed: {e:#}", format.label()));
                Err(e)
            }
        }
    }

    fn commit_channels(&mut self, result: Result<Vec<Channel>>) -> Result<()> {
        match result {
            Ok(channels) => {
                tracing::debug!(count = channels.len(), "Loaded channels");
                self.channels.replace(channels);
                Ok(())
            }
            Err(e) => {
                self.notifier.failure("Loading channels", &e);
                Err(e.context("failed to load channels"))
            }
        }
    }

    fn commit_signals(&mut self, result: Result<Vec<Signal>>) -> Result<()> {
        match result {
            Ok(signals) => {
                tracing::debug!(count = signals.len(), "Loaded signals");
                self.signals.replace(signals);
                Ok(())
            }
            Err(e) => {
                self.notifier.failure("Loading signals", &e);
                Err(e.context("failed to load signals"))
            }
        }
    }

    /// Validates add input and raises the loading flag. `Err` carries the
    /// outcome when no request should be sent.
    fn start_add(&mut self, input: &str) -> Result<String, AddChannelOutcome> {
        let Some(handle) = normalize_handle(input) else {
            return Err(AddChannelOutcome::Rejected);
        };
        if self.channels.is_loading() {
            return Err(AddChannelOutcome::Busy);
        }
        self.channels.set_loading(true);
        Ok(handle)
    }

    fn commit_create(&mut self, handle: &str, result: Result<Option<Channel>>) -> Result<()> {
        self.channels.set_loading(false);
        if let Err(e) = result {
            self.notifier.failure("Adding channel", &e);
            return Err(e.context(format!("failed to add channel @{handle}")));
        }
        tracing::info!(channel = %handle, "Channel added");
        self.notifier.success(format!("@{handle} added"));
        Ok(())
    }

    fn commit_delete(&mut self, id: i64, result: Result<()>) -> Result<()> {
        if let Err(e) = result {
            if let Some(ServiceError::Status { status, .. }) = ServiceError::classify(&e) {
                tracing::warn!(id, status, "Delete returned an error status");
            } else {
                self.notifier.failure("Deleting signal", &e);
                return Err(e.context(format!("failed to delete signal {id}")));
            }
        }
        self.notifier.success(format!("Signal #{id} deleted"));
        Ok(())
    }

    fn commit_scrape(&mut self, result: Result<ScrapeReport>) -> Result<ScrapeReport> {
        let report = match result {
            Ok(report) => report,
            Err(e) => {
                self.notifier.failure("Scrape", &e);
                return Err(e.context("scrape failed"));
            }
        };
        tracing::info!(
            status = %report.status,
            parsed = report.parsed_messages,
            "Scrape finished"
        );
        self.notifier.success(format!(
            "Scrape finished: {} new signal(s)",
            report.parsed_messages
        ));
        self.last_scrape = Some(report.clone());
        Ok(report)
    }
}

impl<S: LocalSignalService + 'static> Store<S> {
    /// Starts a request without waiting for the service.
    ///
    /// Local effects happen now: a deleted signal leaves the snapshot and an
    /// add raises the loading flag, so a second add returns
    /// [`Started::Busy`] until the first completes.
    pub fn begin(&mut self, request: Request) -> Started {
        let service = Rc::clone(&self.service);
        match request {
            Request::Reload => Started::Pending(reload_all(service)),
            Request::AddChannel(input) => match self.start_add(&input) {
                Ok(handle) => Started::Pending(PendingRequest::new("Adding channel", async move {
                    let result = service
                        .create_channel(&NewChannel::from_handle(handle.clone()))
                        .await;
                    Completion::ChannelCreated { handle, result }
                })),
                Err(AddChannelOutcome::Busy) => Started::Busy,
                Err(_) => Started::Rejected,
            },
            Request::DeleteSignal(id) => {
                self.signals.remove(id);
                Started::Pending(PendingRequest::new("Deleting signal", async move {
                    let result = service.delete_signal(id).await;
                    Completion::SignalDeleted { id, result }
                }))
            }
            Request::Scrape => Started::Pending(PendingRequest::new("Scraping", async move {
                Completion::Scraped(service.trigger_scrape().await)
            })),
        }
    }

    /// Applies a finished request. Returns the follow-up reload, if any.
    ///
    /// Failures are queued as notifications and logged.
    pub fn complete(&mut self, completion: Completion) -> Option<PendingRequest> {
        let service = Rc::clone(&self.service);
        let next = match completion {
            Completion::Reloaded { channels, signals } => {
                let channels = self.commit_channels(channels);
                let signals = self.commit_signals(signals);
                channels.and(signals).map(|()| None)
            }
            Completion::ChannelsReloaded(result) => self.commit_channels(result).map(|()| None),
            Completion::SignalsReloaded(result) => self.commit_signals(result).map(|()| None),
            Completion::ChannelCreated { handle, result } => self
                .commit_create(&handle, result)
                .map(|()| Some(reload_channels(service))),
            Completion::SignalDeleted { id, result } => self
                .commit_delete(id, result)
                .map(|()| Some(reload_signals(service))),
            Completion::Scraped(result) => self
                .commit_scrape(result)
                .map(|_| Some(reload_all(service))),
        };
        next.unwrap_or_else(|e| {
            tracing::warn!("{e:#}");
            None
        })
    }
}

fn reload_all<S: LocalSignalService + 'static>(service: Rc<S>) -> PendingRequest {
    PendingRequest::new("Loading", async move {
        let channels = service.list_channels().await;
        let signals = service.list_signals(&SignalQuery::new()).await;
        Completion::Reloaded { channels, signals }
    })
}

fn reload_channels<S: LocalSignalService + 'static>(service: Rc<S>) -> PendingRequest {
    PendingRequest::new("Loading channels", async move {
        Completion::ChannelsReloaded(service.list_channels().await)
    })
}

fn reload_signals<S: LocalSignalService + 'static>(service: Rc<S>) -> PendingRequest {
    PendingRequest::new("Loading signals", async move {
        Completion::SignalsReloaded(service.list_signals(&SignalQuery::new()).await)
    })
}
