//! Service requests that run while the caller keeps handling input.
//!
//! [`Store::begin`](crate::Store::begin) applies the immediate local effect
//! of a [`Request`] and hands back a [`PendingRequest`]. The future owns its
//! handle to the service, so the store stays free for reads and local edits
//! until the caller resolves it and passes the [`Completion`] to
//! [`Store::complete`](crate::Store::complete).

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use anyhow::Result;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use tgsignal_api::service::{Channel, ScrapeReport, Signal};

/// A store action that needs the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Reload channels and signals.
    Reload,
    /// Create a channel from raw user input.
    AddChannel(String),
    /// Delete a signal on the server.
    DeleteSignal(i64),
    /// Run a scrape over the active channels.
    Scrape,
}

/// What the service returned for one request.
#[derive(Debug)]
pub enum Completion {
    /// Both lists were fetched.
    Reloaded {
        /// Channel list result.
        channels: Result<Vec<Channel>>,
        /// Signal list result.
        signals: Result<Vec<Signal>>,
    },
    /// Only the channel list was fetched.
    ChannelsReloaded(Result<Vec<Channel>>),
    /// Only the signal list was fetched.
    SignalsReloaded(Result<Vec<Signal>>),
    /// A create request finished.
    ChannelCreated {
        /// Normalized handle that was submitted.
        handle: String,
        /// Create result.
        result: Result<Option<Channel>>,
    },
    /// A delete request finished.
    SignalDeleted {
        /// Signal ID.
        id: i64,
        /// Delete result.
        result: Result<()>,
    },
    /// A scrape finished.
    Scraped(Result<ScrapeReport>),
}

/// An in-flight service request.
pub struct PendingRequest {
    label: &'static str,
    future: LocalBoxFuture<'static, Completion>,
}

impl PendingRequest {
    pub(crate) fn new(label: &'static str, future: impl Future<Output = Completion> + 'static) -> Self {
        Self {
            label,
            future: future.boxed_local(),
        }
    }

    /// Short description for status lines, e.g. "Adding channel".
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl Future for PendingRequest {
    type Output = Completion;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Completion> {
        self.future.poll_unpin(cx)
    }
}

/// Result of [`Store::begin`](crate::Store::begin).
#[derive(Debug)]
pub enum Started {
    /// The request is in flight.
    Pending(PendingRequest),
    /// The add-channel input was empty. No request was sent.
    Rejected,
    /// A create request is already in flight.
    Busy,
}
