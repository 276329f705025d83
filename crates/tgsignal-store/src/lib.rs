//! Client state store for tgsignal.
//!
//! Holds in-memory snapshots of the monitored channels and their signals,
//! refreshed by a full re-fetch after every mutation, plus the pure helpers
//! the views use on top of them (filtering, analytics, export).

/// Dashboard summary and return statistics.
pub mod analytics;
/// Channel snapshot and unsynced local edits.
pub mod channels;
/// CSV/JSON signal export.
pub mod export;
/// Case-insensitive substring filters.
pub mod filter;
/// Bounded notification queue.
pub mod notify;
/// Requests that complete while the caller keeps running.
pub mod request;
/// Signal snapshot.
pub mod signals;
mod store;

#[cfg(test)]
mod mock;

pub use analytics::{ReturnBucket, Summary};
pub use channels::{ChannelStore, normalize_handle};
pub use export::{ExportFormat, ExportRecord};
pub use filter::{filter_channels, filter_signals};
pub use notify::{Level, Notification, Notifier};
pub use request::{Completion, PendingRequest, Request, Started};
pub use signals::SignalStore;
pub use store::{AddChannelOutcome, Store};
