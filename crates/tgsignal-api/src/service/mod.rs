//! Channel/signal service client module.
//!
//! Handles JSON requests to the channel, signal and scrape endpoints and
//! validates every response against a fixed schema with explicit defaults.

mod api;
mod client;
mod error;
pub(crate) mod json;
mod params;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalSignalService, SignalService};
#[allow(clippy::module_name_repetitions)]
pub use client::{SignalServiceClient, SignalServiceClientBuilder};
#[allow(clippy::module_name_repetitions)]
pub use error::ServiceError;
pub use params::{MessageBatch, NewChannel, RawMessage, SignalQuery};
pub use types::{Channel, IngestReport, ScrapeReport, Signal, SignalType};
