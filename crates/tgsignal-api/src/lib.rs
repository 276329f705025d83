//! API client library for tgsignal.
//!
//! Provides a client for the remote channel/signal service that stores
//! monitored channels, the signals scraped from them, and the scrape trigger.

/// Channel/signal service client.
pub mod service;
