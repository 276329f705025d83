//! Signal snapshot.

use std::cmp::Reverse;

use tgsignal_api::service::Signal;

/// Local signal list in server order.
#[derive(Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct SignalStore {
    signals: Vec<Signal>,
}

impl SignalStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every signal in server order.
    #[must_use]
    pub fn all(&self) -> &[Signal] {
        &self.signals
    }

    /// Replaces the snapshot.
    pub fn replace(&mut self, signals: Vec<Signal>) {
        self.signals = signals;
    }

    /// Removes a signal by ID. Returns `true` if it was present.
    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.signals.len();
        self.signals.retain(|s| s.id != id);
        self.signals.len() != before
    }

    /// Returns the `n` most recent signals.
    ///
    /// Ordered by parsed `created_at`, newest first. Signals whose timestamp
    /// does not parse follow in server order.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<&Signal> {
        let mut sorted: Vec<&Signal> = self.signals.iter().collect();
        sorted.sort_by_cached_key(|s| {
            let parsed = s.created_at_parsed();
            (parsed.is_none(), Reverse(parsed))
        });
        sorted.truncate(n);
        sorted
    }
}
