//! Channel snapshot with optimistic local edits.

use std::collections::BTreeSet;

use tgsignal_api::service::Channel;

/// Normalizes user input into a channel handle.
///
/// Trims whitespace and strips one leading `@`. Returns `None` when nothing
/// is left.
#[must_use]
pub fn normalize_handle(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let handle = trimmed.strip_prefix('@').unwrap_or(trimmed).trim();
    if handle.is_empty() {
        None
    } else {
        Some(String::from(handle))
    }
}

/// Local channel list.
///
/// Toggles and deletes only touch this snapshot. The ids they touch are kept
/// until the next [`ChannelStore::replace`], which discards them in favour of
/// the server's list.
#[derive(Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct ChannelStore {
    channels: Vec<Channel>,
    unsynced: BTreeSet<i64>,
    loading: bool,
}

impl ChannelStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the channels in server order.
    #[must_use]
    pub fn all(&self) -> &[Channel] {
        &self.channels
    }

    /// Returns the channels the scraper visits.
    pub fn active(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter().filter(|c| c.is_active)
    }

    /// Finds a channel by ID.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }

    /// Replaces the snapshot with a fresh server list.
    ///
    /// Local edits made since the last replace are discarded with a warning.
    pub fn replace(&mut self, channels: Vec<Channel>) {
        if !self.unsynced.is_empty() {
            tracing::warn!(
                discarded = self.unsynced.len(),
                "Discarding unsynced local channel edits"
            );
            self.unsynced.clear();
        }
        self.channels = channels;
    }

    /// Flips `is_active` locally. Returns the previous value.
    pub fn toggle(&mut self, id: i64) -> Option<bool> {
        let channel = self.channels.iter_mut().find(|c| c.id == id)?;
        let was_active = channel.is_active;
        channel.is_active = !was_active;
        self.unsynced.insert(id);
        Some(was_active)
    }

    /// Removes a channel from the local list. Returns the removed channel.
    pub fn remove(&mut self, id: i64) -> Option<Channel> {
        let pos = self.channels.iter().position(|c| c.id == id)?;
        self.unsynced.insert(id);
        Some(self.channels.remove(pos))
    }

    /// Returns `true` if any local edit has not been reconciled.
    #[must_use]
    pub fn has_unsynced_changes(&self) -> bool {
        !self.unsynced.is_empty()
    }

    /// Returns `true` if the channel has an unreconciled local edit.
    #[must_use]
    pub fn is_unsynced(&self, id: i64) -> bool {
        self.unsynced.contains(&id)
    }

    /// Number of channels with unreconciled local edits.
    #[must_use]
    pub fn unsynced_count(&self) -> usize {
        self.unsynced.len()
    }

    /// Returns `true` while a create request is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    pub(crate) const fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}
