//! Bounded notification queue.

use std::collections::VecDeque;

use tgsignal_api::service::ServiceError;

/// Maximum number of queued notifications.
pub const CAPACITY: usize = 32;

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Neutral information (e.g. a local toggle).
    Info,
    /// A server-side action succeeded.
    Success,
    /// An action failed.
    Error,
}

/// A user-facing message produced by a store action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity.
    pub level: Level,
    /// Message text.
    pub message: String,
}

/// FIFO of notifications. The oldest entry is dropped when full.
#[derive(Debug, Default)]
pub struct Notifier {
    queue: VecDeque<Notification>,
}

impl Notifier {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a notification.
    pub fn push(&mut self, level: Level, message: impl Into<String>) {
        if self.queue.len() >= CAPACITY {
            self.queue.pop_front();
        }
        self.queue.push_back(Notification {
            level,
            message: message.into(),
        });
    }

    /// Appends an `Info` notification.
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Level::Info, message);
    }

    /// Appends a `Success` notification.
    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Level::Success, message);
    }

    /// Appends an `Error` notification.
    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Level::Error, message);
    }

    /// Appends an `Error` notification describing a failed action.
    pub fn failure(&mut self, action: &str, err: &anyhow::Error) {
        self.error(failure_message(action, err));
    }

    /// Returns the newest notification.
    #[must_use]
    pub fn latest(&self) -> Option<&Notification> {
        self.queue.back()
    }

    /// Iterates from oldest to newest.
    pub fn history(&self) -> impl Iterator<Item = &Notification> {
        self.queue.iter()
    }

    /// Removes and returns all notifications, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = Notification> + '_ {
        self.queue.drain(..)
    }

    /// Number of queued notifications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Builds the message shown for a failed action.
///
/// Transport failures collapse to a generic "could not connect" message.
#[must_use]
pub fn failure_message(action: &str, err: &anyhow::Error) -> String {
    match ServiceError::classify(err) {
        Some(ServiceError::Transport { .. }) => String::from("Could not connect to the service"),
        Some(ServiceError::Status {
            status,
            message: Some(message),
            ..
        }) => format!("{action} failed (HTTP {status}): {message}"),
        Some(ServiceError::Status {
            status,
            message: None,
            ..
        }) => format!("{action} failed (HTTP {status})"),
        Some(ServiceError::Decode { .. }) => {
            format!("{action} failed: unexpected response from the service")
        }
        None => format!("{action} failed: {err:#}"),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_push_and_latest() {
        // Arrange
        let mut notifier = Notifier::new();

        // Act
        notifier.info("first");
        notifier.error("second");

        // Assert
        assert_eq!(notifier.len(), 2);
        let latest = notifier.latest().unwrap();
        assert_eq!(latest.level, Level::Error);
        assert_eq!(latest.message, "second");
    }

    #[test]
    fn test_oldest_dropped_when_full() {
        // Arrange
        let mut notifier = Notifier::new();

        // Act
        for i in 0..=CAPACITY {
            notifier.info(format!("n{i}"));
        }

        // Assert
        assert_eq!(notifier.len(), CAPACITY);
        assert_eq!(notifier.history().next().unwrap().message, "n1");
        assert_eq!(
            notifier.latest().unwrap().message,
            format!("n{CAPACITY}")
        );
    }

    #[test]
    fn test_drain_empties_queue() {
        // Arrange
        let mut notifier = Notifier::new();
        notifier.success("done");

        // Act
        let drained: Vec<Notification> = notifier.drain().collect();

        // Assert
        assert_eq!(drained.len(), 1);
        assert!(notifier.is_empty());
    }

    #[test]
    fn test_failure_message_transport_is_generic() {
        // Arrange
        let err = anyhow::Error::new(ServiceError::Transport {
            operation: "create_channel",
        });

        // Act & Assert
        assert_eq!(
            failure_message("Add channel", &err),
            "Could not connect to the service"
        );
    }

    #[test]
    fn test_failure_message_status_with_server_text() {
        // Arrange
        let err = anyhow::Error::new(ServiceError::Status {
            operation: "create_channel",
            status: 400,
            message: Some(String::from("channel_username required")),
        });

        // Act & Assert
        assert_eq!(
            failure_message("Add channel", &err),
            "Add channel failed (HTTP 400): channel_username required"
        );
    }

    #[test]
    fn test_failure_message_unclassified() {
        // Arrange
        let err = anyhow::anyhow!("scrape endpoint is not configured");

        // Act & Assert
        assert_eq!(
            failure_message("Scrape", &err),
            "Scrape failed: scrape endpoint is not configured"
        );
    }
}
