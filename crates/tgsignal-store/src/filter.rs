//! Case-insensitive substring filters over channel and signal snapshots.

use tgsignal_api::service::{Channel, Signal};

/// Returns the channels whose username or title contains `query`
/// (case-insensitive). An empty query returns every channel in order.
#[must_use]
pub fn filter_channels<'a>(channels: &'a [Channel], query: &str) -> Vec<&'a Channel> {
    if query.is_empty() {
        return channels.iter().collect();
    }
    let needle = query.to_lowercase();
    channels
        .iter()
        .filter(|c| {
            c.channel_username.to_lowercase().contains(&needle)
                || c.channel_title.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Returns the signals whose ticker, channel username or message text
/// contains `query` (case-insensitive). An empty query returns every signal
/// in order.
#[must_use]
pub fn filter_signals<'a>(signals: &'a [Signal], query: &str) -> Vec<&'a Signal> {
    if query.is_empty() {
        return signals.iter().collect();
    }
    let needle = query.to_lowercase();
    signals
        .iter()
        .filter(|s| {
            s.ticker
                .as_ref()
                .is_some_and(|t| t.to_lowercase().contains(&needle))
                || s.channel_username.to_lowercase().contains(&needle)
                || s.message_text.to_lowercase().contains(&needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;
    use crate::mock::{make_channel, make_signal};

    fn channels() -> Vec<Channel> {
        vec![
            make_channel(1, "invest_ru", "Invest RU", true),
            make_channel(2, "crypto_calls", "Crypto Calls", false),
            make_channel(3, "startup_money", "Money Talks", true),
        ]
    }

    #[test]
    fn test_empty_query_returns_all_in_order() {
        // Arrange
        let list = channels();

        // Act
        let result = filter_channels(&list, "");

        // Assert
        let ids: Vec<i64> = result.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_matches_username_case_insensitive() {
        // Arrange
        let list = channels();

        // Act
        let result = filter_channels(&list, "CRYPTO");

        // Assert
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 2);
    }

    #[test]
    fn test_matches_title_only() {
        // Arrange
        let list = channels();

        // Act
        let result = filter_channels(&list, "talks");

        // Assert
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].channel_username, "startup_money");
    }

    #[test]
    fn test_match_keeps_original_order() {
        // Arrange
        let list = channels();

        // Act
        let result = filter_channels(&list, "_");

        // Assert
        let ids: Vec<i64> = result.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_no_match_is_empty() {
        // Arrange
        let list = channels();

        // Act & Assert
        assert!(filter_channels(&list, "nothing here").is_empty());
    }

    #[test]
    fn test_filter_signals_over_three_fields() {
        // Arrange
        let mut by_text = make_signal(3, None, "2024-11-01 10:00:00");
        by_text.message_text = String::from("Watching sber closely");
        let signals = vec![
            make_signal(1, Some("SBER"), "2024-11-01 12:00:00"),
            make_signal(2, Some("GAZP"), "2024-11-01 11:00:00"),
            by_text,
        ];

        // Act
        let by_ticker = filter_signals(&signals, "sber");
        let by_channel = filter_signals(&signals, "ALPHA");

        // Assert
        let ids: Vec<i64> = by_ticker.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(by_channel.len(), 3);
        assert_eq!(filter_signals(&signals, "").len(), 3);
    }
}
