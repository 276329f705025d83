//! Dashboard summary computed from the current snapshots.

use std::collections::HashMap;

use tgsignal_api::service::{Channel, Signal, SignalType};

/// Potential-return histogram bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnBucket {
    /// Below 0%.
    Negative,
    /// `[0, 10)`.
    UpTo10,
    /// `[10, 25)`.
    UpTo25,
    /// `[25, 50)`.
    UpTo50,
    /// `[50, 100]`.
    UpTo100,
    /// Above 100%.
    Above100,
}

impl ReturnBucket {
    /// All buckets in display order.
    pub const ALL: [Self; 6] = [
        Self::Negative,
        Self::UpTo10,
        Self::UpTo25,
        Self::UpTo50,
        Self::UpTo100,
        Self::Above100,
    ];

    /// Picks the bucket for a return in percent.
    #[must_use]
    pub fn of(pct: f64) -> Self {
        if pct < 0.0 {
            Self::Negative
        } else if pct < 10.0 {
            Self::UpTo10
        } else if pct < 25.0 {
            Self::UpTo25
        } else if pct < 50.0 {
            Self::UpTo50
        } else if pct <= 100.0 {
            Self::UpTo100
        } else {
            Self::Above100
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Negative => "<0%",
            Self::UpTo10 => "0-10%",
            Self::UpTo25 => "10-25%",
            Self::UpTo50 => "25-50%",
            Self::UpTo100 => "50-100%",
            Self::Above100 => ">100%",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Negative => 0,
            Self::UpTo10 => 1,
            Self::UpTo25 => 2,
            Self::UpTo50 => 3,
            Self::UpTo100 => 4,
            Self::Above100 => 5,
        }
    }
}

/// Signal counts by direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeCounts {
    /// `BUY` signals.
    pub buy: usize,
    /// `SELL` signals.
    pub sell: usize,
    /// Any other label.
    pub other: usize,
    /// No label.
    pub unknown: usize,
}

/// Potential-return statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReturnStats {
    /// Signals with both prices and a positive entry.
    pub count: usize,
    /// Mean potential return in percent.
    pub mean: Option<f64>,
    /// Histogram counts, indexed like [`ReturnBucket::ALL`].
    buckets: [usize; 6],
}

impl ReturnStats {
    /// Count for one bucket.
    #[must_use]
    pub fn bucket(&self, bucket: ReturnBucket) -> usize {
        self.buckets.get(bucket.index()).copied().unwrap_or(0)
    }

    /// `(bucket, count)` pairs in display order.
    pub fn histogram(&self) -> impl Iterator<Item = (ReturnBucket, usize)> + '_ {
        ReturnBucket::ALL.into_iter().map(|b| (b, self.bucket(b)))
    }
}

/// Aggregated figures for the dashboard and analytics views.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    /// Channels in the snapshot.
    pub total_channels: usize,
    /// Channels with `is_active`.
    pub active_channels: usize,
    /// Signals in the snapshot.
    pub total_signals: usize,
    /// Signals by direction.
    pub by_type: TypeCounts,
    /// `(channel_username, count)`, most signals first.
    pub per_channel: Vec<(String, usize)>,
    /// `(ticker, count)`, most signals first, ties by name.
    pub top_tickers: Vec<(String, usize)>,
    /// Potential-return statistics.
    pub returns: ReturnStats,
}

impl Summary {
    /// Computes the summary.
    #[must_use]
    pub fn compute(channels: &[Channel], signals: &[Signal]) -> Self {
        let mut by_type = TypeCounts::default();
        let mut per_channel: HashMap<&str, usize> = HashMap::new();
        let mut per_ticker: HashMap<&str, usize> = HashMap::new();

        for s in signals {
            let slot = match s.signal_type {
                SignalType::Buy => &mut by_type.buy,
                SignalType::Sell => &mut by_type.sell,
                SignalType::Other(_) => &mut by_type.other,
                SignalType::Unknown => &mut by_type.unknown,
            };
            *slot = slot.saturating_add(1);

            let count = per_channel.entry(s.channel_username.as_str()).or_default();
            *count = count.saturating_add(1);

            if let Some(ticker) = s.ticker.as_deref() {
                let count = per_ticker.entry(ticker).or_default();
                *count = count.saturating_add(1);
            }
        }

        Self {
            total_channels: channels.len(),
            active_channels: channels.iter().filter(|c| c.is_active).count(),
            total_signals: signals.len(),
            by_type,
            per_channel: ranked(per_channel),
            top_tickers: ranked(per_ticker),
            returns: return_stats(signals),
        }
    }
}

/// Sorts counts descending, ties by name.
fn ranked(counts: HashMap<&str, usize>) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(name, n)| (String::from(name), n))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn return_stats(signals: &[Signal]) -> ReturnStats {
    let mut stats = ReturnStats::default();
    let mut sum = 0.0;
    for pct in signals.iter().filter_map(Signal::potential_return_pct) {
        sum += pct;
        stats.count = stats.count.saturating_add(1);
        if let Some(slot) = stats.buckets.get_mut(ReturnBucket::of(pct).index()) {
            *slot = slot.saturating_add(1);
        }
    }
    if stats.count > 0 {
        stats.mean = Some(sum / stats.count as f64);
    }
    stats
}
