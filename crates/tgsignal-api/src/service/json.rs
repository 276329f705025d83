//! JSON envelope types and custom deserializers.
//!
//! All response defaulting lives here so callers never see a missing field.

use serde::de::Error;
use serde::{Deserialize, Deserializer};

use super::types::{Channel, Signal, SignalType};

/// Deserializes `null` as `T::default()`.
pub fn deserialize_null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let value: Option<T> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

/// Deserializes empty (or whitespace-only) strings as `None`.
pub fn deserialize_empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let result = Option::deserialize(deserializer);
    let s: Option<String> = result.map_err(D::Error::custom)?;
    Ok(s.filter(|s| !s.trim().is_empty()))
}

/// A price as the service may send it: a number or a numeric string.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Number(f64),
    Text(String),
}

/// Deserializes a price from a number, a numeric string (`.` or `,` as the
/// decimal separator), `null` or `""`. Non-finite values are rejected.
pub fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let price = match Option::<RawPrice>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(RawPrice::Number(n)) => n,
        Some(RawPrice::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .replace(',', ".")
                .parse::<f64>()
                .map_err(|e| D::Error::custom(format!("failed to parse price {trimmed:?}: {e}")))?
        }
    };
    if !price.is_finite() {
        return Err(D::Error::custom(format!("price must be finite, got {price}")));
    }
    Ok(Some(price))
}

/// Channel record as received; converted into [`Channel`].
#[derive(Debug, Deserialize)]
pub struct RawChannel {
    pub id: i64,
    #[serde(default, deserialize_with = "deserialize_empty_string_as_none")]
    pub channel_username: Option<String>,
    #[serde(default, deserialize_with = "deserialize_empty_string_as_none")]
    pub channel_title: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub last_message_id: Option<i64>,
}

/// Signal record as received; converted into [`Signal`].
#[derive(Debug, Deserialize)]
pub struct RawSignal {
    pub id: i64,
    #[serde(default, deserialize_with = "deserialize_empty_string_as_none")]
    pub ticker: Option<String>,
    #[serde(default)]
    pub signal_type: SignalType,
    #[serde(default, deserialize_with = "deserialize_price")]
    pub entry_price: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_price")]
    pub target_price: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_price")]
    pub stop_loss: Option<f64>,
    #[serde(default)]
    pub channel_username: Option<String>,
    #[serde(default)]
    pub message_text: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// `GET <channels>` response.
#[derive(Debug, Deserialize)]
pub struct ChannelListResponse {
    /// Channel list (missing or `null` means empty).
    #[serde(default, deserialize_with = "deserialize_null_as_default")]
    pub channels: Vec<Channel>,
}

/// `GET <signals>` response.
#[derive(Debug, Deserialize)]
pub struct SignalListResponse {
    /// Signal list (missing or `null` means empty).
    #[serde(default, deserialize_with = "deserialize_null_as_default")]
    pub signals: Vec<Signal>,
}

/// `POST <channels>` response.
#[derive(Debug, Deserialize)]
pub struct CreateChannelResponse {
    /// The created (or re-activated) channel.
    #[serde(default)]
    pub channel: Option<Channel>,
}
