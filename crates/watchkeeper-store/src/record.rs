//! Alert keys and records.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Stable identifier of an alert class. All breaches sharing a key collapse
/// into one notification per dedup window.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertKey(String);

impl AlertKey {
    /// Aggregated key for inactive or unrecoverable services.
    pub const SERVICE_FAILURE: &'static str = "service_failure";

    /// Create a new key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The aggregated service failure key.
    pub fn service_failure() -> Self {
        Self::new(Self::SERVICE_FAILURE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AlertKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AlertKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Time of the last successful dispatch for one alert key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub key: AlertKey,
    /// Unix seconds.
    pub last_sent: i64,
}

impl AlertRecord {
    /// Create a record stamped at `sent_at`.
    pub fn new(key: AlertKey, sent_at: DateTime<Utc>) -> Self {
        Self {
            key,
            last_sent: sent_at.timestamp(),
        }
    }

    /// Last dispatch as a timestamp.
    pub fn last_sent_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.last_sent, 0).single()
    }

    /// Seconds elapsed between the last dispatch and `now`. `None` when the
    /// difference does not fit in an `i64`. Negative for future-dated records.
    pub fn age_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        now.timestamp().checked_sub(self.last_sent)
    }
}
