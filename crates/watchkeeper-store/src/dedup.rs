//! Time-windowed alert deduplication.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, warn};

use crate::error::StoreError;
use crate::record::{AlertKey, AlertRecord};
use crate::store::AlertStore;

/// Dedup state of one alert key at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertState {
    /// No record exists.
    Fresh,
    /// Sent within the window; breaches are not notified.
    Suppressed { remaining_secs: i64 },
    /// Sent before, window has elapsed.
    Eligible,
}

impl AlertState {
    pub fn may_send(&self) -> bool {
        !matches!(self, AlertState::Suppressed { .. })
    }
}

/// Decides whether an alert may be dispatched and records successful dispatches.
#[derive(Clone)]
pub struct Deduplicator {
    store: Arc<dyn AlertStore>,
    window_secs: i64,
}

impl Deduplicator {
    /// Create a deduplicator over `store` with the given resend window.
    pub fn new(store: Arc<dyn AlertStore>, window: std::time::Duration) -> Self {
        Self {
            store,
            window_secs: clamp_secs(window),
        }
    }

    /// Window length in seconds.
    pub fn window_secs(&self) -> i64 {
        self.window_secs
    }

    /// Current state of `key`. A store read failure counts as `Fresh`.
    pub async fn state(&self, key: &AlertKey, now: DateTime<Utc>) -> AlertState {
        let record = match self.store.get(key).await {
            Ok(record) => record,
            Err(e) => {
                error!("Failed to read alert record '{}': {}", key, e);
                None
            }
        };

        match record {
            None => AlertState::Fresh,
            Some(record) => match record.age_secs(now) {
                Some(age) if age >= self.window_secs => AlertState::Eligible,
                Some(age) if age >= 0 => AlertState::Suppressed {
                    remaining_secs: self.window_secs - age,
                },
                _ => {
                    warn!(
                        "Alert record '{}' has unusable last_sent {} (now {}); treating as eligible",
                        key,
                        record.last_sent,
                        now.timestamp()
                    );
                    AlertState::Eligible
                }
            },
        }
    }

    /// True iff no record exists or the window has elapsed since the last send.
    pub async fn should_send(&self, key: &AlertKey, now: DateTime<Utc>) -> bool {
        let state = self.state(key, now).await;
        if let AlertState::Suppressed { remaining_secs } = state {
            debug!("Alert '{}' suppressed for another {}s", key, remaining_secs);
        }
        state.may_send()
    }

    /// Record a successful dispatch.
    pub async fn mark_sent(&self, key: &AlertKey, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.store.put(AlertRecord::new(key.clone(), now)).await?;
        debug!("Alert '{}' marked sent at {}", key, now);
        Ok(())
    }

    /// Delete records whose last dispatch is older than `max_age` or lies
    /// after `now`.
    pub async fn prune(
        &self,
        now: DateTime<Utc>,
        max_age: std::time::Duration,
    ) -> Result<Vec<AlertKey>, StoreError> {
        let cutoff = Duration::try_seconds(clamp_secs(max_age))
            .and_then(|age| now.checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.store.remove_expired(cutoff, now).await
    }
}

fn clamp_secs(duration: std::time::Duration) -> i64 {
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}
