//! Restarts inactive services.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::supervisor::{RestartAttempt, ServiceStatus, ServiceSupervisor};

/// Error recorded for a service the recovery budget did not cover.
pub const RESTART_TIMED_OUT: &str = "restart timed out";

/// Issues a restart for every inactive service, on every invocation.
///
/// Restarts are never deduplicated. Only the alert describing a failed
/// restart goes through alert deduplication, which is the caller's job.
pub struct RecoveryController {
    supervisor: Arc<dyn ServiceSupervisor>,
    settle: Duration,
    budget: Option<Duration>,
}

impl RecoveryController {
    /// Create a controller. `settle` is how long to wait after a restart
    /// before checking that the unit came back.
    pub fn new(supervisor: Arc<dyn ServiceSupervisor>, settle: Duration) -> Self {
        Self {
            supervisor,
            settle,
            budget: None,
        }
    }

    /// Bound a whole `recover` pass. Services the budget does not cover are
    /// reported as failed with [`RESTART_TIMED_OUT`].
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Restart each inactive service in `statuses`, one after another.
    /// Returns one attempt per inactive service, in input order.
    pub async fn recover(&self, statuses: &[ServiceStatus]) -> Vec<RestartAttempt> {
        let started = Instant::now();
        let mut attempts = Vec::new();

        for status in statuses.iter().filter(|s| !s.is_active) {
            let attempt = match self.budget {
                None => self.restart_one(status).await,
                Some(budget) => {
                    let remaining = budget.saturating_sub(started.elapsed());
                    let bounded = if remaining.is_zero() {
                        None
                    } else {
                        tokio::time::timeout(remaining, self.restart_one(status))
                            .await
                            .ok()
                    };
                    bounded.unwrap_or_else(|| {
                        error!(
                            "Recovery budget of {}s used up before {} was restarted",
                            budget.as_secs(),
                            status.name
                        );
                        RestartAttempt::failed(&status.name, Utc::now(), RESTART_TIMED_OUT)
                    })
                }
            };
            attempts.push(attempt);
        }
        attempts
    }

    async fn restart_one(&self, status: &ServiceStatus) -> RestartAttempt {
        let name = status.name.as_str();
        let timestamp = Utc::now();
        warn!(
            "Service {} is down ({}), restarting via {}",
            name,
            status.detail.as_deref().unwrap_or("inactive"),
            self.supervisor.name()
        );

        if let Err(e) = self.supervisor.restart(name).await {
            error!("Restart of {} failed: {}", name, e);
            return RestartAttempt::failed(name, timestamp, e.to_string());
        }

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        match self.supervisor.is_active(name).await {
            Ok(true) => {
                info!("Service {} is active again", name);
                RestartAttempt::succeeded(name, timestamp)
            }
            Ok(false) => {
                error!("Service {} still inactive after restart", name);
                RestartAttempt::failed(name, timestamp, "still inactive after restart")
            }
            Err(e) => {
                error!("Could not confirm restart of {}: {}", name, e);
                RestartAttempt::failed(name, timestamp, format!("re-check failed: {}", e))
            }
        }
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
