//! One monitoring invocation: sample, evaluate, alert, recover.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sysinfo::System;
use tracing::{error, info, warn};
use watchkeeper_config::{Config, DedupConfig};
use watchkeeper_store::{AlertKey, Deduplicator, FileAlertStore, StoreError};
use watchkeeper_supervisor::{
    RecoveryController, RestartAttempt, ServiceStatus, ServiceSupervisor, SystemdSupervisor,
};

use crate::alerts::Alert;
use crate::evaluator::{BreachEvent, Evaluator, ThresholdTable};
use crate::notifier::{DispatchOutcome, Notifier};
use crate::retention::{RetentionManager, RetentionReport};
use crate::sampler::Sampler;

/// Outcome of dispatching one alert class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dispatch {
    pub key: AlertKey,
    pub outcome: DispatchOutcome,
}

/// What one invocation did.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub samples: usize,
    pub unavailable: usize,
    pub breaches: usize,
    pub dispatches: Vec<Dispatch>,
    pub restarts: Vec<RestartAttempt>,
}

/// A deadline-bounded invocation followed by retention.
#[derive(Debug, Default)]
pub struct Invocation {
    /// `None` when the run was abandoned at the deadline.
    pub summary: Option<RunSummary>,
    /// `None` when retention was not requested.
    pub retention: Option<RetentionReport>,
}

impl RunSummary {
    pub fn outcome_of(&self, key: &AlertKey) -> Option<DispatchOutcome> {
        self.dispatches
            .iter()
            .find(|d| &d.key == key)
            .map(|d| d.outcome)
    }
}

/// The monitoring agent. Holds no state between invocations beyond the alert store.
pub struct Agent {
    sampler: Sampler,
    evaluator: Evaluator,
    recovery: Option<RecoveryController>,
    notifier: Notifier,
    retention: RetentionManager,
}

impl Agent {
    /// Assemble an agent. Without a recovery controller, inactive services
    /// are reported but not restarted.
    pub fn new(
        sampler: Sampler,
        evaluator: Evaluator,
        recovery: Option<RecoveryController>,
        notifier: Notifier,
        retention: RetentionManager,
    ) -> Self {
        Self {
            sampler,
            evaluator,
            recovery,
            notifier,
            retention,
        }
    }

    /// Build the production agent: systemd, the file alert store and the
    /// configured gateway. A dry run logs alerts, records nothing and restarts nothing.
    pub async fn from_config(config: &Config, dry_run: bool) -> Self {
        let supervisor: Arc<dyn ServiceSupervisor> =
            Arc::new(SystemdSupervisor::new(&config.supervisor));

        let dedup = open_deduplicator(&config.dedup).await;
        let mut notifier = Notifier::new(Notifier::channel_from_config(config, dry_run), dedup);
        if dry_run {
            notifier = notifier.without_recording();
        }
        if let Some(host) = System::host_name() {
            notifier = notifier.with_source(host);
        }

        let recovery = (!dry_run).then(|| {
            RecoveryController::new(
                supervisor.clone(),
                Duration::from_secs(config.supervisor.restart_settle_secs),
            )
            .with_budget(recovery_budget(config))
        });

        Self::new(
            Sampler::from_config(config, supervisor),
            Evaluator::new(ThresholdTable::from_config(&config.thresholds)),
            recovery,
            notifier,
            RetentionManager::from_config(config),
        )
    }

    /// One invocation at `now`. Never fails: every problem is logged and
    /// the remaining steps still run.
    pub async fn run_at(&self, now: DateTime<Utc>) -> RunSummary {
        info!("Health check started");
        let set = self.sampler.sample(now).await;
        let breaches = self.evaluator.metric_breaches(&set);
        let service_failure = self.evaluator.service_failure(&set);

        let (mut dispatches, restarts) = tokio::join!(
            self.dispatch_all(&breaches, now),
            self.recover(&set.services)
        );

        if let Some(ref breach) = service_failure {
            let alert = Alert::from_breach(breach, &restarts, now);
            let outcome = self.notifier.dispatch(&breach.key, &alert, now).await;
            dispatches.push(Dispatch {
                key: breach.key.clone(),
                outcome,
            });
        }

        let summary = RunSummary {
            samples: set.samples.len(),
            unavailable: set.unavailable.len(),
            breaches: breaches.len() + usize::from(service_failure.is_some()),
            dispatches,
            restarts,
        };
        info!(
            "Health check finished: {} sample(s), {} unavailable, {} breach(es), {} restart(s)",
            summary.samples,
            summary.unavailable,
            summary.breaches,
            summary.restarts.len()
        );
        summary
    }

    /// Run once, abandoning the run after `max_runtime`. Retention runs
    /// afterwards either way when `retain` is set.
    pub async fn run_with_deadline(&self, max_runtime: Duration, retain: bool) -> Invocation {
        let summary = match tokio::time::timeout(max_runtime, self.run_at(Utc::now())).await {
            Ok(summary) => {
                for dispatch in &summary.dispatches {
                    info!("Alert {}: {}", dispatch.key, dispatch.outcome);
                }
                Some(summary)
            }
            Err(_) => {
                error!("Run exceeded {}s and was abandoned", max_runtime.as_secs());
                None
            }
        };

        let retention = if retain {
            Some(self.retain(Utc::now()).await)
        } else {
            info!("Dry run: skipping retention");
            None
        };

        Invocation { summary, retention }
    }

    /// Retention pass at `now`.
    pub async fn retain(&self, now: DateTime<Utc>) -> RetentionReport {
        self.retention.run(self.notifier.deduplicator(), now).await
    }

    async fn dispatch_all(&self, breaches: &[BreachEvent], now: DateTime<Utc>) -> Vec<Dispatch> {
        let mut dispatches = Vec::with_capacity(breaches.len());
        for breach in breaches {
            warn!("Threshold breached: {}", breach.key);
            let alert = Alert::from_breach(breach, &[], now);
            let outcome = self.notifier.dispatch(&breach.key, &alert, now).await;
            dispatches.push(Dispatch {
                key: breach.key.clone(),
                outcome,
            });
        }
        dispatches
    }

    async fn recover(&self, services: &[ServiceStatus]) -> Vec<RestartAttempt> {
        match self.recovery {
            Some(ref recovery) => recovery.recover(services).await,
            None => {
                for s in services.iter().filter(|s| !s.is_active) {
                    info!("Dry run: would restart {}", s.name);
                }
                Vec::new()
            }
        }
    }
}

/// Time recovery may take so that the service failure alert still goes out
/// before `max_runtime_secs`: what is left after sampling and one gateway
/// round trip, or half the deadline if that leaves nothing.
pub fn recovery_budget(config: &Config) -> Duration {
    let max_runtime = Duration::from_secs(config.agent.max_runtime_secs);
    let gateway = config.gateway.as_ref().map_or(0, |g| g.timeout_secs);
    let reserved = Duration::from_secs(
        config
            .agent
            .check_timeout_secs
            .saturating_add(gateway)
            .saturating_add(1),
    );

    match max_runtime.checked_sub(reserved) {
        Some(budget) if !budget.is_zero() => budget,
        _ => max_runtime / 2,
    }
}

/// Open the alert store. A busy or broken store yields `None`: no dispatch and
/// no record retention this run.
pub async fn open_deduplicator(config: &DedupConfig) -> Option<Deduplicator> {
    let lock_timeout = Duration::from_secs(config.lock_timeout_secs);
    match FileAlertStore::open(&config.store_path, lock_timeout).await {
        Ok(store) => Some(Deduplicator::new(
            Arc::new(store),
            Duration::from_secs(config.window_secs),
        )),
        Err(e @ StoreError::LockTimeout { .. }) => {
            warn!("{}; another run is in progress, alerts are not dispatched", e);
            None
        }
        Err(e) => {
            error!("Cannot open alert store: {}; alerts are not dispatched", e);
            None
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
