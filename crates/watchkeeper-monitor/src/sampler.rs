//! Sampler: runs every configured check concurrently, each under its own timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, warn};
use watchkeeper_config::{Config, ServiceConfig};
use watchkeeper_supervisor::{HealthProbe, ServiceStatus, ServiceSupervisor};

use crate::checks::{MetricSource, sources_from_config};
use crate::error::MonitorError;
use crate::sample::SampleSet;

/// Collects metric samples and service statuses for one invocation.
pub struct Sampler {
    sources: Vec<Box<dyn MetricSource>>,
    services: Vec<ServiceConfig>,
    supervisor: Arc<dyn ServiceSupervisor>,
    probe: Option<HealthProbe>,
    timeout: Duration,
}

impl Sampler {
    pub fn new(
        sources: Vec<Box<dyn MetricSource>>,
        services: Vec<ServiceConfig>,
        supervisor: Arc<dyn ServiceSupervisor>,
        timeout: Duration,
    ) -> Self {
        Self {
            sources,
            services,
            supervisor,
            probe: None,
            timeout,
        }
    }

    /// Build from config. Network probes get half the check budget per connect.
    pub fn from_config(config: &Config, supervisor: Arc<dyn ServiceSupervisor>) -> Self {
        let timeout = Duration::from_secs(config.agent.check_timeout_secs);
        let sources = sources_from_config(&config.checks, timeout / 2);
        let mut sampler = Self::new(sources, config.services.clone(), supervisor, timeout);

        if config.services.iter().any(|s| s.health_url.is_some()) {
            match HealthProbe::new(timeout) {
                Ok(probe) => sampler.probe = Some(probe),
                Err(e) => warn!("Health probes disabled: {}", e),
            }
        }
        sampler
    }

    /// Use `probe` for services with a `health_url`.
    pub fn with_probe(mut self, probe: HealthProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Run all checks. Never fails: broken checks land in `unavailable`.
    pub async fn sample(&self, now: DateTime<Utc>) -> SampleSet {
        let metrics = join_all(self.sources.iter().map(|source| async move {
            let metric = source.metric();
            (metric, self.bounded(metric.name(), source.read()).await)
        }));
        let services = join_all(self.services.iter().map(|service| async move {
            let check = format!("service:{}", service.name);
            let result = self.bounded(&check, self.service_status(service)).await;
            (check, result)
        }));
        let (metrics, services) = tokio::join!(metrics, services);

        let mut set = SampleSet::new(now);
        for (metric, result) in metrics {
            match result {
                Ok(value) => {
                    debug!("{} = {}", metric, value);
                    set.push(metric, value);
                }
                Err(e) => {
                    warn!("{}", e);
                    set.mark_unavailable(metric.name(), e.to_string());
                }
            }
        }
        for (check, result) in services {
            match result {
                Ok(status) => set.services.push(status),
                Err(e) => {
                    warn!("{}", e);
                    set.mark_unavailable(check, e.to_string());
                }
            }
        }
        set
    }

    async fn service_status(&self, service: &ServiceConfig) -> Result<ServiceStatus, MonitorError> {
        let status = self.supervisor.status(&service.name).await?;
        if !status.is_active {
            return Ok(status);
        }

        match (&service.health_url, &self.probe) {
            (Some(url), Some(probe)) => match probe.check(url).await {
                Ok(()) => Ok(status),
                Err(e) => Ok(ServiceStatus::inactive(
                    &service.name,
                    format!("health check failed: {}", e),
                )),
            },
            _ => Ok(status),
        }
    }

    async fn bounded<T>(
        &self,
        check: &str,
        fut: impl Future<Output = Result<T, MonitorError>>,
    ) -> Result<T, MonitorError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(MonitorError::CheckTimeout {
                check: check.to_string(),
                secs: self.timeout.as_secs(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "sampler_tests.rs"]
mod tests;
