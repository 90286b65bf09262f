//! Test doubles shared by the crate's tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use watchkeeper_supervisor::{ServiceSupervisor, SupervisorError};

use crate::alerts::{Alert, AlertChannel};
use crate::checks::MetricSource;
use crate::error::MonitorError;
use crate::sample::Metric;

/// Source returning an adjustable value.
pub(crate) struct FixedSource {
    metric: Metric,
    value: Arc<Mutex<f64>>,
}

impl FixedSource {
    pub(crate) fn new(metric: Metric, value: f64) -> Self {
        Self {
            metric,
            value: Arc::new(Mutex::new(value)),
        }
    }

    /// Source reading a value the test keeps a handle to.
    pub(crate) fn shared(metric: Metric, value: Arc<Mutex<f64>>) -> Self {
        Self { metric, value }
    }
}

#[async_trait]
impl MetricSource for FixedSource {
    fn metric(&self) -> Metric {
        self.metric
    }

    async fn read(&self) -> Result<f64, MonitorError> {
        Ok(*self.value.lock().unwrap())
    }
}

/// Source whose sensor is missing.
pub(crate) struct FailingSource(pub(crate) Metric);

#[async_trait]
impl MetricSource for FailingSource {
    fn metric(&self) -> Metric {
        self.0
    }

    async fn read(&self) -> Result<f64, MonitorError> {
        Err(MonitorError::sensor(self.0.name(), "sensor missing"))
    }
}

/// Source that never answers.
pub(crate) struct HangingSource(pub(crate) Metric);

#[async_trait]
impl MetricSource for HangingSource {
    fn metric(&self) -> Metric {
        self.0
    }

    async fn read(&self) -> Result<f64, MonitorError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(0.0)
    }
}

/// In-memory supervisor. Restarting a unit brings it up unless it is broken.
/// Restarts can be made slow with `set_restart_delay`.
/// Units it does not know fail to query.
#[derive(Default)]
pub(crate) struct FakeSupervisor {
    active: Mutex<HashMap<String, bool>>,
    broken: Mutex<HashSet<String>>,
    restarts: Mutex<Vec<String>>,
    restart_delay: Mutex<Duration>,
}

impl FakeSupervisor {
    pub(crate) fn with_units(units: &[(&str, bool)]) -> Self {
        let fake = Self::default();
        for (name, up) in units {
            fake.set_active(name, *up);
        }
        fake
    }

    pub(crate) fn set_active(&self, name: &str, up: bool) {
        self.active.lock().unwrap().insert(name.to_string(), up);
    }

    pub(crate) fn break_unit(&self, name: &str) {
        self.broken.lock().unwrap().insert(name.to_string());
    }

    /// Every restart takes `delay` before it returns.
    pub(crate) fn set_restart_delay(&self, delay: Duration) {
        *self.restart_delay.lock().unwrap() = delay;
    }

    pub(crate) fn restarts(&self) -> Vec<String> {
        self.restarts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ServiceSupervisor for FakeSupervisor {
    fn name(&self) -> &str {
        "fake"
    }

    async fn is_active(&self, service: &str) -> Result<bool, SupervisorError> {
        self.active
            .lock()
            .unwrap()
            .get(service)
            .copied()
            .ok_or_else(|| SupervisorError::UnexpectedOutput {
                unit: service.to_string(),
                reason: "unknown unit".to_string(),
            })
    }

    async fn restart(&self, service: &str) -> Result<(), SupervisorError> {
        self.restarts.lock().unwrap().push(service.to_string());
        let delay = *self.restart_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.broken.lock().unwrap().contains(service) {
            return Err(SupervisorError::CommandFailed {
                command: format!("systemctl restart {}", service),
                code: Some(1),
                stderr: format!("Job for {}.service failed.", service),
            });
        }
        self.set_active(service, true);
        Ok(())
    }
}

/// Channel that records what it was asked to send. Can be told to fail.
#[derive(Clone, Default)]
pub(crate) struct RecordingChannel {
    sent: Arc<Mutex<Vec<Alert>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingChannel {
    pub(crate) fn sent(&self) -> Vec<Alert> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn titles(&self) -> Vec<String> {
        self.sent().into_iter().map(|a| a.title).collect()
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl AlertChannel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, alert: &Alert) -> Result<(), MonitorError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MonitorError::GatewayStatus {
                status: 500,
                body: "Internal Server Error".to_string(),
            });
        }
        self.sent.lock().unwrap().push(alert.clone());
        Ok(())
    }
}
