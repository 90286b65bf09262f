//! Metric sources read by the sampler.
//!
//! Each source produces one metric. Sources never fail the run: an error is
//! recorded against the check and the others carry on.

mod datastore;
mod host;
mod network;

use std::time::Duration;

use async_trait::async_trait;
use watchkeeper_config::ChecksConfig;

use crate::error::MonitorError;
use crate::sample::Metric;

pub use datastore::DatastoreSource;
pub use host::{CpuSource, DiskSource, MemorySource, TemperatureSource};
pub use network::NetworkSource;

/// Produces one reading of one metric.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Metric this source reads.
    fn metric(&self) -> Metric;

    /// Take a reading.
    async fn read(&self) -> Result<f64, MonitorError>;
}

/// Build the enabled sources. `connect_timeout` bounds each reachability probe.
pub fn sources_from_config(
    checks: &ChecksConfig,
    connect_timeout: Duration,
) -> Vec<Box<dyn MetricSource>> {
    let mut sources: Vec<Box<dyn MetricSource>> = Vec::new();

    if checks.cpu {
        sources.push(Box::new(CpuSource));
    }
    if checks.memory {
        sources.push(Box::new(MemorySource));
    }
    if checks.disk {
        sources.push(Box::new(DiskSource::new(&checks.disk_mount)));
    }
    if checks.temperature {
        sources.push(Box::new(TemperatureSource));
    }
    sources.push(Box::new(NetworkSource::new(
        checks.network_targets.clone(),
        connect_timeout,
    )));
    if let Some(ref path) = checks.datastore_path {
        sources.push(Box::new(DatastoreSource::new(path)));
    }

    sources
}

/// Run a blocking sensor read off the async runtime.
pub(crate) async fn blocking<F>(metric: Metric, read: F) -> Result<f64, MonitorError>
where
    F: FnOnce() -> Result<f64, MonitorError> + Send + 'static,
{
    tokio::task::spawn_blocking(read)
        .await
        .map_err(|e| MonitorError::sensor(metric.name(), format!("sensor task failed: {}", e)))?
}
