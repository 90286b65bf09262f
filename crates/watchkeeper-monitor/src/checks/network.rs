//! Network reachability via TCP connect.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::net::TcpStream;
use tracing::debug;

use super::MetricSource;
use crate::error::MonitorError;
use crate::sample::Metric;

/// Percentage of `host:port` targets that refuse or time out a TCP connect.
pub struct NetworkSource {
    targets: Vec<String>,
    connect_timeout: Duration,
}

impl NetworkSource {
    pub fn new(targets: Vec<String>, connect_timeout: Duration) -> Self {
        Self {
            targets,
            connect_timeout,
        }
    }

    async fn reachable(&self, target: &str) -> bool {
        match tokio::time::timeout(self.connect_timeout, TcpStream::connect(target)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!("{} unreachable: {}", target, e);
                false
            }
            Err(_) => {
                debug!(
                    "{} did not answer within {}ms",
                    target,
                    self.connect_timeout.as_millis()
                );
                false
            }
        }
    }
}

#[async_trait]
impl MetricSource for NetworkSource {
    fn metric(&self) -> Metric {
        Metric::NetworkUnreachable
    }

    async fn read(&self) -> Result<f64, MonitorError> {
        if self.targets.is_empty() {
            return Err(MonitorError::sensor(
                "network_unreachable",
                "no targets configured",
            ));
        }

        let results = join_all(self.targets.iter().map(|t| self.reachable(t))).await;
        let down = results.iter().filter(|up| !**up).count();
        Ok(down as f64 * 100.0 / self.targets.len() as f64)
    }
}
