//! HTTP health probes.

use std::time::Duration;

use crate::error::SupervisorError;

/// Checks a service's health endpoint. Anything but a 2xx answer is a failure.
#[derive(Debug, Clone)]
pub struct HealthProbe {
    client: reqwest::Client,
}

impl HealthProbe {
    /// Create a probe whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, SupervisorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SupervisorError::HealthProbe {
                url: String::new(),
                reason: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }

    /// GET `url` and require a 2xx status.
    pub async fn check(&self, url: &str) -> Result<(), SupervisorError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SupervisorError::HealthProbe {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!("Health probe {} answered {}", url, status);
            Ok(())
        } else {
            Err(SupervisorError::HealthProbe {
                url: url.to_string(),
                reason: format!("HTTP {}", status),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn probe() -> HealthProbe {
        HealthProbe::new(Duration::from_secs(1)).unwrap()
    }

    #[tokio::test]
    async fn test_healthy_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"healthy"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/health", server.uri());
        probe().check(&url).await.unwrap();
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let url = format!("{}/health", server.uri());
        let err = probe().check(&url).await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let url = format!("{}/health", server.uri());
        let err = probe().check(&url).await.unwrap_err();
        assert!(matches!(err, SupervisorError::HealthProbe { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        // Port 9 (discard) is closed on test hosts.
        let err = probe().check("http://127.0.0.1:9/health").await.unwrap_err();
        assert!(matches!(err, SupervisorError::HealthProbe { .. }));
    }
}
