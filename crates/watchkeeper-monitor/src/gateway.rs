//! Notification gateway channel.

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use watchkeeper_config::GatewayConfig;

use crate::alerts::{Alert, AlertChannel};
use crate::error::MonitorError;

/// Body of `POST /alert`.
#[derive(Debug, Serialize)]
struct AlertRequest<'a> {
    title: &'a str,
    message: String,
}

/// What the gateway answers on success. Only logged.
#[derive(Debug, Deserialize)]
struct AlertResponse {
    status: Option<String>,
}

/// Delivers alerts through the bot gateway's `POST /alert` endpoint.
/// One attempt per alert, no retries.
pub struct GatewayChannel {
    endpoint: String,
    token: String,
    client: reqwest::Client,
}

impl GatewayChannel {
    /// Create a channel for `base_url` (the gateway root, without `/alert`).
    pub fn new(
        base_url: &str,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MonitorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MonitorError::InvalidConfig(format!("HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: format!("{}/alert", base_url.trim_end_matches('/')),
            token: token.into(),
            client,
        })
    }

    /// Create from config, resolving the token.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, MonitorError> {
        let token = config.resolve_token()?;
        Self::new(&config.url, token, Duration::from_secs(config.timeout_secs))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AlertChannel for GatewayChannel {
    fn name(&self) -> &str {
        "gateway"
    }

    async fn send(&self, alert: &Alert) -> Result<(), MonitorError> {
        let message = match alert.source {
            Some(ref host) => format!("{}\n\nHost: {}", alert.message, host),
            None => alert.message.clone(),
        };
        let payload = AlertRequest {
            title: &alert.title,
            message,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MonitorError::AlertDelivery(format!("Gateway request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            match response.json::<AlertResponse>().await {
                Ok(body) => debug!(
                    "Gateway accepted '{}' (status: {})",
                    alert.title,
                    body.status.as_deref().unwrap_or("-")
                ),
                Err(_) => debug!("Gateway accepted '{}'", alert.title),
            }
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(MonitorError::GatewayStatus {
                status: status.as_u16(),
                body,
            })
        }
    }
}
