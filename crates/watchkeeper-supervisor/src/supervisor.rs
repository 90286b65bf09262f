//! Process supervisor abstraction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SupervisorError;

/// Run state of one monitored service. Read fresh on every invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub name: String,
    pub is_active: bool,
    /// Why the service counts as down, if it does.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ServiceStatus {
    pub fn active(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_active: true,
            detail: None,
        }
    }

    pub fn inactive(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_active: false,
            detail: Some(detail.into()),
        }
    }
}

/// Outcome of one restart attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartAttempt {
    pub service: String,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RestartAttempt {
    pub fn succeeded(service: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            service: service.into(),
            timestamp,
            success: true,
            error: None,
        }
    }

    pub fn failed(
        service: impl Into<String>,
        timestamp: DateTime<Utc>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            timestamp,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Queries and restarts services.
#[async_trait]
pub trait ServiceSupervisor: Send + Sync {
    /// Supervisor name, for logging.
    fn name(&self) -> &str;

    /// Whether the service is currently running.
    async fn is_active(&self, service: &str) -> Result<bool, SupervisorError>;

    /// Restart the service. Idempotent.
    async fn restart(&self, service: &str) -> Result<(), SupervisorError>;

    /// Status with a human-readable reason when the service is down.
    async fn status(&self, service: &str) -> Result<ServiceStatus, SupervisorError> {
        if self.is_active(service).await? {
            Ok(ServiceStatus::active(service))
        } else {
            Ok(ServiceStatus::inactive(service, "inactive"))
        }
    }
}
