//! Monitor errors.

use thiserror::Error;
use watchkeeper_config::ConfigError;
use watchkeeper_store::StoreError;
use watchkeeper_supervisor::SupervisorError;

/// Monitor error types.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// A sensor could not be read.
    #[error("Sensor {check} unavailable: {reason}")]
    SensorUnavailable { check: String, reason: String },

    /// A check did not finish within its timeout.
    #[error("Check {check} timed out after {secs}s")]
    CheckTimeout { check: String, secs: u64 },

    /// Alert delivery failed.
    #[error("Alert delivery failed: {0}")]
    AlertDelivery(String),

    /// Notification gateway answered with a non-success status.
    #[error("Gateway returned {status}: {body}")]
    GatewayStatus { status: u16, body: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MonitorError {
    /// Shorthand for [`MonitorError::SensorUnavailable`].
    pub fn sensor(check: impl Into<String>, reason: impl ToString) -> Self {
        MonitorError::SensorUnavailable {
            check: check.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_display() {
        let err = MonitorError::sensor("temperature", "no components reported");
        assert_eq!(
            err.to_string(),
            "Sensor temperature unavailable: no components reported"
        );
    }

    #[test]
    fn test_gateway_status_display() {
        let err = MonitorError::GatewayStatus {
            status: 500,
            body: "boom".to_string(),
        };
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_from_store_error() {
        let err: MonitorError = StoreError::Serialization("bad json".to_string()).into();
        assert!(matches!(err, MonitorError::Store(_)));
        assert!(err.to_string().contains("bad json"));
    }
}
