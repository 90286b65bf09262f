//! Configuration validation.

use std::collections::HashSet;

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Convert into an error when any validation error was recorded.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        if self.is_valid() {
            return Ok(self.warnings);
        }
        let joined = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        Err(ConfigError::Validation(joined))
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_agent(config, &mut result);
        Self::validate_thresholds(config, &mut result);
        Self::validate_checks(config, &mut result);
        Self::validate_alerting(config, &mut result);
        Self::validate_gateway(config, &mut result);
        Self::validate_services(config, &mut result);
        Self::validate_recovery_time(config, &mut result);

        Ok(result)
    }

    fn validate_agent(config: &Config, result: &mut ValidationResult) {
        if config.agent.max_runtime_secs == 0 {
            result.add_error(ValidationError::new(
                "agent.max_runtime_secs",
                "max_runtime_secs must be greater than 0",
            ));
        }

        if config.agent.check_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "agent.check_timeout_secs",
                "check_timeout_secs must be greater than 0",
            ));
        }

        if config.agent.check_timeout_secs >= config.agent.max_runtime_secs {
            result.add_warning(ValidationWarning::new(
                "agent.check_timeout_secs",
                "check timeout is not shorter than the invocation deadline",
            ));
        }
    }

    fn validate_thresholds(config: &Config, result: &mut ValidationResult) {
        for (name, limit) in config.thresholds.entries() {
            if !limit.is_finite() || limit < 0.0 {
                result.add_error(ValidationError::new(
                    format!("thresholds.{}", name),
                    "limit must be a finite, non-negative number",
                ));
            }
        }

        let percents = [
            ("cpu_usage", config.thresholds.cpu_usage),
            ("memory_usage", config.thresholds.memory_usage),
            ("disk_usage", config.thresholds.disk_usage),
            ("network_unreachable", config.thresholds.network_unreachable),
        ];
        for (name, limit) in percents {
            if limit >= 100.0 {
                result.add_warning(ValidationWarning::new(
                    format!("thresholds.{}", name),
                    "limit is 100% or more, this alert can never fire",
                ));
            }
        }
    }

    fn validate_checks(config: &Config, result: &mut ValidationResult) {
        for target in &config.checks.network_targets {
            let valid = target
                .rsplit_once(':')
                .map(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok())
                .unwrap_or(false);
            if !valid {
                result.add_error(ValidationError::new(
                    "checks.network_targets",
                    format!("'{}' is not a host:port pair", target),
                ));
            }
        }

        if let Some(ref path) = config.checks.datastore_path {
            if !path.exists() {
                result.add_warning(ValidationWarning::new(
                    "checks.datastore_path",
                    format!("Data store does not exist yet: {:?}", path),
                ));
            }
        }
    }

    fn validate_alerting(config: &Config, result: &mut ValidationResult) {
        if config.dedup.window_secs == 0 {
            result.add_error(ValidationError::new(
                "dedup.window_secs",
                "window_secs must be greater than 0",
            ));
        }

        if config.dedup.store_path.as_os_str().is_empty() {
            result.add_error(ValidationError::new(
                "dedup.store_path",
                "store_path cannot be empty",
            ));
        }

        if config.retention.log_days == 0 {
            result.add_error(ValidationError::new(
                "retention.log_days",
                "log_days must be greater than 0",
            ));
        }

        if config.retention.record_days.saturating_mul(86_400) < config.dedup.window_secs {
            result.add_warning(ValidationWarning::new(
                "retention.record_days",
                "records expire before the dedup window closes",
            ));
        }
    }

    fn validate_gateway(config: &Config, result: &mut ValidationResult) {
        let Some(ref gateway) = config.gateway else {
            result.add_warning(ValidationWarning::new(
                "gateway",
                "No gateway configured, alerts will only be logged",
            ));
            return;
        };

        if !gateway.url.starts_with("http://") && !gateway.url.starts_with("https://") {
            result.add_error(ValidationError::new(
                "gateway.url",
                "url must start with http:// or https://",
            ));
        }

        if gateway.timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "gateway.timeout_secs",
                "timeout_secs must be greater than 0",
            ));
        }

        if gateway.token.is_none() && gateway.token_file.is_none() {
            result.add_error(ValidationError::new(
                "gateway.token",
                "either token or token_file must be set",
            ));
        }

        #[cfg(unix)]
        if gateway.token.is_none() {
            if let Some(ref path) = gateway.token_file {
                use std::os::unix::fs::PermissionsExt;

                if let Ok(meta) = std::fs::metadata(path) {
                    if meta.permissions().mode() & 0o077 != 0 {
                        result.add_warning(ValidationWarning::new(
                            "gateway.token_file",
                            format!("Token file {:?} is readable by group or others", path),
                        ));
                    }
                }
            }
        }
    }

    /// Worst case per service: a restart and a re-check that both hit the
    /// command timeout, plus the settle wait.
    fn validate_recovery_time(config: &Config, result: &mut ValidationResult) {
        let supervisor = &config.supervisor;
        let per_service = supervisor
            .command_timeout_secs
            .saturating_mul(2)
            .saturating_add(supervisor.restart_settle_secs);
        let worst_case = per_service.saturating_mul(config.services.len() as u64);

        if !config.services.is_empty() && worst_case >= config.agent.max_runtime_secs {
            result.add_warning(ValidationWarning::new(
                "supervisor.command_timeout_secs",
                format!(
                    "restarting all {} service(s) can take {}s, not less than max_runtime_secs ({}s); \
                     services left over are reported as timed out",
                    config.services.len(),
                    worst_case,
                    config.agent.max_runtime_secs
                ),
            ));
        }
    }

    fn validate_services(config: &Config, result: &mut ValidationResult) {
        if config.services.is_empty() {
            result.add_warning(ValidationWarning::new(
                "services",
                "No services configured, recovery is disabled",
            ));
        }

        let mut seen = HashSet::new();
        for (i, service) in config.services.iter().enumerate() {
            if service.name.trim().is_empty() {
                result.add_error(ValidationError::new(
                    format!("services[{}].name", i),
                    "Service name cannot be empty",
                ));
            } else if !seen.insert(service.name.as_str()) {
                result.add_error(ValidationError::new(
                    format!("services[{}].name", i),
                    format!("Service '{}' is listed twice", service.name),
                ));
            }

            if let Some(ref url) = service.health_url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    result.add_error(ValidationError::new(
                        format!("services[{}].health_url", i),
                        "health_url must start with http:// or https://",
                    ));
                }
            }
        }

        if config.supervisor.command_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "supervisor.command_timeout_secs",
                "command_timeout_secs must be greater than 0",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
