//! SystemdSupervisor operational methods (show, restart).

use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use watchkeeper_config::SupervisorConfig;

use super::systemd_state::UnitState;
use crate::error::SupervisorError;
use crate::supervisor::{ServiceStatus, ServiceSupervisor};

/// Supervisor backed by `systemctl`.
#[derive(Debug, Clone)]
pub struct SystemdSupervisor {
    systemctl: String,
    user_mode: bool,
    timeout: Duration,
}

impl SystemdSupervisor {
    /// Create from config.
    pub fn new(config: &SupervisorConfig) -> Self {
        Self {
            systemctl: config.systemctl.clone(),
            user_mode: config.user_mode,
            timeout: Duration::from_secs(config.command_timeout_secs),
        }
    }

    /// Get systemctl command arguments for user/system mode.
    fn systemctl_args<'a>(&self, args: &[&'a str]) -> Vec<&'a str> {
        let mut full = if self.user_mode {
            vec!["--user"]
        } else {
            vec![]
        };
        full.extend_from_slice(args);
        full
    }

    /// Run systemctl with a timeout. The child is killed if the timeout fires.
    async fn run(&self, args: &[&str]) -> Result<Output, SupervisorError> {
        let args = self.systemctl_args(args);
        let command = format!("{} {}", self.systemctl, args.join(" "));

        let child = Command::new(&self.systemctl)
            .args(&args)
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(SupervisorError::CommandSpawn {
                command,
                reason: e.to_string(),
            }),
            Err(_) => Err(SupervisorError::CommandTimeout {
                command,
                secs: self.timeout.as_secs(),
            }),
        }
    }

    fn check_success(args: &[&str], output: &Output) -> Result<(), SupervisorError> {
        if output.status.success() {
            return Ok(());
        }
        Err(SupervisorError::CommandFailed {
            command: format!("systemctl {}", args.join(" ")),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    /// Get the parsed state of a unit.
    pub async fn unit_state(&self, unit: &str) -> Result<UnitState, SupervisorError> {
        let args = [
            "show",
            unit,
            "--property=LoadState,ActiveState,SubState",
        ];
        let output = self.run(&args).await?;
        Self::check_success(&args, &output)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        UnitState::parse(unit, &stdout)
    }
}

#[async_trait]
impl ServiceSupervisor for SystemdSupervisor {
    fn name(&self) -> &str {
        "systemd"
    }

    async fn is_active(&self, service: &str) -> Result<bool, SupervisorError> {
        Ok(self.unit_state(service).await?.is_running())
    }

    async fn restart(&self, service: &str) -> Result<(), SupervisorError> {
        let args = ["restart", service];
        let output = self.run(&args).await?;
        Self::check_success(&args, &output)?;

        tracing::info!("Restarted service: {}", service);
        Ok(())
    }

    async fn status(&self, service: &str) -> Result<ServiceStatus, SupervisorError> {
        let state = self.unit_state(service).await?;
        tracing::debug!("Unit {} is {}", service, state.describe());
        if state.is_running() {
            Ok(ServiceStatus::active(service))
        } else {
            Ok(ServiceStatus::inactive(service, state.describe()))
        }
    }
}
