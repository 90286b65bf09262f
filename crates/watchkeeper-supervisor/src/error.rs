//! Supervisor-related errors.

use thiserror::Error;

/// Errors that can occur while talking to the process supervisor.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The supervisor command could not be started.
    #[error("Failed to execute {command}: {reason}")]
    CommandSpawn { command: String, reason: String },

    /// The supervisor command did not finish in time.
    #[error("{command} did not finish within {secs}s")]
    CommandTimeout { command: String, secs: u64 },

    /// The supervisor command exited unsuccessfully.
    #[error("{command} failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Supervisor output did not match the expected shape.
    #[error("Unexpected supervisor output for {unit}: {reason}")]
    UnexpectedOutput { unit: String, reason: String },

    /// Health endpoint did not answer with 2xx.
    #[error("Health probe {url} failed: {reason}")]
    HealthProbe { url: String, reason: String },
}
