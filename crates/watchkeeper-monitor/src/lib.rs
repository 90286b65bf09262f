//! # Watchkeeper Monitor
//!
//! One-shot health monitoring for an unattended Linux host.
//!
//! ## Features
//!
//! - Host and service sampling with per-check timeouts
//! - Threshold evaluation into alert classes
//! - Deduplicated delivery to the bot gateway
//! - Restart of inactive services
//! - Retention of logs and alert records

pub mod agent;
pub mod alerts;
pub mod checks;
pub mod error;
pub mod evaluator;
pub mod gateway;
pub mod notifier;
pub mod report;
pub mod retention;
pub mod sample;
pub mod sampler;

#[cfg(test)]
mod testing;

pub use agent::{open_deduplicator, recovery_budget, Agent, Dispatch, Invocation, RunSummary};
pub use alerts::{Alert, AlertChannel, AlertSeverity, LogChannel};
pub use checks::MetricSource;
pub use error::MonitorError;
pub use evaluator::{BreachEvent, BreachKind, Evaluator, ThresholdTable};
pub use gateway::GatewayChannel;
pub use notifier::{DispatchOutcome, Notifier};
pub use report::HealthReport;
pub use retention::{RetentionManager, RetentionReport};
pub use sample::{Metric, MetricSample, SampleSet, Unavailable};
pub use sampler::Sampler;
