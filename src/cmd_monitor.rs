//! Monitoring subcommand handlers: run, check, report, retain.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sysinfo::System;
use tracing::info;
use watchkeeper_config::Config;
use watchkeeper_monitor::{
    open_deduplicator, Agent, Evaluator, HealthReport, Notifier, RetentionManager, Sampler,
    ThresholdTable,
};
use watchkeeper_supervisor::{ServiceSupervisor, SystemdSupervisor};

/// One invocation, bounded by `agent.max_runtime_secs`. Retention runs even
/// when the invocation is abandoned.
pub(crate) async fn run(config: &Config, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "Watchkeeper v{} run started{}",
        env!("CARGO_PKG_VERSION"),
        if dry_run { " (dry run)" } else { "" }
    );

    let agent = Agent::from_config(config, dry_run).await;
    let max_runtime = Duration::from_secs(config.agent.max_runtime_secs);
    agent.run_with_deadline(max_runtime, !dry_run).await;
    Ok(())
}

/// Sample and evaluate without alerting, restarting or recording.
pub(crate) async fn check(config: &Config, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let report = health_report(config).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.format_text());
        println!();
        println!(
            "{}",
            if report.is_healthy() {
                "Healthy".to_string()
            } else {
                format!("{} breach(es)", report.breaches.len())
            }
        );
    }
    Ok(())
}

/// Send a health summary right away. Deduplication does not apply.
pub(crate) async fn report(config: &Config, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let report = health_report(config).await;

    let mut notifier = Notifier::new(Notifier::channel_from_config(config, dry_run), None);
    if let Some(host) = System::host_name() {
        notifier = notifier.with_source(host);
    }

    if notifier.send(&report.to_alert()).await {
        println!("Report sent via {}", notifier.channel_name());
    } else {
        println!("Report could not be delivered; see the log");
    }
    Ok(())
}

/// Retention pass only.
pub(crate) async fn retain(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let dedup = open_deduplicator(&config.dedup).await;
    let report = RetentionManager::from_config(config)
        .run(dedup.as_ref(), Utc::now())
        .await;

    println!(
        "Removed {} log file(s) older than {} day(s) and {} alert record(s) older than {} day(s)",
        report.logs_removed.len(),
        config.retention.log_days,
        report.records_removed.len(),
        config.retention.record_days
    );
    Ok(())
}

async fn health_report(config: &Config) -> HealthReport {
    let supervisor: Arc<dyn ServiceSupervisor> =
        Arc::new(SystemdSupervisor::new(&config.supervisor));
    let sampler = Sampler::from_config(config, supervisor);
    let evaluator = Evaluator::new(ThresholdTable::from_config(&config.thresholds));

    let set = sampler.sample(Utc::now()).await;
    let breaches = evaluator.evaluate(&set);
    HealthReport::new(&set, evaluator.thresholds(), breaches)
}
