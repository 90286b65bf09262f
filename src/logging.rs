//! Tracing initialisation: console plus daily log files.

use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use watchkeeper_config::{LogFormat, LoggingConfig};
use watchkeeper_monitor::retention::LOG_FILE_PREFIX;

/// Initialize tracing with console and file output.
///
/// `RUST_LOG` overrides the configured level. Console output goes to stderr so
/// that `check --json` keeps stdout clean. When the log directory cannot be
/// created only the console layer is installed. The returned guard flushes the
/// file writer when dropped and must live until the process exits.
pub(crate) fn init_tracing(
    config: &LoggingConfig,
) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_writer, guard) = match file_writer(&config.directory) {
        Ok((writer, guard)) => (Some(writer), Some(guard)),
        Err(e) => {
            eprintln!(
                "watchkeeper: not writing log files to {}: {}",
                config.directory.display(),
                e
            );
            (None, None)
        }
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.format {
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(file_writer.map(|w| fmt::layer().with_writer(w).with_ansi(false)))
            .try_init()?,
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(file_writer.map(|w| fmt::layer().json().with_writer(w).with_ansi(false)))
            .try_init()?,
    }

    Ok(guard)
}

/// Daily rolling `watchkeeper.YYYY-MM-DD.log` files. Old files are removed by
/// the retention pass, not by the appender.
fn file_writer(dir: &Path) -> Result<(NonBlocking, WorkerGuard), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(dir)?;

    Ok(tracing_appender::non_blocking(file_appender))
}
