//! Host sensors backed by sysinfo.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use sysinfo::{Components, Disks, System};

use super::{MetricSource, blocking};
use crate::error::MonitorError;
use crate::sample::Metric;

/// Interval between the two CPU refreshes a usage reading needs.
const CPU_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

/// Global CPU usage in percent.
pub struct CpuSource;

#[async_trait]
impl MetricSource for CpuSource {
    fn metric(&self) -> Metric {
        Metric::CpuUsage
    }

    async fn read(&self) -> Result<f64, MonitorError> {
        blocking(Metric::CpuUsage, || {
            let mut system = System::new();
            system.refresh_cpu();
            std::thread::sleep(CPU_SAMPLE_INTERVAL);
            system.refresh_cpu();

            if system.cpus().is_empty() {
                return Err(MonitorError::sensor("cpu_usage", "no CPUs reported"));
            }
            Ok(f64::from(system.global_cpu_info().cpu_usage()))
        })
        .await
    }
}

/// Used memory in percent of total.
pub struct MemorySource;

#[async_trait]
impl MetricSource for MemorySource {
    fn metric(&self) -> Metric {
        Metric::MemoryUsage
    }

    async fn read(&self) -> Result<f64, MonitorError> {
        blocking(Metric::MemoryUsage, || {
            let mut system = System::new();
            system.refresh_memory();
            percent(system.used_memory(), system.total_memory())
                .ok_or_else(|| MonitorError::sensor("memory_usage", "total memory reported as 0"))
        })
        .await
    }
}

/// Used space of the filesystem holding `mount`, in percent.
pub struct DiskSource {
    mount: PathBuf,
}

impl DiskSource {
    pub fn new(mount: impl Into<PathBuf>) -> Self {
        Self {
            mount: mount.into(),
        }
    }
}

#[async_trait]
impl MetricSource for DiskSource {
    fn metric(&self) -> Metric {
        Metric::DiskUsage
    }

    async fn read(&self) -> Result<f64, MonitorError> {
        let mount = self.mount.clone();
        blocking(Metric::DiskUsage, move || {
            let disks = Disks::new_with_refreshed_list();
            let mounts = disks.list().iter().map(|d| d.mount_point());
            let Some(best) = covering_mount(mounts, &mount) else {
                return Err(MonitorError::sensor(
                    "disk_usage",
                    format!("no filesystem mounted at {}", mount.display()),
                ));
            };

            let disk = disks
                .list()
                .iter()
                .find(|d| d.mount_point() == best)
                .ok_or_else(|| MonitorError::sensor("disk_usage", "disk list changed"))?;
            let total = disk.total_space();
            let used = total.saturating_sub(disk.available_space());
            percent(used, total).ok_or_else(|| {
                MonitorError::sensor(
                    "disk_usage",
                    format!("{} reports zero capacity", best.display()),
                )
            })
        })
        .await
    }
}

/// Hottest component temperature in degrees Celsius.
pub struct TemperatureSource;

#[async_trait]
impl MetricSource for TemperatureSource {
    fn metric(&self) -> Metric {
        Metric::Temperature
    }

    async fn read(&self) -> Result<f64, MonitorError> {
        blocking(Metric::Temperature, || {
            let components = Components::new_with_refreshed_list();
            hottest(components.list().iter().map(|c| c.temperature()))
                .ok_or_else(|| MonitorError::sensor("temperature", "no temperature sensors"))
        })
        .await
    }
}

/// `used / total` in percent, or `None` when `total` is zero.
pub(crate) fn percent(used: u64, total: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some(used as f64 * 100.0 / total as f64)
}

/// The deepest mount point that contains `target`.
fn covering_mount<'a>(
    mounts: impl Iterator<Item = &'a Path>,
    target: &Path,
) -> Option<&'a Path> {
    mounts
        .filter(|m| target.starts_with(m))
        .max_by_key(|m| m.components().count())
}

/// Highest plausible reading. Sensors report 0 or NaN when they have no data.
fn hottest(readings: impl Iterator<Item = f32>) -> Option<f64> {
    readings
        .filter(|t| t.is_finite() && *t > 0.0)
        .map(f64::from)
        .fold(None, |max, t| match max {
            Some(m) if m >= t => Some(m),
            _ => Some(t),
        })
}
