//! # Watchkeeper Supervisor
//!
//! Process supervisor integration for the monitoring agent.
//!
//! ## Features
//!
//! - `ServiceSupervisor` trait (`is_active` / `restart`)
//! - Linux systemd implementation with typed `systemctl show` parsing
//! - Optional HTTP health probes per service
//! - Recovery controller restarting every inactive service on every run
//!
//! ## Usage
//!
//! ```rust,ignore
//! use watchkeeper_supervisor::{RecoveryController, SystemdSupervisor};
//!
//! let supervisor = Arc::new(SystemdSupervisor::new(&config.supervisor));
//! let controller = RecoveryController::new(supervisor, settle);
//! let attempts = controller.recover(&statuses).await;
//! ```

pub mod error;
pub mod probe;
pub mod recovery;
pub mod supervisor;
pub mod systemd;

// Re-exports
pub use error::SupervisorError;
pub use probe::HealthProbe;
pub use recovery::{RecoveryController, RESTART_TIMED_OUT};
pub use supervisor::{RestartAttempt, ServiceStatus, ServiceSupervisor};
pub use systemd::{ActiveState, LoadState, SystemdSupervisor, UnitState};
