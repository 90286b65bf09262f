//! Linux systemd supervisor.
//!
//! Drives `systemctl` to query and restart the monitored units. Output is
//! parsed into [`UnitState`]; anything unrecognised is rejected rather than
//! guessed at.

mod systemd_ops;
mod systemd_state;

pub use systemd_ops::SystemdSupervisor;
pub use systemd_state::{ActiveState, LoadState, UnitState};

#[cfg(test)]
#[path = "systemd_tests.rs"]
mod tests;
