//! Typed `systemctl show` output.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SupervisorError;

/// Unit load state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadState {
    Loaded,
    NotFound,
    BadSetting,
    Error,
    Masked,
    Merged,
    Stub,
}

impl FromStr for LoadState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "loaded" => Ok(LoadState::Loaded),
            "not-found" => Ok(LoadState::NotFound),
            "bad-setting" => Ok(LoadState::BadSetting),
            "error" => Ok(LoadState::Error),
            "masked" => Ok(LoadState::Masked),
            "merged" => Ok(LoadState::Merged),
            "stub" => Ok(LoadState::Stub),
            other => Err(format!("unknown LoadState '{}'", other)),
        }
    }
}

/// Unit active state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActiveState {
    Active,
    Reloading,
    Inactive,
    Failed,
    Activating,
    Deactivating,
    Maintenance,
    Refreshing,
}

impl FromStr for ActiveState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ActiveState::Active),
            "reloading" => Ok(ActiveState::Reloading),
            "inactive" => Ok(ActiveState::Inactive),
            "failed" => Ok(ActiveState::Failed),
            "activating" => Ok(ActiveState::Activating),
            "deactivating" => Ok(ActiveState::Deactivating),
            "maintenance" => Ok(ActiveState::Maintenance),
            "refreshing" => Ok(ActiveState::Refreshing),
            other => Err(format!("unknown ActiveState '{}'", other)),
        }
    }
}

impl std::fmt::Display for ActiveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActiveState::Active => "active",
            ActiveState::Reloading => "reloading",
            ActiveState::Inactive => "inactive",
            ActiveState::Failed => "failed",
            ActiveState::Activating => "activating",
            ActiveState::Deactivating => "deactivating",
            ActiveState::Maintenance => "maintenance",
            ActiveState::Refreshing => "refreshing",
        };
        f.write_str(s)
    }
}

/// Parsed state of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitState {
    pub load_state: LoadState,
    pub active_state: ActiveState,
    /// Sub state (running, exited, dead, ...). Free-form, varies by unit type.
    pub sub_state: String,
}

impl UnitState {
    /// Parse `systemctl show --property=LoadState,ActiveState,SubState` output.
    pub fn parse(unit: &str, output: &str) -> Result<Self, SupervisorError> {
        let mut load_state = None;
        let mut active_state = None;
        let mut sub_state = None;

        let invalid = |reason: String| SupervisorError::UnexpectedOutput {
            unit: unit.to_string(),
            reason,
        };

        for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let Some((key, value)) = line.split_once('=') else {
                return Err(invalid(format!("malformed line '{}'", line)));
            };
            match key {
                "LoadState" => load_state = Some(value.parse::<LoadState>().map_err(invalid)?),
                "ActiveState" => active_state = Some(value.parse::<ActiveState>().map_err(invalid)?),
                "SubState" => sub_state = Some(value.to_string()),
                _ => {}
            }
        }

        Ok(Self {
            load_state: load_state.ok_or_else(|| invalid("missing LoadState".to_string()))?,
            active_state: active_state.ok_or_else(|| invalid("missing ActiveState".to_string()))?,
            sub_state: sub_state.ok_or_else(|| invalid("missing SubState".to_string()))?,
        })
    }

    /// Whether the unit counts as up. Transitional "on the way up" states count.
    pub fn is_running(&self) -> bool {
        self.load_state == LoadState::Loaded
            && matches!(
                self.active_state,
                ActiveState::Active | ActiveState::Reloading | ActiveState::Activating
            )
    }

    /// Short description, e.g. `failed (exited)` or `unit not found`.
    pub fn describe(&self) -> String {
        match self.load_state {
            LoadState::NotFound => "unit not found".to_string(),
            LoadState::Masked => "unit masked".to_string(),
            _ => format!("{} ({})", self.active_state, self.sub_state),
        }
    }
}
