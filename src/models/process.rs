// Managed process record and lifecycle state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Canonical lifecycle state; serializes to lowercase JSON (e.g. "running").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessState {
    Running,
    /// Only reachable through mechanisms outside the manager.
    Suspended,
    Terminated,
    #[serde(other)]
    Unknown,
}

impl ProcessState {
    pub fn label(&self) -> &'static str {
        match self {
            ProcessState::Running => "running",
            ProcessState::Suspended => "suspended",
            ProcessState::Terminated => "terminated",
            ProcessState::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A process launched through the manager. Equality and hashing use the PID only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub executable_path: String,
    pub arguments: Option<String>,
    /// Advisory binding; empty when unbound.
    pub bound_interface_id: String,
    pub state: ProcessState,
    pub started_at: DateTime<Utc>,
}

impl ProcessRecord {
    pub fn is_bound(&self) -> bool {
        !self.bound_interface_id.is_empty()
    }
}

impl PartialEq for ProcessRecord {
    fn eq(&self, other: &Self) -> bool {
        self.pid == other.pid
    }
}

impl Eq for ProcessRecord {}

impl Hash for ProcessRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pid.hash(state);
    }
}
