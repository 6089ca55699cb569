// Error taxonomy shared by the registry, the process manager and the profile store

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Requested interface, process or profile identifier is absent.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The OS refused to start a process (bad path, permissions).
    #[error("failed to start {path}: {reason}")]
    LaunchFailure { path: String, reason: String },

    /// The OS refused to kill a tracked process.
    #[error("failed to kill process {pid}: {reason}")]
    KillFailed { pid: u32, reason: String },

    /// Interface or statistics query failed.
    #[error("interface enumeration failed: {0}")]
    EnumerationFailure(String),

    /// Profile document could not be written.
    #[error("profile persistence failed: {0}")]
    PersistenceFailure(String),

    #[error("profile already exists: {0}")]
    DuplicateProfile(String),

    /// Tracked process exited before the requested operation reached it.
    #[error("process {0} is no longer running")]
    NotRunning(u32),
}

impl Error {
    pub fn interface_not_found(id: impl Into<String>) -> Self {
        Error::NotFound {
            kind: "interface",
            id: id.into(),
        }
    }

    pub fn process_not_found(pid: u32) -> Self {
        Error::NotFound {
            kind: "process",
            id: pid.to_string(),
        }
    }

    pub fn profile_not_found(id: impl Into<String>) -> Self {
        Error::NotFound {
            kind: "profile",
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
