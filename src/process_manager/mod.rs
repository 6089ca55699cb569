// Process manager: launches, tracks, binds and terminates managed processes

mod args;

pub use args::split_arguments;

use crate::error::{Error, Result};
use crate::event_bus::EventBus;
use crate::models::{Event, ProcessRecord, ProcessState};
use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{info, warn};

struct Tracked {
    record: ProcessRecord,
    child: Child,
}

/// Sole owner of the managed-process table. Cloning shares the table.
#[derive(Clone)]
pub struct ProcessManager {
    table: Arc<Mutex<HashMap<u32, Tracked>>>,
    bus: Arc<EventBus>,
}

impl ProcessManager {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            table: Arc::new(Mutex::new(HashMap::new())),
            bus,
        }
    }

    /// Launch `path` with `arguments` and track it as Running, bound to `interface_id`.
    /// Nothing is recorded or published when the launch fails.
    pub async fn start_process(
        &self,
        path: &str,
        arguments: Option<&str>,
        interface_id: &str,
    ) -> Result<ProcessRecord> {
        info!(
            path,
            arguments = arguments.unwrap_or(""),
            interface_id,
            "Starting process"
        );
        let launch_failure = |reason: String| Error::LaunchFailure {
            path: path.to_string(),
            reason,
        };
        if path.trim().is_empty() {
            return Err(launch_failure("empty executable path".into()));
        }

        let mut cmd = Command::new(path);
        cmd.args(split_arguments(arguments.unwrap_or("")))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        // Keep terminal signals aimed at us away from the child.
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn().map_err(|e| launch_failure(e.to_string()))?;
        let pid = child
            .id()
            .ok_or_else(|| launch_failure("process exited before a PID was assigned".into()))?;

        let record = ProcessRecord {
            pid,
            name: process_name(path),
            executable_path: path.to_string(),
            arguments: arguments.map(str::to_string),
            bound_interface_id: interface_id.to_string(),
            state: ProcessState::Running,
            started_at: Utc::now(),
        };
        self.table.lock().await.insert(
            pid,
            Tracked {
                record: record.clone(),
                child,
            },
        );

        info!(pid, name = %record.name, "Process started");
        self.bus
            .emit(Event::process_state_changed(pid, ProcessState::Running));
        Ok(record)
    }

    /// Every tracked record, oldest first. No OS liveness check; see [`Self::reconcile`].
    pub async fn get_managed_processes(&self) -> Vec<ProcessRecord> {
        let table = self.table.lock().await;
        let mut records: Vec<ProcessRecord> = table.values().map(|t| t.record.clone()).collect();
        records.sort_by(|a, b| a.started_at.cmp(&b.started_at).then(a.pid.cmp(&b.pid)));
        records
    }

    pub async fn get_process(&self, pid: u32) -> Option<ProcessRecord> {
        self.table.lock().await.get(&pid).map(|t| t.record.clone())
    }

    /// Kill a tracked process, wait for the OS to confirm exit, then drop the record and
    /// publish `Terminated`.
    ///
    /// A process that already exited on its own yields [`Error::NotRunning`]; its record is
    /// dropped and `Terminated` is published all the same.
    pub async fn terminate_process(&self, pid: u32) -> Result<()> {
        let mut table = self.table.lock().await;
        let Some(tracked) = table.get_mut(&pid) else {
            warn!(pid, "terminate: process not tracked");
            return Err(Error::process_not_found(pid));
        };

        match tracked.child.try_wait() {
            Ok(Some(status)) => {
                table.remove(&pid);
                drop(table);
                warn!(pid, %status, "terminate: process had already exited");
                self.bus
                    .emit(Event::process_state_changed(pid, ProcessState::Terminated));
                return Err(Error::NotRunning(pid));
            }
            Ok(None) => {}
            Err(e) => warn!(pid, error = %e, "terminate: status check failed"),
        }

        if let Err(e) = tracked.child.kill().await {
            warn!(pid, error = %e, "terminate: kill failed");
            return Err(Error::KillFailed {
                pid,
                reason: e.to_string(),
            });
        }

        table.remove(&pid);
        drop(table);
        info!(pid, "Process terminated");
        self.bus
            .emit(Event::process_state_changed(pid, ProcessState::Terminated));
        Ok(())
    }

    /// Record `interface_id` as the advisory binding. Lifecycle state is unchanged and is
    /// republished as-is.
    pub async fn bind_to_interface(&self, pid: u32, interface_id: &str) -> Result<ProcessRecord> {
        let record = self.set_binding(pid, interface_id.to_string()).await?;
        info!(pid, interface_id, "Process bound");
        Ok(record)
    }

    pub async fn unbind(&self, pid: u32) -> Result<ProcessRecord> {
        let record = self.set_binding(pid, String::new()).await?;
        info!(pid, "Process unbound");
        Ok(record)
    }

    async fn set_binding(&self, pid: u32, interface_id: String) -> Result<ProcessRecord> {
        let record = {
            let mut table = self.table.lock().await;
            let tracked = table
                .get_mut(&pid)
                .ok_or_else(|| Error::process_not_found(pid))?;
            tracked.record.bound_interface_id = interface_id;
            tracked.record.clone()
        };
        self.bus
            .emit(Event::process_state_changed(pid, record.state));
        Ok(record)
    }

    /// Drop records whose OS process has exited, publishing `Terminated` for each.
    /// Returns the reaped PIDs.
    pub async fn reconcile(&self) -> Vec<u32> {
        let reaped: Vec<u32> = {
            let mut table = self.table.lock().await;
            let exited: Vec<u32> = table
                .iter_mut()
                .filter_map(|(pid, t)| match t.child.try_wait() {
                    Ok(Some(status)) => {
                        tracing::debug!(pid, %status, "process exited");
                        Some(*pid)
                    }
                    Ok(None) => None,
                    Err(e) => {
                        warn!(pid, error = %e, "liveness check failed");
                        None
                    }
                })
                .collect();
            for pid in &exited {
                table.remove(pid);
            }
            exited
        };
        for pid in &reaped {
            self.bus
                .emit(Event::process_state_changed(*pid, ProcessState::Terminated));
        }
        reaped
    }

    /// Terminate every tracked process. Returns how many were killed.
    pub async fn shutdown(&self) -> usize {
        let pids: Vec<u32> = self.table.lock().await.keys().copied().collect();
        let mut killed = 0;
        for pid in pids {
            match self.terminate_process(pid).await {
                Ok(()) => killed += 1,
                Err(e) => tracing::debug!(pid, error = %e, "shutdown: terminate skipped"),
            }
        }
        killed
    }

    pub async fn len(&self) -> usize {
        self.table.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.table.lock().await.is_empty()
    }
}

fn process_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(path)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::process_name;

    #[test]
    fn process_name_is_file_stem() {
        assert_eq!(process_name("/usr/bin/curl"), "curl");
        assert_eq!(process_name("C:/Tools/app.exe"), "app");
        assert_eq!(process_name("sleep"), "sleep");
    }
}
