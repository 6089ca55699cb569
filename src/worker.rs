// Background tasks: interface change watcher and process liveness reconciler.
// Both tick on an interval and stop when their oneshot shutdown fires.

use crate::interface_registry::{ChangeTracker, InterfaceRegistry};
use crate::process_manager::ProcessManager;
use tokio::sync::oneshot;
use tokio::time::{Duration, Instant, interval};

/// Rate limit for repeated enumeration failure warnings.
const ENUMERATION_WARN_INTERVAL: Duration = Duration::from_secs(60);

pub struct WatcherConfig {
    pub poll_interval: Duration,
}

pub struct ReconcilerConfig {
    pub liveness_interval: Duration,
}

/// Polls the interface list and publishes `InterfaceChanged` for each interface whose snapshot
/// appeared, changed or vanished since the previous tick. The first tick records a baseline.
pub fn spawn_interface_watcher(
    registry: InterfaceRegistry,
    config: WatcherConfig,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = interval(config.poll_interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut tracker = ChangeTracker::new();
        let mut last_failure_warn: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match registry.refresh_and_notify(&mut tracker).await {
                        Ok(changed) if !changed.is_empty() => {
                            tracing::debug!(
                                operation = "watch_interfaces",
                                changed = changed.len(),
                                "interface changes published"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => {
                            let should_warn = last_failure_warn
                                .is_none_or(|t| t.elapsed() >= ENUMERATION_WARN_INTERVAL);
                            if should_warn {
                                tracing::warn!(
                                    error = %e,
                                    operation = "watch_interfaces",
                                    "interface enumeration failed; skipping tick"
                                );
                                last_failure_warn = Some(Instant::now());
                            }
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Interface watcher shutting down");
                    break;
                }
            }
        }
    })
}

/// Removes records whose OS process exited on its own, publishing `Terminated` for each.
pub fn spawn_liveness_reconciler(
    manager: ProcessManager,
    config: ReconcilerConfig,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = interval(config.liveness_interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let reaped = manager.reconcile().await;
                    if !reaped.is_empty() {
                        tracing::info!(
                            operation = "reconcile_processes",
                            reaped = ?reaped,
                            "Removed exited processes"
                        );
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Liveness reconciler shutting down");
                    break;
                }
            }
        }
    })
}
