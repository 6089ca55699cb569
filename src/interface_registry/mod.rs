// Network interface registry: identity-keyed snapshot cache over the OS interface list

mod linux;
mod source;

pub use source::{InterfaceSource, SysinfoInterfaceSource};

use crate::error::{Error, Result};
use crate::event_bus::EventBus;
use crate::models::{AdapterType, Event, InterfaceHandle, InterfaceInfo, InterfaceStatistics};
use crate::worker;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::time::Duration;
use tracing::instrument;

type Cache = HashMap<String, InterfaceHandle>;

/// Last interface state the change watcher published against.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    last_seen: Option<HashMap<String, InterfaceInfo>>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `current` and return the ids that appeared, changed or vanished since the last
    /// call. The first call only records a baseline.
    pub fn diff(&mut self, current: Vec<InterfaceInfo>) -> Vec<String> {
        let current: HashMap<String, InterfaceInfo> =
            current.into_iter().map(|i| (i.id.clone(), i)).collect();
        let mut changed: Vec<String> = match &self.last_seen {
            None => Vec::new(),
            Some(previous) => current
                .iter()
                .filter(|(id, info)| previous.get(*id) != Some(*info))
                .map(|(id, _)| id.clone())
                .chain(
                    previous
                        .keys()
                        .filter(|id| !current.contains_key(*id))
                        .cloned(),
                )
                .collect(),
        };
        self.last_seen = Some(current);
        changed.sort();
        changed
    }
}

struct MonitorHandle {
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
    handle: tokio::task::JoinHandle<()>,
}

#[derive(Clone)]
pub struct InterfaceRegistry {
    source: Arc<dyn InterfaceSource>,
    cache: Arc<Mutex<Cache>>,
    bus: Arc<EventBus>,
    poll_interval: Duration,
    monitor: Arc<tokio::sync::Mutex<Option<MonitorHandle>>>,
}

impl InterfaceRegistry {
    pub fn new(source: Arc<dyn InterfaceSource>, bus: Arc<EventBus>, poll_interval: Duration) -> Self {
        Self {
            source,
            cache: Arc::new(Mutex::new(HashMap::new())),
            bus,
            poll_interval,
            monitor: Arc::new(tokio::sync::Mutex::new(None)),
        }
    }

    /// Fresh enumeration merged into the cache: new ids get a snapshot, known ids are updated
    /// in place, vanished ids are evicted. Returns handles in enumeration order.
    #[instrument(skip(self), fields(registry = "interfaces", operation = "list_interfaces"))]
    pub async fn list_interfaces(&self) -> Result<Vec<InterfaceHandle>> {
        let source = self.source.clone();
        let cache = self.cache.clone();
        tokio::task::spawn_blocking(move || sync_cache(source.as_ref(), &cache))
            .await
            .map_err(|e| Error::EnumerationFailure(format!("enumeration task join: {}", e)))?
    }

    /// Refreshed snapshot for `id`, or `None` when the OS no longer reports it (a stale cache
    /// entry for a vanished interface is evicted, never returned).
    #[instrument(skip(self), fields(registry = "interfaces", operation = "get_interface"))]
    pub async fn get_interface(&self, id: &str) -> Result<Option<InterfaceHandle>> {
        let source = self.source.clone();
        let cache = self.cache.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let mut cache = lock_cache(&cache)?;
            let live = source.enumerate()?;
            match live.into_iter().find(|i| i.id == id) {
                Some(info) => Ok(Some(upsert(&mut cache, info))),
                None => {
                    if cache.remove(&id).is_some() {
                        tracing::debug!(interface_id = %id, "evicted vanished interface");
                    }
                    Ok(None)
                }
            }
        })
        .await
        .map_err(|e| Error::EnumerationFailure(format!("enumeration task join: {}", e)))?
    }

    pub async fn list_active_interfaces(&self) -> Result<Vec<InterfaceHandle>> {
        let all = self.list_interfaces().await?;
        Ok(all.into_iter().filter(|h| h.read().is_up()).collect())
    }

    pub async fn list_interfaces_by_type(
        &self,
        adapter_type: AdapterType,
    ) -> Result<Vec<InterfaceHandle>> {
        let all = self.list_interfaces().await?;
        Ok(all
            .into_iter()
            .filter(|h| h.adapter_type() == adapter_type)
            .collect())
    }

    /// One-shot counter read straight from the OS; never cached.
    #[instrument(skip(self), fields(registry = "interfaces", operation = "get_statistics"))]
    pub async fn get_statistics(&self, id: &str) -> Result<InterfaceStatistics> {
        let source = self.source.clone();
        let owned = id.to_string();
        let stats = tokio::task::spawn_blocking(move || source.statistics(&owned))
            .await
            .map_err(|e| Error::EnumerationFailure(format!("statistics task join: {}", e)))??;
        stats.ok_or_else(|| Error::interface_not_found(id))
    }

    /// Refresh the cache and publish `InterfaceChanged` for every id that `tracker` reports as
    /// appeared, changed or vanished. Returns the published ids.
    pub async fn refresh_and_notify(&self, tracker: &mut ChangeTracker) -> Result<Vec<String>> {
        let handles = self.list_interfaces().await?;
        let changed = tracker.diff(handles.iter().map(InterfaceHandle::snapshot).collect());
        for id in &changed {
            tracing::debug!(interface_id = %id, "interface changed");
            self.bus.emit(Event::interface_changed(id.clone()));
        }
        Ok(changed)
    }

    /// Start the change watcher. Idempotent; always succeeds.
    pub async fn start_monitoring(&self) -> bool {
        let mut monitor = self.monitor.lock().await;
        if monitor.is_some() {
            return true;
        }
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let handle = worker::spawn_interface_watcher(
            self.clone(),
            worker::WatcherConfig {
                poll_interval: self.poll_interval,
            },
            shutdown_rx,
        );
        *monitor = Some(MonitorHandle {
            shutdown_tx,
            handle,
        });
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Interface monitoring started"
        );
        true
    }

    /// Stop the change watcher; no notification is published after this returns.
    pub async fn stop_monitoring(&self) {
        let Some(MonitorHandle {
            shutdown_tx,
            handle,
        }) = self.monitor.lock().await.take()
        else {
            return;
        };
        let _ = shutdown_tx.send(());
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "interface watcher join failed");
        }
        tracing::info!("Interface monitoring stopped");
    }

    pub async fn is_monitoring(&self) -> bool {
        self.monitor.lock().await.is_some()
    }

    /// Number of cached snapshots (no enumeration).
    pub fn cached_count(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }
}

fn lock_cache(cache: &Mutex<Cache>) -> Result<std::sync::MutexGuard<'_, Cache>> {
    cache
        .lock()
        .map_err(|e| Error::EnumerationFailure(format!("interface cache lock poisoned: {}", e)))
}

/// Insert a new snapshot or update the cached one in place.
fn upsert(cache: &mut Cache, info: InterfaceInfo) -> InterfaceHandle {
    match cache.get(&info.id) {
        Some(handle) => {
            if handle.update(info) {
                tracing::trace!(interface_id = %handle.id(), "snapshot updated");
            }
            handle.clone()
        }
        None => {
            let handle = InterfaceHandle::new(info);
            cache.insert(handle.id(), handle.clone());
            handle
        }
    }
}

/// Holds the cache lock across enumeration so concurrent refreshes apply in order. A failed
/// enumeration leaves the cache untouched.
fn sync_cache(source: &dyn InterfaceSource, cache: &Mutex<Cache>) -> Result<Vec<InterfaceHandle>> {
    let mut cache = lock_cache(cache)?;
    let live = source.enumerate()?;
    let live_ids: HashSet<String> = live.iter().map(|i| i.id.clone()).collect();

    let handles: Vec<InterfaceHandle> = live
        .into_iter()
        .map(|info| upsert(&mut cache, info))
        .collect();

    let before = cache.len();
    cache.retain(|id, _| live_ids.contains(id));
    let pruned = before - cache.len();
    tracing::debug!(
        interfaces = handles.len(),
        pruned,
        "interface cache synchronised"
    );
    Ok(handles)
}
