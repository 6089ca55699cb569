// Composition point: one bus, registry, process manager and profile store per process

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::event_bus::EventBus;
use crate::interface_registry::{InterfaceRegistry, InterfaceSource, SysinfoInterfaceSource};
use crate::models::ProcessRecord;
use crate::process_manager::ProcessManager;
use crate::profile_store::ProfileStore;
use crate::worker;
use std::sync::Arc;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;

pub struct Services {
    pub bus: Arc<EventBus>,
    pub registry: InterfaceRegistry,
    pub processes: ProcessManager,
    pub profiles: Arc<ProfileStore>,
    liveness_interval: std::time::Duration,
    reconciler: Mutex<Option<(oneshot::Sender<()>, JoinHandle<()>)>>,
}

impl Services {
    pub async fn new(config: &AppConfig) -> Self {
        Self::with_source(config, Arc::new(SysinfoInterfaceSource::new())).await
    }

    /// Same as [`Services::new`] with a caller-supplied interface source.
    pub async fn with_source(config: &AppConfig, source: Arc<dyn InterfaceSource>) -> Self {
        let bus = Arc::new(EventBus::new());
        let registry = InterfaceRegistry::new(
            source,
            bus.clone(),
            config.monitoring.interface_poll_interval(),
        );
        let processes = ProcessManager::new(bus.clone());
        let profiles = Arc::new(ProfileStore::load(&config.profiles.path).await);
        Self {
            bus,
            registry,
            processes,
            profiles,
            liveness_interval: config.monitoring.liveness_interval(),
            reconciler: Mutex::new(None),
        }
    }

    /// Start the saved profile `id`: its executable, arguments and interface binding.
    pub async fn launch_profile(&self, id: &str) -> Result<ProcessRecord> {
        let profile = self
            .profiles
            .get(id)
            .await
            .ok_or_else(|| Error::profile_not_found(id))?;
        tracing::info!(profile = %profile.name, "Launching profile");
        self.processes
            .start_process(
                &profile.executable_path,
                profile.arguments.as_deref(),
                &profile.interface_id,
            )
            .await
    }

    /// Spawn the liveness reconciler. Idempotent.
    pub async fn start_reconciler(&self) {
        let mut slot = self.reconciler.lock().await;
        if slot.is_some() {
            return;
        }
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = worker::spawn_liveness_reconciler(
            self.processes.clone(),
            worker::ReconcilerConfig {
                liveness_interval: self.liveness_interval,
            },
            shutdown_rx,
        );
        *slot = Some((shutdown_tx, handle));
    }

    pub async fn stop_reconciler(&self) {
        if let Some((shutdown_tx, handle)) = self.reconciler.lock().await.take() {
            let _ = shutdown_tx.send(());
            let _ = handle.await;
        }
    }

    /// Stop background tasks and kill every managed process.
    pub async fn shutdown(&self) {
        self.registry.stop_monitoring().await;
        self.stop_reconciler().await;
        let killed = self.processes.shutdown().await;
        tracing::info!(killed, "Services shut down");
    }
}
