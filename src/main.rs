use anyhow::Result;
use netbind::event_bus::handler;
use netbind::models::{Event, EventKind};
use netbind::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    tracing::info!(
        "{} v{} starting",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    let app_config = config::AppConfig::load()?;
    let services = services::Services::new(&app_config).await;

    // Stand-in for a view: log the change and re-query what it refers to.
    let registry = services.registry.clone();
    let on_interface = handler(move |event| {
        if let Event::InterfaceChanged { interface_id } = event {
            tracing::info!(interface_id = %interface_id, "interface changed");
        }
        tracing::debug!(cached = registry.cached_count(), "interface cache size");
        Ok(())
    });
    let on_process = handler(|event| {
        if let Event::ProcessStateChanged { pid, state } = event {
            tracing::info!(pid, %state, "process state changed");
        }
        Ok(())
    });
    services
        .bus
        .subscribe(EventKind::InterfaceChanged, on_interface.clone());
    services
        .bus
        .subscribe(EventKind::ProcessStateChanged, on_process.clone());

    match services.registry.list_interfaces().await {
        Ok(interfaces) => {
            for iface in &interfaces {
                let info = iface.read();
                tracing::info!(
                    interface_id = %info.id,
                    status = ?info.status,
                    adapter_type = ?info.adapter_type,
                    addresses = info.ip_addresses.len(),
                    "interface"
                );
            }
        }
        Err(e) => tracing::warn!(error = %e, "initial interface enumeration failed"),
    }
    for profile in services.profiles.list().await {
        tracing::info!(
            profile_id = %profile.id,
            name = %profile.name,
            interface_id = %profile.interface_id,
            "profile"
        );
    }

    if app_config.monitoring.auto_start {
        services.registry.start_monitoring().await;
    }
    services.start_reconciler().await;

    shutdown_signal().await;
    tracing::info!("Received shutdown signal");

    services
        .bus
        .unsubscribe(EventKind::InterfaceChanged, &on_interface);
    services.shutdown().await;
    services
        .bus
        .unsubscribe(EventKind::ProcessStateChanged, &on_process);
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        ) {
            Ok(s) => s,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
