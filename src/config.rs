use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub profiles: ProfilesConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfilesConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often the interface watcher re-enumerates while monitoring is on.
    pub interface_poll_interval_ms: u64,
    /// How often managed processes are checked for exits nobody asked for.
    pub liveness_interval_ms: u64,
    #[serde(default = "default_auto_start")]
    pub auto_start: bool,
}

fn default_auto_start() -> bool {
    true
}

impl MonitoringConfig {
    pub fn interface_poll_interval(&self) -> Duration {
        Duration::from_millis(self.interface_poll_interval_ms)
    }

    pub fn liveness_interval(&self) -> Duration {
        Duration::from_millis(self.liveness_interval_ms)
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.profiles.path.trim().is_empty(),
            "profiles.path must be non-empty"
        );
        anyhow::ensure!(
            self.monitoring.interface_poll_interval_ms > 0,
            "monitoring.interface_poll_interval_ms must be > 0, got {}",
            self.monitoring.interface_poll_interval_ms
        );
        anyhow::ensure!(
            self.monitoring.liveness_interval_ms > 0,
            "monitoring.liveness_interval_ms must be > 0, got {}",
            self.monitoring.liveness_interval_ms
        );
        Ok(())
    }
}
