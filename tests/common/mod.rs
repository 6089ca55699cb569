// Shared test helpers
#![allow(dead_code)]

use netbind::error::{Error, Result};
use netbind::event_bus::{EventBus, Handler, handler};
use netbind::interface_registry::{InterfaceRegistry, InterfaceSource};
use netbind::models::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted interface source: tests edit the interface list between calls.
#[derive(Default)]
pub struct FakeSource {
    interfaces: Mutex<Vec<InterfaceInfo>>,
    statistics: Mutex<HashMap<String, InterfaceStatistics>>,
    fail: Mutex<bool>,
    enumerations: Mutex<usize>,
}

impl FakeSource {
    pub fn with(interfaces: Vec<InterfaceInfo>) -> Arc<Self> {
        let source = Self::default();
        *source.interfaces.lock().unwrap() = interfaces;
        Arc::new(source)
    }

    pub fn set(&self, interfaces: Vec<InterfaceInfo>) {
        *self.interfaces.lock().unwrap() = interfaces;
    }

    pub fn edit(&self, f: impl FnOnce(&mut Vec<InterfaceInfo>)) {
        f(&mut self.interfaces.lock().unwrap());
    }

    pub fn set_statistics(&self, id: &str, stats: InterfaceStatistics) {
        self.statistics.lock().unwrap().insert(id.to_string(), stats);
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn enumerations(&self) -> usize {
        *self.enumerations.lock().unwrap()
    }
}

impl InterfaceSource for FakeSource {
    fn enumerate(&self) -> Result<Vec<InterfaceInfo>> {
        *self.enumerations.lock().unwrap() += 1;
        if *self.fail.lock().unwrap() {
            return Err(Error::EnumerationFailure("scripted failure".into()));
        }
        Ok(self.interfaces.lock().unwrap().clone())
    }

    fn statistics(&self, id: &str) -> Result<Option<InterfaceStatistics>> {
        if *self.fail.lock().unwrap() {
            return Err(Error::EnumerationFailure("scripted failure".into()));
        }
        let present = self.interfaces.lock().unwrap().iter().any(|i| i.id == id);
        if !present {
            return Ok(None);
        }
        Ok(Some(
            self.statistics
                .lock()
                .unwrap()
                .get(id)
                .copied()
                .unwrap_or_default(),
        ))
    }
}

pub fn iface(id: &str, adapter_type: AdapterType, status: InterfaceStatus) -> InterfaceInfo {
    InterfaceInfo {
        adapter_type,
        status,
        ..InterfaceInfo::new(id)
    }
}

pub fn eth0() -> InterfaceInfo {
    InterfaceInfo {
        ip_addresses: vec!["192.168.1.10".parse().unwrap()],
        mac_address: "aa:bb:cc:dd:ee:01".into(),
        mtu: 1500,
        speed: 1_000_000_000,
        index: 2,
        gateways: vec!["192.168.1.1".parse().unwrap()],
        dns_servers: vec!["1.1.1.1".parse().unwrap()],
        ..iface("eth0", AdapterType::Wired, InterfaceStatus::Up)
    }
}

pub fn wlan0() -> InterfaceInfo {
    InterfaceInfo {
        index: 3,
        ..iface("wlan0", AdapterType::Wireless, InterfaceStatus::Down)
    }
}

pub fn lo() -> InterfaceInfo {
    InterfaceInfo {
        ip_addresses: vec!["127.0.0.1".parse().unwrap()],
        index: 1,
        ..iface("lo", AdapterType::Loopback, InterfaceStatus::Up)
    }
}

pub fn registry_with(source: Arc<FakeSource>) -> (InterfaceRegistry, Arc<EventBus>) {
    let bus = Arc::new(EventBus::new());
    let registry = InterfaceRegistry::new(source, bus.clone(), Duration::from_millis(20));
    (registry, bus)
}

/// Subscribe a handler that records every event of `kind`.
pub fn record(bus: &EventBus, kind: EventKind) -> (Handler, Arc<Mutex<Vec<Event>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let h = handler(move |event| {
        sink.lock().unwrap().push(event.clone());
        Ok(())
    });
    bus.subscribe(kind, h.clone());
    (h, seen)
}

pub fn test_config(profiles_path: &std::path::Path) -> netbind::config::AppConfig {
    netbind::config::AppConfig::load_from_str(&format!(
        r#"
[profiles]
path = "{}"

[monitoring]
interface_poll_interval_ms = 20
liveness_interval_ms = 20
"#,
        profiles_path.display().to_string().replace('\\', "/")
    ))
    .unwrap()
}
