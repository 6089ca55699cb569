// Network interface snapshot, read-only handle and counters

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

/// Adapter type; serializes to lowercase JSON (e.g. "wireless").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterType {
    Wired,
    Wireless,
    Loopback,
    Tunnel,
    Other,
}

/// Operational status as reported by the OS (RFC 2863 operstate values).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InterfaceStatus {
    Up,
    Down,
    Testing,
    Unknown,
    Dormant,
    NotPresent,
    LowerLayerDown,
}

impl InterfaceStatus {
    /// Parse a Linux `operstate` string ("up", "lowerlayerdown", ...).
    pub fn from_operstate(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "up" => InterfaceStatus::Up,
            "down" => InterfaceStatus::Down,
            "testing" => InterfaceStatus::Testing,
            "dormant" => InterfaceStatus::Dormant,
            "notpresent" => InterfaceStatus::NotPresent,
            "lowerlayerdown" => InterfaceStatus::LowerLayerDown,
            _ => InterfaceStatus::Unknown,
        }
    }
}

/// One interface as the OS reports it at enumeration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub adapter_type: AdapterType,
    pub status: InterfaceStatus,
    pub ip_addresses: Vec<IpAddr>,
    pub mac_address: String,
    pub mtu: u64,
    /// Link speed in bits per second; 0 when unknown.
    pub speed: u64,
    pub index: u32,
    pub gateways: Vec<IpAddr>,
    pub dns_servers: Vec<IpAddr>,
}

impl InterfaceInfo {
    /// Minimal snapshot with neutral attributes; sources fill in what they know.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            description: id.clone(),
            id,
            adapter_type: AdapterType::Other,
            status: InterfaceStatus::Unknown,
            ip_addresses: Vec::new(),
            mac_address: String::new(),
            mtu: 0,
            speed: 0,
            index: 0,
            gateways: Vec::new(),
            dns_servers: Vec::new(),
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == InterfaceStatus::Up
    }
}

/// Read-only view onto a cached snapshot.
///
/// The registry updates the snapshot behind the handle in place on every refresh, so a
/// handle obtained earlier observes later refreshes without being re-resolved. Cloning a
/// handle shares the snapshot; it never copies it.
#[derive(Debug, Clone)]
pub struct InterfaceHandle {
    inner: Arc<RwLock<InterfaceInfo>>,
}

impl InterfaceHandle {
    pub(crate) fn new(info: InterfaceInfo) -> Self {
        Self {
            inner: Arc::new(RwLock::new(info)),
        }
    }

    /// Overwrite every attribute except the identifier.
    pub(crate) fn update(&self, info: InterfaceInfo) -> bool {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        debug_assert_eq!(guard.id, info.id);
        if *guard == info {
            return false;
        }
        let id = std::mem::take(&mut guard.id);
        *guard = InterfaceInfo { id, ..info };
        true
    }

    /// True when both handles point at the same cached snapshot.
    pub fn same_snapshot(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Borrow the current snapshot; hold the guard briefly, refreshes wait on it.
    pub fn read(&self) -> RwLockReadGuard<'_, InterfaceInfo> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Value copy of the current snapshot.
    pub fn snapshot(&self) -> InterfaceInfo {
        self.read().clone()
    }

    pub fn id(&self) -> String {
        self.read().id.clone()
    }

    pub fn name(&self) -> String {
        self.read().name.clone()
    }

    pub fn status(&self) -> InterfaceStatus {
        self.read().status
    }

    pub fn adapter_type(&self) -> AdapterType {
        self.read().adapter_type
    }

    pub fn ip_addresses(&self) -> Vec<IpAddr> {
        self.read().ip_addresses.clone()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceStatistics {
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub packets_received: u64,
    pub packets_sent: u64,
    pub in_errors: u64,
    pub out_errors: u64,
}
