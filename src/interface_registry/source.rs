// OS interface enumeration via sysinfo

use super::linux;
use crate::error::{Error, Result};
use crate::models::{AdapterType, InterfaceInfo, InterfaceStatistics};
use std::sync::Mutex;
use sysinfo::{NetworkData, Networks};

/// The platform primitive the registry wraps. Calls block; the registry runs them on the
/// blocking pool.
pub trait InterfaceSource: Send + Sync {
    /// Every interface the OS currently reports, in a stable order.
    fn enumerate(&self) -> Result<Vec<InterfaceInfo>>;

    /// Fresh counters for `id`, or `None` when the OS no longer reports it.
    fn statistics(&self, id: &str) -> Result<Option<InterfaceStatistics>>;
}

pub struct SysinfoInterfaceSource {
    networks: Mutex<Networks>,
}

impl Default for SysinfoInterfaceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoInterfaceSource {
    pub fn new() -> Self {
        Self {
            networks: Mutex::new(Networks::new_with_refreshed_list()),
        }
    }

    fn refreshed(&self) -> Result<std::sync::MutexGuard<'_, Networks>> {
        let mut networks = self
            .networks
            .lock()
            .map_err(|e| Error::EnumerationFailure(format!("sysinfo networks lock poisoned: {}", e)))?;
        networks.refresh(true);
        Ok(networks)
    }
}

impl InterfaceSource for SysinfoInterfaceSource {
    fn enumerate(&self) -> Result<Vec<InterfaceInfo>> {
        let networks = self.refreshed()?;
        let dns_servers = linux::get_dns_servers();
        let mut interfaces: Vec<InterfaceInfo> = networks
            .list()
            .iter()
            .map(|(name, data)| describe(name, data, &dns_servers))
            .collect();
        interfaces.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.id.cmp(&b.id)));
        Ok(interfaces)
    }

    fn statistics(&self, id: &str) -> Result<Option<InterfaceStatistics>> {
        let networks = self.refreshed()?;
        Ok(networks.list().get(id).map(|data| InterfaceStatistics {
            bytes_received: data.total_received(),
            bytes_sent: data.total_transmitted(),
            packets_received: data.total_packets_received(),
            packets_sent: data.total_packets_transmitted(),
            in_errors: data.total_errors_on_received(),
            out_errors: data.total_errors_on_transmitted(),
        }))
    }
}

fn describe(name: &str, data: &NetworkData, dns_servers: &[std::net::IpAddr]) -> InterfaceInfo {
    let adapter_type = linux::get_adapter_type(name);
    let description = linux::get_alias(name).unwrap_or_else(|| match adapter_type {
        AdapterType::Wired => format!("{} (Ethernet)", name),
        AdapterType::Wireless => format!("{} (Wireless)", name),
        AdapterType::Loopback => format!("{} (Loopback)", name),
        AdapterType::Tunnel => format!("{} (Tunnel)", name),
        AdapterType::Other => name.to_string(),
    });
    let dns_servers = if adapter_type == AdapterType::Loopback {
        Vec::new()
    } else {
        dns_servers.to_vec()
    };
    InterfaceInfo {
        id: name.to_string(),
        name: name.to_string(),
        description,
        adapter_type,
        status: linux::get_operstate(name),
        ip_addresses: data.ip_networks().iter().map(|n| n.addr).collect(),
        mac_address: data.mac_address().to_string(),
        mtu: data.mtu(),
        speed: linux::get_interface_speed(name),
        index: linux::get_ifindex(name),
        gateways: linux::get_gateways(name),
        dns_servers,
    }
}
