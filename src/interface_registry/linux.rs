// Linux-specific helpers: /sys/class/net, /proc/net/route, /etc/resolv.conf.

use crate::models::{AdapterType, InterfaceStatus};
use std::net::IpAddr;
#[cfg(target_os = "linux")]
use std::net::Ipv4Addr;

/// Read network interface link speed from /sys/class/net/<interface>/speed (Linux).
/// Returns speed in bits per second, or 0 if unavailable.
pub(super) fn get_interface_speed(interface_name: &str) -> u64 {
    #[cfg(target_os = "linux")]
    {
        if let Some(content) = read_sys_attr(interface_name, "speed")
            && let Ok(mbps) = content.parse::<i64>()
            && mbps > 0
        {
            return (mbps as u64) * 1_000_000;
        }
    }
    #[cfg(not(target_os = "linux"))]
    let _ = interface_name;
    0
}

/// Operational status from /sys/class/net/<interface>/operstate.
pub(super) fn get_operstate(interface_name: &str) -> InterfaceStatus {
    #[cfg(target_os = "linux")]
    {
        if let Some(state) = read_sys_attr(interface_name, "operstate") {
            let status = InterfaceStatus::from_operstate(&state);
            // Loopback reports "unknown" while carrying traffic.
            if status == InterfaceStatus::Unknown && is_flag_up(interface_name) {
                return InterfaceStatus::Up;
            }
            return status;
        }
    }
    #[cfg(not(target_os = "linux"))]
    let _ = interface_name;
    InterfaceStatus::Unknown
}

#[cfg(target_os = "linux")]
fn is_flag_up(interface_name: &str) -> bool {
    const IFF_UP: u32 = 0x1;
    read_sys_attr(interface_name, "flags")
        .and_then(|f| u32::from_str_radix(f.trim_start_matches("0x"), 16).ok())
        .is_some_and(|flags| flags & IFF_UP != 0)
}

/// Adapter type from the ARPHRD code in /sys/class/net/<interface>/type.
pub(super) fn get_adapter_type(interface_name: &str) -> AdapterType {
    #[cfg(target_os = "linux")]
    {
        let base = format!("/sys/class/net/{}", interface_name);
        if std::path::Path::new(&base).join("wireless").exists()
            || std::path::Path::new(&base).join("phy80211").exists()
        {
            return AdapterType::Wireless;
        }
        if let Some(code) = read_sys_attr(interface_name, "type")
            && let Ok(code) = code.parse::<u32>()
        {
            return adapter_type_from_arphrd(code);
        }
    }
    #[cfg(not(target_os = "linux"))]
    let _ = interface_name;
    AdapterType::Other
}

pub(super) fn adapter_type_from_arphrd(code: u32) -> AdapterType {
    match code {
        1 => AdapterType::Wired,
        772 => AdapterType::Loopback,
        // ipip, ip6tnl, sit, gre, ip6gre, none (tun/wireguard)
        768 | 769 | 776 | 778 | 823 | 65534 => AdapterType::Tunnel,
        801..=803 => AdapterType::Wireless,
        _ => AdapterType::Other,
    }
}

pub(super) fn get_ifindex(interface_name: &str) -> u32 {
    #[cfg(target_os = "linux")]
    {
        if let Some(idx) = read_sys_attr(interface_name, "ifindex")
            && let Ok(idx) = idx.parse::<u32>()
        {
            return idx;
        }
    }
    #[cfg(not(target_os = "linux"))]
    let _ = interface_name;
    0
}

/// Interface alias (`ip link set ... alias`), when one is set.
pub(super) fn get_alias(interface_name: &str) -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        read_sys_attr(interface_name, "ifalias")
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = interface_name;
        None
    }
}

/// Default gateways routed through `interface_name`, from /proc/net/route.
pub(super) fn get_gateways(interface_name: &str) -> Vec<IpAddr> {
    #[cfg(target_os = "linux")]
    {
        if let Ok(content) = std::fs::read_to_string("/proc/net/route") {
            return parse_route_gateways(&content, interface_name);
        }
    }
    #[cfg(not(target_os = "linux"))]
    let _ = interface_name;
    Vec::new()
}

/// System resolvers from /etc/resolv.conf; Linux has no per-interface DNS list without
/// a resolver daemon, so every interface reports the same set.
pub(super) fn get_dns_servers() -> Vec<IpAddr> {
    #[cfg(target_os = "linux")]
    {
        if let Ok(content) = std::fs::read_to_string("/etc/resolv.conf") {
            return parse_resolv_conf(&content);
        }
    }
    Vec::new()
}

#[cfg(target_os = "linux")]
fn read_sys_attr(interface_name: &str, attr: &str) -> Option<String> {
    let path = format!("/sys/class/net/{}/{}", interface_name, attr);
    let v = std::fs::read_to_string(path).ok()?;
    let v = v.trim();
    if v.is_empty() {
        return None;
    }
    Some(v.to_string())
}

/// Columns: Iface Destination Gateway Flags ...; addresses are little-endian hex.
#[cfg(target_os = "linux")]
pub(super) fn parse_route_gateways(content: &str, interface_name: &str) -> Vec<IpAddr> {
    const RTF_GATEWAY: u32 = 0x2;
    let mut out = Vec::new();
    for line in content.lines().skip(1) {
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() < 4 || cols[0] != interface_name {
            continue;
        }
        let Ok(flags) = u32::from_str_radix(cols[3], 16) else {
            continue;
        };
        if flags & RTF_GATEWAY == 0 {
            continue;
        }
        if let Ok(raw) = u32::from_str_radix(cols[2], 16) {
            let gw = IpAddr::V4(Ipv4Addr::from(raw.swap_bytes()));
            if !out.contains(&gw) {
                out.push(gw);
            }
        }
    }
    out
}

#[cfg(target_os = "linux")]
pub(super) fn parse_resolv_conf(content: &str) -> Vec<IpAddr> {
    content
        .lines()
        .filter_map(|line| line.trim().strip_prefix("nameserver"))
        .filter_map(|rest| rest.split_whitespace().next())
        .filter_map(|addr| addr.split('%').next()?.parse::<IpAddr>().ok())
        .collect()
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    #[test]
    fn route_table_yields_gateway_for_matching_interface() {
        let table = "Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT\n\
                     eth0\t00000000\t0101A8C0\t0003\t0\t0\t100\t00000000\t0\t0\t0\n\
                     eth0\t0001A8C0\t00000000\t0001\t0\t0\t100\t00FFFFFF\t0\t0\t0\n\
                     wlan0\t00000000\t01000A0A\t0003\t0\t0\t600\t00000000\t0\t0\t0\n";
        assert_eq!(
            parse_route_gateways(table, "eth0"),
            vec!["192.168.1.1".parse::<IpAddr>().unwrap()]
        );
        assert_eq!(
            parse_route_gateways(table, "wlan0"),
            vec!["10.10.0.1".parse::<IpAddr>().unwrap()]
        );
        assert!(parse_route_gateways(table, "lo").is_empty());
    }

    #[test]
    fn resolv_conf_nameservers_in_order() {
        let conf = "# generated\nsearch lan\nnameserver 1.1.1.1\nnameserver fe80::1%eth0\noptions edns0\n";
        assert_eq!(
            parse_resolv_conf(conf),
            vec![
                "1.1.1.1".parse::<IpAddr>().unwrap(),
                "fe80::1".parse::<IpAddr>().unwrap()
            ]
        );
    }

    #[test]
    fn arphrd_codes_map_to_adapter_types() {
        assert_eq!(adapter_type_from_arphrd(1), AdapterType::Wired);
        assert_eq!(adapter_type_from_arphrd(772), AdapterType::Loopback);
        assert_eq!(adapter_type_from_arphrd(65534), AdapterType::Tunnel);
        assert_eq!(adapter_type_from_arphrd(32), AdapterType::Other);
    }
}
