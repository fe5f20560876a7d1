//! Final ordering of each flow's results.
use crate::types::{numeric_key, DiscoveredDevice, Vulnerability};

/// Ascending by [`numeric_key`] of the device IP.
pub fn order_devices(mut devices: Vec<DiscoveredDevice>) -> Vec<DiscoveredDevice> {
    devices.sort_by_key(|d| numeric_key(&d.ip));
    devices
}

/// Lexicographic by device IP string, then by port so equal IPs have a stable order.
pub fn order_vulnerabilities(mut vulns: Vec<Vulnerability>) -> Vec<Vulnerability> {
    vulns.sort_by(|a, b| a.device_ip.cmp(&b.device_ip).then(a.port.cmp(&b.port)));
    vulns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::VulnerabilityCatalog;

    fn device(ip: &str) -> DiscoveredDevice {
        DiscoveredDevice {
            ip: ip.into(),
            mac: "N/A".into(),
            name: "Unknown Device".into(),
            open_ports: vec![],
        }
    }

    #[test]
    fn devices_sort_numerically() {
        let out = order_devices(vec![
            device("192.168.1.20"),
            device("192.168.1.3"),
            device("192.168.1.100"),
            device("192.168.1.1"),
        ]);
        let ips: Vec<_> = out.iter().map(|d| d.ip.as_str()).collect();
        assert_eq!(ips, vec!["192.168.1.1", "192.168.1.3", "192.168.1.20", "192.168.1.100"]);
    }

    #[test]
    fn vulnerabilities_sort_as_strings() {
        let c = VulnerabilityCatalog::builtin();
        let out = order_vulnerabilities(vec![
            c.finding("192.168.1.3", 80).unwrap(),
            c.finding("192.168.1.20", 22).unwrap(),
            c.finding("192.168.1.100", 23).unwrap(),
            c.finding("192.168.1.20", 21).unwrap(),
        ]);
        let keys: Vec<_> = out.iter().map(|v| (v.device_ip.as_str(), v.port)).collect();
        assert_eq!(
            keys,
            vec![
                ("192.168.1.100", 23),
                ("192.168.1.20", 21),
                ("192.168.1.20", 22),
                ("192.168.1.3", 80),
            ]
        );
    }

    #[test]
    fn empty_is_valid() {
        assert!(order_devices(vec![]).is_empty());
        assert!(order_vulnerabilities(vec![]).is_empty());
    }
}
