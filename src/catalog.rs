use crate::types::{Severity, Vulnerability};
use std::collections::BTreeMap;

/// Static metadata for one security-relevant TCP port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub description: &'static str,
    pub severity: Severity,
    pub risk_info: &'static str,
}

/// The fixed set of ports the security flow probes. Built once and shared read-only.
#[derive(Debug, Clone)]
pub struct VulnerabilityCatalog {
    entries: BTreeMap<u16, CatalogEntry>,
}

const DEFAULT_ENTRIES: &[(u16, &str, Severity, &str)] = &[
    (
        21,
        "FTP",
        Severity::Medium,
        "FTP is an unencrypted protocol for file transfer. An attacker could potentially intercept data or credentials.",
    ),
    (
        22,
        "SSH",
        Severity::Low,
        "SSH provides secure remote access. Ensure it is protected with a strong password or key-based authentication.",
    ),
    (
        23,
        "Telnet",
        Severity::High,
        "Telnet is an unencrypted remote access protocol. An attacker can easily intercept all communication, including passwords.",
    ),
    (
        80,
        "HTTP",
        Severity::Low,
        "An unencrypted web server is running. While common, sensitive information should always be sent over HTTPS (port 443).",
    ),
    (
        445,
        "SMB",
        Severity::Medium,
        "SMB is used for file sharing. Ensure that shares are protected with strong passwords to prevent unauthorized access.",
    ),
    (
        3389,
        "RDP",
        Severity::High,
        "Remote Desktop Protocol allows full remote control of a computer. If exposed to the internet, it is a very high-risk target for attackers.",
    ),
    (
        5900,
        "VNC",
        Severity::High,
        "VNC provides remote control of a computer's screen. Like RDP, it should not be exposed to the internet without a secure tunnel.",
    ),
];

impl VulnerabilityCatalog {
    pub fn builtin() -> Self {
        let entries = DEFAULT_ENTRIES
            .iter()
            .map(|&(port, description, severity, risk_info)| {
                (
                    port,
                    CatalogEntry {
                        description,
                        severity,
                        risk_info,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Catalog ports in ascending order.
    pub fn ports(&self) -> Vec<u16> {
        self.entries.keys().copied().collect()
    }

    pub fn get(&self, port: u16) -> Option<&CatalogEntry> {
        self.entries.get(&port)
    }

    pub fn contains(&self, port: u16) -> bool {
        self.entries.contains_key(&port)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build the finding for an open port. `None` for ports outside the catalog.
    pub fn finding(&self, device_ip: &str, port: u16) -> Option<Vulnerability> {
        self.get(port).map(|e| Vulnerability {
            device_ip: device_ip.to_string(),
            port,
            description: e.description.to_string(),
            severity: e.severity,
            risk_info: e.risk_info.to_string(),
        })
    }
}

impl Default for VulnerabilityCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_seven_fixed_ports() {
        let c = VulnerabilityCatalog::builtin();
        assert_eq!(c.ports(), vec![21, 22, 23, 80, 445, 3389, 5900]);
        assert_eq!(c.get(23).unwrap().severity, Severity::High);
        assert_eq!(c.get(445).unwrap().description, "SMB");
        assert_eq!(c.get(22).unwrap().severity, Severity::Low);
    }

    #[test]
    fn finding_only_for_catalog_ports() {
        let c = VulnerabilityCatalog::builtin();
        let v = c.finding("192.168.1.1", 80).unwrap();
        assert_eq!(v.description, "HTTP");
        assert_eq!(v.severity, Severity::Low);
        assert!(v.risk_info.contains("HTTPS"));
        assert!(c.finding("192.168.1.1", 443).is_none());
    }
}
