use serde::{Deserialize, Serialize};
use std::fmt;

/// One live host on the scanned subnet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub ip: String,
    /// Upper-cased colon-hex MAC, or `"N/A"` when the neighbor table had no entry.
    pub mac: String,
    pub name: String,
    pub open_ports: Vec<u16>,
}

pub const MAC_NOT_AVAILABLE: &str = "N/A";
pub const UNKNOWN_DEVICE: &str = "Unknown Device";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        };
        f.write_str(s)
    }
}

/// An open catalog port found on a live host.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Vulnerability {
    pub device_ip: String,
    pub port: u16,
    pub description: String,
    pub severity: Severity,
    pub risk_info: String,
}

/// Output of the security flow.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityReport {
    pub vulnerabilities: Vec<Vulnerability>,
    pub hosts_scanned: usize,
}

/// Result of a single probe, resolve or lookup.
///
/// `Absent` is a determined negative (no reply, no entry, port closed) while `Failed` carries
/// the transport or parse error that prevented an answer. Callers treat both the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Found(T),
    Absent,
    Failed(String),
}

impl<T> Outcome<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Outcome::Found(v) => Some(v),
            Outcome::Absent | Outcome::Failed(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Outcome::Found(_))
    }

    pub fn failed(err: impl fmt::Display) -> Self {
        Outcome::Failed(err.to_string())
    }
}

/// Composite ordering key for a dotted quad: `a*10^6 + b*10^4 + c*10^2 + d`.
///
/// Anything that does not parse as four integer segments sorts first with key 0.
pub fn numeric_key(ip: &str) -> u64 {
    let mut segs = [0u64; 4];
    let mut n = 0;
    for part in ip.split('.') {
        if n == 4 {
            return 0;
        }
        match part.parse::<u64>() {
            Ok(v) => segs[n] = v,
            Err(_) => return 0,
        }
        n += 1;
    }
    if n != 4 {
        return 0;
    }
    segs[0] * 1_000_000 + segs[1] * 10_000 + segs[2] * 100 + segs[3]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_key_weights_segments() {
        assert_eq!(numeric_key("192.168.1.20"), 192_000_000 + 1_680_000 + 100 + 20);
        assert!(numeric_key("192.168.1.1") < numeric_key("192.168.1.20"));
        assert!(numeric_key("192.168.1.9") < numeric_key("192.168.1.10"));
    }

    #[test]
    fn numeric_key_rejects_garbage() {
        assert_eq!(numeric_key("not-an-ip"), 0);
        assert_eq!(numeric_key("1.2.3"), 0);
        assert_eq!(numeric_key("1.2.3.4.5"), 0);
    }

    #[test]
    fn severity_total_order() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert_eq!(Severity::High.to_string(), "High");
    }

    #[test]
    fn outcome_collapses_negatives() {
        assert_eq!(Outcome::Found(3).found(), Some(3));
        assert_eq!(Outcome::<u8>::Absent.found(), None);
        assert_eq!(Outcome::<u8>::failed("boom").found(), None);
    }
}
