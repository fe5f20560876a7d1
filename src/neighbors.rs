use crate::types::Outcome;
use async_trait::async_trait;
use std::net::Ipv4Addr;
use std::path::PathBuf;

pub const DEFAULT_ARP_TABLE: &str = "/proc/net/arp";

/// IP to MAC lookup against the local link-layer table.
#[async_trait]
pub trait NeighborTable: Send + Sync {
    async fn lookup(&self, ip: Ipv4Addr) -> Outcome<String>;
}

/// Reads a `/proc/net/arp`-style table. The file is re-read on every lookup.
#[derive(Debug, Clone)]
pub struct ArpTable {
    path: PathBuf,
}

impl ArpTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for ArpTable {
    fn default() -> Self {
        Self::new(DEFAULT_ARP_TABLE)
    }
}

#[async_trait]
impl NeighborTable for ArpTable {
    async fn lookup(&self, ip: Ipv4Addr) -> Outcome<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => match find_mac(&content, &ip.to_string()) {
                Some(mac) => Outcome::Found(mac),
                None => Outcome::Absent,
            },
            Err(e) => Outcome::failed(format!("{}: {e}", self.path.display())),
        }
    }
}

/// Find the MAC for `ip` in ARP table text.
///
/// The first line is a header. Columns are whitespace separated: IP address,
/// HW type, flags, HW address, ... The IP must match exactly and the MAC must
/// look like `xx:xx:xx:xx:xx:xx`; it is returned upper-cased. Incomplete entries
/// (all-zero MAC, as the kernel prints them) count as no entry.
pub fn find_mac(table: &str, ip: &str) -> Option<String> {
    table.lines().skip(1).find_map(|line| {
        let cols: Vec<&str> = line.split_whitespace().collect();
        let usable = cols.len() >= 4 && is_mac_shaped(cols[3]) && !is_zero_mac(cols[3]);
        if usable && cols[0] == ip {
            Some(cols[3].to_ascii_uppercase())
        } else {
            None
        }
    })
}

fn is_mac_shaped(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 17
        && bytes
            .iter()
            .enumerate()
            .all(|(i, &b)| if i % 3 == 2 { b == b':' } else { b != b':' })
}

fn is_zero_mac(s: &str) -> bool {
    s.bytes().all(|b| b == b'0' || b == b':')
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
IP address       HW type     Flags       HW address            Mask     Device
192.168.1.1      0x1         0x2         fc:db:b3:11:22:33     *        wlan0
192.168.1.20     0x1         0x2         00:1a:2b:aa:bb:cc     *        wlan0
192.168.1.200    0x1         0x0         00:00:00:00:00:00     *        wlan0
garbage
";

    #[test]
    fn exact_ip_match_uppercases_mac() {
        assert_eq!(find_mac(TABLE, "192.168.1.1").as_deref(), Some("FC:DB:B3:11:22:33"));
        assert_eq!(find_mac(TABLE, "192.168.1.20").as_deref(), Some("00:1A:2B:AA:BB:CC"));
    }

    #[test]
    fn incomplete_entry_is_absent() {
        assert_eq!(find_mac(TABLE, "192.168.1.200"), None);
        let t = "IP address HW type Flags HW address Mask Device\n\
                 10.0.0.9 0x1 0x0 00:00:00:00:00:00 * eth0\n\
                 10.0.0.9 0x1 0x2 aa:bb:cc:dd:ee:ff * eth0\n";
        assert_eq!(find_mac(t, "10.0.0.9").as_deref(), Some("AA:BB:CC:DD:EE:FF"));
    }

    #[test]
    fn prefix_of_ip_does_not_match() {
        assert_eq!(find_mac(TABLE, "192.168.1.2"), None);
    }

    #[test]
    fn malformed_rows_are_skipped() {
        assert_eq!(find_mac(TABLE, "garbage"), None);
        assert_eq!(find_mac("", "192.168.1.1"), None);
    }

    #[test]
    fn header_is_never_matched() {
        let t = "192.168.1.5 0x1 0x2 aa:bb:cc:dd:ee:ff * eth0\n";
        assert_eq!(find_mac(t, "192.168.1.5"), None);
    }

    #[tokio::test]
    async fn missing_file_is_failed_outcome() {
        let t = ArpTable::new("/nonexistent/subnet-sentry/arp");
        let out = t.lookup(Ipv4Addr::new(10, 0, 0, 1)).await;
        assert!(matches!(out, Outcome::Failed(_)));
    }
}
