use crate::error::ScanError;
use if_addrs::{get_if_addrs, IfAddr};
use ipnet::Ipv4Net;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// Source of this machine's own IPv4 address.
pub trait LocalAddress: Send + Sync {
    fn local_ipv4(&self) -> Result<Ipv4Addr, ScanError>;
}

/// Reads the address from the OS interface list, or returns a pinned address.
#[derive(Debug, Clone, Default)]
pub struct InterfaceAddress {
    pinned: Option<Ipv4Addr>,
}

impl InterfaceAddress {
    pub fn new(pinned: Option<Ipv4Addr>) -> Self {
        Self { pinned }
    }
}

impl LocalAddress for InterfaceAddress {
    fn local_ipv4(&self) -> Result<Ipv4Addr, ScanError> {
        match self.pinned {
            Some(ip) => Ok(ip),
            None => detect_local_ipv4(),
        }
    }
}

/// Detect this machine's LAN address.
///
/// The source address the OS would use for the default route wins. When there is no
/// default route, the first usable address from the interface list is taken.
pub fn detect_local_ipv4() -> Result<Ipv4Addr, ScanError> {
    let ifaces: Vec<(String, Ipv4Addr)> = get_if_addrs()?
        .into_iter()
        .filter_map(|iface| match iface.addr {
            IfAddr::V4(v4) => Some((iface.name, v4.ip)),
            IfAddr::V6(_) => None,
        })
        .collect();
    select_local_ipv4(default_route_ipv4(), &ifaces).ok_or(ScanError::NotConnected)
}

/// Source address of the default route. Connecting a UDP socket only selects a route;
/// no packet is sent.
fn default_route_ipv4() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect(ROUTE_PROBE_TARGET).ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) => Some(ip),
        IpAddr::V6(_) => None,
    }
}

const ROUTE_PROBE_TARGET: (Ipv4Addr, u16) = (Ipv4Addr::new(8, 8, 8, 8), 80);
const VIRTUAL_IFACE_PREFIXES: &[&str] = &["docker", "br-", "veth", "virbr", "lo"];

/// Pick the scan address from the default-route source and the `(name, ip)` interface list.
///
/// Loopback, link-local and unspecified addresses never qualify. In the fallback, virtual
/// bridge and container interfaces are skipped and interface order is kept.
pub fn select_local_ipv4(
    route: Option<Ipv4Addr>,
    ifaces: &[(String, Ipv4Addr)],
) -> Option<Ipv4Addr> {
    if let Some(ip) = route.filter(|ip| is_usable(*ip)) {
        return Some(ip);
    }
    ifaces
        .iter()
        .filter(|(name, _)| !is_virtual_iface(name))
        .map(|(_, ip)| *ip)
        .find(|ip| is_usable(*ip))
}

fn is_usable(ip: Ipv4Addr) -> bool {
    !ip.is_loopback() && !ip.is_link_local() && !ip.is_unspecified()
}

fn is_virtual_iface(name: &str) -> bool {
    VIRTUAL_IFACE_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// The /24 that a scan sweeps. Fixed for the lifetime of one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subnet {
    net: Ipv4Net,
}

pub const CANDIDATE_COUNT: usize = 254;

impl Subnet {
    /// The subnet is the first three octets of `local`; its own host octet is not excluded.
    pub fn from_local(local: Ipv4Addr) -> Self {
        Self {
            net: ipv4_to_default_cidr(local),
        }
    }

    pub fn network(&self) -> Ipv4Net {
        self.net
    }

    /// First three octets as a dotted prefix, e.g. `192.168.1`.
    pub fn base_address(&self) -> String {
        let o = self.net.network().octets();
        format!("{}.{}.{}", o[0], o[1], o[2])
    }

    /// `base.1` through `base.254`.
    pub fn candidates(&self) -> Vec<Ipv4Addr> {
        self.net.hosts().collect()
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        let last = ip.octets()[3];
        self.net.contains(&ip) && (1..=254).contains(&last)
    }
}

/// Helper: convert an IPv4 address into its default /24 network.
pub fn ipv4_to_default_cidr(ip: Ipv4Addr) -> Ipv4Net {
    let o = ip.octets();
    let net = Ipv4Addr::new(o[0], o[1], o[2], 0);
    Ipv4Net::new(net, 24).expect("/24 is always valid")
}

/// Resolve the scan subnet from a local address source. An unavailable address
/// surfaces as [`ScanError::NotConnected`].
pub fn enumerate(local: &dyn LocalAddress) -> Result<(Subnet, Vec<Ipv4Addr>), ScanError> {
    let ip = local.local_ipv4()?;
    let subnet = Subnet::from_local(ip);
    let candidates = subnet.candidates();
    Ok((subnet, candidates))
}
