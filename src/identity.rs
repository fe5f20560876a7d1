use crate::mdns::ServiceResolver;
use crate::neighbors::NeighborTable;
use crate::pool::fan_out;
use crate::types::{DiscoveredDevice, Outcome, MAC_NOT_AVAILABLE, UNKNOWN_DEVICE};
use crate::vendors::VendorTable;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Names a live host: zero-config service name first, MAC vendor guess second.
#[derive(Clone)]
pub struct IdentityResolver {
    services: Arc<dyn ServiceResolver>,
    neighbors: Arc<dyn NeighborTable>,
    vendors: Arc<VendorTable>,
}

impl IdentityResolver {
    pub fn new(
        services: Arc<dyn ServiceResolver>,
        neighbors: Arc<dyn NeighborTable>,
        vendors: Arc<VendorTable>,
    ) -> Self {
        Self {
            services,
            neighbors,
            vendors,
        }
    }

    /// Never fails: every unresolved piece falls back to `"N/A"` / `"Unknown Device"`.
    pub async fn resolve(&self, ip: Ipv4Addr) -> DiscoveredDevice {
        let service_name = match self.services.service_names(ip).await {
            Outcome::Found(names) => names.into_iter().next().filter(|n| !n.trim().is_empty()),
            Outcome::Absent => None,
            Outcome::Failed(reason) => {
                debug!(%ip, %reason, "zero-config resolution failed");
                None
            }
        };

        let mac = match self.neighbors.lookup(ip).await {
            Outcome::Found(mac) => Some(mac),
            Outcome::Absent => None,
            Outcome::Failed(reason) => {
                debug!(%ip, %reason, "neighbor table lookup failed");
                None
            }
        };

        let name = match (service_name, &mac) {
            (Some(n), _) => n,
            (None, Some(mac)) => self.vendors.guess(mac).to_string(),
            (None, None) => UNKNOWN_DEVICE.to_string(),
        };

        DiscoveredDevice {
            ip: ip.to_string(),
            mac: mac.unwrap_or_else(|| MAC_NOT_AVAILABLE.to_string()),
            name,
            open_ports: Vec::new(),
        }
    }
}

/// Resolve every live host concurrently. Output order is completion order.
pub async fn resolve_all(
    resolver: &IdentityResolver,
    hosts: &[Ipv4Addr],
    limit: &Arc<Semaphore>,
    cancel: &CancellationToken,
) -> Vec<DiscoveredDevice> {
    fan_out(hosts.iter().copied(), limit, cancel, |ip| {
        let resolver = resolver.clone();
        async move { resolver.resolve(ip).await }
    })
    .await
}
