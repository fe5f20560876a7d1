use crate::aggregate::{order_devices, order_vulnerabilities};
use crate::catalog::VulnerabilityCatalog;
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::identity::{resolve_all, IdentityResolver};
use crate::liveness::{sweep, IcmpProbe, LivenessProbe};
use crate::mdns::{MdnsResolver, ServiceResolver};
use crate::neighbors::{ArpTable, NeighborTable};
use crate::netdetect::{enumerate, InterfaceAddress, LocalAddress};
use crate::scanner::{scan_hosts, PortConnector, TcpConnector};
use crate::types::{DiscoveredDevice, SecurityReport, Vulnerability};
use crate::vendors::VendorTable;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Everything the engine needs from the host system.
#[derive(Clone)]
pub struct Environment {
    pub local: Arc<dyn LocalAddress>,
    pub liveness: Arc<dyn LivenessProbe>,
    pub services: Arc<dyn ServiceResolver>,
    pub neighbors: Arc<dyn NeighborTable>,
    pub connector: Arc<dyn PortConnector>,
}

impl Environment {
    /// Real sockets, interfaces and the OS neighbor table. Must be called from within a tokio runtime.
    pub fn system(config: &ScanConfig) -> Self {
        Self {
            local: Arc::new(InterfaceAddress::new(config.interface_ip)),
            liveness: Arc::new(IcmpProbe::new()),
            services: Arc::new(MdnsResolver::new(config.mdns_timeout())),
            neighbors: Arc::new(ArpTable::new(&config.neighbor_table)),
            connector: Arc::new(TcpConnector),
        }
    }
}

/// Discovery and vulnerability-scan entry points.
///
/// Catalog and vendor table are fixed at construction and shared read-only by every scan.
pub struct Engine {
    env: Environment,
    config: ScanConfig,
    catalog: Arc<VulnerabilityCatalog>,
    identity: IdentityResolver,
    limit: Arc<Semaphore>,
}

impl Engine {
    pub fn new(
        env: Environment,
        config: ScanConfig,
        catalog: VulnerabilityCatalog,
        vendors: VendorTable,
    ) -> Result<Self, ScanError> {
        config.validate()?;
        let identity =
            IdentityResolver::new(env.services.clone(), env.neighbors.clone(), Arc::new(vendors));
        let limit = Arc::new(Semaphore::new(config.max_in_flight));
        Ok(Self {
            env,
            config,
            catalog: Arc::new(catalog),
            identity,
            limit,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn catalog(&self) -> &VulnerabilityCatalog {
        &self.catalog
    }

    /// Sweep the local /24, name every live host and return them in numeric IP order.
    pub async fn discover_devices(&self) -> Result<Vec<DiscoveredDevice>, ScanError> {
        self.discover_devices_with(&CancellationToken::new()).await
    }

    pub async fn discover_devices_with(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<DiscoveredDevice>, ScanError> {
        let live = self.live_hosts(self.config.discovery_timeout(), cancel).await?;
        let devices = resolve_all(&self.identity, &live, &self.limit, cancel).await;
        info!(devices = devices.len(), "device discovery complete");
        Ok(order_devices(devices))
    }

    /// Sweep the local /24 with the stricter security budget, then port-scan the live hosts.
    pub async fn discover_vulnerabilities(&self) -> Result<SecurityReport, ScanError> {
        let cancel = CancellationToken::new();
        let live = self.security_live_hosts(&cancel).await?;
        let vulnerabilities = self.scan_ports(&live, &cancel).await;
        Ok(SecurityReport {
            vulnerabilities,
            hosts_scanned: live.len(),
        })
    }

    /// First phase of the security flow.
    pub async fn security_live_hosts(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Ipv4Addr>, ScanError> {
        self.live_hosts(self.config.security_liveness_timeout(), cancel)
            .await
    }

    /// Second phase of the security flow: catalog ports across `hosts`, ordered by IP string.
    pub async fn scan_ports(
        &self,
        hosts: &[Ipv4Addr],
        cancel: &CancellationToken,
    ) -> Vec<Vulnerability> {
        let found = scan_hosts(
            self.env.connector.clone(),
            hosts,
            &self.catalog,
            self.config.port_timeout(),
            &self.limit,
            cancel,
        )
        .await;
        order_vulnerabilities(found)
    }

    async fn live_hosts(
        &self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Vec<Ipv4Addr>, ScanError> {
        let (subnet, candidates) = enumerate(self.env.local.as_ref())?;
        info!(subnet = %subnet.network(), candidates = candidates.len(), "starting liveness sweep");
        Ok(sweep(
            self.env.liveness.clone(),
            &candidates,
            timeout,
            &self.limit,
            cancel,
        )
        .await)
    }
}
