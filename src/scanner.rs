use crate::catalog::VulnerabilityCatalog;
use crate::pool::fan_out;
use crate::types::{Outcome, Vulnerability};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// A single TCP connect attempt. No data is read or written.
#[async_trait]
pub trait PortConnector: Send + Sync {
    async fn connect(&self, ip: Ipv4Addr, port: u16, timeout: Duration) -> Outcome<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl PortConnector for TcpConnector {
    async fn connect(&self, ip: Ipv4Addr, port: u16, timeout: Duration) -> Outcome<()> {
        let addr = SocketAddr::new(IpAddr::V4(ip), port);
        match time::timeout(timeout, TcpStream::connect(addr)).await {
            // Dropping the stream closes the connection immediately.
            Ok(Ok(_stream)) => Outcome::Found(()),
            Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => Outcome::Absent,
            Ok(Err(e)) => Outcome::failed(e),
            Err(_) => Outcome::Absent,
        }
    }
}

/// Try every catalog port on every host concurrently, one attempt per pair.
///
/// Only open ports produce a record; the result is in completion order.
pub async fn scan_hosts(
    connector: Arc<dyn PortConnector>,
    hosts: &[Ipv4Addr],
    catalog: &VulnerabilityCatalog,
    timeout: Duration,
    limit: &Arc<Semaphore>,
    cancel: &CancellationToken,
) -> Vec<Vulnerability> {
    let ports = catalog.ports();
    let pairs: Vec<(Ipv4Addr, u16)> = hosts
        .iter()
        .flat_map(|&ip| ports.iter().map(move |&port| (ip, port)))
        .collect();
    let total = pairs.len();

    let outcomes = fan_out(pairs, limit, cancel, |(ip, port)| {
        let connector = connector.clone();
        async move { (ip, port, connector.connect(ip, port, timeout).await) }
    })
    .await;

    let mut found = Vec::new();
    for (ip, port, outcome) in outcomes {
        match outcome {
            Outcome::Found(()) => {
                if let Some(v) = catalog.finding(&ip.to_string(), port) {
                    found.push(v);
                }
            }
            Outcome::Absent => {}
            Outcome::Failed(reason) => debug!(%ip, port, %reason, "connect failed"),
        }
    }
    info!(hosts = hosts.len(), attempts = total, open = found.len(), "port scan done");
    found
}
