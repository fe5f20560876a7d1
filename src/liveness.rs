use crate::pool::fan_out;
use crate::types::Outcome;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use surge_ping::{Client, Config, PingIdentifier, PingSequence, SurgeError};
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Network-layer reachability check for one address.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn probe(&self, ip: Ipv4Addr, timeout: Duration) -> Outcome<()>;
}

const ECHO_PORT: u16 = 7;
const PAYLOAD: [u8; 56] = [0; 56];

/// ICMP echo when an ICMP socket is available, otherwise a TCP connect to the
/// echo port where a refused connection still proves the host is up.
pub struct IcmpProbe {
    client: Option<Client>,
}

impl IcmpProbe {
    /// Must be called from within a tokio runtime.
    pub fn new() -> Self {
        match Client::new(&Config::default()) {
            Ok(client) => Self {
                client: Some(client),
            },
            Err(e) => {
                warn!(error = %e, "ICMP socket unavailable, falling back to TCP echo-port probing");
                Self { client: None }
            }
        }
    }

    async fn ping(client: &Client, ip: Ipv4Addr, timeout: Duration) -> Outcome<()> {
        let mut pinger = client
            .pinger(IpAddr::V4(ip), PingIdentifier(rand::random::<u16>()))
            .await;
        pinger.timeout(timeout);
        match pinger.ping(PingSequence(0), &PAYLOAD).await {
            Ok(_) => Outcome::Found(()),
            Err(SurgeError::Timeout { .. }) => Outcome::Absent,
            Err(e) => Outcome::failed(e),
        }
    }
}

#[async_trait]
impl LivenessProbe for IcmpProbe {
    async fn probe(&self, ip: Ipv4Addr, timeout: Duration) -> Outcome<()> {
        match &self.client {
            Some(client) => match time::timeout(timeout, Self::ping(client, ip, timeout)).await {
                Ok(out) => out,
                Err(_) => Outcome::Absent,
            },
            None => tcp_echo(ip, timeout).await,
        }
    }
}

async fn tcp_echo(ip: Ipv4Addr, timeout: Duration) -> Outcome<()> {
    let addr = SocketAddr::new(IpAddr::V4(ip), ECHO_PORT);
    match time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_stream)) => Outcome::Found(()),
        Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => Outcome::Found(()),
        Ok(Err(e)) => Outcome::failed(e),
        Err(_) => Outcome::Absent,
    }
}

/// Probe every candidate concurrently and return the ones that answered in time.
///
/// Unreachable and errored probes are both dropped; the result has no particular order.
pub async fn sweep(
    probe: Arc<dyn LivenessProbe>,
    candidates: &[Ipv4Addr],
    timeout: Duration,
    limit: &Arc<Semaphore>,
    cancel: &CancellationToken,
) -> Vec<Ipv4Addr> {
    let outcomes = fan_out(candidates.iter().copied(), limit, cancel, |ip| {
        let probe = probe.clone();
        async move { (ip, probe.probe(ip, timeout).await) }
    })
    .await;

    let mut live = Vec::new();
    for (ip, outcome) in outcomes {
        match outcome {
            Outcome::Found(()) => live.push(ip),
            Outcome::Absent => {}
            Outcome::Failed(reason) => debug!(%ip, %reason, "liveness probe failed"),
        }
    }
    info!(
        candidates = candidates.len(),
        live = live.len(),
        timeout_ms = timeout.as_millis() as u64,
        "liveness sweep done"
    );
    live
}
