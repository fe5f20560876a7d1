use crate::types::Outcome;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use dns_parser::{Builder, Packet, QueryClass, QueryType, RData};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{self, Instant};

pub const MDNS_PORT: u16 = 5353;
/// DNS-SD service-type enumeration record.
pub const SERVICES_QUERY: &str = "_services._dns-sd._udp.local";

/// Zero-configuration lookup of the services a host advertises.
#[async_trait]
pub trait ServiceResolver: Send + Sync {
    async fn service_names(&self, ip: Ipv4Addr) -> Outcome<Vec<String>>;
}

/// Sends a unicast-response mDNS query straight to the host's port 5353.
#[derive(Debug, Clone)]
pub struct MdnsResolver {
    timeout: Duration,
}

impl MdnsResolver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ServiceResolver for MdnsResolver {
    async fn service_names(&self, ip: Ipv4Addr) -> Outcome<Vec<String>> {
        let session = match MdnsSession::open(ip).await {
            Ok(s) => s,
            Err(e) => return Outcome::failed(format!("{e:#}")),
        };
        // The session socket is released when `session` drops on every path below.
        match session.query(self.timeout).await {
            Ok(Some(names)) if !names.is_empty() => Outcome::Found(names),
            Ok(_) => Outcome::Absent,
            Err(e) => Outcome::failed(format!("{e:#}")),
        }
    }
}

/// One short-lived query socket aimed at a single host.
struct MdnsSession {
    socket: UdpSocket,
    target: SocketAddr,
    id: u16,
}

impl MdnsSession {
    async fn open(ip: Ipv4Addr) -> Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .await
            .context("binding mDNS query socket")?;
        Ok(Self {
            socket,
            target: SocketAddr::from((ip, MDNS_PORT)),
            id: rand::random::<u16>(),
        })
    }

    /// `Ok(None)` when the host stayed silent until the deadline.
    async fn query(&self, timeout: Duration) -> Result<Option<Vec<String>>> {
        let packet = build_services_query(self.id)?;
        self.socket
            .send_to(&packet, self.target)
            .await
            .with_context(|| format!("sending mDNS query to {}", self.target))?;

        let deadline = Instant::now() + timeout;
        let mut buf = vec![0u8; 4096];
        loop {
            let recv = time::timeout_at(deadline, self.socket.recv_from(&mut buf)).await;
            let (n, from) = match recv {
                Err(_) => return Ok(None),
                Ok(res) => res.context("receiving mDNS response")?,
            };
            if from.ip() != self.target.ip() {
                continue;
            }
            // Responses with a foreign id or unparsable bodies are ignored until the deadline.
            if let Ok(names) = parse_service_names(&buf[..n], self.id) {
                return Ok(Some(names));
            }
        }
    }
}

/// Encode a PTR question for [`SERVICES_QUERY`] with the unicast-response bit set.
pub fn build_services_query(id: u16) -> Result<Vec<u8>> {
    let mut builder = Builder::new_query(id, false);
    builder.add_question(SERVICES_QUERY, true, QueryType::PTR, QueryClass::IN);
    builder
        .build()
        .map_err(|_| anyhow!("mDNS query truncated"))
}

/// Extract advertised service names, in record order, from an mDNS response.
///
/// PTR targets are reported without the trailing `.local` domain. mDNS responders
/// commonly answer with id 0, so both 0 and the query id are accepted.
pub fn parse_service_names(data: &[u8], id: u16) -> Result<Vec<String>> {
    let packet = Packet::parse(data).context("failed to parse mDNS packet")?;
    if packet.header.query {
        return Err(anyhow!("mDNS packet is a query, not a response"));
    }
    if packet.header.id != 0 && packet.header.id != id {
        return Err(anyhow!("unexpected mDNS transaction id {}", packet.header.id));
    }

    let mut names = Vec::new();
    for record in packet.answers.iter().chain(packet.additional.iter()) {
        if let RData::PTR(ptr) = &record.data {
            let name = display_name(&ptr.0.to_string());
            if !name.is_empty() && !name.ends_with(".arpa") && !names.contains(&name) {
                names.push(name);
            }
        }
    }
    Ok(names)
}

fn display_name(fqdn: &str) -> String {
    let name = fqdn.trim_end_matches('.');
    name.strip_suffix(".local").unwrap_or(name).to_string()
}
