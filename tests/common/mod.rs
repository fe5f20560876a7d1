#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use subnet_sentry::catalog::VulnerabilityCatalog;
use subnet_sentry::config::ScanConfig;
use subnet_sentry::engine::{Engine, Environment};
use subnet_sentry::error::ScanError;
use subnet_sentry::liveness::LivenessProbe;
use subnet_sentry::mdns::ServiceResolver;
use subnet_sentry::neighbors::NeighborTable;
use subnet_sentry::netdetect::LocalAddress;
use subnet_sentry::scanner::PortConnector;
use subnet_sentry::types::Outcome;
use subnet_sentry::vendors::VendorTable;

pub struct FixedAddress(pub Option<Ipv4Addr>);

impl LocalAddress for FixedAddress {
    fn local_ipv4(&self) -> Result<Ipv4Addr, ScanError> {
        self.0.ok_or(ScanError::NotConnected)
    }
}

/// Answers for `live` after `delay`; every other address is unreachable.
pub struct FakeLiveness {
    pub live: HashSet<Ipv4Addr>,
    pub delay: Duration,
}

#[async_trait]
impl LivenessProbe for FakeLiveness {
    async fn probe(&self, ip: Ipv4Addr, _timeout: Duration) -> Outcome<()> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.live.contains(&ip) {
            Outcome::Found(())
        } else {
            Outcome::Absent
        }
    }
}

#[derive(Default)]
pub struct FakeServices(pub HashMap<Ipv4Addr, Vec<String>>);

#[async_trait]
impl ServiceResolver for FakeServices {
    async fn service_names(&self, ip: Ipv4Addr) -> Outcome<Vec<String>> {
        match self.0.get(&ip) {
            Some(names) => Outcome::Found(names.clone()),
            None => Outcome::failed("no mDNS response"),
        }
    }
}

#[derive(Default)]
pub struct FakeNeighbors(pub HashMap<Ipv4Addr, String>);

#[async_trait]
impl NeighborTable for FakeNeighbors {
    async fn lookup(&self, ip: Ipv4Addr) -> Outcome<String> {
        match self.0.get(&ip) {
            Some(mac) => Outcome::Found(mac.clone()),
            None => Outcome::Absent,
        }
    }
}

#[derive(Default)]
pub struct FakePorts(pub HashSet<(Ipv4Addr, u16)>);

#[async_trait]
impl PortConnector for FakePorts {
    async fn connect(&self, ip: Ipv4Addr, port: u16, _timeout: Duration) -> Outcome<()> {
        if self.0.contains(&(ip, port)) {
            Outcome::Found(())
        } else {
            Outcome::failed("connection refused")
        }
    }
}

pub fn lan(last: u8) -> Ipv4Addr {
    Ipv4Addr::new(192, 168, 1, last)
}

pub struct FakeNet {
    pub local: Option<Ipv4Addr>,
    pub live: Vec<Ipv4Addr>,
    pub delay: Duration,
    pub services: HashMap<Ipv4Addr, Vec<String>>,
    pub macs: HashMap<Ipv4Addr, String>,
    pub open: Vec<(Ipv4Addr, u16)>,
}

impl Default for FakeNet {
    fn default() -> Self {
        Self {
            local: Some(lan(42)),
            live: Vec::new(),
            delay: Duration::ZERO,
            services: HashMap::new(),
            macs: HashMap::new(),
            open: Vec::new(),
        }
    }
}

impl FakeNet {
    pub fn environment(self) -> Environment {
        Environment {
            local: Arc::new(FixedAddress(self.local)),
            liveness: Arc::new(FakeLiveness {
                live: self.live.into_iter().collect(),
                delay: self.delay,
            }),
            services: Arc::new(FakeServices(self.services)),
            neighbors: Arc::new(FakeNeighbors(self.macs)),
            connector: Arc::new(FakePorts(self.open.into_iter().collect())),
        }
    }

    pub fn engine(self) -> Engine {
        Engine::new(
            self.environment(),
            ScanConfig::default(),
            VulnerabilityCatalog::builtin(),
            VendorTable::builtin(),
        )
        .expect("default config is valid")
    }
}
