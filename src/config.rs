use crate::error::ScanError;
use crate::neighbors::DEFAULT_ARP_TABLE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Tunables for both scan flows. Every field has a default, so a config file may set any subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Liveness budget for the device-discovery flow.
    pub discovery_timeout_ms: u64,
    /// Liveness budget for the first pass of the security flow.
    pub security_liveness_timeout_ms: u64,
    pub port_timeout_ms: u64,
    pub mdns_timeout_ms: u64,
    /// Ceiling on simultaneously open probe sockets.
    pub max_in_flight: usize,
    pub neighbor_table: PathBuf,
    pub vendor_file: Option<PathBuf>,
    /// Use this address instead of detecting one from the interfaces.
    pub interface_ip: Option<Ipv4Addr>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            discovery_timeout_ms: 500,
            security_liveness_timeout_ms: 1000,
            port_timeout_ms: 200,
            mdns_timeout_ms: 1000,
            max_in_flight: 2048,
            neighbor_table: PathBuf::from(DEFAULT_ARP_TABLE),
            vendor_file: None,
            interface_ip: None,
        }
    }
}

impl ScanConfig {
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    pub fn security_liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.security_liveness_timeout_ms)
    }

    pub fn port_timeout(&self) -> Duration {
        Duration::from_millis(self.port_timeout_ms)
    }

    pub fn mdns_timeout(&self) -> Duration {
        Duration::from_millis(self.mdns_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        let timeouts = [
            ("discovery_timeout_ms", self.discovery_timeout_ms),
            ("security_liveness_timeout_ms", self.security_liveness_timeout_ms),
            ("port_timeout_ms", self.port_timeout_ms),
            ("mdns_timeout_ms", self.mdns_timeout_ms),
        ];
        for (name, v) in timeouts {
            if v == 0 {
                return Err(ScanError::Config(format!("{name} must be greater than zero")));
            }
        }
        if self.max_in_flight == 0 || self.max_in_flight > tokio::sync::Semaphore::MAX_PERMITS {
            return Err(ScanError::Config(format!(
                "max_in_flight must be between 1 and {}",
                tokio::sync::Semaphore::MAX_PERMITS
            )));
        }
        Ok(())
    }
}

/// Load a JSON config file. Missing keys take their defaults.
pub fn load_config_from_path(path: impl AsRef<Path>) -> Result<ScanConfig> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("failed to read config file: {}", path.as_ref().display()))?;
    let cfg: ScanConfig = serde_json::from_str(&content)
        .with_context(|| format!("invalid config file: {}", path.as_ref().display()))?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_flow_budgets() {
        let c = ScanConfig::default();
        assert_eq!(c.discovery_timeout(), Duration::from_millis(500));
        assert_eq!(c.security_liveness_timeout(), Duration::from_millis(1000));
        assert_eq!(c.port_timeout(), Duration::from_millis(200));
        assert!(c.max_in_flight >= 254 * 7);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c: ScanConfig =
            serde_json::from_str(r#"{ "port_timeout_ms": 350, "interface_ip": "10.0.0.9" }"#).unwrap();
        assert_eq!(c.port_timeout_ms, 350);
        assert_eq!(c.interface_ip, Some(Ipv4Addr::new(10, 0, 0, 9)));
        assert_eq!(c.discovery_timeout_ms, 500);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let c = ScanConfig {
            port_timeout_ms: 0,
            ..ScanConfig::default()
        };
        assert!(matches!(c.validate(), Err(ScanError::Config(_))));
    }
}
