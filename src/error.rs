use thiserror::Error;

/// Errors that stop a scan before any probing happens.
///
/// Per-host and per-port failures never surface here; they are absorbed as
/// [`Outcome`](crate::types::Outcome) values by the phase that produced them.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("not connected: no active non-loopback IPv4 interface")]
    NotConnected,
    #[error("failed to query network interfaces: {0}")]
    InterfaceQuery(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}
