//! Library crate for subnet-sentry: local /24 device discovery and risky-port screening.
pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod identity;
pub mod liveness;
pub mod mdns;
pub mod neighbors;
pub mod netdetect;
pub mod pool;
pub mod scanner;
pub mod server;
pub mod session;
pub mod types;
pub mod vendors;
