use std::fs::File;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use subnet_sentry::catalog::VulnerabilityCatalog;
use subnet_sentry::config::{load_config_from_path, ScanConfig};
use subnet_sentry::engine::{Engine, Environment};
use subnet_sentry::error::ScanError;
use subnet_sentry::server;
use subnet_sentry::session::ScanSession;
use subnet_sentry::types::{DiscoveredDevice, SecurityReport};
use subnet_sentry::vendors::load_vendors_or_default;

/// subnet-sentry — discover devices on the local /24 and screen them for risky open ports.
#[derive(Debug, Parser)]
#[command(name = "subnet-sentry", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    scan: ScanArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sweep the subnet and name every live host.
    Devices {
        /// Write results as pretty JSON to this path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Sweep the subnet and probe live hosts for risky open ports.
    Security {
        /// Write results as pretty JSON to this path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run the JSON scan API until Ctrl+C.
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: String,
    },
}

#[derive(Debug, Clone, Args)]
struct ScanArgs {
    /// JSON config file; flags below override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use this local IPv4 address instead of detecting one.
    #[arg(long = "interface-ip", global = true)]
    interface_ip: Option<Ipv4Addr>,

    /// Liveness timeout for device discovery, in milliseconds.
    #[arg(long = "discovery-timeout-ms", global = true)]
    discovery_timeout_ms: Option<u64>,

    /// Liveness timeout before a security scan, in milliseconds.
    #[arg(long = "security-timeout-ms", global = true)]
    security_timeout_ms: Option<u64>,

    /// TCP connect timeout per catalog port, in milliseconds.
    #[arg(long = "port-timeout-ms", global = true)]
    port_timeout_ms: Option<u64>,

    /// mDNS response timeout per host, in milliseconds.
    #[arg(long = "mdns-timeout-ms", global = true)]
    mdns_timeout_ms: Option<u64>,

    /// Max simultaneously open probe sockets.
    #[arg(long = "max-in-flight", global = true)]
    max_in_flight: Option<usize>,

    /// Path to the neighbor (ARP) table.
    #[arg(long = "neighbor-table", global = true)]
    neighbor_table: Option<PathBuf>,

    /// Extra MAC prefix vendor labels (one `AA:BB:CC  Label` per line).
    #[arg(long = "vendors", global = true)]
    vendor_file: Option<PathBuf>,
}

impl ScanArgs {
    fn resolve(&self) -> Result<ScanConfig> {
        let mut cfg = match &self.config {
            Some(path) => load_config_from_path(path)?,
            None => ScanConfig::default(),
        };
        if let Some(v) = self.interface_ip {
            cfg.interface_ip = Some(v);
        }
        if let Some(v) = self.discovery_timeout_ms {
            cfg.discovery_timeout_ms = v;
        }
        if let Some(v) = self.security_timeout_ms {
            cfg.security_liveness_timeout_ms = v;
        }
        if let Some(v) = self.port_timeout_ms {
            cfg.port_timeout_ms = v;
        }
        if let Some(v) = self.mdns_timeout_ms {
            cfg.mdns_timeout_ms = v;
        }
        if let Some(v) = self.max_in_flight {
            cfg.max_in_flight = v;
        }
        if let Some(v) = &self.neighbor_table {
            cfg.neighbor_table = v.clone();
        }
        if let Some(v) = &self.vendor_file {
            cfg.vendor_file = Some(v.clone());
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("subnet_sentry=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = cli.scan.resolve()?;
    info!(
        discovery_timeout_ms = cfg.discovery_timeout_ms,
        security_timeout_ms = cfg.security_liveness_timeout_ms,
        port_timeout_ms = cfg.port_timeout_ms,
        max_in_flight = cfg.max_in_flight,
        neighbor_table = %cfg.neighbor_table.display(),
        "configuration loaded"
    );

    let vendors = load_vendors_or_default(cfg.vendor_file.as_deref())?;
    let env = Environment::system(&cfg);
    let engine = Engine::new(env, cfg, VulnerabilityCatalog::builtin(), vendors)?;

    match cli.command {
        Command::Devices { output } => {
            let devices = engine.discover_devices().await.map_err(not_connected_hint)?;
            print_devices_table(&devices);
            if let Some(path) = output.as_deref() {
                write_json(path, &devices)?;
                println!("Wrote JSON results to {}", path.display());
            }
        }
        Command::Security { output } => {
            let report = engine
                .discover_vulnerabilities()
                .await
                .map_err(not_connected_hint)?;
            print_report_table(&report);
            if let Some(path) = output.as_deref() {
                write_json(path, &report)?;
                println!("Wrote JSON results to {}", path.display());
            }
        }
        Command::Serve { bind } => {
            let session = Arc::new(ScanSession::new(Arc::new(engine)));
            let shutdown = async {
                let _ = tokio::signal::ctrl_c().await;
            };
            println!("Scan API at http://{bind}/api (Ctrl+C to stop)");
            server::serve(&bind, session, shutdown).await?;
        }
    }

    Ok(())
}

fn not_connected_hint(e: ScanError) -> anyhow::Error {
    match e {
        ScanError::NotConnected => anyhow::Error::new(e)
            .context("no network to scan; connect to a LAN or pass --interface-ip"),
        other => other.into(),
    }
}

fn print_devices_table(devices: &[DiscoveredDevice]) {
    let ip_w = devices.iter().map(|d| d.ip.len()).max().unwrap_or(0).max("ip".len());
    let mac_w = 17usize;
    println!("\nDevices found: {}", devices.len());
    println!("{:<ip_w$}  {:<mac_w$}  name", "ip", "mac");
    println!("{:-<ip_w$}  {:-<mac_w$}  {:-<4}", "", "", "");
    for d in devices {
        println!("{:<ip_w$}  {:<mac_w$}  {}", d.ip, d.mac, d.name);
    }
}

fn print_report_table(report: &SecurityReport) {
    let ip_w = report
        .vulnerabilities
        .iter()
        .map(|v| v.device_ip.len())
        .max()
        .unwrap_or(0)
        .max("ip".len());
    println!(
        "\nFindings: {} (hosts scanned: {})",
        report.vulnerabilities.len(),
        report.hosts_scanned
    );
    println!("{:<ip_w$}  {:>5}  {:<8}  {:<6}  risk", "ip", "port", "service", "sev");
    println!("{:-<ip_w$}  {:-<5}  {:-<8}  {:-<6}  {:-<4}", "", "", "", "", "");
    for v in &report.vulnerabilities {
        println!(
            "{:<ip_w$}  {:>5}  {:<8}  {:<6}  {}",
            v.device_ip,
            v.port,
            v.description,
            v.severity.to_string(),
            v.risk_info
        );
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}
