//! Observable scan state for both flows: `Idle -> Running -> Complete`.
//!
//! Starting a scan clears the previous results before any probing begins and cancels the
//! scan it supersedes. A superseded scan never publishes its result: every slot carries a
//! generation number and a finished scan only writes back if its generation is still current.
use crate::engine::Engine;
use crate::error::ScanError;
use crate::types::{DiscoveredDevice, Vulnerability};
use ::time::{format_description::well_known, OffsetDateTime};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    Idle,
    Running,
    Complete,
    /// No local IPv4 address: the subnet could not be determined.
    NotConnected,
    /// Any other environment error.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SecurityPhase {
    Ready,
    Discovering,
    Scanning { hosts: usize },
    Complete,
}

impl SecurityPhase {
    pub fn status_text(&self) -> String {
        match self {
            SecurityPhase::Ready => "Ready to scan".to_string(),
            SecurityPhase::Discovering => "Discovering devices on network...".to_string(),
            SecurityPhase::Scanning { hosts } => {
                format!("Scanning {hosts} devices for vulnerabilities...")
            }
            SecurityPhase::Complete => "Scan Complete".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSnapshot {
    pub state: ScanState,
    pub devices: Vec<DiscoveredDevice>,
    pub error: Option<String>,
    pub completed_at: Option<String>,
}

impl Default for DashboardSnapshot {
    fn default() -> Self {
        Self {
            state: ScanState::Idle,
            devices: Vec::new(),
            error: None,
            completed_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecuritySnapshot {
    pub state: ScanState,
    pub phase: SecurityPhase,
    pub status: String,
    pub vulnerabilities: Vec<Vulnerability>,
    pub devices_scanned: usize,
    pub error: Option<String>,
    pub completed_at: Option<String>,
}

impl Default for SecuritySnapshot {
    fn default() -> Self {
        Self {
            state: ScanState::Idle,
            phase: SecurityPhase::Ready,
            status: SecurityPhase::Ready.status_text(),
            vulnerabilities: Vec::new(),
            devices_scanned: 0,
            error: None,
            completed_at: None,
        }
    }
}

#[derive(Debug, Default)]
struct Slot<S> {
    snapshot: S,
    generation: u64,
    cancel: Option<CancellationToken>,
}

impl<S> Slot<S> {
    /// Supersede whatever is running and hand out the new scan's generation and token.
    fn begin(&mut self, running: S) -> (u64, CancellationToken) {
        if let Some(old) = self.cancel.take() {
            old.cancel();
        }
        self.generation += 1;
        self.snapshot = running;
        let cancel = CancellationToken::new();
        self.cancel = Some(cancel.clone());
        (self.generation, cancel)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    fn finish(&mut self, snapshot: S) {
        self.snapshot = snapshot;
        self.cancel = None;
    }
}

/// Holds the latest result of each flow and runs scans against one [`Engine`].
#[derive(Clone)]
pub struct ScanSession {
    engine: Arc<Engine>,
    dashboard: Arc<RwLock<Slot<DashboardSnapshot>>>,
    security: Arc<RwLock<Slot<SecuritySnapshot>>>,
}

impl ScanSession {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            dashboard: Arc::new(RwLock::new(Slot::default())),
            security: Arc::new(RwLock::new(Slot::default())),
        }
    }

    pub async fn dashboard(&self) -> DashboardSnapshot {
        self.dashboard.read().await.snapshot.clone()
    }

    pub async fn security(&self) -> SecuritySnapshot {
        self.security.read().await.snapshot.clone()
    }

    /// Start a device discovery. Returns the `Running` snapshot it published and the scan task.
    pub async fn start_discovery(&self) -> (DashboardSnapshot, JoinHandle<()>) {
        let running = DashboardSnapshot {
            state: ScanState::Running,
            ..DashboardSnapshot::default()
        };
        let (generation, cancel) = self.dashboard.write().await.begin(running.clone());

        let engine = self.engine.clone();
        let dashboard = self.dashboard.clone();
        let task = tokio::spawn(async move {
            let res = engine.discover_devices_with(&cancel).await;
            let mut slot = dashboard.write().await;
            if !slot.is_current(generation) {
                debug!(generation, "discarding superseded discovery result");
                return;
            }
            let snapshot = match res {
                Ok(devices) => DashboardSnapshot {
                    state: ScanState::Complete,
                    devices,
                    error: None,
                    completed_at: Some(now_rfc3339()),
                },
                Err(e) => {
                    warn!(error = %e, "device discovery could not run");
                    DashboardSnapshot {
                        state: terminal_state(&e),
                        error: Some(e.to_string()),
                        completed_at: Some(now_rfc3339()),
                        ..DashboardSnapshot::default()
                    }
                }
            };
            slot.finish(snapshot);
        });
        (running, task)
    }

    /// Start a security scan. Returns the `Running`/`Discovering` snapshot and the scan task.
    pub async fn start_security_scan(&self) -> (SecuritySnapshot, JoinHandle<()>) {
        let running = running_security(SecurityPhase::Discovering, 0);
        let (generation, cancel) = self.security.write().await.begin(running.clone());

        let engine = self.engine.clone();
        let security = self.security.clone();
        let task = tokio::spawn(async move {
            let live = engine.security_live_hosts(&cancel).await;
            let live = match live {
                Ok(live) => live,
                Err(e) => {
                    warn!(error = %e, "security scan could not run");
                    let mut slot = security.write().await;
                    if slot.is_current(generation) {
                        slot.finish(SecuritySnapshot {
                            state: terminal_state(&e),
                            status: e.to_string(),
                            error: Some(e.to_string()),
                            completed_at: Some(now_rfc3339()),
                            ..SecuritySnapshot::default()
                        });
                    }
                    return;
                }
            };

            {
                let mut slot = security.write().await;
                if !slot.is_current(generation) {
                    debug!(generation, "discarding superseded security scan");
                    return;
                }
                slot.snapshot =
                    running_security(SecurityPhase::Scanning { hosts: live.len() }, live.len());
            }

            let vulnerabilities = engine.scan_ports(&live, &cancel).await;

            let mut slot = security.write().await;
            if !slot.is_current(generation) {
                debug!(generation, "discarding superseded security scan");
                return;
            }
            slot.finish(SecuritySnapshot {
                state: ScanState::Complete,
                phase: SecurityPhase::Complete,
                status: SecurityPhase::Complete.status_text(),
                vulnerabilities,
                devices_scanned: live.len(),
                error: None,
                completed_at: Some(now_rfc3339()),
            });
        });
        (running, task)
    }
}

fn running_security(phase: SecurityPhase, devices_scanned: usize) -> SecuritySnapshot {
    SecuritySnapshot {
        state: ScanState::Running,
        phase,
        status: phase.status_text(),
        devices_scanned,
        ..SecuritySnapshot::default()
    }
}

fn terminal_state(e: &ScanError) -> ScanState {
    match e {
        ScanError::NotConnected => ScanState::NotConnected,
        _ => ScanState::Failed,
    }
}

fn now_rfc3339() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}
