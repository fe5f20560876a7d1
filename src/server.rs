use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::session::{ScanSession, ScanState};

#[derive(Clone)]
pub struct AppState {
    session: Arc<ScanSession>,
}

/// JSON API over a [`ScanSession`].
///
/// - `GET  /api/devices`        latest discovery snapshot
/// - `POST /api/devices/scan`   start a discovery, superseding any running one
/// - `GET  /api/security`       latest security snapshot
/// - `POST /api/security/scan`  start a security scan
pub fn router(session: Arc<ScanSession>) -> Router {
    let state = AppState { session };

    let api = Router::new()
        .route("/devices", get(get_devices))
        .route("/devices/scan", post(post_devices_scan))
        .route("/security", get(get_security))
        .route("/security/scan", post(post_security_scan))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
}

/// Serve until `shutdown` resolves.
pub async fn serve(
    bind: &str,
    session: Arc<ScanSession>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(%bind, "serving scan API");
    axum::serve(listener, router(session))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

fn status_for(state: ScanState) -> StatusCode {
    match state {
        ScanState::NotConnected => StatusCode::SERVICE_UNAVAILABLE,
        ScanState::Failed => StatusCode::INTERNAL_SERVER_ERROR,
        ScanState::Idle | ScanState::Running | ScanState::Complete => StatusCode::OK,
    }
}

async fn get_devices(State(app): State<AppState>) -> impl IntoResponse {
    let snap = app.session.dashboard().await;
    (status_for(snap.state), Json(snap))
}

async fn post_devices_scan(State(app): State<AppState>) -> impl IntoResponse {
    let (running, _task) = app.session.start_discovery().await;
    (StatusCode::ACCEPTED, Json(running))
}

async fn get_security(State(app): State<AppState>) -> impl IntoResponse {
    let snap = app.session.security().await;
    (status_for(snap.state), Json(snap))
}

async fn post_security_scan(State(app): State<AppState>) -> impl IntoResponse {
    let (running, _task) = app.session.start_security_scan().await;
    (StatusCode::ACCEPTED, Json(running))
}
