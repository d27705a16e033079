//! REST API over a finished simulation run.
//!
//! Provides three GET endpoints:
//! - `/state`: run config, panel summary, tracking report and latest sample
//! - `/history`: recorded samples with optional iteration range filtering
//! - `/iv-curve`: I-V curve and maximum power point of the final panel state

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::panel::Panel;
use crate::sim::kpi::TrackingReport;
use crate::sim::types::{Sample, SimConfig};

/// Immutable application state shared across all request handlers.
///
/// Constructed once after the simulation run completes and wrapped in
/// `Arc`; all data is read-only so no locks are needed.
pub struct AppState {
    /// Run configuration.
    pub config: SimConfig,
    /// Tracking report for the run.
    pub report: TrackingReport,
    /// Recorded samples.
    pub samples: Vec<Sample>,
    /// Panel in its final environment.
    pub panel: Panel,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/history", get(handlers::get_history))
        .route("/iv-curve", get(handlers::get_iv_curve))
        .with_state(state)
}

/// Binds to the given address and serves the API until the server stops.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
