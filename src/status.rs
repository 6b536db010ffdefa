// src/status.rs
//! Optional read-only HTTP surface: `/status` (JSON snapshot) and `/metrics` (Prometheus).

use anyhow::{Context, Result};
use axum::{extract::State, routing::get, Json, Router};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::net::SocketAddr;
use tokio::sync::watch;

use crate::monitor::StatusSnapshot;

#[derive(Clone)]
struct StatusState {
    status: watch::Receiver<StatusSnapshot>,
    metrics: Option<PrometheusHandle>,
}

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("sentinel_scan_cycles_total", "Completed scan cycles.");
        describe_counter!("sentinel_sightings_seen_total", "Sightings received from the feed.");
        describe_counter!(
            "sentinel_sightings_accepted_total",
            "Sightings that passed species, distance and novelty checks."
        );
        describe_counter!(
            "sentinel_sightings_skipped_total",
            "Sightings rejected, labelled by reason."
        );
        describe_counter!(
            "sentinel_sightings_malformed_total",
            "Feed items that could not be decoded."
        );
        describe_counter!(
            "sentinel_feed_requests_total",
            "Completed feed requests, labelled by outcome."
        );
        describe_counter!("sentinel_notifications_sent_total", "Webhook posts that succeeded.");
        describe_counter!("sentinel_notification_errors_total", "Webhook posts that failed.");
        describe_counter!(
            "sentinel_health_transitions_total",
            "Feed up/down transitions."
        );
        describe_gauge!("sentinel_novelty_size", "Fingerprints currently tracked.");
        describe_gauge!("sentinel_feed_down", "1 while the feed is considered down.");
        describe_gauge!("sentinel_last_scan_ts", "Unix ts of the last scan cycle.");
    });
}

/// Install the global Prometheus recorder.
pub fn install_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("prometheus: install recorder")?;
    ensure_metrics_described();
    Ok(handle)
}

pub fn router(
    status: watch::Receiver<StatusSnapshot>,
    metrics: Option<PrometheusHandle>,
) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/metrics", get(get_metrics))
        .with_state(StatusState { status, metrics })
}

async fn get_status(State(st): State<StatusState>) -> Json<StatusSnapshot> {
    Json(st.status.borrow().clone())
}

async fn get_metrics(State(st): State<StatusState>) -> String {
    st.metrics.as_ref().map(|h| h.render()).unwrap_or_default()
}

/// Serve the status router until the process exits.
pub async fn serve(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding status server on {addr}"))?;
    tracing::info!(target: "status", %addr, "status server listening");
    axum::serve(listener, app).await.context("status server")?;
    Ok(())
}
