// src/notify/mod.rs
//! Outbound message sink. Sends are best-effort: spawned, logged, never retried.

pub mod memory;
pub mod webhook;

use anyhow::Result;
use metrics::counter;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub use memory::RecordingNotifier;
pub use webhook::{validate_endpoint, WebhookNotifier, DEFAULT_ENDPOINT_PATTERN};

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

/// Fire-and-forget delivery. The returned handle is only useful to tests; callers in the
/// monitor drop it.
pub fn dispatch(notifier: Arc<dyn Notifier>, text: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        match notifier.send(&text).await {
            Ok(()) => {
                counter!("sentinel_notifications_sent_total").increment(1);
                tracing::info!(target: "notify", lines = text.lines().count(), "notification sent");
            }
            Err(e) => {
                counter!("sentinel_notification_errors_total").increment(1);
                tracing::warn!(target: "notify", "notification failed: {e:#}");
            }
        }
    })
}
