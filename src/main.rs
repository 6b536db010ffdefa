//! spawn-sentinel — binary entrypoint.
//! Loads config, validates the webhook, then runs the scan and refresh timers until Ctrl-C.

use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use spawn_sentinel::feed::http::HttpFeed;
use spawn_sentinel::notify::validate_endpoint;
use spawn_sentinel::{status, Monitor, MonitorConfig, Schedule, WebhookNotifier};

/// `RUST_LOG` wins; otherwise info for this crate. `LOG_FORMAT=json` for JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("spawn_sentinel=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = MonitorConfig::load_default().context("loading configuration")?;

    // The only fatal path: no validated endpoint, no monitor.
    let endpoint = validate_endpoint(cfg.webhook_url.as_deref(), &cfg.webhook_pattern)
        .context("webhook endpoint (set webhook_url or SENTINEL_WEBHOOK_URL)")?;
    let notifier = Arc::new(WebhookNotifier::new(endpoint).with_timeout(cfg.request_timeout_secs));

    let feed_url = cfg
        .feed_url
        .clone()
        .ok_or_else(|| anyhow!("feed_url is not configured (or SENTINEL_FEED_URL)"))?;
    let feed = Arc::new(
        HttpFeed::new(feed_url)
            .with_refresh_url(cfg.refresh_url.clone())
            .with_timeout(cfg.request_timeout_secs),
    );

    let monitor = Monitor::from_config(&cfg, feed, notifier)?;

    if let Some(addr) = cfg.status_addr {
        let metrics = match status::install_metrics() {
            Ok(h) => Some(h),
            Err(e) => {
                tracing::warn!("metrics disabled: {e:#}");
                None
            }
        };
        let app = status::router(monitor.subscribe(), metrics);
        tokio::spawn(async move {
            if let Err(e) = status::serve(addr, app).await {
                tracing::error!("status server stopped: {e:#}");
            }
        });
    }

    let schedule = Schedule {
        scan: cfg.scan_interval(),
        refresh: cfg.refresh_interval(),
    };

    tokio::select! {
        _ = monitor.run(schedule) => {}
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                tracing::warn!("ctrl-c handler failed: {e}");
            }
            tracing::info!("shutting down");
        }
    }
    Ok(())
}
