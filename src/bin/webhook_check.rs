//! Sends one test line to the configured webhook so the endpoint can be checked by hand.

use anyhow::Context;
use spawn_sentinel::notify::{validate_endpoint, Notifier, WebhookNotifier};
use spawn_sentinel::MonitorConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = MonitorConfig::load_default().context("loading configuration")?;
    let endpoint = validate_endpoint(cfg.webhook_url.as_deref(), &cfg.webhook_pattern)
        .context("webhook endpoint")?;

    let text = format!(
        "spawn-sentinel webhook check @ {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    WebhookNotifier::new(endpoint)
        .with_timeout(cfg.request_timeout_secs)
        .send(&text)
        .await?;

    println!("webhook-check done");
    Ok(())
}
