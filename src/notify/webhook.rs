// src/notify/webhook.rs
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use reqwest::Client;
use std::time::Duration;

use super::Notifier;

/// Slack incoming-webhook URL shape.
pub const DEFAULT_ENDPOINT_PATTERN: &str =
    r"^https://hooks\.slack\.com/services/[A-Za-z0-9]+/[A-Za-z0-9]+/[A-Za-z0-9]+$";

/// Check `url` against `pattern` (a regex). Returns the trimmed URL on success.
pub fn validate_endpoint(url: Option<&str>, pattern: &str) -> Result<String> {
    let url = url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| anyhow!("no webhook endpoint configured"))?;
    let re = Regex::new(pattern).with_context(|| format!("invalid endpoint pattern {pattern:?}"))?;
    if !re.is_match(url) {
        return Err(anyhow!("webhook endpoint does not match the expected shape"));
    }
    Ok(url.to_string())
}

/// Posts `{"text": ...}` to a chat webhook.
pub struct WebhookNotifier {
    webhook_url: Option<String>,
    client: Client,
    timeout: Duration,
}

impl WebhookNotifier {
    /// Endpoint must already be validated.
    pub fn new(url: String) -> Self {
        Self {
            webhook_url: Some(url),
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }

    /// Validates first; an invalid endpoint yields a notifier that drops every message.
    pub fn checked(url: Option<&str>, pattern: &str) -> Self {
        let webhook_url = match validate_endpoint(url, pattern) {
            Ok(u) => Some(u),
            Err(e) => {
                tracing::warn!(target: "notify", "webhook disabled: {e:#}");
                None
            }
        };
        Self {
            webhook_url,
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let Some(url) = &self.webhook_url else {
            tracing::warn!(target: "notify", "message dropped: no valid webhook endpoint");
            return Ok(());
        };

        let body = serde_json::json!({ "text": text });

        self.client
            .post(url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .context("webhook post")?
            .error_for_status()
            .context("webhook non-2xx")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slack_shape_accepted() {
        let u = "https://hooks.slack.com/services/T000/B000/XXXXabcd";
        assert_eq!(validate_endpoint(Some(u), DEFAULT_ENDPOINT_PATTERN).unwrap(), u);
        assert!(validate_endpoint(Some(&format!("  {u} ")), DEFAULT_ENDPOINT_PATTERN).is_ok());
    }

    #[test]
    fn other_shapes_rejected() {
        for bad in [
            "http://hooks.slack.com/services/T000/B000/XXX",
            "https://example.com/hook",
            "https://hooks.slack.com/services/T000/B000",
            "",
        ] {
            assert!(
                validate_endpoint(Some(bad), DEFAULT_ENDPOINT_PATTERN).is_err(),
                "{bad}"
            );
        }
        assert!(validate_endpoint(None, DEFAULT_ENDPOINT_PATTERN).is_err());
    }

    #[test]
    fn custom_pattern() {
        assert!(validate_endpoint(Some("http://127.0.0.1:9/x"), r"^http://127\.0\.0\.1").is_ok());
        assert!(validate_endpoint(Some("x"), "(").is_err());
    }

    #[tokio::test]
    async fn disabled_notifier_drops_silently() {
        let n = WebhookNotifier::checked(Some("nope"), DEFAULT_ENDPOINT_PATTERN);
        assert!(!n.is_enabled());
        assert!(n.send("hello").await.is_ok());
    }
}
