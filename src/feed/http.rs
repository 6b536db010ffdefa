// src/feed/http.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{classify, decode_snapshot, FeedSnapshot, FeedSource};
use crate::health::HealthSignal;

/// Polls a JSON endpoint for the current sightings and optionally pokes a refresh URL.
#[derive(Clone)]
pub struct HttpFeed {
    url: String,
    refresh_url: Option<String>,
    client: Client,
    timeout: Duration,
}

impl HttpFeed {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            refresh_url: None,
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_refresh_url(mut self, url: Option<String>) -> Self {
        self.refresh_url = url;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl FeedSource for HttpFeed {
    async fn fetch(&self) -> Result<FeedSnapshot> {
        let resp = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .context("feed http get()")?
            .error_for_status()
            .context("feed non-2xx")?;
        let body = resp.text().await.context("feed http .text()")?;
        decode_snapshot(&body)
    }

    async fn refresh(&self) -> Option<HealthSignal> {
        let url = self.refresh_url.as_deref()?;
        let res = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status());

        let signal = match res {
            Ok(rsp) => match rsp.json::<serde_json::Value>().await {
                Ok(v) => classify(&v),
                // a refresh endpoint answering with a non-JSON body still completed
                Err(_) => HealthSignal::Success,
            },
            Err(e) => {
                tracing::warn!(target: "feed", error = %e, "refresh request failed");
                HealthSignal::Failure
            }
        };
        Some(signal)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
