// src/feed/mod.rs
//! Upstream sighting feed: the collaborator contract plus its HTTP and scripted adapters.
//!
//! Every completed request reports its own `HealthSignal` through the returned value,
//! so the orchestrator sees each request exactly once.

pub mod fixture;
pub mod http;

use anyhow::{Context, Result};
use metrics::counter;
use serde::Deserialize;

use crate::health::HealthSignal;
use crate::sighting::RawSighting;

/// Current snapshot as returned by one fetch.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub signal: HealthSignal,
    pub sightings: Vec<RawSighting>,
    pub malformed: usize,
}

impl FeedSnapshot {
    pub fn ok(sightings: Vec<RawSighting>) -> Self {
        Self {
            signal: HealthSignal::Success,
            sightings,
            malformed: 0,
        }
    }

    pub fn failed() -> Self {
        Self {
            signal: HealthSignal::Failure,
            sightings: Vec::new(),
            malformed: 0,
        }
    }
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the current snapshot. `Err` means the request itself did not complete
    /// usefully and is counted as a failure by the caller.
    async fn fetch(&self) -> Result<FeedSnapshot>;

    /// Ask the upstream to regenerate its data. `None` when the source has no refresh
    /// trigger, so nothing is reported to health.
    async fn refresh(&self) -> Option<HealthSignal>;

    fn name(&self) -> &'static str;
}

/// Wire shape of one feed response.
#[derive(Debug, Deserialize)]
struct FeedPayload {
    #[serde(default)]
    status: Option<serde_json::Value>,
    #[serde(default, alias = "pokemons", alias = "items")]
    sightings: Vec<serde_json::Value>,
}

/// A response carrying any non-null `status` marker is a failure.
pub fn classify(body: &serde_json::Value) -> HealthSignal {
    match body.get("status") {
        Some(v) if !v.is_null() => HealthSignal::Failure,
        _ => HealthSignal::Success,
    }
}

/// Decode a feed body. Elements that fail to decode are skipped and counted.
pub fn decode_snapshot(body: &str) -> Result<FeedSnapshot> {
    let payload: FeedPayload = serde_json::from_str(body).context("parsing feed json")?;

    if payload.status.as_ref().is_some_and(|s| !s.is_null()) {
        tracing::debug!(target: "feed", status = ?payload.status, "feed reported status marker");
        return Ok(FeedSnapshot::failed());
    }

    let mut sightings = Vec::with_capacity(payload.sightings.len());
    let mut malformed = 0usize;
    for (idx, item) in payload.sightings.into_iter().enumerate() {
        match serde_json::from_value::<RawSighting>(item) {
            Ok(raw) => sightings.push(raw),
            Err(e) => {
                malformed += 1;
                tracing::warn!(target: "feed", index = idx, error = %e, "skipping malformed sighting");
            }
        }
    }
    if malformed > 0 {
        counter!("sentinel_sightings_malformed_total").increment(malformed as u64);
    }

    Ok(FeedSnapshot {
        signal: HealthSignal::Success,
        sightings,
        malformed,
    })
}
