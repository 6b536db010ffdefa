// src/feed/fixture.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{FeedSnapshot, FeedSource};
use crate::health::HealthSignal;

/// One scripted answer to `fetch`.
#[derive(Debug, Clone)]
pub enum Scripted {
    Snapshot(FeedSnapshot),
    TransportError(String),
}

/// Feed that replays a fixed script; once the script runs out the last entry repeats.
pub struct StaticFeed {
    script: Mutex<VecDeque<Scripted>>,
    last: Mutex<Option<Scripted>>,
    refresh_signal: Option<HealthSignal>,
}

impl StaticFeed {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            last: Mutex::new(None),
            refresh_signal: None,
        }
    }

    pub fn with_refresh_signal(mut self, signal: HealthSignal) -> Self {
        self.refresh_signal = Some(signal);
        self
    }

    fn next(&self) -> Option<Scripted> {
        let popped = self.script.lock().ok()?.pop_front();
        let mut last = self.last.lock().ok()?;
        match popped {
            Some(item) => {
                *last = Some(item.clone());
                Some(item)
            }
            None => last.clone(),
        }
    }
}

#[async_trait]
impl FeedSource for StaticFeed {
    async fn fetch(&self) -> Result<FeedSnapshot> {
        match self.next() {
            Some(Scripted::Snapshot(s)) => Ok(s),
            Some(Scripted::TransportError(msg)) => Err(anyhow!(msg)),
            None => Ok(FeedSnapshot::ok(Vec::new())),
        }
    }

    async fn refresh(&self) -> Option<HealthSignal> {
        self.refresh_signal
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_then_repeats_last() {
        let feed = StaticFeed::new([
            Scripted::TransportError("boom".into()),
            Scripted::Snapshot(FeedSnapshot::failed()),
        ]);
        assert!(feed.fetch().await.is_err());
        assert_eq!(feed.fetch().await.unwrap().signal, HealthSignal::Failure);
        assert_eq!(feed.fetch().await.unwrap().signal, HealthSignal::Failure);
        assert_eq!(feed.refresh().await, None);
    }

    #[tokio::test]
    async fn empty_script_yields_empty_snapshot() {
        let feed = StaticFeed::new(Vec::new());
        let snap = feed.fetch().await.unwrap();
        assert_eq!(snap.signal, HealthSignal::Success);
        assert!(snap.sightings.is_empty());
    }
}
