// src/scan.rs
//! One polling pass: build records, filter, sort, format.
//!
//! The very first pass only seeds the novelty set; alerts start from the second pass.

use chrono::{DateTime, TimeZone};
use metrics::{counter, gauge};
use serde::Serialize;
use std::fmt::Display;

use crate::feed::{FeedSnapshot, FeedSource};
use crate::filter::{self, FilterSettings};
use crate::format::NotificationFormatter;
use crate::health::HealthSignal;
use crate::novelty::NoveltyTracker;
use crate::sighting::{RawSighting, ReferenceLocation, SightingRecord, SpeciesLookup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    FirstRun,
    Steady,
}

/// What one cycle did.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Phase the cycle ran in (before any transition).
    pub phase: Phase,
    pub signal: HealthSignal,
    pub received: usize,
    pub malformed: usize,
    pub pruned: usize,
    /// Accepted records, nearest first.
    pub accepted: Vec<SightingRecord>,
    /// Message to hand to the sink, if any.
    pub message: Option<String>,
}

pub struct ScanCycle {
    phase: Phase,
    novelty: NoveltyTracker,
    settings: FilterSettings,
    reference: ReferenceLocation,
    species: Box<dyn SpeciesLookup + Send + Sync>,
    formatter: NotificationFormatter,
    evict_expired: bool,
}

impl ScanCycle {
    pub fn new(
        reference: ReferenceLocation,
        settings: FilterSettings,
        species: Box<dyn SpeciesLookup + Send + Sync>,
    ) -> Self {
        Self {
            phase: Phase::FirstRun,
            novelty: NoveltyTracker::new(),
            settings,
            reference,
            species,
            formatter: NotificationFormatter::default(),
            evict_expired: false,
        }
    }

    pub fn with_formatter(mut self, formatter: NotificationFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Drop fingerprints of expired sightings at the start of each cycle.
    pub fn with_expiry_eviction(mut self, on: bool) -> Self {
        self.evict_expired = on;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn novelty(&self) -> &NoveltyTracker {
        &self.novelty
    }

    /// Fetch from `feed` and process the snapshot. A fetch error counts as a failed
    /// request and an empty cycle; it still completes the cycle.
    pub async fn run<Tz>(&mut self, feed: &dyn FeedSource, now: &DateTime<Tz>) -> CycleReport
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let snapshot = match feed.fetch().await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(target: "scan", feed = feed.name(), "feed fetch failed: {e:#}");
                FeedSnapshot::failed()
            }
        };
        self.process(snapshot, now)
    }

    /// Process an already fetched snapshot.
    pub fn process<Tz>(&mut self, snapshot: FeedSnapshot, now: &DateTime<Tz>) -> CycleReport
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let phase = self.phase;
        let pruned = if self.evict_expired {
            self.novelty.prune_expired(now.timestamp())
        } else {
            0
        };

        let received = snapshot.sightings.len();
        let mut accepted = self.accept(&snapshot.sightings);
        // stable: equal distances keep feed order
        accepted.sort_by_key(|r| r.distance_m);

        let message = match phase {
            Phase::FirstRun => {
                self.phase = Phase::Steady;
                tracing::info!(
                    target: "scan",
                    seeded = accepted.len(),
                    "first cycle: novelty seeded, alerts suppressed"
                );
                None
            }
            Phase::Steady => self.formatter.format_batch(&accepted, now),
        };

        counter!("sentinel_scan_cycles_total").increment(1);
        counter!("sentinel_sightings_seen_total").increment(received as u64);
        gauge!("sentinel_novelty_size").set(self.novelty.len() as f64);
        gauge!("sentinel_last_scan_ts").set(now.timestamp() as f64);

        tracing::info!(
            target: "scan",
            received,
            malformed = snapshot.malformed,
            accepted = accepted.len(),
            pruned,
            novelty = self.novelty.len(),
            notify = message.is_some(),
            "scan cycle done"
        );

        CycleReport {
            phase,
            signal: snapshot.signal,
            received,
            malformed: snapshot.malformed,
            pruned,
            accepted,
            message,
        }
    }

    fn accept(&mut self, raws: &[RawSighting]) -> Vec<SightingRecord> {
        let mut out = Vec::new();
        for raw in raws {
            let record = SightingRecord::build(raw, &self.reference, self.species.as_ref());
            if filter::is_notify_worthy(&record, &self.settings, &mut self.novelty) {
                out.push(record);
            }
        }
        out
    }
}
