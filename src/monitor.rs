// src/monitor.rs
//! Orchestrator that owns all cross-cycle state and drives it from two timers.
//!
//! Everything mutable (novelty set, scan phase, health state) lives in `Monitor` and is
//! only touched from the task running `Monitor::run`, so nothing here needs a lock.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::config::MonitorConfig;
use crate::feed::FeedSource;
use crate::format::NotificationFormatter;
use crate::health::{HealthEvent, HealthSignal, HealthState, SourceHealthMonitor};
use crate::notify::{self, Notifier};
use crate::scan::{CycleReport, Phase, ScanCycle};

/// Read-only view published after every tick.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub phase: Phase,
    pub novelty_size: usize,
    pub health: HealthState,
    pub failure_threshold: u32,
    pub last_cycle: Option<LastCycle>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LastCycle {
    pub at: DateTime<Utc>,
    pub signal: HealthSignal,
    pub received: usize,
    pub malformed: usize,
    pub accepted: usize,
    pub notified: bool,
}

/// Result of one scan tick.
pub struct TickOutcome {
    pub report: CycleReport,
    pub health_event: Option<HealthEvent>,
    /// Spawned sends. The run loop drops these; tests await them.
    pub deliveries: Vec<JoinHandle<()>>,
}

/// Timer periods for the two loops.
#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    pub scan: Duration,
    pub refresh: Duration,
}

pub struct Monitor {
    scan: ScanCycle,
    health: SourceHealthMonitor,
    feed: Arc<dyn FeedSource>,
    notifier: Arc<dyn Notifier>,
    status: watch::Sender<StatusSnapshot>,
}

impl Monitor {
    pub fn new(
        scan: ScanCycle,
        health: SourceHealthMonitor,
        feed: Arc<dyn FeedSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let initial = StatusSnapshot {
            phase: scan.phase(),
            novelty_size: scan.novelty().len(),
            health: health.state(),
            failure_threshold: health.threshold(),
            last_cycle: None,
        };
        let (status, _rx) = watch::channel(initial);
        Self {
            scan,
            health,
            feed,
            notifier,
            status,
        }
    }

    /// Wire a monitor from startup configuration.
    pub fn from_config(
        cfg: &MonitorConfig,
        feed: Arc<dyn FeedSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let reference = cfg.reference().context("reference location")?;
        let species = cfg.species_table().context("species table")?;
        if species.is_empty() {
            tracing::warn!(target: "scan", "species table is empty; every sighting gets a placeholder name");
        }
        let scan = ScanCycle::new(reference, cfg.filter_settings(), Box::new(species))
            .with_formatter(NotificationFormatter::new(cfg.map_link_base.clone()))
            .with_expiry_eviction(cfg.evict_expired_fingerprints);
        let health = SourceHealthMonitor::new(cfg.failure_threshold);
        Ok(Self::new(scan, health, feed, notifier))
    }

    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.status.subscribe()
    }

    pub fn health(&self) -> HealthState {
        self.health.state()
    }

    pub fn phase(&self) -> Phase {
        self.scan.phase()
    }

    /// One scan-timer tick: fetch, filter, alert, and report the request's health.
    pub async fn scan_tick(&mut self) -> TickOutcome {
        let now = Local::now();
        let report = self.scan.run(self.feed.as_ref(), &now).await;

        let mut deliveries = Vec::new();
        let health_event = self.observe(report.signal, &mut deliveries);
        if let Some(msg) = &report.message {
            deliveries.push(notify::dispatch(self.notifier.clone(), msg.clone()));
        }

        self.publish(Some(LastCycle {
            at: now.with_timezone(&Utc),
            signal: report.signal,
            received: report.received,
            malformed: report.malformed,
            accepted: report.accepted.len(),
            notified: report.message.is_some(),
        }));

        TickOutcome {
            report,
            health_event,
            deliveries,
        }
    }

    /// One refresh-timer tick: poke the upstream and report that request's health.
    pub async fn refresh_tick(&mut self) -> (Option<HealthEvent>, Vec<JoinHandle<()>>) {
        let mut deliveries = Vec::new();
        let event = match self.feed.refresh().await {
            Some(signal) => {
                tracing::debug!(target: "feed", signal = signal.as_str(), "refresh requested");
                self.observe(signal, &mut deliveries)
            }
            None => None,
        };
        let last = self.status.borrow().last_cycle.clone();
        self.publish(last);
        (event, deliveries)
    }

    fn observe(
        &mut self,
        signal: HealthSignal,
        deliveries: &mut Vec<JoinHandle<()>>,
    ) -> Option<HealthEvent> {
        let event = self.health.observe(signal);
        if let Some(ev) = event {
            deliveries.push(notify::dispatch(self.notifier.clone(), ev.message()));
        }
        event
    }

    fn publish(&self, last_cycle: Option<LastCycle>) {
        self.status.send_replace(StatusSnapshot {
            phase: self.scan.phase(),
            novelty_size: self.scan.novelty().len(),
            health: self.health.state(),
            failure_threshold: self.health.threshold(),
            last_cycle,
        });
    }

    /// Run both timers forever. The two loops are not synchronized; each tick works on
    /// whatever the feed exposes at that moment.
    pub async fn run(mut self, schedule: Schedule) {
        let mut scan = time::interval(schedule.scan);
        let mut refresh = time::interval(schedule.refresh);
        scan.set_missed_tick_behavior(MissedTickBehavior::Delay);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            target: "scan",
            scan_secs = schedule.scan.as_secs(),
            refresh_secs = schedule.refresh.as_secs(),
            "monitor started"
        );

        loop {
            tokio::select! {
                _ = scan.tick() => {
                    let _ = self.scan_tick().await;
                }
                _ = refresh.tick() => {
                    let _ = self.refresh_tick().await;
                }
            }
        }
    }
}
