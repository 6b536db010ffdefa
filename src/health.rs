// src/health.rs
//! Upstream feed health with edge-triggered down/recovered events.

use metrics::{counter, gauge};
use serde::Serialize;

pub const DEFAULT_FAILURE_THRESHOLD: u32 = 50;

/// Classification of one completed upstream request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthSignal {
    Success,
    Failure,
}

impl HealthSignal {
    pub fn as_str(self) -> &'static str {
        match self {
            HealthSignal::Success => "success",
            HealthSignal::Failure => "failure",
        }
    }
}

/// Emitted only on a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthEvent {
    Down { consecutive_failures: u32 },
    Recovered,
}

impl HealthEvent {
    pub fn message(&self) -> String {
        match self {
            HealthEvent::Down {
                consecutive_failures,
            } => format!(
                ":warning: Sighting feed is down ({consecutive_failures} consecutive failed requests)"
            ),
            HealthEvent::Recovered => ":white_check_mark: Sighting feed recovered".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HealthState {
    pub consecutive_failures: u32,
    pub is_down: bool,
}

#[derive(Debug, Clone)]
pub struct SourceHealthMonitor {
    threshold: u32,
    state: HealthState,
}

impl SourceHealthMonitor {
    /// A threshold of 0 is treated as 1.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            state: HealthState::default(),
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn state(&self) -> HealthState {
        self.state
    }

    /// Feed one classified response; returns the transition it caused, if any.
    pub fn observe(&mut self, signal: HealthSignal) -> Option<HealthEvent> {
        counter!("sentinel_feed_requests_total", "outcome" => signal.as_str()).increment(1);
        let event = match signal {
            HealthSignal::Failure => {
                self.state.consecutive_failures = self.state.consecutive_failures.saturating_add(1);
                // exact equality: later failures in the same run stay silent
                if self.state.consecutive_failures == self.threshold {
                    self.state.is_down = true;
                    Some(HealthEvent::Down {
                        consecutive_failures: self.state.consecutive_failures,
                    })
                } else {
                    None
                }
            }
            HealthSignal::Success => {
                let was_down = self.state.is_down;
                self.state.is_down = false;
                self.state.consecutive_failures = 0;
                was_down.then_some(HealthEvent::Recovered)
            }
        };

        match event {
            Some(HealthEvent::Down { consecutive_failures }) => {
                tracing::warn!(target: "health", consecutive_failures, "feed marked down");
                counter!("sentinel_health_transitions_total", "to" => "down").increment(1);
                gauge!("sentinel_feed_down").set(1.0);
            }
            Some(HealthEvent::Recovered) => {
                tracing::info!(target: "health", "feed recovered");
                counter!("sentinel_health_transitions_total", "to" => "up").increment(1);
                gauge!("sentinel_feed_down").set(0.0);
            }
            None => {
                tracing::trace!(
                    target: "health",
                    signal = signal.as_str(),
                    consecutive_failures = self.state.consecutive_failures,
                    "health signal"
                );
            }
        }
        event
    }
}

impl Default for SourceHealthMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD)
    }
}
