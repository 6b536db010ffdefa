// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod feed;
pub mod filter;
pub mod format;
pub mod geo;
pub mod health;
pub mod monitor;
pub mod novelty;
pub mod notify;
pub mod scan;
pub mod sighting;
pub mod status;

// ---- Re-exports for stable public API ----
pub use crate::config::MonitorConfig;
pub use crate::health::{HealthEvent, HealthSignal, SourceHealthMonitor};
pub use crate::monitor::{Monitor, Schedule, StatusSnapshot};
pub use crate::notify::{Notifier, WebhookNotifier};
pub use crate::scan::{Phase, ScanCycle};
pub use crate::sighting::{RawSighting, SightingRecord};
