// src/filter.rs
//! Per-record relevance gate: ignored species, distance, novelty (in that order).

use metrics::counter;
use std::collections::BTreeSet;
use std::fmt;

use crate::novelty::NoveltyTracker;
use crate::sighting::SightingRecord;

/// Why a record was not offered for notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    IgnoredSpecies,
    TooFar,
    AlreadySeen,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::IgnoredSpecies => "ignored_species",
            SkipReason::TooFar => "too_far",
            SkipReason::AlreadySeen => "already_seen",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static filter settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct FilterSettings {
    pub ignored_species: BTreeSet<String>,
    pub max_distance_m: u64,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            ignored_species: BTreeSet::new(),
            max_distance_m: 1000,
        }
    }
}

/// Evaluate one record. On acceptance the fingerprint is recorded in `seen` right away.
pub fn evaluate(
    record: &SightingRecord,
    settings: &FilterSettings,
    seen: &mut NoveltyTracker,
) -> Result<(), SkipReason> {
    if settings.ignored_species.contains(&record.species_name) {
        return Err(SkipReason::IgnoredSpecies);
    }
    if record.distance_m > settings.max_distance_m {
        return Err(SkipReason::TooFar);
    }
    if !seen.insert(&record.fingerprint, record.expires_at) {
        return Err(SkipReason::AlreadySeen);
    }
    Ok(())
}

/// Boolean form of [`evaluate`] that also logs the decision.
pub fn is_notify_worthy(
    record: &SightingRecord,
    settings: &FilterSettings,
    seen: &mut NoveltyTracker,
) -> bool {
    match evaluate(record, settings, seen) {
        Ok(()) => {
            tracing::info!(
                target: "filter",
                species = %record.species_name,
                distance_m = record.distance_m,
                fingerprint = %record.fingerprint,
                "accepted"
            );
            counter!("sentinel_sightings_accepted_total").increment(1);
            true
        }
        Err(reason) => {
            tracing::debug!(
                target: "filter",
                species = %record.species_name,
                distance_m = record.distance_m,
                %reason,
                "skipped"
            );
            counter!("sentinel_sightings_skipped_total", "reason" => reason.as_str()).increment(1);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sighting::{fingerprint, RawCoord};

    fn rec(species: &str, distance_m: u64) -> SightingRecord {
        SightingRecord {
            species_name: species.to_string(),
            lat: RawCoord::parse("1.0").unwrap(),
            long: RawCoord::parse("2.0").unwrap(),
            distance_m,
            expires_at: 0,
            fingerprint: fingerprint(species, "1.0", "2.0"),
        }
    }

    fn settings() -> FilterSettings {
        FilterSettings {
            ignored_species: BTreeSet::from(["Rattata".to_string()]),
            max_distance_m: 1000,
        }
    }

    #[test]
    fn species_checked_before_distance() {
        let mut seen = NoveltyTracker::new();
        assert_eq!(
            evaluate(&rec("Rattata", 5000), &settings(), &mut seen),
            Err(SkipReason::IgnoredSpecies)
        );
    }

    #[test]
    fn distance_checked_before_novelty() {
        let mut seen = NoveltyTracker::new();
        seen.insert(&rec("Pidgey", 1200).fingerprint, 0);
        assert_eq!(
            evaluate(&rec("Pidgey", 1200), &settings(), &mut seen),
            Err(SkipReason::TooFar)
        );
    }

    #[test]
    fn boundary_distance_is_accepted() {
        let mut seen = NoveltyTracker::new();
        assert_eq!(evaluate(&rec("Pidgey", 1000), &settings(), &mut seen), Ok(()));
    }

    #[test]
    fn acceptance_marks_seen() {
        let mut seen = NoveltyTracker::new();
        let r = rec("Pidgey", 500);
        assert!(is_notify_worthy(&r, &settings(), &mut seen));
        assert!(seen.contains(&r.fingerprint));
        assert_eq!(evaluate(&r, &settings(), &mut seen), Err(SkipReason::AlreadySeen));
    }

    #[test]
    fn rejected_records_do_not_touch_seen() {
        let mut seen = NoveltyTracker::new();
        assert!(!is_notify_worthy(&rec("Rattata", 10), &settings(), &mut seen));
        assert!(!is_notify_worthy(&rec("Pidgey", 9999), &settings(), &mut seen));
        assert!(seen.is_empty());
    }
}
