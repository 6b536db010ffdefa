// src/novelty.rs
//! Set of fingerprints already accepted by the scan cycle.
//!
//! Append-only unless expiry eviction is enabled. Insertion order is kept so the
//! status snapshot and tests can reason about "first seen" order.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct NoveltyTracker {
    order: Vec<String>,
    // fingerprint -> expiry (unix seconds) of the sighting that introduced it
    expiry: HashMap<String, i64>,
}

impl NoveltyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.expiry.contains_key(fingerprint)
    }

    /// Insert a fingerprint. Returns `false` (and changes nothing) if it was already present.
    pub fn insert(&mut self, fingerprint: &str, expires_at: i64) -> bool {
        if self.contains(fingerprint) {
            return false;
        }
        self.order.push(fingerprint.to_string());
        self.expiry.insert(fingerprint.to_string(), expires_at);
        true
    }

    /// Drop fingerprints whose sighting expired strictly before `now_unix`.
    /// Returns how many were removed.
    pub fn prune_expired(&mut self, now_unix: i64) -> usize {
        let before = self.order.len();
        self.expiry.retain(|_, exp| *exp >= now_unix);
        let expiry = &self.expiry;
        self.order.retain(|fp| expiry.contains_key(fp));
        before - self.order.len()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Fingerprints in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}
