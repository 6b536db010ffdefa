// src/sighting.rs
//! Raw feed sightings and the per-cycle `SightingRecord` derived from them.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::geo::{self, Coordinate};

/// Fixed point the monitor measures distances from. Set once from config at startup.
pub type ReferenceLocation = Coordinate;

/// A coordinate component exactly as the feed wrote it, plus its parsed value.
///
/// The text is what identifies a sighting; the value is only used for distance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawCoord {
    pub text: String,
    pub value: f64,
}

impl RawCoord {
    pub fn parse(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let value: f64 = text
            .trim()
            .parse()
            .with_context(|| format!("coordinate {text:?} is not a number"))?;
        if !value.is_finite() {
            return Err(anyhow!("coordinate {text:?} is not finite"));
        }
        Ok(Self { text, value })
    }
}

impl<'de> Deserialize<'de> for RawCoord {
    fn deserialize<D: Deserializer<'de>>(de: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Any {
            Num(serde_json::Number),
            Text(String),
        }
        let text = match Any::deserialize(de)? {
            Any::Num(n) => n.to_string(),
            Any::Text(s) => s,
        };
        RawCoord::parse(text).map_err(serde::de::Error::custom)
    }
}

/// One entity report as delivered by the feed. Unknown fields are kept but never read.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSighting {
    #[serde(alias = "pokemon_id", alias = "speciesId")]
    pub species_id: u32,
    #[serde(alias = "latitude")]
    pub lat: RawCoord,
    #[serde(alias = "lng", alias = "lon", alias = "longitude")]
    pub long: RawCoord,
    #[serde(alias = "despawn", alias = "expiresAt", alias = "expire_timestamp")]
    pub expires_at: i64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RawSighting {
    /// Convenience constructor used by fixtures and tests.
    pub fn new(species_id: u32, lat: &str, long: &str, expires_at: i64) -> Result<Self> {
        Ok(Self {
            species_id,
            lat: RawCoord::parse(lat)?,
            long: RawCoord::parse(long)?,
            expires_at,
            extra: serde_json::Map::new(),
        })
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat.value, self.long.value)
    }
}

/// Species id to display name.
pub trait SpeciesLookup {
    fn name_of(&self, species_id: u32) -> Option<&str>;
}

/// Static lookup table loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct SpeciesTable {
    names: HashMap<u32, String>,
}

impl SpeciesTable {
    pub fn new(names: HashMap<u32, String>) -> Self {
        Self { names }
    }

    /// Build from string keys, as TOML tables can only carry string keys.
    pub fn from_string_keys(raw: HashMap<String, String>) -> Result<Self> {
        let mut names = HashMap::with_capacity(raw.len());
        for (k, v) in raw {
            let id: u32 = k
                .trim()
                .parse()
                .with_context(|| format!("species id {k:?} is not an unsigned integer"))?;
            names.insert(id, v.trim().to_string());
        }
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl SpeciesLookup for SpeciesTable {
    fn name_of(&self, species_id: u32) -> Option<&str> {
        self.names.get(&species_id).map(String::as_str)
    }
}

/// Name used when the species id is missing from the lookup.
pub fn placeholder_name(species_id: u32) -> String {
    format!("Unknown #{species_id}")
}

/// A sighting resolved against the reference location. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SightingRecord {
    pub species_name: String,
    pub lat: RawCoord,
    pub long: RawCoord,
    pub distance_m: u64,
    pub expires_at: i64,
    pub fingerprint: String,
}

impl SightingRecord {
    pub fn build(
        raw: &RawSighting,
        reference: &ReferenceLocation,
        species: &dyn SpeciesLookup,
    ) -> Self {
        let species_name = match species.name_of(raw.species_id) {
            Some(name) => name.to_string(),
            None => {
                tracing::debug!(
                    target: "scan",
                    species_id = raw.species_id,
                    "unknown species id, using placeholder name"
                );
                placeholder_name(raw.species_id)
            }
        };
        let distance_m = geo::distance(*reference, raw.coordinate());
        let fingerprint = fingerprint(&species_name, &raw.lat.text, &raw.long.text);

        Self {
            species_name,
            lat: raw.lat.clone(),
            long: raw.long.clone(),
            distance_m,
            expires_at: raw.expires_at,
            fingerprint,
        }
    }

    /// Seconds left before expiry, never negative.
    pub fn remaining_secs(&self, now_unix: i64) -> i64 {
        // expiry comes straight from the feed and may be any i64
        self.expires_at.saturating_sub(now_unix).max(0)
    }
}

/// Textual identity of a sighting: same species and same coordinate text.
pub fn fingerprint(species_name: &str, lat_text: &str, long_text: &str) -> String {
    format!("{species_name},{lat_text},{long_text}")
}
