// src/config.rs
//! Startup configuration: TOML file + environment overrides. Fixed for the process lifetime.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::filter::FilterSettings;
use crate::format::DEFAULT_MAP_LINK_BASE;
use crate::geo::Coordinate;
use crate::health::DEFAULT_FAILURE_THRESHOLD;
use crate::notify::DEFAULT_ENDPOINT_PATTERN;
use crate::sighting::SpeciesTable;

pub const DEFAULT_CONFIG_PATH: &str = "config/sentinel.toml";
pub const ENV_CONFIG_PATH: &str = "SENTINEL_CONFIG_PATH";

/// Lowest allowed feed-refresh period.
pub const MIN_REFRESH_INTERVAL_SECS: u64 = 30;

fn default_max_distance_m() -> u64 {
    1000
}
fn default_scan_interval_secs() -> u64 {
    30
}
fn default_refresh_interval_secs() -> u64 {
    120
}
fn default_failure_threshold() -> u32 {
    DEFAULT_FAILURE_THRESHOLD
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_webhook_pattern() -> String {
    DEFAULT_ENDPOINT_PATTERN.to_string()
}
fn default_map_link_base() -> String {
    DEFAULT_MAP_LINK_BASE.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceCfg {
    pub lat: f64,
    pub long: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub reference: Option<ReferenceCfg>,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_webhook_pattern")]
    pub webhook_pattern: String,
    #[serde(default)]
    pub feed_url: Option<String>,
    #[serde(default)]
    pub refresh_url: Option<String>,
    #[serde(default = "default_map_link_base")]
    pub map_link_base: String,
    #[serde(default = "default_max_distance_m")]
    pub max_distance_m: u64,
    #[serde(default)]
    pub ignored_species: Vec<String>,
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub evict_expired_fingerprints: bool,
    #[serde(default)]
    pub status_addr: Option<SocketAddr>,
    /// Species id (as string key) to display name.
    #[serde(default)]
    pub species: HashMap<String, String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            reference: None,
            webhook_url: None,
            webhook_pattern: default_webhook_pattern(),
            feed_url: None,
            refresh_url: None,
            map_link_base: default_map_link_base(),
            max_distance_m: default_max_distance_m(),
            ignored_species: Vec::new(),
            scan_interval_secs: default_scan_interval_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
            failure_threshold: default_failure_threshold(),
            request_timeout_secs: default_request_timeout_secs(),
            evict_expired_fingerprints: false,
            status_addr: None,
            species: HashMap::new(),
        }
    }
}

impl MonitorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: MonitorConfig = toml::from_str(s).context("parsing sentinel config toml")?;
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Resolve the config the way the binary does:
    /// 1) `$SENTINEL_CONFIG_PATH` (must exist)
    /// 2) `config/sentinel.toml` if present
    /// 3) built-in defaults
    ///
    /// then apply `SENTINEL_*` environment overrides.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
            if fallback.exists() {
                Self::load_from(&fallback)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env(|k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    /// Apply `SENTINEL_*` overrides from `lookup` (normally the process environment).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("SENTINEL_WEBHOOK_URL") {
            self.webhook_url = Some(v);
        }
        if let Some(v) = get("SENTINEL_FEED_URL") {
            self.feed_url = Some(v);
        }
        if let Some(v) = get("SENTINEL_REFRESH_URL") {
            self.refresh_url = Some(v);
        }

        let lat = get("SENTINEL_REF_LAT").map(|v| parse_env::<f64>("SENTINEL_REF_LAT", &v));
        let long = get("SENTINEL_REF_LONG").map(|v| parse_env::<f64>("SENTINEL_REF_LONG", &v));
        match (lat, long) {
            (Some(lat), Some(long)) => {
                self.reference = Some(ReferenceCfg {
                    lat: lat?,
                    long: long?,
                })
            }
            (None, None) => {}
            _ => return Err(anyhow!("SENTINEL_REF_LAT and SENTINEL_REF_LONG must be set together")),
        }

        if let Some(v) = get("SENTINEL_MAX_DISTANCE_M") {
            self.max_distance_m = parse_env("SENTINEL_MAX_DISTANCE_M", &v)?;
        }
        if let Some(v) = get("SENTINEL_SCAN_INTERVAL_SECS") {
            self.scan_interval_secs = parse_env("SENTINEL_SCAN_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = get("SENTINEL_REFRESH_INTERVAL_SECS") {
            self.refresh_interval_secs = parse_env("SENTINEL_REFRESH_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = get("SENTINEL_FAILURE_THRESHOLD") {
            self.failure_threshold = parse_env("SENTINEL_FAILURE_THRESHOLD", &v)?;
        }

        self.sanitize();
        Ok(())
    }

    fn sanitize(&mut self) {
        if self.refresh_interval_secs < MIN_REFRESH_INTERVAL_SECS {
            tracing::warn!(
                target: "config",
                requested = self.refresh_interval_secs,
                floor = MIN_REFRESH_INTERVAL_SECS,
                "refresh interval raised to floor"
            );
            self.refresh_interval_secs = MIN_REFRESH_INTERVAL_SECS;
        }
        self.scan_interval_secs = self.scan_interval_secs.max(1);
        self.failure_threshold = self.failure_threshold.max(1);
        self.request_timeout_secs = self.request_timeout_secs.max(1);
        self.ignored_species = clean_list(std::mem::take(&mut self.ignored_species));
    }

    /// Reference location; required before any sighting can be measured.
    pub fn reference(&self) -> Result<Coordinate> {
        let r = self
            .reference
            .as_ref()
            .ok_or_else(|| anyhow!("reference location is not configured"))?;
        if !(-90.0..=90.0).contains(&r.lat) || !(-180.0..=180.0).contains(&r.long) {
            return Err(anyhow!("reference location ({}, {}) out of range", r.lat, r.long));
        }
        Ok(Coordinate::new(r.lat, r.long))
    }

    pub fn filter_settings(&self) -> FilterSettings {
        FilterSettings {
            ignored_species: self.ignored_species.iter().cloned().collect(),
            max_distance_m: self.max_distance_m,
        }
    }

    pub fn species_table(&self) -> Result<SpeciesTable> {
        SpeciesTable::from_string_keys(self.species.clone())
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, v: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    v.parse::<T>()
        .with_context(|| format!("{key}={v:?} is not a valid value"))
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut set = BTreeSet::new();
    for it in items {
        let t = it.trim();
        if !t.is_empty() {
            set.insert(t.to_string());
        }
    }
    set.into_iter().collect()
}
