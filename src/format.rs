// src/format.rs
//! Renders a batch of accepted sightings into one chat message (Slack mrkdwn).

use chrono::{DateTime, TimeZone};
use std::fmt::Display;

use crate::sighting::SightingRecord;

pub const DEFAULT_MAP_LINK_BASE: &str = "https://www.google.com/maps?q=";

#[derive(Debug, Clone)]
pub struct NotificationFormatter {
    map_link_base: String,
}

impl Default for NotificationFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_MAP_LINK_BASE)
    }
}

impl NotificationFormatter {
    /// `map_link_base` gets `<lat>,<long>` appended to build each record's link.
    pub fn new(map_link_base: impl Into<String>) -> Self {
        Self {
            map_link_base: map_link_base.into(),
        }
    }

    pub fn link_for(&self, record: &SightingRecord) -> String {
        format!(
            "{}{},{}",
            self.map_link_base, record.lat.text, record.long.text
        )
    }

    pub fn format_line<Tz>(&self, record: &SightingRecord, now: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let remaining = record.remaining_secs(now.timestamp());
        format!(
            "{}  —  *<{}|{}>*  —  {}m away  —  {}:{:02}",
            now.format("%H:%M:%S"),
            self.link_for(record),
            escape_mrkdwn(&record.species_name),
            record.distance_m,
            remaining / 60,
            remaining % 60
        )
    }

    /// One line per record, in the given order. `None` for an empty batch.
    pub fn format_batch<Tz>(&self, records: &[SightingRecord], now: &DateTime<Tz>) -> Option<String>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        if records.is_empty() {
            return None;
        }
        let lines: Vec<String> = records.iter().map(|r| self.format_line(r, now)).collect();
        Some(lines.join("\n"))
    }
}

/// Slack control characters: `&`, `<` and `>` must be sent as HTML entities.
pub fn escape_mrkdwn(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
