// src/notify/memory.rs
use anyhow::Result;
use std::sync::Mutex;

use super::Notifier;

/// Test helper: keeps every message in memory.
#[derive(Default)]
pub struct RecordingNotifier {
    pub calls: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.calls.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        if let Ok(mut v) = self.calls.lock() {
            v.push(text.to_string());
        }
        Ok(())
    }
}
