//! Destinations for user-facing status output.
//!
//! Diagnostics go through `tracing`; the lines a user reads (change
//! notices, dashboards, health summaries) go to a [`StatusSink`].

use std::sync::{Arc, Mutex};

/// Receives every line of user-facing monitor output.
pub trait StatusSink: Send + Sync {
    fn emit(&self, text: &str);
}

/// Prints to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl StatusSink for StdoutSink {
    fn emit(&self, text: &str) {
        println!("{text}");
    }
}

/// Keeps output in memory so it can be inspected.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything emitted so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if any emitted text contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }

    /// Number of emitted texts containing `needle`.
    pub fn count(&self, needle: &str) -> usize {
        self.lines().iter().filter(|line| line.contains(needle)).count()
    }

    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }
}

impl StatusSink for MemorySink {
    fn emit(&self, text: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(text.to_string());
        }
    }
}
