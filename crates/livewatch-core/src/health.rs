//! Connection health counters.
//!
//! Plain attempt/success counters per read category. They characterise how
//! reliably the host answers; they are not analytics.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// Read categories tracked by the health counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthCategory {
    Transport,
    Session,
}

impl HealthCategory {
    pub const ALL: [Self; 2] = [Self::Transport, Self::Session];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Session => "session",
        }
    }
}

impl fmt::Display for HealthCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Success ratio of one category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SuccessRate {
    /// Nothing attempted yet
    NotAvailable,
    /// Percentage in 0.0..=100.0
    Percent(f64),
}

impl fmt::Display for SuccessRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAvailable => f.write_str("N/A"),
            Self::Percent(p) => write!(f, "{p:.1}%"),
        }
    }
}

impl Serialize for SuccessRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Attempted vs. successful reads for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HealthCounter {
    pub attempts: u64,
    pub successes: u64,
}

impl HealthCounter {
    pub fn rate(&self) -> SuccessRate {
        if self.attempts == 0 {
            SuccessRate::NotAvailable
        } else {
            SuccessRate::Percent(self.successes as f64 / self.attempts as f64 * 100.0)
        }
    }
}

/// Per-category counters for one active monitoring period.
#[derive(Debug, Clone, Default)]
pub struct ConnectionHealthTracker {
    counters: BTreeMap<HealthCategory, HealthCounter>,
}

impl ConnectionHealthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_attempt(&mut self, category: HealthCategory) {
        let counter = self.counters.entry(category).or_default();
        counter.attempts = counter.attempts.saturating_add(1);
    }

    pub fn record_success(&mut self, category: HealthCategory) {
        let counter = self.counters.entry(category).or_default();
        counter.successes = counter.successes.saturating_add(1);
    }

    /// Records one attempt and, if `succeeded`, its success.
    pub fn record(&mut self, category: HealthCategory, succeeded: bool) {
        self.record_attempt(category);
        if succeeded {
            self.record_success(category);
        }
    }

    pub fn counter(&self, category: HealthCategory) -> HealthCounter {
        self.counters.get(&category).copied().unwrap_or_default()
    }

    pub fn rate(&self, category: HealthCategory) -> SuccessRate {
        self.counter(category).rate()
    }

    /// True when no category has any attempt recorded.
    pub fn is_empty(&self) -> bool {
        self.counters.values().all(|c| c.attempts == 0)
    }

    /// Zeroes every counter (start of a new active period).
    pub fn reset(&mut self) {
        self.counters.clear();
    }

    /// One-line rates for the dashboard footer.
    pub fn rates_line(&self) -> String {
        HealthCategory::ALL
            .iter()
            .map(|c| format!("{c} {}", self.rate(*c)))
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// Multi-line summary of every category with attempts.
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "Connection health: no reads attempted".to_string();
        }

        let mut out = String::from("Connection health:");
        for (category, counter) in &self.counters {
            if counter.attempts == 0 {
                continue;
            }
            out.push_str(&format!(
                "\n  {category}: {}/{} ok ({})",
                counter.successes,
                counter.attempts,
                counter.rate()
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_not_available_without_attempts() {
        let tracker = ConnectionHealthTracker::new();
        assert_eq!(tracker.rate(HealthCategory::Transport), SuccessRate::NotAvailable);
        assert_eq!(tracker.rate(HealthCategory::Transport).to_string(), "N/A");
    }

    #[test]
    fn test_rate_three_of_ten() {
        let mut tracker = ConnectionHealthTracker::new();
        for i in 0..10 {
            tracker.record(HealthCategory::Session, i < 3);
        }
        assert_eq!(
            tracker.counter(HealthCategory::Session),
            HealthCounter {
                attempts: 10,
                successes: 3
            }
        );
        assert_eq!(tracker.rate(HealthCategory::Session).to_string(), "30.0%");
    }

    #[test]
    fn test_categories_are_independent() {
        let mut tracker = ConnectionHealthTracker::new();
        tracker.record(HealthCategory::Transport, true);
        assert_eq!(tracker.rate(HealthCategory::Transport).to_string(), "100.0%");
        assert_eq!(tracker.rate(HealthCategory::Session), SuccessRate::NotAvailable);
    }

    #[test]
    fn test_summary_empty() {
        let tracker = ConnectionHealthTracker::new();
        assert_eq!(tracker.summary(), "Connection health: no reads attempted");
    }

    #[test]
    fn test_summary_lists_only_attempted() {
        let mut tracker = ConnectionHealthTracker::new();
        tracker.record(HealthCategory::Transport, true);
        tracker.record(HealthCategory::Transport, false);

        let summary = tracker.summary();
        assert!(summary.contains("transport: 1/2 ok (50.0%)"));
        assert!(!summary.contains("session"));
    }

    #[test]
    fn test_reset_clears_counters() {
        let mut tracker = ConnectionHealthTracker::new();
        tracker.record(HealthCategory::Transport, true);
        tracker.reset();
        assert!(tracker.is_empty());
        assert_eq!(tracker.counter(HealthCategory::Transport), HealthCounter::default());
    }

    #[test]
    fn test_rates_line() {
        let mut tracker = ConnectionHealthTracker::new();
        tracker.record(HealthCategory::Transport, true);
        assert_eq!(tracker.rates_line(), "transport 100.0% | session N/A");
    }

    #[test]
    fn test_success_rate_serializes_as_text() {
        let json = serde_json::to_string(&SuccessRate::Percent(30.0)).unwrap();
        assert_eq!(json, "\"30.0%\"");
    }
}
