//! Per-first-party decision log, pruned on a fixed interval.

use std::collections::HashMap;

use chrono::{TimeZone, Utc};

use crate::types::{ElementType, LogAction};

const PRUNE_THRESHOLD_SECONDS: i64 = 30 * 60;

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub action: LogAction,
    pub first_party_url: String,
    pub request_url: String,
    pub resource_type: ElementType,
    pub rule: String,
    pub timestamp: i64,
}

impl LogEntry {
    /// Renders `timestamp` as a wall-clock time for display in a log
    /// table, e.g. `"3:04:05 PM"`.
    pub fn formatted_time(&self) -> String {
        match Utc.timestamp_opt(self.timestamp, 0).single() {
            Some(dt) => dt.format("%l:%M:%S %p").to_string().trim().to_string(),
            None => String::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Log {
    entries: HashMap<String, Vec<LogEntry>>,
}

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(
        &mut self,
        action: LogAction,
        first_party_url: &str,
        request_url: &str,
        resource_type: ElementType,
        rule: &str,
        timestamp: i64,
    ) {
        self.entries
            .entry(first_party_url.to_string())
            .or_default()
            .push(LogEntry {
                action,
                first_party_url: first_party_url.to_string(),
                request_url: request_url.to_string(),
                resource_type,
                rule: rule.to_string(),
                timestamp,
            });
    }

    pub fn entries_for(&self, first_party_url: &str) -> &[LogEntry] {
        self.entries
            .get(first_party_url)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All entries across all first-party URLs, sorted ascending by
    /// timestamp (oldest first). See DESIGN.md for why ascending was
    /// chosen over the original's mismatched comment.
    pub fn all_entries(&self) -> Vec<&LogEntry> {
        let mut all: Vec<&LogEntry> = self.entries.values().flatten().collect();
        all.sort_by_key(|e| e.timestamp);
        all
    }

    /// Removes every entry older than 30 minutes relative to `now`
    /// (unix seconds). Intended to be called by a periodic host tick.
    pub fn prune(&mut self, now: i64) {
        for list in self.entries.values_mut() {
            list.retain(|e| now - e.timestamp < PRUNE_THRESHOLD_SECONDS);
        }
        self.entries.retain(|_, list| !list.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_grouped_by_first_party_url() {
        let mut log = Log::new();
        log.add_entry(LogAction::Block, "https://a.com", "https://ad.net/x", ElementType::SCRIPT, "rule1", 100);
        log.add_entry(LogAction::Allow, "https://b.com", "https://cdn.net/y", ElementType::IMAGE, "rule2", 101);
        assert_eq!(log.entries_for("https://a.com").len(), 1);
        assert_eq!(log.entries_for("https://b.com").len(), 1);
        assert_eq!(log.entries_for("https://missing.com").len(), 0);
    }

    #[test]
    fn all_entries_sorted_ascending_by_timestamp() {
        let mut log = Log::new();
        log.add_entry(LogAction::Block, "a", "x", ElementType::SCRIPT, "r", 200);
        log.add_entry(LogAction::Block, "a", "y", ElementType::SCRIPT, "r", 50);
        let all = log.all_entries();
        assert_eq!(all[0].timestamp, 50);
        assert_eq!(all[1].timestamp, 200);
    }

    #[test]
    fn formatted_time_renders_wall_clock_string() {
        let mut log = Log::new();
        log.add_entry(LogAction::Block, "a", "x", ElementType::SCRIPT, "r", 0);
        let formatted = log.entries_for("a")[0].formatted_time();
        assert!(formatted.ends_with("AM") || formatted.ends_with("PM"));
    }

    #[test]
    fn prune_removes_entries_older_than_30_minutes() {
        let mut log = Log::new();
        log.add_entry(LogAction::Block, "a", "x", ElementType::SCRIPT, "r", 0);
        log.add_entry(LogAction::Block, "a", "y", ElementType::SCRIPT, "r", 1_800);
        log.prune(1_800);
        assert_eq!(log.entries_for("a").len(), 1);
        assert_eq!(log.entries_for("a")[0].timestamp, 1_800);
    }
}
