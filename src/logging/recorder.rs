//! This module provides the recorder that keeps the most recent distinct
//! warnings and errors for inclusion in a bug report.
//!
//! Identical events are collapsed into one entry whose timestamp is refreshed
//! on every repeat. Once the recorder is full, the entry that was seen least
//! recently makes room for the new one.
use super::{LogEntry, Severity};
use chrono::{DateTime, Local};
use std::fmt::Write;
use tracing::warn;

/// The number of distinct entries kept when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 32;

const DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// A bounded, deduplicating store of log entries.
#[derive(Debug, Clone)]
pub struct LogRecorder {
    entries: Vec<LogEntry>,
    capacity: usize,
}

impl Default for LogRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl LogRecorder {
    /// Creates a new `LogRecorder`.
    ///
    /// # Arguments
    ///
    /// * `capacity` - The maximum number of distinct entries to keep. A
    ///   capacity of zero is raised to one, with a warning.
    pub fn new(capacity: usize) -> Self {
        if capacity == 0 {
            warn!("Log capacity 0 is too small, keeping 1 entry");
        }
        let capacity = capacity.max(1);
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Records an event as seen now.
    pub fn record(&mut self, severity: Severity, message: &str, stack_trace: &str) {
        self.record_at(severity, message, stack_trace, Local::now());
    }

    /// Records an event as seen at `at`.
    ///
    /// `Info` events are ignored. A repeat of an existing event only refreshes
    /// its timestamp and keeps its position.
    pub fn record_at(
        &mut self,
        severity: Severity,
        message: &str,
        stack_trace: &str,
        at: DateTime<Local>,
    ) {
        if !severity.is_tracked() {
            return;
        }

        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| entry.matches(severity, message, stack_trace))
        {
            entry.last_seen_at = at;
            return;
        }

        if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }

        self.entries.push(LogEntry {
            message: message.to_string(),
            stack_trace: stack_trace.to_string(),
            severity,
            last_seen_at: at,
        });
    }

    /// Removes the entry with the oldest timestamp, the first one on ties.
    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .enumerate()
            .min_by_key(|(_, entry)| entry.last_seen_at)
            .map(|(index, _)| index);

        if let Some(index) = oldest {
            self.entries.remove(index);
        }
    }

    /// Renders the recorded entries as Backlog markup, most recent first.
    ///
    /// The entries are sorted in place, so later calls to `entries` observe
    /// the same order.
    pub fn export_formatted(&mut self) -> String {
        self.entries.sort_by(|a, b| b.last_seen_at.cmp(&a.last_seen_at));

        let mut text = String::new();
        for entry in &self.entries {
            let Some(color) = entry.severity.color() else {
                continue;
            };
            // Writing into a String cannot fail.
            let _ = writeln!(text, "''&color({}) {{ {}'' }}", color, entry.severity);
            let _ = writeln!(
                text,
                "''LastDate'' {}",
                entry.last_seen_at.format(DATE_FORMAT)
            );
            let _ = writeln!(text, "''Message'' {}", entry.message);
            let _ = writeln!(text, "''StackTrace'' {}", entry.stack_trace);
        }
        text
    }

    /// The entries in their current order.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 5, 1, 12, 0, secs)
            .single()
            .expect("valid local time")
    }

    fn messages(recorder: &LogRecorder) -> Vec<&str> {
        recorder
            .entries()
            .iter()
            .map(|entry| entry.message.as_str())
            .collect()
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut recorder = LogRecorder::new(4);
        for i in 0..20u32 {
            let severity = if i % 2 == 0 {
                Severity::Error
            } else {
                Severity::Warning
            };
            recorder.record_at(severity, &format!("m{}", i % 7), "", t(i));
            assert!(recorder.len() <= recorder.capacity());
        }
        assert_eq!(recorder.len(), 4);
    }

    #[test]
    fn repeated_event_collapses_and_refreshes_timestamp() {
        let mut recorder = LogRecorder::default();
        recorder.record_at(Severity::Error, "boom", "at main", t(1));
        recorder.record_at(Severity::Error, "boom", "at main", t(5));

        assert_eq!(recorder.len(), 1);
        assert_eq!(recorder.entries()[0].last_seen_at, t(5));
    }

    #[test]
    fn repeat_keeps_position() {
        let mut recorder = LogRecorder::default();
        recorder.record_at(Severity::Error, "a", "", t(1));
        recorder.record_at(Severity::Error, "b", "", t(2));
        recorder.record_at(Severity::Error, "a", "", t(3));

        assert_eq!(messages(&recorder), vec!["a", "b"]);
    }

    #[test]
    fn triple_must_match_exactly() {
        let mut recorder = LogRecorder::default();
        recorder.record_at(Severity::Error, "same", "trace", t(1));
        recorder.record_at(Severity::Warning, "same", "trace", t(2));
        recorder.record_at(Severity::Error, "same", "trace ", t(3));
        recorder.record_at(Severity::Error, "Same", "trace", t(4));

        assert_eq!(recorder.len(), 4);
    }

    #[test]
    fn overflow_evicts_least_recently_seen() {
        let capacity = 5;
        let mut recorder = LogRecorder::new(capacity);
        for i in 0..=capacity as u32 {
            recorder.record_at(Severity::Error, &format!("m{i}"), "", t(i));
        }

        assert_eq!(recorder.len(), capacity);
        assert!(!messages(&recorder).contains(&"m0"));
        for i in 1..=capacity {
            assert!(messages(&recorder).contains(&format!("m{i}").as_str()));
        }
    }

    #[test]
    fn refreshed_entry_survives_eviction() {
        let mut recorder = LogRecorder::new(2);
        recorder.record_at(Severity::Error, "old", "", t(1));
        recorder.record_at(Severity::Error, "middle", "", t(2));
        recorder.record_at(Severity::Error, "old", "", t(3));
        recorder.record_at(Severity::Error, "new", "", t(4));

        assert_eq!(messages(&recorder), vec!["old", "new"]);
    }

    #[test]
    fn eviction_tie_removes_first_in_order() {
        let mut recorder = LogRecorder::new(2);
        recorder.record_at(Severity::Error, "first", "", t(1));
        recorder.record_at(Severity::Warning, "second", "", t(1));
        recorder.record_at(Severity::Error, "third", "", t(2));

        assert_eq!(messages(&recorder), vec!["second", "third"]);
    }

    #[test]
    fn info_is_ignored() {
        let mut recorder = LogRecorder::new(2);
        recorder.record_at(Severity::Info, "routine", "", t(1));
        assert!(recorder.is_empty());

        recorder.record_at(Severity::Error, "a", "", t(2));
        recorder.record_at(Severity::Warning, "b", "", t(3));
        recorder.record_at(Severity::Info, "routine", "", t(4));
        assert_eq!(messages(&recorder), vec!["a", "b"]);
    }

    #[test]
    fn capacity_two_example() {
        let mut recorder = LogRecorder::new(2);
        recorder.record_at(Severity::Error, "m1", "s1", t(1));
        recorder.record_at(Severity::Warning, "m2", "s2", t(2));
        recorder.record_at(Severity::Error, "m3", "s3", t(3));

        assert_eq!(messages(&recorder), vec!["m2", "m3"]);
    }

    #[test]
    fn empty_export_is_empty() {
        let mut recorder = LogRecorder::default();
        assert_eq!(recorder.export_formatted(), "");
    }

    #[test]
    fn export_lists_most_recent_first() {
        let mut recorder = LogRecorder::default();
        recorder.record_at(Severity::Error, "A", "", t(1));
        recorder.record_at(Severity::Error, "B", "", t(3));
        recorder.record_at(Severity::Error, "C", "", t(2));

        let text = recorder.export_formatted();
        let b = text.find("''Message'' B").expect("B exported");
        let c = text.find("''Message'' C").expect("C exported");
        let a = text.find("''Message'' A").expect("A exported");
        assert!(b < c && c < a);

        // The sort is applied to the recorder itself.
        assert_eq!(messages(&recorder), vec!["B", "C", "A"]);
    }

    #[test]
    fn export_block_layout() {
        let mut recorder = LogRecorder::default();
        recorder.record_at(Severity::Warning, "low disk", "at check()", t(7));
        recorder.record_at(Severity::Assert, "x > 0", "", t(8));

        let expected = "''&color(#ff0000) { Assert'' }\n\
                        ''LastDate'' 2024/05/01 12:00:08\n\
                        ''Message'' x > 0\n\
                        ''StackTrace'' \n\
                        ''&color(#bbbb00) { Warning'' }\n\
                        ''LastDate'' 2024/05/01 12:00:07\n\
                        ''Message'' low disk\n\
                        ''StackTrace'' at check()\n";
        assert_eq!(recorder.export_formatted(), expected);
    }

    #[test]
    fn zero_capacity_keeps_one_entry() {
        let mut recorder = LogRecorder::new(0);
        recorder.record_at(Severity::Error, "a", "", t(1));
        recorder.record_at(Severity::Error, "b", "", t(2));
        assert_eq!(messages(&recorder), vec!["b"]);
    }
}
