//! Reads warnings and errors out of plain-text log files.
//!
//! A line carrying a severity keyword as a whole word, anywhere on the line,
//! starts a new event. Indented lines, `at ...` frames and `Caused by` lines
//! that follow form its stack trace.
use super::{LogRecorder, Severity};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, warn};

/// An event parsed from a log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedEvent {
    pub severity: Severity,
    pub message: String,
    pub stack_trace: String,
}

/// Parses every event in `text`, including `Info` ones.
pub fn parse_log(text: &str) -> Vec<IngestedEvent> {
    let mut events: Vec<IngestedEvent> = Vec::new();
    let mut trace: Vec<&str> = Vec::new();

    for line in text.lines() {
        if is_continuation(line) {
            if !events.is_empty() {
                trace.push(line.trim_end());
            }
            continue;
        }

        let Some((severity, message)) = split_severity(line) else {
            continue;
        };

        if let Some(last) = events.last_mut() {
            last.stack_trace = trace.join("\n");
        }
        trace.clear();

        events.push(IngestedEvent {
            severity,
            message: message.to_string(),
            stack_trace: String::new(),
        });
    }

    if let Some(last) = events.last_mut() {
        last.stack_trace = trace.join("\n");
    }

    events
}

/// Records the parsed events, returning how many were tracked.
pub fn feed(recorder: &mut LogRecorder, events: &[IngestedEvent]) -> usize {
    let mut tracked = 0;
    for event in events {
        if event.severity.is_tracked() {
            tracked += 1;
        }
        recorder.record(event.severity, &event.message, &event.stack_trace);
    }
    tracked
}

/// Reads and parses a log file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_file(path: &Path) -> Result<Vec<IngestedEvent>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read log file {}", path.display()))?;
    let events = parse_log(&text);
    if events.is_empty() {
        warn!("No log events found in {}", path.display());
    } else {
        debug!("Parsed {} events from {}", events.len(), path.display());
    }
    Ok(events)
}

fn is_continuation(line: &str) -> bool {
    if line.trim().is_empty() {
        return false;
    }
    let trimmed = line.trim_start();
    line.starts_with(char::is_whitespace)
        || trimmed.starts_with("at ")
        || trimmed.starts_with("Caused by")
}

/// Finds the severity keyword and returns it with the message that follows.
fn split_severity(line: &str) -> Option<(Severity, &str)> {
    words(line)
        .find_map(|(end, word)| {
            let keyword = word.trim_matches(|c: char| "[]():,<>".contains(c));
            Severity::from_keyword(keyword).map(|severity| (severity, end))
        })
        .map(|(severity, end)| {
            let message = line[end..]
                .trim_start_matches(|c: char| c.is_whitespace() || ":]-|".contains(c));
            (severity, message.trim_end())
        })
}

/// Yields whitespace-separated words with the byte offset just past each one.
fn words(line: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut rest = 0;
    std::iter::from_fn(move || {
        let start = rest + line[rest..].find(|c: char| !c.is_whitespace())?;
        let end = line[start..]
            .find(char::is_whitespace)
            .map_or(line.len(), |len| start + len);
        rest = end;
        Some((end, &line[start..end]))
    })
}
