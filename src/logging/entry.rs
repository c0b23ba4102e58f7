//! This module defines the structure for a single recorded log event.
use chrono::{DateTime, Local};
use std::fmt;
use tracing::Level;

/// The severity of a log event.
///
/// Only `Warning` and the error-class severities are kept by the recorder;
/// `Info` covers every routine log statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Exception,
    Assert,
    Warning,
    Info,
}

impl Severity {
    /// Returns `true` for the severities the recorder tracks.
    pub fn is_tracked(self) -> bool {
        !matches!(self, Severity::Info)
    }

    /// The Backlog color used to highlight an entry of this severity, if any.
    pub fn color(self) -> Option<&'static str> {
        match self {
            Severity::Error | Severity::Exception | Severity::Assert => Some("#ff0000"),
            Severity::Warning => Some("#bbbb00"),
            Severity::Info => None,
        }
    }

    /// Parses a severity keyword such as `ERROR`, `warn` or `Assert`.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "error" => Some(Severity::Error),
            "exception" => Some(Severity::Exception),
            "assert" => Some(Severity::Assert),
            "warn" | "warning" => Some(Severity::Warning),
            "info" | "log" | "debug" | "trace" => Some(Severity::Info),
            _ => None,
        }
    }
}

impl From<Level> for Severity {
    fn from(level: Level) -> Self {
        match level {
            Level::ERROR => Severity::Error,
            Level::WARN => Severity::Warning,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Error => "Error",
            Severity::Exception => "Exception",
            Severity::Assert => "Assert",
            Severity::Warning => "Warning",
            Severity::Info => "Log",
        };
        f.write_str(name)
    }
}

/// A distinct log event together with the last time it was seen.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// The log message content.
    pub message: String,
    /// The stack trace reported with the event, possibly empty.
    pub stack_trace: String,
    /// The severity of the event.
    pub severity: Severity,
    /// When an identical event was last recorded.
    pub last_seen_at: DateTime<Local>,
}

impl LogEntry {
    /// Returns `true` if this entry describes the same event.
    pub fn matches(&self, severity: Severity, message: &str, stack_trace: &str) -> bool {
        self.severity == severity && self.message == message && self.stack_trace == stack_trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_tracing_levels() {
        assert_eq!(Severity::from(Level::ERROR), Severity::Error);
        assert_eq!(Severity::from(Level::WARN), Severity::Warning);
        assert_eq!(Severity::from(Level::INFO), Severity::Info);
        assert_eq!(Severity::from(Level::TRACE), Severity::Info);
    }

    #[test]
    fn parses_keywords_case_insensitively() {
        assert_eq!(Severity::from_keyword("WARNING"), Some(Severity::Warning));
        assert_eq!(Severity::from_keyword("Exception"), Some(Severity::Exception));
        assert_eq!(Severity::from_keyword("debug"), Some(Severity::Info));
        assert_eq!(Severity::from_keyword("note"), None);
        assert_eq!(Severity::from_keyword("fatal"), None);
    }

    #[test]
    fn only_info_is_untracked() {
        assert!(Severity::Assert.is_tracked());
        assert!(!Severity::Info.is_tracked());
        assert_eq!(Severity::Info.color(), None);
        assert_eq!(Severity::Exception.color(), Some("#ff0000"));
    }
}
