//! Per-run diagnostics collection.
//!
//! Layout never aborts mid-document: cascade misses, impossible geometry
//! and missing resources all degrade and append a record here instead.
//! The host surfaces the accumulated records as a single end-of-run report.
//!
//! Each conversion run owns its own `Diagnostics` value; nothing in this
//! module is process-global, so concurrent runs cannot observe each
//! other's records.

use std::collections::HashSet;
use std::fmt;

/// How serious a diagnostic record is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational; no visible degradation.
    Info,
    /// Something degraded (fallback value, overflow, placeholder).
    Warning,
    /// A rule or resource was skipped entirely.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A single structured diagnostic record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// How serious the record is.
    pub severity: Severity,
    /// Which component or element produced it (e.g. `"css"`, `"<td>"`).
    pub context: String,
    /// Human-readable message.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.context, self.severity, self.message)
    }
}

/// Collector for one conversion run.
///
/// Identical `(context, message)` pairs are recorded once; a stylesheet
/// that uses an unsupported unit a thousand times produces one record.
#[derive(Debug, Default)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
    seen: HashSet<(String, String)>,
}

impl Diagnostics {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, deduplicating identical context/message pairs.
    pub fn report(&mut self, severity: Severity, context: &str, message: &str) {
        let key = (context.to_string(), message.to_string());
        if self.seen.insert(key) {
            self.records.push(Diagnostic {
                severity,
                context: context.to_string(),
                message: message.to_string(),
            });
        }
    }

    /// Shorthand for a [`Severity::Warning`] record.
    pub fn warn(&mut self, context: &str, message: &str) {
        self.report(Severity::Warning, context, message);
    }

    /// Shorthand for a [`Severity::Error`] record.
    pub fn error(&mut self, context: &str, message: &str) {
        self.report(Severity::Error, context, message);
    }

    /// All records accumulated so far, in insertion order.
    #[must_use]
    pub fn records(&self) -> &[Diagnostic] {
        &self.records
    }

    /// Whether any record of the given severity (or worse) exists.
    #[must_use]
    pub fn has_at_least(&self, severity: Severity) -> bool {
        self.records.iter().any(|r| r.severity >= severity)
    }

    /// Consume the collector and return the end-of-run report.
    #[must_use]
    pub fn into_report(self) -> Vec<Diagnostic> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_identical_messages() {
        let mut diags = Diagnostics::new();
        diags.warn("css", "unsupported unit 'ex'");
        diags.warn("css", "unsupported unit 'ex'");
        diags.warn("css", "unsupported unit 'ch'");
        assert_eq!(diags.records().len(), 2);
    }

    #[test]
    fn test_severity_ordering() {
        let mut diags = Diagnostics::new();
        diags.report(Severity::Info, "layout", "note");
        assert!(!diags.has_at_least(Severity::Warning));
        diags.warn("layout", "overflow");
        assert!(diags.has_at_least(Severity::Warning));
        assert!(!diags.has_at_least(Severity::Error));
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut diags = Diagnostics::new();
        diags.warn("a", "first");
        diags.error("b", "second");
        let report = diags.into_report();
        assert_eq!(report[0].message, "first");
        assert_eq!(report[1].severity, Severity::Error);
    }
}
