//! FILENAME: core/records/src/diagnostics.rs
//! PURPOSE: Explicit channel for configuration warnings.
//! CONTEXT: Evaluation never fails; a misconfigured metric or filter degrades to
//! a default and reports what happened here instead of printing. Callers pick
//! the sink: `LogSink` in the app, a `Vec<Diagnostic>` in tests.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticCode {
    /// An aggregation that needs a field was declared without one.
    MissingField,
    /// A filter value was supplied for a key no filter declares.
    UnknownFilterKey,
    /// A filter value's shape does not fit the filter's type.
    MismatchedFilterValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    /// Id of the metric or key of the filter concerned.
    pub subject: String,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(code: DiagnosticCode, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            code,
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn info(code: DiagnosticCode, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Info,
            code,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}: {}", self.code, self.subject, self.message)
    }
}

/// Receives diagnostics raised during evaluation.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => log::warn!(target: "diagnostics", "{}", diagnostic),
            Severity::Info => log::debug!(target: "diagnostics", "{}", diagnostic),
        }
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}
