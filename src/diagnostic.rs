//! Diagnostics produced while parsing.
//!
//! The parser never fails. Conditions that would otherwise be silent data
//! loss (an embedded base64 image, a missing image file, a table row with
//! the wrong number of cells) are reported here instead, and the caller
//! decides whether to log them.

use serde::{Deserialize, Serialize};

/// Severity level for a parse diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    /// The parser recovered but the output may not match intent.
    Warning,
    /// Informational note, output is unaffected.
    Info,
}

/// A diagnostic emitted during parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based line in the normalized document, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(line: usize, message: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            line: None,
            severity: Severity::Info,
            message: message.into(),
        }
    }

    /// Forward this diagnostic to the `log` facade.
    pub fn log(&self) {
        let level = match self.severity {
            Severity::Warning => log::Level::Warn,
            Severity::Info => log::Level::Debug,
        };
        match self.line {
            Some(line) => log::log!(level, "line {}: {}", line, self.message),
            None => log::log!(level, "{}", self.message),
        }
    }
}
