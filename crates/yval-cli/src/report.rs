//! # Diagnostic Reports
//!
//! Per-document results of a `check` run and their text and JSON
//! renderings.

use std::fmt;
use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;
use yval_schema::{Severity, Violation};

/// Outcome of checking one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub document: PathBuf,
    pub violations: Vec<Violation>,
    /// Set when the document could not be read or parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentReport {
    pub fn checked(document: PathBuf, violations: Vec<Violation>) -> Self {
        Self {
            document,
            violations,
            error: None,
        }
    }

    pub fn failed(document: PathBuf, error: String) -> Self {
        Self {
            document,
            violations: Vec::new(),
            error: Some(error),
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == severity)
            .count()
    }
}

/// Exit status for a set of reports.
///
/// `2` if any document could not be loaded, `1` if any error-severity
/// violation was found (or any warning with `deny_warnings`), else `0`.
pub fn exit_code(reports: &[DocumentReport], deny_warnings: bool) -> u8 {
    if reports.iter().any(|r| r.error.is_some()) {
        return 2;
    }
    let failing = |r: &DocumentReport| {
        r.count(Severity::Error) > 0 || (deny_warnings && r.count(Severity::Warning) > 0)
    };
    if reports.iter().any(failing) {
        1
    } else {
        0
    }
}

/// `file:line:column: severity[kind] message` lines followed by a summary.
pub fn render_text(reports: &[DocumentReport]) -> String {
    TextReport(reports).to_string()
}

/// Display adapter behind [`render_text`].
#[derive(Debug, Clone, Copy)]
pub struct TextReport<'a>(pub &'a [DocumentReport]);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (mut errors, mut warnings, mut failed) = (0, 0, 0);

        for report in self.0 {
            let name = report.document.display();
            if let Some(error) = &report.error {
                failed += 1;
                writeln!(f, "{name}: cannot check: {error}")?;
                continue;
            }
            for violation in &report.violations {
                let span = violation.span();
                writeln!(
                    f,
                    "{name}:{}:{}: {}[{}] {}",
                    span.start_line,
                    span.start_column,
                    violation.severity,
                    violation.kind,
                    violation.message
                )?;
            }
            errors += report.count(Severity::Error);
            warnings += report.count(Severity::Warning);
        }

        write!(
            f,
            "{} document(s) checked: {errors} error(s), {warnings} warning(s)",
            self.0.len()
        )?;
        if failed > 0 {
            write!(f, ", {failed} unreadable")?;
        }
        writeln!(f)
    }
}

/// Pretty-printed JSON array of reports.
pub fn render_json(reports: &[DocumentReport]) -> Result<String> {
    Ok(serde_json::to_string_pretty(reports)?)
}
