//! Diagnostic records and the final report.
//!
//! Every stage produces [`Diagnostic`]s; the runner gathers them, in stage
//! order, into a [`Report`] that renders as tagged text or JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Exit code when at least one ERROR diagnostic was recorded
pub const EXIT_LINT_ERRORS: i32 = 2;

/// Exit code for fatal conditions (unreadable root/file, bad settings)
pub const EXIT_FATAL: i32 = 1;

/// Diagnostic severity. Only `Error` affects the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warn => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// What kind of problem a diagnostic describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Malformed rule line or CIDR, malformed group definition
    Syntax,
    /// Selector group option pointing at an unknown name
    Reference,
    /// Repeated rule line or proxy group name
    Duplicate,
    /// Missing local file, non-HTTPS, untrusted or (under the `fail`
    /// policy) unreachable URL
    Source,
    /// Remote rule-set did not answer the probe, reported as a WARN
    Reachability,
    /// Cosmetic problems such as trailing whitespace
    Style,
    /// Shape of the configuration file itself
    Config,
}

/// Where a diagnostic points to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// File path relative to the root directory
    pub file: String,
    /// 1-based line number, when the finding is tied to one line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.file, line),
            None => write!(f, "{}", self.file),
        }
    }
}

/// A single finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<IssueKind>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Diagnostic {
    pub fn error(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind: Some(kind),
            message: message.into(),
            location: None,
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warn,
            kind: None,
            message: message.into(),
            location: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            kind: None,
            message: message.into(),
            location: None,
        }
    }

    pub fn with_kind(mut self, kind: IssueKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Attach a file and line number
    pub fn at(mut self, file: impl Into<String>, line: usize) -> Self {
        self.location = Some(Location {
            file: file.into(),
            line: Some(line),
        });
        self
    }

    /// Attach a file without a specific line
    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.location = Some(Location {
            file: file.into(),
            line: None,
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.severity)?;
        if let Some(ref location) = self.location {
            write!(f, "{}: ", location)?;
        }
        write!(f, "{}", self.message)
    }
}

/// Counts per severity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub files_checked: usize,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl Summary {
    pub fn from_diagnostics(files_checked: usize, diagnostics: &[Diagnostic]) -> Self {
        let count = |severity: Severity| {
            diagnostics
                .iter()
                .filter(|d| d.severity == severity)
                .count()
        };
        Self {
            files_checked,
            errors: count(Severity::Error),
            warnings: count(Severity::Warn),
            infos: count(Severity::Info),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Summary: {} file(s) checked, {} error(s), {} warning(s), {} info",
            self.files_checked, self.errors, self.warnings, self.infos
        )
    }
}

/// Output format of the final report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid format '{}'. Valid values: text, json", s)),
        }
    }
}

/// Complete result of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report layout version
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub root: String,
    pub summary: Summary,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn new(root: impl Into<String>, files_checked: usize, diagnostics: Vec<Diagnostic>) -> Self {
        let summary = Summary::from_diagnostics(files_checked, &diagnostics);
        Self {
            version: "1.0".to_string(),
            timestamp: Utc::now(),
            root: root.into(),
            summary,
            diagnostics,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }

    /// Process exit code: any ERROR is a failure, WARN and INFO are not
    pub fn exit_code(&self) -> i32 {
        if self.has_errors() {
            EXIT_LINT_ERRORS
        } else {
            0
        }
    }

    /// Tagged text rendering, one diagnostic per block, summary last
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for diagnostic in &self.diagnostics {
            out.push_str(&diagnostic.to_string());
            out.push('\n');
        }
        out.push_str(&self.summary.to_string());
        out.push('\n');
        out
    }

    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn render(&self, format: OutputFormat) -> serde_json::Result<String> {
        match format {
            OutputFormat::Text => Ok(self.render_text()),
            OutputFormat::Json => self.render_json(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_error_with_location() {
        let d = Diagnostic::error(IssueKind::Syntax, "invalid rule 'FOO,bar'").at("ads.list", 3);
        assert_eq!(d.to_string(), "[ERROR] ads.list:3: invalid rule 'FOO,bar'");
    }

    #[test]
    fn test_display_warn_without_location() {
        let d = Diagnostic::warn("config file not found");
        assert_eq!(d.to_string(), "[WARN] config file not found");
    }

    #[test]
    fn test_display_info_in_file() {
        let d = Diagnostic::info("repeated rule-set name").in_file("config/custom.ini");
        assert_eq!(d.to_string(), "[INFO] config/custom.ini: repeated rule-set name");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warn);
        assert!(Severity::Warn > Severity::Info);
    }

    #[test]
    fn test_summary_counts() {
        let diagnostics = vec![
            Diagnostic::error(IssueKind::Syntax, "a"),
            Diagnostic::error(IssueKind::Duplicate, "b"),
            Diagnostic::warn("c"),
            Diagnostic::info("d"),
        ];
        let summary = Summary::from_diagnostics(5, &diagnostics);
        assert_eq!(summary.files_checked, 5);
        assert_eq!(summary.errors, 2);
        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.infos, 1);
    }

    #[test]
    fn test_exit_code_only_errors_fail() {
        let report = Report::new("/r", 1, vec![Diagnostic::warn("w"), Diagnostic::info("i")]);
        assert!(!report.has_errors());
        assert_eq!(report.exit_code(), 0);

        let report = Report::new("/r", 1, vec![Diagnostic::error(IssueKind::Source, "e")]);
        assert!(report.has_errors());
        assert_eq!(report.exit_code(), EXIT_LINT_ERRORS);
    }

    #[test]
    fn test_render_text_ends_with_summary() {
        let report = Report::new("/r", 2, vec![Diagnostic::warn("w")]);
        let text = report.render_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "[WARN] w");
        assert!(lines[1].starts_with("Summary: 2 file(s) checked, 0 error(s), 1 warning(s)"));
    }

    #[test]
    fn test_render_json() {
        let report = Report::new(
            "/r",
            1,
            vec![Diagnostic::error(IssueKind::Reference, "unknown group").at("c.ini", 7)],
        );
        let json = report.render_json().unwrap();
        assert!(json.contains("\"version\": \"1.0\""));
        assert!(json.contains("\"severity\": \"error\""));
        assert!(json.contains("\"kind\": \"reference\""));
        assert!(json.contains("\"line\": 7"));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
