//! Error types for rulecheck.
//!
//! Only conditions that stop the whole run live here. Findings in the
//! checked files are [`crate::diagnostic::Diagnostic`]s, never errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LintError {
    #[error("Root directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Cannot read root directory {}: {source}", .path.display())]
    UnreadableRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read file {}: {source}", .path.display())]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

impl LintError {
    pub fn unreadable_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::UnreadableFile {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_file_names_path() {
        let err = LintError::unreadable_file(
            "/tmp/rules/ads.list",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/rules/ads.list"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_invalid_settings_message() {
        let err = LintError::InvalidSettings("probe_timeout_secs must be 1..=60".into());
        assert_eq!(
            err.to_string(),
            "Invalid settings: probe_timeout_secs must be 1..=60"
        );
    }
}
