//! Settings: optional `rulecheck.yaml` at the root, overridden by CLI flags.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::error::LintError;
use crate::probe::DEFAULT_TIMEOUT_SECS;

/// File name looked up in the root directory
pub const SETTINGS_FILE: &str = "rulecheck.yaml";

/// Default location of the profile, relative to the root
pub const DEFAULT_CONFIG_PATH: &str = "config/custom.ini";

/// What to do when a remote rule-set does not answer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReachabilityPolicy {
    /// Unreachable URL is an ERROR
    Fail,
    /// Unreachable URL is a WARN
    #[default]
    Warn,
    /// No network access at all
    Skip,
}

impl std::str::FromStr for ReachabilityPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail" => Ok(ReachabilityPolicy::Fail),
            "warn" => Ok(ReachabilityPolicy::Warn),
            "skip" => Ok(ReachabilityPolicy::Skip),
            _ => Err(format!(
                "Invalid reachability policy '{}'. Valid values: fail, warn, skip",
                s
            )),
        }
    }
}

/// Lint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Profile path relative to the root
    pub config_path: PathBuf,

    /// Reachability policy for remote rule-sets
    pub reachability: ReachabilityPolicy,

    /// Probe timeout
    pub probe_timeout_secs: u64,

    /// Extra URL patterns (regular expressions) accepted as trusted sources
    pub trusted_sources: Vec<String>,

    /// Extension of rule-list files
    pub list_extension: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            reachability: ReachabilityPolicy::Warn,
            probe_timeout_secs: DEFAULT_TIMEOUT_SECS,
            trusted_sources: Vec::new(),
            list_extension: "list".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read settings file: {:?}", path.as_ref()))?;
        let settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {:?}", path.as_ref()))?;

        settings.validate()?;

        Ok(settings)
    }

    /// Load `<root>/rulecheck.yaml` if it exists, defaults otherwise
    pub fn load_from_root(root: &Path) -> Result<Self> {
        let path = root.join(SETTINGS_FILE);
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate settings values
    pub fn validate(&self) -> Result<(), LintError> {
        if self.config_path.as_os_str().is_empty() {
            return Err(LintError::InvalidSettings(
                "config_path cannot be empty".to_string(),
            ));
        }
        if self
            .config_path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(LintError::InvalidSettings(format!(
                "config_path must be relative to the root without '..': {}",
                self.config_path.display()
            )));
        }

        if !(1..=60).contains(&self.probe_timeout_secs) {
            return Err(LintError::InvalidSettings(format!(
                "probe_timeout_secs must be between 1 and 60, got {}",
                self.probe_timeout_secs
            )));
        }

        for pattern in &self.trusted_sources {
            if !pattern.starts_with("^https://") {
                return Err(LintError::InvalidSettings(format!(
                    "trusted source pattern must be anchored with '^https://': {}",
                    pattern
                )));
            }
            Regex::new(pattern).map_err(|e| {
                LintError::InvalidSettings(format!("bad trusted source pattern '{}': {}", pattern, e))
            })?;
        }

        if self.list_extension.is_empty() || self.list_extension.contains(['.', '/']) {
            return Err(LintError::InvalidSettings(format!(
                "list_extension must be a bare extension like 'list', got '{}'",
                self.list_extension
            )));
        }

        Ok(())
    }

    /// Apply command-line overrides and re-validate
    pub fn with_overrides(
        mut self,
        config_path: Option<PathBuf>,
        reachability: Option<ReachabilityPolicy>,
        probe_timeout_secs: Option<u64>,
    ) -> Result<Self, LintError> {
        if let Some(path) = config_path {
            self.config_path = path;
        }
        if let Some(policy) = reachability {
            self.reachability = policy;
        }
        if let Some(secs) = probe_timeout_secs {
            self.probe_timeout_secs = secs;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}
