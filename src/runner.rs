//! Runs every check over a root directory, in a fixed order:
//! rule syntax and intra-file duplicates per file, cross-file duplicates,
//! then profile parsing, name checks, references and rule-set sources.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::diagnostic::{Diagnostic, IssueKind, Report};
use crate::discovery::{display_name, list_files};
use crate::duplicates::DuplicateIndex;
use crate::error::LintError;
use crate::probe::{HttpProber, Prober};
use crate::profile::Profile;
use crate::references::check_references;
use crate::rules::check_rule_file;
use crate::settings::{ReachabilityPolicy, Settings};
use crate::sources::{SourceChecker, TrustedSources};

/// Lint runner for one root directory
pub struct Runner {
    root: PathBuf,
    settings: Settings,
    prober: Option<Box<dyn Prober>>,
}

impl Runner {
    pub fn new(root: &Path, settings: Settings) -> Self {
        Self {
            root: root.to_path_buf(),
            settings,
            prober: None,
        }
    }

    /// Use a specific prober instead of the HTTP one
    pub fn with_prober(mut self, prober: Box<dyn Prober>) -> Self {
        self.prober = Some(prober);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run all stages and build the report.
    ///
    /// Only unreadable inputs are errors here; every finding is a diagnostic.
    pub async fn run(&self) -> Result<Report, LintError> {
        let mut diagnostics = Vec::new();

        let files = list_files(&self.root, &self.settings.list_extension)?;
        info!(
            "Checking {} rule list(s) under {}",
            files.len(),
            self.root.display()
        );
        let mut files_checked = files.len();

        let mut index = DuplicateIndex::new();
        for path in &files {
            let name = display_name(&self.root, path);
            let content = read_file(path)?;
            debug!("Scanning {}", name);

            diagnostics.extend(check_rule_file(&name, &content));
            diagnostics.extend(index.add_file(&name, &content));
        }
        diagnostics.extend(index.cross_file_report());

        let config_path = self.root.join(&self.settings.config_path);
        if config_path.is_file() {
            files_checked += 1;
            let content = read_file(&config_path)?;
            let name = display_name(&self.root, &config_path);
            diagnostics.extend(self.check_profile(&name, &content).await?);
        } else {
            diagnostics.push(
                Diagnostic::warn(format!(
                    "config file not found: {}; rule-set and proxy group checks skipped",
                    config_path.display()
                ))
                .with_kind(IssueKind::Config),
            );
        }

        Ok(Report::new(
            self.root.display().to_string(),
            files_checked,
            diagnostics,
        ))
    }

    async fn check_profile(&self, name: &str, content: &str) -> Result<Vec<Diagnostic>, LintError> {
        let profile = Profile::parse(name, content);
        info!(
            "Profile {}: {} ruleset(s), {} selector group(s), {} node group(s)",
            name,
            profile.rulesets.len(),
            profile.selector_groups().count(),
            profile.node_groups().count()
        );

        let mut diagnostics = profile.parse_diagnostics().to_vec();
        diagnostics.extend(profile.check_names(name));
        diagnostics.extend(check_references(name, &profile));

        let trusted = TrustedSources::new(&self.settings.trusted_sources)?;
        let policy = self.settings.reachability;

        let http_prober;
        let prober: Option<&dyn Prober> = match (&self.prober, policy) {
            (_, ReachabilityPolicy::Skip) => None,
            (Some(prober), _) => Some(&**prober),
            (None, _) => {
                http_prober = HttpProber::new(self.settings.probe_timeout())
                    .map_err(|e| LintError::HttpClient(format!("{:#}", e)))?;
                Some(&http_prober)
            }
        };

        let mut checker = SourceChecker::new(&self.root, trusted);
        if let Some(prober) = prober {
            checker = checker.with_prober(prober, policy);
        }
        diagnostics.extend(checker.check_all(name, &profile.rulesets).await);

        Ok(diagnostics)
    }
}

fn read_file(path: &Path) -> Result<String, LintError> {
    std::fs::read_to_string(path).map_err(|e| LintError::unreadable_file(path, e))
}
