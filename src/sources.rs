//! Rule-set source validation: built-in tags, remote URLs and local paths.
//!
//! Remote sources must be HTTPS and match a trusted host/path shape. Their
//! reachability is probed according to [`ReachabilityPolicy`]. Local sources
//! must exist relative to the root directory.

use regex::Regex;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

use crate::diagnostic::{Diagnostic, IssueKind};
use crate::error::LintError;
use crate::probe::Prober;
use crate::profile::RuleSetEntry;
use crate::settings::ReachabilityPolicy;

/// Converter type prefixes that may precede a source (`clash-domain:https://...`)
pub const TYPE_PREFIXES: &[&str] = &[
    "clash-domain:",
    "clash-ipcidr:",
    "clash-classic:",
    "surge:",
    "quanx:",
];

/// Built-in trusted URL shapes
pub const TRUSTED_PATTERNS: &[&str] = &[
    // raw.githubusercontent.com/<user>/<repo>/<branch>/<path>
    r"^https://raw\.githubusercontent\.com/[^/]+/[^/]+/[^/]+/.+$",
    // github.com/<user>/<repo>/raw/<branch>/<path>
    r"^https://github\.com/[^/]+/[^/]+/raw/[^/]+/.+$",
    // cdn.jsdelivr.net/gh/<user>/<repo>@<version>/<path>
    r"^https://cdn\.jsdelivr\.net/gh/[^/]+/[^/@]+@[^/]+/.+$",
    // gist.githubusercontent.com/<user>/<id>/raw/[<rev>/]<file>
    r"^https://gist\.githubusercontent\.com/[^/]+/[^/]+/raw/.+$",
];

static BUILTIN_TRUSTED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    TRUSTED_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
});

/// What a rule-set source points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind<'a> {
    /// `[]GEOIP,CN`, `[]FINAL`...
    Builtin,
    Url(&'a str),
    Local(&'a str),
}

/// Drop a converter type prefix, if any
pub fn strip_type_prefix(source: &str) -> &str {
    TYPE_PREFIXES
        .iter()
        .find_map(|prefix| source.strip_prefix(prefix))
        .unwrap_or(source)
}

/// Classify a raw source string.
///
/// # Examples
/// ```
/// use rulecheck::sources::{classify, SourceKind};
/// assert_eq!(classify("[]GEOIP,CN"), SourceKind::Builtin);
/// assert_eq!(classify("surge:https://a.b/c.list"), SourceKind::Url("https://a.b/c.list"));
/// assert_eq!(classify("rules/ads.list"), SourceKind::Local("rules/ads.list"));
/// ```
pub fn classify(source: &str) -> SourceKind<'_> {
    if source.starts_with('[') {
        return SourceKind::Builtin;
    }
    let source = strip_type_prefix(source);
    if source.contains("://") {
        SourceKind::Url(source)
    } else {
        SourceKind::Local(source)
    }
}

/// Allowlist of URL shapes accepted as rule-set sources
#[derive(Debug, Clone, Default)]
pub struct TrustedSources {
    extra: Vec<Regex>,
}

impl TrustedSources {
    /// Built-in shapes plus user-supplied patterns
    pub fn new(extra: &[String]) -> Result<Self, LintError> {
        let extra = extra
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    LintError::InvalidSettings(format!("bad trusted source pattern '{}': {}", p, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { extra })
    }

    pub fn is_trusted(&self, url: &str) -> bool {
        BUILTIN_TRUSTED
            .iter()
            .chain(self.extra.iter())
            .any(|re| re.is_match(url))
    }
}

/// Checks every rule-set source of a profile
pub struct SourceChecker<'a> {
    root: PathBuf,
    trusted: TrustedSources,
    prober: Option<&'a dyn Prober>,
    policy: ReachabilityPolicy,
    probed: HashMap<String, Option<String>>,
}

impl<'a> SourceChecker<'a> {
    pub fn new(root: &Path, trusted: TrustedSources) -> Self {
        Self {
            root: root.to_path_buf(),
            trusted,
            prober: None,
            policy: ReachabilityPolicy::Skip,
            probed: HashMap::new(),
        }
    }

    /// Enable reachability probing with the given policy
    pub fn with_prober(mut self, prober: &'a dyn Prober, policy: ReachabilityPolicy) -> Self {
        self.prober = Some(prober);
        self.policy = policy;
        self
    }

    /// Validate one rule-set source. `file` labels the diagnostics.
    pub async fn check(&mut self, file: &str, entry: &RuleSetEntry) -> Vec<Diagnostic> {
        match classify(&entry.source) {
            SourceKind::Builtin => Vec::new(),
            SourceKind::Url(url) => self.check_url(file, entry, url).await,
            SourceKind::Local(path) => self.check_local(file, entry, path),
        }
    }

    /// Validate all sources in order
    pub async fn check_all(&mut self, file: &str, entries: &[RuleSetEntry]) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for entry in entries {
            diagnostics.extend(self.check(file, entry).await);
        }
        diagnostics
    }

    async fn check_url(&mut self, file: &str, entry: &RuleSetEntry, url: &str) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        let parsed = match reqwest::Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                diagnostics.push(
                    Diagnostic::error(
                        IssueKind::Source,
                        format!("rule-set '{}': malformed URL '{}': {}", entry.name, url, e),
                    )
                    .at(file, entry.line),
                );
                return diagnostics;
            }
        };

        if parsed.scheme() != "https" {
            diagnostics.push(
                Diagnostic::error(
                    IssueKind::Source,
                    format!(
                        "rule-set '{}': non-HTTPS scheme '{}' in {}",
                        entry.name,
                        parsed.scheme(),
                        url
                    ),
                )
                .at(file, entry.line),
            );
            return diagnostics;
        }

        if let Some(failure) = self.probe(url).await {
            let message = format!("rule-set '{}': {} is unreachable: {}", entry.name, url, failure);
            let diagnostic = match self.policy {
                ReachabilityPolicy::Fail => Diagnostic::error(IssueKind::Source, message),
                _ => Diagnostic::warn(message).with_kind(IssueKind::Reachability),
            };
            diagnostics.push(diagnostic.at(file, entry.line));
        }

        if !self.trusted.is_trusted(parsed.as_str()) {
            diagnostics.push(
                Diagnostic::error(
                    IssueKind::Source,
                    format!("rule-set '{}': untrusted source {}", entry.name, url),
                )
                .at(file, entry.line),
            );
        }

        diagnostics
    }

    /// Probe once per distinct URL; `Some(reason)` on failure
    async fn probe(&mut self, url: &str) -> Option<String> {
        if self.policy == ReachabilityPolicy::Skip {
            return None;
        }
        let prober = self.prober?;
        if let Some(cached) = self.probed.get(url) {
            return cached.clone();
        }

        let outcome = prober.probe(url).await.err().map(|e| format!("{:#}", e));
        debug!("Reachability of {}: {:?}", url, outcome);
        self.probed.insert(url.to_string(), outcome.clone());
        outcome
    }

    fn check_local(&self, file: &str, entry: &RuleSetEntry, path: &str) -> Vec<Diagnostic> {
        let relative = Path::new(path);
        if path.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return vec![Diagnostic::error(
                IssueKind::Source,
                format!(
                    "rule-set '{}': local source '{}' must be a path relative to the root",
                    entry.name, path
                ),
            )
            .at(file, entry.line)];
        }

        let resolved = self.root.join(relative);
        if resolved.is_file() {
            return Vec::new();
        }
        vec![Diagnostic::error(
            IssueKind::Source,
            format!(
                "rule-set '{}': local file not found: {}",
                entry.name,
                resolved.display()
            ),
        )
        .at(file, entry.line)]
    }
}
