//! Line-level validation of rule-list files.
//!
//! A rule line is `PREFIX,VALUE[,PARAM...]` with `PREFIX` one of
//! [`RULE_PREFIXES`]. Text after `#` is a comment.

use ipnet::Ipv4Net;
use regex::Regex;
use std::sync::LazyLock;

use crate::diagnostic::{Diagnostic, IssueKind};

/// Rule types accepted in a rule-list file
pub const RULE_PREFIXES: &[&str] = &["DOMAIN", "DOMAIN-SUFFIX", "DOMAIN-KEYWORD", "IP-CIDR"];

static RULE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:DOMAIN|DOMAIN-SUFFIX|DOMAIN-KEYWORD|IP-CIDR),").expect("valid regex")
});

static IPV4_CIDR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,3}(?:\.\d{1,3}){3}/\d{1,2}(?:,.*)?$").expect("valid regex")
});

// Three dotted groups followed by a bare dot: a truncated address literal.
static DANGLING_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+\.\d+\.$").expect("valid regex"));

/// Strip an inline `#` comment and surrounding whitespace.
///
/// # Examples
/// ```
/// use rulecheck::rules::normalize;
/// assert_eq!(normalize("  DOMAIN,a.com  # ads"), "DOMAIN,a.com");
/// assert_eq!(normalize("# only a comment"), "");
/// ```
pub fn normalize(line: &str) -> &str {
    let code = match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    };
    code.trim()
}

/// Iterate over the non-blank normalized lines of a rule file with their
/// 1-based line numbers.
pub fn rule_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(idx, raw)| (idx + 1, normalize(raw)))
        .filter(|(_, line)| !line.is_empty())
}

/// Validate one raw line. Returns nothing for blank and comment-only lines.
///
/// At most one ERROR is produced per line; the checks are tried in order
/// (prefix, CIDR shape, truncated address) and the first failure wins.
pub fn check_line(file: &str, line_no: usize, raw: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let line = normalize(raw);
    if line.is_empty() {
        return diagnostics;
    }

    if !RULE_PREFIX.is_match(line) {
        diagnostics.push(
            Diagnostic::error(
                IssueKind::Syntax,
                format!(
                    "invalid rule '{}' (expected {} followed by a comma)",
                    line,
                    RULE_PREFIXES.join(" | ")
                ),
            )
            .at(file, line_no),
        );
    } else if let Some(rest) = line.strip_prefix("IP-CIDR,") {
        if IPV4_CIDR.is_match(rest) {
            let cidr = rest.split(',').next().unwrap_or(rest);
            if cidr.parse::<Ipv4Net>().is_err() {
                diagnostics.push(
                    Diagnostic::warn(format!("address out of range in '{}'", line))
                        .with_kind(IssueKind::Syntax)
                        .at(file, line_no),
                );
            }
        } else {
            diagnostics.push(
                Diagnostic::error(
                    IssueKind::Syntax,
                    format!("malformed IP-CIDR value in '{}'", line),
                )
                .at(file, line_no),
            );
        }
    }

    if diagnostics.iter().all(|d| !d.is_error()) && DANGLING_ADDRESS.is_match(line) {
        diagnostics.push(
            Diagnostic::error(
                IssueKind::Syntax,
                format!("truncated address literal in '{}'", line),
            )
            .at(file, line_no),
        );
    }

    if raw.ends_with(char::is_whitespace) {
        diagnostics.push(
            Diagnostic::warn("trailing whitespace")
                .with_kind(IssueKind::Style)
                .at(file, line_no),
        );
    }

    diagnostics
}

/// Validate every line of a rule-list file
pub fn check_rule_file(file: &str, content: &str) -> Vec<Diagnostic> {
    content
        .lines()
        .enumerate()
        .flat_map(|(idx, raw)| check_line(file, idx + 1, raw))
        .collect()
}
