//! Parser for the INI-style profile that wires rule-sets into proxy groups.
//!
//! Only two line shapes are understood:
//!
//! ```text
//! ruleset=<name>,<source>[,<extra>...]
//! custom_proxy_group=<name>`<option>`<option>...
//! ```
//!
//! Everything else is opaque, except comment lines (`;` or `#`): the first
//! comment containing [`NODE_MARKER`] opens the node section. Groups defined
//! before it are selector groups, groups after it are node groups. The
//! section is decided while parsing and stored on each [`ProxyGroupEntry`].

use std::collections::{BTreeMap, HashSet};

use crate::diagnostic::{Diagnostic, IssueKind};

/// Field separator inside `custom_proxy_group=` payloads
pub const GROUP_DELIMITER: char = '`';

/// Word that marks the start of the node section when found in a comment
pub const NODE_MARKER: &str = "Node";

const RULESET_KEY: &str = "ruleset=";
const PROXY_GROUP_KEY: &str = "custom_proxy_group=";

/// Section a proxy group was defined in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    /// Decision point whose `[]` options are reference-checked
    Selector,
    /// Upstream endpoint group, exempt from reference checks
    Node,
}

/// One `ruleset=` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSetEntry {
    pub name: String,
    /// Built-in tag (`[]GEOIP,CN`), URL or path relative to the root
    pub source: String,
    /// Trailing fields after the source, e.g. an update interval
    pub extra: Vec<String>,
    pub line: usize,
}

impl RuleSetEntry {
    /// `[]GEOSITE`, `[]GEOIP,CN`, `[]FINAL` and friends
    pub fn is_builtin(&self) -> bool {
        self.source.starts_with('[')
    }
}

/// A single option of a proxy group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupOption {
    /// `[]<name>`: a terminal action, another group or a rule-set
    Reference(String),
    /// Anything else: group type, regex filter, test URL, interval...
    Literal(String),
}

impl GroupOption {
    fn from_field(field: &str) -> Self {
        match field.strip_prefix("[]") {
            Some(name) => GroupOption::Reference(name.to_string()),
            None => GroupOption::Literal(field.to_string()),
        }
    }
}

/// One `custom_proxy_group=` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyGroupEntry {
    pub name: String,
    pub options: Vec<GroupOption>,
    pub line: usize,
    pub kind: GroupKind,
}

impl ProxyGroupEntry {
    /// Names referenced through `[]` options, in order
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.options.iter().filter_map(|option| match option {
            GroupOption::Reference(name) => Some(name.as_str()),
            GroupOption::Literal(_) => None,
        })
    }
}

/// Split a group payload on [`GROUP_DELIMITER`].
///
/// There is no escape syntax: every delimiter splits. Fields are trimmed
/// and empty fields are kept so callers can report them.
///
/// # Examples
/// ```
/// use rulecheck::profile::split_fields;
/// assert_eq!(split_fields("Proxy`select`[]DIRECT"), vec!["Proxy", "select", "[]DIRECT"]);
/// assert_eq!(split_fields("A``b"), vec!["A", "", "b"]);
/// ```
pub fn split_fields(payload: &str) -> Vec<&str> {
    payload.split(GROUP_DELIMITER).map(str::trim).collect()
}

fn is_comment(line: &str) -> bool {
    line.starts_with(';') || line.starts_with('#')
}

/// Parsed profile
#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub rulesets: Vec<RuleSetEntry>,
    pub groups: Vec<ProxyGroupEntry>,
    /// Line of the comment that opened the node section
    pub node_marker: Option<usize>,
    diagnostics: Vec<Diagnostic>,
}

impl Profile {
    /// Parse profile text. `file` is only used to label diagnostics.
    pub fn parse(file: &str, content: &str) -> Self {
        let mut profile = Profile::default();
        let mut section = GroupKind::Selector;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();

            if is_comment(line) {
                if line.contains(NODE_MARKER) {
                    match profile.node_marker {
                        None => {
                            profile.node_marker = Some(line_no);
                            section = GroupKind::Node;
                        }
                        Some(first) => profile.diagnostics.push(
                            Diagnostic::info(format!(
                                "additional node section marker ignored, node section already started at line {}",
                                first
                            ))
                            .with_kind(IssueKind::Config)
                            .at(file, line_no),
                        ),
                    }
                }
                continue;
            }

            if let Some(payload) = line.strip_prefix(RULESET_KEY) {
                profile.parse_ruleset(file, line_no, payload);
            } else if let Some(payload) = line.strip_prefix(PROXY_GROUP_KEY) {
                profile.parse_group(file, line_no, payload, section);
            }
        }

        if let Some(marker) = profile.node_marker {
            if !profile.groups.is_empty() && profile.selector_groups().next().is_none() {
                profile.diagnostics.push(
                    Diagnostic::warn(format!(
                        "node section marker at line {} precedes every proxy group; no group is reference-checked",
                        marker
                    ))
                    .with_kind(IssueKind::Config)
                    .at(file, marker),
                );
            }
        }

        profile
    }

    fn parse_ruleset(&mut self, file: &str, line_no: usize, payload: &str) {
        let Some((name, rest)) = payload.split_once(',') else {
            self.diagnostics.push(
                Diagnostic::error(
                    IssueKind::Syntax,
                    format!("ruleset '{}' has no source", payload.trim()),
                )
                .at(file, line_no),
            );
            return;
        };

        let name = name.trim();
        if name.is_empty() {
            self.diagnostics.push(
                Diagnostic::error(IssueKind::Syntax, "ruleset without a name").at(file, line_no),
            );
            return;
        }

        let rest = rest.trim();
        let (source, extra) = if rest.starts_with('[') {
            (rest.to_string(), Vec::new())
        } else {
            let mut fields = rest.split(',').map(str::trim);
            let source = fields.next().unwrap_or_default().to_string();
            (source, fields.map(String::from).collect())
        };

        if source.is_empty() {
            self.diagnostics.push(
                Diagnostic::error(IssueKind::Syntax, format!("ruleset '{}' has no source", name))
                    .at(file, line_no),
            );
            return;
        }

        self.rulesets.push(RuleSetEntry {
            name: name.to_string(),
            source,
            extra,
            line: line_no,
        });
    }

    fn parse_group(&mut self, file: &str, line_no: usize, payload: &str, kind: GroupKind) {
        let fields = split_fields(payload);
        let name = fields[0];
        if name.is_empty() {
            self.diagnostics.push(
                Diagnostic::error(IssueKind::Syntax, "proxy group without a name").at(file, line_no),
            );
            return;
        }

        let mut options = Vec::with_capacity(fields.len() - 1);
        for (position, field) in fields.iter().enumerate().skip(1) {
            if field.is_empty() {
                self.diagnostics.push(
                    Diagnostic::warn(format!(
                        "empty field #{} in proxy group '{}' skipped",
                        position, name
                    ))
                    .with_kind(IssueKind::Syntax)
                    .at(file, line_no),
                );
                continue;
            }
            options.push(GroupOption::from_field(field));
        }

        self.groups.push(ProxyGroupEntry {
            name: name.to_string(),
            options,
            line: line_no,
            kind,
        });
    }

    /// Diagnostics raised while parsing (empty fields, unnamed groups, markers)
    pub fn parse_diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn selector_groups(&self) -> impl Iterator<Item = &ProxyGroupEntry> {
        self.groups.iter().filter(|g| g.kind == GroupKind::Selector)
    }

    pub fn node_groups(&self) -> impl Iterator<Item = &ProxyGroupEntry> {
        self.groups.iter().filter(|g| g.kind == GroupKind::Node)
    }

    pub fn ruleset_names(&self) -> HashSet<&str> {
        self.rulesets.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn node_group_names(&self) -> HashSet<&str> {
        self.node_groups().map(|g| g.name.as_str()).collect()
    }

    /// Name-level checks: repeated rule-set names (INFO) and repeated
    /// proxy group names across both sections (ERROR).
    pub fn check_names(&self, file: &str) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        let mut ruleset_lines: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for ruleset in &self.rulesets {
            ruleset_lines
                .entry(ruleset.name.as_str())
                .or_default()
                .push(ruleset.line);
        }
        for (name, lines) in ruleset_lines.iter().filter(|(_, l)| l.len() > 1) {
            diagnostics.push(
                Diagnostic::info(format!(
                    "rule-set name '{}' is used by {} ruleset lines ({})",
                    name,
                    lines.len(),
                    join_lines(lines)
                ))
                .in_file(file),
            );
        }

        let mut group_lines: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for group in &self.groups {
            group_lines.entry(group.name.as_str()).or_default().push(group.line);
        }
        for (name, lines) in group_lines.iter().filter(|(_, l)| l.len() > 1) {
            diagnostics.push(
                Diagnostic::error(
                    IssueKind::Duplicate,
                    format!(
                        "proxy group '{}' is defined {} times (lines {})",
                        name,
                        lines.len(),
                        join_lines(lines)
                    ),
                )
                .in_file(file),
            );
        }

        diagnostics
    }
}

fn join_lines(lines: &[usize]) -> String {
    lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Severity;

    const SAMPLE: &str = "\
[custom]
; Rule sets
ruleset=Ads,rules/ads.list
ruleset=Direct,https://raw.githubusercontent.com/u/r/main/direct.list,86400
ruleset=Direct,[]GEOIP,CN
ruleset=Final,[]FINAL
; Selector groups
custom_proxy_group=Proxy`select`[]HK`[]DIRECT
custom_proxy_group=Ads`select`[]REJECT`[]DIRECT
; Node groups
custom_proxy_group=HK`url-test`(HK|Hong Kong)`http://www.gstatic.com/generate_204`300
enable_rule_generator=true
";

    #[test]
    fn test_parse_rulesets() {
        let profile = Profile::parse("c.ini", SAMPLE);
        assert_eq!(profile.rulesets.len(), 4);

        let ads = &profile.rulesets[0];
        assert_eq!(ads.name, "Ads");
        assert_eq!(ads.source, "rules/ads.list");
        assert_eq!(ads.line, 3);

        let direct = &profile.rulesets[1];
        assert_eq!(
            direct.source,
            "https://raw.githubusercontent.com/u/r/main/direct.list"
        );
        assert_eq!(direct.extra, vec!["86400".to_string()]);

        let geoip = &profile.rulesets[2];
        assert_eq!(geoip.source, "[]GEOIP,CN");
        assert!(geoip.is_builtin());
        assert!(geoip.extra.is_empty());
    }

    #[test]
    fn test_parse_groups_and_sections() {
        let profile = Profile::parse("c.ini", SAMPLE);
        assert_eq!(profile.node_marker, Some(10));
        assert_eq!(profile.groups.len(), 3);

        let selectors: Vec<_> = profile.selector_groups().map(|g| g.name.as_str()).collect();
        assert_eq!(selectors, vec!["Proxy", "Ads"]);
        let nodes: Vec<_> = profile.node_groups().map(|g| g.name.as_str()).collect();
        assert_eq!(nodes, vec!["HK"]);

        let proxy = &profile.groups[0];
        assert_eq!(proxy.line, 8);
        assert_eq!(
            proxy.options,
            vec![
                GroupOption::Literal("select".into()),
                GroupOption::Reference("HK".into()),
                GroupOption::Reference("DIRECT".into()),
            ]
        );
        assert_eq!(proxy.references().collect::<Vec<_>>(), vec!["HK", "DIRECT"]);
    }

    #[test]
    fn test_marker_must_be_comment() {
        let content = "custom_proxy_group=Node`select`[]DIRECT\ncustom_proxy_group=B`select`[]DIRECT\n";
        let profile = Profile::parse("c.ini", content);
        assert!(profile.node_marker.is_none());
        assert_eq!(profile.selector_groups().count(), 2);
    }

    #[test]
    fn test_no_marker_everything_is_selector() {
        let content = "custom_proxy_group=A`select`[]DIRECT\n; proxies\ncustom_proxy_group=B`select`[]A\n";
        let profile = Profile::parse("c.ini", content);
        assert!(profile.node_groups().next().is_none());
        assert_eq!(profile.selector_groups().count(), 2);
    }

    #[test]
    fn test_hash_comment_marker() {
        let content = "custom_proxy_group=A`select`[]B\n# Node groups\ncustom_proxy_group=B`select`x\n";
        let profile = Profile::parse("c.ini", content);
        assert_eq!(profile.node_marker, Some(2));
        assert_eq!(profile.groups[1].kind, GroupKind::Node);
    }

    #[test]
    fn test_second_marker_is_info() {
        let content = "custom_proxy_group=A`select`[]B\n; Node\ncustom_proxy_group=B`select`x\n; Node again\ncustom_proxy_group=C`select`x\n";
        let profile = Profile::parse("c.ini", content);
        assert_eq!(profile.node_marker, Some(2));
        assert_eq!(profile.groups[2].kind, GroupKind::Node);
        let d = profile.parse_diagnostics();
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].severity, Severity::Info);
        assert_eq!(d[0].location.as_ref().unwrap().line, Some(4));
    }

    #[test]
    fn test_marker_before_all_groups_warns() {
        let content = "; Node\ncustom_proxy_group=A`select`[]Missing\n";
        let profile = Profile::parse("c.ini", content);
        assert_eq!(profile.selector_groups().count(), 0);
        let d = profile.parse_diagnostics();
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].severity, Severity::Warn);
    }

    #[test]
    fn test_empty_fields_warn_and_skip() {
        let profile = Profile::parse("c.ini", "custom_proxy_group=A`select``[]DIRECT`\n");
        assert_eq!(profile.groups[0].options.len(), 2);
        let d = profile.parse_diagnostics();
        assert_eq!(d.len(), 2);
        assert!(d.iter().all(|d| d.severity == Severity::Warn));
        assert!(d[0].message.contains("#2"));
    }

    #[test]
    fn test_unnamed_group_is_error() {
        let profile = Profile::parse("c.ini", "custom_proxy_group=`select`[]DIRECT\n");
        assert!(profile.groups.is_empty());
        let d = profile.parse_diagnostics();
        assert_eq!(d.len(), 1);
        assert!(d[0].is_error());
    }

    #[test]
    fn test_ruleset_without_source_is_error() {
        let profile = Profile::parse("c.ini", "ruleset=Lonely\n");
        assert!(profile.rulesets.is_empty());
        assert!(profile.parse_diagnostics()[0].is_error());
    }

    #[test]
    fn test_ruleset_with_empty_source_is_error() {
        let profile = Profile::parse("c.ini", "ruleset=Empty,\nruleset=Blank,  ,86400\n");
        assert!(profile.rulesets.is_empty());
        let d = profile.parse_diagnostics();
        assert_eq!(d.len(), 2);
        assert!(d.iter().all(|d| d.is_error() && d.kind == Some(IssueKind::Syntax)));
        assert!(d[0].message.contains("'Empty' has no source"));
    }

    #[test]
    fn test_ruleset_without_name_is_error() {
        let profile = Profile::parse("c.ini", "ruleset=,rules/a.list\n");
        assert!(profile.rulesets.is_empty());
        assert!(profile.ruleset_names().is_empty());
        let d = profile.parse_diagnostics();
        assert_eq!(d.len(), 1);
        assert!(d[0].is_error());
        assert!(d[0].message.contains("without a name"));
    }

    #[test]
    fn test_check_names_repeated_ruleset_is_info() {
        let profile = Profile::parse("c.ini", SAMPLE);
        let d = profile.check_names("c.ini");
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].severity, Severity::Info);
        assert!(d[0].message.contains("'Direct'"));
        assert!(d[0].message.contains("(4, 5)"));
    }

    #[test]
    fn test_check_names_duplicate_group_across_sections() {
        let content = "custom_proxy_group=HK`select`[]DIRECT\n; Node\ncustom_proxy_group=HK`url-test`.*\n";
        let profile = Profile::parse("c.ini", content);
        let d = profile.check_names("c.ini");
        assert_eq!(d.len(), 1);
        assert!(d[0].is_error());
        assert_eq!(d[0].kind, Some(IssueKind::Duplicate));
        assert!(d[0].message.contains("'HK' is defined 2 times (lines 1, 3)"));
    }

    #[test]
    fn test_name_sets() {
        let profile = Profile::parse("c.ini", SAMPLE);
        let rulesets = profile.ruleset_names();
        assert!(rulesets.contains("Ads"));
        assert!(rulesets.contains("Final"));
        assert_eq!(rulesets.len(), 3);
        assert_eq!(profile.node_group_names(), HashSet::from(["HK"]));
    }

    #[test]
    fn test_split_fields_trims() {
        assert_eq!(split_fields(" A ` select "), vec!["A", "select"]);
    }
}
