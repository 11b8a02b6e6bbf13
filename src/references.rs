//! Referential integrity of selector groups.
//!
//! A `[]<name>` option in a selector group must name a terminal action, a
//! node group or a rule-set. Node groups are not checked.

use std::collections::HashSet;

use crate::diagnostic::{Diagnostic, IssueKind};
use crate::profile::Profile;

/// Built-in routing outcomes that need no definition
pub const RESERVED_ACTIONS: &[&str] = &["DIRECT", "REJECT", "NULL", "FINAL"];

/// Names a selector option may resolve to
#[derive(Debug, Default)]
pub struct KnownNames<'a> {
    node_groups: HashSet<&'a str>,
    rulesets: HashSet<&'a str>,
}

impl<'a> KnownNames<'a> {
    pub fn from_profile(profile: &'a Profile) -> Self {
        Self {
            node_groups: profile.node_group_names(),
            rulesets: profile.ruleset_names(),
        }
    }

    pub fn resolves(&self, name: &str) -> bool {
        RESERVED_ACTIONS.contains(&name)
            || self.node_groups.contains(name)
            || self.rulesets.contains(name)
    }
}

/// One ERROR per unresolved `[]` option of every selector group
pub fn check_references(file: &str, profile: &Profile) -> Vec<Diagnostic> {
    let known = KnownNames::from_profile(profile);
    let known = &known;

    profile
        .selector_groups()
        .flat_map(move |group| {
            group
                .references()
                .filter(move |name| !known.resolves(name))
                .map(move |name| {
                    Diagnostic::error(
                        IssueKind::Reference,
                        format!(
                            "proxy group '{}' references unknown name '{}' (line {})",
                            group.name, name, group.line
                        ),
                    )
                    .at(file, group.line)
                })
        })
        .collect()
}
