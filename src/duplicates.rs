//! Duplicate rule detection, within one file and across files.
//!
//! Equality is exact string equality after [`crate::rules::normalize`];
//! overlapping CIDRs or equivalent domains are not considered.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::diagnostic::{Diagnostic, IssueKind};
use crate::rules::rule_lines;

/// A rule repeated inside one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatedRule {
    pub rule: String,
    /// Every line the rule appears on, in file order
    pub lines: Vec<usize>,
}

/// Find rules that occur at least twice in one file, ordered by first occurrence
pub fn repeated_rules(content: &str) -> Vec<RepeatedRule> {
    let mut order: Vec<&str> = Vec::new();
    let mut seen: HashMap<&str, Vec<usize>> = HashMap::new();

    for (line_no, rule) in rule_lines(content) {
        let lines = seen.entry(rule).or_insert_with(|| {
            order.push(rule);
            Vec::new()
        });
        lines.push(line_no);
    }

    order
        .into_iter()
        .filter_map(|rule| {
            let lines = &seen[rule];
            (lines.len() >= 2).then(|| RepeatedRule {
                rule: rule.to_string(),
                lines: lines.clone(),
            })
        })
        .collect()
}

/// Map of normalized rule to the set of files containing it.
///
/// Built once per run, one [`DuplicateIndex::add_file`] call per rule file,
/// then consumed by [`DuplicateIndex::cross_file_report`].
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    occurrences: BTreeMap<String, BTreeSet<String>>,
}

impl DuplicateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file's rules and return the intra-file duplicate error, if any
    pub fn add_file(&mut self, file: &str, content: &str) -> Option<Diagnostic> {
        for (_, rule) in rule_lines(content) {
            self.occurrences
                .entry(rule.to_string())
                .or_default()
                .insert(file.to_string());
        }

        let repeated = repeated_rules(content);
        if repeated.is_empty() {
            return None;
        }

        let listing = repeated
            .iter()
            .map(|r| {
                let lines: Vec<String> = r.lines.iter().map(ToString::to_string).collect();
                format!("'{}' (lines {})", r.rule, lines.join(", "))
            })
            .collect::<Vec<_>>()
            .join(", ");

        Some(
            Diagnostic::error(
                IssueKind::Duplicate,
                format!("{} duplicate rule(s) within file: {}", repeated.len(), listing),
            )
            .in_file(file),
        )
    }

    /// Number of distinct normalized rules seen so far
    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    /// Rules present in two or more distinct files, sorted by rule text
    pub fn cross_file_duplicates(&self) -> Vec<(&str, Vec<&str>)> {
        self.occurrences
            .iter()
            .filter(|(_, files)| files.len() >= 2)
            .map(|(rule, files)| (rule.as_str(), files.iter().map(String::as_str).collect()))
            .collect()
    }

    /// One aggregate error with a rule → files table, or `None` if clean
    pub fn cross_file_report(&self) -> Option<Diagnostic> {
        let duplicates = self.cross_file_duplicates();
        if duplicates.is_empty() {
            return None;
        }

        let width = duplicates
            .iter()
            .map(|(rule, _)| rule.chars().count())
            .max()
            .unwrap_or(0);

        let mut message = format!(
            "{} rule(s) appear in more than one file:",
            duplicates.len()
        );
        for (rule, files) in &duplicates {
            message.push_str(&format!(
                "\n    {:<width$}  ->  {}",
                rule,
                files.join(", "),
                width = width
            ));
        }

        Some(Diagnostic::error(IssueKind::Duplicate, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_rules_none() {
        assert!(repeated_rules("DOMAIN,a.com\nDOMAIN,b.com\n").is_empty());
    }

    #[test]
    fn test_repeated_rules_listed_once() {
        let content = "DOMAIN,a.com\nDOMAIN,b.com\nDOMAIN,a.com\nDOMAIN,a.com\n";
        let repeated = repeated_rules(content);
        assert_eq!(repeated.len(), 1);
        assert_eq!(repeated[0].rule, "DOMAIN,a.com");
        assert_eq!(repeated[0].lines, vec![1, 3, 4]);
    }

    #[test]
    fn test_repeated_rules_normalized() {
        let content = "DOMAIN,a.com\n  DOMAIN,a.com   # again\n";
        let repeated = repeated_rules(content);
        assert_eq!(repeated.len(), 1);
        assert_eq!(repeated[0].lines, vec![1, 2]);
    }

    #[test]
    fn test_repeated_rules_ignores_comments() {
        assert!(repeated_rules("# x\n# x\n\n\n").is_empty());
    }

    #[test]
    fn test_add_file_reports_intra_file_duplicates() {
        let mut index = DuplicateIndex::new();
        let d = index
            .add_file("ads.list", "DOMAIN,a.com\nDOMAIN,b.com\nDOMAIN,b.com\nDOMAIN,a.com\n")
            .unwrap();
        assert!(d.is_error());
        assert_eq!(d.kind, Some(IssueKind::Duplicate));
        assert!(d.message.starts_with("2 duplicate rule(s)"));
        assert!(d.message.contains("'DOMAIN,a.com' (lines 1, 4)"));
        assert!(d.message.contains("'DOMAIN,b.com' (lines 2, 3)"));
    }

    #[test]
    fn test_cross_file_duplicate_single_entry() {
        let mut index = DuplicateIndex::new();
        assert!(index.add_file("a.list", "DOMAIN,example.com\n").is_none());
        assert!(index.add_file("b.list", "DOMAIN,example.com\n").is_none());

        let duplicates = index.cross_file_duplicates();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].0, "DOMAIN,example.com");
        assert_eq!(duplicates[0].1, vec!["a.list", "b.list"]);

        let d = index.cross_file_report().unwrap();
        assert!(d.message.starts_with("1 rule(s) appear in more than one file"));
        assert!(d.message.contains("a.list, b.list"));
    }

    #[test]
    fn test_intra_file_duplicate_is_not_cross_file() {
        let mut index = DuplicateIndex::new();
        index.add_file("a.list", "DOMAIN,x.com\nDOMAIN,x.com\n");
        assert!(index.cross_file_report().is_none());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_cross_file_sorted() {
        let mut index = DuplicateIndex::new();
        index.add_file("c.list", "DOMAIN,z.com\nDOMAIN,a.com\n");
        index.add_file("a.list", "DOMAIN,z.com\nDOMAIN,a.com\n");
        let duplicates = index.cross_file_duplicates();
        assert_eq!(duplicates[0].0, "DOMAIN,a.com");
        assert_eq!(duplicates[1].0, "DOMAIN,z.com");
        assert_eq!(duplicates[1].1, vec!["a.list", "c.list"]);
    }

    #[test]
    fn test_cross_file_table_aligned_for_non_ascii() {
        let mut index = DuplicateIndex::new();
        let content = "DOMAIN-SUFFIX,例子.测试\nDOMAIN,abcdefghijklmnop.com\n";
        index.add_file("a.list", content);
        index.add_file("b.list", content);

        let d = index.cross_file_report().unwrap();
        let columns: Vec<usize> = d
            .message
            .lines()
            .skip(1)
            .map(|row| row.chars().take_while(|&c| c != '>').count())
            .collect();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0], columns[1]);
    }

    #[test]
    fn test_empty_index() {
        let index = DuplicateIndex::new();
        assert!(index.is_empty());
        assert!(index.cross_file_report().is_none());
    }
}
