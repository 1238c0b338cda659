/// Aggregated non-fatal conditions of one run.
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A data file or record was unreadable and skipped.
    Format,
    /// A cross-file reference did not resolve; the marker became "other".
    Resolution,
    /// A position outside the world bounds was clamped.
    Bounds,
    /// A tabular row was unusable.
    Input,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IssueKind::Format => "format",
            IssueKind::Resolution => "resolution",
            IssueKind::Bounds => "bounds",
            IssueKind::Input => "input",
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    /// File, row or record the issue concerns.
    pub source: String,
    pub message: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct RunReport {
    pub files_loaded: usize,
    pub files_skipped: usize,
    pub markers_extracted: usize,
    pub collectibles_loaded: usize,
    pub duplicates_dropped: usize,
    pub collectibles_folded: usize,
    pub collectibles_standalone: usize,
    pub issues: Vec<Issue>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: IssueKind, source: impl Into<String>, message: impl fmt::Display) {
        let issue = Issue {
            kind,
            source: source.into(),
            message: message.to_string(),
        };
        debug!(kind = %issue.kind, source = %issue.source, "{}", issue.message);
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        self.issues.extend(issues);
    }

    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn counts_by_kind(&self) -> BTreeMap<IssueKind, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Log the end-of-run summary, with the first few issues of each kind.
    pub fn log_summary(&self) {
        info!(
            files_loaded = self.files_loaded,
            files_skipped = self.files_skipped,
            markers = self.markers_extracted,
            collectibles = self.collectibles_loaded,
            duplicates = self.duplicates_dropped,
            folded = self.collectibles_folded,
            standalone = self.collectibles_standalone,
            "Run summary"
        );
        for (kind, count) in self.counts_by_kind() {
            warn!(%kind, count, "Non-fatal issues");
            for issue in self.issues.iter().filter(|i| i.kind == kind).take(5) {
                warn!(%kind, source = %issue.source, "  {}", issue.message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_issues_per_kind() {
        let mut report = RunReport::new();
        report.record(IssueKind::Bounds, "a", "clamped");
        report.record(IssueKind::Bounds, "b", "clamped");
        report.record(IssueKind::Resolution, "c", "dangling");

        assert_eq!(report.count(IssueKind::Bounds), 2);
        assert_eq!(report.count(IssueKind::Format), 0);
        let counts = report.counts_by_kind();
        assert_eq!(counts.get(&IssueKind::Resolution), Some(&1));
        assert!(!report.is_clean());
    }
}
