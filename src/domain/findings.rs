//! Analysis results and error types
//!
//! Architecture: Rich Domain Models - findings carry their source and classification
//! - A Finding is a candidate bound to the text source it came from
//! - AnalysisReport acts as the aggregate root, keeping valid and invalid findings apart
//! - Reports are built once per analysis and only read afterwards

use crate::domain::identity::{format_grouped, Rejection};
use crate::patterns::Candidate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Where scanned text came from
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum Source {
    /// Text passed directly by the caller
    Text,
    /// Standard input
    Stdin,
    /// A file on disk
    File(PathBuf),
}

impl Source {
    /// Whether positions in this source are worth printing
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("<text>"),
            Self::Stdin => f.write_str("<stdin>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// An identity number candidate found in a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// The normalized 11 digits
    pub number: String,
    /// Text as it appeared in the source
    pub raw: String,
    /// Source the number was found in
    pub source: Source,
    /// Byte offset within the source
    pub offset: usize,
    /// Line number (1-indexed)
    pub line: u32,
    /// Column number (1-indexed, in characters)
    pub column: u32,
    /// Why validation failed, `None` for valid numbers
    pub rejection: Option<Rejection>,
}

impl Finding {
    /// Bind a candidate to its source
    pub fn from_candidate(candidate: Candidate, source: Source) -> Self {
        Self {
            number: candidate.number,
            raw: candidate.raw,
            source,
            offset: candidate.offset,
            line: candidate.line,
            column: candidate.column,
            rejection: candidate.rejection,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.rejection.is_none()
    }

    /// The number in `DDD DDD DD DDD` grouping
    pub fn formatted(&self) -> String {
        format_grouped(&self.number)
    }

    /// Format finding for display
    pub fn format_display(&self) -> String {
        let mut display = format!("{} ({})", self.formatted(), self.number);
        if self.source.is_file() {
            display.push_str(&format!(" [{}:{}:{}]", self.source, self.line, self.column));
        }
        display
    }
}

/// Summary statistics for an analysis report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Number of sources scanned
    pub total_sources: usize,
    /// Characters of text scanned across all sources
    pub text_length: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    /// Total execution time in milliseconds
    pub execution_time_ms: u64,
    /// When the analysis ran
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisSummary {
    /// Total candidates that reached validation
    pub fn total(&self) -> usize {
        self.valid_count + self.invalid_count
    }
}

/// Complete analysis report: valid and invalid findings in scan order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub valid: Vec<Finding>,
    pub invalid: Vec<Finding>,
    pub summary: AnalysisSummary,
}

impl AnalysisReport {
    /// Create a new empty report stamped with the current time
    pub fn new() -> Self {
        Self {
            valid: Vec::new(),
            invalid: Vec::new(),
            summary: AnalysisSummary { analyzed_at: Utc::now(), ..Default::default() },
        }
    }

    /// Add a finding to the matching list
    pub fn add_finding(&mut self, finding: Finding) {
        if finding.is_valid() {
            self.summary.valid_count += 1;
            self.valid.push(finding);
        } else {
            self.summary.invalid_count += 1;
            self.invalid.push(finding);
        }
    }

    /// Record that one more source of `text_length` characters was scanned
    pub fn add_source(&mut self, text_length: usize) {
        self.summary.total_sources += 1;
        self.summary.text_length += text_length;
    }

    pub fn has_findings(&self) -> bool {
        self.summary.total() > 0
    }

    pub fn has_invalid(&self) -> bool {
        self.summary.invalid_count > 0
    }

    /// Valid numbers only, in order
    pub fn valid_numbers(&self) -> Vec<&str> {
        self.valid.iter().map(|f| f.number.as_str()).collect()
    }

    /// Invalid numbers only, in order
    pub fn invalid_numbers(&self) -> Vec<&str> {
        self.invalid.iter().map(|f| f.number.as_str()).collect()
    }

    pub fn set_execution_time(&mut self, duration_ms: u64) {
        self.summary.execution_time_ms = duration_ms;
    }

    /// Merge another report into this one
    pub fn merge(&mut self, other: AnalysisReport) {
        for finding in other.valid.into_iter().chain(other.invalid) {
            self.add_finding(finding);
        }
        self.summary.total_sources += other.summary.total_sources;
        self.summary.text_length += other.summary.text_length;
    }

    /// Order findings by source, then position, for stable output across parallel runs
    pub fn sort_findings(&mut self) {
        let by_position = |a: &Finding, b: &Finding| {
            a.source.cmp(&b.source).then_with(|| a.offset.cmp(&b.offset))
        };
        self.valid.sort_by(by_position);
        self.invalid.sort_by(by_position);
    }
}

impl Default for AnalysisReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Error types that can occur outside the pure validation core
#[derive(Debug, thiserror::Error)]
pub enum KimlikError {
    /// Configuration file could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// File could not be read or written
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Glob or regex pattern could not be compiled
    #[error("Pattern error: {message}")]
    Pattern { message: String },

    /// Analysis failed for a specific file
    #[error("Analysis error in {file}: {message}")]
    Analysis { file: String, message: String },

    /// Nothing usable was provided to analyze
    #[error("{message}")]
    Input { message: String },

    /// A report could not be rendered
    #[error("Report error: {message}")]
    Report { message: String },
}

impl KimlikError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    pub fn pattern(message: impl Into<String>) -> Self {
        Self::Pattern { message: message.into() }
    }

    pub fn analysis(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Analysis { file: file.into(), message: message.into() }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::Input { message: message.into() }
    }

    pub fn report(message: impl Into<String>) -> Self {
        Self::Report { message: message.into() }
    }
}

/// Result type for analysis operations
pub type KimlikResult<T> = Result<T, KimlikError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::CandidateExtractor;

    fn findings(text: &str, source: Source) -> Vec<Finding> {
        CandidateExtractor::new()
            .find_candidates(text)
            .into_iter()
            .map(|c| Finding::from_candidate(c, source.clone()))
            .collect()
    }

    #[test]
    fn test_report_partitions_findings() {
        let mut report = AnalysisReport::new();
        for finding in findings("10000000146 12345678901 10000000146", Source::Text) {
            report.add_finding(finding);
        }

        assert!(report.has_findings());
        assert!(report.has_invalid());
        assert_eq!(report.valid_numbers(), vec!["10000000146", "10000000146"]);
        assert_eq!(report.invalid_numbers(), vec!["12345678901"]);
        assert_eq!(report.summary.total(), 3);
    }

    #[test]
    fn test_finding_display() {
        let text_finding = findings("10000000146", Source::Text).remove(0);
        assert_eq!(text_finding.format_display(), "100 000 00 146 (10000000146)");

        let file_finding =
            findings("x\n 10000000146", Source::File(PathBuf::from("data/list.txt"))).remove(0);
        assert_eq!(
            file_finding.format_display(),
            "100 000 00 146 (10000000146) [data/list.txt:2:2]"
        );
    }

    #[test]
    fn test_merge_and_sort() {
        let mut first = AnalysisReport::new();
        for finding in findings("12345678901", Source::File(PathBuf::from("b.txt"))) {
            first.add_finding(finding);
        }
        first.add_source(11);

        let mut second = AnalysisReport::new();
        for finding in findings("10000000146 11111111111", Source::File(PathBuf::from("a.txt"))) {
            second.add_finding(finding);
        }
        second.add_source(23);

        first.merge(second);
        first.sort_findings();

        assert_eq!(first.summary.total_sources, 2);
        assert_eq!(first.summary.text_length, 34);
        assert_eq!(first.invalid[0].source, Source::File(PathBuf::from("a.txt")));
        assert_eq!(first.invalid[1].source, Source::File(PathBuf::from("b.txt")));
    }

    #[test]
    fn test_source_ordering_and_display() {
        assert!(Source::Text < Source::Stdin);
        assert!(Source::Stdin < Source::File(PathBuf::from("a")));
        assert_eq!(Source::Stdin.to_string(), "<stdin>");
    }
}
