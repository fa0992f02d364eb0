//! TC Kimlik - validation and bulk scanning of Turkish national identity numbers
//!
//! Architecture: Clean Architecture - Library interface serves as the application layer
//! - `validate` and `extract` are the pure core; everything else builds on them
//! - Analysis, configuration and reporting sit around the core without feeding state back into it
//! - The `KimlikScanner` facade gives front ends one entry point for every kind of input

pub mod analyzer;
pub mod config;
pub mod domain;
pub mod patterns;
pub mod report;

// Re-export main types for convenient access
pub use domain::findings::{
    AnalysisReport, AnalysisSummary, Finding, KimlikError, KimlikResult, Source,
};

pub use domain::identity::{
    check_digits, diagnose, format_grouped, normalize, validate, IdentityNumber, InputStatus,
    Rejection, IDENTITY_LENGTH,
};

pub use patterns::{extract, Candidate, CandidateExtractor, CANDIDATE_PATTERN};

pub use config::KimlikConfig;

pub use analyzer::{AnalysisOptions, Analyzer};

pub use report::{OutputFormat, ReportFormatter, ReportOptions};

use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

/// Something to scan for identity numbers
#[derive(Debug, Clone)]
pub enum ScanInput {
    /// Text supplied directly
    Text(String),
    /// Everything readable from standard input
    Stdin,
    /// Files and directories on disk
    Paths(Vec<PathBuf>),
}

/// Main scanner providing high-level analysis operations
pub struct KimlikScanner {
    analyzer: Analyzer,
    report_formatter: ReportFormatter,
}

impl KimlikScanner {
    /// Create a new scanner with the given configuration
    pub fn new_with_config(config: KimlikConfig) -> KimlikResult<Self> {
        let analyzer = Analyzer::new(config)?;
        Ok(Self { analyzer, report_formatter: ReportFormatter::default() })
    }

    /// Create a scanner with default configuration
    pub fn new() -> KimlikResult<Self> {
        Self::new_with_config(KimlikConfig::default())
    }

    /// Create a scanner loading configuration from file
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> KimlikResult<Self> {
        Self::new_with_config(KimlikConfig::load_from_file(path)?)
    }

    /// Set custom report formatter
    pub fn with_report_formatter(mut self, formatter: ReportFormatter) -> Self {
        self.report_formatter = formatter;
        self
    }

    /// Scan any supported input
    pub async fn analyze(
        &self,
        input: ScanInput,
        options: &AnalysisOptions,
    ) -> KimlikResult<AnalysisReport> {
        match input {
            ScanInput::Text(text) => self.analyze_text(&text, Source::Text),
            ScanInput::Stdin => {
                let mut text = String::new();
                tokio::io::stdin().read_to_string(&mut text).await?;
                self.analyze_text(&text, Source::Stdin)
            }
            ScanInput::Paths(paths) => self.analyze_paths(&paths, options),
        }
    }

    /// Scan pasted or piped text; blank input is refused
    pub fn analyze_text(&self, text: &str, source: Source) -> KimlikResult<AnalysisReport> {
        if text.trim().is_empty() {
            return Err(KimlikError::input("Please enter some text to analyze"));
        }

        Ok(self.analyzer.analyze_text(text, source))
    }

    /// Scan files and directory trees
    pub fn analyze_paths<P: AsRef<Path>>(
        &self,
        paths: &[P],
        options: &AnalysisOptions,
    ) -> KimlikResult<AnalysisReport> {
        if paths.is_empty() {
            return Err(KimlikError::input("No files or directories to analyze"));
        }
        self.analyzer.analyze_paths(paths, options)
    }

    /// Format an analysis report for output
    pub fn format_report(&self, report: &AnalysisReport, format: OutputFormat) -> KimlikResult<String> {
        self.report_formatter.format_report(report, format)
    }

    /// Render a report and write it to `path`, replacing any existing file
    pub fn save_report<P: AsRef<Path>>(
        &self,
        report: &AnalysisReport,
        format: OutputFormat,
        path: P,
    ) -> KimlikResult<()> {
        let file = std::fs::File::create(path.as_ref())?;
        self.report_formatter.write_report(report, format, std::io::BufWriter::new(file))?;
        tracing::debug!("Report saved to {}", path.as_ref().display());
        Ok(())
    }

    /// The analyzer behind this scanner
    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }
}

/// Convenience function to scan a directory with default settings
pub fn scan_directory<P: AsRef<Path>>(directory: P) -> KimlikResult<AnalysisReport> {
    let scanner = KimlikScanner::new()?;
    scanner.analyze_paths(&[directory], &AnalysisOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_analyze_text_input() {
        let scanner = KimlikScanner::new().unwrap();
        let report = scanner
            .analyze(
                ScanInput::Text("  10000000146 and 12345678901\n".to_string()),
                &AnalysisOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(report.valid_numbers(), vec!["10000000146"]);
        assert_eq!(report.invalid_numbers(), vec!["12345678901"]);
        // Surrounding whitespace is not counted
        assert_eq!(report.summary.text_length, 27);
        assert_eq!(report.valid[0].source, Source::Text);
    }

    #[test]
    fn test_positions_count_leading_blank_lines() {
        let scanner = KimlikScanner::new().unwrap();
        let report = scanner.analyze_text("\n\nx 10000000146  \n", Source::Stdin).unwrap();

        let finding = &report.valid[0];
        assert_eq!((finding.line, finding.column), (3, 3));
        assert_eq!(finding.offset, 4);
        assert_eq!(report.summary.text_length, 13);
    }

    #[tokio::test]
    async fn test_blank_text_is_refused() {
        let scanner = KimlikScanner::new().unwrap();
        let result = scanner.analyze(ScanInput::Text(" \n\t".to_string()), &AnalysisOptions::default()).await;

        assert!(matches!(result, Err(KimlikError::Input { .. })));
    }

    #[tokio::test]
    async fn test_analyze_paths_input() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("people.txt"), "10000000146\n10000000146\n").unwrap();

        let scanner = KimlikScanner::new().unwrap();
        let report = scanner
            .analyze(ScanInput::Paths(vec![temp_dir.path().to_path_buf()]), &AnalysisOptions::default())
            .await
            .unwrap();

        assert_eq!(report.summary.valid_count, 2);
        assert!(!report.has_invalid());
    }

    #[test]
    fn test_empty_path_list_is_refused() {
        let scanner = KimlikScanner::new().unwrap();
        let paths: Vec<PathBuf> = Vec::new();
        assert!(scanner.analyze_paths(&paths, &AnalysisOptions::default()).is_err());
    }

    #[test]
    fn test_save_report_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("results.txt");
        fs::write(&output, "stale content that is much longer than the new report ".repeat(50)).unwrap();

        let scanner = KimlikScanner::new()
            .unwrap()
            .with_report_formatter(ReportFormatter::new(ReportOptions {
                use_colors: false,
                ..Default::default()
            }));
        let report = scanner.analyze_text("10000000146", Source::Text).unwrap();
        scanner.save_report(&report, OutputFormat::Human, &output).unwrap();

        let saved = fs::read_to_string(&output).unwrap();
        assert!(saved.starts_with("=== TC Kimlik Analysis Results ==="));
        assert!(!saved.contains("stale content"));
        assert!(saved.contains("100 000 00 146 (10000000146)"));
    }

    #[test]
    fn test_scanner_from_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("tc_kimlik.yaml");
        fs::write(&config_file, "version: \"1.0\"\nscan:\n  max_file_size: 64\n").unwrap();

        let scanner = KimlikScanner::from_config_file(&config_file).unwrap();
        assert_eq!(scanner.analyzer().config().scan.max_file_size, Some(64));

        fs::write(&config_file, "version: \"3.0\"\n").unwrap();
        assert!(KimlikScanner::from_config_file(&config_file).is_err());
    }

    #[test]
    fn test_scan_directory() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "no numbers").unwrap();

        let report = scan_directory(temp_dir.path()).unwrap();
        assert_eq!(report.summary.total_sources, 1);
        assert!(!report.has_findings());
    }

    #[test]
    fn test_core_reexports() {
        assert!(validate("10000000146"));
        let (valid, invalid) = extract("10000000146 12345678901");
        assert_eq!((valid.len(), invalid.len()), (1, 1));
    }
}
