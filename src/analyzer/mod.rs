//! Analysis orchestrator for text sources and file trees
//!
//! CDD Principle: Domain Services - Analyzer orchestrates bulk identity number scanning
//! - Coordinates path filtering, candidate extraction, and report aggregation
//! - Provides clean interface for scanning inline text, single files, or directory trees
//! - Handles parallel processing and error recovery gracefully

use crate::config::KimlikConfig;
use crate::domain::findings::{AnalysisReport, Finding, KimlikError, KimlikResult, Source};
use crate::patterns::{CandidateExtractor, PathFilter};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Scans sources for identity numbers and builds reports
pub struct Analyzer {
    config: KimlikConfig,
    extractor: CandidateExtractor,
    path_filter: PathFilter,
}

/// Options for customizing analysis behavior
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Whether to use parallel processing
    pub parallel: bool,
    /// Maximum number of files to analyze
    pub max_files: Option<usize>,
    /// Whether to continue on errors or fail fast
    pub fail_fast: bool,
    /// Additional paths to exclude
    pub exclude_patterns: Vec<String>,
    /// Whether to ignore .kimlikignore files
    pub ignore_ignore_files: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            max_files: None,
            fail_fast: false,
            exclude_patterns: Vec::new(),
            ignore_ignore_files: false,
        }
    }
}

/// Findings and size of one scanned source
struct SourceScan {
    findings: Vec<Finding>,
    text_length: usize,
}

impl Analyzer {
    /// Create a new analyzer with the given configuration
    pub fn new(config: KimlikConfig) -> KimlikResult<Self> {
        config.validate()?;

        let path_filter = PathFilter::new(config.paths.patterns.clone(), config.ignore_file())
            .map_err(|e| KimlikError::config(format!("Failed to create path filter: {e}")))?;

        Ok(Self { config, extractor: CandidateExtractor::new(), path_filter })
    }

    /// Create an analyzer with default configuration
    pub fn with_defaults() -> KimlikResult<Self> {
        Self::new(KimlikConfig::default())
    }

    /// The configuration this analyzer was built with
    pub fn config(&self) -> &KimlikConfig {
        &self.config
    }

    /// Analyze text that did not come from a file
    pub fn analyze_text(&self, text: &str, source: Source) -> AnalysisReport {
        let start_time = Instant::now();
        let mut report = AnalysisReport::new();

        let scan = self.scan_text(text, &source);
        report.add_source(scan.text_length);
        for finding in scan.findings {
            report.add_finding(finding);
        }

        report.set_execution_time(start_time.elapsed().as_millis() as u64);
        report
    }

    /// Analyze a single file and return its findings in scan order
    pub fn analyze_file<P: AsRef<Path>>(&self, file_path: P) -> KimlikResult<Vec<Finding>> {
        Ok(self.scan_file(file_path.as_ref())?.findings)
    }

    fn scan_text(&self, text: &str, source: &Source) -> SourceScan {
        let findings = self
            .extractor
            .find_candidates(text)
            .into_iter()
            .map(|candidate| Finding::from_candidate(candidate, source.clone()))
            .collect();

        // Positions refer to the full text; the length ignores surrounding whitespace
        SourceScan { findings, text_length: text.trim().chars().count() }
    }

    fn scan_file(&self, file_path: &Path) -> KimlikResult<SourceScan> {
        if let Some(limit) = self.config.scan.max_file_size {
            let size = fs::metadata(file_path)
                .map_err(|e| {
                    KimlikError::analysis(file_path.display().to_string(), format!("Failed to stat file: {e}"))
                })?
                .len();

            if size > limit {
                return Err(KimlikError::analysis(
                    file_path.display().to_string(),
                    format!("File is {size} bytes, larger than the {limit} byte limit"),
                ));
            }
        }

        let content = fs::read_to_string(file_path).map_err(|e| {
            KimlikError::analysis(file_path.display().to_string(), format!("Failed to read file: {e}"))
        })?;

        Ok(self.scan_text(&content, &Source::File(file_path.to_path_buf())))
    }

    /// Analyze files and directories and return a combined report
    pub fn analyze_paths<P: AsRef<Path>>(
        &self,
        paths: &[P],
        options: &AnalysisOptions,
    ) -> KimlikResult<AnalysisReport> {
        let start_time = Instant::now();
        let mut report = AnalysisReport::new();

        let files_to_analyze = self.collect_files(paths, options)?;

        let scans = if options.parallel && files_to_analyze.len() > 1 {
            self.scan_files_parallel(&files_to_analyze, options)?
        } else {
            self.scan_files_sequential(&files_to_analyze, options)?
        };

        for scan in scans {
            report.add_source(scan.text_length);
            for finding in scan.findings {
                report.add_finding(finding);
            }
        }

        report.sort_findings();
        report.set_execution_time(start_time.elapsed().as_millis() as u64);

        tracing::debug!(
            "Analyzed {} files: {} valid, {} invalid",
            report.summary.total_sources,
            report.summary.valid_count,
            report.summary.invalid_count
        );

        Ok(report)
    }

    /// Resolve input paths to the list of files that will be scanned
    pub fn collect_files<P: AsRef<Path>>(
        &self,
        paths: &[P],
        options: &AnalysisOptions,
    ) -> KimlikResult<Vec<PathBuf>> {
        let mut filter = self.path_filter.clone();
        if options.ignore_ignore_files {
            filter = filter.without_ignore_files();
        }
        for pattern in &options.exclude_patterns {
            filter.add_pattern(pattern)?;
        }

        let mut files = Vec::new();
        for path in paths {
            let path = path.as_ref();

            if path.is_file() {
                // Explicitly named files only go through the extra exclusions
                if options.exclude_patterns.is_empty() || filter.should_analyze(path)? {
                    files.push(path.to_path_buf());
                }
            } else if path.is_dir() {
                files.extend(filter.find_files(path, self.config.scan.follow_links)?);
            } else {
                let error = KimlikError::analysis(path.display().to_string(), "No such file or directory");
                if options.fail_fast {
                    return Err(error);
                }
                tracing::warn!("{}", error);
            }
        }

        if let Some(max_files) = options.max_files {
            files.truncate(max_files);
        }

        Ok(files)
    }

    fn scan_files_sequential(
        &self,
        files: &[PathBuf],
        options: &AnalysisOptions,
    ) -> KimlikResult<Vec<SourceScan>> {
        let mut scans = Vec::new();

        for file_path in files {
            match self.scan_file(file_path) {
                Ok(scan) => scans.push(scan),
                Err(e) if options.fail_fast => return Err(e),
                Err(e) => tracing::warn!("Skipping {}: {}", file_path.display(), e),
            }
        }

        Ok(scans)
    }

    fn scan_files_parallel(
        &self,
        files: &[PathBuf],
        options: &AnalysisOptions,
    ) -> KimlikResult<Vec<SourceScan>> {
        let results: Vec<(&PathBuf, KimlikResult<SourceScan>)> =
            files.par_iter().map(|file_path| (file_path, self.scan_file(file_path))).collect();

        let mut scans = Vec::with_capacity(results.len());
        for (file_path, result) in results {
            match result {
                Ok(scan) => scans.push(scan),
                Err(e) if options.fail_fast => return Err(e),
                Err(e) => tracing::warn!("Skipping {}: {}", file_path.display(), e),
            }
        }

        Ok(scans)
    }
}
