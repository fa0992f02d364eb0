//! Report generation with multiple output formats
//!
//! CDD Principle: Anti-Corruption Layer - Formatters translate domain objects to external formats
//! - AnalysisReport (domain) is converted to various external representations
//! - Each formatter encapsulates the rules for its specific output format
//! - Domain logic remains pure while supporting multiple presentation needs

use crate::domain::findings::{AnalysisReport, Finding, KimlikError, KimlikResult};
use chrono::Local;
use serde_json::Value as JsonValue;
use std::io::Write;

/// Supported output formats for analysis reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain-text report for people
    Human,
    /// JSON format for programmatic consumption
    Json,
    /// One row per finding for spreadsheets
    Csv,
}

impl OutputFormat {
    /// Parse a format name or file extension
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" | "text" | "txt" => Some(Self::Human),
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Options for customizing report output
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Whether to use colored output (for human format)
    pub use_colors: bool,
    /// Whether to list invalid numbers
    pub show_invalid: bool,
    /// Whether to explain why each invalid number failed
    pub show_reasons: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { use_colors: true, show_invalid: true, show_reasons: false }
    }
}

#[derive(Debug, Clone, Copy)]
enum Tone {
    Heading,
    Valid,
    Invalid,
    Muted,
}

#[cfg(feature = "colors")]
fn paint(text: &str, tone: Tone) -> String {
    use colored::Colorize;

    match tone {
        Tone::Heading => text.bold().to_string(),
        Tone::Valid => text.green().to_string(),
        Tone::Invalid => text.red().to_string(),
        Tone::Muted => text.dimmed().to_string(),
    }
}

#[cfg(not(feature = "colors"))]
fn paint(text: &str, _tone: Tone) -> String {
    text.to_string()
}

/// Main report formatter that dispatches to specific formatters
pub struct ReportFormatter {
    options: ReportOptions,
}

impl ReportFormatter {
    /// Create a new report formatter with options
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    /// Format an analysis report in the specified format
    pub fn format_report(&self, report: &AnalysisReport, format: OutputFormat) -> KimlikResult<String> {
        match format {
            OutputFormat::Human => Ok(self.format_human(report)),
            OutputFormat::Json => self.format_json(report),
            OutputFormat::Csv => Ok(self.format_csv(report)),
        }
    }

    /// Write a formatted report to a writer
    pub fn write_report<W: Write>(
        &self,
        report: &AnalysisReport,
        format: OutputFormat,
        mut writer: W,
    ) -> KimlikResult<()> {
        let formatted = self.format_report(report, format)?;
        writer.write_all(formatted.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    fn style(&self, text: &str, tone: Tone) -> String {
        if self.options.use_colors {
            paint(text, tone)
        } else {
            text.to_string()
        }
    }

    fn format_human(&self, report: &AnalysisReport) -> String {
        let summary = &report.summary;
        let mut lines = vec![
            self.style("=== TC Kimlik Analysis Results ===", Tone::Heading),
            format!(
                "Analysis Date: {}",
                summary.analyzed_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
            ),
            format!("Text Length: {} characters", summary.text_length),
        ];
        if summary.total_sources > 1 {
            lines.push(format!("Sources Analyzed: {}", summary.total_sources));
        }
        lines.push(String::new());

        lines.push(format!("📊 {}", self.style("Summary:", Tone::Heading)));
        lines.push(format!("   Valid TC Numbers Found: {}", summary.valid_count));
        lines.push(format!("   Invalid TC Numbers Found: {}", summary.invalid_count));
        lines.push(format!("   Total Numbers Analyzed: {}", summary.total()));
        lines.push(String::new());

        if !report.valid.is_empty() {
            lines.push(format!("✅ {}", self.style("Valid TC Numbers:", Tone::Valid)));
            lines.extend(self.numbered(&report.valid));
            lines.push(String::new());
        }

        if self.options.show_invalid && !report.invalid.is_empty() {
            lines.push(format!("❌ {}", self.style("Invalid TC Numbers:", Tone::Invalid)));
            lines.extend(self.numbered(&report.invalid));
            lines.push(String::new());
        }

        if !report.has_findings() {
            lines.push("ℹ️ No TC numbers found in the text.".to_string());
        }

        lines.join("\n")
    }

    fn numbered(&self, findings: &[Finding]) -> Vec<String> {
        findings
            .iter()
            .enumerate()
            .map(|(index, finding)| {
                let mut line = format!("   {}. {}", index + 1, finding.format_display());
                if self.options.show_reasons {
                    if let Some(rejection) = finding.rejection {
                        line.push_str(&self.style(&format!(" - {rejection}"), Tone::Muted));
                    }
                }
                line
            })
            .collect()
    }

    fn format_json(&self, report: &AnalysisReport) -> KimlikResult<String> {
        let to_json = |finding: &Finding| {
            serde_json::json!({
                "number": finding.number,
                "formatted": finding.formatted(),
                "raw": finding.raw,
                "source": finding.source.to_string(),
                "line": finding.line,
                "column": finding.column,
                "rejection": finding.rejection.map(|r| r.as_str()),
                "reason": finding.rejection.map(|r| r.to_string()),
            })
        };

        let invalid: Vec<JsonValue> = if self.options.show_invalid {
            report.invalid.iter().map(to_json).collect()
        } else {
            Vec::new()
        };

        let json_report = serde_json::json!({
            "valid": report.valid.iter().map(to_json).collect::<Vec<_>>(),
            "invalid": invalid,
            "summary": {
                "total_sources": report.summary.total_sources,
                "text_length": report.summary.text_length,
                "valid_count": report.summary.valid_count,
                "invalid_count": report.summary.invalid_count,
                "total": report.summary.total(),
                "execution_time_ms": report.summary.execution_time_ms,
                "analyzed_at": report.summary.analyzed_at.to_rfc3339(),
            }
        });

        serde_json::to_string_pretty(&json_report)
            .map_err(|e| KimlikError::report(format!("JSON serialization failed: {e}")))
    }

    fn format_csv(&self, report: &AnalysisReport) -> String {
        let mut csv = String::from("status,number,formatted,source,line,column,reason\n");

        let invalid: &[Finding] = if self.options.show_invalid { &report.invalid } else { &[] };
        for finding in report.valid.iter().chain(invalid) {
            let status = if finding.is_valid() { "valid" } else { "invalid" };
            let reason = finding.rejection.map(|r| r.to_string()).unwrap_or_default();
            let row = [
                status.to_string(),
                finding.number.clone(),
                finding.formatted(),
                finding.source.to_string(),
                finding.line.to_string(),
                finding.column.to_string(),
                reason,
            ];
            let row: Vec<String> = row.iter().map(|field| escape_csv(field)).collect();
            csv.push_str(&row.join(","));
            csv.push('\n');
        }

        csv
    }
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self::new(ReportOptions::default())
    }
}

/// Quote a CSV field when it contains separators, quotes or line breaks
fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Analyzer;
    use crate::domain::findings::Source;
    use std::path::PathBuf;

    fn create_test_report() -> AnalysisReport {
        Analyzer::with_defaults()
            .unwrap()
            .analyze_text("My number is 10000000146 and also 12345678901 in here", Source::Text)
    }

    fn plain() -> ReportFormatter {
        ReportFormatter::new(ReportOptions { use_colors: false, ..Default::default() })
    }

    #[test]
    fn test_human_format() {
        let output = plain().format_report(&create_test_report(), OutputFormat::Human).unwrap();

        assert!(output.starts_with("=== TC Kimlik Analysis Results ===\nAnalysis Date: "));
        assert!(output.contains("Text Length: 53 characters"));
        assert!(output.contains("   Valid TC Numbers Found: 1"));
        assert!(output.contains("   Invalid TC Numbers Found: 1"));
        assert!(output.contains("   Total Numbers Analyzed: 2"));
        assert!(output.contains("✅ Valid TC Numbers:\n   1. 100 000 00 146 (10000000146)"));
        assert!(output.contains("❌ Invalid TC Numbers:\n   1. 123 456 78 901 (12345678901)"));
        assert!(!output.contains("No TC numbers found"));
    }

    #[test]
    fn test_human_format_options() {
        let report = create_test_report();

        let hidden = ReportFormatter::new(ReportOptions {
            use_colors: false,
            show_invalid: false,
            ..Default::default()
        })
        .format_report(&report, OutputFormat::Human)
        .unwrap();
        assert!(!hidden.contains("Invalid TC Numbers:"));

        let reasons = ReportFormatter::new(ReportOptions {
            use_colors: false,
            show_reasons: true,
            ..Default::default()
        })
        .format_report(&report, OutputFormat::Human)
        .unwrap();
        assert!(reasons.contains("(12345678901) - 10th digit should be 5, found 0"));
    }

    #[test]
    fn test_empty_report() {
        let report = Analyzer::with_defaults().unwrap().analyze_text("nothing here", Source::Text);
        let output = plain().format_report(&report, OutputFormat::Human).unwrap();

        assert!(output.contains("ℹ️ No TC numbers found in the text."));
        assert!(output.contains("Total Numbers Analyzed: 0"));
    }

    #[test]
    fn test_json_format() {
        let output = plain().format_report(&create_test_report(), OutputFormat::Json).unwrap();
        let json: JsonValue = serde_json::from_str(&output).unwrap();

        assert_eq!(json["valid"][0]["number"], "10000000146");
        assert_eq!(json["valid"][0]["formatted"], "100 000 00 146");
        assert!(json["valid"][0]["rejection"].is_null());
        assert_eq!(json["invalid"][0]["rejection"], "tenth_digit");
        assert_eq!(json["summary"]["text_length"], 53);
        assert_eq!(json["summary"]["total"], 2);
    }

    #[test]
    fn test_csv_format() {
        let mut report = create_test_report();
        report.valid[0].source = Source::File(PathBuf::from("exports/a,b.csv"));

        let output = plain().format_report(&report, OutputFormat::Csv).unwrap();
        let rows: Vec<&str> = output.lines().collect();

        assert_eq!(rows[0], "status,number,formatted,source,line,column,reason");
        assert_eq!(rows[1], "valid,10000000146,100 000 00 146,\"exports/a,b.csv\",1,14,");
        assert_eq!(rows[2], "invalid,12345678901,123 456 78 901,<text>,1,35,\"10th digit should be 5, found 0\"");
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_write_report() {
        let mut buffer = Vec::new();
        plain().write_report(&create_test_report(), OutputFormat::Csv, &mut buffer).unwrap();

        let written = String::from_utf8(buffer).unwrap();
        assert!(written.starts_with("status,number"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from_str("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("txt"), Some(OutputFormat::Human));
        assert_eq!(OutputFormat::from_str("sarif"), None);
    }
}
