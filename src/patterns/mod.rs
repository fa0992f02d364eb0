//! Candidate extraction for bulk text analysis
//!
//! Architectural Principle: Service Layer - the extractor turns free text into classified candidates
//! - One compiled pattern with two alternatives: digit groups with optional separators, or a bare run
//! - Matches are non-overlapping and leftmost-first, alternatives tried in order at each position
//! - Every surviving candidate is classified by the checksum rules in the domain layer

pub mod path_filter;

use crate::domain::identity::{diagnose, Rejection, IDENTITY_LENGTH};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use path_filter::PathFilter;

/// Shapes that look like a TC Kimlik No in running text
pub const CANDIDATE_PATTERN: &str = concat!(
    r"\b[0-9]{1,2}[\s-]?[0-9]{3}[\s-]?[0-9]{3}[\s-]?[0-9]{2}[\s-]?[0-9]{1,2}\b",
    r"|\b[0-9]{11}\b"
);

lazy_static! {
    static ref CANDIDATE_REGEX: Regex =
        Regex::new(CANDIDATE_PATTERN).expect("candidate pattern is a valid regex");
}

/// A digit run found in text, normalized and classified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Text exactly as matched, separators included
    pub raw: String,
    /// The 11 digits with separators removed
    pub number: String,
    /// Byte offset of the match in the scanned text
    pub offset: usize,
    /// Line number (1-indexed)
    pub line: u32,
    /// Column in characters (1-indexed)
    pub column: u32,
    /// Why the number failed validation, `None` when valid
    pub rejection: Option<Rejection>,
}

impl Candidate {
    /// Whether the candidate passed both checksums
    pub fn is_valid(&self) -> bool {
        self.rejection.is_none()
    }
}

/// Scans text for identity number candidates
#[derive(Debug, Clone)]
pub struct CandidateExtractor {
    pattern: &'static Regex,
}

impl CandidateExtractor {
    /// Create an extractor backed by the shared compiled pattern
    pub fn new() -> Self {
        Self { pattern: &CANDIDATE_REGEX }
    }

    /// Find every candidate in scan order, with positions
    pub fn find_candidates(&self, text: &str) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        let mut cursor = LineCursor::default();

        for found in self.pattern.find_iter(text) {
            let raw = found.as_str();
            let number = strip_separators(raw);

            // Optional separators can let a 9, 10 or 12 digit run through
            if number.len() != IDENTITY_LENGTH || !number.bytes().all(|b| b.is_ascii_digit()) {
                tracing::trace!("Discarding '{}' at offset {}", raw, found.start());
                continue;
            }

            let (line, column) = cursor.advance(text, found.start());
            let rejection = diagnose(&number).err();

            tracing::trace!(
                "Candidate '{}' at {}:{} -> {}",
                number,
                line,
                column,
                rejection.map_or("valid", Rejection::as_str)
            );

            candidates.push(Candidate {
                raw: raw.to_string(),
                number,
                offset: found.start(),
                line,
                column,
                rejection,
            });
        }

        tracing::debug!("Found {} candidates in {} bytes", candidates.len(), text.len());
        candidates
    }

    /// Split candidates into valid and invalid numbers, preserving order and duplicates
    pub fn extract(&self, text: &str) -> (Vec<String>, Vec<String>) {
        let mut valid = Vec::new();
        let mut invalid = Vec::new();

        for candidate in self.find_candidates(text) {
            if candidate.is_valid() {
                valid.push(candidate.number);
            } else {
                invalid.push(candidate.number);
            }
        }

        (valid, invalid)
    }
}

impl Default for CandidateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract and classify every candidate in `text` using the shared pattern
pub fn extract(text: &str) -> (Vec<String>, Vec<String>) {
    CandidateExtractor::new().extract(text)
}

fn strip_separators(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace() && *c != '-').collect()
}

/// Tracks line starts while walking forward through matches
#[derive(Debug, Default)]
struct LineCursor {
    scanned_to: usize,
    line: u32,
    line_start: usize,
}

impl LineCursor {
    fn advance(&mut self, text: &str, offset: usize) -> (u32, u32) {
        for (index, byte) in text.as_bytes()[self.scanned_to..offset].iter().enumerate() {
            if *byte == b'\n' {
                self.line += 1;
                self.line_start = self.scanned_to + index + 1;
            }
        }
        self.scanned_to = offset;

        let column = text[self.line_start..offset].chars().count() + 1;
        (self.line + 1, column as u32)
    }
}
