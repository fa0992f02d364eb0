//! TC Kimlik No checksum rules
//!
//! Architecture: Value Object - an `IdentityNumber` can only exist if it passed every rule
//! - Normalization strips the separators users type (spaces and hyphens)
//! - Rules run in a fixed order so the first broken rule is the one reported
//! - Nothing here allocates state between calls; every function is pure

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of digits in a TC Kimlik No
pub const IDENTITY_LENGTH: usize = 11;

/// Why a value is not a valid TC Kimlik No
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rejection {
    /// Not exactly 11 ASCII digits once spaces and hyphens are removed
    #[error("expected 11 digits, got {length} characters")]
    Malformed { length: usize },

    /// The first digit is 0
    #[error("first digit cannot be 0")]
    LeadingZero,

    /// The 10th digit does not match the first checksum
    #[error("10th digit should be {expected}, found {found}")]
    TenthDigit { expected: u8, found: u8 },

    /// The 11th digit does not match the second checksum
    #[error("11th digit should be {expected}, found {found}")]
    EleventhDigit { expected: u8, found: u8 },
}

impl Rejection {
    /// Short stable identifier for machine-readable output
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Malformed { .. } => "malformed",
            Self::LeadingZero => "leading_zero",
            Self::TenthDigit { .. } => "tenth_digit",
            Self::EleventhDigit { .. } => "eleventh_digit",
        }
    }
}

/// A TC Kimlik No that satisfied both checksum equations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityNumber([u8; IDENTITY_LENGTH]);

impl IdentityNumber {
    /// Parse and validate a raw value
    pub fn parse(input: &str) -> Result<Self, Rejection> {
        diagnose(input)
    }

    /// Complete a 9-digit prefix with its two check digits
    pub fn from_prefix(prefix: &str) -> Result<Self, Rejection> {
        let normalized = normalize(prefix);
        let first_nine: [u8; 9] = ascii_digits(&normalized)
            .ok_or(Rejection::Malformed { length: normalized.chars().count() })?;

        if first_nine[0] == 0 {
            return Err(Rejection::LeadingZero);
        }

        let (tenth, eleventh) = check_digits(&first_nine);
        let mut digits = [0u8; IDENTITY_LENGTH];
        digits[..9].copy_from_slice(&first_nine);
        digits[9] = tenth;
        digits[10] = eleventh;

        Ok(Self(digits))
    }

    /// The individual digits
    pub fn digits(&self) -> &[u8; IDENTITY_LENGTH] {
        &self.0
    }

    /// Display grouping used in reports: `DDD DDD DD DDD`
    pub fn formatted(&self) -> String {
        format_grouped(&self.to_string())
    }
}

impl fmt::Display for IdentityNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for digit in self.0 {
            write!(f, "{digit}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for IdentityNumber {
    type Err = Rejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for IdentityNumber {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IdentityNumber {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Check whether `input` is a valid TC Kimlik No
pub fn validate(input: &str) -> bool {
    diagnose(input).is_ok()
}

/// Validate `input`, reporting the first rule it breaks
pub fn diagnose(input: &str) -> Result<IdentityNumber, Rejection> {
    let normalized = normalize(input);
    let digits: [u8; IDENTITY_LENGTH] = ascii_digits(&normalized)
        .ok_or(Rejection::Malformed { length: normalized.chars().count() })?;

    if digits[0] == 0 {
        return Err(Rejection::LeadingZero);
    }

    let mut first_nine = [0u8; 9];
    first_nine.copy_from_slice(&digits[..9]);
    let (tenth, eleventh) = check_digits(&first_nine);

    if digits[9] != tenth {
        return Err(Rejection::TenthDigit { expected: tenth, found: digits[9] });
    }
    if digits[10] != eleventh {
        return Err(Rejection::EleventhDigit { expected: eleventh, found: digits[10] });
    }

    Ok(IdentityNumber(digits))
}

/// Compute the 10th and 11th digits for the first nine
pub fn check_digits(first_nine: &[u8; 9]) -> (u8, u8) {
    let odd_sum: i32 = first_nine.iter().step_by(2).map(|&d| i32::from(d)).sum();
    let even_sum: i32 = first_nine[1..8].iter().step_by(2).map(|&d| i32::from(d)).sum();

    // odd_sum * 7 - even_sum goes negative for inputs like 100000000
    let tenth = (odd_sum * 7 - even_sum).rem_euclid(10) as u8;

    let first_ten_sum: u32 = first_nine.iter().map(|&d| u32::from(d)).sum::<u32>() + u32::from(tenth);
    let eleventh = (first_ten_sum % 10) as u8;

    (tenth, eleventh)
}

/// Remove the separators a user may type between digit groups
pub fn normalize(input: &str) -> String {
    input.chars().filter(|c| *c != ' ' && *c != '-').collect()
}

/// Group an 11-digit string as `DDD DDD DD DDD`; other lengths come back unchanged
pub fn format_grouped(number: &str) -> String {
    if number.len() != IDENTITY_LENGTH || !number.is_ascii() {
        return number.to_string();
    }
    format!("{} {} {} {}", &number[..3], &number[3..6], &number[6..8], &number[8..])
}

/// Feedback for a value that is still being typed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InputStatus {
    /// Nothing entered
    Empty,
    /// Fewer or more than 11 characters so far
    Incomplete { entered: usize },
    /// Complete and valid
    Valid,
    /// Complete and invalid
    Invalid,
}

impl InputStatus {
    /// Classify partially typed input
    pub fn of(input: &str) -> Self {
        let trimmed = input.trim();
        let entered = trimmed.chars().count();

        if entered == 0 {
            Self::Empty
        } else if entered != IDENTITY_LENGTH {
            Self::Incomplete { entered }
        } else if validate(trimmed) {
            Self::Valid
        } else {
            Self::Invalid
        }
    }

    /// Message shown next to the input field
    pub fn message(self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Incomplete { entered } => format!("Enter 11 digits ({entered}/11)"),
            Self::Valid => "Valid TC Number".to_string(),
            Self::Invalid => "Invalid TC Number".to_string(),
        }
    }
}

fn ascii_digits<const N: usize>(value: &str) -> Option<[u8; N]> {
    let bytes = value.as_bytes();
    if bytes.len() != N || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }

    let mut digits = [0u8; N];
    for (slot, byte) in digits.iter_mut().zip(bytes) {
        *slot = byte - b'0';
    }
    Some(digits)
}
