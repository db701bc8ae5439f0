// ⚠️ Error taxonomy - one variant per validation gate
// Every gate fails terminally; nothing here is retryable.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// REGISTRY DATA ERRORS
// ============================================================================

/// A malformed entry in the static country table.
///
/// Callers cannot trigger these with their input; they surface the first time
/// a broken country rule is used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("layout descriptor is empty")]
    EmptyDescriptor,

    #[error("layout descriptor {descriptor:?} has a truncated or non-ASCII token at offset {offset}")]
    MalformedToken { descriptor: String, offset: usize },

    #[error("unknown character class {class:?} in layout descriptor {descriptor:?}")]
    UnknownClass { descriptor: String, class: char },

    #[error("repeat count {count:?} in layout descriptor {descriptor:?} is not a positive integer")]
    InvalidRepeatCount { descriptor: String, count: String },

    #[error("declared IBAN length {declared} does not match length {computed} implied by the layout")]
    LengthInvariant { declared: usize, computed: usize },
}

// ============================================================================
// VALIDATION ERRORS
// ============================================================================

/// Why an input is not a valid IBAN.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("IBAN can contain only alphanumeric characters")]
    InvalidCharacters,

    #[error("IBAN must start with country code (2 letters) and check digits (2 digits)")]
    MalformedHeader,

    /// The registry is a snapshot and may lag real-world IBAN adoption.
    #[error("unsupported country code {country_code}; confirm with an external IBAN service")]
    UnsupportedCountry { country_code: String },

    #[error("IBAN length {actual} does not match length {expected} specified for country code {country_code}")]
    LengthMismatch {
        country_code: String,
        actual: usize,
        expected: usize,
    },

    #[error("BBAN part of IBAN is not formatted according to the {country_code} layout {layout}")]
    BbanFormatMismatch {
        country_code: String,
        layout: &'static str,
    },

    #[error("IBAN has incorrect check digits (mod-97 remainder {remainder}, expected 1)")]
    ChecksumInvalid { remainder: u32 },

    #[error("IBAN check digit computation failed: {0}")]
    ChecksumComputationFailed(String),

    #[error("country rule {country_code} is malformed: {source}")]
    RegistryData {
        country_code: String,
        #[source]
        source: RegistryError,
    },
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::InvalidCharacters => ErrorKind::InvalidCharacters,
            ValidationError::MalformedHeader => ErrorKind::MalformedHeader,
            ValidationError::UnsupportedCountry { .. } => ErrorKind::UnsupportedCountry,
            ValidationError::LengthMismatch { .. } => ErrorKind::LengthMismatch,
            ValidationError::BbanFormatMismatch { .. } => ErrorKind::BbanFormatMismatch,
            ValidationError::ChecksumInvalid { .. } => ErrorKind::ChecksumInvalid,
            ValidationError::ChecksumComputationFailed(_) => ErrorKind::ChecksumComputationFailed,
            ValidationError::RegistryData { .. } => ErrorKind::RegistryData,
        }
    }

    /// True when the input may still be valid and should be double-checked
    /// elsewhere rather than rejected outright.
    pub fn is_advisory(&self) -> bool {
        matches!(self, ValidationError::UnsupportedCountry { .. })
    }

    /// True for failures that point at a bug in this crate's data or code,
    /// not at the caller's input.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            ValidationError::RegistryData { .. } | ValidationError::ChecksumComputationFailed(_)
        )
    }
}

// ============================================================================
// ERROR KIND
// ============================================================================

/// Payload-free discriminant of [`ValidationError`], stable for reports and JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidCharacters,
    MalformedHeader,
    UnsupportedCountry,
    LengthMismatch,
    BbanFormatMismatch,
    ChecksumInvalid,
    ChecksumComputationFailed,
    RegistryData,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidCharacters => "invalid_characters",
            ErrorKind::MalformedHeader => "malformed_header",
            ErrorKind::UnsupportedCountry => "unsupported_country",
            ErrorKind::LengthMismatch => "length_mismatch",
            ErrorKind::BbanFormatMismatch => "bban_format_mismatch",
            ErrorKind::ChecksumInvalid => "checksum_invalid",
            ErrorKind::ChecksumComputationFailed => "checksum_computation_failed",
            ErrorKind::RegistryData => "registry_data",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_mismatch_message_carries_detail() {
        let err = ValidationError::LengthMismatch {
            country_code: "NL".to_string(),
            actual: 17,
            expected: 18,
        };

        let message = err.to_string();
        assert!(message.contains("17"));
        assert!(message.contains("18"));
        assert!(message.contains("NL"));
        assert_eq!(err.kind(), ErrorKind::LengthMismatch);
    }

    #[test]
    fn test_only_unsupported_country_is_advisory() {
        let unsupported = ValidationError::UnsupportedCountry {
            country_code: "ZZ".to_string(),
        };
        assert!(unsupported.is_advisory());
        assert!(!unsupported.is_internal());

        assert!(!ValidationError::MalformedHeader.is_advisory());
        assert!(!ValidationError::ChecksumInvalid { remainder: 88 }.is_advisory());
    }

    #[test]
    fn test_internal_errors() {
        let data = ValidationError::RegistryData {
            country_code: "XX".to_string(),
            source: RegistryError::EmptyDescriptor,
        };
        assert!(data.is_internal());
        assert!(data.to_string().contains("XX"));
        assert!(std::error::Error::source(&data).is_some());

        assert!(ValidationError::ChecksumComputationFailed("x".to_string()).is_internal());
        assert!(!ValidationError::InvalidCharacters.is_internal());
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::BbanFormatMismatch).unwrap();
        assert_eq!(json, "\"bban_format_mismatch\"");
        assert_eq!(ErrorKind::BbanFormatMismatch.to_string(), "bban_format_mismatch");
    }
}
