//! Error types for ibl operations.
//!
//! This module provides a small error hierarchy with structured error codes
//! and suggestions for resolution.

use thiserror::Error;

/// Result type alias for ibl operations.
pub type IblResult<T> = Result<T, IblError>;

/// Main error type for all ibl operations.
#[derive(Error, Debug)]
pub enum IblError {
    /// Input validation failed (bad parameter, out-of-range index, ...).
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        suggestion: Option<String>,
    },

    /// A numerical computation produced an unusable value.
    #[error("Numerical error: {message}")]
    Numerical { message: String, code: ErrorCode },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Parse error.
    #[error("Parse error: {message}")]
    Parse { message: String, code: ErrorCode },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation (VAL_xxx)
    ValInvalidInput,
    ValInvalidParameter,
    ValIndexOutOfRange,
    ValEmptyInput,

    // Numerical (NUM_xxx)
    NumNotANumber,
    NumInvalidProbability,
    NumNoFiniteValue,

    // Parse (PARSE_xxx)
    ParseInvalidJson,
    ParseInvalidValue,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValInvalidParameter => "VAL_002",
            ErrorCode::ValIndexOutOfRange => "VAL_003",
            ErrorCode::ValEmptyInput => "VAL_004",
            ErrorCode::NumNotANumber => "NUM_001",
            ErrorCode::NumInvalidProbability => "NUM_002",
            ErrorCode::NumNoFiniteValue => "NUM_003",
            ErrorCode::ParseInvalidJson => "PARSE_001",
            ErrorCode::ParseInvalidValue => "PARSE_002",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl IblError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            suggestion: None,
        }
    }

    /// Create a validation error for a model parameter, with a suggestion.
    pub fn invalid_parameter(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidParameter,
            suggestion: Some(suggestion.into()),
        }
    }

    /// Create an out-of-range error.
    pub fn index_out_of_range(what: &str, index: usize, len: usize) -> Self {
        Self::Validation {
            message: format!("{} index {} out of range (len {})", what, index, len),
            code: ErrorCode::ValIndexOutOfRange,
            suggestion: None,
        }
    }

    /// Create an empty-input error.
    pub fn empty(what: impl Into<String>) -> Self {
        Self::Validation {
            message: format!("{} must not be empty", what.into()),
            code: ErrorCode::ValEmptyInput,
            suggestion: None,
        }
    }

    /// Create a numerical error.
    pub fn numerical(message: impl Into<String>) -> Self {
        Self::Numerical {
            message: message.into(),
            code: ErrorCode::NumNotANumber,
        }
    }

    /// Create an invalid-probability error.
    pub fn invalid_probability(value: f64) -> Self {
        Self::Numerical {
            message: format!("{} is not a valid probability", value),
            code: ErrorCode::NumInvalidProbability,
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseInvalidValue,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } => *code,
            Self::Numerical { code, .. } => *code,
            Self::Parse { code, .. } => *code,
            Self::Serialization(_) => ErrorCode::ParseInvalidJson,
            _ => ErrorCode::Internal,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            Self::Numerical { .. } => {
                Some("Check that parameters are finite and inside their valid ranges")
            }
            Self::Configuration(_) => Some("Use a .toml, .json, or .yaml file with valid fields"),
            _ => None,
        }
    }
}

/// Require `value` to be finite and strictly positive.
pub(crate) fn ensure_positive(name: &str, value: f64) -> IblResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(IblError::invalid_parameter(
            format!("{} must be finite and > 0, got {}", name, value),
            format!("Set {} to a positive number", name),
        ))
    }
}

/// Require `value` to be finite.
pub(crate) fn ensure_finite(name: &str, value: f64) -> IblResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(IblError::invalid_parameter(
            format!("{} must be finite, got {}", name, value),
            format!("Set {} to a finite number", name),
        ))
    }
}
