//! Validation result types.

use serde::Serialize;

use super::codes::{ErrorCode, ValidationCode, WarningCode};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Validation result with categorized issues.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ValidationResult {
    /// Validation errors (always fail).
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (fail with --strict).
    pub warnings: Vec<ValidationIssue>,
}

/// A validation issue (error or warning).
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    /// Error/warning code.
    pub code: ValidationCode,

    /// Short description (e.g., "forbidden field").
    pub message: String,

    /// Location in the server document (e.g., "packages[0].version").
    pub location: String,

    /// Detailed explanation.
    pub details: String,

    /// Optional help suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ValidationResult {
    /// Returns true if there are no errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if there are no errors or warnings.
    pub fn is_strict_valid(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Record an error.
    pub fn error(
        &mut self,
        code: ErrorCode,
        message: &str,
        location: impl Into<String>,
        details: impl Into<String>,
        help: Option<String>,
    ) {
        self.errors.push(ValidationIssue {
            code: code.into(),
            message: message.into(),
            location: location.into(),
            details: details.into(),
            help,
        });
    }

    /// Record a warning.
    pub fn warning(
        &mut self,
        code: WarningCode,
        message: &str,
        location: impl Into<String>,
        details: impl Into<String>,
        help: Option<String>,
    ) {
        self.warnings.push(ValidationIssue {
            code: code.into(),
            message: message.into(),
            location: location.into(),
            details: details.into(),
            help,
        });
    }

    /// Whether any error carries `code`.
    pub fn has_error(&self, code: ErrorCode) -> bool {
        self.errors
            .iter()
            .any(|e| e.code == ValidationCode::Error(code))
    }

    /// Whether any warning carries `code`.
    pub fn has_warning(&self, code: WarningCode) -> bool {
        self.warnings
            .iter()
            .any(|w| w.code == ValidationCode::Warning(code))
    }
}
