//! Staged artifact and validation value objects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The role an uploaded artifact plays in the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileRole {
    /// The book block manuscript.
    Interior,

    /// The cover artwork.
    Cover,
}

impl FileRole {
    /// Returns the role name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileRole::Interior => "interior",
            FileRole::Cover => "cover",
        }
    }
}

impl std::fmt::Display for FileRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An artifact uploaded to durable storage.
///
/// Owned by the order attempt that created it; storage lifetime is
/// provider-controlled, so the pipeline never deletes staged files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedFile {
    /// Opaque, content-unique reference URL.
    pub url: String,
    /// Uploaded size in bytes.
    pub byte_size: u64,
    /// Declared role.
    pub role: FileRole,
    /// When the upload completed.
    pub uploaded_at: DateTime<Utc>,
}

impl StagedFile {
    /// Creates a staged file record with the current timestamp.
    pub fn new(url: impl Into<String>, byte_size: u64, role: FileRole) -> Self {
        Self {
            url: url.into(),
            byte_size,
            role,
            uploaded_at: Utc::now(),
        }
    }
}

/// Normalized verdict from the provider's file validation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Validation has not completed yet.
    #[default]
    Pending,

    /// File accepted as-is.
    Normalized,

    /// File accepted with non-fatal issues.
    Warning,

    /// File rejected; blocks submission.
    Error,
}

impl ValidationStatus {
    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Pending => "pending",
            ValidationStatus::Normalized => "normalized",
            ValidationStatus::Warning => "warning",
            ValidationStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-file validation outcome.
///
/// Transient: not persisted beyond the submission attempt and
/// re-derived on retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// The normalized verdict.
    pub status: ValidationStatus,
    /// Diagnostic messages from the validator.
    pub messages: Vec<String>,
}

impl ValidationResult {
    /// A clean result with the given status and no diagnostics.
    pub fn clean(status: ValidationStatus) -> Self {
        Self {
            status,
            messages: Vec::new(),
        }
    }

    /// An error result with a single diagnostic message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ValidationStatus::Error,
            messages: vec![message.into()],
        }
    }

    /// True when this verdict blocks proceeding to submission.
    ///
    /// Only `Normalized` and `Warning` proceed. An unresolved
    /// `Pending` blocks the same as `Error`: a file the validator has
    /// not vouched for never reaches submission.
    pub fn blocks_submission(&self) -> bool {
        !matches!(
            self.status,
            ValidationStatus::Normalized | ValidationStatus::Warning
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_role_display() {
        assert_eq!(FileRole::Interior.to_string(), "interior");
        assert_eq!(FileRole::Cover.to_string(), "cover");
    }

    #[test]
    fn test_staged_file_records_metadata() {
        let staged = StagedFile::new("https://storage.test/ab12", 4_096, FileRole::Cover);
        assert_eq!(staged.url, "https://storage.test/ab12");
        assert_eq!(staged.byte_size, 4_096);
        assert_eq!(staged.role, FileRole::Cover);
    }

    #[test]
    fn test_only_settled_accepting_verdicts_pass_the_gate() {
        assert!(!ValidationResult::clean(ValidationStatus::Normalized).blocks_submission());
        assert!(!ValidationResult::clean(ValidationStatus::Warning).blocks_submission());
        assert!(ValidationResult::error("bad margins").blocks_submission());
        assert!(ValidationResult::clean(ValidationStatus::Pending).blocks_submission());
    }

    #[test]
    fn test_validation_serialization_roundtrip() {
        let result = ValidationResult {
            status: ValidationStatus::Warning,
            messages: vec!["Minor margin adjustment recommended".to_string()],
        };
        let json = serde_json::to_string(&result).unwrap();
        let deserialized: ValidationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, deserialized);
    }
}
