//! Error types for clod.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClodError>;

#[derive(Debug, Error)]
pub enum ClodError {
    #[error("invalid bundle path: {0}")]
    InvalidBundlePath(String),

    #[error("sounds.json not found in {0}")]
    ManifestNotFound(PathBuf),

    #[error("invalid sound pack schema: {0}")]
    SchemaValidationFailed(#[from] SchemaError),

    #[error("opencode plugin template not found at {0}")]
    TemplateMissing(PathBuf),

    #[error("opencode plugin template {path} is invalid: {reason}")]
    TemplateInvalid { path: PathBuf, reason: String },

    #[error("sound pack not found: {0}")]
    PackNotFound(String),

    #[error("invalid pack slug {slug:?}: {reason}")]
    InvalidSlug { slug: String, reason: String },

    #[error("archive error: {0}")]
    Archive(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing configuration: {0}")]
    MissingConfig(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClodError {
    /// Stable machine-readable code for robot output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidBundlePath(_) => "invalid_bundle_path",
            Self::ManifestNotFound(_) => "manifest_not_found",
            Self::SchemaValidationFailed(_) => "schema_validation_failed",
            Self::TemplateMissing(_) => "template_missing",
            Self::TemplateInvalid { .. } => "template_invalid",
            Self::PackNotFound(_) => "pack_not_found",
            Self::InvalidSlug { .. } => "invalid_slug",
            Self::Archive(_) => "archive_error",
            Self::Config(_) => "config_error",
            Self::MissingConfig(_) => "missing_config",
            Self::Serialization(_) => "serialization_error",
            Self::Io(_) => "io_error",
        }
    }
}

impl From<serde_json::Error> for ClodError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<zip::result::ZipError> for ClodError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => Self::Io(io),
            other => Self::Archive(other.to_string()),
        }
    }
}

/// A single field-level schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All violations found while validating one manifest document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaError {
    pub errors: Vec<FieldError>,
}

impl SchemaError {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// True if any violation was recorded against `field`.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for SchemaError {}
