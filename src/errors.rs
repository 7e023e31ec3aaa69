//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the ingestion engine, providing comprehensive error types
//! and conversion utilities for all system components.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from various system components
//! - **Output**: Structured error types with context and error chains
//! - **Error Categories**: Input, Extraction, Indexing, Database, Fatal
//!
//! ## Key Features
//! - Hierarchical error types with detailed context
//! - Automatic error conversion and chaining
//! - Classification into recoverable vs terminal kinds, matching the retry budgets each
//!   call site is allowed (LLM: one retry, embeddings: bounded backoff, DB deadlock: one retry)
//! - Structured logging integration

use thiserror::Error;

/// Result type used throughout the application
pub type Result<T> = std::result::Result<T, IngestError>;

/// Comprehensive error types for the ingestion engine
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A required input file (PDF or metadata sheet) could not be read or parsed.
    #[error("Unreadable input {path}: {reason}")]
    UnreadableInput { path: String, reason: String },

    /// No metadata row matched a PDF's normalized case-file id.
    #[error("No metadata row for case-file id {normalized_id}")]
    MissingMetadata { normalized_id: String },

    /// Network-related errors (LLM, embedding service, or any HTTP collaborator)
    #[error("Network error calling {service}: {details}")]
    NetworkError { service: String, details: String },

    /// Rate limiting errors from an external collaborator
    #[error("Rate limit exceeded for {source}")]
    RateLimitExceeded {
        source: String,
        retry_after_seconds: Option<u64>,
    },

    /// The LLM returned JSON that failed to parse or validate, after the single retry.
    #[error("LLM extraction failed for case {case_file_id}: {details}")]
    ExtractionFailed {
        case_file_id: String,
        details: String,
    },

    /// An enum value returned by the LLM was outside the fixed vocabulary and could not
    /// be coerced to a neutral default.
    #[error("Invalid enum value for field {field}: {value}")]
    InvalidEnumValue { field: String, value: String },

    /// The embedding service failed after exhausting its retry budget.
    #[error("Embedding generation failed after retries: {details}")]
    EmbeddingFailed { details: String },

    /// A batched word or phrase write failed.
    #[error("Indexing batch write failed in {stage}: {details}")]
    IndexingFailed { stage: String, details: String },

    /// Database errors (constraint violation, deadlock, connection loss)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migration errors
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Validation errors
    #[error("Validation failed for field '{field}': {reason}")]
    ValidationFailed { field: String, reason: String },

    /// Not supported operation
    #[error("Operation '{operation}' is not supported")]
    NotSupported { operation: String },

    /// Fatal configuration/environment errors that should stop the engine entirely.
    #[error("Fatal error: {message}")]
    Fatal { message: String },

    /// Generic error with message, used sparingly for conditions with no dedicated variant.
    #[error("{message}")]
    Generic { message: String },
}

impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> Self {
        IngestError::NetworkError {
            service: err.url().map(|u| u.as_str().to_string()).unwrap_or_default(),
            details: err.to_string(),
        }
    }
}

impl IngestError {
    /// Whether this error is recoverable via the retry budgets named in §7/§9.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            IngestError::NetworkError { .. }
                | IngestError::RateLimitExceeded { .. }
                | IngestError::Database(sqlx::Error::PoolTimedOut)
                | IngestError::Database(sqlx::Error::Io(_))
        )
    }

    /// Classify the error for per-case outcome logging and metrics.
    pub fn category(&self) -> &'static str {
        match self {
            IngestError::UnreadableInput { .. } | IngestError::MissingMetadata { .. } => "input",
            IngestError::ExtractionFailed { .. }
            | IngestError::InvalidEnumValue { .. }
            | IngestError::NetworkError { .. }
            | IngestError::RateLimitExceeded { .. } => "extraction",
            IngestError::EmbeddingFailed { .. } | IngestError::IndexingFailed { .. } => "indexing",
            IngestError::Database(_) | IngestError::Migration(_) => "database",
            IngestError::Config { .. } | IngestError::Fatal { .. } => "fatal",
            IngestError::Io(_)
            | IngestError::Json(_)
            | IngestError::Csv(_)
            | IngestError::Toml(_)
            | IngestError::ValidationFailed { .. }
            | IngestError::NotSupported { .. }
            | IngestError::Generic { .. } => "generic",
        }
    }

    /// Suggested recovery action, where one exists.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            IngestError::RateLimitExceeded { .. } => Some("wait and retry after the specified time"),
            IngestError::NetworkError { .. } => Some("check network connectivity and retry"),
            IngestError::Database(sqlx::Error::PoolTimedOut) => Some("increase pool size or reduce worker count"),
            _ => None,
        }
    }
}

// Helper macros for common error patterns
#[macro_export]
macro_rules! validation_error {
    ($field:expr, $reason:expr) => {
        $crate::errors::IngestError::ValidationFailed {
            field: $field.to_string(),
            reason: $reason.to_string(),
        }
    };
}

#[macro_export]
macro_rules! fatal_error {
    ($fmt:expr $(, $arg:tt)*) => {
        $crate::errors::IngestError::Fatal {
            message: format!($fmt $(, $arg)*),
        }
    };
}
