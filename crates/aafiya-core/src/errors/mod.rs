// ABOUTME: Unified error handling for the nutrition coaching engine
// ABOUTME: Standard error codes, AppError with context, and conversions from domain errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! This module provides a centralized error handling system for the engine.
//! Domain errors (`SourceError`, `EstimationError`, `DocumentError`,
//! `NutritionDataError`) carry the precise failure; `AppError` is the single
//! type surfaced to callers, tagged with an `ErrorCode` from the taxonomy:
//!
//! - `ResourceNotFound` drives fallback and is never shown to users
//! - `ExternalRateLimited` / `ExternalServiceUnavailable` trigger fallback and are logged
//! - `ModelUnavailable` is the final resolution tier failing
//! - `ParseError` / `UnsupportedFormat` are surfaced with their reason

/// Nutrition source, estimation, and data validation errors
pub mod nutrition;

/// Document ingestion errors
pub mod document;

pub use document::DocumentError;
pub use nutrition::{EstimationError, NutritionDataError, SourceError};

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Standard error codes used throughout the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // Validation (3000-3999)
    /// Request input was empty or malformed
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,
    /// A value fell outside its accepted range
    #[serde(rename = "VALUE_OUT_OF_RANGE")]
    ValueOutOfRange = 3003,

    // Documents (3500-3599)
    /// Document format cannot be ingested
    #[serde(rename = "UNSUPPORTED_FORMAT")]
    UnsupportedFormat = 3500,
    /// Document content could not be parsed
    #[serde(rename = "PARSE_ERROR")]
    ParseError = 3501,

    // Resource Management (4000-4999)
    /// No data for the requested resource
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound = 4000,
    /// The session cancelled the operation before it finished
    #[serde(rename = "OPERATION_CANCELLED")]
    OperationCancelled = 4010,

    // External Services (5000-5999)
    /// An external service is down or timed out
    #[serde(rename = "EXTERNAL_SERVICE_UNAVAILABLE")]
    ExternalServiceUnavailable = 5001,
    /// An external service rejected the call for rate limiting
    #[serde(rename = "EXTERNAL_RATE_LIMITED")]
    ExternalRateLimited = 5003,
    /// The estimation or generative model is unavailable
    #[serde(rename = "MODEL_UNAVAILABLE")]
    ModelUnavailable = 5100,

    // Configuration (6000-6999)
    /// Engine configuration failed validation
    #[serde(rename = "CONFIG_INVALID")]
    ConfigInvalid = 6002,

    // Internal Errors (9000-9999)
    /// Unexpected internal failure
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    /// Data could not be serialized or deserialized
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError = 9003,
}

impl ErrorCode {
    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidInput => "The provided input is invalid",
            Self::ValueOutOfRange => "The provided value is outside the acceptable range",
            Self::UnsupportedFormat => "The document format is not supported",
            Self::ParseError => "The document could not be read",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::OperationCancelled => "The operation was cancelled",
            Self::ExternalServiceUnavailable => "An external service is currently unavailable",
            Self::ExternalRateLimited => "External service rate limit exceeded",
            Self::ModelUnavailable => "The AI model is currently unavailable",
            Self::ConfigInvalid => "Configuration is invalid",
            Self::InternalError => "An internal error occurred",
            Self::SerializationError => "Data serialization/deserialization failed",
        }
    }

    /// Whether this failure is shown to the end user as-is
    ///
    /// Source misses and degraded dependencies are recovered by the fallback
    /// ladder and only logged.
    #[must_use]
    pub const fn is_user_visible(&self) -> bool {
        !matches!(
            self,
            Self::ResourceNotFound | Self::ExternalRateLimited | Self::ExternalServiceUnavailable
        )
    }

    /// Whether a retry of the same call may succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ExternalRateLimited | Self::ExternalServiceUnavailable | Self::ModelUnavailable
        )
    }
}

/// Additional context that can be attached to errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Session the failing operation belonged to
    pub session_id: Option<Uuid>,
    /// Resource ID if applicable (meal id, document id, food name)
    pub resource_id: Option<String>,
    /// Additional key-value context
    pub details: serde_json::Value,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            session_id: None,
            resource_id: None,
            details: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

/// Unified error type for the engine
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    pub context: ErrorContext,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add a session ID to the error context
    #[must_use]
    pub const fn with_session_id(mut self, session_id: Uuid) -> Self {
        self.context.session_id = Some(session_id);
        self
    }

    /// Add a resource ID to the error context
    #[must_use]
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.context.resource_id = Some(resource_id.into());
        self
    }

    /// Add details to the error context
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.context.details = details;
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalid, message)
    }

    /// Operation abandoned because its session was reset or ended
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::OperationCancelled,
            format!("{} was cancelled", operation.into()),
        )
    }

    /// External service error
    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceUnavailable,
            format!("{}: {}", service.into(), message.into()),
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

impl From<SourceError> for AppError {
    fn from(error: SourceError) -> Self {
        let code = match &error {
            SourceError::NotFound { .. } => ErrorCode::ResourceNotFound,
            SourceError::RateLimited { .. } => ErrorCode::ExternalRateLimited,
            SourceError::Unavailable { .. } => ErrorCode::ExternalServiceUnavailable,
        };
        Self::new(code, error.to_string())
    }
}

impl From<EstimationError> for AppError {
    fn from(error: EstimationError) -> Self {
        let code = match &error {
            EstimationError::ModelUnavailable { .. } => ErrorCode::ModelUnavailable,
            EstimationError::InvalidInput { .. } => ErrorCode::InvalidInput,
        };
        Self::new(code, error.to_string())
    }
}

impl From<DocumentError> for AppError {
    fn from(error: DocumentError) -> Self {
        let code = match &error {
            DocumentError::UnsupportedFormat { .. } => ErrorCode::UnsupportedFormat,
            DocumentError::ParseError { .. } => ErrorCode::ParseError,
        };
        let filename = error.filename().to_owned();
        Self::new(code, error.to_string()).with_resource_id(filename)
    }
}

impl From<NutritionDataError> for AppError {
    fn from(error: NutritionDataError) -> Self {
        Self::new(ErrorCode::ValueOutOfRange, error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(ErrorCode::SerializationError, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_errors_are_not_user_visible() {
        assert!(!ErrorCode::ResourceNotFound.is_user_visible());
        assert!(!ErrorCode::ExternalRateLimited.is_user_visible());
        assert!(ErrorCode::ParseError.is_user_visible());
        assert!(ErrorCode::ModelUnavailable.is_user_visible());
    }

    #[test]
    fn test_document_error_keeps_filename() {
        let error: AppError = DocumentError::parse("notes.txt", "no extractable text").into();
        assert_eq!(error.code, ErrorCode::ParseError);
        assert_eq!(error.context.resource_id.as_deref(), Some("notes.txt"));
    }

    #[test]
    fn test_source_error_codes() {
        let error: AppError = SourceError::rate_limited("USDA", None).into();
        assert_eq!(error.code, ErrorCode::ExternalRateLimited);
        assert!(error.code.is_transient());

        let error: AppError = SourceError::not_found("USDA", "quinoa").into();
        assert!(!error.code.is_transient());
    }
}
