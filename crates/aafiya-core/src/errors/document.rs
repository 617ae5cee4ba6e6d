// ABOUTME: Error types for document ingestion
// ABOUTME: Unsupported formats and unreadable or empty content, always naming the file
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use thiserror::Error;

/// Document ingestion failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DocumentError {
    /// File type is not plain, delimited, or paginated text
    #[error("unsupported document format for '{filename}': {detail}")]
    UnsupportedFormat {
        /// Name of the rejected document
        filename: String,
        /// Detected or declared format
        detail: String,
    },

    /// Content could not be decoded or yielded no text
    #[error("could not parse '{filename}': {reason}")]
    ParseError {
        /// Name of the rejected document
        filename: String,
        /// What went wrong
        reason: String,
    },
}

impl DocumentError {
    /// Unsupported file type
    pub fn unsupported(filename: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            filename: filename.into(),
            detail: detail.into(),
        }
    }

    /// Unreadable or empty content
    pub fn parse(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParseError {
            filename: filename.into(),
            reason: reason.into(),
        }
    }

    /// Name of the document that failed
    #[must_use]
    pub fn filename(&self) -> &str {
        match self {
            Self::UnsupportedFormat { filename, .. } | Self::ParseError { filename, .. } => {
                filename
            }
        }
    }
}
