// ABOUTME: Document and chunk models for user-uploaded grounding material
// ABOUTME: DocumentFormat detection, DocumentRecord, and DocumentChunk with term-frequency index
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DocumentError;

/// Session-unique document identifier, assigned in ingestion order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc-{}", self.0)
    }
}

/// Supported document formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    /// UTF-8 plain text (`.txt`, `.md`)
    PlainText,
    /// Comma, semicolon, or tab separated rows (`.csv`, `.tsv`)
    DelimitedText,
    /// Text with pages separated by form feeds (text extracted from a PDF)
    PaginatedText,
}

impl DocumentFormat {
    /// Detect the format from a file extension
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::UnsupportedFormat` for unknown or missing extensions
    pub fn from_filename(filename: &str) -> Result<Self, DocumentError> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "txt" | "text" | "md" => Ok(Self::PlainText),
            "csv" | "tsv" => Ok(Self::DelimitedText),
            "pdf" | "pages" => Ok(Self::PaginatedText),
            "" => Err(DocumentError::unsupported(filename, "missing file extension")),
            other => Err(DocumentError::unsupported(
                filename,
                format!(".{other} files are not supported"),
            )),
        }
    }

    /// Canonical name used in logs and CLI flags
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PlainText => "plain",
            Self::DelimitedText => "delimited",
            Self::PaginatedText => "paginated",
        }
    }
}

impl FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" | "text" | "txt" => Ok(Self::PlainText),
            "delimited" | "csv" | "tsv" => Ok(Self::DelimitedText),
            "paginated" | "pdf" => Ok(Self::PaginatedText),
            other => Err(format!("unknown document format: {other}")),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw upload handed to the document store
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    /// Original file name
    pub filename: String,
    /// Declared format
    pub format: DocumentFormat,
    /// File contents
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    /// Upload with an explicitly declared format
    pub fn new(filename: impl Into<String>, format: DocumentFormat, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            format,
            bytes,
        }
    }

    /// Upload whose format is inferred from the file name
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::UnsupportedFormat` when the extension is not recognised
    pub fn from_filename(
        filename: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, DocumentError> {
        let filename = filename.into();
        let format = DocumentFormat::from_filename(&filename)?;
        Ok(Self {
            filename,
            format,
            bytes,
        })
    }
}

/// One retrievable span of a document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentChunk {
    /// Owning document
    pub document_id: DocumentId,
    /// Position within the document, starting at zero
    pub index: usize,
    /// Byte offset of the first character in the document text
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
    /// Chunk text
    pub text: String,
    /// Lowercased term frequencies
    pub terms: BTreeMap<String, u32>,
}

impl DocumentChunk {
    /// Frequency of `term` in this chunk
    #[must_use]
    pub fn term_frequency(&self, term: &str) -> u32 {
        self.terms.get(term).copied().unwrap_or(0)
    }
}

/// An ingested document with its extracted text and chunks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Identifier, also the ingestion order
    pub id: DocumentId,
    /// Original file name
    pub filename: String,
    /// Declared format
    pub format: DocumentFormat,
    /// Extracted text (possibly truncated)
    pub text: String,
    /// Ordered chunks covering `text`
    pub chunks: Vec<DocumentChunk>,
    /// Whether the text was cut at the word budget
    pub truncated: bool,
    /// When the document was ingested
    pub ingested_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Number of words in the extracted text
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_filename() {
        assert_eq!(
            DocumentFormat::from_filename("Plan.CSV").unwrap(),
            DocumentFormat::DelimitedText
        );
        assert_eq!(
            DocumentFormat::from_filename("guide.pdf").unwrap(),
            DocumentFormat::PaginatedText
        );
        assert!(matches!(
            DocumentFormat::from_filename("photo.jpg"),
            Err(DocumentError::UnsupportedFormat { .. })
        ));
        assert!(DocumentFormat::from_filename("README").is_err());
    }
}
