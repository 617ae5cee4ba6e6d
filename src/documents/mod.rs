// ABOUTME: Session document store with lexical retrieval over word-window chunks
// ABOUTME: Ingestion is all-or-nothing; retrieval is deterministic term-frequency scoring
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Document Store
//!
//! Uploaded documents are extracted to text, cut at the configured word
//! budget, and split into overlapping chunks with term-frequency indexes.
//!
//! ## Scoring
//!
//! A chunk scores the summed frequency of every distinct query term it
//! contains, plus a bonus when the whole query phrase appears verbatim.
//! Chunks scoring zero are never returned. Each document contributes at most
//! `max_chunks_per_document` chunks. Equal scores order by document
//! ingestion order, then by the later chunk within a document.

pub mod chunking;
pub mod extract;

use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::path::Path;

use aafiya_core::errors::{AppError, AppResult};
use aafiya_core::models::{
    DocumentChunk, DocumentFormat, DocumentId, DocumentRecord, DocumentUpload,
};
use chrono::Utc;
use serde::Serialize;
use tokio::fs;
use tracing::debug;

use crate::catalog::matching::tokenize;
use crate::config::{DocumentConfig, EngineConfig, RetrievalConfig};
use crate::logging::EngineLogger;

pub use chunking::{chunk_text, term_frequencies, terms, truncate_words};
pub use extract::extract_text;

/// Read a file into an upload, inferring the format from its extension
///
/// # Errors
///
/// `UnsupportedFormat` for an unknown extension, `InvalidInput` when the file
/// cannot be read
pub async fn read_upload(path: &Path) -> AppResult<DocumentUpload> {
    let filename = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let format = DocumentFormat::from_filename(&filename)?;
    let bytes = fs::read(path)
        .await
        .map_err(|e| AppError::invalid_input(format!("cannot read {}: {e}", path.display())))?;
    Ok(DocumentUpload::new(filename, format, bytes))
}

/// A retrieved chunk with the name of its document and its score
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RetrievedChunk<'a> {
    /// File name of the owning document
    pub filename: &'a str,
    /// Relevance score (always positive)
    pub score: u32,
    /// The chunk itself
    pub chunk: &'a DocumentChunk,
}

/// Documents uploaded during one session
#[derive(Debug, Clone)]
pub struct DocumentStore {
    documents: Vec<DocumentRecord>,
    last_id: u64,
    limits: DocumentConfig,
    retrieval: RetrievalConfig,
}

impl DocumentStore {
    /// Empty store using the chunking and retrieval settings of `config`
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            documents: Vec::new(),
            last_id: 0,
            limits: config.documents.clone(),
            retrieval: config.retrieval.clone(),
        }
    }

    /// Extract, chunk, and index an upload
    ///
    /// The store is unchanged when this fails.
    ///
    /// # Errors
    ///
    /// `UnsupportedFormat` or `ParseError` naming the rejected file
    pub fn ingest(&mut self, upload: DocumentUpload) -> AppResult<&DocumentRecord> {
        let record = self.build_record(upload)?;
        self.last_id = record.id.0;
        self.documents.push(record);
        Ok(&self.documents[self.documents.len() - 1])
    }

    fn build_record(&self, upload: DocumentUpload) -> AppResult<DocumentRecord> {
        let extracted = match extract_text(&upload, self.limits.max_delimited_rows) {
            Ok(text) => text,
            Err(e) => {
                EngineLogger::log_document_rejected(&upload.filename, &e.to_string());
                return Err(e.into());
            }
        };

        let id = DocumentId(self.last_id + 1);
        let (text, truncated) = truncate_words(&extracted, self.limits.max_document_words);
        let chunks = chunk_text(
            id,
            text,
            self.limits.chunk_size_words,
            self.limits.chunk_overlap_words,
        );

        let record = DocumentRecord {
            id,
            filename: upload.filename,
            format: upload.format,
            text: text.to_owned(),
            chunks,
            truncated,
            ingested_at: Utc::now(),
        };
        EngineLogger::log_document_ingested(
            &record.filename,
            record.chunks.len(),
            record.word_count(),
            truncated,
        );
        Ok(record)
    }

    /// Up to `k` chunks ranked by relevance to `query`; empty when nothing overlaps
    #[must_use]
    pub fn retrieve(&self, query: &str, k: usize) -> Vec<RetrievedChunk<'_>> {
        let query_terms: BTreeSet<String> = terms(query).into_iter().collect();
        if k == 0 || query_terms.is_empty() {
            return Vec::new();
        }
        let phrase = format!(" {} ", flatten(query));

        let mut ranked: Vec<RetrievedChunk<'_>> = Vec::new();
        for document in &self.documents {
            let mut scored: Vec<RetrievedChunk<'_>> = document
                .chunks
                .iter()
                .filter_map(|chunk| {
                    let overlap: u32 = query_terms.iter().map(|t| chunk.term_frequency(t)).sum();
                    if overlap == 0 {
                        return None;
                    }
                    let bonus = if format!(" {} ", flatten(&chunk.text)).contains(&phrase) {
                        self.retrieval.phrase_match_bonus
                    } else {
                        0
                    };
                    Some(RetrievedChunk {
                        filename: &document.filename,
                        score: overlap + bonus,
                        chunk,
                    })
                })
                .collect();
            scored.sort_by_key(|r| (Reverse(r.score), Reverse(r.chunk.index)));
            scored.truncate(self.retrieval.max_chunks_per_document);
            ranked.extend(scored);
        }

        ranked.sort_by_key(|r| (Reverse(r.score), r.chunk.document_id, Reverse(r.chunk.index)));
        ranked.truncate(k);
        debug!(
            query_terms = query_terms.len(),
            documents = self.documents.len(),
            hits = ranked.len(),
            "Retrieved document chunks"
        );
        ranked
    }

    /// Retrieve with the configured default `k`
    #[must_use]
    pub fn retrieve_default(&self, query: &str) -> Vec<RetrievedChunk<'_>> {
        self.retrieve(query, self.retrieval.top_k)
    }

    /// Remove one document and its chunks
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` when no document has that id
    pub fn remove(&mut self, id: DocumentId) -> AppResult<DocumentRecord> {
        let position = self
            .documents
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| AppError::not_found(id.to_string()))?;
        Ok(self.documents.remove(position))
    }

    /// Drop every document, returning how many were removed
    pub fn clear(&mut self) -> usize {
        let removed = self.documents.len();
        self.documents.clear();
        removed
    }

    /// Document by id
    #[must_use]
    pub fn get(&self, id: DocumentId) -> Option<&DocumentRecord> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Documents in ingestion order
    #[must_use]
    pub fn documents(&self) -> &[DocumentRecord] {
        &self.documents
    }

    /// Number of documents held
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no document is loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Chunks across all documents
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.documents.iter().map(|d| d.chunks.len()).sum()
    }
}

/// Lowercased tokens joined by single spaces, punctuation dropped
fn flatten(text: &str) -> String {
    tokenize(text).join(" ")
}
