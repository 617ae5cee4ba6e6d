// ABOUTME: Word-window chunking with overlap and per-chunk term-frequency indexing
// ABOUTME: Chunks carry byte spans into the document text so coverage can be checked
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeMap;

use aafiya_core::constants::retrieval::MIN_TOKEN_LEN;
use aafiya_core::models::{DocumentChunk, DocumentId};

use crate::catalog::matching::{singularize, tokenize};

/// Byte spans of whitespace-delimited words
fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (offset, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push((s, offset));
                start = None;
            }
            (false, None) => start = Some(offset),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

/// Cut `text` after `max_words` words
///
/// Returns the kept prefix and whether anything was dropped.
#[must_use]
pub fn truncate_words(text: &str, max_words: usize) -> (&str, bool) {
    let spans = word_spans(text);
    if spans.len() <= max_words {
        return (text, false);
    }
    let end = max_words.checked_sub(1).map_or(0, |last| spans[last].1);
    (&text[..end], true)
}

/// Index terms of a piece of text: lowercased, singularized, short tokens dropped
#[must_use]
pub fn terms(text: &str) -> Vec<String> {
    tokenize(text)
        .iter()
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN)
        .map(|t| singularize(t))
        .collect()
}

/// Term frequencies for one chunk
#[must_use]
pub fn term_frequencies(text: &str) -> BTreeMap<String, u32> {
    let mut frequencies = BTreeMap::new();
    for term in terms(text) {
        *frequencies.entry(term).or_insert(0) += 1;
    }
    frequencies
}

/// Split `text` into windows of `size` words, consecutive windows sharing `overlap` words
///
/// The first chunk starts at the first word and the last chunk ends at the
/// last word, so the chunks cover the text without gaps.
#[must_use]
pub fn chunk_text(
    document_id: DocumentId,
    text: &str,
    size: usize,
    overlap: usize,
) -> Vec<DocumentChunk> {
    let spans = word_spans(text);
    let size = size.max(1);
    let step = size.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut first_word = 0;
    while first_word < spans.len() {
        let last_word = (first_word + size).min(spans.len());
        let start = spans[first_word].0;
        let end = spans[last_word - 1].1;
        let chunk = &text[start..end];
        chunks.push(DocumentChunk {
            document_id,
            index: chunks.len(),
            start,
            end,
            text: chunk.to_owned(),
            terms: term_frequencies(chunk),
        });
        if last_word == spans.len() {
            break;
        }
        first_word += step;
    }
    chunks
}
