// ABOUTME: Integration tests for document ingestion and lexical retrieval
// ABOUTME: Covers extraction failures, chunk coverage, ranking, per-document caps, and file reading
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::fs;

use aafiya::config::EngineConfig;
use aafiya::documents::{read_upload, DocumentStore};
use aafiya::errors::ErrorCode;
use aafiya::models::{DocumentFormat, DocumentId, DocumentUpload};
use common::{init_test_logging, text_upload};
use tempfile::TempDir;

fn small_chunks(size: usize, overlap: usize) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.documents.chunk_size_words = size;
    config.documents.chunk_overlap_words = overlap;
    config
}

#[test]
fn test_ingest_assigns_ids_in_order() {
    init_test_logging();
    let mut store = DocumentStore::new(&EngineConfig::default());

    let first = store
        .ingest(text_upload("a.txt", "Lentils are rich in fiber."))
        .unwrap()
        .id;
    let second = store
        .ingest(text_upload("b.txt", "Salmon provides omega-3 fats."))
        .unwrap()
        .id;

    assert_eq!(first, DocumentId(1));
    assert_eq!(second, DocumentId(2));
    assert_eq!(store.len(), 2);
}

#[test]
fn test_empty_document_is_parse_error_and_store_unchanged() {
    init_test_logging();
    let mut store = DocumentStore::new(&EngineConfig::default());
    store.ingest(text_upload("keep.txt", "Oats keep you full.")).unwrap();

    let error = store.ingest(text_upload("empty.txt", "   \n\t ")).unwrap_err();

    assert_eq!(error.code, ErrorCode::ParseError);
    assert_eq!(error.context.resource_id.as_deref(), Some("empty.txt"));
    assert_eq!(store.len(), 1);
    assert_eq!(store.chunk_count(), 1);
}

#[test]
fn test_binary_pdf_is_unsupported() {
    init_test_logging();
    let mut store = DocumentStore::new(&EngineConfig::default());
    let upload = DocumentUpload::new(
        "scan.pdf",
        DocumentFormat::PaginatedText,
        b"%PDF-1.7\n%\xE2\xE3\xCF\xD3".to_vec(),
    );

    let error = store.ingest(upload).unwrap_err();

    assert_eq!(error.code, ErrorCode::UnsupportedFormat);
    assert!(store.is_empty());
}

#[test]
fn test_invalid_utf8_is_parse_error() {
    init_test_logging();
    let mut store = DocumentStore::new(&EngineConfig::default());
    let upload =
        DocumentUpload::new("notes.txt", DocumentFormat::PlainText, vec![0xC3, 0x28, 0xFF]);

    let error = store.ingest(upload).unwrap_err();

    assert_eq!(error.code, ErrorCode::ParseError);
}

#[test]
fn test_chunks_cover_text_without_gaps() {
    init_test_logging();
    let config = small_chunks(10, 3);
    let mut store = DocumentStore::new(&config);
    let text = (1..=47).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");

    let record = store.ingest(text_upload("long.txt", &text)).unwrap();

    let chunks = &record.chunks;
    assert_eq!(chunks.first().unwrap().start, 0);
    assert_eq!(chunks.last().unwrap().end, record.text.len());
    for pair in chunks.windows(2) {
        // Overlap means the next chunk starts before the previous one ends
        assert!(pair[1].start < pair[0].end);
        assert_eq!(pair[1].index, pair[0].index + 1);
    }
    for chunk in chunks {
        assert_eq!(&record.text[chunk.start..chunk.end], chunk.text);
        assert!(chunk.text.split_whitespace().count() <= 10);
    }
}

#[test]
fn test_long_document_is_truncated() {
    init_test_logging();
    let mut config = small_chunks(10, 2);
    config.documents.max_document_words = 25;
    let mut store = DocumentStore::new(&config);
    let text = (1..=40).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");

    let record = store.ingest(text_upload("big.txt", &text)).unwrap();

    assert!(record.truncated);
    assert_eq!(record.word_count(), 25);
    assert!(record.text.ends_with("w25"));
}

#[test]
fn test_retrieval_prefers_matching_document() {
    init_test_logging();
    let mut store = DocumentStore::new(&EngineConfig::default());
    store
        .ingest(text_upload(
            "protein.txt",
            "Chicken, tofu and lentils supply protein for muscle repair.",
        ))
        .unwrap();
    store
        .ingest(text_upload(
            "fiber.txt",
            "Fiber from oats, beans and berries supports digestion. Fiber keeps you full.",
        ))
        .unwrap();

    let hits = store.retrieve("fiber digestion", 3);

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].filename, "fiber.txt");
    assert_eq!(hits[0].score, 3);
}

#[test]
fn test_no_term_overlap_returns_nothing() {
    init_test_logging();
    let mut store = DocumentStore::new(&EngineConfig::default());
    store
        .ingest(text_upload("fiber.txt", "Fiber from oats supports digestion."))
        .unwrap();

    assert!(store.retrieve("quantum chromodynamics", 3).is_empty());
    assert!(store.retrieve("", 3).is_empty());
    assert!(store.retrieve("digestion", 0).is_empty());
}

#[test]
fn test_phrase_match_outranks_scattered_terms() {
    init_test_logging();
    let mut store = DocumentStore::new(&EngineConfig::default());
    store
        .ingest(text_upload("scattered.txt", "Bran flakes pair well with oat milk."))
        .unwrap();
    store
        .ingest(text_upload("phrase.txt", "Oat bran muffins make a filling snack."))
        .unwrap();

    let hits = store.retrieve("oat bran", 3);

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].filename, "phrase.txt");
    assert!(hits[0].score > hits[1].score);
}

#[test]
fn test_equal_scores_follow_ingestion_order() {
    init_test_logging();
    let mut store = DocumentStore::new(&EngineConfig::default());
    store.ingest(text_upload("first.txt", "Quinoa is a seed.")).unwrap();
    store.ingest(text_upload("second.txt", "Quinoa cooks fast.")).unwrap();

    let hits = store.retrieve("quinoa", 3);

    let names: Vec<&str> = hits.iter().map(|h| h.filename).collect();
    assert_eq!(names, vec!["first.txt", "second.txt"]);
}

#[test]
fn test_each_document_contributes_at_most_its_cap() {
    init_test_logging();
    let mut store = DocumentStore::new(&small_chunks(5, 0));
    let text = (0..4)
        .map(|i| format!("spinach f{i}a f{i}b f{i}c f{i}d"))
        .collect::<Vec<_>>()
        .join(" ");
    let record = store.ingest(text_upload("greens.txt", &text)).unwrap();
    assert_eq!(record.chunks.len(), 4);

    let hits = store.retrieve("spinach", 10);

    let indexes: Vec<usize> = hits.iter().map(|h| h.chunk.index).collect();
    assert_eq!(indexes, vec![3, 2]);
}

#[test]
fn test_delimited_rows_are_searchable() {
    init_test_logging();
    let mut store = DocumentStore::new(&EngineConfig::default());
    let csv = "food,calories,protein\nGreek yogurt,100,17\nAlmonds,164,6\n";
    let upload =
        DocumentUpload::new("foods.csv", DocumentFormat::DelimitedText, csv.as_bytes().to_vec());

    let record = store.ingest(upload).unwrap();

    assert!(record.text.contains("Total rows: 2"));
    let hits = store.retrieve("almonds", 3);
    assert_eq!(hits.len(), 1);
    assert!(hits[0].chunk.text.contains("food: Almonds"));
}

#[test]
fn test_remove_and_clear() {
    init_test_logging();
    let mut store = DocumentStore::new(&EngineConfig::default());
    let first = store.ingest(text_upload("a.txt", "Kale salad.")).unwrap().id;
    store.ingest(text_upload("b.txt", "Kale chips.")).unwrap();

    let removed = store.remove(first).unwrap();
    assert_eq!(removed.filename, "a.txt");
    assert!(store.retrieve("kale", 3).iter().all(|h| h.filename == "b.txt"));
    assert_eq!(store.remove(first).unwrap_err().code, ErrorCode::ResourceNotFound);

    // Ids are never reused
    let third = store.ingest(text_upload("c.txt", "Kale pesto.")).unwrap().id;
    assert_eq!(third, DocumentId(3));

    assert_eq!(store.clear(), 2);
    assert!(store.is_empty());
    assert!(store.retrieve("kale", 3).is_empty());
}

#[tokio::test]
async fn test_read_upload_infers_format_from_extension() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("meal_plan.md");
    fs::write(&path, "# Monday\nOatmeal with berries for breakfast.").unwrap();

    let upload = read_upload(&path).await.unwrap();

    assert_eq!(upload.filename, "meal_plan.md");
    assert_eq!(upload.format, DocumentFormat::PlainText);

    let mut store = DocumentStore::new(&EngineConfig::default());
    store.ingest(upload).unwrap();
    assert_eq!(store.retrieve("breakfast berries", 3).len(), 1);
}

#[tokio::test]
async fn test_read_upload_rejects_unknown_extension() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plan.docx");
    fs::write(&path, "binary").unwrap();

    let error = read_upload(&path).await.unwrap_err();

    assert_eq!(error.code, ErrorCode::UnsupportedFormat);
}
