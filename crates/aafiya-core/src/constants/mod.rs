// ABOUTME: Default limits and tuning values for the nutrition coaching engine
// ABOUTME: Chunking, retrieval, resolution, and craving defaults shared across crates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Application constants organized by domain.

/// Document chunking defaults (measured in whitespace-delimited words)
pub mod chunking {
    /// Words per chunk
    pub const CHUNK_SIZE_WORDS: usize = 500;
    /// Words shared between consecutive chunks
    pub const CHUNK_OVERLAP_WORDS: usize = 50;
    /// Word budget per document before truncation
    pub const MAX_DOCUMENT_WORDS: usize = 50_000;
    /// Data rows rendered from a delimited document before truncation
    pub const MAX_DELIMITED_ROWS: usize = 100;
    /// Page separator in paginated text documents (form feed)
    pub const PAGE_SEPARATOR: char = '\u{000C}';
}

/// Retrieval defaults
pub mod retrieval {
    /// Chunks handed to the assembler
    pub const TOP_K: usize = 3;
    /// Chunks any single document may contribute to one retrieval
    pub const MAX_CHUNKS_PER_DOCUMENT: usize = 2;
    /// Score bonus when the whole query phrase appears in a chunk
    pub const PHRASE_MATCH_BONUS: u32 = 5;
    /// Shortest token kept in keyword indexes
    pub const MIN_TOKEN_LEN: usize = 2;
}

/// Nutrition resolution defaults
pub mod resolution {
    /// Maximum edit distance for fuzzy catalog matches
    pub const MAX_EDIT_DISTANCE: usize = 2;
    /// Names shorter than this only match exactly (fuzzy matching is too loose below it)
    pub const MIN_FUZZY_NAME_LEN: usize = 5;
    /// Minimum token overlap ratio for a token-based catalog match
    pub const MIN_TOKEN_OVERLAP: f64 = 0.6;
    /// Per-attempt timeout for external calls (milliseconds)
    pub const ADAPTER_TIMEOUT_MS: u64 = 10_000;
    /// Backoff before the single retry (milliseconds)
    pub const RETRY_BACKOFF_MS: u64 = 500;
    /// Upper bound on a parsed quantity multiplier
    pub const MAX_QUANTITY: f64 = 24.0;
}

/// Craving advisor defaults
pub mod cravings {
    /// Substitutes returned per suggestion
    pub const MAX_SUBSTITUTES: usize = 4;
}

/// Grounded context defaults
pub mod assembler {
    /// Days of meal history summarized for intake questions
    pub const INTAKE_WINDOW_DAYS: u32 = 7;
    /// Longest accepted intake window
    pub const MAX_INTAKE_WINDOW_DAYS: u32 = 366;
    /// Most recent meals listed in the intake summary
    pub const RECENT_MEALS: usize = 5;
}

/// Service identification for structured logging
pub mod service_names {
    /// Engine service name
    pub const AAFIYA_ENGINE: &str = "aafiya-engine";
}
