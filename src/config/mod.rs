// ABOUTME: Engine configuration for resolution, resilience, documents, retrieval, and cravings
// ABOUTME: Defaults with AAFIYA_* environment overrides, validation, and a process-wide instance
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Engine Configuration Module
//!
//! Every tunable of the engine lives here. Values can be overridden via
//! environment variables with the `AAFIYA_` prefix; overrides are parsed and
//! the result validated before use.

mod error;

pub use error::ConfigError;

use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use aafiya_core::constants::{assembler, chunking, cravings, resolution, retrieval};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Global configuration singleton
static ENGINE_CONFIG: OnceLock<EngineConfig> = OnceLock::new();

/// Engine configuration container
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Food name matching and quantity parsing
    pub resolver: ResolverConfig,
    /// Timeouts and retry policy for external calls
    pub resilience: ResilienceConfig,
    /// Document extraction and chunking
    pub documents: DocumentConfig,
    /// Chunk retrieval
    pub retrieval: RetrievalConfig,
    /// Craving suggestions
    pub cravings: CravingConfig,
    /// Grounded context assembly
    pub assembler: AssemblerConfig,
}

impl EngineConfig {
    /// Get the global configuration instance
    pub fn global() -> &'static Self {
        ENGINE_CONFIG.get_or_init(|| {
            Self::from_env().unwrap_or_else(|e| {
                warn!("Failed to load engine config: {e}, using defaults");
                Self::default()
            })
        })
    }

    /// Load configuration from environment
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values or validation fails
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::default().apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        let docs = &self.documents;
        if docs.chunk_size_words == 0 {
            return Err(ConfigError::ValueOutOfRange("chunk_size_words must be > 0"));
        }
        if docs.chunk_overlap_words >= docs.chunk_size_words {
            return Err(ConfigError::InvalidRange(
                "chunk_overlap_words must be smaller than chunk_size_words",
            ));
        }
        if docs.max_document_words < docs.chunk_size_words {
            return Err(ConfigError::InvalidRange(
                "max_document_words must be at least chunk_size_words",
            ));
        }
        if docs.max_delimited_rows == 0 {
            return Err(ConfigError::ValueOutOfRange("max_delimited_rows must be > 0"));
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValueOutOfRange("top_k must be >= 1"));
        }
        if self.retrieval.max_chunks_per_document == 0 {
            return Err(ConfigError::ValueOutOfRange(
                "max_chunks_per_document must be >= 1",
            ));
        }

        let resolver = &self.resolver;
        if !(0.0..=1.0).contains(&resolver.min_token_overlap) || resolver.min_token_overlap == 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "min_token_overlap must be in (0, 1]",
            ));
        }
        if resolver.max_edit_distance >= resolver.min_fuzzy_name_len {
            return Err(ConfigError::InvalidRange(
                "max_edit_distance must be smaller than min_fuzzy_name_len",
            ));
        }
        if !(resolver.max_quantity.is_finite() && resolver.max_quantity >= 1.0) {
            return Err(ConfigError::ValueOutOfRange("max_quantity must be >= 1"));
        }

        if self.resilience.timeout_ms == 0 {
            return Err(ConfigError::ValueOutOfRange("adapter timeout must be > 0"));
        }

        if self.cravings.max_substitutes == 0 {
            return Err(ConfigError::ValueOutOfRange("max_substitutes must be >= 1"));
        }
        if self.assembler.intake_window_days == 0 {
            return Err(ConfigError::ValueOutOfRange(
                "intake_window_days must be >= 1",
            ));
        }
        if self.assembler.intake_window_days > assembler::MAX_INTAKE_WINDOW_DAYS {
            return Err(ConfigError::ValueOutOfRange(
                "intake_window_days must be at most 366",
            ));
        }

        Ok(())
    }

    /// Helper function to parse and apply an environment variable override
    fn apply_env_var<T: FromStr>(env_var_name: &str, target: &mut T) -> Result<(), ConfigError> {
        if let Ok(val) = env::var(env_var_name) {
            *target = val
                .trim()
                .parse()
                .map_err(|_| ConfigError::Parse(format!("Invalid {env_var_name}: {val}")))?;
        }
        Ok(())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Resolver
        Self::apply_env_var(
            "AAFIYA_MAX_EDIT_DISTANCE",
            &mut self.resolver.max_edit_distance,
        )?;
        Self::apply_env_var(
            "AAFIYA_MIN_TOKEN_OVERLAP",
            &mut self.resolver.min_token_overlap,
        )?;
        Self::apply_env_var("AAFIYA_MAX_QUANTITY", &mut self.resolver.max_quantity)?;

        // Resilience
        Self::apply_env_var(
            "AAFIYA_ADAPTER_TIMEOUT_MS",
            &mut self.resilience.timeout_ms,
        )?;
        Self::apply_env_var(
            "AAFIYA_RETRY_BACKOFF_MS",
            &mut self.resilience.retry_backoff_ms,
        )?;
        Self::apply_env_var("AAFIYA_MAX_RETRIES", &mut self.resilience.max_retries)?;

        // Documents
        Self::apply_env_var(
            "AAFIYA_CHUNK_SIZE_WORDS",
            &mut self.documents.chunk_size_words,
        )?;
        Self::apply_env_var(
            "AAFIYA_CHUNK_OVERLAP_WORDS",
            &mut self.documents.chunk_overlap_words,
        )?;
        Self::apply_env_var(
            "AAFIYA_MAX_DOCUMENT_WORDS",
            &mut self.documents.max_document_words,
        )?;
        Self::apply_env_var(
            "AAFIYA_MAX_DELIMITED_ROWS",
            &mut self.documents.max_delimited_rows,
        )?;

        // Retrieval
        Self::apply_env_var("AAFIYA_RETRIEVAL_TOP_K", &mut self.retrieval.top_k)?;
        Self::apply_env_var(
            "AAFIYA_MAX_CHUNKS_PER_DOCUMENT",
            &mut self.retrieval.max_chunks_per_document,
        )?;

        // Cravings and assembler
        Self::apply_env_var(
            "AAFIYA_MAX_SUBSTITUTES",
            &mut self.cravings.max_substitutes,
        )?;
        Self::apply_env_var(
            "AAFIYA_INTAKE_WINDOW_DAYS",
            &mut self.assembler.intake_window_days,
        )?;

        Ok(self)
    }
}

// ============================================================================
// Sub-Configurations
// ============================================================================

/// Catalog matching configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolverConfig {
    /// Maximum edit distance for a fuzzy name match
    pub max_edit_distance: usize,
    /// Names shorter than this only match exactly
    pub min_fuzzy_name_len: usize,
    /// Minimum shared-token ratio for a token-overlap match
    pub min_token_overlap: f64,
    /// Largest accepted quantity multiplier
    pub max_quantity: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_edit_distance: resolution::MAX_EDIT_DISTANCE,
            min_fuzzy_name_len: resolution::MIN_FUZZY_NAME_LEN,
            min_token_overlap: resolution::MIN_TOKEN_OVERLAP,
            max_quantity: resolution::MAX_QUANTITY,
        }
    }
}

/// Timeout and retry policy for adapter calls
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResilienceConfig {
    /// Per-attempt timeout in milliseconds
    pub timeout_ms: u64,
    /// Delay before a retry in milliseconds
    pub retry_backoff_ms: u64,
    /// Retries after the first attempt, transient failures only
    pub max_retries: u32,
}

impl ResilienceConfig {
    /// Per-attempt timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Delay before the first retry
    #[must_use]
    pub const fn backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            timeout_ms: resolution::ADAPTER_TIMEOUT_MS,
            retry_backoff_ms: resolution::RETRY_BACKOFF_MS,
            max_retries: 1,
        }
    }
}

/// Document extraction and chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentConfig {
    /// Words per chunk
    pub chunk_size_words: usize,
    /// Words shared by consecutive chunks
    pub chunk_overlap_words: usize,
    /// Word budget before a document is truncated
    pub max_document_words: usize,
    /// Data rows rendered from delimited documents
    pub max_delimited_rows: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            chunk_size_words: chunking::CHUNK_SIZE_WORDS,
            chunk_overlap_words: chunking::CHUNK_OVERLAP_WORDS,
            max_document_words: chunking::MAX_DOCUMENT_WORDS,
            max_delimited_rows: chunking::MAX_DELIMITED_ROWS,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetrievalConfig {
    /// Chunks returned when the caller does not choose
    pub top_k: usize,
    /// Chunks a single document may contribute
    pub max_chunks_per_document: usize,
    /// Bonus when the whole query appears verbatim in a chunk
    pub phrase_match_bonus: u32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: retrieval::TOP_K,
            max_chunks_per_document: retrieval::MAX_CHUNKS_PER_DOCUMENT,
            phrase_match_bonus: retrieval::PHRASE_MATCH_BONUS,
        }
    }
}

/// Craving suggestion configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CravingConfig {
    /// Substitutes returned per suggestion
    pub max_substitutes: usize,
}

impl Default for CravingConfig {
    fn default() -> Self {
        Self {
            max_substitutes: cravings::MAX_SUBSTITUTES,
        }
    }
}

/// Grounded context configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssemblerConfig {
    /// Days of meal history summarized for intake questions
    pub intake_window_days: u32,
    /// Recent meals listed in the summary
    pub recent_meals: usize,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            intake_window_days: assembler::INTAKE_WINDOW_DAYS,
            recent_meals: assembler::RECENT_MEALS,
        }
    }
}
