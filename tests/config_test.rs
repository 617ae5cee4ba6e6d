// ABOUTME: Unit tests for engine and logging configuration
// ABOUTME: Validates defaults, environment overrides, and rejection of contradictory settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::env;

use aafiya::config::{ConfigError, EngineConfig};
use aafiya::errors::{AppError, ErrorCode};
use aafiya::logging::{LogFormat, LoggingConfig};
use serial_test::serial;

const OVERRIDES: &[&str] = &[
    "AAFIYA_RETRIEVAL_TOP_K",
    "AAFIYA_CHUNK_SIZE_WORDS",
    "AAFIYA_CHUNK_OVERLAP_WORDS",
    "AAFIYA_ADAPTER_TIMEOUT_MS",
    "AAFIYA_MAX_SUBSTITUTES",
];

fn clear_overrides() {
    for name in OVERRIDES {
        env::remove_var(name);
    }
}

#[test]
fn test_defaults_are_valid() {
    let config = EngineConfig::default();

    assert!(config.validate().is_ok());
    assert_eq!(config.documents.chunk_size_words, 500);
    assert_eq!(config.documents.chunk_overlap_words, 50);
    assert_eq!(config.retrieval.top_k, 3);
    assert_eq!(config.cravings.max_substitutes, 4);
    assert_eq!(config.assembler.intake_window_days, 7);
}

#[test]
#[serial]
fn test_environment_overrides_are_applied() {
    clear_overrides();
    env::set_var("AAFIYA_RETRIEVAL_TOP_K", "5");
    env::set_var("AAFIYA_ADAPTER_TIMEOUT_MS", " 2500 ");

    let config = EngineConfig::from_env().unwrap();

    assert_eq!(config.retrieval.top_k, 5);
    assert_eq!(config.resilience.timeout_ms, 2500);
    clear_overrides();
}

#[test]
#[serial]
fn test_unparseable_override_is_rejected() {
    clear_overrides();
    env::set_var("AAFIYA_MAX_SUBSTITUTES", "many");

    let error = EngineConfig::from_env().unwrap_err();

    assert!(matches!(error, ConfigError::Parse(ref msg) if msg.contains("AAFIYA_MAX_SUBSTITUTES")));
    clear_overrides();
}

#[test]
#[serial]
fn test_overlap_must_be_smaller_than_chunk() {
    clear_overrides();
    env::set_var("AAFIYA_CHUNK_SIZE_WORDS", "40");
    env::set_var("AAFIYA_CHUNK_OVERLAP_WORDS", "40");

    let error = EngineConfig::from_env().unwrap_err();

    assert!(matches!(error, ConfigError::InvalidRange(_)));
    clear_overrides();
}

#[test]
fn test_zero_values_are_out_of_range() {
    let mut config = EngineConfig::default();
    config.retrieval.top_k = 0;
    assert!(matches!(config.validate(), Err(ConfigError::ValueOutOfRange(_))));

    let mut config = EngineConfig::default();
    config.resilience.timeout_ms = 0;
    assert!(matches!(config.validate(), Err(ConfigError::ValueOutOfRange(_))));

    let mut config = EngineConfig::default();
    config.assembler.intake_window_days = u32::MAX;
    assert!(matches!(config.validate(), Err(ConfigError::ValueOutOfRange(_))));

    let mut config = EngineConfig::default();
    config.resolver.min_token_overlap = 0.0;
    assert!(config.validate().is_err());
}

#[test]
fn test_config_error_maps_to_app_error() {
    let error: AppError = ConfigError::ValueOutOfRange("top_k must be >= 1").into();

    assert_eq!(error.code, ErrorCode::ConfigInvalid);
    assert!(error.message.contains("top_k"));
}

#[test]
#[serial]
fn test_logging_config_reads_format() {
    env::set_var("LOG_FORMAT", "json");
    assert_eq!(LoggingConfig::from_env().format, LogFormat::Json);

    env::set_var("LOG_FORMAT", "unknown");
    assert_eq!(LoggingConfig::from_env().format, LogFormat::Compact);

    env::remove_var("LOG_FORMAT");
}
