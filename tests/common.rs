// ABOUTME: Shared test utilities for integration tests
// ABOUTME: Scripted nutrition source and estimator doubles, quiet logging, and fixtures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `aafiya`

use std::collections::HashMap;
use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use aafiya::config::EngineConfig;
use aafiya::errors::{EstimationError, SourceError};
use aafiya::estimation::{EstimationAdapter, EstimationInput};
use aafiya::external::NutritionSource;
use aafiya::models::{DocumentFormat, DocumentUpload, Macros, NutritionFacts};
use aafiya::resolver::NutritionResolver;
use aafiya::session::CoachingSession;
use async_trait::async_trait;
use tokio::time::sleep;
use tracing::Level;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Default config with short adapter timeouts so failure paths stay fast
pub fn test_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.resilience.timeout_ms = 200;
    config.resilience.retry_backoff_ms = 5;
    config.resilience.max_retries = 1;
    config
}

/// Facts for one serving with the given calories
pub fn facts(name: &str, serving_grams: f64, calories: f64) -> NutritionFacts {
    NutritionFacts::new(
        name,
        serving_grams,
        Macros::new(calories, calories * 0.05, calories * 0.12, calories * 0.03),
    )
}

/// Canned answer for one food name
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Return these facts
    Found(NutritionFacts),
    /// Report the food as unknown
    Missing,
    /// Report the source as down
    Down,
}

/// External nutrition source answering from a fixed table
#[derive(Debug, Default)]
pub struct ScriptedSource {
    answers: HashMap<String, Scripted>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, answer: Scripted) -> Self {
        self.answers.insert(name.to_owned(), answer);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NutritionSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn query(&self, normalized_name: &str) -> Result<NutritionFacts, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.answers.get(normalized_name) {
            Some(Scripted::Found(facts)) => Ok(facts.clone()),
            Some(Scripted::Down) => Err(SourceError::unavailable("scripted", "connection refused")),
            Some(Scripted::Missing) | None => {
                Err(SourceError::not_found("scripted", normalized_name))
            }
        }
    }
}

/// Estimator returning a fixed answer, optionally after a delay
#[derive(Debug)]
pub struct ScriptedEstimator {
    answer: Option<NutritionFacts>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedEstimator {
    pub const fn answering(facts: NutritionFacts) -> Self {
        Self {
            answer: Some(facts),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub const fn unavailable() -> Self {
        Self {
            answer: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub const fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EstimationAdapter for ScriptedEstimator {
    fn name(&self) -> &str {
        "scripted-estimator"
    }

    async fn estimate(
        &self,
        _input: EstimationInput<'_>,
    ) -> Result<NutritionFacts, EstimationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
        self.answer
            .clone()
            .ok_or_else(|| EstimationError::model_unavailable("model offline"))
    }
}

/// Resolver over the built-in catalog plus the given doubles
pub fn resolver_with(
    config: &EngineConfig,
    source: Option<Arc<ScriptedSource>>,
    estimator: Option<Arc<ScriptedEstimator>>,
) -> NutritionResolver {
    let mut resolver = NutritionResolver::new(config);
    if let Some(source) = source {
        resolver = resolver.with_source(source);
    }
    if let Some(estimator) = estimator {
        resolver = resolver.with_estimator(estimator);
    }
    resolver
}

/// Session over the built-in catalog only
pub fn catalog_session() -> CoachingSession {
    init_test_logging();
    let config = test_config();
    let resolver = NutritionResolver::new(&config);
    CoachingSession::new(&config, resolver)
}

/// Plain-text upload
pub fn text_upload(filename: &str, text: &str) -> DocumentUpload {
    DocumentUpload::new(filename, DocumentFormat::PlainText, text.as_bytes().to_vec())
}
