// ABOUTME: Logging configuration and structured event helpers for the coaching engine
// ABOUTME: Sets up tracing-subscriber formats and noise filters for the engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Structured logging setup.
//!
//! Logs go to stderr so the CLI can keep stdout for JSON results.

use std::env;
use std::io;

use aafiya_core::constants::service_names;
use aafiya_core::models::{FactSource, MealId};
use anyhow::Result;
use serde_json::json;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
    /// Include source file and line numbers
    pub include_location: bool,
    /// Include span open/close events
    pub include_spans: bool,
    /// Service name for structured logging
    pub service_name: String,
    /// Service version
    pub service_version: String,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` lines for log shipping
    Json,
    /// Multi-line human-readable output
    Pretty,
    /// Single-line output
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Compact,
            include_location: false,
            include_spans: false,
            service_name: service_names::AAFIYA_ENGINE.into(),
            service_version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".into());

        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("pretty") => LogFormat::Pretty,
            _ => LogFormat::Compact,
        };

        Self {
            level,
            format,
            include_location: env::var("LOG_INCLUDE_LOCATION").is_ok(),
            include_spans: env::var("LOG_INCLUDE_SPANS").is_ok(),
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| service_names::AAFIYA_ENGINE.into()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_owned()),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let base = env::var("RUST_LOG").unwrap_or_else(|_| self.level.clone());
        [
            "hyper=warn",
            "hyper::proto=warn",
            "reqwest=warn",
            "rustls=warn",
        ]
        .into_iter()
        .fold(EnvFilter::new(base), |filter, directive| {
            filter.add_directive(
                directive
                    .parse()
                    .unwrap_or_else(|_| Level::WARN.into()),
            )
        })
    }

    /// Initialize the global tracing subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        let subscriber = registry().with(self.env_filter());
        let span_events = if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        match self.format {
            LogFormat::Json => {
                let layer = fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_target(true)
                    .with_writer(io::stderr)
                    .with_span_events(span_events)
                    .json();
                subscriber.with(layer).try_init()?;
            }
            LogFormat::Pretty => {
                let layer = fmt::layer()
                    .pretty()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_target(true)
                    .with_writer(io::stderr)
                    .with_span_events(span_events);
                subscriber.with(layer).try_init()?;
            }
            LogFormat::Compact => {
                let layer = fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(io::stderr)
                    .with_span_events(FmtSpan::NONE);
                subscriber.with(layer).try_init()?;
            }
        }

        self.log_startup_info();
        Ok(())
    }

    fn log_startup_info(&self) {
        let summary = json!({
            "service": {
                "name": self.service_name,
                "version": self.service_version,
            },
            "logging": {
                "level": self.level,
                "format": format!("{:?}", self.format),
                "location": self.include_location,
                "spans": self.include_spans,
            }
        });
        debug!(
            service.name = %self.service_name,
            service.version = %self.service_version,
            "Logging initialized: {summary}"
        );
    }
}

/// Initialize logging from environment
///
/// # Errors
///
/// Returns an error if logging initialization fails
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

/// Structured events emitted by the engine
pub struct EngineLogger;

impl EngineLogger {
    /// A resolution tier is about to be tried
    pub fn log_tier_attempt(mention: &str, tier: FactSource) {
        debug!(food.mention = %mention, resolution.tier = %tier, "Trying resolution tier");
    }

    /// A tier failed and the ladder moves on
    pub fn log_fallback(mention: &str, tier: FactSource, reason: &str, degraded: bool) {
        if degraded {
            warn!(
                food.mention = %mention,
                resolution.tier = %tier,
                resolution.reason = %reason,
                "Nutrition source degraded, falling back"
            );
        } else {
            debug!(
                food.mention = %mention,
                resolution.tier = %tier,
                resolution.reason = %reason,
                "No match in tier, falling back"
            );
        }
    }

    /// A mention resolved successfully
    pub fn log_resolution(mention: &str, tier: FactSource, items: usize, calories: f64) {
        info!(
            food.mention = %mention,
            resolution.tier = %tier,
            resolution.items = items,
            nutrition.calories = calories,
            "Food resolved"
        );
    }

    /// Every tier failed
    pub fn log_unresolved(mention: &str, attempts: usize) {
        warn!(
            food.mention = %mention,
            resolution.attempts = attempts,
            "Could not determine nutrition"
        );
    }

    /// A document was added to the store
    pub fn log_document_ingested(filename: &str, chunks: usize, words: usize, truncated: bool) {
        info!(
            document.filename = %filename,
            document.chunks = chunks,
            document.words = words,
            document.truncated = truncated,
            "Document ingested"
        );
    }

    /// A document upload was rejected
    pub fn log_document_rejected(filename: &str, reason: &str) {
        warn!(
            document.filename = %filename,
            document.reason = %reason,
            "Document rejected"
        );
    }

    /// A meal was appended to the log
    pub fn log_meal_appended(id: MealId, items: usize, calories: f64, corrects: Option<MealId>) {
        info!(
            meal.id = %id,
            meal.items = items,
            nutrition.calories = calories,
            meal.corrects = ?corrects,
            "Meal logged"
        );
    }

    /// An in-flight operation was abandoned
    pub fn log_cancelled(session_id: &str, operation: &str) {
        info!(session.id = %session_id, operation = %operation, "Operation cancelled");
    }
}
