// ABOUTME: Main library entry point for the Aafiya nutrition coaching engine
// ABOUTME: Food resolution ladder, meal log, document retrieval, cravings, and grounded context
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Aafiya
//!
//! Session-scoped engine behind a conversational nutrition coach.
//!
//! ## Architecture
//!
//! - **Resolver**: turns "2 boiled eggs" or a meal photo into nutrition facts
//!   through an ordered ladder: local catalog, external database, AI estimate
//! - **Meal log**: append-only history with derived totals
//! - **Documents**: uploaded material chunked and searched lexically
//! - **Cravings**: healthier substitutes filtered by allergies
//! - **Assembler**: builds the grounded context handed to a generative model
//! - **Session**: owns all of the above for one user
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use aafiya::config::EngineConfig;
//! use aafiya::resolver::{FoodMention, NutritionResolver};
//! use aafiya::session::CoachingSession;
//! use aafiya::errors::AppResult;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = EngineConfig::default();
//!     let mut session = CoachingSession::new(&config, NutritionResolver::new(&config));
//!
//!     let logged = session.resolve_and_log(&FoodMention::text("2 boiled eggs")).await?;
//!     println!("logged meal: {:?}", logged.meal_id);
//!     Ok(())
//! }
//! ```

/// Grounded context assembly for the generative model
pub mod assembler;

/// Built-in food catalog and mention parsing
pub mod catalog;

/// Engine configuration from defaults and environment
pub mod config;

/// Craving classification and substitutes
pub mod cravings;

/// Document ingestion and retrieval
pub mod documents;

/// AI estimation tier
pub mod estimation;

/// External nutrition database adapters
pub mod external;

/// Generative model providers
pub mod llm;

/// Logging setup and structured engine events
pub mod logging;

/// Append-only meal history
pub mod meal_log;

/// Coaching personas
pub mod personas;

/// Nutrition resolution ladder
pub mod resolver;

/// Allergy checks and content screening
pub mod safety;

/// Per-user coaching session
pub mod session;

// Re-export the foundation crate so callers depend on one crate
pub use aafiya_core::constants;
pub use aafiya_core::errors;
pub use aafiya_core::models;
