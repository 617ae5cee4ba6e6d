// ABOUTME: Core types and constants for the Aafiya nutrition coaching engine
// ABOUTME: Foundation crate with the data model, error handling, and default limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Aafiya Core
//!
//! Foundation crate providing shared types for the Aafiya nutrition coaching
//! engine. This crate is designed to change infrequently, enabling incremental
//! compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and domain-specific errors
//! - **models**: Food facts, meal entries, documents, user profiles, and craving types
//! - **constants**: Default limits for chunking, retrieval, and resolution

/// Unified error handling system with standard error codes
pub mod errors;

/// Default limits and tuning values organized by domain
pub mod constants;

/// Core data models (`FoodFact`, `MealEntry`, `DocumentRecord`, `UserProfile`, etc.)
pub mod models;
