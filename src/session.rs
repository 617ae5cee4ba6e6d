// ABOUTME: Coaching session owning the profile, meal log, and documents for one user
// ABOUTME: Runs resolution with cooperative cancellation so abandoned work commits nothing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Coaching Session
//!
//! All mutable state lives here and is never shared between sessions. One
//! action is processed at a time; `&mut self` on every mutating operation
//! enforces that. Adapter calls can still be abandoned from outside through
//! a [`CancellationHandle`]: the in-flight future is dropped and the
//! operation returns `OperationCancelled` before anything is appended.

use std::future::Future;
use std::sync::Arc;

use aafiya_core::errors::{AppError, AppResult};
use aafiya_core::models::{
    CravingSuggestion, DocumentId, DocumentRecord, DocumentUpload, MealDraft, MealEntry, MealId,
    ProfileUpdate, UserProfile,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use crate::assembler::{ContextSources, GroundedContext, GroundedQueryAssembler};
use crate::config::EngineConfig;
use crate::cravings::{CravingAdvisor, CravingInput};
use crate::documents::DocumentStore;
use crate::logging::EngineLogger;
use crate::meal_log::MealLog;
use crate::personas::Persona;
use crate::resolver::{FoodMention, NutritionResolver, Resolution};

/// Abandons whatever the session is currently waiting on
///
/// Cloneable and usable from another task while the session is busy.
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    signal: Arc<watch::Sender<u64>>,
}

impl CancellationHandle {
    /// Cancel in-flight operations; later operations are unaffected
    pub fn cancel(&self) {
        self.signal.send_modify(|generation| *generation += 1);
    }
}

/// Result of [`CoachingSession::resolve_and_log`]
#[derive(Debug, Clone, Serialize)]
pub struct LoggedResolution {
    /// Resolution outcome
    pub resolution: Resolution,
    /// Entry appended for a resolved mention
    pub meal_id: Option<MealId>,
}

/// What a session held when it ended
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    /// Session id
    pub session_id: Uuid,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time
    pub ended_at: DateTime<Utc>,
    /// Entries in the meal log, corrections included
    pub meals_logged: usize,
    /// Documents still loaded at the end
    pub documents_loaded: usize,
}

/// One user's coaching session
pub struct CoachingSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    profile: UserProfile,
    persona: Persona,
    meals: MealLog,
    documents: DocumentStore,
    resolver: NutritionResolver,
    assembler: GroundedQueryAssembler,
    advisor: CravingAdvisor,
    config: EngineConfig,
    cancel: Arc<watch::Sender<u64>>,
}

impl CoachingSession {
    /// Start a session with an empty profile, log, and document store
    #[must_use]
    pub fn new(config: &EngineConfig, resolver: NutritionResolver) -> Self {
        let (sender, _) = watch::channel(0);
        let session = Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            profile: UserProfile::default(),
            persona: Persona::default(),
            meals: MealLog::new(),
            documents: DocumentStore::new(config),
            resolver,
            assembler: GroundedQueryAssembler::new(config),
            advisor: CravingAdvisor::new(&config.cravings),
            config: config.clone(),
            cancel: Arc::new(sender),
        };
        info!(session_id = %session.id, "Coaching session started");
        session
    }

    /// Start with a known profile
    #[must_use]
    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Session id
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// When the session started
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Current profile
    #[must_use]
    pub const fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Meal history
    #[must_use]
    pub const fn meals(&self) -> &MealLog {
        &self.meals
    }

    /// Loaded documents
    #[must_use]
    pub const fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    /// Active persona
    #[must_use]
    pub const fn persona(&self) -> Persona {
        self.persona
    }

    /// Switch persona for later assemblies
    pub fn set_persona(&mut self, persona: Persona) {
        self.persona = persona;
    }

    /// Handle that cancels in-flight work from another task
    #[must_use]
    pub fn cancellation_handle(&self) -> CancellationHandle {
        CancellationHandle {
            signal: Arc::clone(&self.cancel),
        }
    }

    /// Race `work` against cancellation signalled after it started
    async fn cancellable<T>(
        &self,
        operation: &str,
        work: impl Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        // A fresh receiver only observes cancellations sent from here on
        let mut signal = self.cancel.subscribe();
        tokio::select! {
            result = work => result,
            Ok(()) = signal.changed() => {
                EngineLogger::log_cancelled(&self.id.to_string(), operation);
                Err(AppError::cancelled(operation).with_session_id(self.id))
            }
        }
    }

    /// Resolve a mention without logging it
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an empty mention, `OperationCancelled` when cancelled
    pub async fn resolve_food(&self, mention: &FoodMention) -> AppResult<Resolution> {
        self.cancellable("resolve_food", self.resolver.resolve(mention, &self.profile))
            .await
    }

    /// Resolve a mention and append it to the meal log when resolved
    ///
    /// An unresolved mention leaves the log untouched.
    ///
    /// # Errors
    ///
    /// As [`Self::resolve_food`]; a cancelled resolution appends nothing
    pub async fn resolve_and_log(&mut self, mention: &FoodMention) -> AppResult<LoggedResolution> {
        let resolution = self.resolve_food(mention).await?;
        let meal_id = match &resolution {
            Resolution::Resolved(food) => Some(self.meals.append(food.clone().into_draft())?.id()),
            Resolution::Unresolved(_) => None,
        };
        Ok(LoggedResolution {
            resolution,
            meal_id,
        })
    }

    /// Append a confirmed meal
    ///
    /// # Errors
    ///
    /// `ValueOutOfRange` for a draft without items
    pub fn log_meal(&mut self, draft: MealDraft) -> AppResult<&MealEntry> {
        self.meals.append(draft)
    }

    /// Append a correction of an earlier meal
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` when `corrects` is not in the log
    pub fn log_correction(&mut self, corrects: MealId, draft: MealDraft) -> AppResult<&MealEntry> {
        self.meals.append_correction(corrects, draft)
    }

    /// Add a document to the store
    ///
    /// # Errors
    ///
    /// `UnsupportedFormat` or `ParseError`; the store is unchanged
    pub fn ingest_document(&mut self, upload: DocumentUpload) -> AppResult<&DocumentRecord> {
        self.documents.ingest(upload)
    }

    /// Remove one document
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` for an unknown id
    pub fn remove_document(&mut self, id: DocumentId) -> AppResult<DocumentRecord> {
        self.documents.remove(id)
    }

    /// Remove every document, returning how many were dropped
    pub fn clear_documents(&mut self) -> usize {
        self.documents.clear()
    }

    /// Apply a partial profile update, returning whether anything changed
    pub fn update_profile(&mut self, update: ProfileUpdate) -> bool {
        self.profile.apply(update)
    }

    /// Substitutes for a craving, filtered by this session's profile
    #[must_use]
    pub fn suggest_substitutes(&self, craving: &str) -> CravingSuggestion {
        self.advisor.suggest(CravingInput::Text(craving), &self.profile)
    }

    /// Grounded context for a question, using the active persona
    #[must_use]
    pub fn assemble(&self, query: &str) -> GroundedContext {
        self.assembler.assemble(
            query,
            self.persona,
            ContextSources {
                documents: &self.documents,
                meals: &self.meals,
                profile: &self.profile,
            },
            Utc::now(),
        )
    }

    /// Cancel in-flight work and drop meals and documents
    ///
    /// The profile and persona are kept.
    pub fn reset(&mut self) {
        self.cancellation_handle().cancel();
        self.meals = MealLog::new();
        self.documents = DocumentStore::new(&self.config);
        info!(session_id = %self.id, "Coaching session reset");
    }

    /// Cancel in-flight work and tear the session down
    #[must_use]
    pub fn end(self) -> SessionSummary {
        self.cancellation_handle().cancel();
        let summary = SessionSummary {
            session_id: self.id,
            started_at: self.started_at,
            ended_at: Utc::now(),
            meals_logged: self.meals.len(),
            documents_loaded: self.documents.len(),
        };
        info!(
            session_id = %self.id,
            meals = summary.meals_logged,
            documents = summary.documents_loaded,
            "Coaching session ended"
        );
        summary
    }
}
