// ABOUTME: Aafiya CLI - resolve foods, suggest craving swaps, ingest documents, build prompts
// ABOUTME: Uses the USDA and Gemini tiers when their API keys are present in the environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Resolve a food mention through the ladder
//! aafiya-cli resolve "2 boiled eggs"
//!
//! # Healthier swaps for a craving, respecting an allergy
//! aafiya-cli crave "I want chocolate cake" --allergy peanut
//!
//! # Ingest a document and search it
//! aafiya-cli ingest meal_plan.csv --query "high protein breakfast"
//!
//! # Build the grounded prompt for a question
//! aafiya-cli ask "What should I eat before a run?" --doc guide.txt --persona strict-coach
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use aafiya::config::EngineConfig;
use aafiya::documents::read_upload;
use aafiya::errors::{AppError, ErrorCode};
use aafiya::estimation::LlmEstimator;
use aafiya::external::UsdaClient;
use aafiya::llm::{GeminiProvider, ImageInput, LlmProvider};
use aafiya::logging;
use aafiya::models::ProfileUpdate;
use aafiya::personas::Persona;
use aafiya::resolver::{call_with_retry, FoodMention, NutritionResolver};
use aafiya::safety::review_response;
use aafiya::session::CoachingSession;
use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tokio::fs;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "aafiya-cli",
    about = "Aafiya nutrition coaching engine CLI",
    long_about = "Resolve foods, suggest craving substitutes, search documents and build prompts."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ProfileArgs {
    /// Allergy to respect (repeatable)
    #[arg(long = "allergy")]
    allergies: Vec<String>,

    /// Dietary restriction such as vegan or halal (repeatable)
    #[arg(long = "restriction")]
    restrictions: Vec<String>,

    /// Food to rank last (repeatable)
    #[arg(long = "dislike")]
    disliked: Vec<String>,
}

impl ProfileArgs {
    fn into_update(self) -> ProfileUpdate {
        ProfileUpdate {
            add_allergies: self.allergies,
            add_restrictions: self.restrictions,
            add_disliked: self.disliked,
            ..ProfileUpdate::default()
        }
    }
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Resolve a food mention to nutrition facts
    Resolve {
        /// What was eaten, e.g. "2 boiled eggs"
        mention: String,

        /// Image of the meal instead of a text mention
        #[arg(long)]
        image: Option<PathBuf>,

        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Suggest healthier substitutes for a craving
    Crave {
        /// Craving description, e.g. "chocolate cake"
        text: String,

        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Ingest a document and optionally search it
    Ingest {
        /// Path to a .txt, .md, .csv, .tsv, or paginated text file
        path: PathBuf,

        /// Query to run against the ingested document
        #[arg(long)]
        query: Option<String>,

        /// Number of chunks to return
        #[arg(long, short = 'k')]
        top_k: Option<usize>,
    },

    /// Assemble the grounded context for a question
    Ask {
        /// The question
        query: String,

        /// Documents to ground the answer in (repeatable)
        #[arg(long = "doc")]
        docs: Vec<PathBuf>,

        /// Persona id, e.g. friendly-nutritionist, strict-coach, fun-chef, mindful-coach
        #[arg(long, default_value = "friendly_nutritionist")]
        persona: String,

        /// Print the context as JSON instead of the rendered prompt
        #[arg(long)]
        json: bool,

        /// Send the prompt to Gemini and print the reviewed answer
        #[arg(long)]
        send: bool,

        #[command(flatten)]
        profile: ProfileArgs,
    },
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn gemini() -> Option<Arc<dyn LlmProvider>> {
    GeminiProvider::from_env()
        .ok()
        .map(|provider| Arc::new(provider) as Arc<dyn LlmProvider>)
}

fn build_resolver(config: &EngineConfig) -> NutritionResolver {
    let mut resolver = NutritionResolver::new(config);
    if let Some(usda) = UsdaClient::from_env() {
        info!("USDA FoodData Central tier enabled");
        resolver = resolver.with_source(Arc::new(usda));
    }
    if let Some(provider) = gemini() {
        info!("Gemini estimation tier enabled");
        resolver = resolver.with_estimator(Arc::new(LlmEstimator::new(provider)));
    }
    resolver
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_from_env()?;
    let cli = Cli::parse();
    let config = EngineConfig::from_env()?;
    let mut session = CoachingSession::new(&config, build_resolver(&config));

    match cli.command {
        Command::Resolve {
            mention,
            image,
            profile,
        } => {
            session.update_profile(profile.into_update());
            let mention = match image {
                Some(path) => {
                    let extension = path
                        .extension()
                        .and_then(|e| e.to_str())
                        .unwrap_or_default()
                        .to_owned();
                    let bytes = fs::read(&path).await?;
                    FoodMention::image(
                        ImageInput::from_extension(bytes, &extension),
                        Some(mention),
                    )
                }
                None => FoodMention::text(mention),
            };
            print_json(&session.resolve_food(&mention).await?)?;
        }
        Command::Crave { text, profile } => {
            session.update_profile(profile.into_update());
            print_json(&session.suggest_substitutes(&text))?;
        }
        Command::Ingest { path, query, top_k } => {
            let record = session.ingest_document(read_upload(&path).await?)?;
            println!(
                "{}: {} words in {} chunks{}",
                record.filename,
                record.word_count(),
                record.chunks.len(),
                if record.truncated { " (truncated)" } else { "" }
            );
            if let Some(query) = query {
                let k = top_k.unwrap_or(config.retrieval.top_k);
                print_json(&session.documents().retrieve(&query, k))?;
            }
        }
        Command::Ask {
            query,
            docs,
            persona,
            json,
            send,
            profile,
        } => {
            session.update_profile(profile.into_update());
            session.set_persona(persona.parse::<Persona>().map_err(|e| anyhow!(e))?);
            for path in docs {
                session.ingest_document(read_upload(&path).await?)?;
            }

            let context = session.assemble(&query);
            if json {
                print_json(&context)?;
            } else {
                println!("{}", context.render_prompt());
            }

            if send {
                let provider = gemini().ok_or_else(|| anyhow!("GEMINI_API_KEY is not set"))?;
                let request = context.to_chat_request();
                let answer = call_with_retry(
                    provider.name(),
                    &config.resilience,
                    || AppError::new(ErrorCode::ExternalServiceUnavailable, "generation timed out"),
                    || provider.complete(&request),
                )
                .await?;
                let review = review_response(&answer.content, session.profile());
                println!("\n{}", review.annotated);
            }
        }
    }

    let summary = session.end();
    info!(session_id = %summary.session_id, "Done");
    Ok(())
}
