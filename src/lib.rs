//! # PeriodHub Assessment Engine
//!
//! The engine behind a localized (en/zh) period-health site: weighted
//! questionnaire scoring, symptom risk analysis, yes/no triage trees, pain
//! tracking and a namespaced, versioned key-value persistence layer.
//!
//! ## Features
//!
//! - **Pain-impact calculator**: weighted scoring, severity bands and
//!   recommendations, with progress saved after every answer
//! - **Symptom analysis**: risk level, urgency and "see a doctor" advice
//! - **Triage trees**: validated yes/no trees with an undoable walker
//! - **Pain tracker**: 0-10 levels, statistics and chart-ready series
//! - **Cycle phase**: day of cycle and phase for workplace tips
//! - **Storage**: envelope versioning, quota cleanup and tiered session saves
//!
//! User-facing text is always an i18n key; rendering is left to the caller.
//!
//! ## Architecture
//!
//! ```text
//! CLI → assessment / triage / tracker → storage (NamespacedStorage, TieredSessionStore)
//!                                             ↓
//!                                   SqliteStore / MemoryStore
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use periodhub_assessment::assessment::{pain_impact_questionnaire, Locale, PainImpactCalculator};
//! use periodhub_assessment::storage::{MemoryStore, SqliteStore, TieredSessionStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let primary = Arc::new(SqliteStore::new_in_memory().await?);
//!     let store = TieredSessionStore::new(primary, Arc::new(MemoryStore::new()));
//!     let mut calculator =
//!         PainImpactCalculator::load_or_start(pain_impact_questionnaire(), store, "me", Locale::En).await?;
//!     calculator.answer_question("pain_intensity", "moderate").await?;
//!     Ok(())
//! }
//! ```

/// Questionnaires, scoring, severity, recommendations and sessions.
pub mod assessment;
/// Command-line front end.
pub mod cli;
/// Configuration loaded from the environment.
pub mod config;
/// Error types and result aliases.
pub mod error;
/// Key-value persistence: backends, envelopes and session tiers.
pub mod storage;
/// Pain tracking, chart data and cycle phases.
pub mod tracker;
/// Triage decision trees.
pub mod triage;

pub use config::Config;
pub use error::{AppError, AppResult};
